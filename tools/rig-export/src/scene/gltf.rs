//! glTF/GLB scene import
//!
//! Mapping onto the scene model:
//! - every skin becomes an armature object whose bones are the skin joints
//! - every node with a mesh becomes a mesh object; its primitives are merged
//! - `JOINTS_n`/`WEIGHTS_n` pairs with a non-zero weight become vertex group
//!   memberships (group id = skin joint index)
//! - every animation touching a skin joint becomes an action, with times
//!   converted to frames at `fps`
//!
//! Skinned mesh nodes ignore their own transform, as glTF requires.

use anyhow::{Context, Result, bail};
use ::gltf::animation::util::ReadOutputs;
use ::gltf::animation::{Interpolation as GltfInterpolation, Property};
use ::gltf::mesh::Mode;
use glam::{Mat4, Quat, Vec3};
use hashbrown::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use super::keyframes::{Interpolation, Key, Track, Trs};
use super::{
    Action, Armature, ArmatureObject, Bone, BoneChannel, GroupWeight, MeshObject, ObjectData,
    Polygon, Scene, SceneObject, SourceMesh, SourceVertex, VertexGroup,
};

/// Default sampling rate for glTF animation time
pub const DEFAULT_FPS: f32 = 24.0;

pub fn load_gltf_scene(path: &Path, fps: f32) -> Result<Scene> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("Invalid frame rate {} (must be positive)", fps);
    }
    let (document, buffers, _images) =
        ::gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;

    let mut scene = SceneBuilder::new(&document, &buffers, fps).build()?;
    scene
        .validate()
        .with_context(|| format!("Invalid scene: {:?}", path))?;

    info!(
        "Loaded {:?}: {} objects, {} actions",
        path,
        scene.objects.len(),
        scene.actions.len()
    );
    Ok(scene)
}

struct SceneBuilder<'a> {
    document: &'a ::gltf::Document,
    buffers: &'a [::gltf::buffer::Data],
    fps: f32,
    parents: Vec<Option<usize>>,
    world: Vec<Mat4>,
    node_names: Vec<String>,
    taken: HashSet<String>,
    action_names: HashSet<String>,
}

/// Armature object built from one skin
struct SkinArmature {
    object: String,
    joints: Vec<usize>,
}

impl<'a> SceneBuilder<'a> {
    fn new(document: &'a ::gltf::Document, buffers: &'a [::gltf::buffer::Data], fps: f32) -> Self {
        let count = document.nodes().len();
        let mut parents = vec![None; count];
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
        }

        let local: Vec<Mat4> = document
            .nodes()
            .map(|n| Mat4::from_cols_array_2d(&n.transform().matrix()))
            .collect();
        let mut world = vec![Mat4::IDENTITY; count];
        let mut stack: Vec<(usize, Mat4)> = (0..count)
            .filter(|&i| parents[i].is_none())
            .map(|i| (i, Mat4::IDENTITY))
            .collect();
        while let Some((index, parent_world)) = stack.pop() {
            world[index] = parent_world * local[index];
            if let Some(node) = document.nodes().nth(index) {
                stack.extend(node.children().map(|c| (c.index(), world[index])));
            }
        }

        let mut taken = HashSet::new();
        let node_names = document
            .nodes()
            .map(|n| {
                let base = n
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", n.index()));
                unique_name(&base, &mut taken)
            })
            .collect();

        Self {
            document,
            buffers,
            fps,
            parents,
            world,
            node_names,
            taken,
            action_names: HashSet::new(),
        }
    }

    fn build(mut self) -> Result<Scene> {
        let document = self.document;
        let mut scene = Scene::default();

        let mut skins = Vec::new();
        for skin in document.skins() {
            let object = self.armature_object(&skin)?;
            skins.push(SkinArmature {
                object: object.name.clone(),
                joints: skin.joints().map(|j| j.index()).collect(),
            });
            scene.objects.push(object);
        }

        for node in document.nodes() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let skin = node.skin().and_then(|s| skins.get(s.index()));
            let object = self
                .mesh_object(&node, &mesh, skin)
                .with_context(|| format!("Failed to read mesh node {:?}", self.node_names[node.index()]))?;
            scene.objects.push(object);
        }

        let joint_nodes: HashSet<usize> = skins.iter().flat_map(|s| s.joints.iter().copied()).collect();
        let mut max_frame = 0.0f32;
        for animation in document.animations() {
            let Some(action) = self.action(&animation, &joint_nodes)? else {
                continue;
            };
            max_frame = max_frame.max(action.frame_range().1);

            // First animation touching a skin becomes that armature's active action
            let targets: HashSet<usize> = animation
                .channels()
                .map(|c| c.target().node().index())
                .collect();
            for (skin, object) in skins.iter().zip(&mut scene.objects) {
                let ObjectData::Armature(arm) = &mut object.data else {
                    continue;
                };
                if arm.action.is_none() && skin.joints.iter().any(|j| targets.contains(j)) {
                    arm.action = Some(action.name.clone());
                }
            }
            scene.actions.push(action);
        }

        scene.frame_start = 0;
        // Half-open range, so the last keyed frame is still sampled
        scene.frame_end = max_frame.ceil() as i32 + 1;
        Ok(scene)
    }

    fn armature_object(&mut self, skin: &::gltf::Skin<'_>) -> Result<SceneObject> {
        let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
        let bone_of: HashMap<usize, usize> =
            joints.iter().enumerate().map(|(bone, &node)| (node, bone)).collect();

        let reader = skin.reader(|b| self.buffers.get(b.index()).map(|d| d.0.as_slice()));
        let inverse_bind: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
            Some(iter) => iter.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
            None => vec![Mat4::IDENTITY; joints.len()],
        };
        if inverse_bind.len() != joints.len() {
            bail!(
                "skin {:?} has {} joints but {} inverse bind matrices",
                skin.name(),
                joints.len(),
                inverse_bind.len()
            );
        }

        let mut bones = Vec::with_capacity(joints.len());
        for (bone, &node) in joints.iter().enumerate() {
            // Nearest ancestor that is also a joint of this skin
            let mut ancestor = self.parents[node];
            while let Some(a) = ancestor {
                if bone_of.contains_key(&a) {
                    break;
                }
                ancestor = self.parents[a];
            }
            let parent = ancestor.and_then(|a| bone_of.get(&a).copied());

            let node_parent_world = self.parents[node].map_or(Mat4::IDENTITY, |p| self.world[p]);
            let parent_offset = match ancestor {
                Some(a) => self.world[a].inverse() * node_parent_world,
                None => node_parent_world,
            };
            let (t, r, s) = self
                .document
                .nodes()
                .nth(node)
                .map(|n| n.transform().decomposed())
                .unwrap_or(([0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0; 3]));

            bones.push(Bone {
                name: self.node_names[node].clone(),
                parent,
                deform: true,
                bind_matrix: inverse_bind[bone].inverse(),
                rest: Trs {
                    translation: Vec3::from_array(t),
                    rotation: Quat::from_array(r).normalize(),
                    scale: Vec3::from_array(s),
                },
                parent_offset,
            });
        }

        let name = unique_name(skin.name().unwrap_or("Armature"), &mut self.taken);
        debug!("Skin {:?}: {} bones", name, bones.len());
        Ok(SceneObject {
            name,
            selected: true,
            world_matrix: Mat4::IDENTITY,
            data: ObjectData::Armature(ArmatureObject {
                armature: Armature { bones },
                action: None,
            }),
        })
    }

    fn mesh_object(
        &self,
        node: &::gltf::Node<'_>,
        mesh: &::gltf::Mesh<'_>,
        skin: Option<&SkinArmature>,
    ) -> Result<SceneObject> {
        let mut source = SourceMesh::default();

        for (index, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != Mode::Triangles {
                bail!(
                    "primitive {} uses {:?} mode; only triangle lists can be exported",
                    index,
                    primitive.mode()
                );
            }
            let reader = primitive.reader(|b| self.buffers.get(b.index()).map(|d| d.0.as_slice()));
            let base = source.vertices.len() as u32;

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .with_context(|| format!("No positions in primitive {}", index))?
                .collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let mut groups: Vec<Vec<GroupWeight>> = vec![Vec::new(); positions.len()];
            if skin.is_some() {
                let mut set = 0;
                while let (Some(joints), Some(weights)) =
                    (reader.read_joints(set), reader.read_weights(set))
                {
                    for ((vertex, joints), weights) in groups
                        .iter_mut()
                        .zip(joints.into_u16())
                        .zip(weights.into_f32())
                    {
                        for (joint, weight) in joints.into_iter().zip(weights) {
                            add_influence(vertex, u32::from(joint), weight);
                        }
                    }
                    set += 1;
                }
            }

            for (i, (position, groups)) in positions.iter().zip(groups).enumerate() {
                source.vertices.push(SourceVertex {
                    position: Vec3::from_array(*position),
                    normal: normals.get(i).copied().map_or(Vec3::ZERO, Vec3::from_array),
                    groups,
                });
            }

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if indices.len() % 3 != 0 {
                bail!(
                    "primitive {} has {} indices, which is not a multiple of 3",
                    index,
                    indices.len()
                );
            }
            source.polygons.extend(
                indices
                    .chunks_exact(3)
                    .map(|c| Polygon::from([c[0] + base, c[1] + base, c[2] + base])),
            );
        }

        let name = self.node_names[node.index()].clone();
        let (world_matrix, vertex_groups, armature) = match skin {
            Some(skin) => (
                Mat4::IDENTITY,
                skin.joints
                    .iter()
                    .enumerate()
                    .map(|(i, &joint)| VertexGroup {
                        index: i as u32,
                        name: self.node_names[joint].clone(),
                    })
                    .collect(),
                Some(skin.object.clone()),
            ),
            None => (self.world[node.index()], Vec::new(), None),
        };
        debug!(
            "Mesh {:?}: {} vertices, {} triangles",
            name,
            source.vertices.len(),
            source.polygons.len()
        );

        Ok(SceneObject {
            name,
            selected: true,
            world_matrix,
            data: ObjectData::Mesh(MeshObject {
                mesh: source,
                vertex_groups,
                armature,
            }),
        })
    }

    /// Action for `animation`, `None` if it animates no skin joint
    fn action(
        &mut self,
        animation: &::gltf::Animation<'_>,
        joint_nodes: &HashSet<usize>,
    ) -> Result<Option<Action>> {
        let mut channels: Vec<BoneChannel> = Vec::new();
        let mut channel_of: HashMap<usize, usize> = HashMap::new();

        for channel in animation.channels() {
            let node = channel.target().node().index();
            if !joint_nodes.contains(&node) {
                debug!(
                    "Skipping channel on {:?}: not a skin joint",
                    self.node_names[node]
                );
                continue;
            }
            let reader = channel.reader(|b| self.buffers.get(b.index()).map(|d| d.0.as_slice()));
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
                continue;
            };
            let frames: Vec<f32> = inputs.map(|t| t * self.fps).collect();

            let interpolation = match channel.sampler().interpolation() {
                GltfInterpolation::Linear => Interpolation::Linear,
                GltfInterpolation::Step => Interpolation::Step,
                GltfInterpolation::CubicSpline => {
                    warn!(
                        "Cubic spline channel on {:?} is sampled linearly",
                        self.node_names[node]
                    );
                    Interpolation::Linear
                }
            };
            let cubic = matches!(
                channel.sampler().interpolation(),
                GltfInterpolation::CubicSpline
            );

            let slot = *channel_of.entry(node).or_insert_with(|| {
                channels.push(BoneChannel {
                    bone: self.node_names[node].clone(),
                    ..Default::default()
                });
                channels.len() - 1
            });
            let target = &mut channels[slot];

            match (channel.target().property(), outputs) {
                (Property::Translation, ReadOutputs::Translations(values)) => {
                    let values = values.map(Vec3::from_array).collect();
                    target.translation = Track::new(interpolation, keys(&frames, values, cubic));
                }
                (Property::Rotation, ReadOutputs::Rotations(values)) => {
                    let values = values
                        .into_f32()
                        .map(|v| Quat::from_array(v).normalize())
                        .collect();
                    target.rotation = Track::new(interpolation, keys(&frames, values, cubic));
                }
                (Property::Scale, ReadOutputs::Scales(values)) => {
                    let values = values.map(Vec3::from_array).collect();
                    target.scale = Track::new(interpolation, keys(&frames, values, cubic));
                }
                _ => {}
            }
        }

        if channels.is_empty() {
            return Ok(None);
        }
        let base = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Action_{}", animation.index()));
        Ok(Some(Action {
            name: unique_name(&base, &mut self.action_names),
            channels,
        }))
    }
}

/// Pair key frames with values; cubic spline outputs carry
/// (in-tangent, value, out-tangent) triples
fn keys<T: Copy>(frames: &[f32], values: Vec<T>, cubic: bool) -> Vec<Key<T>> {
    let values: Vec<T> = if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    };
    frames
        .iter()
        .zip(values)
        .map(|(&frame, value)| Key { frame, value })
        .collect()
}

/// Merge one skin influence into a vertex's group list, dropping zero weights
fn add_influence(groups: &mut Vec<GroupWeight>, group: u32, weight: f32) {
    if weight <= 0.0 {
        return;
    }
    match groups.iter_mut().find(|g| g.group == group) {
        Some(existing) => existing.weight += weight,
        None => groups.push(GroupWeight { group, weight }),
    }
}

/// `base`, or `base.001`, `base.002`, ... if already taken
fn unique_name(base: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}.{:03}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
