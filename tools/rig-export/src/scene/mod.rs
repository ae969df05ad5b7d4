//! Host scene model
//!
//! A scene is a flat list of named objects (meshes, armatures, empties) plus
//! the actions that can animate the armatures. Scenes are built by the glTF
//! and JSON loaders and consumed by the export driver.
//!
//! All matrices are stored column-major (glam layout). In JSON a `Mat4` is a
//! flat array of 16 numbers, a `Vec3` is `[x, y, z]` and a `Quat` is
//! `[x, y, z, w]`.

pub mod gltf;
pub mod json;
pub mod keyframes;

use anyhow::{Context, Result, bail};
use glam::{Mat4, Quat, Vec3};
use hashbrown::{HashMap, HashSet};
use rig_common::Joint;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::animation::PoseEvaluator;
use crate::error::ExportError;

pub use self::keyframes::{Interpolation, Key, Track, Trs};

/// Scene graph snapshot plus the mutable evaluation state (current frame,
/// active action per armature)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub frame_start: i32,
    #[serde(default)]
    pub frame_end: i32,
    #[serde(default)]
    pub current_frame: i32,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(default = "default_true")]
    pub selected: bool,
    /// Object to world transform
    #[serde(default)]
    pub world_matrix: Mat4,
    #[serde(flatten)]
    pub data: ObjectData,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectData {
    Mesh(MeshObject),
    Armature(ArmatureObject),
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshObject {
    pub mesh: SourceMesh,
    /// Names for the group ids referenced by vertices
    #[serde(default)]
    pub vertex_groups: Vec<VertexGroup>,
    /// Name of the armature object deforming this mesh
    #[serde(default)]
    pub armature: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmatureObject {
    pub armature: Armature,
    /// Active action
    #[serde(default)]
    pub action: Option<String>,
}

/// Bone hierarchy of one armature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Armature {
    pub bones: Vec<Bone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone in [`Armature::bones`]
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default = "default_true")]
    pub deform: bool,
    /// Bind pose in armature space
    pub bind_matrix: Mat4,
    /// Rest transform relative to `parent_offset`, used for channels without keys
    #[serde(default)]
    pub rest: Trs,
    /// Fixed transform between the parent bone and this bone's animated space
    #[serde(default)]
    pub parent_offset: Mat4,
}

impl Bone {
    /// Bone at `parent` with the given armature space bind pose
    pub fn new(name: impl Into<String>, parent: Option<usize>, bind_matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            parent,
            deform: true,
            bind_matrix,
            rest: Trs::default(),
            parent_offset: Mat4::IDENTITY,
        }
    }
}

impl Armature {
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Child indices per bone, in bone list order
    pub fn children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.bones.len()];
        for (index, bone) in self.bones.iter().enumerate() {
            if let Some(list) = bone.parent.and_then(|p| children.get_mut(p)) {
                list.push(index);
            }
        }
        children
    }

    /// Bone indices ordered so every parent precedes its children.
    ///
    /// Bones caught in a parent cycle never appear.
    pub fn parent_first_order(&self) -> Vec<usize> {
        let children = self.children();
        let mut order = Vec::with_capacity(self.bones.len());
        let mut stack: Vec<usize> = self
            .bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
            .rev()
            .collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(children[index].iter().rev());
        }
        order
    }

    /// Armature space matrix of every bone with `action` applied at `frame`
    pub fn evaluate_pose(&self, action: Option<&Action>, frame: f32) -> Vec<Mat4> {
        let channels: HashMap<&str, &BoneChannel> = action
            .map(|a| a.channels.iter().map(|c| (c.bone.as_str(), c)).collect())
            .unwrap_or_default();

        let mut pose = vec![Mat4::IDENTITY; self.bones.len()];
        for index in self.parent_first_order() {
            let bone = &self.bones[index];
            let trs = match channels.get(bone.name.as_str()) {
                Some(channel) => channel.sample(frame, &bone.rest),
                None => bone.rest,
            };
            let local = bone.parent_offset * trs.to_mat4();
            pose[index] = match bone.parent {
                Some(parent) => pose[parent] * local,
                None => local,
            };
        }
        pose
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for (index, bone) in self.bones.iter().enumerate() {
            if !names.insert(bone.name.as_str()) {
                bail!("duplicate bone name {:?}", bone.name);
            }
            if !Joint::is_valid_name(&bone.name) {
                bail!("bone name {:?} is blank or spans several lines", bone.name);
            }
            if let Some(parent) = bone.parent {
                if parent >= self.bones.len() {
                    bail!(
                        "bone {:?} has parent index {} but the armature only has {} bones",
                        bone.name,
                        parent,
                        self.bones.len()
                    );
                }
                if parent == index {
                    bail!("bone {:?} is its own parent", bone.name);
                }
            }
        }
        if self.parent_first_order().len() != self.bones.len() {
            bail!("bone hierarchy contains a cycle");
        }
        Ok(())
    }
}

/// Triangulated source mesh as the host provides it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMesh {
    pub vertices: Vec<SourceVertex>,
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceVertex {
    pub position: Vec3,
    /// Zero when the host did not provide one; filled in by [`SourceMesh::fill_missing_normals`]
    #[serde(default)]
    pub normal: Vec3,
    #[serde(default)]
    pub groups: Vec<GroupWeight>,
}

/// Membership of a vertex in a vertex group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    pub group: u32,
    pub weight: f32,
}

/// Polygon as a list of vertex indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<u32>);

impl Polygon {
    pub fn corners(&self) -> &[u32] {
        &self.0
    }
}

impl From<[u32; 3]> for Polygon {
    fn from(corners: [u32; 3]) -> Self {
        Self(corners.to_vec())
    }
}

/// Named vertex group of a mesh object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexGroup {
    pub index: u32,
    pub name: String,
}

impl SourceMesh {
    /// Replace every zero normal with the area weighted average of the face
    /// normals around the vertex
    pub fn fill_missing_normals(&mut self) {
        if self.vertices.iter().all(|v| v.normal != Vec3::ZERO) {
            return;
        }
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];
        for polygon in &self.polygons {
            let corners = polygon.corners();
            let positions: Option<Vec<Vec3>> = corners
                .iter()
                .map(|&i| self.vertices.get(i as usize).map(|v| v.position))
                .collect();
            let Some(positions) = positions else {
                continue;
            };
            if positions.len() < 3 {
                continue;
            }
            // Fan around the first corner; cross products are twice the area
            let mut face = Vec3::ZERO;
            for pair in positions[1..].windows(2) {
                face += (pair[0] - positions[0]).cross(pair[1] - positions[0]);
            }
            for &i in corners {
                accumulated[i as usize] += face;
            }
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            if vertex.normal == Vec3::ZERO {
                vertex.normal = normal.normalize_or_zero();
            }
        }
    }
}

/// Named set of keyframe channels animating the bones of an armature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<BoneChannel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneChannel {
    pub bone: String,
    #[serde(default)]
    pub translation: Track<Vec3>,
    #[serde(default)]
    pub rotation: Track<Quat>,
    #[serde(default)]
    pub scale: Track<Vec3>,
}

impl BoneChannel {
    /// Local transform at `frame`; components without keys come from `rest`
    pub fn sample(&self, frame: f32, rest: &Trs) -> Trs {
        Trs {
            translation: self.translation.sample(frame).unwrap_or(rest.translation),
            rotation: self.rotation.sample(frame).unwrap_or(rest.rotation),
            scale: self.scale.sample(frame).unwrap_or(rest.scale),
        }
    }

    fn sort_keys(&mut self) {
        self.translation.sort();
        self.rotation.sort();
        self.scale.sort();
    }

    fn frame_range(&self) -> Option<(f32, f32)> {
        [
            self.translation.frame_range(),
            self.rotation.frame_range(),
            self.scale.frame_range(),
        ]
        .into_iter()
        .flatten()
        .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    }
}

impl Action {
    /// First and last keyed frame over all channels, `(0, 0)` without keys
    pub fn frame_range(&self) -> (f32, f32) {
        self.channels
            .iter()
            .filter_map(BoneChannel::frame_range)
            .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
            .unwrap_or((0.0, 0.0))
    }
}

impl Scene {
    /// Load a scene from a glTF, GLB or JSON file, chosen by extension.
    ///
    /// `fps` converts glTF animation time to frames.
    pub fn load(path: &Path, fps: f32) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "gltf" | "glb" => gltf::load_gltf_scene(path, fps),
            "json" => json::load_json_scene(path),
            _ => bail!(
                "unsupported scene format {:?} (expected .gltf, .glb or .json)",
                path
            ),
        }
    }

    /// Check structural invariants and normalize derived data (sorted keys,
    /// missing normals)
    pub fn validate(&mut self) -> Result<()> {
        let mut names = HashSet::new();
        for object in &mut self.objects {
            if !names.insert(object.name.clone()) {
                bail!("duplicate object name {:?}", object.name);
            }
            match &mut object.data {
                ObjectData::Armature(arm) => arm
                    .armature
                    .validate()
                    .with_context(|| format!("invalid armature {:?}", object.name))?,
                ObjectData::Mesh(mesh) => mesh.mesh.fill_missing_normals(),
                ObjectData::Empty => {}
            }
        }

        let mut actions = HashSet::new();
        for action in &mut self.actions {
            if !actions.insert(action.name.clone()) {
                bail!("duplicate action name {:?}", action.name);
            }
            for channel in &mut action.channels {
                channel.sort_keys();
            }
        }

        for object in &self.objects {
            match &object.data {
                ObjectData::Mesh(MeshObject {
                    armature: Some(armature),
                    ..
                }) => {
                    if self.armature_index(armature).is_none() {
                        bail!(
                            "mesh {:?} references armature {:?}, which is not an armature object",
                            object.name,
                            armature
                        );
                    }
                }
                ObjectData::Armature(ArmatureObject {
                    action: Some(action),
                    ..
                }) => {
                    if self.find_action(action).is_none() {
                        bail!(
                            "armature {:?} uses action {:?}, which does not exist",
                            object.name,
                            action
                        );
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn find_object(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.name == name)
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Index of the armature object called `name`
    pub fn armature_index(&self, name: &str) -> Option<usize> {
        self.find_object(name)
            .filter(|&i| matches!(self.objects[i].data, ObjectData::Armature(_)))
    }

    /// Armature object deforming the mesh object at `index`
    pub fn armature_of(&self, index: usize) -> Option<usize> {
        match &self.objects.get(index)?.data {
            ObjectData::Mesh(mesh) => self.armature_index(mesh.armature.as_deref()?),
            _ => None,
        }
    }

    /// Mark exactly the named objects as selected. Unknown names are returned.
    pub fn select_only<'n>(&mut self, names: &'n [String]) -> Vec<&'n str> {
        for object in &mut self.objects {
            object.selected = names.contains(&object.name);
        }
        names
            .iter()
            .filter(|n| self.find_object(n).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Objects considered for export, in scene order
    pub fn export_candidates(&self, use_selection: bool) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(move |(_, o)| !use_selection || o.selected)
            .map(|(i, _)| i)
    }

    fn armature_mut(&mut self, index: usize) -> Option<&mut ArmatureObject> {
        match &mut self.objects.get_mut(index)?.data {
            ObjectData::Armature(arm) => Some(arm),
            _ => None,
        }
    }
}

/// Scoped pose evaluation state.
///
/// Entering sets the armature's active action; the scene's current frame
/// follows every evaluation. Both are put back when the scope is dropped,
/// whether sampling finished or failed.
pub struct PoseScope<'a> {
    scene: &'a mut Scene,
    object: usize,
    saved_frame: i32,
    saved_action: Option<String>,
    bones: HashMap<String, usize>,
    pose: Vec<Mat4>,
    pose_frame: Option<i32>,
}

impl<'a> PoseScope<'a> {
    pub fn enter(scene: &'a mut Scene, object: usize, action: &str) -> Result<Self, ExportError> {
        if scene.find_action(action).is_none() {
            return Err(ExportError::UnknownAction(action.to_string()));
        }
        let saved_frame = scene.current_frame;
        let name = scene
            .objects
            .get(object)
            .map(|o| o.name.clone())
            .unwrap_or_default();
        let Some(arm) = scene.armature_mut(object) else {
            return Err(ExportError::NotAnArmature(name));
        };

        let saved_action = arm.action.replace(action.to_string());
        let bones = arm
            .armature
            .bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();

        Ok(Self {
            scene,
            object,
            saved_frame,
            saved_action,
            bones,
            pose: Vec::new(),
            pose_frame: None,
        })
    }

    /// Move the scene to `frame` and evaluate the whole armature
    pub fn set_frame(&mut self, frame: i32) {
        self.scene.current_frame = frame;
        let scene = &*self.scene;
        self.pose = match &scene.objects[self.object].data {
            ObjectData::Armature(arm) => {
                let action = arm.action.as_deref().and_then(|a| scene.find_action(a));
                arm.armature.evaluate_pose(action, frame as f32)
            }
            _ => Vec::new(),
        };
        self.pose_frame = Some(frame);
    }
}

impl PoseEvaluator for PoseScope<'_> {
    fn evaluate_bone_world_matrix(&mut self, bone: &str, frame: i32) -> Option<Mat4> {
        let index = *self.bones.get(bone)?;
        if self.pose_frame != Some(frame) {
            self.set_frame(frame);
        }
        self.pose.get(index).copied()
    }
}

impl Drop for PoseScope<'_> {
    fn drop(&mut self) {
        self.scene.current_frame = self.saved_frame;
        let saved = self.saved_action.take();
        if let Some(arm) = self.scene.armature_mut(self.object) {
            arm.action = saved;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `Root` at the origin with `Arm` one unit above it, plus a `Walk`
    /// action that raises `Arm` by one unit over ten frames
    pub(crate) fn arm_scene() -> Scene {
        let mut root = Bone::new("Root", None, Mat4::IDENTITY);
        root.rest = Trs::default();
        let mut arm = Bone::new("Arm", Some(0), Mat4::from_translation(Vec3::Y));
        arm.rest.translation = Vec3::Y;

        let walk = Action {
            name: "Walk".into(),
            channels: vec![BoneChannel {
                bone: "Arm".into(),
                translation: Track::new(
                    Interpolation::Linear,
                    vec![
                        Key {
                            frame: 0.0,
                            value: Vec3::Y,
                        },
                        Key {
                            frame: 10.0,
                            value: Vec3::new(0.0, 2.0, 0.0),
                        },
                    ],
                ),
                ..Default::default()
            }],
        };

        Scene {
            frame_start: 0,
            frame_end: 10,
            current_frame: 7,
            objects: vec![
                SceneObject {
                    name: "Rig".into(),
                    selected: true,
                    world_matrix: Mat4::IDENTITY,
                    data: ObjectData::Armature(ArmatureObject {
                        armature: Armature {
                            bones: vec![root, arm],
                        },
                        action: None,
                    }),
                },
                SceneObject {
                    name: "Lamp".into(),
                    selected: false,
                    world_matrix: Mat4::IDENTITY,
                    data: ObjectData::Empty,
                },
            ],
            actions: vec![walk],
        }
    }

    #[test]
    fn test_rest_pose_matches_bind() {
        let scene = arm_scene();
        let ObjectData::Armature(arm) = &scene.objects[0].data else {
            unreachable!()
        };
        let pose = arm.armature.evaluate_pose(None, 0.0);
        for (bone, world) in arm.armature.bones.iter().zip(&pose) {
            assert!(world.abs_diff_eq(bone.bind_matrix, 1e-6), "{}", bone.name);
        }
    }

    #[test]
    fn test_action_pose() {
        let scene = arm_scene();
        let ObjectData::Armature(arm) = &scene.objects[0].data else {
            unreachable!()
        };
        let pose = arm.armature.evaluate_pose(scene.find_action("Walk"), 5.0);
        let p = pose[1].transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-6));
    }

    #[test]
    fn test_parent_first_order() {
        let armature = Armature {
            bones: vec![
                Bone::new("Hand", Some(2), Mat4::IDENTITY),
                Bone::new("Root", None, Mat4::IDENTITY),
                Bone::new("Arm", Some(1), Mat4::IDENTITY),
            ],
        };
        assert_eq!(armature.parent_first_order(), vec![1, 2, 0]);
    }

    #[test]
    fn test_validate_rejects_cycle() {
        let mut scene = arm_scene();
        let ObjectData::Armature(arm) = &mut scene.objects[0].data else {
            unreachable!()
        };
        arm.armature.bones[0].parent = Some(1);
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_multiline_bone_name() {
        let mut scene = arm_scene();
        let ObjectData::Armature(arm) = &mut scene.objects[0].data else {
            unreachable!()
        };
        arm.armature.bones[1].name = "Arm\nLeg".into();
        let err = scene.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("spans several lines"));
    }

    #[test]
    fn test_validate_rejects_duplicate_objects() {
        let mut scene = arm_scene();
        scene.objects[1].name = "Rig".into();
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_action_frame_range() {
        let scene = arm_scene();
        assert_eq!(scene.actions[0].frame_range(), (0.0, 10.0));
        assert_eq!(Action::default().frame_range(), (0.0, 0.0));
    }

    #[test]
    fn test_fill_missing_normals() {
        let mut mesh = SourceMesh {
            vertices: vec![
                SourceVertex {
                    position: Vec3::ZERO,
                    ..Default::default()
                },
                SourceVertex {
                    position: Vec3::X,
                    ..Default::default()
                },
                SourceVertex {
                    position: Vec3::Y,
                    normal: Vec3::NEG_X,
                    ..Default::default()
                },
            ],
            polygons: vec![Polygon::from([0, 1, 2])],
        };
        mesh.fill_missing_normals();
        assert_eq!(mesh.vertices[0].normal, Vec3::Z);
        assert_eq!(mesh.vertices[1].normal, Vec3::Z);
        // Provided normals are kept
        assert_eq!(mesh.vertices[2].normal, Vec3::NEG_X);
    }

    #[test]
    fn test_select_only() {
        let mut scene = arm_scene();
        let names = vec!["Lamp".to_string(), "Ghost".to_string()];
        let unknown = scene.select_only(&names);
        assert_eq!(unknown, ["Ghost"]);
        assert!(!scene.objects[0].selected);
        assert!(scene.objects[1].selected);
        assert_eq!(scene.export_candidates(true).collect::<Vec<_>>(), [1]);
        assert_eq!(scene.export_candidates(false).count(), 2);
    }

    #[test]
    fn test_pose_scope_restores_state() {
        let mut scene = arm_scene();
        {
            let mut scope = PoseScope::enter(&mut scene, 0, "Walk").unwrap();
            let world = scope.evaluate_bone_world_matrix("Arm", 10).unwrap();
            assert!(
                world
                    .transform_point3(Vec3::ZERO)
                    .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6)
            );
            assert_eq!(scope.evaluate_bone_world_matrix("Tail", 10), None);
        }
        assert_eq!(scene.current_frame, 7);
        let ObjectData::Armature(arm) = &scene.objects[0].data else {
            unreachable!()
        };
        assert_eq!(arm.action, None);
    }

    /// Evaluator losing `Arm` from frame `from` onwards
    struct VanishingArm<'s, 'a> {
        scope: &'s mut PoseScope<'a>,
        from: i32,
    }

    impl PoseEvaluator for VanishingArm<'_, '_> {
        fn evaluate_bone_world_matrix(&mut self, bone: &str, frame: i32) -> Option<Mat4> {
            if bone == "Arm" && frame >= self.from {
                return None;
            }
            self.scope.evaluate_bone_world_matrix(bone, frame)
        }
    }

    fn sample_vanishing(scene: &mut Scene, from: i32) -> Result<(), ExportError> {
        let ObjectData::Armature(arm) = &scene.objects[0].data else {
            unreachable!()
        };
        let skeleton = crate::skeleton::flatten_skeleton(&arm.armature, Mat4::IDENTITY)?;
        let mut scope = PoseScope::enter(scene, 0, "Walk")?;
        let mut evaluator = VanishingArm {
            scope: &mut scope,
            from,
        };
        crate::animation::sample_animation(
            &mut evaluator,
            &skeleton,
            crate::animation::FrameRange::new(0, 10),
            Mat4::IDENTITY,
            "Walk",
        )?;
        Ok(())
    }

    #[test]
    fn test_pose_scope_restores_state_on_failure() {
        let mut scene = arm_scene();
        let err = sample_vanishing(&mut scene, 5).unwrap_err();
        assert!(matches!(
            err,
            ExportError::InconsistentSampleCount { ref joint, found: 5, .. } if joint == "Arm"
        ));

        assert_eq!(scene.current_frame, 7);
        let ObjectData::Armature(arm) = &scene.objects[0].data else {
            unreachable!()
        };
        assert_eq!(arm.action, None);
    }

    #[test]
    fn test_pose_scope_errors() {
        let mut scene = arm_scene();
        assert_eq!(
            PoseScope::enter(&mut scene, 0, "Run").err(),
            Some(ExportError::UnknownAction("Run".into()))
        );
        assert_eq!(
            PoseScope::enter(&mut scene, 1, "Walk").err(),
            Some(ExportError::NotAnArmature("Lamp".into()))
        );
    }

    #[test]
    fn test_scene_json_shape() {
        let json = r#"{
            "frame_start": 1,
            "frame_end": 4,
            "objects": [
                {
                    "name": "Body",
                    "type": "mesh",
                    "mesh": {
                        "vertices": [
                            { "position": [0, 0, 0], "normal": [0, 0, 1] },
                            { "position": [1, 0, 0], "normal": [0, 0, 1] },
                            { "position": [0, 1, 0], "normal": [0, 0, 1] }
                        ],
                        "polygons": [[0, 1, 2]]
                    }
                },
                { "name": "Marker", "type": "empty", "selected": false }
            ]
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert!(scene.objects[0].selected);
        assert!(!scene.objects[1].selected);
        assert_eq!(scene.objects[0].world_matrix, Mat4::IDENTITY);
        let ObjectData::Mesh(mesh) = &scene.objects[0].data else {
            panic!("expected a mesh object");
        };
        assert_eq!(mesh.mesh.polygons[0].corners(), &[0, 1, 2]);
        assert_eq!(mesh.armature, None);
    }
}
