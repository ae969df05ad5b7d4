//! Batch export driver
//!
//! Walks the scene's objects, runs the mesh or animation pipeline for each
//! one and writes the results next to the export path. A failing object is
//! logged and skipped; the caller decides what to do with the report.

use anyhow::{Context, Result, bail};
use hashbrown::HashSet;
use rig_common::{Mesh, SampledAnimation, TextFormat};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::animation::{FrameRange, sample_animation};
use crate::mesh::consolidate_mesh;
use crate::scene::{ObjectData, PoseScope, Scene};
use crate::skeleton::flatten_skeleton;
use crate::transform::{AxisPair, compose_pose_transform, compose_transform};

/// Export configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Export path; output files land in its directory (or in it, if it is one)
    pub output: PathBuf,
    /// Only export selected objects
    pub use_selection: bool,
    /// Bake each object's world transform into the output
    pub apply_transform: bool,
    /// Sample over the action's keyed range instead of the scene range
    pub use_action_frame_range: bool,
    /// Target axis convention, `None` keeps the scene convention
    pub axes: Option<AxisPair>,
    /// Export this action for every armature instead of its active one
    pub action: Option<String>,
}

impl ExportOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            use_selection: true,
            apply_transform: true,
            use_action_frame_range: false,
            axes: Some(AxisPair::default()),
            action: None,
        }
    }

    /// Output file for an object or action called `name`
    pub fn output_path(&self, name: &str, ext: &str) -> PathBuf {
        output_path(&self.output, name, ext)
    }
}

/// Object or action that could not be exported
#[derive(Debug)]
pub struct ExportFailure {
    pub object: String,
    pub error: anyhow::Error,
}

/// Outcome of a batch export
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: ExportReport) {
        self.written.extend(other.written);
        self.failures.extend(other.failures);
    }

    /// Error summarizing every failure, if there was any
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        if self.failures.is_empty() {
            return Ok(self.written);
        }
        let names: Vec<&str> = self.failures.iter().map(|f| f.object.as_str()).collect();
        bail!(
            "{} export(s) failed ({}); {} file(s) written",
            self.failures.len(),
            names.join(", "),
            self.written.len()
        )
    }

    fn record(&mut self, object: &str, result: Result<PathBuf>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(err) => {
                error!("Failed to export {:?}: {:#}", object, err);
                self.failures.push(ExportFailure {
                    object: object.to_string(),
                    error: err,
                });
            }
        }
    }
}

/// `<dir of export_path>/<name><ext>`
///
/// An existing directory, or a path ending in a separator, is used as is.
pub fn output_path(export_path: &Path, name: &str, ext: &str) -> PathBuf {
    let names_dir = export_path
        .to_string_lossy()
        .ends_with(std::path::is_separator);
    let dir = if names_dir || export_path.is_dir() {
        export_path
    } else {
        export_path.parent().unwrap_or(Path::new(""))
    };
    dir.join(format!("{}{}", name, ext))
}

/// Consolidated mesh of the mesh object at `index`
pub fn build_mesh(scene: &Scene, index: usize, options: &ExportOptions) -> Result<Mesh> {
    let object = &scene.objects[index];
    let ObjectData::Mesh(mesh) = &object.data else {
        bail!("object {:?} is not a mesh", object.name);
    };

    // Joints and vertices share the mesh object's output space
    let transform = compose_transform(object.world_matrix, options.apply_transform, options.axes);
    let skeleton = match scene.armature_of(index) {
        Some(arm_index) => {
            let arm_object = &scene.objects[arm_index];
            let ObjectData::Armature(arm) = &arm_object.data else {
                bail!("object {:?} is not an armature", arm_object.name);
            };
            let skeleton = flatten_skeleton(&arm.armature, transform)
                .with_context(|| format!("armature {:?}", arm_object.name))?;
            Some(skeleton)
        }
        None => None,
    };

    Ok(consolidate_mesh(
        &mesh.mesh,
        &mesh.vertex_groups,
        skeleton.as_ref(),
        transform,
    )?)
}

/// Sampled animation of `action` played on the armature object at `index`
pub fn build_animation(
    scene: &mut Scene,
    index: usize,
    action: &str,
    options: &ExportOptions,
) -> Result<SampledAnimation> {
    let object = &scene.objects[index];
    let ObjectData::Armature(arm) = &object.data else {
        bail!("object {:?} is not an armature", object.name);
    };
    let transform =
        compose_pose_transform(object.world_matrix, options.apply_transform, options.axes);
    let skeleton = flatten_skeleton(&arm.armature, transform)
        .with_context(|| format!("armature {:?}", object.name))?;

    let range = if options.use_action_frame_range {
        let keyed = scene
            .find_action(action)
            .map(|a| a.frame_range())
            .unwrap_or_default();
        FrameRange::from_keyframes(keyed)
    } else {
        FrameRange::new(scene.frame_start, scene.frame_end)
    };

    let mut scope = PoseScope::enter(scene, index, action)?;
    Ok(sample_animation(
        &mut scope,
        &skeleton,
        range,
        transform,
        action,
    )?)
}

/// Export every candidate mesh object to `<name>.mesh`
pub fn export_meshes(scene: &Scene, options: &ExportOptions) -> ExportReport {
    let mut report = ExportReport::default();
    for index in scene.export_candidates(options.use_selection) {
        let object = &scene.objects[index];
        if !matches!(object.data, ObjectData::Mesh(_)) {
            debug!("Skipping {:?}: not a mesh", object.name);
            continue;
        }
        let result = build_mesh(scene, index, options).and_then(|mesh| {
            let path = options.output_path(&object.name, Mesh::EXTENSION);
            write_output(&path, &mesh)?;
            info!(
                "Exported mesh {} to {:?} ({} joints, {} vertices, {} triangles)",
                object.name,
                path,
                mesh.joints.len(),
                mesh.vertices.len(),
                mesh.triangles.len()
            );
            Ok(path)
        });
        report.record(&object.name, result);
    }
    report
}

/// Export the active action of every candidate armature to `<action>.anim`.
///
/// Each action is written at most once, by the first armature that exports
/// it successfully.
pub fn export_animations(scene: &mut Scene, options: &ExportOptions) -> ExportReport {
    let mut report = ExportReport::default();
    let mut exported: HashSet<String> = HashSet::new();

    let candidates: Vec<usize> = scene.export_candidates(options.use_selection).collect();
    for index in candidates {
        let object = &scene.objects[index];
        let ObjectData::Armature(arm) = &object.data else {
            debug!("Skipping {:?}: not an armature", object.name);
            continue;
        };
        let Some(action) = options.action.clone().or_else(|| arm.action.clone()) else {
            warn!("Skipping {:?}: no active action", object.name);
            continue;
        };
        if exported.contains(&action) {
            debug!("Action {:?} already exported", action);
            continue;
        }

        let object_name = object.name.clone();
        let result = build_animation(scene, index, &action, options)
            .with_context(|| format!("action {:?}", action))
            .and_then(|anim| {
                let path = options.output_path(&action, SampledAnimation::EXTENSION);
                write_output(&path, &anim)?;
                info!(
                    "Exported animation clip {} to {:?} ({} joints, {} samples)",
                    action,
                    path,
                    anim.joints.len(),
                    anim.sample_count
                );
                Ok(path)
            });
        if result.is_ok() {
            exported.insert(action);
        }
        report.record(&object_name, result);
    }
    report
}

/// Write `value` to `path` through a temporary file in the same directory
pub fn write_output<T: TextFormat>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        value.write_text(&mut writer)?;
        writer.flush()?;
    }
    file.persist(path)
        .with_context(|| format!("Failed to write output: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::scene::tests::arm_scene;
    use crate::scene::{GroupWeight, MeshObject, Polygon, SceneObject, SourceMesh, SourceVertex, VertexGroup};
    use glam::{Mat4, Vec3};

    fn skinned_scene() -> Scene {
        let mut scene = arm_scene();
        let vertex = |position: Vec3, group: u32| SourceVertex {
            position,
            normal: Vec3::Z,
            groups: vec![GroupWeight { group, weight: 1.0 }],
        };
        scene.objects.push(SceneObject {
            name: "Body".into(),
            selected: true,
            world_matrix: Mat4::IDENTITY,
            data: ObjectData::Mesh(MeshObject {
                mesh: SourceMesh {
                    vertices: vec![
                        vertex(Vec3::ZERO, 0),
                        vertex(Vec3::X, 0),
                        vertex(Vec3::Y, 1),
                    ],
                    polygons: vec![Polygon::from([0, 1, 2])],
                },
                vertex_groups: vec![
                    VertexGroup {
                        index: 0,
                        name: "Root".into(),
                    },
                    VertexGroup {
                        index: 1,
                        name: "Arm".into(),
                    },
                ],
                armature: Some("Rig".into()),
            }),
        });
        if let ObjectData::Armature(arm) = &mut scene.objects[0].data {
            arm.action = Some("Walk".into());
        }
        scene
    }

    fn options(dir: &Path) -> ExportOptions {
        ExportOptions {
            axes: None,
            ..ExportOptions::new(dir.join("scene.mesh"))
        }
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out/scene.mesh"), "Body", ".mesh"),
            PathBuf::from("out/Body.mesh")
        );
        assert_eq!(
            output_path(Path::new("scene.anim"), "Walk", ".anim"),
            PathBuf::from("Walk.anim")
        );
        assert_eq!(
            output_path(Path::new("not-yet-created/"), "Walk", ".anim"),
            PathBuf::from("not-yet-created/Walk.anim")
        );
    }

    #[test]
    fn test_output_path_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path(dir.path(), "Body", ".mesh"),
            dir.path().join("Body.mesh")
        );
    }

    #[test]
    fn test_build_mesh_uses_armature() {
        let scene = skinned_scene();
        let mesh = build_mesh(&scene, 2, &ExportOptions::new("out.mesh")).unwrap();
        assert_eq!(mesh.joints.len(), 2);
        assert_eq!(mesh.vertices[2].joint_ids, [1, -1, -1, -1]);
    }

    #[test]
    fn test_build_mesh_error_is_typed() {
        let mut scene = skinned_scene();
        if let ObjectData::Mesh(mesh) = &mut scene.objects[2].data {
            mesh.mesh.polygons.push(Polygon(vec![0, 1]));
        }
        let err = build_mesh(&scene, 2, &ExportOptions::new("out.mesh")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExportError>(),
            Some(&ExportError::NonTriangularPolygon {
                polygon: 1,
                corners: 2
            })
        );
    }

    #[test]
    fn test_build_animation_scene_range() {
        let mut scene = skinned_scene();
        let anim = build_animation(&mut scene, 0, "Walk", &ExportOptions::new("out.anim")).unwrap();
        assert_eq!(anim.sample_count, 10);
        assert_eq!(anim.joints.len(), 2);
        // Scope restored the scene state
        assert_eq!(scene.current_frame, 7);
    }

    #[test]
    fn test_build_animation_action_range() {
        let mut scene = skinned_scene();
        scene.frame_end = 3;
        let opts = ExportOptions {
            use_action_frame_range: true,
            ..ExportOptions::new("out.anim")
        };
        let anim = build_animation(&mut scene, 0, "Walk", &opts).unwrap();
        // Keys span 0..10, half-open
        assert_eq!(anim.sample_count, 10);
    }

    #[test]
    fn test_export_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = skinned_scene();
        let opts = options(dir.path());

        let mut report = export_meshes(&scene, &opts);
        report.merge(export_animations(&mut scene, &opts));

        assert!(report.is_success());
        assert_eq!(
            report.written,
            vec![dir.path().join("Body.mesh"), dir.path().join("Walk.anim")]
        );
        let text = std::fs::read_to_string(dir.path().join("Walk.anim")).unwrap();
        let anim = SampledAnimation::parse_text(&text).unwrap();
        assert_eq!(anim.sample_count, 10);
    }

    #[test]
    fn test_export_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let scene = skinned_scene();
        let opts = options(dir.path());
        let path = dir.path().join("Body.mesh");

        export_meshes(&scene, &opts).into_result().unwrap();
        let first = std::fs::read(&path).unwrap();
        export_meshes(&scene, &opts).into_result().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = skinned_scene();
        let mut broken = scene.objects[2].clone();
        broken.name = "Broken".into();
        if let ObjectData::Mesh(mesh) = &mut broken.data {
            mesh.mesh.polygons[0] = Polygon(vec![0, 1, 2, 0]);
        }
        scene.objects.insert(2, broken);

        let report = export_meshes(&scene, &options(dir.path()));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].object, "Broken");
        assert_eq!(report.written, vec![dir.path().join("Body.mesh")]);
        assert!(!dir.path().join("Broken.mesh").exists());
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_selection_respected() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = skinned_scene();
        scene.objects[2].selected = false;
        let report = export_meshes(&scene, &options(dir.path()));
        assert!(report.written.is_empty());

        let opts = ExportOptions {
            use_selection: false,
            ..options(dir.path())
        };
        assert_eq!(export_meshes(&scene, &opts).written.len(), 1);
    }

    #[test]
    fn test_action_exported_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = skinned_scene();
        let mut twin = scene.objects[0].clone();
        twin.name = "Rig2".into();
        scene.objects.push(twin);

        let report = export_animations(&mut scene, &options(dir.path()));
        assert_eq!(report.written, vec![dir.path().join("Walk.anim")]);
    }

    #[test]
    fn test_action_retried_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = skinned_scene();
        let mut twin = scene.objects[0].clone();
        twin.name = "Rig2".into();
        scene.objects.push(twin);
        // First armature has no deforming root
        if let ObjectData::Armature(arm) = &mut scene.objects[0].data {
            arm.armature.bones[0].deform = false;
        }

        let report = export_animations(&mut scene, &options(dir.path()));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].object, "Rig");
        assert_eq!(report.written, vec![dir.path().join("Walk.anim")]);
    }

    #[test]
    fn test_mesh_and_skeleton_share_mesh_space() {
        let mut scene = skinned_scene();
        scene.objects[2].world_matrix = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let opts = ExportOptions {
            axes: None,
            ..ExportOptions::new("out.mesh")
        };

        let mesh = build_mesh(&scene, 2, &opts).unwrap();
        // Vertex fully skinned to Root sits on Root's bind origin
        assert_eq!(mesh.vertices[0].joint_ids, [0, -1, -1, -1]);
        assert!(mesh.vertices[0].position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));
        let root_origin = mesh.joints[0].bind_local_transform.transform_point3(Vec3::ZERO);
        assert!(root_origin.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));
        // Child bind poses stay parent-relative
        let arm_offset = mesh.joints[1].bind_local_transform.transform_point3(Vec3::ZERO);
        assert!(arm_offset.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_animation_converts_before_world() {
        let mut scene = skinned_scene();
        scene.objects[0].world_matrix = Mat4::from_translation(Vec3::Y);
        let anim = build_animation(&mut scene, 0, "Walk", &ExportOptions::new("out.anim")).unwrap();

        // Root keeps the world offset; the axis conversion only rotates it
        let root = anim.joint("Root").unwrap();
        assert!(root.samples[0].local_position.abs_diff_eq(Vec3::Y, 1e-6));
        let conversion = glam::Quat::from_mat4(&AxisPair::default().conversion_matrix());
        assert!(root.samples[0].local_rotation.dot(conversion).abs() > 0.9999);
    }

    #[test]
    fn test_unknown_action_override_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = skinned_scene();
        let opts = ExportOptions {
            action: Some("Run".into()),
            ..options(dir.path())
        };
        let report = export_animations(&mut scene, &opts);
        assert_eq!(report.failures.len(), 1);
        assert!(
            report.failures[0]
                .error
                .chain()
                .any(|e| e.to_string().contains("\"Run\" does not exist"))
        );
    }
}
