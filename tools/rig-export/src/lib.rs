//! rig-export library
//!
//! Extraction pipeline turning a scene (meshes, armatures, actions) into the
//! `.mesh` and `.anim` text formats from `rig-common`.
//!
//! Mesh path: [`skeleton`] -> [`mesh`] -> text serializer.
//! Animation path: [`skeleton`] -> [`animation`] -> text serializer.
//! [`transform`] feeds both.

pub mod animation;
pub mod error;
pub mod export;
pub mod manifest;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod transform;

// Re-export the pipeline stages
pub use animation::{FrameRange, PoseEvaluator, sample_animation};
pub use error::ExportError;
pub use mesh::consolidate_mesh;
pub use skeleton::{Skeleton, flatten_skeleton};
pub use transform::{Axis, AxisPair, compose_pose_transform, compose_transform};

// Re-export the batch driver
pub use export::{
    ExportOptions, ExportReport, build_animation, build_mesh, export_animations, export_meshes,
};
pub use manifest::ExportManifest;
pub use scene::{PoseScope, Scene};
