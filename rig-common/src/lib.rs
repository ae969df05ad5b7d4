//! Shared types and text formats for rig export
//!
//! This crate provides the interchange data model shared between:
//! - `rig-export` (extraction pipeline and CLI)
//! - downstream readers of `.mesh` / `.anim` files
//!
//! # Modules
//!
//! - [`types`] - Joints, consolidated vertices, triangles and sampled animation clips
//! - [`formats`] - Versioned plain-text `.mesh` and `.anim` formats (writer and parser)

pub mod formats;
pub mod types;

// Re-export the data model
pub use types::{
    Joint, JointAnimation, JointSample, JointTable, MAX_INFLUENCES, MAX_JOINTS, Mesh,
    SampledAnimation, STORED_WEIGHTS, Triangle, UNUSED_JOINT, Vertex,
};

// Re-export commonly used format items
pub use formats::{
    ANIM_EXT, FORMAT_VERSION, FormatError, MESH_EXT, TextFormat, parse_animation, parse_mesh,
    write_animation, write_mesh,
};
