//! Pipeline errors
//!
//! Every variant describes malformed scene data. None of them are retried;
//! the batch driver reports the failure and moves on to the next object.

use rig_common::{MAX_INFLUENCES, MAX_JOINTS};

/// Failure of one extraction stage for one object or action
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportError {
    #[error("found multiple root bones in armature ({first:?} and {second:?})")]
    MultipleRoots { first: String, second: String },

    #[error("could not find a deforming root bone in armature")]
    NoRoot,

    #[error("bone name {0:?} is blank or spans several lines")]
    InvalidJointName(String),

    #[error(
        "armature has {0} deforming bones, which is more than the maximum allowed ({max})",
        max = MAX_JOINTS
    )]
    TooManyJoints(usize),

    #[error(
        "polygon {polygon} has {corners} vertices; the mesh must be triangulated before export"
    )]
    NonTriangularPolygon { polygon: usize, corners: usize },

    #[error("polygon {polygon} references vertex {vertex}, but the mesh only has {count} vertices")]
    VertexOutOfRange {
        polygon: usize,
        vertex: u32,
        count: usize,
    },

    #[error(
        "vertex {vertex} is assigned to vertex groups, but the object has no armature; \
         parent it to an armature or remove the groups"
    )]
    UnexpectedSkinning { vertex: u32 },

    #[error(
        "vertex {vertex} has {count} groups assigned to it (maximum is {max})",
        max = MAX_INFLUENCES
    )]
    TooManyInfluences { vertex: u32, count: usize },

    #[error(
        "vertex {vertex} is assigned to group {group:?}, but the armature has no deforming bone with this name"
    )]
    UnknownJointGroup { vertex: u32, group: String },

    #[error(
        "inconsistent sample count in animation {clip:?}: joint {joint:?} has {found} samples, expected {expected}"
    )]
    InconsistentSampleCount {
        clip: String,
        joint: String,
        expected: usize,
        found: usize,
    },

    #[error("action {0:?} does not exist in the scene")]
    UnknownAction(String),

    #[error("object {0:?} is not an armature")]
    NotAnArmature(String),
}
