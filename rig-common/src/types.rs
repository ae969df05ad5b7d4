//! Interchange data model
//!
//! Everything here is plain data produced by the export pipeline and consumed
//! by the text formats. Values are built once per exported object and are not
//! mutated afterwards.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;

/// Maximum number of joints in a skeleton.
///
/// Downstream consumers store joint indices as signed 16-bit values.
pub const MAX_JOINTS: usize = 0x7fff;

/// Maximum number of skin influences per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Number of weights stored per vertex (the last influence is implicit)
pub const STORED_WEIGHTS: usize = 3;

/// Joint id used for unused influence slots
pub const UNUSED_JOINT: i32 = -1;

/// Exported skeleton node
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint, or -1 for the root
    pub parent_index: i32,
    /// Bind pose relative to the parent joint (relative to identity for the root)
    pub bind_local_transform: Mat4,
}

impl Joint {
    /// Parent joint index, `None` for the root
    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }

    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }

    /// Whether `name` survives the line-based text formats: it must not be
    /// blank and must fit on one line.
    pub fn is_valid_name(name: &str) -> bool {
        !name.trim().is_empty() && !name.contains(['\n', '\r'])
    }
}

/// Consolidated vertex with up to four skin influences
///
/// Only the first three weights are stored. The fourth influence's weight is
/// `1 - sum(weights)` and is never written out; see [`Vertex::implicit_weight`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Joint indices, [`UNUSED_JOINT`] for empty slots
    pub joint_ids: [i32; MAX_INFLUENCES],
    pub weights: [f32; STORED_WEIGHTS],
}

impl Vertex {
    /// Vertex without any skin influence
    pub fn unskinned(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            joint_ids: [UNUSED_JOINT; MAX_INFLUENCES],
            weights: [0.0; STORED_WEIGHTS],
        }
    }

    /// Weight of the fourth influence, derived from the stored three.
    ///
    /// Not renormalized: if the source weights did not sum to one the
    /// result is not a unit partition either.
    pub fn implicit_weight(&self) -> f32 {
        1.0 - self.weights.iter().sum::<f32>()
    }

    /// Number of used influence slots
    pub fn influence_count(&self) -> usize {
        self.joint_ids.iter().filter(|&&j| j != UNUSED_JOINT).count()
    }
}

/// Triangle indexing into the consolidated vertex array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle {
    pub v0: u32,
    pub v1: u32,
    pub v2: u32,
}

impl Triangle {
    pub const fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Self { v0, v1, v2 }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.v0, self.v1, self.v2]
    }
}

/// Immutable name <-> joint index table
///
/// Built once from the flattened skeleton. Index lookups go through the name
/// list, name lookups through the hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointTable {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl JointTable {
    /// Build a table from joint names in index order.
    ///
    /// If a name repeats, the later index wins the name lookup.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let indices = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, indices }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in index order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Skinned static mesh ready for serialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Skeleton joints in pre-order; empty when the object has no armature
    pub joints: Vec<Joint>,
    pub joint_table: JointTable,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty()
    }
}

/// Joint transform relative to its parent at one animation frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    pub local_position: Vec3,
    /// Stored as (x, y, z, w)
    pub local_rotation: Quat,
    pub local_scale: Vec3,
}

impl Default for JointSample {
    fn default() -> Self {
        Self {
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            local_scale: Vec3::ONE,
        }
    }
}

impl JointSample {
    /// Decompose a local transform matrix into translation, rotation and scale
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            local_position: translation,
            local_rotation: rotation,
            local_scale: scale,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.local_scale,
            self.local_rotation,
            self.local_position,
        )
    }
}

/// Samples of one joint, in frame order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointAnimation {
    pub name: String,
    pub samples: Vec<JointSample>,
}

impl JointAnimation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
        }
    }
}

/// Per-frame snapshot animation clip
///
/// Every entry in `joints` carries exactly `sample_count` samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampledAnimation {
    pub sample_count: usize,
    pub joint_table: JointTable,
    /// Same order and cardinality as the skeleton's joints
    pub joints: Vec<JointAnimation>,
}

impl SampledAnimation {
    pub fn joint(&self, name: &str) -> Option<&JointAnimation> {
        self.joint_table
            .index_of(name)
            .and_then(|index| self.joints.get(index))
    }
}
