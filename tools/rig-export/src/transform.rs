//! Coordinate-space composition
//!
//! Scenes are authored in a right-handed space with forward `+Y` and up `+Z`.
//! Targets pick their own forward/up pair; [`AxisPair::conversion_matrix`]
//! maps one convention onto the other.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One signed coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "Y")]
    Y,
    #[serde(rename = "Z")]
    Z,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "-Z")]
    NegZ,
}

impl Axis {
    pub fn vector(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
            Axis::NegX => Vec3::NEG_X,
            Axis::NegY => Vec3::NEG_Y,
            Axis::NegZ => Vec3::NEG_Z,
        }
    }

    /// Unsigned component index (0 = X, 1 = Y, 2 = Z)
    fn component(self) -> usize {
        match self {
            Axis::X | Axis::NegX => 0,
            Axis::Y | Axis::NegY => 1,
            Axis::Z | Axis::NegZ => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = AxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" | "+X" => Ok(Axis::X),
            "Y" | "+Y" => Ok(Axis::Y),
            "Z" | "+Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            _ => Err(AxisError::InvalidAxis(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AxisError {
    #[error("invalid axis {0:?} (expected one of X, Y, Z, -X, -Y, -Z)")]
    InvalidAxis(String),

    #[error("forward axis {forward} and up axis {up} must be different")]
    SameAxis { forward: Axis, up: Axis },
}

/// Forward/up convention of a coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPair {
    forward: Axis,
    up: Axis,
}

impl AxisPair {
    /// Convention scenes are authored in
    pub const SOURCE: Self = Self {
        forward: Axis::Y,
        up: Axis::Z,
    };

    pub fn new(forward: Axis, up: Axis) -> Result<Self, AxisError> {
        if forward.component() == up.component() {
            return Err(AxisError::SameAxis { forward, up });
        }
        Ok(Self { forward, up })
    }

    pub fn forward(&self) -> Axis {
        self.forward
    }

    pub fn up(&self) -> Axis {
        self.up
    }

    /// Orthonormal basis with columns (forward, up, forward x up)
    fn basis(&self) -> Mat3 {
        let forward = self.forward.vector();
        let up = self.up.vector();
        Mat3::from_cols(forward, up, forward.cross(up))
    }

    /// Rotation taking the source convention onto this one
    pub fn conversion_matrix(&self) -> Mat4 {
        // Bases are orthonormal, so the inverse is the transpose
        Mat4::from_mat3(self.basis() * Self::SOURCE.basis().transpose())
    }
}

impl Default for AxisPair {
    /// Forward `-Z`, up `Y`
    fn default() -> Self {
        Self {
            forward: Axis::NegZ,
            up: Axis::Y,
        }
    }
}

/// Build the single output-space matrix for mesh data.
///
/// The object's world transform (when applied) acts first, then the axis
/// conversion: `conversion * world`.
pub fn compose_transform(object_world: Mat4, apply_transform: bool, axes: Option<AxisPair>) -> Mat4 {
    let base = if apply_transform {
        object_world
    } else {
        Mat4::IDENTITY
    };
    match axes {
        Some(axes) => axes.conversion_matrix() * base,
        None => base,
    }
}

/// Build the output-space matrix applied to evaluated bone poses.
///
/// Poses are converted in armature space before the world transform is
/// applied: `world * conversion`.
pub fn compose_pose_transform(
    object_world: Mat4,
    apply_transform: bool,
    axes: Option<AxisPair>,
) -> Mat4 {
    let base = if apply_transform {
        object_world
    } else {
        Mat4::IDENTITY
    };
    match axes {
        Some(axes) => base * axes.conversion_matrix(),
        None => base,
    }
}

/// Matrix for transforming normals (inverse transpose of the linear part).
///
/// Falls back to the linear part itself when it is singular.
pub fn normal_matrix(transform: Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(transform);
    if linear.determinant().abs() <= f32::EPSILON {
        return linear;
    }
    linear.inverse().transpose()
}
