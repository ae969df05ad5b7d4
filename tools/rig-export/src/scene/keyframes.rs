//! Keyframe tracks and interpolation
//!
//! Tracks are sampled at arbitrary (fractional) frames. Before the first key
//! and after the last one the nearest key's value is held.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How values between two keys are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Hold the previous key's value until the next key
    Step,
}

/// Single keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key<T> {
    pub frame: f32,
    pub value: T,
}

/// Value types that can be blended between two keys
pub trait Interpolate: Copy {
    fn interpolate(from: Self, to: Self, factor: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(from: Self, to: Self, factor: f32) -> Self {
        from.lerp(to, factor)
    }
}

impl Interpolate for Quat {
    fn interpolate(from: Self, to: Self, factor: f32) -> Self {
        // Shortest path, renormalized
        from.slerp(to, factor).normalize()
    }
}

/// Keys of one animated property, sorted by frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>", serialize = "T: Serialize"))]
pub struct Track<T> {
    #[serde(default)]
    pub interpolation: Interpolation,
    pub keys: Vec<Key<T>>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            keys: Vec::new(),
        }
    }
}

impl<T: Interpolate> Track<T> {
    pub fn new(interpolation: Interpolation, keys: Vec<Key<T>>) -> Self {
        let mut track = Self { interpolation, keys };
        track.sort();
        track
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Order keys by frame (stable for equal frames)
    pub fn sort(&mut self) {
        self.keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
    }

    /// First and last key frame
    pub fn frame_range(&self) -> Option<(f32, f32)> {
        Some((self.keys.first()?.frame, self.keys.last()?.frame))
    }

    /// Value at `frame`, `None` if the track has no keys
    pub fn sample(&self, frame: f32) -> Option<T> {
        let first = self.keys.first()?;
        // Index of the first key strictly after `frame`
        let next = self.keys.partition_point(|k| k.frame <= frame);
        if next == 0 {
            return Some(first.value);
        }
        let prev = &self.keys[next - 1];
        let Some(next) = self.keys.get(next) else {
            return Some(prev.value);
        };

        match self.interpolation {
            Interpolation::Step => Some(prev.value),
            Interpolation::Linear => {
                let span = next.frame - prev.frame;
                let factor = if span > 0.0 {
                    ((frame - prev.frame) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Some(T::interpolate(prev.value, next.value, factor))
            }
        }
    }
}

/// Translation, rotation and scale of one bone relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trs {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Trs {
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_mat4(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_track(interpolation: Interpolation) -> Track<Vec3> {
        Track::new(
            interpolation,
            vec![
                Key {
                    frame: 10.0,
                    value: Vec3::new(2.0, 0.0, 0.0),
                },
                Key {
                    frame: 0.0,
                    value: Vec3::ZERO,
                },
            ],
        )
    }

    #[test]
    fn test_keys_sorted_on_construction() {
        let track = vec_track(Interpolation::Linear);
        assert_eq!(track.frame_range(), Some((0.0, 10.0)));
    }

    #[test]
    fn test_linear_sampling() {
        let track = vec_track(Interpolation::Linear);
        assert_eq!(track.sample(5.0), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(track.sample(0.0), Some(Vec3::ZERO));
        assert_eq!(track.sample(10.0), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_sampling_clamps_outside_range() {
        let track = vec_track(Interpolation::Linear);
        assert_eq!(track.sample(-4.0), Some(Vec3::ZERO));
        assert_eq!(track.sample(25.0), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_step_sampling() {
        let track = vec_track(Interpolation::Step);
        assert_eq!(track.sample(9.9), Some(Vec3::ZERO));
        assert_eq!(track.sample(10.0), Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_empty_track() {
        let track: Track<Vec3> = Track::default();
        assert_eq!(track.sample(1.0), None);
        assert_eq!(track.frame_range(), None);
    }

    #[test]
    fn test_quat_slerp_midpoint() {
        let track = Track::new(
            Interpolation::Linear,
            vec![
                Key {
                    frame: 0.0,
                    value: Quat::IDENTITY,
                },
                Key {
                    frame: 2.0,
                    value: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                },
            ],
        );
        let mid = track.sample(1.0).unwrap();
        assert!(mid.abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4), 1e-5));
    }

    #[test]
    fn test_trs_matrix_roundtrip() {
        let trs = Trs {
            translation: Vec3::new(1.0, -2.0, 0.5),
            rotation: Quat::from_rotation_y(0.4),
            scale: Vec3::splat(1.5),
        };
        let back = Trs::from_mat4(trs.to_mat4());
        assert!(back.translation.abs_diff_eq(trs.translation, 1e-5));
        assert!(back.rotation.abs_diff_eq(trs.rotation, 1e-5));
        assert!(back.scale.abs_diff_eq(trs.scale, 1e-5));
    }
}
