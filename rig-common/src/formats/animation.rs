//! Sampled animation text format (.anim)
//!
//! # Layout
//! ```text
//! [1]
//!
//! joint_count <uint>
//! sample_count <uint>
//!
//! <joint_name>
//!
//! <px> <py> <pz>
//! <qx> <qy> <qz> <qw>
//! <sx> <sy> <sz>
//! ```
//!
//! Each joint name is followed by `sample_count` blank-line-separated sample
//! blocks, one per frame. Joints appear in skeleton order.

use glam::{Quat, Vec3};
use std::io::{self, Write};

use super::reader::LineReader;
use super::{FORMAT_VERSION, FormatError, write_vec3, write_version};
use crate::types::{JointAnimation, JointSample, JointTable, SampledAnimation};

/// Write a complete animation file
pub fn write_animation<W: Write>(w: &mut W, anim: &SampledAnimation) -> io::Result<()> {
    write_version(w)?;
    writeln!(w, "joint_count {}", anim.joints.len())?;
    write!(w, "sample_count {}\n\n", anim.sample_count)?;

    for joint in &anim.joints {
        write!(w, "{}\n\n", joint.name)?;
        for sample in &joint.samples {
            write_vec3(w, sample.local_position)?;
            let q = sample.local_rotation;
            writeln!(w, "{:.6} {:.6} {:.6} {:.6}", q.x, q.y, q.z, q.w)?;
            write_vec3(w, sample.local_scale)?;
            writeln!(w)?;
        }
    }

    Ok(())
}

/// Parse a complete animation file
pub fn parse_animation(text: &str) -> Result<SampledAnimation, FormatError> {
    let mut reader = LineReader::new(text);
    reader.expect_version(FORMAT_VERSION)?;

    let joint_count: usize = reader.read_field("joint_count")?;
    let sample_count: usize = reader.read_field("sample_count")?;

    let mut joints = Vec::new();
    for _ in 0..joint_count {
        let mut joint = JointAnimation::new(reader.read_name("joint name")?);
        for _ in 0..sample_count {
            let local_position = Vec3::from_array(reader.read_values("sample position")?);
            let [x, y, z, w] = reader.read_values("sample rotation")?;
            let local_scale = Vec3::from_array(reader.read_values("sample scale")?);
            joint.samples.push(JointSample {
                local_position,
                local_rotation: Quat::from_xyzw(x, y, z, w),
                local_scale,
            });
        }
        joints.push(joint);
    }
    reader.finish()?;

    Ok(SampledAnimation {
        sample_count,
        joint_table: JointTable::from_names(joints.iter().map(|j| j.name.clone())),
        joints,
    })
}
