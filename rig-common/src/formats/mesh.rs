//! Skinned mesh text format (.mesh)
//!
//! # Layout
//! ```text
//! [1]
//!
//! joint_count <uint>
//! vertex_count <uint>
//! triangle_count <uint>
//!
//! joints:
//! <name>
//! <m00> <m01> <m02> <m03>      bind transform relative to the parent,
//! <m10> <m11> <m12> <m13>      one matrix row per line
//! <m20> <m21> <m22> <m23>
//! <m30> <m31> <m32> <m33>
//! <parent_index or -1>
//!
//! vertices:
//! <px> <py> <pz>
//! <nx> <ny> <nz>
//! <w0> <w1> <w2>
//! <j0> <j1> <j2> <j3>
//!
//! triangles:
//! <v0> <v1> <v2>
//! ```
//!
//! Joint and vertex records are followed by a blank line; triangle lines are dense.

use glam::{Mat4, Vec3, Vec4};
use std::io::{self, Write};

use super::reader::LineReader;
use super::{FORMAT_VERSION, FormatError, write_vec3, write_vec4, write_version};
use crate::types::{Joint, JointTable, Mesh, Triangle, Vertex};

/// Write a complete mesh file
pub fn write_mesh<W: Write>(w: &mut W, mesh: &Mesh) -> io::Result<()> {
    write_version(w)?;
    writeln!(w, "joint_count {}", mesh.joints.len())?;
    writeln!(w, "vertex_count {}", mesh.vertices.len())?;
    write!(w, "triangle_count {}\n\n", mesh.triangles.len())?;

    writeln!(w, "joints:")?;
    for joint in &mesh.joints {
        writeln!(w, "{}", joint.name)?;
        for row in 0..4 {
            write_vec4(w, joint.bind_local_transform.row(row))?;
        }
        write!(w, "{}\n\n", joint.parent_index)?;
    }

    writeln!(w, "vertices:")?;
    for vertex in &mesh.vertices {
        write_vec3(w, vertex.position)?;
        write_vec3(w, vertex.normal)?;
        let [w0, w1, w2] = vertex.weights;
        writeln!(w, "{:.6} {:.6} {:.6}", w0, w1, w2)?;
        let [j0, j1, j2, j3] = vertex.joint_ids;
        write!(w, "{} {} {} {}\n\n", j0, j1, j2, j3)?;
    }

    writeln!(w, "triangles:")?;
    for tri in &mesh.triangles {
        writeln!(w, "{} {} {}", tri.v0, tri.v1, tri.v2)?;
    }

    Ok(())
}

/// Parse a complete mesh file
pub fn parse_mesh(text: &str) -> Result<Mesh, FormatError> {
    let mut reader = LineReader::new(text);
    reader.expect_version(FORMAT_VERSION)?;

    let joint_count: usize = reader.read_field("joint_count")?;
    let vertex_count: usize = reader.read_field("vertex_count")?;
    let triangle_count: usize = reader.read_field("triangle_count")?;

    reader.expect_literal("joints:")?;
    let mut joints = Vec::new();
    for _ in 0..joint_count {
        let name = reader.read_name("joint name")?;
        let mut rows = [Vec4::ZERO; 4];
        for row in &mut rows {
            *row = Vec4::from_array(reader.read_values::<f32, 4>("joint matrix")?);
        }
        // Rows in the file, columns in glam
        let bind_local_transform = Mat4::from_cols(rows[0], rows[1], rows[2], rows[3]).transpose();
        let [parent_index] = reader.read_values::<i32, 1>("joint parent")?;
        joints.push(Joint {
            name,
            parent_index,
            bind_local_transform,
        });
    }

    reader.expect_literal("vertices:")?;
    let mut vertices = Vec::new();
    for _ in 0..vertex_count {
        let position = Vec3::from_array(reader.read_values("vertex position")?);
        let normal = Vec3::from_array(reader.read_values("vertex normal")?);
        let weights = reader.read_values("vertex weights")?;
        let joint_ids = reader.read_values("vertex joints")?;
        vertices.push(Vertex {
            position,
            normal,
            joint_ids,
            weights,
        });
    }

    reader.expect_literal("triangles:")?;
    let mut triangles = Vec::new();
    for _ in 0..triangle_count {
        let [v0, v1, v2] = reader.read_values("triangle")?;
        triangles.push(Triangle { v0, v1, v2 });
    }
    reader.finish()?;

    let joint_table = JointTable::from_names(joints.iter().map(|j| j.name.clone()));
    Ok(Mesh {
        joints,
        joint_table,
        vertices,
        triangles,
    })
}
