//! Programmatic glTF generation for integration tests.
//!
//! Writes a `.gltf` + `.bin` pair with:
//! - Skinned quad (positions, normals, joints, weights, indices)
//! - 2-bone skeleton (Root -> Spine) with inverse bind matrices
//! - "Wave" animation rotating Spine 90 degrees about Z over one second

mod buffer;

use serde_json::json;
use std::path::{Path, PathBuf};

use buffer::BufferBuilder;

/// Bone count for the test skeleton
pub const BONE_COUNT: usize = 2;
/// Vertex count of the test quad
pub const VERTEX_COUNT: usize = 4;
/// Height of Spine above Root
pub const SPINE_HEIGHT: f32 = 1.0;
/// Length of the Wave animation in seconds
pub const WAVE_SECONDS: f32 = 1.0;

/// Quad corners; the top-right one is shared between Root and Spine
pub const POSITIONS: [[f32; 3]; VERTEX_COUNT] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
];

const JOINTS: [[u16; 4]; VERTEX_COUNT] = [[0, 0, 0, 0], [0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]];
const WEIGHTS: [[f32; 4]; VERTEX_COUNT] = [
    [1.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
    [0.5, 0.5, 0.0, 0.0],
];
const INDICES: [u16; 6] = [0, 1, 2, 1, 3, 2];

// glTF component types
const UNSIGNED_SHORT: u32 = 5123;
const FLOAT: u32 = 5126;

/// Write `<dir>/<name>.gltf` and its buffer, returning the `.gltf` path.
///
/// The mesh node carries a translation that a skinned mesh must ignore.
pub fn write_skinned_gltf(dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    let mut buffer = BufferBuilder::default();

    let positions = buffer.push_f32(POSITIONS.iter().flatten().copied());
    let normals = buffer.push_f32(POSITIONS.iter().flat_map(|_| [0.0, 0.0, 1.0]));
    let joints = buffer.push_u16(JOINTS.iter().flatten().copied());
    let weights = buffer.push_f32(WEIGHTS.iter().flatten().copied());
    let indices = buffer.push_u16(INDICES.iter().copied());

    // Root at the origin, Spine one unit up
    let mut inverse_bind = Vec::new();
    inverse_bind.extend(glam::Mat4::IDENTITY.to_cols_array());
    inverse_bind.extend(
        glam::Mat4::from_translation(glam::Vec3::new(0.0, -SPINE_HEIGHT, 0.0)).to_cols_array(),
    );
    let ibm = buffer.push_f32(inverse_bind);

    let times = buffer.push_f32([0.0, WAVE_SECONDS]);
    let quarter = glam::Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let rotations = buffer.push_f32([0.0, 0.0, 0.0, 1.0].into_iter().chain(quarter.to_array()));

    let bin_name = format!("{}.bin", name);
    let root = json!({
        "asset": { "version": "2.0", "generator": "rig-export tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 2] }],
        "nodes": [
            { "name": "Root", "children": [1] },
            { "name": "Spine", "translation": [0.0, SPINE_HEIGHT, 0.0] },
            { "name": "Body", "mesh": 0, "skin": 0, "translation": [5.0, 0.0, 0.0] }
        ],
        "meshes": [{
            "name": "Body",
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1,
                    "JOINTS_0": 2,
                    "WEIGHTS_0": 3
                },
                "indices": 4,
                "mode": 4
            }]
        }],
        "skins": [{ "name": "Rig", "joints": [0, 1], "inverseBindMatrices": 5 }],
        "animations": [{
            "name": "Wave",
            "samplers": [{ "input": 6, "output": 7, "interpolation": "LINEAR" }],
            "channels": [{ "sampler": 0, "target": { "node": 1, "path": "rotation" } }]
        }],
        "accessors": [
            {
                "bufferView": positions, "componentType": FLOAT, "count": VERTEX_COUNT,
                "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": normals, "componentType": FLOAT, "count": VERTEX_COUNT, "type": "VEC3" },
            { "bufferView": joints, "componentType": UNSIGNED_SHORT, "count": VERTEX_COUNT, "type": "VEC4" },
            { "bufferView": weights, "componentType": FLOAT, "count": VERTEX_COUNT, "type": "VEC4" },
            { "bufferView": indices, "componentType": UNSIGNED_SHORT, "count": INDICES.len(), "type": "SCALAR" },
            { "bufferView": ibm, "componentType": FLOAT, "count": BONE_COUNT, "type": "MAT4" },
            {
                "bufferView": times, "componentType": FLOAT, "count": 2,
                "type": "SCALAR", "min": [0.0], "max": [WAVE_SECONDS]
            },
            { "bufferView": rotations, "componentType": FLOAT, "count": 2, "type": "VEC4" }
        ],
        "bufferViews": buffer.views(),
        "buffers": [{ "uri": bin_name, "byteLength": buffer.len() }]
    });

    std::fs::write(dir.join(&bin_name), buffer.bytes())?;
    let path = dir.join(format!("{}.gltf", name));
    let text = serde_json::to_string_pretty(&root).map_err(std::io::Error::other)?;
    std::fs::write(&path, text)?;
    Ok(path)
}
