//! Vertex consolidation
//!
//! Welds the source mesh per source vertex index and resolves vertex group
//! memberships into joint indices.

use glam::Mat4;
use hashbrown::HashMap;
use rig_common::{MAX_INFLUENCES, Mesh, STORED_WEIGHTS, Triangle, UNUSED_JOINT, Vertex};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::ExportError;
use crate::scene::{SourceMesh, SourceVertex, VertexGroup};
use crate::skeleton::Skeleton;
use crate::transform::normal_matrix;

/// Build the exported mesh for one object.
///
/// `transform` maps mesh object space into the output space. `skeleton` is
/// the flattened skeleton of the deforming armature, if any.
pub fn consolidate_mesh(
    source: &SourceMesh,
    vertex_groups: &[VertexGroup],
    skeleton: Option<&Skeleton>,
    transform: Mat4,
) -> Result<Mesh, ExportError> {
    let group_names: HashMap<u32, &str> = vertex_groups
        .iter()
        .map(|g| (g.index, g.name.as_str()))
        .collect();
    let normals = normal_matrix(transform);

    // Source vertex index -> consolidated index
    let mut remap: Vec<Option<u32>> = vec![None; source.vertices.len()];
    let mut vertices = Vec::with_capacity(source.vertices.len());
    let mut triangles = Vec::with_capacity(source.polygons.len());

    for (polygon_index, polygon) in source.polygons.iter().enumerate() {
        let corners = polygon.corners();
        if corners.len() != 3 {
            return Err(ExportError::NonTriangularPolygon {
                polygon: polygon_index,
                corners: corners.len(),
            });
        }

        let mut tri = [0u32; 3];
        for (slot, &src) in tri.iter_mut().zip(corners) {
            let Some(entry) = remap.get_mut(src as usize) else {
                return Err(ExportError::VertexOutOfRange {
                    polygon: polygon_index,
                    vertex: src,
                    count: source.vertices.len(),
                });
            };
            *slot = match *entry {
                Some(index) => index,
                None => {
                    let vertex = consolidate_vertex(
                        src,
                        &source.vertices[src as usize],
                        &group_names,
                        skeleton,
                    )?;
                    let index = vertices.len() as u32;
                    vertices.push(Vertex {
                        position: transform.transform_point3(vertex.position),
                        normal: (normals * vertex.normal).normalize_or_zero(),
                        ..vertex
                    });
                    *entry = Some(index);
                    index
                }
            };
        }
        triangles.push(Triangle::new(tri[0], tri[1], tri[2]));
    }

    debug!(
        "Consolidated {} source vertices into {} vertices, {} triangles",
        source.vertices.len(),
        vertices.len(),
        triangles.len()
    );

    let (joints, joint_table) = match skeleton {
        Some(skeleton) => (skeleton.joints.clone(), skeleton.table.clone()),
        None => Default::default(),
    };
    Ok(Mesh {
        joints,
        joint_table,
        vertices,
        triangles,
    })
}

/// Untransformed vertex with its influences resolved
fn consolidate_vertex(
    index: u32,
    source: &SourceVertex,
    group_names: &HashMap<u32, &str>,
    skeleton: Option<&Skeleton>,
) -> Result<Vertex, ExportError> {
    let mut vertex = Vertex::unskinned(source.position, source.normal);
    if source.groups.is_empty() {
        return Ok(vertex);
    }

    let Some(skeleton) = skeleton else {
        return Err(ExportError::UnexpectedSkinning { vertex: index });
    };
    if source.groups.len() > MAX_INFLUENCES {
        return Err(ExportError::TooManyInfluences {
            vertex: index,
            count: source.groups.len(),
        });
    }

    let mut influences: SmallVec<[(i32, f32); MAX_INFLUENCES]> = SmallVec::new();
    for membership in &source.groups {
        let Some(&name) = group_names.get(&membership.group) else {
            return Err(ExportError::UnknownJointGroup {
                vertex: index,
                group: format!("#{}", membership.group),
            });
        };
        let Some(joint) = skeleton.table.index_of(name) else {
            return Err(ExportError::UnknownJointGroup {
                vertex: index,
                group: name.to_string(),
            });
        };
        influences.push((joint as i32, membership.weight));
    }

    for (slot, &(joint, weight)) in influences.iter().enumerate() {
        vertex.joint_ids[slot] = joint;
        if slot < STORED_WEIGHTS {
            vertex.weights[slot] = round_weight(weight);
        }
    }
    debug_assert!(vertex.joint_ids[influences.len()..].iter().all(|&j| j == UNUSED_JOINT));
    Ok(vertex)
}

/// Round to six decimal digits
fn round_weight(weight: f32) -> f32 {
    ((weight as f64 * 1e6).round() / 1e6) as f32
}
