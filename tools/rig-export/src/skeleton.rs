//! Skeleton flattening
//!
//! Turns an armature's bone tree into a parent-indexed joint array in
//! pre-order, keeping only deforming bones.

use glam::Mat4;
use rig_common::{Joint, JointTable, MAX_JOINTS};
use tracing::debug;

use crate::error::ExportError;
use crate::scene::Armature;

/// Flattened deforming skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    /// Joints in pre-order; the root is at index 0
    pub joints: Vec<Joint>,
    pub table: JointTable,
    /// Source bone index for each joint
    pub bones: Vec<usize>,
}

impl Skeleton {
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Flatten the deforming bones of `armature`.
///
/// `transform` maps armature space into the output space. Root joints keep
/// their transformed bind matrix; every other joint stores its bind pose
/// relative to its parent's.
pub fn flatten_skeleton(armature: &Armature, transform: Mat4) -> Result<Skeleton, ExportError> {
    let bones = &armature.bones;

    let mut root: Option<usize> = None;
    for (index, bone) in bones.iter().enumerate() {
        if bone.parent.is_some() || !bone.deform {
            continue;
        }
        if let Some(first) = root {
            return Err(ExportError::MultipleRoots {
                first: bones[first].name.clone(),
                second: bone.name.clone(),
            });
        }
        root = Some(index);
    }
    let root = root.ok_or(ExportError::NoRoot)?;

    let children = armature.children();

    // (bone, parent joint) pairs in pre-order
    let mut order: Vec<(usize, i32)> = Vec::with_capacity(bones.len());
    let mut stack = vec![(root, -1i32)];
    while let Some((bone, parent)) = stack.pop() {
        let joint = order.len() as i32;
        order.push((bone, parent));
        stack.extend(
            children[bone]
                .iter()
                .rev()
                .filter(|&&child| bones[child].deform)
                .map(|&child| (child, joint)),
        );
    }

    if order.len() > MAX_JOINTS {
        return Err(ExportError::TooManyJoints(order.len()));
    }
    if let Some(bone) = order
        .iter()
        .map(|&(bone, _)| &bones[bone])
        .find(|bone| !Joint::is_valid_name(&bone.name))
    {
        return Err(ExportError::InvalidJointName(bone.name.clone()));
    }

    let bind: Vec<Mat4> = order
        .iter()
        .map(|&(bone, _)| transform * bones[bone].bind_matrix)
        .collect();
    let joints: Vec<Joint> = order
        .iter()
        .enumerate()
        .map(|(index, &(bone, parent))| {
            let bind_local_transform = match usize::try_from(parent) {
                Ok(parent) => bind[parent].inverse() * bind[index],
                Err(_) => bind[index],
            };
            Joint {
                name: bones[bone].name.clone(),
                parent_index: parent,
                bind_local_transform,
            }
        })
        .collect();

    debug!(
        "Flattened {} of {} bones into joints (root {:?})",
        joints.len(),
        bones.len(),
        bones[root].name
    );

    Ok(Skeleton {
        table: JointTable::from_names(joints.iter().map(|j| j.name.clone())),
        bones: order.into_iter().map(|(bone, _)| bone).collect(),
        joints,
    })
}
