//! Pose sampling
//!
//! Samples a skeleton once per frame and stores every joint's transform
//! relative to its parent at the same frame.

use glam::Mat4;
use rig_common::{JointAnimation, JointSample, JointTable, SampledAnimation};
use tracing::debug;

use crate::error::ExportError;
use crate::skeleton::Skeleton;

/// Source of posed bone matrices
pub trait PoseEvaluator {
    /// Armature space matrix of `bone` at `frame`, `None` if the bone does not
    /// exist at that frame.
    ///
    /// Frames are requested in increasing order.
    fn evaluate_bone_world_matrix(&mut self, bone: &str, frame: i32) -> Option<Mat4>;
}

/// Half-open frame interval `[begin, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub begin: i32,
    pub end: i32,
}

impl FrameRange {
    pub fn new(begin: i32, end: i32) -> Self {
        Self { begin, end }
    }

    /// Range covering keyframes from `start` to `end`, truncated to whole frames
    pub fn from_keyframes((start, end): (f32, f32)) -> Self {
        Self::new(start as i32, end as i32)
    }

    pub fn len(&self) -> usize {
        (self.end - self.begin).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    pub fn frames(&self) -> std::ops::Range<i32> {
        self.begin..self.end
    }
}

/// Sample every joint of `skeleton` over `range`.
///
/// `transform` maps armature space into the output space. Joints the
/// evaluator does not know at `range.begin` are left out of the clip.
pub fn sample_animation<E: PoseEvaluator + ?Sized>(
    evaluator: &mut E,
    skeleton: &Skeleton,
    range: FrameRange,
    transform: Mat4,
    clip: &str,
) -> Result<SampledAnimation, ExportError> {
    let present: Vec<usize> = (0..skeleton.len())
        .filter(|&j| {
            evaluator
                .evaluate_bone_world_matrix(&skeleton.joints[j].name, range.begin)
                .is_some()
        })
        .collect();

    let mut joints: Vec<JointAnimation> = present
        .iter()
        .map(|&j| {
            let mut anim = JointAnimation::new(skeleton.joints[j].name.clone());
            anim.samples.reserve(range.len());
            anim
        })
        .collect();

    let mut world: Vec<Option<Mat4>> = vec![None; skeleton.len()];
    for frame in range.frames() {
        for (j, joint) in skeleton.joints.iter().enumerate() {
            world[j] = evaluator
                .evaluate_bone_world_matrix(&joint.name, frame)
                .map(|m| transform * m);
        }

        for (anim, &j) in joints.iter_mut().zip(&present) {
            let Some(matrix) = world[j] else {
                continue;
            };
            let local = match skeleton.joints[j].parent() {
                Some(parent) => match world[parent] {
                    Some(parent) => parent.inverse() * matrix,
                    None => continue,
                },
                None => matrix,
            };
            anim.samples.push(JointSample::from_matrix(local));
        }
    }

    let sample_count = joints.first().map_or(0, |j| j.samples.len());
    if let Some(joint) = joints.iter().find(|j| j.samples.len() != sample_count) {
        return Err(ExportError::InconsistentSampleCount {
            clip: clip.to_string(),
            joint: joint.name.clone(),
            expected: sample_count,
            found: joint.samples.len(),
        });
    }

    debug!(
        "Sampled {:?}: {} joints, {} frames ({}..{})",
        clip,
        joints.len(),
        sample_count,
        range.begin,
        range.end
    );

    Ok(SampledAnimation {
        sample_count,
        joint_table: JointTable::from_names(joints.iter().map(|j| j.name.clone())),
        joints,
    })
}
