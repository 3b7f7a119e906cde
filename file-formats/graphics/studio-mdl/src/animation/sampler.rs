//! Per-bone pose sampling from a blend layer

use glam::{Quat, Vec3};

use crate::chunks::StudioBone;

use super::controller::BoneAdjustments;
use super::curve::{AnimCurve, AnimTrack};
use super::types::{angle_quaternion, quaternion_slerp};

/// Sampled local transform of one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneSample {
    pub position: Vec3,
    pub rotation: Quat,
    /// Euler angles (radians) the rotation was built from; the later triple
    /// when two frames were interpolated
    pub angles: Vec3,
}

/// Default value plus the scaled bracketing samples of one channel
fn channel_pair(
    bone: &StudioBone,
    curve: Option<AnimCurve<'_>>,
    channel: usize,
    frame: usize,
) -> (f32, f32) {
    let default = bone.value[channel];
    let Some(sample) = curve.and_then(|curve| curve.sample(frame)) else {
        if curve.is_some() {
            log::trace!(
                "Curve for bone '{}' channel {channel} ends before frame {frame}",
                bone.name
            );
        }
        return (default, default);
    };

    let scale = bone.scale[channel];
    (
        default + f32::from(sample.v1) * scale,
        default + f32::from(sample.v2) * scale,
    )
}

fn adjustment(bone: &StudioBone, channel: usize, adjustments: Option<&BoneAdjustments>) -> f32 {
    match (bone.controllers[channel], adjustments) {
        (Some(controller), Some(adjustments)) => adjustments.get(controller),
        _ => 0.0,
    }
}

/// Rotation of `bone` at `frame + s` and the angles it was built from
pub fn sample_rotation(
    bone: &StudioBone,
    track: Option<&AnimTrack<'_>>,
    bone_index: usize,
    frame: usize,
    s: f32,
    adjustments: Option<&BoneAdjustments>,
) -> (Quat, Vec3) {
    let mut angle1 = [0.0f32; 3];
    let mut angle2 = [0.0f32; 3];

    for axis in 0..3 {
        let channel = axis + 3;
        let curve = track.and_then(|track| track.curve(bone_index, channel));
        let (a, b) = channel_pair(bone, curve, channel, frame);
        let adj = adjustment(bone, channel, adjustments);
        angle1[axis] = a + adj;
        angle2[axis] = b + adj;
    }

    let angle1 = Vec3::from_array(angle1);
    let angle2 = Vec3::from_array(angle2);

    if angle1 == angle2 {
        (angle_quaternion(angle1), angle1)
    } else {
        let q1 = angle_quaternion(angle1);
        let q2 = angle_quaternion(angle2);
        (quaternion_slerp(q1, q2, s), angle2)
    }
}

/// Position of `bone` at `frame + s`
///
/// Positions share the rotation curve walk, so the last explicit sample of a
/// span blends toward the first sample of the next span.
pub fn sample_position(
    bone: &StudioBone,
    track: Option<&AnimTrack<'_>>,
    bone_index: usize,
    frame: usize,
    s: f32,
    adjustments: Option<&BoneAdjustments>,
) -> Vec3 {
    let mut position = [0.0f32; 3];

    for (axis, value) in position.iter_mut().enumerate() {
        let curve = track.and_then(|track| track.curve(bone_index, axis));
        let (a, b) = channel_pair(bone, curve, axis, frame);
        *value = a * (1.0 - s) + b * s + adjustment(bone, axis, adjustments);
    }

    Vec3::from_array(position)
}

/// Full local transform of one bone
///
/// A missing track samples the bone's defaults on every channel.
pub fn sample_bone(
    bone: &StudioBone,
    track: Option<&AnimTrack<'_>>,
    bone_index: usize,
    frame: usize,
    s: f32,
    adjustments: Option<&BoneAdjustments>,
) -> BoneSample {
    let (rotation, angles) = sample_rotation(bone, track, bone_index, frame, s, adjustments);
    let position = sample_position(bone, track, bone_index, frame, s, adjustments);

    BoneSample {
        position,
        rotation,
        angles,
    }
}
