//! Sequence evaluation and pose blending
//!
//! A sequence holds 1, 2 or 4 blend layers. Two layers blend along the
//! first axis; four form a grid where pairs `(A, B)` and `(C, D)` blend
//! along the first axis and the two results along the second.

use glam::Vec3;

use crate::chunks::{MotionFlags, StudioSequence};
use crate::model::StudioModel;

use super::controller::BoneAdjustments;
use super::sampler::sample_bone;
use super::types::{BonePose, Pose, quaternion_slerp};

/// Seconds a sequence change takes to cross-fade
pub const TRANSITION_TIME: f64 = 0.2;

/// Blend `b` into `a`: `s = 0` keeps `a`, `s = 1` yields `b`
///
/// `s` is clamped to `[0, 1]`. Rotations are slerped and positions
/// interpolated linearly.
pub fn slerp_bones(a: &mut Pose, b: &Pose, s: f32) {
    let s = s.clamp(0.0, 1.0);
    let s1 = 1.0 - s;

    for (pa, pb) in a.bones_mut().iter_mut().zip(b.bones()) {
        pa.rotation = quaternion_slerp(pa.rotation, pb.rotation, s);
        pa.position = pa.position * s1 + pb.position * s;
    }
}

/// Blend weights of the current update, interpolated from the latched one
pub fn blend_weights(current: [u8; 2], previous: [u8; 2], dadt: f32) -> [f32; 2] {
    let weight = |i: usize| {
        (f32::from(current[i]) * dadt + f32::from(previous[i]) * (1.0 - dadt)) / 255.0
    };
    [weight(0), weight(1)]
}

/// Blend weights frozen in a latched snapshot
pub fn latched_weights(blending: [u8; 2]) -> [f32; 2] {
    [
        f32::from(blending[0]) / 255.0,
        f32::from(blending[1]) / 255.0,
    ]
}

/// Scratch poses for the secondary blend layers
#[derive(Debug, Clone, Default)]
pub struct BlendScratch {
    b: Pose,
    c: Pose,
    d: Pose,
}

impl BlendScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Evaluates sequences of one model with a fixed set of controller adjustments
#[derive(Debug, Clone, Copy)]
pub struct SequenceEvaluator<'a> {
    model: &'a StudioModel,
    adjustments: &'a BoneAdjustments,
    framerate: f32,
}

impl<'a> SequenceEvaluator<'a> {
    pub fn new(model: &'a StudioModel, adjustments: &'a BoneAdjustments, framerate: f32) -> Self {
        Self {
            model,
            adjustments,
            framerate,
        }
    }

    pub fn model(&self) -> &'a StudioModel {
        self.model
    }

    /// Bone defaults with controller adjustments, for models without sequences
    pub fn bind_pose(&self, out: &mut Pose) {
        out.reset(self.model.bones.len());
        for (i, (bone, pose)) in self.model.bones.iter().zip(out.bones_mut()).enumerate() {
            let sample = sample_bone(bone, None, i, 0, 0.0, Some(self.adjustments));
            *pose = BonePose {
                position: sample.position,
                rotation: sample.rotation,
            };
        }
    }

    /// Sample every bone of one blend layer at frame `f`
    ///
    /// Frames past the last frame restart at 0 and frames before -0.01 are
    /// held at -0.01. Position channels flagged in the sequence's motion
    /// type are zeroed on the motion bone. Writes the angles each bone's
    /// rotation was built from into `angles` when given.
    ///
    /// Returns `false` when the layer's animation data is unavailable, in
    /// which case every bone holds its default values.
    pub fn evaluate_layer(
        &self,
        sequence: &StudioSequence,
        layer: usize,
        f: f32,
        out: &mut Pose,
        mut angles: Option<&mut [Vec3]>,
    ) -> bool {
        let bones = &self.model.bones;
        let track = self.model.anim_track(sequence, layer);
        let num_frames = sequence.num_frames as f32;

        let mut f = f;
        if f > num_frames - 1.0 {
            f = 0.0;
        } else if f < -0.01 {
            f = -0.01;
        }

        let whole = f.trunc();
        let s = f - whole;
        let frame = whole.max(0.0) as usize;

        out.reset(bones.len());
        for (i, (bone, pose)) in bones.iter().zip(out.bones_mut()).enumerate() {
            let sample = sample_bone(bone, track.as_ref(), i, frame, s, Some(self.adjustments));
            *pose = BonePose {
                position: sample.position,
                rotation: sample.rotation,
            };
            if let Some(slot) = angles.as_deref_mut().and_then(|a| a.get_mut(i)) {
                *slot = sample.angles;
            }
        }

        if let Some(motion) = sequence
            .motion_bone_index()
            .and_then(|bone| out.bones_mut().get_mut(bone))
        {
            if sequence.motion_type.contains(MotionFlags::X) {
                motion.position.x = 0.0;
            }
            if sequence.motion_type.contains(MotionFlags::Y) {
                motion.position.y = 0.0;
            }
            if sequence.motion_type.contains(MotionFlags::Z) {
                motion.position.z = 0.0;
            }

            // linear motion is extracted by the caller; the zero coefficient is kept as is
            if num_frames > 0.0 {
                let k = 0.0 * ((1.0 - s) / num_frames) * self.framerate;
                if sequence.motion_type.contains(MotionFlags::LX) {
                    motion.position.x += k * sequence.linear_movement.x;
                }
                if sequence.motion_type.contains(MotionFlags::LY) {
                    motion.position.y += k * sequence.linear_movement.y;
                }
                if sequence.motion_type.contains(MotionFlags::LZ) {
                    motion.position.z += k * sequence.linear_movement.z;
                }
            }
        }

        track.is_some()
    }

    /// Evaluate all blend layers of `sequence` at frame `f` into `out`
    ///
    /// `weights` are the blend factors of the two axes in `[0, 1]`. A
    /// secondary layer whose data is unavailable is skipped together with
    /// the blend it takes part in.
    pub fn evaluate_sequence(
        &self,
        sequence: &StudioSequence,
        f: f32,
        weights: [f32; 2],
        scratch: &mut BlendScratch,
        out: &mut Pose,
        angles: Option<&mut [Vec3]>,
    ) {
        self.evaluate_layer(sequence, 0, f, out, angles);

        let blends = sequence.blend_count();
        if blends <= 1 {
            return;
        }

        if self.evaluate_layer(sequence, 1, f, &mut scratch.b, None) {
            slerp_bones(out, &scratch.b, weights[0]);
        }

        if blends == 4 {
            let has_c = self.evaluate_layer(sequence, 2, f, &mut scratch.c, None);
            let has_d = self.evaluate_layer(sequence, 3, f, &mut scratch.d, None);
            if has_c && has_d {
                slerp_bones(&mut scratch.c, &scratch.d, weights[0]);
                slerp_bones(out, &scratch.c, weights[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{AnimLayer, ModelBuilder};
    use crate::chunks::StudioBone;
    use glam::Quat;
    use pretty_assertions::assert_eq;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    /// One bone whose X position is `value` on every frame of each layer
    fn grid_model(values: &[i16]) -> StudioModel {
        let layers = values
            .iter()
            .map(|&v| AnimLayer::new().channel(0, 0, &[(4, &[v])]))
            .collect();
        let built = ModelBuilder::new("grid.mdl")
            .bone(StudioBone {
                name: "root".to_string(),
                ..Default::default()
            })
            .animated_sequence(
                StudioSequence {
                    num_frames: 4,
                    num_blends: values.len() as i32,
                    ..Default::default()
                },
                layers,
            )
            .build()
            .unwrap();
        StudioModel::parse(built.model).unwrap()
    }

    #[test]
    fn test_slerp_bones_extremes_and_clamp() {
        let mut a = Pose::new(1);
        let mut b = Pose::new(1);
        a.bones_mut()[0].position = Vec3::new(0.0, 0.0, 0.0);
        b.bones_mut()[0] = BonePose {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(1.0),
        };

        let test_cases = vec![(0.0f32, 0.0f32), (-3.0, 0.0), (0.25, 2.5), (1.0, 10.0), (7.0, 10.0)];
        for (s, x) in test_cases {
            let mut pose = a.clone();
            slerp_bones(&mut pose, &b, s);
            assert_eq!(pose.bones()[0].position.x, x, "s {s}");
        }

        let mut pose = a.clone();
        slerp_bones(&mut pose, &b, 0.0);
        assert_eq!(pose.bones()[0].rotation, Quat::IDENTITY);
        let mut pose = a.clone();
        slerp_bones(&mut pose, &b, 1.0);
        assert_eq!(pose.bones()[0].rotation, b.bones()[0].rotation);
    }

    #[test]
    fn test_blend_weights() {
        assert_eq!(blend_weights([255, 0], [0, 0], 1.0), [1.0, 0.0]);
        assert_eq!(blend_weights([255, 0], [0, 0], 0.0), [0.0, 0.0]);
        let [w, _] = blend_weights([255, 0], [0, 0], 0.5);
        assert!((w - 0.5).abs() < 1e-6);
        assert_eq!(latched_weights([0, 255]), [0.0, 1.0]);
    }

    #[test]
    fn test_two_way_blend() {
        let model = grid_model(&[0, 100]);
        let adjustments = BoneAdjustments::default();
        let evaluator = SequenceEvaluator::new(&model, &adjustments, 1.0);
        let mut scratch = BlendScratch::new();
        let mut pose = Pose::default();

        let test_cases = vec![(0.0f32, 0.0f32), (0.5, 50.0), (1.0, 100.0)];
        for (weight, x) in test_cases {
            evaluator.evaluate_sequence(&model.sequences[0], 1.0, [weight, 0.0], &mut scratch, &mut pose, None);
            assert!((pose.bones()[0].position.x - x).abs() < 1e-4, "weight {weight}");
        }
    }

    #[test]
    fn test_four_way_grid() {
        // A, B, C, D
        let model = grid_model(&[0, 10, 100, 1000]);
        let adjustments = BoneAdjustments::default();
        let evaluator = SequenceEvaluator::new(&model, &adjustments, 1.0);
        let mut scratch = BlendScratch::new();
        let mut pose = Pose::default();

        let test_cases = vec![
            ([0.0f32, 0.0f32], 0.0f32),
            ([1.0, 0.0], 10.0),
            ([0.0, 1.0], 100.0),
            ([1.0, 1.0], 1000.0),
            ([0.0, 0.5], 50.0),
            ([1.0, 0.5], 505.0),
        ];
        for (weights, x) in test_cases {
            evaluator.evaluate_sequence(&model.sequences[0], 0.0, weights, &mut scratch, &mut pose, None);
            assert!((pose.bones()[0].position.x - x).abs() < 1e-3, "weights {weights:?}");
        }
    }

    #[test]
    fn test_frame_clamps() {
        let built = ModelBuilder::new("clamp.mdl")
            .bone(StudioBone::default())
            .animated_sequence(
                StudioSequence {
                    num_frames: 3,
                    ..Default::default()
                },
                vec![AnimLayer::new().channel(0, 1, &[(3, &[0, 10, 20])])],
            )
            .build()
            .unwrap();
        let model = StudioModel::parse(built.model).unwrap();
        let adjustments = BoneAdjustments::default();
        let evaluator = SequenceEvaluator::new(&model, &adjustments, 1.0);
        let mut pose = Pose::default();

        let test_cases = vec![(1.5f32, 15.0f32), (2.0, 20.0), (2.5, 0.0), (-5.0, -0.1)];
        for (f, y) in test_cases {
            assert!(evaluator.evaluate_layer(&model.sequences[0], 0, f, &mut pose, None));
            assert!((pose.bones()[0].position.y - y).abs() < 1e-4, "f {f}: {}", pose.bones()[0].position.y);
        }
    }

    #[test]
    fn test_motion_extraction_zeroes_flagged_axes() {
        let built = ModelBuilder::new("walk.mdl")
            .bone(StudioBone::default())
            .animated_sequence(
                StudioSequence {
                    num_frames: 2,
                    motion_type: MotionFlags::X | MotionFlags::Z | MotionFlags::LX,
                    linear_movement: Vec3::new(50.0, 0.0, 0.0),
                    ..Default::default()
                },
                vec![
                    AnimLayer::new()
                        .channel(0, 0, &[(2, &[5, 6])])
                        .channel(0, 1, &[(2, &[7, 8])])
                        .channel(0, 2, &[(2, &[9, 10])]),
                ],
            )
            .build()
            .unwrap();
        let model = StudioModel::parse(built.model).unwrap();
        let adjustments = BoneAdjustments::default();
        let evaluator = SequenceEvaluator::new(&model, &adjustments, 1.0);
        let mut pose = Pose::default();

        evaluator.evaluate_layer(&model.sequences[0], 0, 0.0, &mut pose, None);
        assert_eq!(pose.bones()[0].position, Vec3::new(0.0, 7.0, 0.0));
    }

    #[test]
    fn test_missing_layer_skips_blend() {
        let built = ModelBuilder::new("ext.mdl")
            .bone(StudioBone {
                value: [3.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                ..Default::default()
            })
            .external_sequence(
                "ext01.mdl",
                StudioSequence {
                    num_blends: 2,
                    ..Default::default()
                },
            )
            .build()
            .unwrap();
        let model = StudioModel::parse(built.model).unwrap();
        let adjustments = BoneAdjustments::default();
        let evaluator = SequenceEvaluator::new(&model, &adjustments, 1.0);
        let mut scratch = BlendScratch::new();
        let mut pose = Pose::default();
        let mut angles = vec![Vec3::ONE; 1];

        assert!(!evaluator.evaluate_layer(&model.sequences[0], 0, 0.0, &mut pose, None));
        evaluator.evaluate_sequence(
            &model.sequences[0],
            0.0,
            [1.0, 0.0],
            &mut scratch,
            &mut pose,
            Some(&mut angles),
        );
        // bind pose
        assert!(approx(pose.bones()[0].position, Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(angles[0], Vec3::ZERO);
    }
}
