//! End-to-end evaluation of a small skeleton

use glam::Vec3;
use pretty_assertions::assert_eq;
use studio_mdl::StudioModel;
use studio_mdl::animation::{Animator, EntityAnimationState, FrameClock, Mat3x4};
use studio_mdl::builder::{AnimLayer, ModelBuilder};
use studio_mdl::chunks::{SequenceFlags, StudioBone, StudioSequence};

use crate::common::{bone, parse, sequence};

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-4
}

/// Root translating from (0,0,0) to (0,0,10) over two frames, with a child
/// offset 4 units along Y
fn two_bone_model(looping: bool) -> StudioModel {
    let mut slide = sequence("slide", 2);
    if looping {
        slide.flags = SequenceFlags::LOOPING;
    }
    parse(
        ModelBuilder::new("scenario.mdl")
            .bone(bone("R", -1))
            .bone(StudioBone {
                name: "C".to_string(),
                parent: 0,
                value: [0.0, 4.0, 0.0, 0.0, 0.0, 0.0],
                ..Default::default()
            })
            .animated_sequence(slide, vec![AnimLayer::new().channel(0, 2, &[(2, &[0, 10])])]),
    )
}

#[test]
fn test_two_bone_halfway() {
    let model = two_bone_model(false);
    let mut animator = Animator::default();
    // frame byte 128 is halfway through a two-frame sequence
    let mut state = EntityAnimationState {
        frame: 128.0,
        ..Default::default()
    };

    animator
        .update_entity(&model, &mut state, &FrameClock::new(0.0), false)
        .unwrap();

    let transforms = animator.transforms();
    let root = transforms.bone_position(0).unwrap();
    assert!(approx(root, Vec3::new(0.0, 0.0, 5.0)), "{root:?}");

    let child_local = Mat3x4::from_quat_position(
        animator.pose().bones()[1].rotation,
        animator.pose().bones()[1].position,
    );
    assert_eq!(transforms.light[1], transforms.light[0].concat(&child_local));
    let child = transforms.bone_position(1).unwrap();
    assert!(approx(child, Vec3::new(0.0, 4.0, 5.0)), "{child:?}");
}

#[test]
fn test_non_looping_stops_before_last_frame() {
    let model = two_bone_model(false);
    let mut animator = Animator::default();
    let mut state = EntityAnimationState::default();

    let test_cases = vec![(0.0, 0.0f32), (0.05, 5.0), (1.0, 9.99)];
    for (time, z) in test_cases {
        animator
            .update_entity(&model, &mut state, &FrameClock::new(time), false)
            .unwrap();
        let root = animator.transforms().bone_position(0).unwrap();
        assert!((root.z - z).abs() < 1e-3, "time {time}: {root:?}");
    }
}

#[test]
fn test_looping_wraps_with_last_frame_period() {
    let built = ModelBuilder::new("loop.mdl")
        .bone(bone("R", -1))
        .animated_sequence(
            StudioSequence {
                flags: SequenceFlags::LOOPING,
                ..sequence("cycle", 5)
            },
            vec![AnimLayer::new().channel(0, 0, &[(5, &[0, 10, 20, 30, 0])])],
        )
        .build()
        .unwrap();
    let model = StudioModel::parse(built.model).unwrap();
    let mut animator = Animator::default();

    // 10 fps: frame x at time x / 10, one period is 4 frames
    let positions: Vec<f32> = [0.15, 0.55]
        .iter()
        .map(|&time| {
            let mut state = EntityAnimationState::default();
            animator
                .update_entity(&model, &mut state, &FrameClock::new(time), false)
                .unwrap();
            animator.transforms().bone_position(0).unwrap().x
        })
        .collect();

    assert!((positions[0] - 15.0).abs() < 1e-3, "{positions:?}");
    assert!((positions[0] - positions[1]).abs() < 1e-3, "{positions:?}");
}
