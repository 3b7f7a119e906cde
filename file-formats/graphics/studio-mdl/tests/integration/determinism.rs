//! Repeatability of evaluations

use glam::Vec3;
use pretty_assertions::assert_eq;
use studio_mdl::animation::{
    AnimationSettings, Animator, EntityAnimationState, FrameClock, Mat3x4, MoveType, RenderFx,
};
use studio_mdl::builder::{AnimLayer, ModelBuilder};
use studio_mdl::chunks::{MotionFlags, SequenceFlags, StudioBoneController, StudioSequence};
use studio_mdl::StudioModel;

use crate::common::{bone, parse, sequence};

fn model() -> StudioModel {
    parse(
        ModelBuilder::new("monster.mdl")
            .bone(bone("root", -1))
            .bone(bone("neck", 0))
            .bone(bone("head", 1))
            .controller(StudioBoneController {
                bone: 1,
                kind: MotionFlags::YR,
                start: -60.0,
                end: 60.0,
                index: 0,
                ..Default::default()
            })
            .animated_sequence(
                StudioSequence {
                    flags: SequenceFlags::LOOPING,
                    ..sequence("walk", 9)
                },
                vec![
                    AnimLayer::new()
                        .channel(0, 0, &[(9, &[0, 3, 6, 9, 12, 15, 18, 21, 0])])
                        .channel(1, 5, &[(4, &[0, 100]), (5, &[200, 300, 200, 100, 0])])
                        .channel(2, 3, &[(9, &[-50, 50])]),
                ],
            )
            .animated_sequence(sequence("die", 5), Vec::new()),
    )
}

fn run(animator: &mut Animator, render_fx: RenderFx) -> Vec<Vec<[[f32; 4]; 3]>> {
    let model = model();
    let mut state = EntityAnimationState {
        move_type: MoveType::Step,
        render_fx,
        controller: [200, 0, 0, 0],
        ..Default::default()
    };
    let mut clock = FrameClock::new(0.0);
    let mut frames = Vec::new();

    for i in 0..120 {
        clock.advance(0.016);
        if i % 6 == 0 {
            state.begin_update(clock.time);
            state.origin += Vec3::new(2.0, 0.0, 0.0);
            state.angles.y += 3.0;
            state.controller[0] = state.controller[0].wrapping_add(11);
        }
        if i == 60 {
            state.begin_sequence(1, clock.time);
        }
        animator
            .update_entity(&model, &mut state, &clock, true)
            .unwrap();
        frames.push(animator.transforms().render.iter().map(|m| m.rows).collect());
    }
    frames
}

#[test]
fn test_identical_inputs_identical_transforms() {
    let settings = AnimationSettings {
        fx_seed: 99,
        ..Default::default()
    };
    let a = run(&mut Animator::new(settings), RenderFx::Distort);
    let b = run(&mut Animator::new(settings), RenderFx::Distort);

    assert_eq!(a.len(), 120);
    assert!(a == b);
}

#[test]
fn test_reused_animator_matches_fresh_one() {
    let mut reused = Animator::default();
    let first = run(&mut reused, RenderFx::None);
    let second = run(&mut reused, RenderFx::None);
    let fresh = run(&mut Animator::default(), RenderFx::None);

    assert!(first == fresh);
    assert!(second == fresh);
}

#[test]
fn test_children_follow_parent_transforms() {
    let model = model();
    let mut animator = Animator::default();
    let mut state = EntityAnimationState {
        controller: [64, 0, 0, 0],
        ..Default::default()
    };
    let clock = FrameClock::new(0.35);
    animator
        .update_entity(&model, &mut state, &clock, false)
        .unwrap();

    let transforms = animator.transforms();
    let pose = animator.pose();
    for (i, bone) in model.bones.iter().enumerate() {
        let Some(parent) = bone.parent_index() else {
            continue;
        };
        let local = pose.get(i).unwrap();
        let local = Mat3x4::from_quat_position(local.rotation, local.position);
        assert_eq!(transforms.light[i], transforms.light[parent].concat(&local));
        assert_eq!(transforms.render[i], transforms.render[parent].concat(&local));
    }
}
