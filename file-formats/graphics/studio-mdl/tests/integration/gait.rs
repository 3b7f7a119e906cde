//! Player gait overlay and locomotion policy

use glam::Vec3;
use pretty_assertions::assert_eq;
use studio_mdl::animation::{Animator, EntityAnimationState, FrameClock, GaitState, PlayerMotion};
use studio_mdl::builder::ModelBuilder;
use studio_mdl::{SPINE_BONE_NAME, StudioModel};

use crate::common::{bone, constant, parse, sequence};

/// Pelvis, spine and head each raised by `height` in every sequence layer
fn player() -> StudioModel {
    let layer = |z: i16| {
        constant(1, 2, z)
            .channel(2, 2, &[(255, &[z])])
            .channel(3, 2, &[(255, &[z])])
    };
    parse(
        ModelBuilder::new("player.mdl")
            .bone(bone("Bip01", -1))
            .bone(bone("Bip01 Pelvis", 0))
            .bone(bone(SPINE_BONE_NAME, 1))
            .bone(bone("Bip01 Head", 2))
            .animated_sequence(sequence("dummy", 2), vec![layer(0)])
            .animated_sequence(sequence("shoot", 2), vec![layer(1)])
            .animated_sequence(sequence("walk", 2), vec![layer(2)]),
    )
}

fn local_heights(animator: &Animator) -> Vec<f32> {
    animator.pose().bones().iter().map(|b| b.position.z).collect()
}

#[test]
fn test_gait_cut_at_spine() {
    let model = player();
    let mut animator = Animator::default();
    let mut state = EntityAnimationState::new(1);
    let mut gait = GaitState::default();
    let motion = PlayerMotion {
        gait_sequence: 2,
        velocity: Vec3::ZERO,
    };
    let clock = FrameClock {
        time: 1.0,
        old_time: 0.95,
        frame_count: 3,
    };

    animator
        .update_player(&model, &mut state, &mut gait, &motion, &clock, false)
        .unwrap();

    // lower body from the gait sequence, spine and up from the main sequence
    assert_eq!(local_heights(&animator), vec![0.0, 2.0, 1.0, 1.0]);
    assert_eq!(gait.gait_sequence, 2);
    assert_eq!(gait.render_frame, Some(3));
}

#[test]
fn test_gait_sequence_out_of_range_uses_first_sequence() {
    let model = player();
    let mut animator = Animator::default();
    let mut state = EntityAnimationState::new(1);
    let mut gait = GaitState::default();
    let motion = PlayerMotion {
        gait_sequence: 40,
        velocity: Vec3::ZERO,
    };
    let clock = FrameClock {
        time: 1.0,
        old_time: 0.95,
        frame_count: 1,
    };

    animator
        .update_player(&model, &mut state, &mut gait, &motion, &clock, false)
        .unwrap();
    assert_eq!(gait.gait_sequence, 0);
    // gait sequence 0 disables the overlay
    assert_eq!(local_heights(&animator), vec![0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn test_standing_player_turns_hips_toward_view() {
    let model = player();
    let mut animator = Animator::default();
    let mut state = EntityAnimationState {
        angles: Vec3::new(0.0, 90.0, 0.0),
        ..EntityAnimationState::new(1)
    };
    let mut gait = GaitState::default();
    let motion = PlayerMotion {
        gait_sequence: 2,
        velocity: Vec3::ZERO,
    };
    let mut clock = FrameClock::new(0.0);

    let mut yaws = Vec::new();
    for _ in 0..40 {
        clock.advance(0.1);
        animator
            .update_player(&model, &mut state, &mut gait, &motion, &clock, false)
            .unwrap();
        yaws.push(gait.gait_yaw);
    }

    assert!(yaws.windows(2).all(|w| w[1] >= w[0]), "{yaws:?}");
    assert!((yaws[yaws.len() - 1] - 90.0).abs() < 1.0, "{yaws:?}");
    // the torso twist shrinks as the hips catch up
    assert!(state.controller[0] >= 127 && state.controller[0] <= 128, "{:?}", state.controller);
}

#[test]
fn test_walking_player_advances_gait_frame() {
    let built = ModelBuilder::new("runner.mdl")
        .bone(bone("Bip01", -1))
        .sequence(sequence("idle", 2))
        .sequence(studio_mdl::chunks::StudioSequence {
            linear_movement: Vec3::new(100.0, 0.0, 0.0),
            ..sequence("run", 11)
        })
        .build()
        .unwrap();
    let model = StudioModel::parse(built.model).unwrap();
    let mut animator = Animator::default();
    let mut state = EntityAnimationState::default();
    let mut gait = GaitState::default();
    let motion = PlayerMotion {
        gait_sequence: 1,
        velocity: Vec3::ZERO,
    };
    let mut clock = FrameClock::new(0.0);

    // 25 units along X in 0.25s
    clock.advance(0.25);
    state.origin = Vec3::new(25.0, 0.0, 0.0);
    animator
        .update_player(&model, &mut state, &mut gait, &motion, &clock, false)
        .unwrap();

    assert!((gait.gait_frame - 2.75).abs() < 1e-4, "{}", gait.gait_frame);
    assert_eq!(gait.gait_yaw, 0.0);
}
