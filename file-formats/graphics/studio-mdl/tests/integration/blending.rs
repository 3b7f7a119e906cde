//! Blend layer weighting through the full pipeline

use studio_mdl::StudioModel;
use studio_mdl::animation::{Animator, EntityAnimationState, FrameClock};
use studio_mdl::builder::ModelBuilder;
use studio_mdl::chunks::StudioSequence;

use crate::common::{bone, constant, parse, sequence};

/// Root X position of each layer, in A, B, C, D order
fn grid(values: [i16; 4]) -> StudioModel {
    parse(
        ModelBuilder::new("grid.mdl").bone(bone("root", -1)).animated_sequence(
            StudioSequence {
                num_blends: 4,
                ..sequence("aim", 2)
            },
            values.iter().map(|&v| constant(0, 0, v)).collect(),
        ),
    )
}

fn root_x(model: &StudioModel, blending: [u8; 2]) -> f32 {
    let mut animator = Animator::default();
    let mut state = EntityAnimationState {
        blending,
        ..Default::default()
    };
    state.latched.prev_blending = blending;

    animator
        .update_entity(model, &mut state, &FrameClock::new(0.0), false)
        .unwrap();
    animator.transforms().bone_position(0).unwrap().x
}

#[test]
fn test_grid_corners() {
    let model = grid([0, 10, 100, 1000]);

    let test_cases = vec![
        ([0u8, 0u8], 0.0f32),
        ([255, 0], 10.0),
        ([0, 255], 100.0),
        ([255, 255], 1000.0),
    ];
    for (blending, x) in test_cases {
        let actual = root_x(&model, blending);
        assert!((actual - x).abs() < 1e-3, "{blending:?}: {actual}");
    }
}

#[test]
fn test_first_axis_zero_ignores_b_and_d() {
    let a = grid([1, 10, 100, 1000]);
    let b = grid([1, -500, 100, 4000]);

    for second in [0u8, 64, 200, 255] {
        assert_eq!(root_x(&a, [0, second]), root_x(&b, [0, second]), "axis 1 = {second}");
    }
}

#[test]
fn test_first_axis_full_ignores_a_and_c() {
    let a = grid([1, 10, 100, 1000]);
    let b = grid([-300, 10, 2500, 1000]);

    for second in [0u8, 64, 200, 255] {
        assert_eq!(
            root_x(&a, [255, second]),
            root_x(&b, [255, second]),
            "axis 1 = {second}"
        );
    }
}

#[test]
fn test_blend_interpolates_from_latched_weights() {
    let model = parse(
        ModelBuilder::new("pair.mdl").bone(bone("root", -1)).animated_sequence(
            StudioSequence {
                num_blends: 2,
                ..sequence("look", 2)
            },
            vec![constant(0, 0, 0), constant(0, 0, 10)],
        ),
    );
    let mut animator = Animator::default();
    let mut state = EntityAnimationState {
        anim_time: 1.0,
        blending: [255, 0],
        ..Default::default()
    };
    state.latched.prev_anim_time = 0.9;

    // halfway between the latched and the current update
    animator
        .update_entity(&model, &mut state, &FrameClock::new(1.05), false)
        .unwrap();
    let x = animator.transforms().bone_position(0).unwrap().x;
    assert!((x - 5.0).abs() < 1e-3, "{x}");
}
