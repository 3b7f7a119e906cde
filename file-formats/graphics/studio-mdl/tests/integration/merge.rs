//! Attached entities merged onto a parent's saved bones

use glam::Vec3;
use pretty_assertions::assert_eq;
use studio_mdl::animation::{Animator, EntityAnimationState, FrameClock, MoveType};
use studio_mdl::builder::ModelBuilder;

use crate::common::{bone, constant, parse, sequence};

#[test]
fn test_weapon_bone_copied_onto_attached_model() {
    let carrier = parse(
        ModelBuilder::new("soldier.mdl")
            .bone(bone("Bip01", -1))
            .bone(bone("Bip01 R Hand", 0))
            .bone(bone("Weapon_Bone", 1))
            .animated_sequence(
                sequence("aim", 2),
                vec![
                    constant(0, 2, 40)
                        .channel(1, 1, &[(255, &[12])])
                        .channel(2, 0, &[(255, &[6])]),
                ],
            ),
    );
    let weapon = parse(
        ModelBuilder::new("p_mp5.mdl")
            .bone(bone("weapon_bone", -1))
            .bone(bone("barrel", 0))
            .animated_sequence(sequence("idle", 2), vec![constant(1, 0, 20)]),
    );

    let clock = FrameClock::new(0.0);
    let mut animator = Animator::default();
    let mut soldier = EntityAnimationState {
        origin: Vec3::new(100.0, 0.0, 0.0),
        ..Default::default()
    };
    animator
        .update_entity(&carrier, &mut soldier, &clock, false)
        .unwrap();
    let hand_weapon = animator.transforms().render[2];
    assert_eq!(hand_weapon.translation(), Vec3::new(106.0, 12.0, 40.0));

    let mut gun = EntityAnimationState {
        move_type: MoveType::Follow,
        ..Default::default()
    };
    animator.update_entity(&weapon, &mut gun, &clock, false).unwrap();

    let transforms = animator.transforms();
    assert_eq!(transforms.render[0], hand_weapon);
    assert_eq!(transforms.bone_position(1).unwrap(), Vec3::new(126.0, 12.0, 40.0));
}

#[test]
fn test_merge_without_saved_bones_composes_normally() {
    let weapon = parse(
        ModelBuilder::new("w_crowbar.mdl")
            .bone(bone("Weapon_Bone", -1))
            .animated_sequence(sequence("idle", 2), vec![constant(0, 0, 3)]),
    );
    let mut animator = Animator::default();
    let mut state = EntityAnimationState {
        move_type: MoveType::Follow,
        origin: Vec3::new(0.0, 0.0, 8.0),
        ..Default::default()
    };

    animator
        .update_entity(&weapon, &mut state, &FrameClock::new(0.0), false)
        .unwrap();
    assert_eq!(
        animator.transforms().bone_position(0).unwrap(),
        Vec3::new(3.0, 0.0, 8.0)
    );
}
