//! Lazy loading of external sequence groups

use glam::Vec3;
use pretty_assertions::assert_eq;
use studio_mdl::animation::{Animator, EntityAnimationState, FrameClock};
use studio_mdl::builder::{BuiltModel, ModelBuilder};
use studio_mdl::chunks::StudioBone;
use studio_mdl::{MemoryResolver, StudioModel};

use crate::common::{bone, constant, sequence};

/// Sequence 0 lives in the model, sequence 1 in `models/npc01.mdl`
fn built() -> BuiltModel {
    ModelBuilder::new("npc.mdl")
        .bone(StudioBone {
            name: "root".to_string(),
            value: [1.0, 2.0, 3.0, 0.0, 0.0, 0.0],
            ..Default::default()
        })
        .bone(bone("child", 0))
        .animated_sequence(sequence("idle", 2), vec![constant(0, 0, 10)])
        .external_animated_sequence(
            "models/npc01.mdl",
            sequence("run", 2),
            vec![constant(0, 0, 40)],
        )
        .build()
        .unwrap()
}

fn root_position(model: &StudioModel, sequence: usize) -> Vec3 {
    let mut animator = Animator::default();
    let mut state = EntityAnimationState::new(sequence);
    animator
        .update_entity(model, &mut state, &FrameClock::new(0.0), false)
        .unwrap();
    animator.transforms().bone_position(0).unwrap()
}

#[test]
fn test_group_loaded_from_model_directory() {
    let built = built();
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("npc.mdl");
    std::fs::write(&model_path, &built.model).unwrap();
    for (name, data) in &built.groups {
        let file_name = std::path::Path::new(name).file_name().unwrap();
        std::fs::write(dir.path().join(file_name), data).unwrap();
    }

    let model = StudioModel::load(&model_path).unwrap();
    assert!(!model.is_group_loaded(1));

    assert_eq!(root_position(&model, 1), Vec3::new(41.0, 2.0, 3.0));
    assert!(model.is_group_loaded(1));
    assert_eq!(root_position(&model, 0), Vec3::new(11.0, 2.0, 3.0));
}

#[test]
fn test_missing_group_falls_back_to_bind_pose() {
    let built = built();
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("npc.mdl");
    std::fs::write(&model_path, &built.model).unwrap();

    let model = StudioModel::load(&model_path).unwrap();
    assert_eq!(root_position(&model, 1), Vec3::new(1.0, 2.0, 3.0));
    assert!(!model.is_group_loaded(1));

    assert!(model.is_group_failed(1));

    // later frames skip the group until it is loaded explicitly
    let (name, data) = &built.groups[0];
    let file_name = std::path::Path::new(name).file_name().unwrap();
    std::fs::write(dir.path().join(file_name), data).unwrap();
    assert_eq!(root_position(&model, 1), Vec3::new(1.0, 2.0, 3.0));

    model.load_sequence_group(1).unwrap();
    assert_eq!(root_position(&model, 1), Vec3::new(41.0, 2.0, 3.0));
}

#[test]
fn test_memory_resolver() {
    let built = built();
    let mut resolver = MemoryResolver::new();
    for (name, data) in built.groups {
        resolver.insert(name, data);
    }
    let model = StudioModel::parse(built.model).unwrap().with_resolver(resolver);

    assert_eq!(root_position(&model, 1), Vec3::new(41.0, 2.0, 3.0));
}

#[test]
fn test_model_is_shared_across_threads() {
    let built = built();
    let mut resolver = MemoryResolver::new();
    for (name, data) in built.groups {
        resolver.insert(name, data);
    }
    let model = StudioModel::parse(built.model).unwrap().with_resolver(resolver);

    let positions: Vec<Vec3> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| root_position(&model, 1)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(positions, vec![Vec3::new(41.0, 2.0, 3.0); 4]);
}
