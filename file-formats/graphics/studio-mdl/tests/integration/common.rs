//! Shared model fixtures

use studio_mdl::StudioModel;
use studio_mdl::builder::{AnimLayer, ModelBuilder};
use studio_mdl::chunks::{StudioBone, StudioSequence};

pub fn bone(name: &str, parent: i32) -> StudioBone {
    StudioBone {
        name: name.to_string(),
        parent,
        ..Default::default()
    }
}

/// Layer with a constant value on one channel of one bone
pub fn constant(bone: usize, channel: usize, value: i16) -> AnimLayer {
    AnimLayer::new().channel(bone, channel, &[(255, &[value])])
}

pub fn parse(builder: ModelBuilder) -> StudioModel {
    let _ = env_logger::builder().is_test(true).try_init();
    let built = builder.build().expect("model should build");
    StudioModel::parse(built.model).expect("built model should parse")
}

pub fn sequence(label: &str, num_frames: i32) -> StudioSequence {
    StudioSequence {
        label: label.to_string(),
        num_frames,
        fps: 10.0,
        ..Default::default()
    }
}
