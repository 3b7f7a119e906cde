//! Studio skeletal animation pipeline
//!
//! Each frame an entity goes through these stages:
//! - frame and interpolant estimation from the entity clocks
//! - bone controller resolution into per-controller adjustments
//! - per-bone sampling of the run-length compressed curves
//! - blending of sequence layers, the cross-fade from the previous sequence
//!   and the gait overlay for players
//! - composition of the local pose into world render and light matrices
//!
//! # Example
//!
//! ```rust,no_run
//! use studio_mdl::StudioModel;
//! use studio_mdl::animation::{Animator, EntityAnimationState, FrameClock};
//!
//! let model = StudioModel::load("models/scientist.mdl")?;
//! let mut animator = Animator::default();
//! let mut state = EntityAnimationState::new(0);
//! let mut clock = FrameClock::new(0.0);
//!
//! for _ in 0..10 {
//!     clock.advance(0.05);
//!     let events = animator.update_entity(&model, &mut state, &clock, true)?;
//!     for event in events {
//!         println!("event {} at frame {}", event.event, event.frame);
//!     }
//! }
//!
//! let head = animator.transforms().bone_position(3);
//! # Ok::<(), studio_mdl::StudioError>(())
//! ```

pub mod blend;
pub mod bone_transform;
pub mod controller;
pub mod curve;
pub mod frame;
pub mod gait;
pub mod manager;
pub mod root;
pub mod sampler;
pub mod settings;
pub mod state;
pub mod types;

pub use blend::{BlendScratch, SequenceEvaluator, TRANSITION_TIME, slerp_bones};
pub use bone_transform::{
    BoneCache, BoneTransforms, MAX_ATTACHMENTS, Mat3x4, RootMatrices, calc_attachments,
    compose_bones,
};
pub use controller::{BoneAdjustments, ControllerInputs, calc_bone_adjustments};
pub use curve::{AnimCurve, AnimTrack, CurveSample};
pub use frame::{estimate_frame, estimate_interpolant};
pub use gait::{estimate_gait, player_blend, process_gait};
pub use manager::Animator;
pub use root::{RootTransform, ViewBasis, apply_render_fx};
pub use sampler::{BoneSample, sample_bone};
pub use settings::{AnimationSettings, RenderPath};
pub use state::{
    EntityAnimationState, EntityRole, FrameClock, GaitState, LatchedAnimation, LcgRng, MoveType,
    PlayerMotion, RenderFx,
};
pub use types::{BonePose, Pose, angle_quaternion, quaternion_slerp};
