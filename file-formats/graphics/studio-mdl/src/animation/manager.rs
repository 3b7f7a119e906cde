//! Per-entity animation driver
//!
//! The [`Animator`] owns every buffer an evaluation needs: scratch poses,
//! the output transforms, the bones saved for merge mode and the view model
//! caches. One animator is meant to be reused for all entities of a frame,
//! evaluated one after another.

use glam::Vec3;

use crate::chunks::StudioEvent;
use crate::error::Result;
use crate::model::StudioModel;

use super::blend::{
    BlendScratch, SequenceEvaluator, TRANSITION_TIME, blend_weights, latched_weights, slerp_bones,
};
use super::bone_transform::{self, BoneCache, BoneTransforms, MAX_ATTACHMENTS, compose_bones};
use super::controller::{ControllerInputs, calc_bone_adjustments};
use super::frame::{estimate_frame, estimate_interpolant};
use super::gait::process_gait;
use super::root::{RootTransform, ViewBasis, apply_render_fx};
use super::settings::{AnimationSettings, RenderPath};
use super::state::{
    EntityAnimationState, EntityRole, FrameClock, GaitState, LcgRng, MoveType, PlayerMotion,
};
use super::types::Pose;

/// Controller value that centers the torso of players without a gait sequence
const NEUTRAL_CONTROLLER: u8 = 127;

/// Animation pipeline context
#[derive(Debug, Clone)]
pub struct Animator {
    settings: AnimationSettings,
    pose: Pose,
    prev_pose: Pose,
    gait_pose: Pose,
    scratch: BlendScratch,
    transforms: BoneTransforms,
    bone_cache: BoneCache,
    attachments: Vec<Vec3>,
    /// Name of the last view model evaluated
    last_view_model: Option<String>,
    view_bone_angles: Vec<Vec3>,
    idle_bone_angles: Vec<Vec3>,
    view: Option<ViewBasis>,
    rng: LcgRng,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(AnimationSettings::default())
    }
}

impl Animator {
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            settings,
            pose: Pose::default(),
            prev_pose: Pose::default(),
            gait_pose: Pose::default(),
            scratch: BlendScratch::new(),
            transforms: BoneTransforms::default(),
            bone_cache: BoneCache::new(),
            attachments: Vec::new(),
            last_view_model: None,
            view_bone_angles: Vec::new(),
            idle_bone_angles: Vec::new(),
            view: None,
            rng: LcgRng::new(settings.fx_seed),
        }
    }

    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    /// Camera used for view-space render matrices on the software path
    pub fn set_view(&mut self, view: Option<ViewBasis>) {
        self.view = view;
    }

    /// Local pose of the last evaluation
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// World matrices of the last evaluation
    pub fn transforms(&self) -> &BoneTransforms {
        &self.transforms
    }

    /// Bones saved by the last [`save_bones`](Self::save_bones)
    pub fn bone_cache(&self) -> &BoneCache {
        &self.bone_cache
    }

    /// Attachment points of the last evaluation
    pub fn attachments(&self) -> &[Vec3] {
        &self.attachments
    }

    /// Angles (radians) of each view model bone in the last evaluation
    pub fn view_bone_angles(&self) -> &[Vec3] {
        &self.view_bone_angles
    }

    /// Angles (radians) of each view model bone in the first frame of its
    /// idle sequence
    pub fn idle_bone_angles(&self) -> &[Vec3] {
        &self.idle_bone_angles
    }

    /// Root transform of an entity at `time`
    pub fn setup_transform(
        &self,
        model: &StudioModel,
        state: &EntityAnimationState,
        time: f64,
    ) -> RootTransform {
        let root = RootTransform::from_entity(
            state,
            model.sequence(state.sequence),
            time,
            self.settings.interpolate,
        );

        match (self.settings.render_path, &self.view) {
            (RenderPath::Software, Some(view)) => root.with_view(view),
            _ => root,
        }
    }

    /// Evaluate the full pose of an entity and compose its bone matrices
    ///
    /// Blends the sequence's layers, cross-fades from the previous sequence
    /// for [`TRANSITION_TIME`] after a change and overlays the lower body
    /// from the gait sequence when `gait` has one.
    pub fn setup_bones(
        &mut self,
        model: &StudioModel,
        state: &mut EntityAnimationState,
        root: &RootTransform,
        time: f64,
        gait: Option<&GaitState>,
    ) -> Result<()> {
        let interpolate = self.settings.interpolate;
        let dadt = estimate_interpolant(state, time, interpolate);
        let adjustments = calc_bone_adjustments(
            &model.bone_controllers,
            dadt,
            &ControllerInputs::from_state(state),
        );
        let evaluator = SequenceEvaluator::new(model, &adjustments, state.framerate);

        if model.sequences.is_empty() {
            log::debug!("Model '{}' has no sequences, using bind pose", model.name());
            evaluator.bind_pose(&mut self.pose);
            return self.compose(model, state, root, time, false);
        }

        if state.sequence >= model.sequences.len() {
            log::trace!("Sequence {} out of range, resetting to 0", state.sequence);
            state.sequence = 0;
        }
        let sequence = &model.sequences[state.sequence];
        let f = estimate_frame(sequence, state, time, interpolate);

        let view_angles = if state.is_view_model() {
            self.update_idle_angles(model, &evaluator);
            self.view_bone_angles.resize(model.bones.len(), Vec3::ZERO);
            Some(&mut self.view_bone_angles[..])
        } else {
            None
        };

        let weights = blend_weights(state.blending, state.latched.prev_blending, dadt);
        evaluator.evaluate_sequence(
            sequence,
            f as f32,
            weights,
            &mut self.scratch,
            &mut self.pose,
            view_angles,
        );

        let latched = &mut state.latched;
        if interpolate
            && latched.sequence_time != 0.0
            && latched.sequence_time + TRANSITION_TIME > time
            && latched.prev_sequence < model.sequences.len()
        {
            let previous = &model.sequences[latched.prev_sequence];
            evaluator.evaluate_sequence(
                previous,
                latched.prev_frame as f32,
                latched_weights(latched.prev_seq_blending),
                &mut self.scratch,
                &mut self.prev_pose,
                None,
            );
            let s = 1.0 - (time - latched.sequence_time) / TRANSITION_TIME;
            slerp_bones(&mut self.pose, &self.prev_pose, s as f32);
        } else {
            latched.prev_frame = f;
        }

        if let Some(gait) = gait.filter(|gait| gait.gait_sequence != 0) {
            let mut gait_sequence = gait.gait_sequence;
            if gait_sequence >= model.sequences.len() {
                log::trace!("Gait sequence {gait_sequence} out of range, resetting to 0");
                gait_sequence = 0;
            }

            evaluator.evaluate_layer(
                &model.sequences[gait_sequence],
                0,
                gait.gait_frame as f32,
                &mut self.gait_pose,
                None,
            );
            let cut = model.spine_bone().unwrap_or(model.bones.len());
            self.pose.copy_prefix(&self.gait_pose, cut);
        }

        self.compose(model, state, root, time, false)
    }

    /// Evaluate the primary layer of an attached entity and take every bone
    /// found by name in the saved bones from there
    pub fn merge_bones(
        &mut self,
        model: &StudioModel,
        state: &mut EntityAnimationState,
        root: &RootTransform,
        time: f64,
    ) -> Result<()> {
        let interpolate = self.settings.interpolate;
        let dadt = estimate_interpolant(state, time, interpolate);
        let adjustments = calc_bone_adjustments(
            &model.bone_controllers,
            dadt,
            &ControllerInputs::from_state(state),
        );
        let evaluator = SequenceEvaluator::new(model, &adjustments, state.framerate);

        if model.sequences.is_empty() {
            evaluator.bind_pose(&mut self.pose);
        } else {
            if state.sequence >= model.sequences.len() {
                log::trace!("Sequence {} out of range, resetting to 0", state.sequence);
                state.sequence = 0;
            }
            let sequence = &model.sequences[state.sequence];
            let f = estimate_frame(sequence, state, time, interpolate);
            evaluator.evaluate_layer(sequence, 0, f as f32, &mut self.pose, None);
        }

        self.compose(model, state, root, time, true)
    }

    fn compose(
        &mut self,
        model: &StudioModel,
        state: &EntityAnimationState,
        root: &RootTransform,
        time: f64,
        merge: bool,
    ) -> Result<()> {
        let fx = state.render_fx;
        let elapsed = time - state.anim_time;
        let rng = &mut self.rng;
        let cache = merge.then_some(&self.bone_cache);

        compose_bones(
            &model.bones,
            &self.pose,
            &root.matrices(),
            cache,
            |matrix| apply_render_fx(fx, matrix, rng, elapsed),
            &mut self.transforms,
        )
    }

    /// Record the idle angles of a view model the first time it is seen
    fn update_idle_angles(&mut self, model: &StudioModel, evaluator: &SequenceEvaluator<'_>) {
        if self.last_view_model.as_deref() == Some(model.name()) {
            return;
        }

        self.idle_bone_angles.clear();
        self.idle_bone_angles.resize(model.bones.len(), Vec3::ZERO);
        if let Some(idle) = model.sequence(0) {
            evaluator.evaluate_layer(
                idle,
                0,
                0.0,
                &mut self.prev_pose,
                Some(&mut self.idle_bone_angles[..]),
            );
        }
        self.last_view_model = Some(model.name().to_string());
    }

    /// Save the current matrices for entities merged onto this one
    pub fn save_bones(&mut self, model: &StudioModel) {
        self.bone_cache.save(&model.bones, &self.transforms);
    }

    /// World positions of the model's attachments
    pub fn calc_attachments(&mut self, model: &StudioModel) -> Result<&[Vec3]> {
        self.attachments = bone_transform::calc_attachments(&model.attachments, &self.transforms)?;
        Ok(&self.attachments)
    }

    /// Client events of the current sequence crossed since the previous frame
    ///
    /// Models without attachments get the entity origin in every attachment
    /// slot. A looping sequence that started on this frame also fires its
    /// events on frame 0.
    pub fn client_events(
        &mut self,
        model: &StudioModel,
        state: &EntityAnimationState,
        clock: &FrameClock,
    ) -> Vec<StudioEvent> {
        if model.attachments.is_empty() {
            self.attachments = vec![state.origin; MAX_ATTACHMENTS];
        }

        let Some(last) = model.sequences.len().checked_sub(1) else {
            return Vec::new();
        };
        let sequence = &model.sequences[state.sequence.min(last)];
        if sequence.events.is_empty() {
            return Vec::new();
        }

        let frametime = clock.time - clock.old_time;
        let end = estimate_frame(sequence, state, clock.time, self.settings.interpolate);
        let mut start = end - f64::from(state.framerate) * frametime * f64::from(sequence.fps);

        let started_at = match state.role {
            EntityRole::ViewModel { weapon_anim_time } => weapon_anim_time,
            EntityRole::World => state.anim_time,
        };
        if state.latched.sequence_time == started_at && sequence.is_looping() {
            start = -0.01;
        }

        sequence.client_events(start, end).cloned().collect()
    }

    /// Animate a non-player entity for this frame
    ///
    /// Attached entities merge onto the bones saved by the previous call;
    /// others run the full pipeline. The resulting bones are saved in turn.
    /// When `events` is set, attachments are computed and the client events
    /// crossed this frame are returned.
    pub fn update_entity(
        &mut self,
        model: &StudioModel,
        state: &mut EntityAnimationState,
        clock: &FrameClock,
        events: bool,
    ) -> Result<Vec<StudioEvent>> {
        if state.is_view_model() && self.last_view_model.as_deref() != Some(model.name()) {
            log::debug!("View model changed to '{}'", model.name());
            state.role = EntityRole::ViewModel {
                weapon_anim_time: clock.time,
            };
        }

        let root = self.setup_transform(model, state, clock.time);

        if state.move_type == MoveType::Follow {
            self.merge_bones(model, state, &root, clock.time)?;
        } else {
            self.setup_bones(model, state, &root, clock.time, None)?;
        }
        self.save_bones(model);

        self.finish(model, state, clock, events)
    }

    /// Animate a player entity for this frame
    ///
    /// Players with a gait sequence run the gait policy first: pitch drives
    /// the first blend axis, the torso twist drives the four controllers and
    /// the hips face the direction of movement. The root transform is built
    /// from the adjusted angles, which are restored afterwards.
    pub fn update_player(
        &mut self,
        model: &StudioModel,
        state: &mut EntityAnimationState,
        gait: &mut GaitState,
        motion: &PlayerMotion,
        clock: &FrameClock,
        events: bool,
    ) -> Result<Vec<StudioEvent>> {
        let root = if motion.gait_sequence != 0 {
            let angles = state.angles;
            process_gait(
                gait,
                state,
                motion,
                &model.sequences,
                clock,
                self.settings.gait_estimation,
            );
            let root = self.setup_transform(model, state, clock.time);
            state.angles = angles;
            root
        } else {
            state.controller = [NEUTRAL_CONTROLLER; 4];
            state.latched.prev_controller = [NEUTRAL_CONTROLLER; 4];
            gait.gait_sequence = 0;
            self.setup_transform(model, state, clock.time)
        };

        self.setup_bones(model, state, &root, clock.time, Some(gait))?;
        self.save_bones(model);
        gait.render_frame = Some(clock.frame_count);

        self.finish(model, state, clock, events)
    }

    fn finish(
        &mut self,
        model: &StudioModel,
        state: &EntityAnimationState,
        clock: &FrameClock,
        events: bool,
    ) -> Result<Vec<StudioEvent>> {
        if !events {
            return Ok(Vec::new());
        }
        self.calc_attachments(model)?;
        Ok(self.client_events(model, state, clock))
    }
}
