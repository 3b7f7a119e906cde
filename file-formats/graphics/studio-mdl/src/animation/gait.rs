//! Player locomotion: hip facing, torso twist and gait frame advance

use crate::chunks::StudioSequence;

use super::state::{EntityAnimationState, FrameClock, GaitState, PlayerMotion};
use super::types::trunc_mod;

/// Speed in units per second below which a player counts as standing
const MIN_GAIT_SPEED: f32 = 5.0;

/// Largest torso twist before the hips turn around
const TORSO_LIMIT: f32 = 120.0;

/// Estimate player movement and update the hip facing yaw
///
/// Nothing but the movement changes when no time passed or the player was
/// already evaluated this frame.
pub fn estimate_gait(
    gait: &mut GaitState,
    state: &EntityAnimationState,
    motion: &PlayerMotion,
    clock: &FrameClock,
    estimation: bool,
) {
    let dt = clock.delta();

    if dt == 0.0 || gait.render_frame == Some(clock.frame_count) {
        gait.movement = 0.0;
        return;
    }

    let mut velocity;
    if estimation {
        velocity = state.origin - gait.prev_gait_origin;
        gait.prev_gait_origin = state.origin;
        gait.movement = velocity.length();
        if gait.movement / dt < MIN_GAIT_SPEED {
            gait.movement = 0.0;
            velocity.x = 0.0;
            velocity.y = 0.0;
        }
    } else {
        velocity = motion.velocity;
        gait.movement = velocity.length() * dt;
    }

    if velocity.x == 0.0 && velocity.y == 0.0 {
        let mut yaw_diff = trunc_mod(state.angles.y - gait.gait_yaw, 360.0);
        if yaw_diff > 180.0 {
            yaw_diff -= 360.0;
        }
        if yaw_diff < -180.0 {
            yaw_diff += 360.0;
        }

        if dt < 0.25 {
            yaw_diff *= dt * 4.0;
        } else {
            yaw_diff *= dt;
        }

        gait.gait_yaw = trunc_mod(gait.gait_yaw + yaw_diff, 360.0);
        gait.movement = 0.0;
    } else {
        gait.gait_yaw = velocity.y.atan2(velocity.x).to_degrees().clamp(-180.0, 180.0);
    }
}

/// Map a view pitch onto the first blend axis of `sequence`
///
/// Returns the blend byte and the pitch left over for the root transform.
pub fn player_blend(sequence: &StudioSequence, pitch: f32) -> (u8, f32) {
    let start = sequence.blend_start[0];
    let end = sequence.blend_end[0];
    let blend = (pitch * 3.0).trunc();

    if blend < start {
        (0, pitch - start / 3.0)
    } else if blend > end {
        (255, pitch - end / 3.0)
    } else if end - start < 0.1 {
        (127, 0.0)
    } else {
        ((255.0 * (blend - start) / (end - start)) as u8, 0.0)
    }
}

/// Run the gait policy for a player entity
///
/// Updates the pitch blend, torso controllers and facing of `state`, then
/// advances the gait frame. Returns the gait sequence to overlay, reset to 0
/// when out of range.
pub fn process_gait(
    gait: &mut GaitState,
    state: &mut EntityAnimationState,
    motion: &PlayerMotion,
    sequences: &[StudioSequence],
    clock: &FrameClock,
    estimation: bool,
) -> usize {
    if sequences.is_empty() {
        gait.gait_sequence = 0;
        return 0;
    }
    if state.sequence >= sequences.len() {
        log::trace!("Sequence {} out of range, resetting to 0", state.sequence);
        state.sequence = 0;
    }

    let (blend, pitch) = player_blend(&sequences[state.sequence], state.angles.x);
    state.angles.x = pitch;
    state.latched.prev_angles.x = pitch;
    state.blending[0] = blend;
    state.latched.prev_blending[0] = blend;
    state.latched.prev_seq_blending[0] = blend;

    let dt = clock.delta();
    estimate_gait(gait, state, motion, clock, estimation);

    let mut yaw = trunc_mod(state.angles.y - gait.gait_yaw, 360.0);
    if yaw < -180.0 {
        yaw += 360.0;
    }
    if yaw > 180.0 {
        yaw -= 360.0;
    }

    if yaw > TORSO_LIMIT {
        gait.gait_yaw -= 180.0;
        gait.movement = -gait.movement;
        yaw -= 180.0;
    } else if yaw < -TORSO_LIMIT {
        gait.gait_yaw += 180.0;
        gait.movement = -gait.movement;
        yaw += 180.0;
    }

    let torso = ((yaw / 4.0 + 30.0) / (60.0 / 255.0)) as u8;
    state.controller = [torso; 4];
    state.latched.prev_controller = [torso; 4];

    state.angles.y = gait.gait_yaw;
    if state.angles.y < 0.0 {
        state.angles.y += 360.0;
    }
    state.latched.prev_angles.y = state.angles.y;

    let mut gait_sequence = motion.gait_sequence;
    if gait_sequence >= sequences.len() {
        log::trace!("Gait sequence {gait_sequence} out of range, resetting to 0");
        gait_sequence = 0;
    }

    let sequence = &sequences[gait_sequence];
    if sequence.linear_movement.x > 0.0 {
        gait.gait_frame += f64::from(gait.movement / sequence.linear_movement.x)
            * f64::from(sequence.num_frames);
    } else {
        gait.gait_frame += f64::from(sequence.fps * dt);
    }

    if sequence.num_frames > 0 {
        let num_frames = f64::from(sequence.num_frames);
        gait.gait_frame -= (gait.gait_frame / num_frames).trunc() * num_frames;
        if gait.gait_frame < 0.0 {
            gait.gait_frame += num_frames;
        }
    }

    gait.gait_sequence = gait_sequence;
    gait_sequence
}
