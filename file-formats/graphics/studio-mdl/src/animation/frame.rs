//! Frame and interpolant estimation

use crate::chunks::StudioSequence;

use super::state::{EntityAnimationState, EntityRole};

/// Seconds a new update takes to fully replace the latched one
const UPDATE_INTERVAL: f64 = 0.1;

/// Progress between the latched and current update, in `[.., 2]`
///
/// Returns 1 when interpolation is off or the two updates are less than
/// 10ms apart.
pub fn estimate_interpolant(state: &EntityAnimationState, time: f64, interpolate: bool) -> f32 {
    if interpolate && state.anim_time >= state.latched.prev_anim_time + 0.01 {
        ((time - state.anim_time) / UPDATE_INTERVAL).min(2.0) as f32
    } else {
        1.0
    }
}

/// Continuous frame of `sequence` at `time`
///
/// Looping sequences wrap with period `num_frames - 1`, since the last frame
/// duplicates the first. Other sequences clamp just short of the last frame.
pub fn estimate_frame(
    sequence: &StudioSequence,
    state: &EntityAnimationState,
    time: f64,
    interpolate: bool,
) -> f64 {
    let start = match state.role {
        EntityRole::ViewModel { weapon_anim_time } => weapon_anim_time,
        EntityRole::World => state.anim_time,
    };

    let dfdt = if interpolate && time >= start {
        (time - start) * f64::from(state.framerate) * f64::from(sequence.fps)
    } else {
        0.0
    };

    let num_frames = f64::from(sequence.num_frames);
    let mut f = if sequence.num_frames <= 1 {
        0.0
    } else {
        f64::from(state.frame) * (num_frames - 1.0) / 256.0
    };
    f += dfdt;

    if sequence.is_looping() {
        if sequence.num_frames > 1 {
            f -= (f / (num_frames - 1.0)).trunc() * (num_frames - 1.0);
        }
        if f < 0.0 {
            f += num_frames - 1.0;
        }
    } else {
        if f >= num_frames - 1.001 {
            f = num_frames - 1.001;
        }
        if f < 0.0 {
            f = 0.0;
        }
    }

    f
}
