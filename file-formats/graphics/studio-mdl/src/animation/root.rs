//! Entity root transforms and render effects

use glam::Vec3;

use crate::chunks::{MotionFlags, StudioSequence};

use super::bone_transform::{Mat3x4, RootMatrices};
use super::state::{EntityAnimationState, LcgRng, MoveType, RenderFx};
use super::types::wrap_degrees;

/// Camera basis used to build the software render transform
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewBasis {
    pub origin: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub normal: Vec3,
}

/// World placement of an entity's skeleton
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootTransform {
    /// Entity rotation with the interpolated origin as translation
    pub rotation: Mat3x4,
    pub origin: Vec3,
    /// View-space variant of `rotation`
    pub alias: Option<Mat3x4>,
}

impl RootTransform {
    /// Build the root transform of an entity at `time`
    ///
    /// Step-moving entities blend angles along the shortest arc from the
    /// latched update, reaching the current values one update interval late.
    /// Their origin is blended too when the sequence carries linear X motion
    /// or the entity asks for it. No blending happens once the last update
    /// is more than a second old.
    pub fn from_entity(
        state: &EntityAnimationState,
        sequence: Option<&StudioSequence>,
        time: f64,
        interpolate: bool,
    ) -> Self {
        let mut origin = state.origin;
        let mut angles = state.angles;

        if state.move_type == MoveType::Step {
            let latched = &state.latched;
            let mut f = 0.0f32;

            if time < state.anim_time + 1.0 && state.anim_time != latched.prev_anim_time {
                f = ((time - state.anim_time) / (state.anim_time - latched.prev_anim_time)) as f32;
            }

            f = if interpolate { f - 1.0 } else { 0.0 };

            let linear =
                sequence.is_some_and(|seq| seq.motion_type.contains(MotionFlags::LX));
            if linear || state.slerp_origin {
                origin += (state.origin - latched.prev_origin) * f;
            }

            let delta = state.angles - latched.prev_angles;
            angles += Vec3::new(
                wrap_degrees(delta.x),
                wrap_degrees(delta.y),
                wrap_degrees(delta.z),
            ) * f;
        }

        angles.x = -angles.x;
        let mut rotation = Mat3x4::from_angles(angles);
        rotation.set_translation(origin);

        Self {
            rotation,
            origin,
            alias: None,
        }
    }

    /// Add the view-space transform used by the software render path
    pub fn with_view(mut self, view: &ViewBasis) -> Self {
        let up = -view.up;
        let view_matrix = Mat3x4 {
            rows: [
                [view.right.x, view.right.y, view.right.z, 0.0],
                [up.x, up.y, up.z, 0.0],
                [view.normal.x, view.normal.y, view.normal.z, 0.0],
            ],
        };

        let mut relative = self.rotation;
        relative.set_translation(self.origin - view.origin);
        self.alias = Some(view_matrix.concat(&relative));
        self
    }

    /// Matrices root bones are concatenated onto
    pub fn matrices(&self) -> RootMatrices {
        RootMatrices {
            rotation: self.rotation,
            alias: self.alias,
        }
    }
}

/// Apply an entity's render effect to a root render matrix
///
/// `elapsed` is the time since the entity's last update.
pub fn apply_render_fx(fx: RenderFx, transform: &mut Mat3x4, rng: &mut LcgRng, elapsed: f64) {
    match fx {
        RenderFx::Distort | RenderFx::Hologram => {
            if rng.range(0, 49) == 0 {
                let axis = if rng.range(0, 1) == 1 { 2 } else { 0 };
                let scale = rng.range_f32(1.0, 1.484);
                for value in &mut transform.rows[axis][..3] {
                    *value *= scale;
                }
            } else if rng.range(0, 49) == 0 {
                // the axis draw is unused but keeps the sequence of draws
                let _axis = rng.range(0, 1);
                let offset = rng.range_f32(-10.0, 10.0);
                let row = rng.range(0, 2) as usize;
                transform.rows[row][3] += offset;
            }
        }
        RenderFx::Explode => {
            let scale = (1.0 + elapsed * 10.0).min(2.0) as f32;
            for row in &mut transform.rows {
                row[1] *= scale;
            }
        }
        RenderFx::None => {}
    }
}
