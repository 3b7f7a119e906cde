//! Bone controller resolution
//!
//! Controllers turn byte inputs into per-controller adjustments that the pose
//! sampler adds on top of the animated channel values.

use crate::chunks::{ControllerSlot, StudioBoneController};

use super::state::EntityAnimationState;

/// Divisor mapping the mouth byte onto `[0, 1]`
pub const MOUTH_RANGE: f32 = 64.0;

/// Raw controller bytes feeding one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerInputs {
    pub current: [u8; 4],
    pub previous: [u8; 4],
    pub mouth: u8,
}

impl ControllerInputs {
    /// Current and latched controllers of an entity
    pub fn from_state(state: &EntityAnimationState) -> Self {
        Self {
            current: state.controller,
            previous: state.latched.prev_controller,
            mouth: state.mouth,
        }
    }
}

/// Resolved adjustment per bone controller
///
/// Rotation controllers hold radians, position controllers raw units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneAdjustments {
    values: Vec<f32>,
}

impl BoneAdjustments {
    /// Adjustment for a controller, 0 when the index is out of range
    pub fn get(&self, controller: usize) -> f32 {
        self.values.get(controller).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

fn blend_bytes(current: u8, previous: u8, dadt: f32) -> f32 {
    f32::from(current) * dadt + f32::from(previous) * (1.0 - dadt)
}

/// Controller value in degrees or units before axis conversion
fn controller_value(controller: &StudioBoneController, dadt: f32, inputs: &ControllerInputs) -> f32 {
    match controller.slot() {
        ControllerSlot::Primary(i) => {
            let current = inputs.current[i];
            let previous = inputs.previous[i];

            if controller.is_rloop() {
                if (i32::from(current) - i32::from(previous)).abs() > 128 {
                    let a = current.wrapping_add(128);
                    let b = previous.wrapping_add(128);
                    (blend_bytes(a, b, dadt) - 128.0) * (360.0 / 256.0) + controller.start
                } else {
                    blend_bytes(current, previous, dadt) * (360.0 / 256.0) + controller.start
                }
            } else {
                let value = (blend_bytes(current, previous, dadt) / 255.0).clamp(0.0, 1.0);
                (1.0 - value) * controller.start + value * controller.end
            }
        }
        ControllerSlot::Mouth => {
            let value = (f32::from(inputs.mouth) / MOUTH_RANGE).min(1.0);
            (1.0 - value) * controller.start + value * controller.end
        }
    }
}

/// Resolve every controller of a model
///
/// `dadt` blends the current bytes against the latched ones. Controllers
/// driving neither a single rotation nor a single position axis resolve to 0.
pub fn calc_bone_adjustments(
    controllers: &[StudioBoneController],
    dadt: f32,
    inputs: &ControllerInputs,
) -> BoneAdjustments {
    let values = controllers
        .iter()
        .map(|controller| {
            let value = controller_value(controller, dadt, inputs);
            if controller.is_rotation() {
                value.to_radians()
            } else if controller.is_position() {
                value
            } else {
                0.0
            }
        })
        .collect();

    BoneAdjustments { values }
}
