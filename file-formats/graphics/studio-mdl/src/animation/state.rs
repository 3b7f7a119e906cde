//! Per-entity animation state mutated once per frame

use glam::Vec3;

/// How the entity moves, which decides how its root transform is interpolated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveType {
    /// Not moving; angles are used as is
    #[default]
    None,
    Walk,
    /// Server-stepped monsters; origin and angles are interpolated
    Step,
    Fly,
    Toss,
    Push,
    NoClip,
    /// Attached to another entity; bones are merged onto its saved skeleton
    Follow,
}

impl MoveType {
    /// Map an engine move type number, `None` for unknown values
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            3 => Some(Self::Walk),
            4 => Some(Self::Step),
            5 => Some(Self::Fly),
            6 => Some(Self::Toss),
            7 => Some(Self::Push),
            8 => Some(Self::NoClip),
            12 => Some(Self::Follow),
            _ => None,
        }
    }
}

/// Render effects that alter the root bone transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderFx {
    #[default]
    None,
    /// Random axis scale or offset jitter
    Distort,
    /// Same jitter as `Distort`
    Hologram,
    /// Stretch along the Y column over time
    Explode,
}

impl RenderFx {
    /// Map an engine render fx number; effects without a transform map to `None`
    pub fn from_raw(value: i32) -> Self {
        match value {
            15 => Self::Distort,
            16 => Self::Hologram,
            17 => Self::Explode,
            _ => Self::None,
        }
    }
}

/// Which clock drives the entity's frame estimate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityRole {
    #[default]
    World,
    /// First-person weapon model, animated from the weapon animation start
    ViewModel { weapon_anim_time: f64 },
}

/// Snapshot of the previous network update, used for interpolation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct LatchedAnimation {
    pub prev_anim_time: f64,
    /// Time the current sequence started; 0 when no transition is pending
    pub sequence_time: f64,
    pub prev_sequence: usize,
    pub prev_frame: f64,
    pub prev_controller: [u8; 4],
    pub prev_blending: [u8; 2],
    /// Blend weights of the previous sequence at the moment it was replaced
    pub prev_seq_blending: [u8; 2],
    pub prev_origin: Vec3,
    pub prev_angles: Vec3,
}

/// Animation inputs of one renderable entity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityAnimationState {
    pub sequence: usize,
    /// Frame at `anim_time` in 1/256ths of the sequence
    pub frame: f32,
    pub framerate: f32,
    pub anim_time: f64,
    pub controller: [u8; 4],
    pub mouth: u8,
    pub blending: [u8; 2],
    pub body: i32,
    pub skin: i32,
    pub origin: Vec3,
    /// Pitch, yaw and roll in degrees
    pub angles: Vec3,
    pub move_type: MoveType,
    pub render_fx: RenderFx,
    /// Interpolate the origin even without linear motion
    pub slerp_origin: bool,
    pub role: EntityRole,
    pub latched: LatchedAnimation,
}

impl Default for EntityAnimationState {
    fn default() -> Self {
        Self {
            sequence: 0,
            frame: 0.0,
            framerate: 1.0,
            anim_time: 0.0,
            controller: [0; 4],
            mouth: 0,
            blending: [0; 2],
            body: 0,
            skin: 0,
            origin: Vec3::ZERO,
            angles: Vec3::ZERO,
            move_type: MoveType::None,
            render_fx: RenderFx::None,
            slerp_origin: false,
            role: EntityRole::World,
            latched: LatchedAnimation::default(),
        }
    }
}

impl EntityAnimationState {
    /// Create a state playing `sequence` from its first frame
    pub fn new(sequence: usize) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    /// Switch to a new sequence at `time`, starting a cross-fade from the old one
    pub fn begin_sequence(&mut self, sequence: usize, time: f64) {
        if sequence == self.sequence {
            return;
        }
        self.latched.prev_sequence = self.sequence;
        self.latched.prev_seq_blending = self.blending;
        self.latched.sequence_time = time;
        self.sequence = sequence;
        self.frame = 0.0;
        self.anim_time = time;
    }

    /// Latch the current values before applying a new update stamped `anim_time`
    pub fn begin_update(&mut self, anim_time: f64) {
        self.latched.prev_anim_time = self.anim_time;
        self.latched.prev_controller = self.controller;
        self.latched.prev_blending = self.blending;
        self.latched.prev_origin = self.origin;
        self.latched.prev_angles = self.angles;
        self.anim_time = anim_time;
    }

    /// Check if this is a first-person view model
    pub fn is_view_model(&self) -> bool {
        matches!(self.role, EntityRole::ViewModel { .. })
    }
}

/// Locomotion state kept for player entities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct GaitState {
    /// Lower-body sequence; 0 disables the overlay
    pub gait_sequence: usize,
    pub gait_frame: f64,
    /// Facing of the hips in degrees
    pub gait_yaw: f32,
    pub prev_gait_origin: Vec3,
    /// Last estimated movement in units, negative when walking backwards
    pub movement: f32,
    /// Frame counter of the last evaluation
    pub render_frame: Option<u64>,
}

/// Movement reported for a player this frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerMotion {
    pub gait_sequence: usize,
    pub velocity: Vec3,
}

/// Client time of the current and previous rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameClock {
    pub time: f64,
    pub old_time: f64,
    pub frame_count: u64,
}

impl FrameClock {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            old_time: time,
            frame_count: 0,
        }
    }

    /// Elapsed time since the previous frame, clamped to `[0, 1]`
    pub fn delta(&self) -> f32 {
        (self.time - self.old_time).clamp(0.0, 1.0) as f32
    }

    /// Step to the next frame
    pub fn advance(&mut self, dt: f64) {
        self.old_time = self.time;
        self.time += dt;
        self.frame_count += 1;
    }
}

/// Simple linear congruential generator for deterministic randomness
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u32,
}

impl LcgRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generate next random u16
    pub fn next_u16(&mut self) -> u16 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.state %= 1 << 31;
        (self.state >> 8) as u16
    }

    /// Generate next random f32 in [0.0, 1.0)
    pub fn next_f32(&mut self) -> f32 {
        f32::from(self.next_u16()) / 65_536.0
    }

    /// Random integer in `[low, high]`
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as u32;
        low + (u32::from(self.next_u16()) % span) as i32
    }

    /// Random float in `[low, high)`
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32()
    }
}

impl Default for LcgRng {
    fn default() -> Self {
        Self::new(1312)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_begin_sequence_latches_previous() {
        let mut state = EntityAnimationState::new(2);
        state.blending = [40, 200];
        state.begin_sequence(5, 12.5);

        assert_eq!(state.sequence, 5);
        assert_eq!(state.latched.prev_sequence, 2);
        assert_eq!(state.latched.prev_seq_blending, [40, 200]);
        assert_eq!(state.latched.sequence_time, 12.5);
        assert_eq!(state.anim_time, 12.5);

        // same sequence keeps the running transition
        state.begin_sequence(5, 20.0);
        assert_eq!(state.latched.sequence_time, 12.5);
    }

    #[test]
    fn test_begin_update_latches_inputs() {
        let mut state = EntityAnimationState {
            anim_time: 1.0,
            controller: [1, 2, 3, 4],
            blending: [9, 8],
            origin: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        state.begin_update(1.1);

        assert_eq!(state.latched.prev_anim_time, 1.0);
        assert_eq!(state.latched.prev_controller, [1, 2, 3, 4]);
        assert_eq!(state.latched.prev_blending, [9, 8]);
        assert_eq!(state.latched.prev_origin, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.anim_time, 1.1);
    }

    #[test]
    fn test_raw_enum_mapping() {
        assert_eq!(MoveType::from_raw(4), Some(MoveType::Step));
        assert_eq!(MoveType::from_raw(12), Some(MoveType::Follow));
        assert_eq!(MoveType::from_raw(99), None);
        assert_eq!(RenderFx::from_raw(17), RenderFx::Explode);
        assert_eq!(RenderFx::from_raw(3), RenderFx::None);
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new(10.0);
        assert_eq!(clock.delta(), 0.0);

        clock.advance(0.05);
        assert_eq!(clock.frame_count, 1);
        assert!((clock.delta() - 0.05).abs() < 1e-6);

        clock.advance(3.0);
        assert_eq!(clock.delta(), 1.0);
    }

    #[test]
    fn test_lcg_rng_deterministic() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..10 {
            assert_eq!(rng1.next_u16(), rng2.next_u16());
        }
    }

    #[test]
    fn test_lcg_rng_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..100 {
            let f = rng.next_f32();
            assert!((0.0..1.0).contains(&f));

            let i = rng.range(0, 49);
            assert!((0..=49).contains(&i));

            let g = rng.range_f32(-10.0, 10.0);
            assert!((-10.0..10.0).contains(&g));
        }
        assert_eq!(rng.range(3, 3), 3);
    }
}
