//! Fixed-size records referenced from the studio header

pub mod anim;
pub mod attachment;
pub mod bone;
pub mod bone_controller;
pub mod event;
pub mod sequence;
pub mod sequence_group;

pub use anim::{ANIM_RECORD_SIZE, AnimRecord};
pub use attachment::{ATTACHMENT_SIZE, StudioAttachment};
pub use bone::{BONE_SIZE, CHANNEL_COUNT, StudioBone};
pub use bone_controller::{BONE_CONTROLLER_SIZE, ControllerSlot, StudioBoneController};
pub use event::{CLIENT_EVENT_BASE, EVENT_SIZE, StudioEvent};
pub use sequence::{SEQUENCE_SIZE, SequenceFlags, StudioSequence};
pub use sequence_group::{SEQUENCE_GROUP_SIZE, StudioSequenceGroup};

bitflags::bitflags! {
    /// Motion and controller channel flags
    ///
    /// Bone controllers use one axis flag plus an optional `RLOOP`; sequences
    /// use the flags as a motion-extraction mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    #[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
    pub struct MotionFlags: i32 {
        const X = 0x0001;
        const Y = 0x0002;
        const Z = 0x0004;
        const XR = 0x0008;
        const YR = 0x0010;
        const ZR = 0x0020;
        const LX = 0x0040;
        const LY = 0x0080;
        const LZ = 0x0100;
        const AX = 0x0200;
        const AY = 0x0400;
        const AZ = 0x0800;
        const AXR = 0x1000;
        const AYR = 0x2000;
        const AZR = 0x4000;
        /// Controller wraps around at 360 degrees
        const RLOOP = 0x8000;
    }
}

impl MotionFlags {
    /// Mask covering every channel flag but `RLOOP`
    pub const TYPES: Self = Self::from_bits_retain(0x7FFF);

    /// Channel flags with `RLOOP` stripped
    pub fn channel(self) -> Self {
        self & Self::TYPES
    }
}
