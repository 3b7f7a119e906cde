use std::io::{Read, Write};

use bitflags::bitflags;
use glam::Vec3;

use super::MotionFlags;
use super::event::StudioEvent;
use crate::error::Result;
use crate::header::StudioArray;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one sequence descriptor in bytes
pub const SEQUENCE_SIZE: usize = 176;

bitflags! {
    /// Sequence flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SequenceFlags: i32 {
        /// Playback wraps around instead of holding the last frame
        const LOOPING = 0x0001;
    }
}

/// A sequence descriptor: one named animation with its blend layers
#[derive(Debug, Clone, PartialEq)]
pub struct StudioSequence {
    /// Sequence name
    pub label: String,
    /// Frames per second
    pub fps: f32,
    /// Sequence flags
    pub flags: SequenceFlags,
    /// Activity id
    pub activity: i32,
    /// Activity weight
    pub activity_weight: i32,
    /// Event table
    pub event_table: StudioArray,
    /// Events resolved from `event_table` when the model is parsed
    pub events: Vec<StudioEvent>,
    /// Number of frames
    pub num_frames: i32,
    /// Foot pivot table
    pub pivots: StudioArray,
    /// Motion extraction mask
    pub motion_type: MotionFlags,
    /// Bone the motion is extracted from
    pub motion_bone: i32,
    /// Distance covered over one cycle
    pub linear_movement: Vec3,
    pub automove_pos_index: i32,
    pub automove_angle_index: i32,
    /// Per-sequence bounding box minimum
    pub bbmin: Vec3,
    /// Per-sequence bounding box maximum
    pub bbmax: Vec3,
    /// Number of blend layers: 1, 2 or 4
    pub num_blends: i32,
    /// Offset of the first animation record, relative to the sequence group data
    pub anim_index: i32,
    /// Blend axis type per blend dimension
    pub blend_type: [i32; 2],
    /// Blend axis start value per blend dimension
    pub blend_start: [f32; 2],
    /// Blend axis end value per blend dimension
    pub blend_end: [f32; 2],
    pub blend_parent: i32,
    /// Sequence group holding the animation data
    pub seq_group: i32,
    /// Transition graph entry node
    pub entry_node: i32,
    /// Transition graph exit node
    pub exit_node: i32,
    /// Transition graph flags
    pub node_flags: i32,
    /// Sequence to play after this one
    pub next_seq: i32,
}

impl Default for StudioSequence {
    fn default() -> Self {
        Self {
            label: String::new(),
            fps: 30.0,
            flags: SequenceFlags::empty(),
            activity: 0,
            activity_weight: 0,
            event_table: StudioArray::default(),
            events: Vec::new(),
            num_frames: 1,
            pivots: StudioArray::default(),
            motion_type: MotionFlags::empty(),
            motion_bone: 0,
            linear_movement: Vec3::ZERO,
            automove_pos_index: 0,
            automove_angle_index: 0,
            bbmin: Vec3::ZERO,
            bbmax: Vec3::ZERO,
            num_blends: 1,
            anim_index: 0,
            blend_type: [0; 2],
            blend_start: [0.0; 2],
            blend_end: [0.0; 2],
            blend_parent: 0,
            seq_group: 0,
            entry_node: 0,
            exit_node: 0,
            node_flags: 0,
            next_seq: 0,
        }
    }
}

impl StudioSequence {
    /// Parse a sequence descriptor from a reader
    ///
    /// The event list is left empty; the model fills it from `event_table`.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let label = reader.read_fixed_string::<32>()?;
        let fps = reader.read_f32_le()?;
        let flags = SequenceFlags::from_bits_retain(reader.read_i32_le()?);
        let activity = reader.read_i32_le()?;
        let activity_weight = reader.read_i32_le()?;
        let event_table = StudioArray::parse(reader)?;
        let num_frames = reader.read_i32_le()?;
        let pivots = StudioArray::parse(reader)?;
        let motion_type = MotionFlags::from_bits_retain(reader.read_i32_le()?);
        let motion_bone = reader.read_i32_le()?;
        let linear_movement = reader.read_vec3()?;
        let automove_pos_index = reader.read_i32_le()?;
        let automove_angle_index = reader.read_i32_le()?;
        let bbmin = reader.read_vec3()?;
        let bbmax = reader.read_vec3()?;
        let num_blends = reader.read_i32_le()?;
        let anim_index = reader.read_i32_le()?;

        let mut blend_type = [0; 2];
        for item in &mut blend_type {
            *item = reader.read_i32_le()?;
        }
        let mut blend_start = [0.0; 2];
        for item in &mut blend_start {
            *item = reader.read_f32_le()?;
        }
        let mut blend_end = [0.0; 2];
        for item in &mut blend_end {
            *item = reader.read_f32_le()?;
        }

        let blend_parent = reader.read_i32_le()?;
        let seq_group = reader.read_i32_le()?;
        let entry_node = reader.read_i32_le()?;
        let exit_node = reader.read_i32_le()?;
        let node_flags = reader.read_i32_le()?;
        let next_seq = reader.read_i32_le()?;

        Ok(Self {
            label,
            fps,
            flags,
            activity,
            activity_weight,
            event_table,
            events: Vec::new(),
            num_frames,
            pivots,
            motion_type,
            motion_bone,
            linear_movement,
            automove_pos_index,
            automove_angle_index,
            bbmin,
            bbmax,
            num_blends,
            anim_index,
            blend_type,
            blend_start,
            blend_end,
            blend_parent,
            seq_group,
            entry_node,
            exit_node,
            node_flags,
            next_seq,
        })
    }

    /// Write a sequence descriptor to a writer
    ///
    /// Only the event table reference is written; events live elsewhere.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_fixed_string::<32>(&self.label)?;
        writer.write_f32_le(self.fps)?;
        writer.write_i32_le(self.flags.bits())?;
        writer.write_i32_le(self.activity)?;
        writer.write_i32_le(self.activity_weight)?;
        self.event_table.write(writer)?;
        writer.write_i32_le(self.num_frames)?;
        self.pivots.write(writer)?;
        writer.write_i32_le(self.motion_type.bits())?;
        writer.write_i32_le(self.motion_bone)?;
        writer.write_vec3(self.linear_movement)?;
        writer.write_i32_le(self.automove_pos_index)?;
        writer.write_i32_le(self.automove_angle_index)?;
        writer.write_vec3(self.bbmin)?;
        writer.write_vec3(self.bbmax)?;
        writer.write_i32_le(self.num_blends)?;
        writer.write_i32_le(self.anim_index)?;

        for item in &self.blend_type {
            writer.write_i32_le(*item)?;
        }
        for item in &self.blend_start {
            writer.write_f32_le(*item)?;
        }
        for item in &self.blend_end {
            writer.write_f32_le(*item)?;
        }

        writer.write_i32_le(self.blend_parent)?;
        writer.write_i32_le(self.seq_group)?;
        writer.write_i32_le(self.entry_node)?;
        writer.write_i32_le(self.exit_node)?;
        writer.write_i32_le(self.node_flags)?;
        writer.write_i32_le(self.next_seq)?;

        Ok(())
    }

    /// Check if the sequence loops
    pub fn is_looping(&self) -> bool {
        self.flags.contains(SequenceFlags::LOOPING)
    }

    /// Frame count, with negative counts treated as zero
    pub fn frame_count(&self) -> usize {
        usize::try_from(self.num_frames).unwrap_or(0)
    }

    /// Number of blend layers stored for this sequence
    pub fn blend_count(&self) -> usize {
        usize::try_from(self.num_blends).unwrap_or(0)
    }

    /// Sequence group index, with negative values mapped to the built-in group
    pub fn group_index(&self) -> usize {
        usize::try_from(self.seq_group).unwrap_or(0)
    }

    /// Motion bone index, if valid
    pub fn motion_bone_index(&self) -> Option<usize> {
        usize::try_from(self.motion_bone).ok()
    }

    /// Client-side events whose frame lies in `(start, end]`
    pub fn client_events(&self, start: f64, end: f64) -> impl Iterator<Item = &StudioEvent> {
        self.events.iter().filter(move |event| {
            let frame = f64::from(event.frame);
            event.is_client_event() && frame > start && frame <= end
        })
    }
}
