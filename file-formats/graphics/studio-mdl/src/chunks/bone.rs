use std::io::{Read, Write};

use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one bone record in bytes
pub const BONE_SIZE: usize = 112;

/// Number of animated channels per bone: X, Y, Z, XR, YR, ZR
pub const CHANNEL_COUNT: usize = 6;

/// A bone in the model skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct StudioBone {
    /// Bone name, used for merge lookups and the gait cut
    pub name: String,
    /// Parent bone index, -1 for a root bone
    pub parent: i32,
    /// Unused flags
    pub flags: i32,
    /// Bone controller driving each channel, if any
    pub controllers: [Option<usize>; CHANNEL_COUNT],
    /// Default value per channel: position, then Euler angles in radians
    pub value: [f32; CHANNEL_COUNT],
    /// Scale applied to compressed curve samples per channel
    pub scale: [f32; CHANNEL_COUNT],
}

impl Default for StudioBone {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: -1,
            flags: 0,
            controllers: [None; CHANNEL_COUNT],
            value: [0.0; CHANNEL_COUNT],
            scale: [1.0; CHANNEL_COUNT],
        }
    }
}

impl StudioBone {
    /// Parse a bone from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let name = reader.read_fixed_string::<32>()?;
        let parent = reader.read_i32_le()?;
        let flags = reader.read_i32_le()?;

        let mut controllers = [None; CHANNEL_COUNT];
        for controller in &mut controllers {
            *controller = usize::try_from(reader.read_i32_le()?).ok();
        }

        let mut value = [0.0; CHANNEL_COUNT];
        for item in &mut value {
            *item = reader.read_f32_le()?;
        }

        let mut scale = [0.0; CHANNEL_COUNT];
        for item in &mut scale {
            *item = reader.read_f32_le()?;
        }

        Ok(Self {
            name,
            parent,
            flags,
            controllers,
            value,
            scale,
        })
    }

    /// Write a bone to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_fixed_string::<32>(&self.name)?;
        writer.write_i32_le(self.parent)?;
        writer.write_i32_le(self.flags)?;

        for controller in &self.controllers {
            let raw = controller.and_then(|c| i32::try_from(c).ok()).unwrap_or(-1);
            writer.write_i32_le(raw)?;
        }

        for item in &self.value {
            writer.write_f32_le(*item)?;
        }

        for item in &self.scale {
            writer.write_f32_le(*item)?;
        }

        Ok(())
    }

    /// Parent bone index, or `None` for a root bone
    ///
    /// Any negative parent is treated as a root.
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    /// Check if this is a root bone
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }
}
