use std::io::{Read, Write};

use super::MotionFlags;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one bone controller record in bytes
pub const BONE_CONTROLLER_SIZE: usize = 24;

/// Which entity input drives a bone controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerSlot {
    /// One of the four general-purpose controller bytes
    Primary(usize),
    /// The mouth-open byte
    Mouth,
}

/// A programmatic bone adjustment, such as a head turn or jaw
#[derive(Debug, Clone, PartialEq)]
pub struct StudioBoneController {
    /// Bone the controller is attached to, -1 for none
    pub bone: i32,
    /// Driven channel, optionally with `RLOOP`
    pub kind: MotionFlags,
    /// Value at input 0
    pub start: f32,
    /// Value at input 255
    pub end: f32,
    /// Byte value at rest
    pub rest: i32,
    /// Input index: 0..=3 for primary controllers, 4 for the mouth
    pub index: i32,
}

impl Default for StudioBoneController {
    fn default() -> Self {
        Self {
            bone: -1,
            kind: MotionFlags::empty(),
            start: 0.0,
            end: 0.0,
            rest: 0,
            index: 0,
        }
    }
}

impl StudioBoneController {
    /// Parse a bone controller from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let bone = reader.read_i32_le()?;
        let kind = MotionFlags::from_bits_retain(reader.read_i32_le()?);
        let start = reader.read_f32_le()?;
        let end = reader.read_f32_le()?;
        let rest = reader.read_i32_le()?;
        let index = reader.read_i32_le()?;

        Ok(Self {
            bone,
            kind,
            start,
            end,
            rest,
            index,
        })
    }

    /// Write a bone controller to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32_le(self.bone)?;
        writer.write_i32_le(self.kind.bits())?;
        writer.write_f32_le(self.start)?;
        writer.write_f32_le(self.end)?;
        writer.write_i32_le(self.rest)?;
        writer.write_i32_le(self.index)?;
        Ok(())
    }

    /// Input slot feeding this controller
    ///
    /// Indices outside `0..=3` read the mouth byte.
    pub fn slot(&self) -> ControllerSlot {
        match self.index {
            i @ 0..=3 => ControllerSlot::Primary(i as usize),
            _ => ControllerSlot::Mouth,
        }
    }

    /// Check if the controller wraps around at 360 degrees
    pub fn is_rloop(&self) -> bool {
        self.kind.contains(MotionFlags::RLOOP)
    }

    /// Check if the controller drives exactly one rotation axis
    pub fn is_rotation(&self) -> bool {
        [MotionFlags::XR, MotionFlags::YR, MotionFlags::ZR].contains(&self.kind.channel())
    }

    /// Check if the controller drives exactly one position axis
    pub fn is_position(&self) -> bool {
        [MotionFlags::X, MotionFlags::Y, MotionFlags::Z].contains(&self.kind.channel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_controller_round_trip() {
        let controller = StudioBoneController {
            bone: 3,
            kind: MotionFlags::ZR | MotionFlags::RLOOP,
            start: 0.0,
            end: 360.0,
            rest: 0,
            index: 0,
        };

        let mut data = Vec::new();
        controller.write(&mut data).unwrap();
        assert_eq!(data.len(), BONE_CONTROLLER_SIZE);

        let parsed = StudioBoneController::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(parsed, controller);
        assert!(parsed.is_rloop());
        assert!(parsed.is_rotation());
        assert!(!parsed.is_position());

        let mixed = StudioBoneController {
            kind: MotionFlags::X | MotionFlags::XR,
            ..Default::default()
        };
        assert!(!mixed.is_rotation());
        assert!(!mixed.is_position());
    }

    #[test]
    fn test_controller_slot() {
        let test_cases = vec![
            (0, ControllerSlot::Primary(0)),
            (3, ControllerSlot::Primary(3)),
            (4, ControllerSlot::Mouth),
            (-1, ControllerSlot::Mouth),
        ];

        for (index, expected) in test_cases {
            let controller = StudioBoneController {
                index,
                ..Default::default()
            };
            assert_eq!(controller.slot(), expected, "index {index}");
        }
    }
}
