use std::io::{Read, Write};

use super::bone::CHANNEL_COUNT;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one per-bone animation record in bytes
pub const ANIM_RECORD_SIZE: usize = 12;

/// Per-bone, per-layer curve offsets
///
/// Each offset is relative to the start of this record; 0 means the channel
/// has no curve and holds the bone's default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimRecord {
    pub offsets: [u16; CHANNEL_COUNT],
}

impl AnimRecord {
    /// Parse an animation record from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut offsets = [0u16; CHANNEL_COUNT];
        for offset in &mut offsets {
            *offset = reader.read_u16_le()?;
        }
        Ok(Self { offsets })
    }

    /// Parse an animation record from the start of a byte slice
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let bytes = data.get(..ANIM_RECORD_SIZE)?;
        let mut offsets = [0u16; CHANNEL_COUNT];
        for (offset, pair) in offsets.iter_mut().zip(bytes.chunks_exact(2)) {
            *offset = u16::from_le_bytes([pair[0], pair[1]]);
        }
        Some(Self { offsets })
    }

    /// Write an animation record to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for offset in &self.offsets {
            writer.write_u16_le(*offset)?;
        }
        Ok(())
    }

    /// Curve offset for a channel, or `None` when the channel is static
    pub fn channel(&self, channel: usize) -> Option<usize> {
        match self.offsets.get(channel) {
            Some(&offset) if offset != 0 => Some(offset as usize),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_anim_record_round_trip() {
        let record = AnimRecord {
            offsets: [0, 0, 36, 0, 48, 0],
        };

        let mut data = Vec::new();
        record.write(&mut data).unwrap();
        assert_eq!(data.len(), ANIM_RECORD_SIZE);

        let parsed = AnimRecord::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(AnimRecord::from_bytes(&data), Some(record));
    }

    #[test]
    fn test_anim_record_channels() {
        let record = AnimRecord {
            offsets: [0, 0, 36, 0, 48, 0],
        };
        assert_eq!(record.channel(0), None);
        assert_eq!(record.channel(2), Some(36));
        assert_eq!(record.channel(4), Some(48));
        assert_eq!(record.channel(6), None);
    }

    #[test]
    fn test_anim_record_short_slice() {
        assert_eq!(AnimRecord::from_bytes(&[0u8; 8]), None);
    }
}
