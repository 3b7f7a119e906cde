use std::io::{Read, Write};

use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one sequence group record in bytes
pub const SEQUENCE_GROUP_SIZE: usize = 104;

/// A sequence group: group 0 lives in the model, others in `<name>NN.mdl` files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudioSequenceGroup {
    /// Group label
    pub label: String,
    /// File name of the external group
    pub name: String,
    /// Engine cache slot, unused on disk
    pub cache: i32,
    /// Offset of the animation data, used only by the built-in group
    pub data: i32,
}

impl StudioSequenceGroup {
    /// Parse a sequence group from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let label = reader.read_fixed_string::<32>()?;
        let name = reader.read_fixed_string::<64>()?;
        let cache = reader.read_i32_le()?;
        let data = reader.read_i32_le()?;

        Ok(Self {
            label,
            name,
            cache,
            data,
        })
    }

    /// Write a sequence group to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_fixed_string::<32>(&self.label)?;
        writer.write_fixed_string::<64>(&self.name)?;
        writer.write_i32_le(self.cache)?;
        writer.write_i32_le(self.data)?;
        Ok(())
    }
}
