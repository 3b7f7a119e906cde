use std::io::{Read, Write};

use glam::Vec3;

use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one attachment record in bytes
pub const ATTACHMENT_SIZE: usize = 88;

/// A named point on a bone, such as a muzzle or hand
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudioAttachment {
    /// Attachment name
    pub name: String,
    /// Attachment type
    pub kind: i32,
    /// Bone the attachment follows
    pub bone: i32,
    /// Offset in the bone's local space
    pub org: Vec3,
    /// Local direction vectors
    pub vectors: [Vec3; 3],
}

impl StudioAttachment {
    /// Parse an attachment from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let name = reader.read_fixed_string::<32>()?;
        let kind = reader.read_i32_le()?;
        let bone = reader.read_i32_le()?;
        let org = reader.read_vec3()?;
        let vectors = [reader.read_vec3()?, reader.read_vec3()?, reader.read_vec3()?];

        Ok(Self {
            name,
            kind,
            bone,
            org,
            vectors,
        })
    }

    /// Write an attachment to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_fixed_string::<32>(&self.name)?;
        writer.write_i32_le(self.kind)?;
        writer.write_i32_le(self.bone)?;
        writer.write_vec3(self.org)?;
        for vector in &self.vectors {
            writer.write_vec3(*vector)?;
        }
        Ok(())
    }

    /// Bone index, if valid
    pub fn bone_index(&self) -> Option<usize> {
        usize::try_from(self.bone).ok()
    }
}
