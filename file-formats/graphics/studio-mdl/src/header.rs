use std::io::{Read, Write};

use bitflags::bitflags;
use glam::Vec3;

use crate::error::{Result, StudioError};
use crate::io_ext::{ReadExt, WriteExt};

/// Magic signature for studio model files ("IDST")
pub const STUDIO_MAGIC: [u8; 4] = *b"IDST";

/// Magic signature for external sequence group files ("IDSQ")
pub const SEQUENCE_GROUP_MAGIC: [u8; 4] = *b"IDSQ";

/// The only studio format version this crate reads
pub const STUDIO_VERSION: i32 = 10;

/// Size of the on-disk model header in bytes
pub const HEADER_SIZE: usize = 244;

/// Size of the on-disk sequence group file header in bytes
pub const SEQUENCE_GROUP_HEADER_SIZE: usize = 76;

bitflags! {
    /// Model flags from the studio header
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StudioModelFlags: i32 {
        /// Leave a rocket trail
        const ROCKET = 0x0001;
        /// Leave a grenade trail
        const GRENADE = 0x0002;
        /// Leave a blood trail
        const GIB = 0x0004;
        /// Rotate around the yaw axis
        const ROTATE = 0x0008;
        /// Green split trail
        const TRACER = 0x0010;
        /// Blood
        const ZOMGIB = 0x0020;
        /// Orange split trail
        const TRACER2 = 0x0040;
        /// Purple trail
        const TRACER3 = 0x0080;
        /// Skip ambient lighting
        const NO_SHADE_LIGHT = 0x0100;
        /// Use hitbox collisions
        const HITBOX_COLLISIONS = 0x0200;
        /// Light from the sky instead of the floor
        const FORCE_SKYLIGHT = 0x0400;
    }
}

/// A `(count, offset)` pair pointing at a table of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudioArray {
    /// Number of records in the table
    pub count: i32,
    /// Offset from the start of the file to the first record
    pub offset: i32,
}

impl StudioArray {
    /// Create a new table reference
    pub fn new(count: i32, offset: i32) -> Self {
        Self { count, offset }
    }

    /// Parse a table reference from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_i32_le()?;
        let offset = reader.read_i32_le()?;
        Ok(Self { count, offset })
    }

    /// Write a table reference to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32_le(self.count)?;
        writer.write_i32_le(self.offset)?;
        Ok(())
    }

    /// Number of records, with negative counts treated as empty
    pub fn len(&self) -> usize {
        usize::try_from(self.count).unwrap_or(0)
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }

    /// Byte range covered by this table for records of `record_size` bytes
    ///
    /// Returns an error when the table does not fit inside `data_len` bytes.
    pub fn byte_range(
        &self,
        record_size: usize,
        data_len: usize,
        what: &'static str,
    ) -> Result<std::ops::Range<usize>> {
        let start = usize::try_from(self.offset).map_err(|_| {
            StudioError::ParseError(format!("{what} has negative offset {}", self.offset))
        })?;
        let end = self
            .len()
            .checked_mul(record_size)
            .and_then(|size| start.checked_add(size))
            .filter(|&end| end <= data_len)
            .ok_or(StudioError::OutOfBounds {
                what,
                offset: start,
                len: data_len,
            })?;
        Ok(start..end)
    }
}

/// The fixed-size header at the start of every studio model
#[derive(Debug, Clone, PartialEq)]
pub struct StudioHeader {
    /// Format version (always 10)
    pub version: i32,
    /// Internal model name
    pub name: String,
    /// Total file length in bytes
    pub length: i32,
    /// Ideal eye position
    pub eye_position: Vec3,
    /// Movement hull minimum
    pub min: Vec3,
    /// Movement hull maximum
    pub max: Vec3,
    /// Clipping box minimum
    pub bbmin: Vec3,
    /// Clipping box maximum
    pub bbmax: Vec3,
    /// Model flags
    pub flags: StudioModelFlags,
    /// Bones
    pub bones: StudioArray,
    /// Bone controllers
    pub bone_controllers: StudioArray,
    /// Hitboxes
    pub hitboxes: StudioArray,
    /// Sequence descriptors
    pub sequences: StudioArray,
    /// Sequence groups
    pub sequence_groups: StudioArray,
    /// Textures
    pub textures: StudioArray,
    /// Offset of the texture pixel data
    pub texture_data_index: i32,
    /// Number of skin references per family
    pub num_skin_ref: i32,
    /// Number of skin families
    pub num_skin_families: i32,
    /// Offset of the skin table
    pub skin_index: i32,
    /// Body parts
    pub body_parts: StudioArray,
    /// Attachments
    pub attachments: StudioArray,
    pub sound_table: i32,
    pub sound_index: i32,
    pub sound_groups: i32,
    pub sound_group_index: i32,
    /// Animation node transitions
    pub transitions: StudioArray,
}

impl Default for StudioHeader {
    fn default() -> Self {
        Self {
            version: STUDIO_VERSION,
            name: String::new(),
            length: 0,
            eye_position: Vec3::ZERO,
            min: Vec3::ZERO,
            max: Vec3::ZERO,
            bbmin: Vec3::ZERO,
            bbmax: Vec3::ZERO,
            flags: StudioModelFlags::empty(),
            bones: StudioArray::default(),
            bone_controllers: StudioArray::default(),
            hitboxes: StudioArray::default(),
            sequences: StudioArray::default(),
            sequence_groups: StudioArray::default(),
            textures: StudioArray::default(),
            texture_data_index: 0,
            num_skin_ref: 0,
            num_skin_families: 0,
            skin_index: 0,
            body_parts: StudioArray::default(),
            attachments: StudioArray::default(),
            sound_table: 0,
            sound_index: 0,
            sound_groups: 0,
            sound_group_index: 0,
            transitions: StudioArray::default(),
        }
    }
}

impl StudioHeader {
    /// Parse the studio header from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if magic != STUDIO_MAGIC {
            return Err(StudioError::InvalidMagic {
                expected: String::from_utf8_lossy(&STUDIO_MAGIC).to_string(),
                actual: String::from_utf8_lossy(&magic).to_string(),
            });
        }

        let version = reader.read_i32_le()?;
        if version != STUDIO_VERSION {
            return Err(StudioError::UnsupportedVersion(version));
        }

        let name = reader.read_fixed_string::<64>()?;
        let length = reader.read_i32_le()?;

        let eye_position = reader.read_vec3()?;
        let min = reader.read_vec3()?;
        let max = reader.read_vec3()?;
        let bbmin = reader.read_vec3()?;
        let bbmax = reader.read_vec3()?;
        let flags = StudioModelFlags::from_bits_retain(reader.read_i32_le()?);

        let bones = StudioArray::parse(reader)?;
        let bone_controllers = StudioArray::parse(reader)?;
        let hitboxes = StudioArray::parse(reader)?;
        let sequences = StudioArray::parse(reader)?;
        let sequence_groups = StudioArray::parse(reader)?;

        let textures = StudioArray::parse(reader)?;
        let texture_data_index = reader.read_i32_le()?;

        let num_skin_ref = reader.read_i32_le()?;
        let num_skin_families = reader.read_i32_le()?;
        let skin_index = reader.read_i32_le()?;

        let body_parts = StudioArray::parse(reader)?;
        let attachments = StudioArray::parse(reader)?;

        let sound_table = reader.read_i32_le()?;
        let sound_index = reader.read_i32_le()?;
        let sound_groups = reader.read_i32_le()?;
        let sound_group_index = reader.read_i32_le()?;

        let transitions = StudioArray::parse(reader)?;

        Ok(Self {
            version,
            name,
            length,
            eye_position,
            min,
            max,
            bbmin,
            bbmax,
            flags,
            bones,
            bone_controllers,
            hitboxes,
            sequences,
            sequence_groups,
            textures,
            texture_data_index,
            num_skin_ref,
            num_skin_families,
            skin_index,
            body_parts,
            attachments,
            sound_table,
            sound_index,
            sound_groups,
            sound_group_index,
            transitions,
        })
    }

    /// Write the studio header to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&STUDIO_MAGIC)?;
        writer.write_i32_le(self.version)?;
        writer.write_fixed_string::<64>(&self.name)?;
        writer.write_i32_le(self.length)?;

        writer.write_vec3(self.eye_position)?;
        writer.write_vec3(self.min)?;
        writer.write_vec3(self.max)?;
        writer.write_vec3(self.bbmin)?;
        writer.write_vec3(self.bbmax)?;
        writer.write_i32_le(self.flags.bits())?;

        self.bones.write(writer)?;
        self.bone_controllers.write(writer)?;
        self.hitboxes.write(writer)?;
        self.sequences.write(writer)?;
        self.sequence_groups.write(writer)?;

        self.textures.write(writer)?;
        writer.write_i32_le(self.texture_data_index)?;

        writer.write_i32_le(self.num_skin_ref)?;
        writer.write_i32_le(self.num_skin_families)?;
        writer.write_i32_le(self.skin_index)?;

        self.body_parts.write(writer)?;
        self.attachments.write(writer)?;

        writer.write_i32_le(self.sound_table)?;
        writer.write_i32_le(self.sound_index)?;
        writer.write_i32_le(self.sound_groups)?;
        writer.write_i32_le(self.sound_group_index)?;

        self.transitions.write(writer)?;

        Ok(())
    }
}

/// Header of an external sequence group file (`<model>01.mdl` and so on)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceGroupHeader {
    /// Format version
    pub version: i32,
    /// Internal name
    pub name: String,
    /// Total file length in bytes
    pub length: i32,
}

impl SequenceGroupHeader {
    /// Parse a sequence group file header
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if magic != SEQUENCE_GROUP_MAGIC {
            return Err(StudioError::InvalidMagic {
                expected: String::from_utf8_lossy(&SEQUENCE_GROUP_MAGIC).to_string(),
                actual: String::from_utf8_lossy(&magic).to_string(),
            });
        }

        let version = reader.read_i32_le()?;
        let name = reader.read_fixed_string::<64>()?;
        let length = reader.read_i32_le()?;

        Ok(Self {
            version,
            name,
            length,
        })
    }

    /// Write a sequence group file header
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&SEQUENCE_GROUP_MAGIC)?;
        writer.write_i32_le(self.version)?;
        writer.write_fixed_string::<64>(&self.name)?;
        writer.write_i32_le(self.length)?;
        Ok(())
    }
}
