use std::io::{Read, Write};

use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// Size of one animation event record in bytes
pub const EVENT_SIZE: usize = 76;

/// Event ids at or above this value are handled on the client
pub const CLIENT_EVENT_BASE: i32 = 5000;

/// An event fired when playback crosses a frame (footsteps, muzzle flashes)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudioEvent {
    /// Frame the event fires on
    pub frame: i32,
    /// Event id
    pub event: i32,
    /// Event type
    pub kind: i32,
    /// Free-form options string
    pub options: String,
}

impl StudioEvent {
    /// Parse an event from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let frame = reader.read_i32_le()?;
        let event = reader.read_i32_le()?;
        let kind = reader.read_i32_le()?;
        let options = reader.read_fixed_string::<64>()?;

        Ok(Self {
            frame,
            event,
            kind,
            options,
        })
    }

    /// Write an event to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32_le(self.frame)?;
        writer.write_i32_le(self.event)?;
        writer.write_i32_le(self.kind)?;
        writer.write_fixed_string::<64>(&self.options)?;
        Ok(())
    }

    /// Check if the event is dispatched client-side
    pub fn is_client_event(&self) -> bool {
        self.event >= CLIENT_EVENT_BASE
    }
}
