use std::io;
use thiserror::Error;

/// Error types for studio model parsing and animation
#[derive(Error, Debug)]
pub enum StudioError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Unsupported file version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(i32),

    /// Error during parsing
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A table or record points outside the file
    #[error("{what} at offset {offset} runs past the end of the data ({len} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        len: usize,
    },

    /// A bone references a parent that has not been computed yet
    #[error("Bone {bone} references unresolved parent {parent}")]
    UnresolvedParent { bone: usize, parent: i32 },

    /// More attachments than the renderer can hold
    #[error("Too many attachments: {0} (maximum is 4)")]
    TooManyAttachments(usize),

    /// An external sequence group could not be loaded
    #[error("Failed to load sequence group {group}: {reason}")]
    SequenceGroupLoad { group: usize, reason: String },
}

/// Result type using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;
