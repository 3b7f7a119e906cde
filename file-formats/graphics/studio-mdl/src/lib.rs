//! Parser and skeletal animation pipeline for GoldSrc studio models
//!
//! [`StudioModel`] reads the records of a `.mdl` file that drive animation:
//! bones, bone controllers, sequences with their events, sequence groups and
//! attachments. The [`animation`] module turns an entity's animation state
//! into world-space bone matrices every frame.

pub mod animation;
pub mod builder;
pub mod chunks;
pub mod error;
pub mod file_resolver;
pub mod header;
mod io_ext;
pub mod model;

pub use animation::{AnimationSettings, Animator, EntityAnimationState};
pub use error::{Result, StudioError};
pub use file_resolver::{DirectoryResolver, FileResolver, MemoryResolver};
pub use header::{StudioHeader, StudioModelFlags};
pub use model::{MAX_BONES, SPINE_BONE_NAME, StudioModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
