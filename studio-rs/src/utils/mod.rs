//! Shared utilities for the studio-rs CLI

pub mod table;
pub mod tree;

pub use table::*;
pub use tree::*;
