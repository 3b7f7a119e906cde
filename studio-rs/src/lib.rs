//! Studio-RS library
//!
//! Command implementations behind the `studio-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
