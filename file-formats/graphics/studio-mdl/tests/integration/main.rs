//! Integration tests for the studio model animation pipeline

mod blending;
mod common;
mod determinism;
mod gait;
mod groups;
mod merge;
mod scenario;
