//! Root CLI structure for studio-rs

use clap::{Parser, Subcommand};

use crate::commands::info::InfoArgs;
use crate::commands::pose::PoseArgs;

#[derive(Parser)]
#[command(name = "studio-rs")]
#[command(about = "Command-line tools for GoldSrc studio models", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v`/`-q`, if either was given
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        match (self.verbose, self.quiet) {
            (0, false) => None,
            (0, true) => Some(log::LevelFilter::Error),
            (1, _) => Some(log::LevelFilter::Info),
            (2, _) => Some(log::LevelFilter::Debug),
            _ => Some(log::LevelFilter::Trace),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display the header, skeleton, controllers and sequences of a model
    Info(InfoArgs),

    /// Evaluate a sequence at a point in time and print world bone positions
    Pose(PoseArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
