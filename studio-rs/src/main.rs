//! Main entry point for the studio-rs CLI

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use studio_rs::cli::{Cli, Commands};
use studio_rs::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Explicit verbosity flags take precedence over RUST_LOG
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = cli.log_level() {
        logger.filter_level(level);
    }
    logger.init();

    match cli.command {
        Commands::Info(args) => commands::info::execute(&args),
        Commands::Pose(args) => commands::pose::execute(&args),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
