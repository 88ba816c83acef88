//! CLI for the packing pipeline.
//!
//! Command handlers and output utilities.

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::{log, LogLevel};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RunConfig;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "afinar",
    version,
    about = "Constant-length packing and adapter checkpoints for supervised fine-tuning"
)]
pub struct Cli {
    /// Verbose output with additional details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report corpus statistics and provenance hash
    Stats(StatsArgs),
    /// Run one packing pass and report block and token counts
    Pack(PackArgs),
    /// Validate run configuration and corpus
    Validate(ValidateArgs),
}

/// Arguments for `stats`.
#[derive(Debug, clap::Args)]
pub struct StatsArgs {
    /// Path to the JSON corpus
    pub data: PathBuf,
}

/// Arguments for `pack`.
#[derive(Debug, clap::Args)]
pub struct PackArgs {
    /// Run configuration
    #[command(flatten)]
    pub config: RunConfig,
}

/// Arguments for `validate`.
#[derive(Debug, clap::Args)]
pub struct ValidateArgs {
    /// Run configuration
    #[command(flatten)]
    pub config: RunConfig,
}
