//! Afinar CLI
//!
//! # Usage
//!
//! ```bash
//! # Corpus statistics
//! afinar stats data.json
//!
//! # Measure one packing pass
//! afinar pack --data data.json --seq-length 1024
//!
//! # Validate a run configuration
//! afinar validate --data data.json --tokenizer tokenizer.json
//! ```

use afinar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
