//! CLI command implementations

mod pack;
mod stats;
mod validate;

use crate::cli::{Cli, Command, LogLevel};
use crate::config::RunConfig;
use crate::tokenizer::{CharTokenizer, HfTokenizer, Tokenizer};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    };

    match cli.command {
        Command::Stats(args) => stats::run_stats(&args, log_level),
        Command::Pack(args) => pack::run_pack(&args, log_level),
        Command::Validate(args) => validate::run_validate(&args, log_level),
    }
}

/// Build the configured tokenizer: a HuggingFace `tokenizer.json` when one
/// is given, the char baseline (eos id 0) otherwise.
fn load_tokenizer(config: &RunConfig) -> Result<Box<dyn Tokenizer>, String> {
    match &config.tokenizer {
        Some(path) => {
            let tokenizer = HfTokenizer::from_file(path, &config.eos_token)
                .map_err(|e| e.to_string())?;
            Ok(Box::new(tokenizer))
        }
        None => Ok(Box::new(CharTokenizer::new(0))),
    }
}
