//! Validate command: eager checks of configuration, corpus, tokenizer.

use crate::cli::commands::load_tokenizer;
use crate::cli::logging::log;
use crate::cli::{LogLevel, ValidateArgs};
use crate::corpus::QaCorpus;

pub fn run_validate(args: &ValidateArgs, level: LogLevel) -> Result<(), String> {
    let config = &args.config;

    config.validate().map_err(|e| format!("config: {e}"))?;
    log(level, LogLevel::Normal, "Config: OK");

    let corpus = QaCorpus::load(&config.data).map_err(|e| format!("corpus: {e}"))?;
    if corpus.is_empty() {
        return Err("corpus: no samples".to_string());
    }
    log(
        level,
        LogLevel::Normal,
        &format!("Corpus: OK ({} samples)", corpus.len()),
    );

    let tokenizer = load_tokenizer(config).map_err(|e| format!("tokenizer: {e}"))?;
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Tokenizer: OK (vocab {}, eos id {})",
            tokenizer.vocab_size(),
            tokenizer.eos_id()
        ),
    );

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Run: seq_length={} max_steps={} save_steps={} output={}",
            config.seq_length,
            config.max_steps,
            config.save_steps,
            config.output_dir.display()
        ),
    );

    Ok(())
}
