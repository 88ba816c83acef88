//! Pack command: one finite packing pass with counts.
//!
//! Reports the discarded remainder explicitly — the tail shorter than
//! `seq_length` is dropped, not padded, and that data loss should be
//! visible to the operator.

use crate::cli::commands::load_tokenizer;
use crate::cli::logging::log;
use crate::cli::{LogLevel, PackArgs};
use crate::corpus::QaCorpus;
use crate::packing::{PackedStream, PackingConfig};

pub fn run_pack(args: &PackArgs, level: LogLevel) -> Result<(), String> {
    let config = &args.config;
    config.validate().map_err(|e| e.to_string())?;

    let corpus = QaCorpus::load(&config.data).map_err(|e| e.to_string())?;
    let tokenizer = load_tokenizer(config)?;

    // Always a single pass here: the point is to measure what one epoch
    // of the corpus yields at this seq_length.
    let packing = PackingConfig {
        seq_length: config.seq_length,
        infinite: false,
        eos_token_id: tokenizer.eos_id(),
    };
    let mut stream =
        PackedStream::new(&corpus, tokenizer.as_ref(), packing).map_err(|e| e.to_string())?;

    let mut blocks = 0usize;
    loop {
        match stream.next_block() {
            Ok(Some(_)) => blocks += 1,
            Ok(None) => break,
            Err(e) => return Err(e.to_string()),
        }
    }
    let discarded = stream.buffered();
    let total_tokens = blocks * config.seq_length + discarded;

    log(level, LogLevel::Normal, &format!("Packed {} samples:", corpus.len()));
    log(
        level,
        LogLevel::Normal,
        &format!("  blocks of {} tokens: {}", config.seq_length, blocks),
    );
    log(level, LogLevel::Normal, &format!("  tokens emitted:      {}", blocks * config.seq_length));
    log(
        level,
        LogLevel::Normal,
        &format!("  tokens discarded:    {} (partial final block)", discarded),
    );
    log(level, LogLevel::Verbose, &format!("  tokens total:        {total_tokens}"));

    Ok(())
}
