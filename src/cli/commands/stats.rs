//! Stats command: corpus summary and provenance hash.

use crate::cli::logging::log;
use crate::cli::{LogLevel, StatsArgs};
use crate::corpus::{corpus_stats, QaCorpus};

pub fn run_stats(args: &StatsArgs, level: LogLevel) -> Result<(), String> {
    let corpus = QaCorpus::load(&args.data).map_err(|e| e.to_string())?;
    let stats = corpus_stats(&corpus);

    log(level, LogLevel::Normal, &format!("Corpus: {}", args.data.display()));
    log(level, LogLevel::Normal, &format!("  samples:            {}", stats.total));
    log(
        level,
        LogLevel::Normal,
        &format!("  avg query length:   {} chars", stats.avg_query_len),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("  avg response length: {} chars", stats.avg_response_len),
    );
    log(level, LogLevel::Verbose, &format!("  data hash: {}", corpus.data_hash()));

    Ok(())
}
