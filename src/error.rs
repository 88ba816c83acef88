//! Crate-level error types.
//!
//! Every error here is fatal and surfaced to the caller unmodified: bad
//! input data or a broken external dependency is never retried.

use thiserror::Error;

/// Errors produced by the packing pipeline and checkpoint lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input collection or invalid configuration.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Out-of-range sample access. A defensive check: correct cursor
    /// arithmetic never reaches this.
    #[error("sample index {index} out of range for corpus of length {len}")]
    SampleIndex {
        /// The offending index.
        index: usize,
        /// Corpus length at the time of access.
        len: usize,
    },

    /// Propagated opaquely from the tokenizer boundary.
    #[error("tokenization error: {0}")]
    Tokenization(String),

    /// Propagated opaquely from the adapter-save boundary, or a cleanup
    /// failure that indicates a real problem with checkpoint integrity.
    #[error("checkpoint write error: {0}")]
    CheckpointWrite(String),

    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::tokenizer::TokenizerError> for Error {
    fn from(err: crate::tokenizer::TokenizerError) -> Self {
        Error::Tokenization(err.to_string())
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
