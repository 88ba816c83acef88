//! Question/answer corpus loading.
//!
//! Loads a JSON array of `{"query": "...", "response": "..."}` records and
//! exposes them by index, in insertion order. The whole collection is
//! materialized at construction: downstream infinite packing needs repeated
//! access, so there is no lazy or partial loading. Records are immutable
//! after load.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{Error, Result};

/// A single query/response training record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaSample {
    /// The question text
    pub query: String,
    /// The answer text
    pub response: String,
}

/// Format a sample as prompt text for causal LM training.
///
/// Recomputed on demand; the formatted string is never stored.
#[must_use]
pub fn format_sample(sample: &QaSample) -> String {
    format!("Question: {}\n\nAnswer: {}", sample.query, sample.response)
}

/// An ordered, fixed-length collection of [`QaSample`] records.
///
/// Read-only after construction: length is constant and index access is
/// total over `[0, len)`.
#[derive(Debug, Clone)]
pub struct QaCorpus {
    samples: Vec<QaSample>,
}

impl QaCorpus {
    /// Load a corpus from a JSON array file.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] if the file is not a well-formed JSON
    /// array of objects with string `query` and `response` fields. Missing
    /// fields fail here rather than surfacing later in the pipeline.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let samples: Vec<QaSample> = serde_json::from_str(&content).map_err(|e| {
            Error::DataFormat(format!(
                "{}: expected a JSON array of {{query, response}} records: {e}",
                path.display()
            ))
        })?;
        Ok(Self { samples })
    }

    /// Build a corpus from already-loaded samples.
    #[must_use]
    pub fn from_samples(samples: Vec<QaSample>) -> Self {
        Self { samples }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the corpus holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get a sample by index.
    ///
    /// # Errors
    /// Returns [`Error::SampleIndex`] outside `[0, len)`.
    pub fn get(&self, index: usize) -> Result<&QaSample> {
        self.samples.get(index).ok_or(Error::SampleIndex {
            index,
            len: self.samples.len(),
        })
    }

    /// All samples, in insertion order.
    #[must_use]
    pub fn samples(&self) -> &[QaSample] {
        &self.samples
    }

    /// SHA-256 hash of the corpus content, for checkpoint provenance.
    #[must_use]
    pub fn data_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for s in &self.samples {
            hasher.update(s.query.as_bytes());
            hasher.update([0u8]);
            hasher.update(s.response.as_bytes());
            hasher.update([0u8]);
        }
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// Corpus statistics for CLI reporting.
#[derive(Debug, Clone)]
pub struct CorpusStats {
    /// Total number of samples
    pub total: usize,
    /// Average query length in chars
    pub avg_query_len: usize,
    /// Average response length in chars
    pub avg_response_len: usize,
}

/// Compute corpus statistics.
#[must_use]
pub fn corpus_stats(corpus: &QaCorpus) -> CorpusStats {
    if corpus.is_empty() {
        return CorpusStats {
            total: 0,
            avg_query_len: 0,
            avg_response_len: 0,
        };
    }

    let total_query: usize = corpus.samples().iter().map(|s| s.query.len()).sum();
    let total_response: usize = corpus.samples().iter().map(|s| s.response.len()).sum();

    CorpusStats {
        total: corpus.len(),
        avg_query_len: total_query / corpus.len(),
        avg_response_len: total_response / corpus.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_corpus() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"query": "What is Rust?", "response": "A systems language."}},
                {{"query": "What is packing?", "response": "Concatenating samples."}}]"#
        )
        .unwrap();

        let corpus = QaCorpus::load(f.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0).unwrap().query, "What is Rust?");
        assert_eq!(corpus.get(1).unwrap().response, "Concatenating samples.");
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"[{{"query": "no response field"}}]"#).unwrap();

        let result = QaCorpus::load(f.path());
        assert!(matches!(result, Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_non_array_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"query": "a", "response": "b"}}"#).unwrap();

        let result = QaCorpus::load(f.path());
        assert!(matches!(result, Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_empty_strings_permitted() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"[{{"query": "", "response": ""}}]"#).unwrap();

        let corpus = QaCorpus::load(f.path()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0).unwrap().query, "");
    }

    #[test]
    fn test_index_out_of_range() {
        let corpus = QaCorpus::from_samples(vec![QaSample {
            query: "a".to_string(),
            response: "b".to_string(),
        }]);

        assert!(corpus.get(0).is_ok());
        let err = corpus.get(1).unwrap_err();
        assert!(matches!(err, Error::SampleIndex { index: 1, len: 1 }));
    }

    #[test]
    fn test_format_sample() {
        let sample = QaSample {
            query: "What is LoRA?".to_string(),
            response: "A low-rank adapter.".to_string(),
        };
        assert_eq!(
            format_sample(&sample),
            "Question: What is LoRA?\n\nAnswer: A low-rank adapter."
        );
    }

    #[test]
    fn test_data_hash_deterministic() {
        let corpus = QaCorpus::from_samples(vec![QaSample {
            query: "a".to_string(),
            response: "b".to_string(),
        }]);
        let other = QaCorpus::from_samples(vec![QaSample {
            query: "a".to_string(),
            response: "c".to_string(),
        }]);

        assert_eq!(corpus.data_hash(), corpus.data_hash());
        assert_ne!(corpus.data_hash(), other.data_hash());
        assert!(corpus.data_hash().starts_with("sha256:"));
    }

    #[test]
    fn test_corpus_stats() {
        let corpus = QaCorpus::from_samples(vec![
            QaSample {
                query: "ab".to_string(),
                response: "cdef".to_string(),
            },
            QaSample {
                query: "gh".to_string(),
                response: "ij".to_string(),
            },
        ]);

        let stats = corpus_stats(&corpus);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.avg_query_len, 2);
        assert_eq!(stats.avg_response_len, 3);
    }

    #[test]
    fn test_corpus_stats_empty() {
        let stats = corpus_stats(&QaCorpus::from_samples(vec![]));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_query_len, 0);
    }
}
