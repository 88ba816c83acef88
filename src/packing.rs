//! Constant-length packing stream.
//!
//! Concatenates formatted-and-tokenized samples into a continuous token
//! stream sliced into fixed-length blocks, so no padding is wasted and
//! block boundaries need not align with sample boundaries. One end-of-text
//! id separates consecutive samples inside the stream.
//!
//! The stream is pull-based and single-threaded: the training loop asks
//! for one block at a time, forever in infinite mode (the caller owns the
//! step budget) or until one full pass over the corpus in finite mode.

use std::collections::VecDeque;

use crate::corpus::{format_sample, QaCorpus};
use crate::tokenizer::{TokenId, Tokenizer};
use crate::{Error, Result};

/// Packing stream configuration.
///
/// Validated eagerly at stream construction, never lazily at first use.
#[derive(Debug, Clone)]
pub struct PackingConfig {
    /// Block length in tokens. Must be > 0.
    pub seq_length: usize,
    /// If true, re-iterate the corpus forever by wrapping to index 0 after
    /// the last sample. If false, stop after one full pass; a partial
    /// remainder shorter than `seq_length` is discarded, never emitted.
    pub infinite: bool,
    /// End-of-text id appended after each sample's tokenization.
    pub eos_token_id: TokenId,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            seq_length: 1024,
            infinite: true,
            eos_token_id: 2,
        }
    }
}

/// A fixed-length block of token ids ready for a causal LM training step.
///
/// `labels` always equals `input_ids` (self-supervised objective) and
/// `attention_mask` is all ones; all three have length `seq_length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBlock {
    /// Token ids, length `seq_length`
    pub input_ids: Vec<TokenId>,
    /// Labels, identical to `input_ids`
    pub labels: Vec<TokenId>,
    /// All-ones mask, length `seq_length`
    pub attention_mask: Vec<u32>,
}

/// Restartable stream of [`PackedBlock`]s over a [`QaCorpus`].
///
/// Internal state is exactly a token buffer and a cursor into the corpus;
/// [`PackedStream::restart`] resets both.
pub struct PackedStream<'a, T: Tokenizer + ?Sized> {
    corpus: &'a QaCorpus,
    tokenizer: &'a T,
    config: PackingConfig,
    /// Tokens accumulated across samples, drained from the front as blocks
    /// are emitted.
    buffer: VecDeque<TokenId>,
    /// Next sample to consume; advances modulo corpus length when infinite.
    cursor: usize,
    /// Finite mode only: set once the single pass is complete.
    exhausted: bool,
}

impl<'a, T: Tokenizer + ?Sized> PackedStream<'a, T> {
    /// Create a packing stream.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] if `seq_length` is zero or the corpus
    /// is empty (an infinite stream over zero samples could never produce
    /// a block).
    pub fn new(corpus: &'a QaCorpus, tokenizer: &'a T, config: PackingConfig) -> Result<Self> {
        if config.seq_length == 0 {
            return Err(Error::DataFormat(
                "seq_length must be greater than zero".to_string(),
            ));
        }
        if corpus.is_empty() {
            return Err(Error::DataFormat(
                "cannot pack an empty corpus".to_string(),
            ));
        }
        Ok(Self {
            corpus,
            tokenizer,
            config,
            buffer: VecDeque::new(),
            cursor: 0,
            exhausted: false,
        })
    }

    /// Produce the next block, or `None` when a finite stream has
    /// completed its single pass.
    ///
    /// Refills the buffer sample-by-sample until it holds at least
    /// `seq_length` tokens, then slices the front off as the block. A
    /// sample longer than `seq_length` is split across blocks, never
    /// truncated or dropped.
    ///
    /// # Errors
    /// Propagates tokenizer failures as [`Error::Tokenization`]; these are
    /// fatal configuration problems, not transient faults.
    pub fn next_block(&mut self) -> Result<Option<PackedBlock>> {
        let seq_length = self.config.seq_length;

        while self.buffer.len() < seq_length {
            if self.exhausted {
                // Single pass complete; the remainder in the buffer is
                // shorter than seq_length and is discarded so every
                // emitted block has uniform length.
                return Ok(None);
            }
            let sample = self.corpus.get(self.cursor)?;
            let ids = self.tokenizer.encode(&format_sample(sample))?;
            self.buffer.extend(ids);
            self.buffer.push_back(self.config.eos_token_id);

            self.cursor += 1;
            if self.cursor == self.corpus.len() {
                if self.config.infinite {
                    self.cursor = 0;
                } else {
                    self.exhausted = true;
                }
            }
        }

        let input_ids: Vec<TokenId> = self.buffer.drain(..seq_length).collect();
        Ok(Some(PackedBlock {
            labels: input_ids.clone(),
            attention_mask: vec![1; seq_length],
            input_ids,
        }))
    }

    /// Reset buffer and cursor to their initial state. The stream holds no
    /// other cross-epoch state.
    pub fn restart(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.exhausted = false;
    }

    /// Tokens currently buffered but not yet emitted. After a finite
    /// stream ends, this is the discarded remainder.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The stream configuration.
    #[must_use]
    pub fn config(&self) -> &PackingConfig {
        &self.config
    }
}

impl<T: Tokenizer + ?Sized> Iterator for PackedStream<'_, T> {
    type Item = Result<PackedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::QaSample;
    use crate::tokenizer::CharTokenizer;

    fn corpus_of(pairs: &[(&str, &str)]) -> QaCorpus {
        QaCorpus::from_samples(
            pairs
                .iter()
                .map(|(q, r)| QaSample {
                    query: (*q).to_string(),
                    response: (*r).to_string(),
                })
                .collect(),
        )
    }

    /// The exact token stream one full pass produces: each sample's
    /// formatted text char-coded, followed by the eos id.
    fn one_pass_tokens(corpus: &QaCorpus, eos: TokenId) -> Vec<TokenId> {
        let mut out = Vec::new();
        for sample in corpus.samples() {
            out.extend(format_sample(sample).chars().map(|c| c as TokenId));
            out.push(eos);
        }
        out
    }

    #[test]
    fn test_zero_seq_length_rejected() {
        let corpus = corpus_of(&[("a", "b")]);
        let tokenizer = CharTokenizer::new(0);
        let config = PackingConfig {
            seq_length: 0,
            infinite: true,
            eos_token_id: 0,
        };
        assert!(matches!(
            PackedStream::new(&corpus, &tokenizer, config),
            Err(Error::DataFormat(_))
        ));
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let corpus = corpus_of(&[]);
        let tokenizer = CharTokenizer::new(0);
        assert!(matches!(
            PackedStream::new(&corpus, &tokenizer, PackingConfig::default()),
            Err(Error::DataFormat(_))
        ));
    }

    #[test]
    fn test_block_shape_uniform() {
        let corpus = corpus_of(&[("what", "that"), ("why", "because")]);
        let tokenizer = CharTokenizer::new(0);
        let config = PackingConfig {
            seq_length: 8,
            infinite: true,
            eos_token_id: 0,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        for _ in 0..50 {
            let block = stream.next_block().unwrap().unwrap();
            assert_eq!(block.input_ids.len(), 8);
            assert_eq!(block.labels.len(), 8);
            assert_eq!(block.attention_mask.len(), 8);
            assert_eq!(block.labels, block.input_ids);
            assert!(block.attention_mask.iter().all(|&m| m == 1));
        }
    }

    #[test]
    fn test_concatenation_reconstructs_stream() {
        let corpus = corpus_of(&[("aa", "bb"), ("cc", "dd"), ("ee", "ff")]);
        let tokenizer = CharTokenizer::new(7);
        let config = PackingConfig {
            seq_length: 5,
            infinite: true,
            eos_token_id: 7,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        let expected = one_pass_tokens(&corpus, 7);
        // Stop before the cursor wraps: emit only the full blocks one pass
        // covers.
        let full_blocks = expected.len() / 5;
        let mut emitted = Vec::new();
        for _ in 0..full_blocks {
            emitted.extend(stream.next_block().unwrap().unwrap().input_ids);
        }

        assert_eq!(emitted, expected[..full_blocks * 5]);
    }

    #[test]
    fn test_finite_mode_discards_remainder() {
        let corpus = corpus_of(&[("q", "r"), ("s", "t")]);
        let tokenizer = CharTokenizer::new(0);
        let config = PackingConfig {
            seq_length: 6,
            infinite: false,
            eos_token_id: 0,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        let total = one_pass_tokens(&corpus, 0).len();
        let mut emitted = 0usize;
        while let Some(block) = stream.next_block().unwrap() {
            assert_eq!(block.input_ids.len(), 6);
            emitted += block.input_ids.len();
        }

        assert_eq!(emitted, (total / 6) * 6);
        assert_eq!(stream.buffered(), total % 6);
        // Exhausted streams stay exhausted.
        assert!(stream.next_block().unwrap().is_none());
    }

    #[test]
    fn test_long_sample_spans_blocks() {
        // One sample far longer than seq_length: blocks come purely from
        // its content, nothing truncated.
        let long = "x".repeat(100);
        let corpus = corpus_of(&[(long.as_str(), long.as_str())]);
        let tokenizer = CharTokenizer::new(1);
        let config = PackingConfig {
            seq_length: 16,
            infinite: false,
            eos_token_id: 1,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        let expected = one_pass_tokens(&corpus, 1);
        let mut emitted = Vec::new();
        while let Some(block) = stream.next_block().unwrap() {
            emitted.extend(block.input_ids);
        }

        let full = (expected.len() / 16) * 16;
        assert_eq!(emitted, expected[..full]);
    }

    #[test]
    fn test_empty_query_and_response() {
        let corpus = corpus_of(&[("", "")]);
        let tokenizer = CharTokenizer::new(9);
        let config = PackingConfig {
            seq_length: 4,
            infinite: true,
            eos_token_id: 9,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        // "Question: \n\nAnswer: " still tokenizes to a non-empty run.
        let block = stream.next_block().unwrap().unwrap();
        assert_eq!(block.input_ids.len(), 4);
    }

    #[test]
    fn test_restart_resets_state() {
        let corpus = corpus_of(&[("abc", "def")]);
        let tokenizer = CharTokenizer::new(0);
        let config = PackingConfig {
            seq_length: 4,
            infinite: true,
            eos_token_id: 0,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        let first = stream.next_block().unwrap().unwrap();
        stream.next_block().unwrap().unwrap();
        stream.restart();
        assert_eq!(stream.buffered(), 0);

        let after_restart = stream.next_block().unwrap().unwrap();
        assert_eq!(first, after_restart);
    }

    #[test]
    fn test_single_sample_period() {
        // One sample, seq_length 4, eos 0: the stream is T+[0] repeated
        // and re-sliced into chunks of 4, so the block pattern repeats
        // with period lcm(k+1, 4) tokens.
        let corpus = corpus_of(&[("a", "b")]);
        let tokenizer = CharTokenizer::new(0);
        let config = PackingConfig {
            seq_length: 4,
            infinite: true,
            eos_token_id: 0,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        let k = format_sample(corpus.get(0).unwrap()).chars().count();
        let unit = k + 1;
        let period_tokens = lcm(unit, 4);
        let period_blocks = period_tokens / 4;

        let blocks: Vec<PackedBlock> = (0..period_blocks * 2)
            .map(|_| stream.next_block().unwrap().unwrap())
            .collect();

        for i in 0..period_blocks {
            assert_eq!(blocks[i], blocks[i + period_blocks]);
        }
    }

    fn lcm(a: usize, b: usize) -> usize {
        fn gcd(a: usize, b: usize) -> usize {
            if b == 0 {
                a
            } else {
                gcd(b, a % b)
            }
        }
        a / gcd(a, b) * b
    }

    #[test]
    fn test_iterator_adapter() {
        let corpus = corpus_of(&[("q", "r")]);
        let tokenizer = CharTokenizer::new(0);
        let config = PackingConfig {
            seq_length: 8,
            infinite: false,
            eos_token_id: 0,
        };
        let stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        let blocks: Vec<PackedBlock> = stream.map(|b| b.unwrap()).collect();
        let total = one_pass_tokens(&corpus, 0).len();
        assert_eq!(blocks.len(), total / 8);
    }

    #[test]
    fn test_tokenizer_error_propagates() {
        struct FailingTokenizer;
        impl Tokenizer for FailingTokenizer {
            fn encode(&self, _text: &str) -> crate::tokenizer::Result<Vec<TokenId>> {
                Err(crate::tokenizer::TokenizerError::Encode(
                    "malformed text".to_string(),
                ))
            }
            fn eos_id(&self) -> TokenId {
                0
            }
            fn vocab_size(&self) -> usize {
                0
            }
        }

        let corpus = corpus_of(&[("a", "b")]);
        let tokenizer = FailingTokenizer;
        let config = PackingConfig {
            seq_length: 4,
            infinite: true,
            eos_token_id: 0,
        };
        let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();

        assert!(matches!(
            stream.next_block(),
            Err(Error::Tokenization(_))
        ));
    }
}
