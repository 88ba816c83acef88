//! Tokenizer boundary.
//!
//! The packing stream consumes tokenization as an opaque service:
//! `encode(text) -> ids` plus a fixed end-of-text id. Errors crossing this
//! boundary are treated as fatal configuration problems, never retried.

use std::path::Path;
use thiserror::Error;

/// Token ID type
pub type TokenId = u32;

/// Tokenizer errors
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// Tokenizer file missing or malformed
    #[error("failed to load tokenizer: {0}")]
    Load(String),

    /// Text could not be encoded
    #[error("failed to encode text: {0}")]
    Encode(String),

    /// A token name was not found in the vocabulary
    #[error("tokenizer has no token named {0:?}")]
    UnknownToken(String),
}

/// Result type for tokenizer operations
pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Text-to-token-id mapping consumed by the packing stream.
pub trait Tokenizer: Send + Sync {
    /// Encode text to token IDs.
    fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    /// The end-of-text id appended after each sample's tokenization to
    /// mark sample boundaries inside a packed block.
    fn eos_id(&self) -> TokenId;

    /// Vocabulary size.
    fn vocab_size(&self) -> usize;
}

/// Character-level tokenizer: each char encodes to its Unicode scalar value.
///
/// A baseline with no vocabulary file, used by tests and as the CLI
/// fallback when no `tokenizer.json` is given.
#[derive(Debug, Clone)]
pub struct CharTokenizer {
    eos_id: TokenId,
}

impl CharTokenizer {
    /// Create a char tokenizer with the given end-of-text id.
    #[must_use]
    pub fn new(eos_id: TokenId) -> Self {
        Self { eos_id }
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(text.chars().map(|c| c as TokenId).collect())
    }

    fn eos_id(&self) -> TokenId {
        self.eos_id
    }

    fn vocab_size(&self) -> usize {
        char::MAX as usize + 1
    }
}

/// HuggingFace tokenizer loaded from a `tokenizer.json` file.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    eos_id: TokenId,
}

impl HfTokenizer {
    /// Load a tokenizer from `tokenizer.json`, resolving the end-of-text
    /// token id by name (e.g. `"</s>"` for Llama-family vocabularies).
    ///
    /// # Errors
    /// Returns [`TokenizerError::Load`] if the file cannot be parsed and
    /// [`TokenizerError::UnknownToken`] if `eos_token` is not in the
    /// vocabulary.
    pub fn from_file(path: impl AsRef<Path>, eos_token: &str) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
        let eos_id = inner
            .token_to_id(eos_token)
            .ok_or_else(|| TokenizerError::UnknownToken(eos_token.to_string()))?;
        Ok(Self { inner, eos_id })
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn eos_id(&self) -> TokenId {
        self.eos_id
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_identity_mapping() {
        let tokenizer = CharTokenizer::new(0);
        let ids = tokenizer.encode("abc").unwrap();
        assert_eq!(ids, vec![97, 98, 99]);
    }

    #[test]
    fn test_char_empty_text() {
        let tokenizer = CharTokenizer::new(0);
        assert!(tokenizer.encode("").unwrap().is_empty());
    }

    #[test]
    fn test_char_eos_id() {
        let tokenizer = CharTokenizer::new(2);
        assert_eq!(tokenizer.eos_id(), 2);
    }

    #[test]
    fn test_char_multibyte() {
        let tokenizer = CharTokenizer::new(0);
        let ids = tokenizer.encode("é").unwrap();
        assert_eq!(ids, vec!['é' as u32]);
    }

    #[test]
    fn test_trait_object() {
        let tokenizer: Box<dyn Tokenizer> = Box::new(CharTokenizer::new(0));
        assert_eq!(tokenizer.encode("a").unwrap(), vec![97]);
    }

    fn write_word_level_tokenizer(dir: &std::path::Path) -> std::path::PathBuf {
        // Minimal HuggingFace tokenizer.json with a word-level vocabulary.
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": { "question": 0, "answer": 1, "hello": 2, "</s>": 3 },
                "unk_token": "</s>"
            }
        });
        let path = dir.join("tokenizer.json");
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_hf_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_word_level_tokenizer(dir.path());

        let tokenizer = HfTokenizer::from_file(&path, "</s>").unwrap();
        assert_eq!(tokenizer.eos_id(), 3);
        assert_eq!(tokenizer.encode("hello answer").unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_hf_unknown_eos_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_word_level_tokenizer(dir.path());

        let result = HfTokenizer::from_file(&path, "<|endoftext|>");
        assert!(matches!(result, Err(TokenizerError::UnknownToken(_))));
    }

    #[test]
    fn test_hf_missing_file() {
        let result = HfTokenizer::from_file("/nonexistent/tokenizer.json", "</s>");
        assert!(matches!(result, Err(TokenizerError::Load(_))));
    }
}
