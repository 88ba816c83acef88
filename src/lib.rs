//! # Afinar
//!
//! Constant-length packing pipeline and adapter checkpoint lifecycle for
//! supervised fine-tuning of causal language models.
//!
//! The crate owns the data path and the checkpoint path around an external
//! training loop:
//!
//! - [`corpus`] loads a JSON array of `{query, response}` records and
//!   exposes them by index.
//! - [`packing`] turns the corpus plus a [`tokenizer::Tokenizer`] into a
//!   restartable stream of fixed-length token blocks, with no padding and
//!   no alignment between block and sample boundaries.
//! - [`checkpoint`] persists adapter-only checkpoints under step-numbered
//!   directories and cleans up stray full-weight artifacts.
//! - [`trainer`] drives the loop one block at a time through the
//!   [`trainer::SftModel`] boundary, firing [`callback`] events on the
//!   save cadence and pruning old checkpoints.
//! - [`adapter`] serializes adapter tensors in the PEFT checkpoint layout
//!   (`adapter_config.json` + `adapter_model.safetensors`).
//!
//! Model math, quantization, the optimizer, and the learning-rate schedule
//! are external: they enter only through the `Tokenizer`, `SftModel`, and
//! `SaveAdapter` traits.
//!
//! # Example
//!
//! ```
//! use afinar::corpus::{QaCorpus, QaSample};
//! use afinar::packing::{PackedStream, PackingConfig};
//! use afinar::tokenizer::CharTokenizer;
//!
//! let corpus = QaCorpus::from_samples(vec![QaSample {
//!     query: "What is packing?".to_string(),
//!     response: "Slicing a token stream into fixed blocks.".to_string(),
//! }]);
//! let tokenizer = CharTokenizer::new(0);
//! let config = PackingConfig { seq_length: 32, infinite: true, eos_token_id: 0 };
//!
//! let mut stream = PackedStream::new(&corpus, &tokenizer, config).unwrap();
//! let block = stream.next_block().unwrap().unwrap();
//! assert_eq!(block.input_ids.len(), 32);
//! assert_eq!(block.labels, block.input_ids);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod callback;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod packing;
pub mod tokenizer;
pub mod trainer;

pub use adapter::{PeftAdapterBundle, PeftAdapterConfig};
pub use callback::{CallbackAction, CallbackContext, CallbackList, TrainerCallback};
pub use checkpoint::{CheckpointManager, SaveAdapter, SaveFn, CHECKPOINT_PREFIX, FULL_WEIGHT_FILE};
pub use config::RunConfig;
pub use corpus::{format_sample, QaCorpus, QaSample};
pub use error::{Error, Result};
pub use packing::{PackedBlock, PackedStream, PackingConfig};
pub use tokenizer::{CharTokenizer, HfTokenizer, TokenId, Tokenizer};
pub use trainer::{SftModel, SftTrainer, TrainReport, TrainerConfig};
