//! Run configuration.
//!
//! One explicit structure with named, typed fields and documented
//! defaults, enumerated once at startup. Validation happens eagerly at
//! construction, never lazily at first use.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::adapter::PeftAdapterConfig;
use crate::packing::PackingConfig;
use crate::tokenizer::TokenId;
use crate::trainer::TrainerConfig;
use crate::{Error, Result};

/// Configuration for a fine-tuning run.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base model identifier, recorded in adapter checkpoint provenance
    #[arg(long, default_value = "NousResearch/Llama-2-7b-chat-hf")]
    pub model_name: String,

    /// Path to the JSON corpus of {query, response} records
    #[arg(long, default_value = "data.json")]
    pub data: PathBuf,

    /// Packed block length in tokens
    #[arg(long, default_value_t = 1024)]
    pub seq_length: usize,

    /// Stop after one pass over the corpus instead of cycling forever
    #[arg(long, default_value_t = false)]
    pub single_pass: bool,

    /// HuggingFace tokenizer.json; the char baseline is used when omitted
    #[arg(long)]
    pub tokenizer: Option<PathBuf>,

    /// End-of-text token name in the tokenizer vocabulary
    #[arg(long, default_value = "</s>")]
    pub eos_token: String,

    /// Total optimizer updates
    #[arg(long, default_value_t = 10_000)]
    pub max_steps: u64,

    /// Checkpoint cadence in steps
    #[arg(long, default_value_t = 10)]
    pub save_steps: u64,

    /// Loss-logging cadence in steps
    #[arg(long, default_value_t = 10)]
    pub log_steps: u64,

    /// Maximum checkpoints retained on disk, oldest pruned first
    #[arg(long, default_value_t = 3)]
    pub save_total_limit: usize,

    /// Directory for checkpoints
    #[arg(long, default_value = "./results")]
    pub output_dir: PathBuf,

    /// LoRA rank
    #[arg(long, default_value_t = 8)]
    pub lora_r: usize,

    /// LoRA alpha
    #[arg(long, default_value_t = 16.0)]
    pub lora_alpha: f32,

    /// LoRA dropout
    #[arg(long, default_value_t = 0.05)]
    pub lora_dropout: f32,

    /// Attention projections to adapt
    #[arg(long, default_value = "q_proj,v_proj", value_delimiter = ',')]
    pub target_modules: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_name: "NousResearch/Llama-2-7b-chat-hf".to_string(),
            data: PathBuf::from("data.json"),
            seq_length: 1024,
            single_pass: false,
            tokenizer: None,
            eos_token: "</s>".to_string(),
            max_steps: 10_000,
            save_steps: 10,
            log_steps: 10,
            save_total_limit: 3,
            output_dir: PathBuf::from("./results"),
            lora_r: 8,
            lora_alpha: 16.0,
            lora_dropout: 0.05,
            target_modules: vec!["q_proj".to_string(), "v_proj".to_string()],
        }
    }
}

impl RunConfig {
    /// Validate every field once, before any component is constructed.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.seq_length == 0 {
            return Err(Error::DataFormat("seq_length must be greater than zero".to_string()));
        }
        if self.max_steps == 0 {
            return Err(Error::DataFormat("max_steps must be greater than zero".to_string()));
        }
        if self.save_steps == 0 {
            return Err(Error::DataFormat("save_steps must be greater than zero".to_string()));
        }
        if self.log_steps == 0 {
            return Err(Error::DataFormat("log_steps must be greater than zero".to_string()));
        }
        if self.lora_r == 0 {
            return Err(Error::DataFormat("lora_r must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.lora_dropout) {
            return Err(Error::DataFormat(format!(
                "lora_dropout must be in [0, 1], got {}",
                self.lora_dropout
            )));
        }
        if self.target_modules.is_empty() {
            return Err(Error::DataFormat("target_modules must not be empty".to_string()));
        }
        Ok(())
    }

    /// Packing-stream configuration for this run.
    #[must_use]
    pub fn packing_config(&self, eos_token_id: TokenId) -> PackingConfig {
        PackingConfig {
            seq_length: self.seq_length,
            infinite: !self.single_pass,
            eos_token_id,
        }
    }

    /// Trainer-loop configuration for this run.
    #[must_use]
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            max_steps: self.max_steps,
            save_steps: self.save_steps,
            log_steps: self.log_steps,
            save_total_limit: Some(self.save_total_limit),
        }
    }

    /// PEFT adapter configuration for this run.
    #[must_use]
    pub fn peft_config(&self) -> PeftAdapterConfig {
        PeftAdapterConfig::new(self.lora_r, self.lora_alpha, self.target_modules.clone())
            .with_dropout(self.lora_dropout)
            .with_base_model(self.model_name.clone())
    }
}
