//! PEFT-compatible adapter serialization.
//!
//! Writes adapter-only checkpoints in the layout
//! `peft.PeftModel.from_pretrained()` expects: `adapter_config.json` plus
//! `adapter_model.safetensors`. The adapter math (parameter injection,
//! merge/unmerge) lives in the model component; this module only
//! serializes the named tensors it is handed, and reads them back for
//! inference-side reload.

use safetensors::tensor::{Dtype, TensorView};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::checkpoint::SaveAdapter;
use crate::{Error, Result};

/// Filename of the serialized adapter weights inside a checkpoint.
pub const ADAPTER_WEIGHTS_FILE: &str = "adapter_model.safetensors";

/// Filename of the adapter configuration inside a checkpoint.
pub const ADAPTER_CONFIG_FILE: &str = "adapter_config.json";

/// Adapter configuration matching the HuggingFace PEFT schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeftAdapterConfig {
    /// PEFT method type (always "LORA")
    pub peft_type: String,
    /// LoRA rank
    pub r: usize,
    /// LoRA alpha scaling parameter
    pub lora_alpha: f32,
    /// LoRA dropout rate
    pub lora_dropout: f32,
    /// Target module names for adaptation
    pub target_modules: Vec<String>,
    /// Bias handling: "none", "all", or "lora_only"
    pub bias: String,
    /// Base model name or path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_model_name_or_path: Option<String>,
    /// Task type (e.g. "CAUSAL_LM")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Inference mode flag
    #[serde(default)]
    pub inference_mode: bool,
}

impl PeftAdapterConfig {
    /// Create a causal-LM LoRA config.
    #[must_use]
    pub fn new(r: usize, lora_alpha: f32, target_modules: Vec<String>) -> Self {
        Self {
            peft_type: "LORA".to_string(),
            r,
            lora_alpha,
            lora_dropout: 0.0,
            target_modules,
            bias: "none".to_string(),
            base_model_name_or_path: None,
            task_type: Some("CAUSAL_LM".to_string()),
            inference_mode: false,
        }
    }

    /// Set the base model name recorded in the config.
    #[must_use]
    pub fn with_base_model(mut self, name: impl Into<String>) -> Self {
        self.base_model_name_or_path = Some(name.into());
        self
    }

    /// Set the dropout rate.
    #[must_use]
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.lora_dropout = dropout;
        self
    }
}

/// A named adapter tensor in row-major f32 layout.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterTensor {
    /// Fully-qualified tensor name, e.g.
    /// `base_model.model.model.layers.0.self_attn.q_proj.lora_A.weight`
    pub name: String,
    /// Row-major values
    pub data: Vec<f32>,
    /// Tensor shape
    pub shape: Vec<usize>,
}

/// Adapter tensors plus their PEFT config, serializable as a checkpoint.
///
/// Implements [`SaveAdapter`], so a bundle can stand in for the model at
/// the checkpoint boundary.
#[derive(Debug, Clone)]
pub struct PeftAdapterBundle {
    config: PeftAdapterConfig,
    tensors: Vec<AdapterTensor>,
}

impl PeftAdapterBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new(config: PeftAdapterConfig) -> Self {
        Self {
            config,
            tensors: Vec::new(),
        }
    }

    /// Add a named tensor.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] if `data` does not hold exactly
    /// `shape` elements.
    pub fn add_tensor(
        &mut self,
        name: impl Into<String>,
        data: Vec<f32>,
        shape: Vec<usize>,
    ) -> Result<()> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::DataFormat(format!(
                "tensor {name}: {} values do not fill shape {shape:?}",
                data.len()
            )));
        }
        self.tensors.push(AdapterTensor { name, data, shape });
        Ok(())
    }

    /// The bundle's configuration.
    #[must_use]
    pub fn config(&self) -> &PeftAdapterConfig {
        &self.config
    }

    /// The named tensors, in insertion order.
    #[must_use]
    pub fn tensors(&self) -> &[AdapterTensor] {
        &self.tensors
    }

    /// Write `adapter_config.json` and `adapter_model.safetensors` into
    /// `dir`.
    ///
    /// # Errors
    /// Returns [`Error::CheckpointWrite`] on serialization failure and
    /// [`Error::Io`] on filesystem failure.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let config_json = serde_json::to_string_pretty(&self.config)
            .map_err(|e| Error::CheckpointWrite(format!("adapter config: {e}")))?;
        std::fs::write(dir.join(ADAPTER_CONFIG_FILE), config_json)?;

        let views: Vec<(&str, TensorView<'_>)> = self
            .tensors
            .iter()
            .map(|t| {
                let view = TensorView::new(
                    Dtype::F32,
                    t.shape.clone(),
                    bytemuck::cast_slice(&t.data),
                )
                .map_err(|e| {
                    Error::CheckpointWrite(format!("tensor {}: {e}", t.name))
                })?;
                Ok((t.name.as_str(), view))
            })
            .collect::<Result<_>>()?;

        let mut metadata = HashMap::new();
        metadata.insert("format".to_string(), "pt".to_string());

        let bytes = safetensors::serialize(views, Some(metadata))
            .map_err(|e| Error::CheckpointWrite(format!("safetensors: {e}")))?;
        std::fs::write(dir.join(ADAPTER_WEIGHTS_FILE), bytes)?;

        Ok(())
    }

    /// Read a bundle back from a checkpoint directory.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] if either file is missing or
    /// malformed, or if a tensor is not f32.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let config_json = std::fs::read_to_string(dir.join(ADAPTER_CONFIG_FILE))?;
        let config: PeftAdapterConfig = serde_json::from_str(&config_json)
            .map_err(|e| Error::DataFormat(format!("{ADAPTER_CONFIG_FILE}: {e}")))?;

        let raw = std::fs::read(dir.join(ADAPTER_WEIGHTS_FILE))?;
        let loaded = safetensors::SafeTensors::deserialize(&raw)
            .map_err(|e| Error::DataFormat(format!("{ADAPTER_WEIGHTS_FILE}: {e}")))?;

        let mut tensors = Vec::new();
        for (name, view) in loaded.tensors() {
            if view.dtype() != Dtype::F32 {
                return Err(Error::DataFormat(format!(
                    "tensor {name}: expected f32, got {:?}",
                    view.dtype()
                )));
            }
            tensors.push(AdapterTensor {
                name,
                // The safetensors buffer carries no alignment guarantee, so
                // copy rather than reinterpret in place.
                data: bytemuck::pod_collect_to_vec(view.data()),
                shape: view.shape().to_vec(),
            });
        }
        tensors.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { config, tensors })
    }
}

impl SaveAdapter for PeftAdapterBundle {
    fn save_adapter(&self, dir: &Path) -> io::Result<()> {
        self.save(dir).map_err(io::Error::other)
    }
}
