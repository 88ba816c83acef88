//! Supervised fine-tuning driver loop.
//!
//! Pulls packed blocks one at a time and feeds them to an external model
//! through the [`SftModel`] boundary. The model owns all numeric work
//! (forward/backward, optimizer, schedule); this loop owns only the step
//! budget, the save cadence, and checkpoint retention.

use crate::callback::{AdapterCheckpointCallback, CallbackAction, CallbackContext, CallbackList,
    TrainerCallback};
use crate::checkpoint::{CheckpointManager, SaveAdapter};
use crate::packing::{PackedBlock, PackedStream};
use crate::tokenizer::Tokenizer;
use crate::{Error, Result};

/// External model boundary: one optimizer update per packed block, plus
/// the adapter-save capability used at checkpoints.
pub trait SftModel: SaveAdapter {
    /// Run one training step on a block and return its loss.
    ///
    /// # Errors
    /// Failures are fatal; the loop never retries a step.
    fn train_step(&mut self, block: &PackedBlock) -> Result<f32>;
}

/// Step budget and cadences for the driver loop.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Total optimizer updates to run
    pub max_steps: u64,
    /// Checkpoint every N steps
    pub save_steps: u64,
    /// Log loss every N steps
    pub log_steps: u64,
    /// Keep at most this many checkpoints on disk, pruning oldest-first.
    /// `None` retains everything.
    pub save_total_limit: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            save_steps: 10,
            log_steps: 10,
            save_total_limit: Some(3),
        }
    }
}

impl TrainerConfig {
    /// Validate cadences eagerly, before any training starts.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] for zero step counts.
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::DataFormat("max_steps must be greater than zero".to_string()));
        }
        if self.save_steps == 0 {
            return Err(Error::DataFormat("save_steps must be greater than zero".to_string()));
        }
        if self.log_steps == 0 {
            return Err(Error::DataFormat("log_steps must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Optimizer updates actually completed
    pub steps_completed: u64,
    /// Loss of the final step
    pub final_loss: f32,
    /// Mean loss across all steps
    pub mean_loss: f32,
}

/// Pull-based training loop generic over the model boundary.
///
/// Construction registers an [`AdapterCheckpointCallback`] against the
/// save event; additional callbacks can be layered on top.
pub struct SftTrainer<M: SftModel> {
    model: M,
    config: TrainerConfig,
    callbacks: CallbackList,
    checkpoints: CheckpointManager,
}

impl<M: SftModel> SftTrainer<M> {
    /// Create a trainer around a model and checkpoint manager.
    ///
    /// # Errors
    /// Returns [`Error::DataFormat`] if the config is invalid.
    pub fn new(model: M, config: TrainerConfig, checkpoints: CheckpointManager) -> Result<Self> {
        config.validate()?;
        let mut callbacks = CallbackList::new();
        callbacks.add(AdapterCheckpointCallback::new(checkpoints.clone()));
        Ok(Self {
            model,
            config,
            callbacks,
            checkpoints,
        })
    }

    /// Register an additional callback.
    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    /// Run the loop until the step budget is reached, a finite stream
    /// ends, or a callback requests a stop.
    ///
    /// Checkpoints fire on the save cadence; a save that falls on the
    /// same step as a stop request still completes before the loop exits.
    ///
    /// # Errors
    /// Propagates model, tokenizer, and checkpoint failures unmodified.
    pub fn train<T: Tokenizer + ?Sized>(
        &mut self,
        stream: &mut PackedStream<'_, T>,
    ) -> Result<TrainReport> {
        let mut ctx = CallbackContext {
            global_step: 0,
            max_steps: self.config.max_steps,
            loss: 0.0,
        };
        let mut total_loss = 0.0f64;

        while ctx.global_step < self.config.max_steps {
            let Some(block) = stream.next_block()? else {
                tracing::info!(step = ctx.global_step, "stream exhausted before step budget");
                break;
            };

            let loss = self.model.train_step(&block)?;
            ctx.global_step += 1;
            ctx.loss = loss;
            total_loss += f64::from(loss);

            if ctx.global_step % self.config.log_steps == 0 {
                tracing::info!(step = ctx.global_step, loss, "train step");
            }

            let stop = self.callbacks.on_step_end(&ctx) == CallbackAction::Stop;

            if ctx.global_step % self.config.save_steps == 0 {
                self.callbacks.on_save(&ctx, &self.model)?;
                self.prune_checkpoints()?;
            }

            if stop {
                tracing::info!(step = ctx.global_step, "stopped by callback");
                break;
            }
        }

        self.callbacks.on_train_end(&ctx);

        let mean_loss = if ctx.global_step > 0 {
            (total_loss / ctx.global_step as f64) as f32
        } else {
            0.0
        };
        Ok(TrainReport {
            steps_completed: ctx.global_step,
            final_loss: ctx.loss,
            mean_loss,
        })
    }

    /// Oldest-first retention: keep at most `save_total_limit`
    /// checkpoints under the output root.
    fn prune_checkpoints(&self) -> Result<()> {
        let Some(limit) = self.config.save_total_limit else {
            return Ok(());
        };
        let mut existing = self.checkpoints.list_checkpoints()?;
        while existing.len() > limit {
            let (step, path) = existing.remove(0);
            std::fs::remove_dir_all(&path)?;
            tracing::info!(step, path = %path.display(), "pruned old checkpoint");
        }
        Ok(())
    }

    /// The wrapped model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Consume the trainer, returning the model.
    #[must_use]
    pub fn into_model(self) -> M {
        self.model
    }
}
