//! Training callbacks.
//!
//! Hooks the training loop fires as it pulls packed blocks: per-step
//! progress, save events on the checkpoint cadence, and end of training.
//! The save hook receives the adapter-save capability from the trainer
//! rather than owning it, so a callback never holds model state.

use crate::checkpoint::{CheckpointManager, SaveAdapter};
use crate::Result;

/// State passed to callbacks.
#[derive(Debug, Clone, Default)]
pub struct CallbackContext {
    /// Optimizer updates completed so far
    pub global_step: u64,
    /// Total step budget
    pub max_steps: u64,
    /// Loss reported by the most recent training step
    pub loss: f32,
}

/// Action a callback can request after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Continue training normally
    Continue,
    /// Stop training
    Stop,
}

/// Trait for training callbacks. All methods default to no-ops.
pub trait TrainerCallback: Send {
    /// Called after each training step.
    fn on_step_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called when the trainer requests a checkpoint. Failures are fatal
    /// and propagate: an incomplete checkpoint must never pass silently.
    fn on_save(&mut self, _ctx: &CallbackContext, _adapter: &dyn SaveAdapter) -> Result<()> {
        Ok(())
    }

    /// Called once after training ends.
    fn on_train_end(&mut self, _ctx: &CallbackContext) {}

    /// Callback name for logging.
    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}

/// Dispatches events to registered callbacks in registration order.
#[derive(Default)]
pub struct CallbackList {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback.
    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Fire the step-end event; the first `Stop` wins.
    pub fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_step_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire the save event.
    ///
    /// # Errors
    /// Propagates the first callback failure unmodified.
    pub fn on_save(&mut self, ctx: &CallbackContext, adapter: &dyn SaveAdapter) -> Result<()> {
        for cb in &mut self.callbacks {
            cb.on_save(ctx, adapter)?;
        }
        Ok(())
    }

    /// Fire the train-end event.
    pub fn on_train_end(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_train_end(ctx);
        }
    }
}

/// Persists adapter-only checkpoints on every save event.
pub struct AdapterCheckpointCallback {
    manager: CheckpointManager,
}

impl AdapterCheckpointCallback {
    /// Create a checkpoint callback around a [`CheckpointManager`].
    #[must_use]
    pub fn new(manager: CheckpointManager) -> Self {
        Self { manager }
    }

    /// The underlying manager.
    #[must_use]
    pub fn manager(&self) -> &CheckpointManager {
        &self.manager
    }
}

impl TrainerCallback for AdapterCheckpointCallback {
    fn on_save(&mut self, ctx: &CallbackContext, adapter: &dyn SaveAdapter) -> Result<()> {
        self.manager.on_save(ctx.global_step, adapter)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AdapterCheckpointCallback"
    }
}
