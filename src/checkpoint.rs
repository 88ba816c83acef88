//! Adapter-only checkpoint persistence.
//!
//! Reacts to "checkpoint requested at step N" by persisting the adapter's
//! trainable parameters under a step-numbered directory and deleting the
//! conventional full-weight artifact if the underlying save routine also
//! emitted one. Retention (capping how many checkpoints remain on disk)
//! belongs to the training loop, not to this component.

use std::io;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Fixed prefix for step-numbered checkpoint directories.
pub const CHECKPOINT_PREFIX: &str = "checkpoint";

/// Conventional full-model weight artifact. A generic save routine may
/// write this next to the adapter files; it duplicates the frozen base
/// weights and is deleted as a space-saving measure.
pub const FULL_WEIGHT_FILE: &str = "pytorch_model.bin";

/// Capability that serializes only the adapter's trainable parameters
/// into a directory. This belongs to the adapter component; the
/// checkpoint manager never inspects the written files.
pub trait SaveAdapter {
    /// Write adapter parameters into `dir`.
    ///
    /// # Errors
    /// Any failure here makes the checkpoint incomplete and is fatal to
    /// the caller.
    fn save_adapter(&self, dir: &Path) -> io::Result<()>;
}

/// Adapts a plain closure into a [`SaveAdapter`].
pub struct SaveFn<F>(pub F);

impl<F> SaveAdapter for SaveFn<F>
where
    F: Fn(&Path) -> io::Result<()>,
{
    fn save_adapter(&self, dir: &Path) -> io::Result<()> {
        (self.0)(dir)
    }
}

/// Manages checkpoint directory naming and the adapter-only save flow.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    output_root: PathBuf,
    prefix: String,
}

impl CheckpointManager {
    /// Create a manager rooted at `output_root`, using the conventional
    /// [`CHECKPOINT_PREFIX`].
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            prefix: CHECKPOINT_PREFIX.to_string(),
        }
    }

    /// Override the directory prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Root directory under which checkpoints are created.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Deterministic directory for a given step: `<root>/<prefix>-<step>`.
    #[must_use]
    pub fn checkpoint_path(&self, step: u64) -> PathBuf {
        self.output_root.join(format!("{}-{step}", self.prefix))
    }

    /// Persist an adapter-only checkpoint for `step`.
    ///
    /// Invokes the save capability, then removes the stray full-weight
    /// artifact if present. Absence of the artifact is not an error; any
    /// other removal failure indicates a real checkpoint-integrity problem
    /// and is surfaced. This is a reactive hook: it returns control
    /// unchanged to the caller and never alters training.
    ///
    /// # Errors
    /// [`Error::CheckpointWrite`] if the adapter save fails (a
    /// silently-incomplete checkpoint is worse than a crashed run) or if
    /// the artifact exists but cannot be removed.
    pub fn on_save(&self, step: u64, adapter: &dyn SaveAdapter) -> Result<PathBuf> {
        let path = self.checkpoint_path(step);
        std::fs::create_dir_all(&path).map_err(|e| {
            Error::CheckpointWrite(format!("cannot create {}: {e}", path.display()))
        })?;

        adapter.save_adapter(&path).map_err(|e| {
            Error::CheckpointWrite(format!("adapter save to {} failed: {e}", path.display()))
        })?;

        let artifact = path.join(FULL_WEIGHT_FILE);
        match std::fs::remove_file(&artifact) {
            Ok(()) => {
                tracing::debug!(path = %artifact.display(), "removed full-weight artifact");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::CheckpointWrite(format!(
                    "cannot remove {}: {e}",
                    artifact.display()
                )));
            }
        }

        tracing::info!(step, path = %path.display(), "saved adapter checkpoint");
        Ok(path)
    }

    /// Enumerate existing checkpoints as `(step, path)` pairs, sorted by
    /// step. Directories that do not match `<prefix>-<number>` are
    /// ignored. A missing output root yields an empty list.
    pub fn list_checkpoints(&self) -> Result<Vec<(u64, PathBuf)>> {
        let mut found = Vec::new();
        let entries = match std::fs::read_dir(&self.output_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(found),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}-", self.prefix);
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(step) = name.strip_prefix(&prefix).and_then(|s| s.parse::<u64>().ok())
            else {
                continue;
            };
            found.push((step, entry.path()));
        }

        found.sort_by_key(|(step, _)| *step);
        Ok(found)
    }
}
