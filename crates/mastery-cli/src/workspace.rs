//! Loading and saving the engine state behind every stateful command.

use std::path::Path;

use anyhow::{Context, Result};

use mastery_core::catalog::Catalog;
use mastery_core::config::{load_config_from, MasteryConfig};
use mastery_core::engine::ProgressEngine;
use mastery_core::snapshot::StateSnapshot;

/// An engine restored from the configured catalog and state directory.
pub struct Workspace {
    pub config: MasteryConfig,
    pub engine: ProgressEngine,
}

impl Workspace {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let catalog = Catalog::load(&config.catalog_path).with_context(|| {
            format!(
                "failed to load curriculum (run `mastery init` to create one): {}",
                config.catalog_path.display()
            )
        })?;
        let snapshot = StateSnapshot::load_or_default(&config.snapshot_path())?;
        tracing::debug!(
            "restoring {} questions and {} students from {}",
            snapshot.questions.len(),
            snapshot.students.len(),
            config.state_dir.display()
        );
        let engine = ProgressEngine::restore(catalog, config.engine_config(), snapshot);
        Ok(Self { config, engine })
    }

    /// Persist the engine state to the snapshot file.
    pub fn save(&self) -> Result<()> {
        let path = self.config.snapshot_path();
        self.engine
            .snapshot()
            .save_json(&path)
            .with_context(|| format!("failed to save state to {}", path.display()))
    }
}
