//! Model snapshots.
//!
//! A snapshot is the immutable record of a trained (or training) model:
//! architecture, parameter values, task, and hyperparameters, versioned for
//! forward-compatible loading. Snapshots are written whole and never edited
//! in place; a new checkpoint is a new file.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use grani_ir::{Architecture, ArchitectureManifest};

use crate::config::TrainingConfig;
use crate::error::SerializationError;
use crate::orchestrator::TrainingReport;
use crate::task::Task;

/// Schema version this build reads and writes.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serializable record of architecture + parameters + training metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// File schema version; checked before the payload is decoded.
    pub schema_version: u32,
    /// The assembled architecture (manifest derivable via
    /// [`ModelSnapshot::manifest`]).
    pub architecture: Architecture,
    /// Trained Parameter Vector.
    pub parameters: Vec<f64>,
    /// Task the model was trained for.
    pub task: Task,
    /// Training hyperparameters in effect.
    pub hyperparameters: TrainingConfig,
    /// Creation time (UTC).
    pub created_at: DateTime<Utc>,
    /// Run that produced this snapshot, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    /// Best monitored loss at snapshot time, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_loss: Option<f64>,
}

impl ModelSnapshot {
    /// Create a snapshot of the given model state.
    pub fn new(
        architecture: Architecture,
        parameters: Vec<f64>,
        task: Task,
        hyperparameters: TrainingConfig,
    ) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            architecture,
            parameters,
            task,
            hyperparameters,
            created_at: Utc::now(),
            run_id: None,
            best_loss: None,
        }
    }

    /// Attach run provenance.
    #[must_use]
    pub fn with_run(mut self, run_id: Uuid, best_loss: f64) -> Self {
        self.run_id = Some(run_id);
        self.best_loss = best_loss.is_finite().then_some(best_loss);
        self
    }

    /// Snapshot the best parameters of a finished run.
    ///
    /// Returns `None` for runs that did not end in a usable state
    /// (`Diverged`, `Cancelled`); a prior on-disk checkpoint, if any, remains
    /// the only artifact of such runs.
    pub fn from_report(
        architecture: Architecture,
        task: Task,
        hyperparameters: TrainingConfig,
        report: &TrainingReport,
    ) -> Option<Self> {
        if !report.is_usable() {
            return None;
        }
        Some(
            Self::new(
                architecture,
                report.state.best_parameters.clone(),
                task,
                hyperparameters,
            )
            .with_run(report.run_id, report.state.best_loss),
        )
    }

    /// The Architecture Manifest of the stored model.
    pub fn manifest(&self) -> ArchitectureManifest {
        self.architecture.manifest()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, checking the schema version first.
    pub fn from_json(raw: &str) -> Result<Self, SerializationError> {
        let value: Value = serde_json::from_str(raw)?;
        let found = value
            .get("schema_version")
            .and_then(Value::as_u64)
            .ok_or(SerializationError::MissingVersion)?;
        if found != u64::from(SNAPSHOT_SCHEMA_VERSION) {
            return Err(SerializationError::SchemaVersion {
                found: found.try_into().unwrap_or(u32::MAX),
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Write the snapshot to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SerializationError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a snapshot from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SerializationError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
