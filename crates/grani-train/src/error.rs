//! Error types for training.

use thiserror::Error;

use grani_backend::BackendError;
use grani_ir::{ArchitectureError, ConfigurationError};

/// Non-finite values surfaced during optimization.
///
/// Recoverable by the orchestrator (checkpoint rollback + reduced learning
/// rate, once); otherwise terminal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NumericalDivergenceError {
    /// A gradient coordinate is NaN or infinite.
    #[error("non-finite gradient at parameter index {0}")]
    Gradient(usize),

    /// An updated parameter is NaN or infinite.
    #[error("non-finite parameter at index {0} after update")]
    Parameter(usize),

    /// The batch loss is NaN or infinite.
    #[error("non-finite loss")]
    Loss,
}

/// Errors raised by [`Optimizer::step`](crate::optimizer::Optimizer::step).
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Divergence detected; optimizer moment state is unchanged.
    #[error(transparent)]
    Divergence(#[from] NumericalDivergenceError),

    /// Gradient and parameter vectors disagree in length.
    #[error("gradient has length {got}, parameters have length {expected}")]
    LengthMismatch {
        /// Parameter vector length.
        expected: usize,
        /// Gradient length supplied.
        got: usize,
    },
}

/// Snapshot save/load failures.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The file carries a schema version this build cannot read.
    #[error("snapshot schema version mismatch: file has {found}, supported {supported}")]
    SchemaVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads and writes.
        supported: u32,
    },

    /// The file has no schema version field at all.
    #[error("snapshot has no schema_version field")]
    MissingVersion,

    /// Filesystem failure.
    #[error("snapshot I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON payload.
    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while preparing or running a training session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainError {
    /// Invalid hyperparameters; never retried.
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    /// Layer composition failure; never retried.
    #[error(transparent)]
    Architecture(#[from] ArchitectureError),

    /// The execution substrate rejected a request.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Optimizer misuse that is not a divergence.
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    /// A batch pairs unequal feature/target counts.
    #[error("batch has {features} feature rows but {targets} targets")]
    BatchMismatch {
        /// Number of feature rows.
        features: usize,
        /// Number of target rows.
        targets: usize,
    },

    /// Batches must carry at least one example.
    #[error("batch is empty")]
    EmptyBatch,

    /// A target vector has the wrong shape for the task.
    #[error("example {example}: target has {got} entries, task expects {expected}")]
    TargetShape {
        /// Index of the offending example within its batch.
        example: usize,
        /// Entries the task expects.
        expected: usize,
        /// Entries supplied.
        got: usize,
    },

    /// A class-index target is outside the configured class count.
    #[error("example {example}: class index {index} out of range for {num_classes} classes")]
    ClassIndexOutOfRange {
        /// Index of the offending example within its batch.
        example: usize,
        /// The out-of-range class index.
        index: usize,
        /// Configured class count.
        num_classes: usize,
    },

    /// Snapshot failure during checkpointing.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Dataset file could not be read.
    #[error("dataset I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset file is not valid JSON of the expected shape.
    #[error("dataset format: {0}")]
    Format(#[from] serde_json::Error),

    /// Configuration file is not valid YAML of the expected shape.
    #[error("config format: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type for training operations.
pub type TrainResult<T> = Result<T, TrainError>;
