//! Grani training core.
//!
//! Everything between an assembled architecture and a trained model lives
//! here:
//!
//! - **Cost**: [`CostModule`] — task-polymorphic objective (regression /
//!   classification / reinforcement) behind the [`Objective`] seam.
//! - **Optimizer**: [`Optimizer`] — sgd / momentum / adam with privately
//!   owned moment state and divergence detection.
//! - **Data**: [`BatchSource`] / [`InMemoryDataset`] — finite, restartable,
//!   order-preserving batch iteration.
//! - **Orchestration**: [`Trainer`] — the epoch/batch state machine with
//!   early stopping, convergence detection, divergence retry, cooperative
//!   cancellation, and periodic checkpoints.
//! - **Snapshots**: [`ModelSnapshot`] — versioned, round-trippable model
//!   records.
//! - **Configuration**: [`ExperimentConfig`] — the declarative YAML surface
//!   that drives automatic architecture assembly.
//!
//! # Example
//!
//! ```rust,no_run
//! use grani_backend::StatevectorBackend;
//! use grani_train::{ExperimentConfig, InMemoryDataset, ModelSnapshot, Trainer};
//!
//! let config = ExperimentConfig::from_yaml_path("experiment.yaml")?;
//! let architecture = config.build_architecture()?;
//! let initial = config.initial_parameters(&architecture);
//!
//! let backend = StatevectorBackend::new();
//! let mut data = InMemoryDataset::from_json_path("train.json", config.training.batch_size)?;
//!
//! let mut trainer = Trainer::new(
//!     &backend,
//!     architecture.clone(),
//!     config.task,
//!     config.training.clone(),
//! )?;
//! let report = trainer.fit(&mut data, None, initial)?;
//!
//! if let Some(snapshot) =
//!     ModelSnapshot::from_report(architecture, config.task, config.training, &report)
//! {
//!     snapshot.save("model.json")?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod optimizer;
pub mod orchestrator;
pub mod snapshot;
pub mod task;

pub use config::{ExperimentConfig, NetworkConfig, TrainingConfig};
pub use dataset::{Batch, BatchSource, InMemoryDataset};
pub use error::{
    NumericalDivergenceError, OptimizerError, SerializationError, TrainError, TrainResult,
};
pub use metrics::EpochMetrics;
pub use optimizer::{Optimizer, OptimizerConfig, OptimizerKind};
pub use orchestrator::{CancelToken, RunStatus, Trainer, TrainingReport, TrainingState};
pub use snapshot::{ModelSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use task::{CostModule, Objective, Task};
