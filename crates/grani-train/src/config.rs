//! Declarative experiment configuration.
//!
//! One YAML file describes a whole experiment: the task, the network
//! topology, and the training hyperparameters. Everything is validated up
//! front — a bad option is a [`ConfigurationError`] before any training step
//! runs — and the network section drives the automatic architecture
//! assembly.
//!
//! ```yaml
//! task:
//!   task_type: regression
//! network:
//!   num_wires: 4
//!   depth: 2
//!   feature_dim: 4
//!   encoding_scheme: angle
//!   entangling_pattern: linear
//!   seed: 42
//! training:
//!   optimizer:
//!     kind: adam
//!     learning_rate: 0.01
//!   max_epochs: 100
//!   max_patience: 10
//! ```

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use grani_ir::{
    Architecture, ConfigurationError, EncodingLayer, EncodingScheme, EntanglingPattern,
    InitPolicy, MeasurementLayer, VariationalLayer,
};

use crate::error::TrainResult;
use crate::optimizer::OptimizerConfig;
use crate::task::Task;

fn default_encoding() -> EncodingScheme {
    EncodingScheme::Angle
}

fn default_entangling() -> EntanglingPattern {
    EntanglingPattern::Linear
}

fn default_rotation_axes() -> u8 {
    3
}

fn default_max_patience() -> usize {
    10
}

fn default_batch_size() -> usize {
    8
}

fn default_window() -> usize {
    5
}

fn default_tolerance() -> f64 {
    1e-6
}

/// Network topology: what to assemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Total wire count.
    pub num_wires: u32,
    /// Number of variational blocks.
    pub depth: usize,
    /// Input feature dimension.
    pub feature_dim: usize,
    /// Data-encoding scheme.
    #[serde(default = "default_encoding")]
    pub encoding_scheme: EncodingScheme,
    /// Entangling topology per block.
    #[serde(default = "default_entangling")]
    pub entangling_pattern: EntanglingPattern,
    /// Rotation axes per wire per block (1–3).
    #[serde(default = "default_rotation_axes")]
    pub rotation_axes: u8,
    /// Parameter initialization policy.
    #[serde(default)]
    pub init: InitPolicy,
    /// RNG seed for reproducible initialization; fresh entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Training hyperparameters: how to optimize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Optimizer selection and hyperparameters.
    pub optimizer: OptimizerConfig,
    /// Hard epoch ceiling.
    pub max_epochs: usize,
    /// Epochs without improvement before early stopping.
    #[serde(default = "default_max_patience")]
    pub max_patience: usize,
    /// Examples per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Minimum loss decrease that counts as improvement.
    #[serde(default)]
    pub min_delta: f64,
    /// Epoch window for the convergence test.
    #[serde(default = "default_window")]
    pub convergence_window: usize,
    /// Loss improvement across the window below which training converges.
    #[serde(default = "default_tolerance")]
    pub convergence_tolerance: f64,
    /// Checkpoint cadence in epochs; no periodic checkpoints when absent.
    #[serde(default)]
    pub snapshot_every: Option<usize>,
}

impl TrainingConfig {
    /// Config with defaults for everything but the optimizer and epoch
    /// ceiling.
    pub fn new(optimizer: OptimizerConfig, max_epochs: usize) -> Self {
        Self {
            optimizer,
            max_epochs,
            max_patience: default_max_patience(),
            batch_size: default_batch_size(),
            min_delta: 0.0,
            convergence_window: default_window(),
            convergence_tolerance: default_tolerance(),
            snapshot_every: None,
        }
    }

    /// Fail fast on out-of-range hyperparameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.optimizer.validate()?;
        if self.max_epochs == 0 {
            return Err(ConfigurationError::invalid_option(
                "max_epochs",
                "must be at least 1",
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::invalid_option(
                "batch_size",
                "must be at least 1",
            ));
        }
        if self.convergence_window < 2 {
            return Err(ConfigurationError::invalid_option(
                "convergence_window",
                "must span at least 2 epochs",
            ));
        }
        for (name, value) in [
            ("min_delta", self.min_delta),
            ("convergence_tolerance", self.convergence_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigurationError::invalid_option(
                    name,
                    format!("must be a non-negative finite number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// A full experiment: task + network + training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// What the network is trained to do.
    pub task: Task,
    /// What to assemble.
    pub network: NetworkConfig,
    /// How to optimize it.
    pub training: TrainingConfig,
}

impl ExperimentConfig {
    /// Parse from a YAML string.
    pub fn from_yaml_str(raw: &str) -> TrainResult<Self> {
        let config: Self = serde_yaml_ng::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a YAML file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> TrainResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Fail fast on any invalid option.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.task {
            Task::Classification { num_classes } if num_classes < 2 => {
                return Err(ConfigurationError::invalid_option(
                    "num_classes",
                    "classification needs at least 2 classes",
                ));
            }
            Task::Reinforcement { num_actions } if num_actions == 0 => {
                return Err(ConfigurationError::invalid_option(
                    "num_actions",
                    "reinforcement needs at least 1 action",
                ));
            }
            _ => {}
        }
        let outputs = self.task.output_dim();
        if outputs > self.network.num_wires as usize {
            return Err(ConfigurationError::invalid_option(
                "num_wires",
                format!(
                    "task reads {outputs} outputs but the network has only {} wires",
                    self.network.num_wires
                ),
            ));
        }
        self.training.validate()
    }

    /// Assemble the architecture this experiment describes.
    ///
    /// The measurement stage reads one wire per task output, starting at
    /// wire 0.
    pub fn build_architecture(&self) -> TrainResult<Architecture> {
        self.validate()?;
        let net = &self.network;
        let encoding =
            EncodingLayer::build(net.feature_dim, net.encoding_scheme, net.num_wires)?;
        let stack = VariationalLayer::build_stack(
            net.num_wires,
            net.depth,
            net.rotation_axes,
            net.entangling_pattern,
        )?;
        let measurement = MeasurementLayer::first_wires(self.task.output_dim() as u32)?;
        Ok(Architecture::assemble(
            encoding,
            stack,
            measurement,
            net.init,
        )?)
    }

    /// Draw initial parameters, seeded when the config carries a seed.
    pub fn initial_parameters(&self, architecture: &Architecture) -> Vec<f64> {
        let mut rng = match self.network.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        architecture.initial_parameters(&mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrainError;
    use crate::optimizer::OptimizerKind;

    const SAMPLE: &str = r#"
task:
  task_type: classification
  num_classes: 2
network:
  num_wires: 4
  depth: 2
  feature_dim: 4
  encoding_scheme: angle
  entangling_pattern: ring
  seed: 7
training:
  optimizer:
    kind: adam
    learning_rate: 0.05
  max_epochs: 30
  max_patience: 5
  batch_size: 4
"#;

    #[test]
    fn test_yaml_parsing_with_defaults() {
        let config = ExperimentConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.task, Task::Classification { num_classes: 2 });
        assert_eq!(config.network.rotation_axes, 3);
        assert_eq!(config.training.convergence_window, 5);
        assert_eq!(config.training.optimizer.kind, OptimizerKind::Adam);
        assert_eq!(config.training.snapshot_every, None);
    }

    #[test]
    fn test_build_architecture_from_config() {
        let config = ExperimentConfig::from_yaml_str(SAMPLE).unwrap();
        let arch = config.build_architecture().unwrap();
        assert_eq!(arch.num_wires(), 4);
        assert_eq!(arch.output_dim(), 2);
        assert_eq!(arch.parameter_count(), 4 * 3 * 2);
    }

    #[test]
    fn test_seeded_initialization_is_reproducible() {
        let config = ExperimentConfig::from_yaml_str(SAMPLE).unwrap();
        let arch = config.build_architecture().unwrap();
        assert_eq!(
            config.initial_parameters(&arch),
            config.initial_parameters(&arch)
        );
    }

    #[test]
    fn test_bad_learning_rate_fails_fast() {
        let raw = SAMPLE.replace("learning_rate: 0.05", "learning_rate: -1.0");
        assert!(matches!(
            ExperimentConfig::from_yaml_str(&raw),
            Err(TrainError::Config(ConfigurationError::InvalidOption { .. }))
        ));
    }

    #[test]
    fn test_too_many_outputs_for_wires() {
        let raw = SAMPLE.replace("num_classes: 2", "num_classes: 6");
        assert!(ExperimentConfig::from_yaml_str(&raw).is_err());
    }

    #[test]
    fn test_single_class_rejected() {
        let raw = SAMPLE.replace("num_classes: 2", "num_classes: 1");
        assert!(ExperimentConfig::from_yaml_str(&raw).is_err());
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let config = ExperimentConfig::from_yaml_str(SAMPLE).unwrap();
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let back = ExperimentConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config, back);
    }
}
