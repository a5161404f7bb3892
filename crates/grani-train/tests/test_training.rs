//! Integration tests for the training orchestrator state machine.

use grani_backend::{Backend, BackendResult, Capabilities, StatevectorBackend};
use grani_ir::{Architecture, EncodingScheme, EntanglingPattern, InitPolicy};
use grani_train::{
    ExperimentConfig, InMemoryDataset, ModelSnapshot, NetworkConfig, Objective,
    OptimizerConfig, OptimizerKind, RunStatus, Task, TrainResult, Trainer, TrainingConfig,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn experiment(num_wires: u32, depth: usize, max_epochs: usize) -> ExperimentConfig {
    ExperimentConfig {
        task: Task::Regression,
        network: NetworkConfig {
            num_wires,
            depth,
            feature_dim: num_wires as usize,
            encoding_scheme: EncodingScheme::Angle,
            entangling_pattern: EntanglingPattern::Linear,
            rotation_axes: 3,
            init: InitPolicy::default(),
            seed: Some(1234),
        },
        training: TrainingConfig {
            max_patience: max_epochs,
            batch_size: 8,
            ..TrainingConfig::new(OptimizerConfig::new(OptimizerKind::Sgd, 0.1), max_epochs)
        },
    }
}

/// Eight regression examples with targets a trainable function of the
/// features: t = cos(x₀), which the angle-encoded readout can represent.
fn regression_dataset(batch_size: usize) -> InMemoryDataset {
    let features: Vec<Vec<f64>> = (0..8)
        .map(|i| {
            let x = -1.0 + 0.25 * i as f64;
            vec![x, 0.5 * x, -x, 0.1]
        })
        .collect();
    let targets: Vec<Vec<f64>> = features.iter().map(|f| vec![f[0].cos()]).collect();
    InMemoryDataset::new(features, targets, batch_size).unwrap()
}

/// Backend stub whose gradient is a constant fill value.
struct FillBackend {
    caps: Capabilities,
    fill: f64,
}

impl FillBackend {
    fn new(fill: f64) -> Self {
        Self {
            caps: Capabilities {
                name: "fill".into(),
                max_wires: 32,
                supports_state_prep: true,
                is_simulator: true,
            },
            fill,
        }
    }
}

impl Backend for FillBackend {
    fn name(&self) -> &str {
        &self.caps.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn execute(
        &self,
        architecture: &Architecture,
        _parameters: &[f64],
        _features: &[f64],
    ) -> BackendResult<Vec<f64>> {
        Ok(vec![0.0; architecture.output_dim()])
    }

    fn gradient(
        &self,
        _architecture: &Architecture,
        parameters: &[f64],
        _features: &[f64],
        _upstream: &[f64],
    ) -> BackendResult<Vec<f64>> {
        Ok(vec![self.fill; parameters.len()])
    }
}

/// Objective returning the same loss regardless of outputs.
struct ConstantObjective(f64);

impl Objective for ConstantObjective {
    fn loss(&self, _outputs: &[Vec<f64>], _targets: &[Vec<f64>]) -> TrainResult<f64> {
        Ok(self.0)
    }

    fn upstream(
        &self,
        outputs: &[Vec<f64>],
        _targets: &[Vec<f64>],
    ) -> TrainResult<Vec<Vec<f64>>> {
        Ok(outputs.iter().map(|o| vec![0.0; o.len()]).collect())
    }
}

// ---------------------------------------------------------------------------
// End-to-end training
// ---------------------------------------------------------------------------

#[test]
fn regression_run_reaches_converged_or_exhausted() {
    // feature_dim=4, num_wires=4, depth=2, angle encoding, linear
    // entangling, batch of 8, lr=0.1, max_epochs=50.
    let config = experiment(4, 2, 50);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = StatevectorBackend::new();
    let mut data = regression_dataset(config.training.batch_size);

    let mut trainer = Trainer::new(
        &backend,
        architecture.clone(),
        config.task,
        config.training.clone(),
    )
    .unwrap();
    let report = trainer.fit(&mut data, None, initial).unwrap();

    assert!(
        matches!(report.status, RunStatus::Converged | RunStatus::Exhausted),
        "unexpected status {:?}",
        report.status
    );
    assert!(report.state.epoch < 50);
    assert!(report.state.best_loss.is_finite());

    // best_loss is monotonically non-increasing across checkpoints.
    for pair in report.history.windows(2) {
        assert!(pair[1].best_loss <= pair[0].best_loss);
    }

    // The run is snapshot-worthy and the snapshot round-trips.
    let snapshot = ModelSnapshot::from_report(
        architecture,
        config.task,
        config.training.clone(),
        &report,
    )
    .expect("usable run must yield a snapshot");
    let back = ModelSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(snapshot, back);
}

#[test]
fn training_reduces_loss_on_learnable_targets() {
    let config = experiment(4, 2, 30);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = StatevectorBackend::new();
    let mut data = regression_dataset(8);

    let mut trainer = Trainer::new(
        &backend,
        architecture,
        config.task,
        config.training.clone(),
    )
    .unwrap();
    let report = trainer.fit(&mut data, None, initial).unwrap();

    let first = report.history.first().unwrap().train_loss;
    assert!(report.state.best_loss <= first);
}

#[test]
fn validation_source_drives_monitoring() {
    let config = experiment(4, 1, 5);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = StatevectorBackend::new();
    let mut train = regression_dataset(8);
    let mut val = regression_dataset(8);

    let mut trainer =
        Trainer::new(&backend, architecture, config.task, config.training.clone()).unwrap();
    let report = trainer.fit(&mut train, Some(&mut val), initial).unwrap();

    assert!(report.history.iter().all(|m| m.val_loss.is_some()));
}

// ---------------------------------------------------------------------------
// Early stopping
// ---------------------------------------------------------------------------

#[test]
fn constant_loss_early_stops_exactly_at_patience() {
    let mut config = experiment(2, 1, 20);
    config.training.max_patience = 3;
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = FillBackend::new(0.0);

    let mut trainer =
        Trainer::new(&backend, architecture, config.task, config.training.clone())
            .unwrap()
            .with_objective(Box::new(ConstantObjective(1.0)));
    let report = trainer.fit(&mut regression_dataset(8), None, initial).unwrap();

    assert_eq!(report.status, RunStatus::EarlyStopped);
    // Epoch 0 improves from +inf; epochs 1..=3 exhaust the patience of 3.
    assert_eq!(report.state.epoch, 3);
    assert_eq!(report.state.patience_counter, 3);
    assert_eq!(report.history.len(), 4);
}

#[test]
fn constant_loss_with_large_patience_converges_over_window() {
    let mut config = experiment(2, 1, 20);
    config.training.max_patience = 20;
    config.training.convergence_window = 4;
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = FillBackend::new(0.0);

    let mut trainer =
        Trainer::new(&backend, architecture, config.task, config.training.clone())
            .unwrap()
            .with_objective(Box::new(ConstantObjective(0.5)));
    let report = trainer.fit(&mut regression_dataset(8), None, initial).unwrap();

    assert_eq!(report.status, RunStatus::Converged);
    // Window fills at epoch 3 (epochs 0..=3) with zero improvement.
    assert_eq!(report.state.epoch, 3);
}

// ---------------------------------------------------------------------------
// Divergence
// ---------------------------------------------------------------------------

#[test]
fn non_finite_gradient_diverges_after_one_retry() {
    let config = experiment(2, 1, 10);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = FillBackend::new(f64::NAN);

    let mut trainer =
        Trainer::new(&backend, architecture, config.task, config.training.clone()).unwrap();
    let report = trainer.fit(&mut regression_dataset(8), None, initial).unwrap();

    assert_eq!(report.status, RunStatus::Diverged);
    // No step ever succeeded.
    assert_eq!(report.state.step, 0);
    let detail = report.divergence.expect("diverged run carries detail");
    assert!(detail.contains("gradient"), "detail: {detail}");
}

#[test]
fn diverged_run_yields_no_snapshot() {
    let config = experiment(2, 1, 10);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = FillBackend::new(f64::INFINITY);

    let mut trainer = Trainer::new(
        &backend,
        architecture.clone(),
        config.task,
        config.training.clone(),
    )
    .unwrap();
    let report = trainer.fit(&mut regression_dataset(8), None, initial).unwrap();

    assert_eq!(report.status, RunStatus::Diverged);
    assert!(
        ModelSnapshot::from_report(architecture, config.task, config.training, &report)
            .is_none()
    );
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancellation_before_first_batch_returns_initial_state() {
    let config = experiment(2, 1, 10);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = StatevectorBackend::new();

    let mut trainer =
        Trainer::new(&backend, architecture, config.task, config.training.clone()).unwrap();
    trainer.cancel_token().cancel();
    let report = trainer
        .fit(&mut regression_dataset(8), None, initial.clone())
        .unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.state.epoch, 0);
    assert_eq!(report.state.step, 0);
    assert_eq!(report.final_parameters, initial);
    assert!(report.history.is_empty());
}

// ---------------------------------------------------------------------------
// Checkpointing
// ---------------------------------------------------------------------------

#[test]
fn periodic_checkpoints_are_written_and_loadable() {
    let mut config = experiment(2, 1, 3);
    config.training.snapshot_every = Some(1);
    let architecture = config.build_architecture().unwrap();
    let initial = config.initial_parameters(&architecture);
    let backend = StatevectorBackend::new();
    let dir = tempfile::tempdir().unwrap();

    let mut trainer = Trainer::new(
        &backend,
        architecture.clone(),
        config.task,
        config.training.clone(),
    )
    .unwrap()
    .with_checkpoint_dir(dir.path());
    let report = trainer.fit(&mut regression_dataset(8), None, initial).unwrap();

    for epoch in 0..report.history.len() {
        let path = dir.path().join(format!("epoch-{epoch:04}.json"));
        let snapshot = ModelSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.architecture, architecture);
        assert_eq!(snapshot.run_id, Some(report.run_id));
    }
}

// ---------------------------------------------------------------------------
// Parameter length discipline
// ---------------------------------------------------------------------------

#[test]
fn wrong_initial_parameter_length_rejected() {
    let config = experiment(2, 1, 5);
    let architecture = config.build_architecture().unwrap();
    let backend = StatevectorBackend::new();

    let mut trainer =
        Trainer::new(&backend, architecture, config.task, config.training.clone()).unwrap();
    assert!(
        trainer
            .fit(&mut regression_dataset(8), None, vec![0.0; 3])
            .is_err()
    );
}
