//! Training orchestration.
//!
//! The [`Trainer`] drives the state machine
//!
//! ```text
//!   Initialized → Running → { Converged, EarlyStopped, Diverged, Exhausted }
//! ```
//!
//! plus `Cancelled` for cooperative cancellation at batch boundaries. Each
//! step draws a batch, evaluates the cost, asks the backend for gradients,
//! and applies one optimizer update. Divergence is retried exactly once:
//! roll back to the best checkpoint, halve the learning rate, reset moments;
//! a second divergence is terminal.
//!
//! Only one trainer instance operates on a given Parameter Vector; no
//! locking is needed, and the backend call is the only blocking operation.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use grani_backend::Backend;
use grani_ir::{Architecture, ArchitectureError};

use crate::config::TrainingConfig;
use crate::dataset::{Batch, BatchSource};
use crate::error::{NumericalDivergenceError, OptimizerError, TrainError, TrainResult};
use crate::metrics::EpochMetrics;
use crate::optimizer::Optimizer;
use crate::snapshot::ModelSnapshot;
use crate::task::{CostModule, Objective, Task};

/// Terminal outcome of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Loss improvement over the window fell below tolerance.
    Converged,
    /// Patience ran out without improvement.
    EarlyStopped,
    /// Numerical divergence survived the one automatic retry.
    Diverged,
    /// `max_epochs` reached without convergence.
    Exhausted,
    /// Cooperative cancellation at a batch boundary.
    Cancelled,
}

impl RunStatus {
    /// Whether this outcome yields a usable model snapshot.
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            RunStatus::Converged | RunStatus::EarlyStopped | RunStatus::Exhausted
        )
    }
}

/// Mutable run state, owned by the trainer for the duration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Last completed epoch (0-based).
    pub epoch: usize,
    /// Successful optimizer steps so far.
    pub step: usize,
    /// Best monitored loss so far.
    pub best_loss: f64,
    /// Copy (not alias) of the parameters that achieved `best_loss`.
    pub best_parameters: Vec<f64>,
    /// Consecutive epochs without improvement.
    pub patience_counter: usize,
}

/// Shared flag for cooperative cancellation, checked at batch boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The trainer returns after the current batch.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Everything a finished (or interrupted) run reports back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Run identifier, also stamped on snapshots.
    pub run_id: Uuid,
    /// Terminal status.
    pub status: RunStatus,
    /// Final training state (best loss, best parameters, counters).
    pub state: TrainingState,
    /// Per-epoch metrics.
    pub history: Vec<EpochMetrics>,
    /// Parameters as of the last completed step (not necessarily the best).
    pub final_parameters: Vec<f64>,
    /// Divergence detail when `status == Diverged`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence: Option<String>,
}

impl TrainingReport {
    /// Whether this run produced a usable snapshot.
    pub fn is_usable(&self) -> bool {
        self.status.is_usable()
    }
}

enum BatchOutcome {
    Stepped { loss: f64, grad_norm: f64 },
    Diverged(NumericalDivergenceError),
}

/// Top-level training controller.
pub struct Trainer<'a> {
    backend: &'a dyn Backend,
    architecture: Architecture,
    task: Task,
    objective: Box<dyn Objective + 'a>,
    optimizer: Optimizer,
    config: TrainingConfig,
    cancel: CancelToken,
    checkpoint_dir: Option<PathBuf>,
    epoch_hook: Option<Box<dyn FnMut(&EpochMetrics) + 'a>>,
}

impl<'a> Trainer<'a> {
    /// Create a trainer for an assembled architecture.
    ///
    /// Validates the training configuration and the architecture against the
    /// backend before any step runs.
    pub fn new(
        backend: &'a dyn Backend,
        architecture: Architecture,
        task: Task,
        config: TrainingConfig,
    ) -> TrainResult<Self> {
        config.validate()?;
        backend.validate(&architecture)?;
        let optimizer = Optimizer::new(config.optimizer)?;
        Ok(Self {
            backend,
            architecture,
            task,
            objective: Box::new(CostModule::new(task)),
            optimizer,
            config,
            cancel: CancelToken::new(),
            checkpoint_dir: None,
            epoch_hook: None,
        })
    }

    /// Replace the built-in cost module with a custom objective.
    #[must_use]
    pub fn with_objective(mut self, objective: Box<dyn Objective + 'a>) -> Self {
        self.objective = objective;
        self
    }

    /// Write periodic checkpoints into this directory.
    #[must_use]
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Observe per-epoch metrics (progress bars, plotting, logging).
    #[must_use]
    pub fn with_epoch_hook(mut self, hook: impl FnMut(&EpochMetrics) + 'a) -> Self {
        self.epoch_hook = Some(Box::new(hook));
        self
    }

    /// A token that cancels this trainer from another owner.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The architecture this trainer drives.
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// Run the training loop to a terminal state.
    ///
    /// `initial_parameters` must match the architecture's parameter count;
    /// draw them from [`Architecture::initial_parameters`] or a loaded
    /// snapshot.
    pub fn fit(
        &mut self,
        train: &mut dyn BatchSource,
        mut validation: Option<&mut dyn BatchSource>,
        initial_parameters: Vec<f64>,
    ) -> TrainResult<TrainingReport> {
        if initial_parameters.len() != self.architecture.parameter_count() {
            return Err(ArchitectureError::ParameterLengthMismatch {
                expected: self.architecture.parameter_count(),
                got: initial_parameters.len(),
            }
            .into());
        }

        let run_id = Uuid::new_v4();
        let mut params = initial_parameters;
        let mut state = TrainingState {
            epoch: 0,
            step: 0,
            best_loss: f64::INFINITY,
            best_parameters: params.clone(),
            patience_counter: 0,
        };
        let mut history: Vec<EpochMetrics> = vec![];
        let mut window: VecDeque<f64> = VecDeque::new();
        let mut retried = false;
        let mut running = false;

        info!(
            %run_id,
            task = self.task.name(),
            parameters = params.len(),
            optimizer = self.optimizer.kind().name(),
            max_epochs = self.config.max_epochs,
            "trainer initialized"
        );

        let finish = |status: RunStatus,
                      state: TrainingState,
                      history: Vec<EpochMetrics>,
                      params: Vec<f64>,
                      divergence: Option<String>| {
            info!(%run_id, ?status, epoch = state.epoch, best_loss = state.best_loss, "training finished");
            Ok(TrainingReport {
                run_id,
                status,
                state,
                history,
                final_parameters: params,
                divergence,
            })
        };

        for epoch in 0..self.config.max_epochs {
            if self.cancel.is_cancelled() {
                return finish(RunStatus::Cancelled, state, history, params, None);
            }

            train.reset();
            let mut loss_sum = 0.0;
            let mut examples = 0usize;
            let mut last_grad_norm = None;

            while let Some(batch) = train.next_batch() {
                if self.cancel.is_cancelled() {
                    state.epoch = epoch;
                    return finish(RunStatus::Cancelled, state, history, params, None);
                }
                if !running {
                    info!(%run_id, "entering running state");
                    running = true;
                }

                match self.run_batch(&batch, &mut params)? {
                    BatchOutcome::Stepped { loss, grad_norm } => {
                        state.step += 1;
                        loss_sum += loss * batch.len() as f64;
                        examples += batch.len();
                        last_grad_norm = Some(grad_norm);
                    }
                    BatchOutcome::Diverged(cause) => {
                        if !retried {
                            retried = true;
                            params = state.best_parameters.clone();
                            self.optimizer.reduce_learning_rate(0.5);
                            self.optimizer.reset_state();
                            warn!(
                                %run_id,
                                epoch,
                                step = state.step,
                                %cause,
                                learning_rate = self.optimizer.learning_rate(),
                                "divergence: rolled back to best checkpoint with halved learning rate"
                            );
                            continue;
                        }
                        state.epoch = epoch;
                        let detail =
                            format!("{cause} (epoch {epoch}, step {})", state.step);
                        return finish(
                            RunStatus::Diverged,
                            state,
                            history,
                            params,
                            Some(detail),
                        );
                    }
                }
            }

            // An epoch where every batch diverged-and-rolled-back has no
            // loss; count it as a non-improving epoch.
            let train_loss = if examples > 0 {
                loss_sum / examples as f64
            } else {
                f64::INFINITY
            };
            let val_loss = match validation.as_deref_mut() {
                Some(source) => Some(self.evaluate_source(source, &params)?),
                None => None,
            };
            let monitored = val_loss.unwrap_or(train_loss);

            let improved = monitored < state.best_loss - self.config.min_delta;
            if improved {
                state.best_loss = monitored;
                state.best_parameters = params.clone();
                state.patience_counter = 0;
            } else {
                state.patience_counter += 1;
            }
            state.epoch = epoch;

            let metrics = EpochMetrics {
                epoch,
                train_loss,
                val_loss,
                best_loss: state.best_loss,
                gradient_norm: last_grad_norm,
                learning_rate: self.optimizer.learning_rate(),
            };
            debug!(
                epoch,
                train_loss,
                val_loss,
                best_loss = state.best_loss,
                patience = state.patience_counter,
                "epoch complete"
            );
            if let Some(hook) = self.epoch_hook.as_mut() {
                hook(&metrics);
            }
            history.push(metrics);

            self.maybe_checkpoint(&state, run_id)?;

            if !improved && state.patience_counter >= self.config.max_patience {
                return finish(RunStatus::EarlyStopped, state, history, params, None);
            }

            window.push_back(monitored);
            if window.len() > self.config.convergence_window {
                window.pop_front();
            }
            if window.len() == self.config.convergence_window {
                if let (Some(&first), Some(&last)) = (window.front(), window.back()) {
                    if first - last < self.config.convergence_tolerance {
                        return finish(RunStatus::Converged, state, history, params, None);
                    }
                }
            }
        }

        finish(RunStatus::Exhausted, state, history, params, None)
    }

    /// Mean loss of the objective over a full pass of `source`, without
    /// touching parameters or optimizer state.
    pub fn evaluate_source(
        &self,
        source: &mut dyn BatchSource,
        parameters: &[f64],
    ) -> TrainResult<f64> {
        source.reset();
        let mut total = 0.0;
        let mut examples = 0usize;
        while let Some(batch) = source.next_batch() {
            let outputs = self.execute_batch(&batch, parameters)?;
            let loss = self.objective.loss(&outputs, batch.targets())?;
            total += loss * batch.len() as f64;
            examples += batch.len();
        }
        if examples == 0 {
            return Err(TrainError::EmptyBatch);
        }
        Ok(total / examples as f64)
    }

    fn execute_batch(&self, batch: &Batch, parameters: &[f64]) -> TrainResult<Vec<Vec<f64>>> {
        let mut outputs = Vec::with_capacity(batch.len());
        for features in batch.features() {
            outputs.push(
                self.backend
                    .execute(&self.architecture, parameters, features)?,
            );
        }
        Ok(outputs)
    }

    /// One batch: cost → upstream → backend gradient → optimizer step.
    fn run_batch(&mut self, batch: &Batch, params: &mut Vec<f64>) -> TrainResult<BatchOutcome> {
        let outputs = self.execute_batch(batch, params)?;
        let loss = self.objective.loss(&outputs, batch.targets())?;
        if !loss.is_finite() {
            return Ok(BatchOutcome::Diverged(NumericalDivergenceError::Loss));
        }

        let upstream = self.objective.upstream(&outputs, batch.targets())?;
        let mut gradient = vec![0.0; params.len()];
        for (features, up) in batch.features().iter().zip(&upstream) {
            let g = self
                .backend
                .gradient(&self.architecture, params, features, up)?;
            for (acc, gi) in gradient.iter_mut().zip(&g) {
                *acc += gi;
            }
        }
        let grad_norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();

        match self.optimizer.step(params, &gradient) {
            Ok(updated) => {
                *params = updated;
                Ok(BatchOutcome::Stepped { loss, grad_norm })
            }
            Err(OptimizerError::Divergence(cause)) => Ok(BatchOutcome::Diverged(cause)),
            Err(other) => Err(other.into()),
        }
    }

    /// Write a best-so-far snapshot on the configured cadence.
    fn maybe_checkpoint(&self, state: &TrainingState, run_id: Uuid) -> TrainResult<()> {
        let (Some(dir), Some(every)) = (&self.checkpoint_dir, self.config.snapshot_every) else {
            return Ok(());
        };
        if every == 0 || state.epoch % every != 0 {
            return Ok(());
        }
        std::fs::create_dir_all(dir)?;
        let snapshot = ModelSnapshot::new(
            self.architecture.clone(),
            state.best_parameters.clone(),
            self.task,
            self.config.clone(),
        )
        .with_run(run_id, state.best_loss);
        let path = dir.join(format!("epoch-{:04}.json", state.epoch));
        snapshot.save(&path)?;
        debug!(epoch = state.epoch, path = %path.display(), "checkpoint written");
        Ok(())
    }
}
