//! Task-polymorphic cost module.
//!
//! The task kind is a closed tagged variant: every consumer matches
//! exhaustively, so adding a task kind is a compile-visible change. The cost
//! functions are pure over per-example circuit outputs — no captured mutable
//! state — which keeps them safe to hand to an external differentiation
//! substrate.

use serde::{Deserialize, Serialize};

use crate::error::{TrainError, TrainResult};

/// Probability floor applied before `ln` in cross-entropy. Keeps saturated
/// outputs finite; tunable via [`CostModule::with_prob_floor`].
const DEFAULT_PROB_FLOOR: f64 = 1e-7;

/// What the network is being trained to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
pub enum Task {
    /// Predict a scalar from the first measured expectation.
    Regression,
    /// Predict one of `num_classes` labels via softmax over per-class
    /// expectations.
    Classification {
        /// Number of classes (and measured wires).
        num_classes: usize,
    },
    /// Maximize expected reward over per-action expectations.
    Reinforcement {
        /// Number of actions (and measured wires).
        num_actions: usize,
    },
}

impl Task {
    /// Number of circuit outputs this task consumes.
    pub fn output_dim(&self) -> usize {
        match self {
            Task::Regression => 1,
            Task::Classification { num_classes } => *num_classes,
            Task::Reinforcement { num_actions } => *num_actions,
        }
    }

    /// Task name as it appears in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Task::Regression => "regression",
            Task::Classification { .. } => "classification",
            Task::Reinforcement { .. } => "reinforcement",
        }
    }
}

/// Objective seam between the orchestrator and any loss definition.
///
/// `loss` and `upstream` must be pure functions of their arguments.
/// `upstream` returns `d(loss)/d(outputs)` per example, already carrying any
/// batch-averaging factors, so gradients from individual examples sum.
pub trait Objective: Send + Sync {
    /// Scalar batch loss.
    fn loss(&self, outputs: &[Vec<f64>], targets: &[Vec<f64>]) -> TrainResult<f64>;

    /// Per-example `d(loss)/d(outputs)`.
    fn upstream(&self, outputs: &[Vec<f64>], targets: &[Vec<f64>])
    -> TrainResult<Vec<Vec<f64>>>;
}

/// The built-in task-polymorphic objective.
#[derive(Debug, Clone)]
pub struct CostModule {
    task: Task,
    prob_floor: f64,
}

impl CostModule {
    /// Create the cost module for a task.
    pub fn new(task: Task) -> Self {
        Self {
            task,
            prob_floor: DEFAULT_PROB_FLOOR,
        }
    }

    /// Override the cross-entropy probability floor.
    #[must_use]
    pub fn with_prob_floor(mut self, floor: f64) -> Self {
        self.prob_floor = floor;
        self
    }

    /// The task this module scores.
    pub fn task(&self) -> Task {
        self.task
    }

    /// Post-process raw circuit outputs into a prediction.
    ///
    /// Regression and reinforcement pass outputs through; classification
    /// returns the argmax class index.
    pub fn predict(&self, outputs: &[f64]) -> Vec<f64> {
        match self.task {
            Task::Regression | Task::Reinforcement { .. } => outputs.to_vec(),
            Task::Classification { .. } => vec![argmax(outputs) as f64],
        }
    }

    /// Class probabilities for classification tasks; `None` otherwise.
    pub fn probabilities(&self, outputs: &[f64]) -> Option<Vec<f64>> {
        match self.task {
            Task::Classification { .. } => Some(softmax(outputs)),
            Task::Regression | Task::Reinforcement { .. } => None,
        }
    }

    /// Resolve a classification target into a probability vector.
    ///
    /// Targets arrive either as a length-1 class index or as a full
    /// probability vector.
    fn class_target(
        &self,
        example: usize,
        target: &[f64],
        num_classes: usize,
    ) -> TrainResult<Vec<f64>> {
        if target.len() == num_classes {
            return Ok(target.to_vec());
        }
        if target.len() == 1 {
            let index = target[0] as usize;
            if target[0] < 0.0 || index >= num_classes {
                return Err(TrainError::ClassIndexOutOfRange {
                    example,
                    index,
                    num_classes,
                });
            }
            let mut one_hot = vec![0.0; num_classes];
            one_hot[index] = 1.0;
            return Ok(one_hot);
        }
        Err(TrainError::TargetShape {
            example,
            expected: num_classes,
            got: target.len(),
        })
    }

    fn check_target_dim(
        &self,
        example: usize,
        target: &[f64],
        expected: usize,
    ) -> TrainResult<()> {
        if target.len() != expected {
            return Err(TrainError::TargetShape {
                example,
                expected,
                got: target.len(),
            });
        }
        Ok(())
    }
}

impl Objective for CostModule {
    fn loss(&self, outputs: &[Vec<f64>], targets: &[Vec<f64>]) -> TrainResult<f64> {
        if outputs.len() != targets.len() {
            return Err(TrainError::BatchMismatch {
                features: outputs.len(),
                targets: targets.len(),
            });
        }
        if outputs.is_empty() {
            return Err(TrainError::EmptyBatch);
        }
        let batch = outputs.len() as f64;

        match self.task {
            Task::Regression => {
                let dim = self.task.output_dim() as f64;
                let mut total = 0.0;
                for (example, (out, target)) in outputs.iter().zip(targets).enumerate() {
                    self.check_target_dim(example, target, out.len())?;
                    total += out
                        .iter()
                        .zip(target)
                        .map(|(y, t)| (y - t) * (y - t))
                        .sum::<f64>();
                }
                Ok(total / (batch * dim))
            }

            Task::Classification { num_classes } => {
                let mut total = 0.0;
                for (example, (out, target)) in outputs.iter().zip(targets).enumerate() {
                    let t = self.class_target(example, target, num_classes)?;
                    let p = softmax(out);
                    total -= t
                        .iter()
                        .zip(&p)
                        .map(|(ti, pi)| {
                            ti * pi.clamp(self.prob_floor, 1.0 - self.prob_floor).ln()
                        })
                        .sum::<f64>();
                }
                Ok(total / batch)
            }

            Task::Reinforcement { num_actions } => {
                // Negative expected reward over the episode batch.
                let mut total = 0.0;
                for (example, (out, reward)) in outputs.iter().zip(targets).enumerate() {
                    self.check_target_dim(example, reward, num_actions)?;
                    total -= out.iter().zip(reward).map(|(o, r)| o * r).sum::<f64>();
                }
                Ok(total / batch)
            }
        }
    }

    fn upstream(
        &self,
        outputs: &[Vec<f64>],
        targets: &[Vec<f64>],
    ) -> TrainResult<Vec<Vec<f64>>> {
        if outputs.len() != targets.len() {
            return Err(TrainError::BatchMismatch {
                features: outputs.len(),
                targets: targets.len(),
            });
        }
        if outputs.is_empty() {
            return Err(TrainError::EmptyBatch);
        }
        let batch = outputs.len() as f64;

        match self.task {
            Task::Regression => {
                let dim = self.task.output_dim() as f64;
                outputs
                    .iter()
                    .zip(targets)
                    .enumerate()
                    .map(|(example, (out, target))| {
                        self.check_target_dim(example, target, out.len())?;
                        Ok(out
                            .iter()
                            .zip(target)
                            .map(|(y, t)| 2.0 * (y - t) / (batch * dim))
                            .collect())
                    })
                    .collect()
            }

            Task::Classification { num_classes } => outputs
                .iter()
                .zip(targets)
                .enumerate()
                .map(|(example, (out, target))| {
                    let t = self.class_target(example, target, num_classes)?;
                    let p = softmax(out);
                    // Combined softmax + cross-entropy derivative.
                    Ok(p.iter().zip(&t).map(|(pi, ti)| (pi - ti) / batch).collect())
                })
                .collect(),

            Task::Reinforcement { num_actions } => outputs
                .iter()
                .zip(targets)
                .enumerate()
                .map(|(example, (_, reward))| {
                    self.check_target_dim(example, reward, num_actions)?;
                    Ok(reward.iter().map(|r| -r / batch).collect())
                })
                .collect(),
        }
    }
}

/// Numerically stable softmax.
fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
