//! Classical parameter-update rules.
//!
//! One optimizer instance owns the Parameter Vector for the duration of a
//! training run. Each [`Optimizer::step`] is a function of the current
//! parameters, the gradient, and the optimizer's moment state; the moment
//! state commits only when the step succeeds, so a diverging step leaves the
//! optimizer exactly as it was.

use serde::{Deserialize, Serialize};

use crate::error::{NumericalDivergenceError, OptimizerError};
use grani_ir::ConfigurationError;

/// Update rule selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Plain gradient descent.
    Sgd,
    /// Heavy-ball momentum.
    Momentum,
    /// Adam adaptive moments.
    Adam,
}

impl OptimizerKind {
    /// Kind name as it appears in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Sgd => "sgd",
            OptimizerKind::Momentum => "momentum",
            OptimizerKind::Adam => "adam",
        }
    }
}

fn default_momentum() -> f64 {
    0.9
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_epsilon() -> f64 {
    1e-8
}

/// Optimizer hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Update rule.
    pub kind: OptimizerKind,
    /// Learning rate; must be positive and finite.
    pub learning_rate: f64,
    /// Momentum coefficient (momentum rule only).
    #[serde(default = "default_momentum")]
    pub momentum: f64,
    /// First-moment decay (Adam only).
    #[serde(default = "default_beta1")]
    pub beta1: f64,
    /// Second-moment decay (Adam only).
    #[serde(default = "default_beta2")]
    pub beta2: f64,
    /// Denominator fuzz (Adam only).
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl OptimizerConfig {
    /// Config with defaults for everything but kind and learning rate.
    pub fn new(kind: OptimizerKind, learning_rate: f64) -> Self {
        Self {
            kind,
            learning_rate,
            momentum: default_momentum(),
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }

    /// Fail fast on out-of-range hyperparameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ConfigurationError::invalid_option(
                "learning_rate",
                format!("must be a positive finite number, got {}", self.learning_rate),
            ));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(ConfigurationError::invalid_option(
                "momentum",
                format!("must be in [0, 1), got {}", self.momentum),
            ));
        }
        for (name, value) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigurationError::invalid_option(
                    name,
                    format!("must be in [0, 1), got {value}"),
                ));
            }
        }
        if !(self.epsilon > 0.0) {
            return Err(ConfigurationError::invalid_option(
                "epsilon",
                format!("must be positive, got {}", self.epsilon),
            ));
        }
        Ok(())
    }
}

/// Classical update driver with privately owned moment state.
#[derive(Debug, Clone)]
pub struct Optimizer {
    config: OptimizerConfig,
    /// Momentum velocity, sized lazily at the first step.
    velocity: Vec<f64>,
    /// Adam first moment.
    first_moment: Vec<f64>,
    /// Adam second moment.
    second_moment: Vec<f64>,
    /// Adam bias-correction timestep.
    timestep: u64,
}

impl Optimizer {
    /// Create an optimizer, validating its configuration.
    pub fn new(config: OptimizerConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            velocity: vec![],
            first_moment: vec![],
            second_moment: vec![],
            timestep: 0,
        })
    }

    /// The configured update rule.
    pub fn kind(&self) -> OptimizerKind {
        self.config.kind
    }

    /// Current learning rate.
    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    /// Scale the learning rate, e.g. halving it after a divergence rollback.
    pub fn reduce_learning_rate(&mut self, factor: f64) {
        self.config.learning_rate *= factor;
    }

    /// Discard accumulated moment state.
    pub fn reset_state(&mut self) {
        self.velocity.clear();
        self.first_moment.clear();
        self.second_moment.clear();
        self.timestep = 0;
    }

    /// Apply one update: `step(parameters, gradient) → new_parameters`.
    ///
    /// Fails with [`NumericalDivergenceError`] when the gradient or any
    /// updated parameter is non-finite; moment state is untouched on failure.
    pub fn step(
        &mut self,
        parameters: &[f64],
        gradient: &[f64],
    ) -> Result<Vec<f64>, OptimizerError> {
        if gradient.len() != parameters.len() {
            return Err(OptimizerError::LengthMismatch {
                expected: parameters.len(),
                got: gradient.len(),
            });
        }
        if let Some(index) = gradient.iter().position(|g| !g.is_finite()) {
            return Err(NumericalDivergenceError::Gradient(index).into());
        }

        let lr = self.config.learning_rate;
        let n = parameters.len();

        // Candidate state lives in temporaries until the update is known to
        // be finite.
        match self.config.kind {
            OptimizerKind::Sgd => {
                let updated: Vec<f64> = parameters
                    .iter()
                    .zip(gradient)
                    .map(|(p, g)| p - lr * g)
                    .collect();
                check_finite(&updated)?;
                Ok(updated)
            }

            OptimizerKind::Momentum => {
                let mu = self.config.momentum;
                let velocity = sized(&self.velocity, n);
                let new_velocity: Vec<f64> = velocity
                    .iter()
                    .zip(gradient)
                    .map(|(v, g)| mu * v + g)
                    .collect();
                let updated: Vec<f64> = parameters
                    .iter()
                    .zip(&new_velocity)
                    .map(|(p, v)| p - lr * v)
                    .collect();
                check_finite(&updated)?;
                self.velocity = new_velocity;
                Ok(updated)
            }

            OptimizerKind::Adam => {
                let (b1, b2, eps) = (self.config.beta1, self.config.beta2, self.config.epsilon);
                let first = sized(&self.first_moment, n);
                let second = sized(&self.second_moment, n);
                let t = self.timestep + 1;

                let new_first: Vec<f64> = first
                    .iter()
                    .zip(gradient)
                    .map(|(m, g)| b1 * m + (1.0 - b1) * g)
                    .collect();
                let new_second: Vec<f64> = second
                    .iter()
                    .zip(gradient)
                    .map(|(v, g)| b2 * v + (1.0 - b2) * g * g)
                    .collect();

                let bias1 = 1.0 - b1.powi(t as i32);
                let bias2 = 1.0 - b2.powi(t as i32);
                let updated: Vec<f64> = parameters
                    .iter()
                    .zip(new_first.iter().zip(&new_second))
                    .map(|(p, (m, v))| {
                        let m_hat = m / bias1;
                        let v_hat = v / bias2;
                        p - lr * m_hat / (v_hat.sqrt() + eps)
                    })
                    .collect();
                check_finite(&updated)?;
                self.first_moment = new_first;
                self.second_moment = new_second;
                self.timestep = t;
                Ok(updated)
            }
        }
    }

    #[cfg(test)]
    fn moment_state(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>, u64) {
        (
            self.velocity.clone(),
            self.first_moment.clone(),
            self.second_moment.clone(),
            self.timestep,
        )
    }
}

fn check_finite(parameters: &[f64]) -> Result<(), NumericalDivergenceError> {
    match parameters.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(NumericalDivergenceError::Parameter(index)),
        None => Ok(()),
    }
}

/// Existing moment vector, or zeros if this is the first step.
fn sized(state: &[f64], n: usize) -> Vec<f64> {
    if state.len() == n {
        state.to_vec()
    } else {
        vec![0.0; n]
    }
}
