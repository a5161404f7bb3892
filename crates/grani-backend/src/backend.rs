//! Execution substrate contract.
//!
//! The [`Backend`] trait is the boundary between the training core and
//! whatever evaluates circuits — the shipped statevector engine, a hardware
//! adapter, or a batched remote service. The core never inspects a backend's
//! internal representation; it only lowers an [`Architecture`] and consumes
//! outputs and gradients.
//!
//! ```text
//!   capabilities() ──→ validate() ──→ execute() / gradient()
//!     (sync, &ref)      (sync)          (sync, blocking)
//! ```
//!
//! # Contract
//!
//! - `capabilities()` MUST be synchronous and infallible; implementations
//!   cache capabilities at construction time.
//! - `execute()` returns one classical output per measured wire, in the
//!   measurement layer's wire order.
//! - `gradient()` returns `d(loss)/d(parameters)` for one example, given the
//!   upstream derivative `d(loss)/d(outputs)`.
//! - Both calls are blocking; a batched substrate may parallelize underneath
//!   as long as outputs return in submission order.

use serde::{Deserialize, Serialize};

use grani_ir::Architecture;

use crate::error::{BackendError, BackendResult};

/// What an execution backend can do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Maximum wire count the backend supports.
    pub max_wires: u32,
    /// Whether the backend can prepare arbitrary states (amplitude encoding).
    pub supports_state_prep: bool,
    /// Whether this is a simulator (`true`) vs real hardware (`false`).
    pub is_simulator: bool,
}

impl Capabilities {
    /// Capabilities of a statevector simulator with the given width.
    pub fn statevector(max_wires: u32) -> Self {
        Self {
            name: "statevector".into(),
            max_wires,
            supports_state_prep: true,
            is_simulator: true,
        }
    }
}

/// Trait for execution backends.
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Get the capabilities of this backend.
    ///
    /// Synchronous and infallible; cached at construction time.
    fn capabilities(&self) -> &Capabilities;

    /// Check an architecture against backend constraints before training.
    fn validate(&self, architecture: &Architecture) -> BackendResult<()> {
        let caps = self.capabilities();
        if architecture.num_wires() > caps.max_wires {
            return Err(BackendError::TooManyWires {
                backend: caps.name.clone(),
                required: architecture.num_wires(),
                max: caps.max_wires,
            });
        }
        Ok(())
    }

    /// Evaluate the architecture on one input, returning the measured
    /// expectation values.
    fn execute(
        &self,
        architecture: &Architecture,
        parameters: &[f64],
        features: &[f64],
    ) -> BackendResult<Vec<f64>>;

    /// Compute `d(loss)/d(parameters)` for one input.
    ///
    /// `upstream` is `d(loss)/d(outputs)` with one entry per measured wire.
    fn gradient(
        &self,
        architecture: &Architecture,
        parameters: &[f64],
        features: &[f64],
        upstream: &[f64],
    ) -> BackendResult<Vec<f64>>;
}
