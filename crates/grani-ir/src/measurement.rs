//! Measurement layer.
//!
//! The readout stage: Pauli-Z expectation values on an ordered list of wires.
//! Output dimension equals the number of measured wires; values live in
//! `[-1, 1]`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::wire::WireId;

/// Expectation readout on an ordered set of wires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementLayer {
    wires: Vec<WireId>,
}

impl MeasurementLayer {
    /// Build a measurement layer reading the given wires, in order.
    pub fn build(wires: Vec<WireId>) -> Result<Self, ConfigurationError> {
        if wires.is_empty() {
            return Err(ConfigurationError::EmptyMeasurement);
        }
        Ok(Self { wires })
    }

    /// Read ⟨Z⟩ on the first `n` wires — the common task-driven readout.
    pub fn first_wires(n: u32) -> Result<Self, ConfigurationError> {
        Self::build((0..n).map(WireId).collect())
    }

    /// The measured wires, in output order.
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    /// Number of classical outputs this layer produces.
    pub fn output_dim(&self) -> usize {
        self.wires.len()
    }
}
