//! Local statevector backend.
//!
//! Implements the [`Backend`] contract with an exact statevector simulation
//! and parameter-shift gradients. Suitable up to ~20 wires (memory-bound).
//!
//! # Gradients
//!
//! Every trainable parameter enters the circuit as the angle of exactly one
//! rotation gate, so the parameter-shift rule is exact:
//!
//!   ∂⟨Z⟩/∂θ = (⟨Z⟩(θ + π/2) − ⟨Z⟩(θ − π/2)) / 2
//!
//! The full gradient contracts these per-output derivatives with the upstream
//! derivative `d(loss)/d(outputs)` supplied by the cost module.

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, trace};

use grani_ir::Architecture;

use crate::backend::{Backend, Capabilities};
use crate::error::{BackendError, BackendResult};
use crate::statevector::Statevector;

/// Default wire ceiling; 2^20 amplitudes ≈ 16 MiB per state.
const DEFAULT_MAX_WIRES: u32 = 20;

/// Exact statevector execution backend.
pub struct StatevectorBackend {
    capabilities: Capabilities,
}

impl StatevectorBackend {
    /// Create a backend with the default wire ceiling.
    pub fn new() -> Self {
        Self::with_max_wires(DEFAULT_MAX_WIRES)
    }

    /// Create a backend with a custom wire ceiling.
    pub fn with_max_wires(max_wires: u32) -> Self {
        Self {
            capabilities: Capabilities::statevector(max_wires),
        }
    }

    /// Lower and run the architecture, reading out the measured wires.
    fn run(
        &self,
        architecture: &Architecture,
        parameters: &[f64],
        features: &[f64],
    ) -> BackendResult<Vec<f64>> {
        let instructions = architecture.lower(features, parameters)?;
        let mut sv = Statevector::new(architecture.num_wires() as usize);
        for instruction in &instructions {
            sv.apply(instruction);
        }
        Ok(architecture
            .measured_wires()
            .iter()
            .map(|w| sv.expectation_z(w.0 as usize))
            .collect())
    }
}

impl Default for StatevectorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for StatevectorBackend {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn execute(
        &self,
        architecture: &Architecture,
        parameters: &[f64],
        features: &[f64],
    ) -> BackendResult<Vec<f64>> {
        self.validate(architecture)?;
        trace!(
            num_wires = architecture.num_wires(),
            parameters = parameters.len(),
            "executing architecture"
        );
        self.run(architecture, parameters, features)
    }

    fn gradient(
        &self,
        architecture: &Architecture,
        parameters: &[f64],
        features: &[f64],
        upstream: &[f64],
    ) -> BackendResult<Vec<f64>> {
        self.validate(architecture)?;
        if upstream.len() != architecture.output_dim() {
            return Err(BackendError::UpstreamLengthMismatch {
                expected: architecture.output_dim(),
                got: upstream.len(),
            });
        }

        debug!(
            parameters = parameters.len(),
            outputs = upstream.len(),
            "parameter-shift gradient"
        );

        let mut shifted = parameters.to_vec();
        let mut gradient = Vec::with_capacity(parameters.len());
        for k in 0..parameters.len() {
            shifted[k] = parameters[k] + FRAC_PI_2;
            let plus = self.run(architecture, &shifted, features)?;
            shifted[k] = parameters[k] - FRAC_PI_2;
            let minus = self.run(architecture, &shifted, features)?;
            shifted[k] = parameters[k];

            let dk: f64 = upstream
                .iter()
                .zip(plus.iter().zip(&minus))
                .map(|(u, (p, m))| u * (p - m) / 2.0)
                .sum();
            gradient.push(dk);
        }
        Ok(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grani_ir::{
        EncodingLayer, EncodingScheme, EntanglingPattern, InitPolicy, MeasurementLayer,
        VariationalLayer,
    };

    fn small_arch(num_wires: u32, depth: usize, axes: u8) -> Architecture {
        let encoding =
            EncodingLayer::build(num_wires as usize, EncodingScheme::Angle, num_wires).unwrap();
        let stack =
            VariationalLayer::build_stack(num_wires, depth, axes, EntanglingPattern::Linear)
                .unwrap();
        let measurement = MeasurementLayer::first_wires(1).unwrap();
        Architecture::assemble(encoding, stack, measurement, InitPolicy::Zeros).unwrap()
    }

    #[test]
    fn test_execute_zero_parameters_zero_features() {
        // All-zero rotations leave |00⟩ untouched: ⟨Z₀⟩ = 1.
        let arch = small_arch(2, 1, 2);
        let backend = StatevectorBackend::new();
        let params = vec![0.0; arch.parameter_count()];
        let out = backend.execute(&arch, &params, &[0.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_execute_outputs_in_range() {
        let arch = small_arch(3, 2, 3);
        let backend = StatevectorBackend::new();
        let params: Vec<f64> = (0..arch.parameter_count()).map(|i| 0.1 * i as f64).collect();
        let out = backend.execute(&arch, &params, &[0.2, -0.4, 1.1]).unwrap();
        assert!(out.iter().all(|v| v.abs() <= 1.0 + 1e-9));
    }

    #[test]
    fn test_wire_ceiling_enforced() {
        let arch = small_arch(3, 1, 1);
        let backend = StatevectorBackend::with_max_wires(2);
        let params = vec![0.0; arch.parameter_count()];
        assert!(matches!(
            backend.execute(&arch, &params, &[0.0; 3]),
            Err(BackendError::TooManyWires {
                required: 3,
                max: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_upstream_length_checked() {
        let arch = small_arch(2, 1, 1);
        let backend = StatevectorBackend::new();
        let params = vec![0.0; arch.parameter_count()];
        assert!(matches!(
            backend.gradient(&arch, &params, &[0.0, 0.0], &[1.0, 1.0]),
            Err(BackendError::UpstreamLengthMismatch {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let arch = small_arch(2, 1, 2);
        let backend = StatevectorBackend::new();
        let features = [0.3, -0.7];
        let params: Vec<f64> = vec![0.11, -0.42, 0.35, 0.27];
        let upstream = [1.0];

        let analytic = backend.gradient(&arch, &params, &features, &upstream).unwrap();

        let eps = 1e-6;
        for (k, &g) in analytic.iter().enumerate() {
            let mut p = params.clone();
            p[k] += eps;
            let plus = backend.execute(&arch, &p, &features).unwrap()[0];
            p[k] = params[k] - eps;
            let minus = backend.execute(&arch, &p, &features).unwrap()[0];
            let numeric = (plus - minus) / (2.0 * eps);
            assert!(
                (g - numeric).abs() < 1e-5,
                "param {k}: analytic {g} vs numeric {numeric}"
            );
        }
    }

    #[test]
    fn test_gradient_scales_with_upstream() {
        let arch = small_arch(2, 1, 1);
        let backend = StatevectorBackend::new();
        let features = [0.5, 0.1];
        let params = vec![0.2, -0.3];

        let g1 = backend.gradient(&arch, &params, &features, &[1.0]).unwrap();
        let g2 = backend.gradient(&arch, &params, &features, &[-2.0]).unwrap();
        for (a, b) in g1.iter().zip(&g2) {
            assert!((b - (-2.0 * a)).abs() < 1e-12);
        }
    }
}
