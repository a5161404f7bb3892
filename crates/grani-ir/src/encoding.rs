//! Data-encoding layer.
//!
//! Maps a classical feature vector into a circuit-native representation.
//! Encoding layers carry no trainable parameters; lowering is a pure function
//! of the input features.
//!
//! | Scheme      | Wire budget                    | Lowering                        |
//! |-------------|--------------------------------|---------------------------------|
//! | `angle`     | feature_dim ≤ num_wires        | Rx(xᵢ) on wire i                |
//! | `amplitude` | feature_dim ≤ 2^num_wires      | normalized state preparation    |
//! | `basis`     | feature_dim ≤ num_wires        | X on wire i when xᵢ > 0.5       |

use serde::{Deserialize, Serialize};

use crate::error::{ArchitectureError, ConfigurationError, IrResult};
use crate::gate::{Gate, Instruction};
use crate::wire::WireId;

/// Supported data-encoding schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingScheme {
    /// One rotation angle per feature.
    Angle,
    /// Features become state amplitudes (log-many wires).
    Amplitude,
    /// Thresholded features become basis-state bit flips.
    Basis,
}

impl EncodingScheme {
    /// Scheme name as it appears in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            EncodingScheme::Angle => "angle",
            EncodingScheme::Amplitude => "amplitude",
            EncodingScheme::Basis => "basis",
        }
    }

    /// Largest feature dimension this scheme can encode on `num_wires` wires.
    fn max_feature_dim(&self, num_wires: u32) -> usize {
        match self {
            EncodingScheme::Angle | EncodingScheme::Basis => num_wires as usize,
            // Amplitude encoding packs 2^n amplitudes into n wires. Cap the
            // shift so absurd wire counts saturate instead of overflowing.
            EncodingScheme::Amplitude => 1usize << num_wires.min(usize::BITS - 1),
        }
    }
}

/// Non-trainable layer mapping input features to gate angles or amplitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingLayer {
    scheme: EncodingScheme,
    feature_dim: usize,
    num_wires: u32,
}

impl EncodingLayer {
    /// Build an encoding layer for `feature_dim` features on `num_wires` wires.
    ///
    /// Fails with [`ConfigurationError`] when the feature dimension exceeds
    /// the wire budget of the chosen scheme.
    pub fn build(
        feature_dim: usize,
        scheme: EncodingScheme,
        num_wires: u32,
    ) -> Result<Self, ConfigurationError> {
        if feature_dim == 0 {
            return Err(ConfigurationError::EmptyFeatureDim);
        }
        let max = scheme.max_feature_dim(num_wires);
        if feature_dim > max {
            return Err(ConfigurationError::FeatureDimExceedsWires {
                feature_dim,
                scheme: scheme.name(),
                num_wires,
                max,
            });
        }
        Ok(Self {
            scheme,
            feature_dim,
            num_wires,
        })
    }

    /// The encoding scheme.
    pub fn scheme(&self) -> EncodingScheme {
        self.scheme
    }

    /// Feature dimension this layer encodes.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Wire count this layer was built for.
    pub fn num_wires(&self) -> u32 {
        self.num_wires
    }

    /// Wires this layer touches.
    pub fn qubit_span(&self) -> Vec<WireId> {
        match self.scheme {
            // Amplitude encoding prepares the full register.
            EncodingScheme::Amplitude => (0..self.num_wires).map(WireId).collect(),
            EncodingScheme::Angle | EncodingScheme::Basis => {
                (0..self.feature_dim as u32).map(WireId).collect()
            }
        }
    }

    /// Lower this layer against a concrete feature vector.
    pub fn instructions(&self, features: &[f64]) -> IrResult<Vec<Instruction>> {
        if features.len() != self.feature_dim {
            return Err(ArchitectureError::FeatureLengthMismatch {
                expected: self.feature_dim,
                got: features.len(),
            });
        }

        match self.scheme {
            EncodingScheme::Angle => Ok(features
                .iter()
                .enumerate()
                .map(|(i, &x)| Instruction::single(Gate::Rx(x), WireId(i as u32)))
                .collect()),

            EncodingScheme::Basis => Ok(features
                .iter()
                .enumerate()
                .filter(|&(_, &x)| x > 0.5)
                .map(|(i, _)| Instruction::single(Gate::X, WireId(i as u32)))
                .collect()),

            EncodingScheme::Amplitude => {
                let norm = features.iter().map(|x| x * x).sum::<f64>().sqrt();
                if norm == 0.0 {
                    return Err(ArchitectureError::ZeroNormInput);
                }
                let dim = 1usize << self.num_wires;
                let mut amplitudes = vec![0.0; dim];
                for (i, &x) in features.iter().enumerate() {
                    amplitudes[i] = x / norm;
                }
                let wires = (0..self.num_wires).map(WireId).collect();
                Ok(vec![Instruction::state_prep(amplitudes, wires)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::InstructionKind;

    #[test]
    fn test_angle_encoding_lowering() {
        let layer = EncodingLayer::build(3, EncodingScheme::Angle, 4).unwrap();
        let insts = layer.instructions(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(insts.len(), 3);
        assert_eq!(insts[1].gate().unwrap(), &Gate::Rx(0.2));
        assert_eq!(insts[1].wires, vec![WireId(1)]);
    }

    #[test]
    fn test_angle_encoding_wire_budget() {
        let err = EncodingLayer::build(5, EncodingScheme::Angle, 4).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::FeatureDimExceedsWires { max: 4, .. }
        ));
    }

    #[test]
    fn test_amplitude_encoding_budget_is_exponential() {
        // 4 features fit on 2 wires; 5 do not.
        assert!(EncodingLayer::build(4, EncodingScheme::Amplitude, 2).is_ok());
        assert!(EncodingLayer::build(5, EncodingScheme::Amplitude, 2).is_err());
    }

    #[test]
    fn test_amplitude_encoding_normalizes_and_pads() {
        let layer = EncodingLayer::build(2, EncodingScheme::Amplitude, 2).unwrap();
        let insts = layer.instructions(&[3.0, 4.0]).unwrap();
        assert_eq!(insts.len(), 1);
        match &insts[0].kind {
            InstructionKind::StatePrep(amps) => {
                assert_eq!(amps.len(), 4);
                assert!((amps[0] - 0.6).abs() < 1e-12);
                assert!((amps[1] - 0.8).abs() < 1e-12);
                assert_eq!(amps[2], 0.0);
                assert_eq!(amps[3], 0.0);
            }
            other => panic!("expected StatePrep, got {other:?}"),
        }
    }

    #[test]
    fn test_amplitude_encoding_rejects_zero_vector() {
        let layer = EncodingLayer::build(2, EncodingScheme::Amplitude, 1).unwrap();
        assert!(matches!(
            layer.instructions(&[0.0, 0.0]),
            Err(ArchitectureError::ZeroNormInput)
        ));
    }

    #[test]
    fn test_basis_encoding_thresholds() {
        let layer = EncodingLayer::build(3, EncodingScheme::Basis, 3).unwrap();
        let insts = layer.instructions(&[0.9, 0.1, 1.0]).unwrap();
        let flipped: Vec<_> = insts.iter().map(|i| i.wires[0]).collect();
        assert_eq!(flipped, vec![WireId(0), WireId(2)]);
    }

    #[test]
    fn test_feature_length_mismatch() {
        let layer = EncodingLayer::build(3, EncodingScheme::Angle, 3).unwrap();
        assert!(matches!(
            layer.instructions(&[0.1]),
            Err(ArchitectureError::FeatureLengthMismatch {
                expected: 3,
                got: 1
            })
        ));
    }

    #[test]
    fn test_deterministic_lowering() {
        let layer = EncodingLayer::build(2, EncodingScheme::Angle, 2).unwrap();
        let a = layer.instructions(&[0.4, -0.4]).unwrap();
        let b = layer.instructions(&[0.4, -0.4]).unwrap();
        assert_eq!(a, b);
    }
}
