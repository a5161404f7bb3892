//! Architecture assembly.
//!
//! An [`Architecture`] is the immutable composition encoding → variational
//! stack → measurement, validated at assembly time. It is pure data: the
//! static side of the circuit is the [`ArchitectureManifest`]; the executable
//! side is [`Architecture::lower`], which binds features and parameters into
//! a flat instruction list for an execution backend to interpret. Retraining
//! with a different depth or topology means assembling a new `Architecture`,
//! never mutating an existing one.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::encoding::EncodingLayer;
use crate::error::{ArchitectureError, ConfigurationError, IrResult};
use crate::gate::Instruction;
use crate::layer::{Layer, LayerDescriptor};
use crate::measurement::MeasurementLayer;
use crate::variational::VariationalLayer;
use crate::wire::WireId;

/// Parameter Vector initialization policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Independent uniform draws in `[low, high)`.
    Uniform {
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (exclusive).
        high: f64,
    },
    /// Every slot starts at zero.
    Zeros,
}

impl Default for InitPolicy {
    fn default() -> Self {
        // Small symmetric range keeps early gradients away from plateaus.
        InitPolicy::Uniform {
            low: -0.1,
            high: 0.1,
        }
    }
}

impl InitPolicy {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if let InitPolicy::Uniform { low, high } = self {
            if low >= high {
                return Err(ConfigurationError::EmptyInitRange {
                    low: *low,
                    high: *high,
                });
            }
        }
        Ok(())
    }
}

/// Static, immutable description of layer composition and parameter shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureManifest {
    /// Total declared wire count.
    pub num_wires: u32,
    /// Total trainable parameter slots across all layers.
    pub parameter_count: usize,
    /// Ordered layer descriptors.
    pub layers: Vec<LayerDescriptor>,
}

/// An assembled, executable quantum neural network architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    num_wires: u32,
    layers: Vec<Layer>,
    parameter_count: usize,
    output_dim: usize,
    init: InitPolicy,
}

impl Architecture {
    /// Assemble encoding → variational stack → measurement into one
    /// architecture.
    ///
    /// Validates wire-count consistency across all layers and contiguity of
    /// the variational parameter offsets; fails with [`ArchitectureError`]
    /// on any mismatch.
    pub fn assemble(
        encoding: EncodingLayer,
        variational: Vec<VariationalLayer>,
        measurement: MeasurementLayer,
        init: InitPolicy,
    ) -> IrResult<Self> {
        init.validate()?;

        let num_wires = encoding.num_wires();

        for block in &variational {
            if block.num_wires() != num_wires {
                return Err(ArchitectureError::WireCountMismatch {
                    layer: "variational",
                    expected: num_wires,
                    got: block.num_wires(),
                });
            }
        }

        // Parameter slots must tile [0, total) in block order.
        let mut expected_offset = 0;
        for block in &variational {
            if block.param_offset() != expected_offset {
                return Err(ArchitectureError::NonContiguousParameters {
                    expected: expected_offset,
                    found: block.param_offset(),
                });
            }
            expected_offset += block.parameter_count();
        }
        let parameter_count = expected_offset;

        for &wire in measurement.wires() {
            if wire.0 >= num_wires {
                return Err(ArchitectureError::WireOutOfRange {
                    layer: "measurement",
                    wire,
                    num_wires,
                });
            }
        }

        let output_dim = measurement.output_dim();
        let mut layers = Vec::with_capacity(variational.len() + 2);
        layers.push(Layer::Encoding(encoding));
        layers.extend(variational.into_iter().map(Layer::Variational));
        layers.push(Layer::Measurement(measurement));

        // Belt-and-braces span check for every layer, encoding included.
        for layer in &layers {
            for wire in layer.qubit_span() {
                if wire.0 >= num_wires {
                    return Err(ArchitectureError::WireOutOfRange {
                        layer: match layer.kind() {
                            crate::layer::LayerKind::Encoding => "encoding",
                            crate::layer::LayerKind::Variational => "variational",
                            crate::layer::LayerKind::Measurement => "measurement",
                        },
                        wire,
                        num_wires,
                    });
                }
            }
        }

        Ok(Self {
            num_wires,
            layers,
            parameter_count,
            output_dim,
            init,
        })
    }

    /// Total declared wire count.
    pub fn num_wires(&self) -> u32 {
        self.num_wires
    }

    /// Parameter Vector length this architecture requires.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Number of classical outputs per execution.
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// The layers in assembly order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The initialization policy selected at assembly.
    pub fn init_policy(&self) -> InitPolicy {
        self.init
    }

    /// Wires the measurement stage reads, in output order.
    pub fn measured_wires(&self) -> &[WireId] {
        match self.layers.last() {
            Some(Layer::Measurement(m)) => m.wires(),
            _ => unreachable!("assembly always ends with a measurement layer"),
        }
    }

    /// Build the Architecture Manifest.
    pub fn manifest(&self) -> ArchitectureManifest {
        ArchitectureManifest {
            num_wires: self.num_wires,
            parameter_count: self.parameter_count,
            layers: self.layers.iter().map(Layer::descriptor).collect(),
        }
    }

    /// Draw an initial Parameter Vector under the assembly-time policy.
    pub fn initial_parameters<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        match self.init {
            InitPolicy::Zeros => vec![0.0; self.parameter_count],
            InitPolicy::Uniform { low, high } => (0..self.parameter_count)
                .map(|_| rng.gen_range(low..high))
                .collect(),
        }
    }

    /// Bind features and parameters, producing the executable instruction
    /// list.
    ///
    /// Pure: the same inputs always lower to the same instructions.
    pub fn lower(&self, features: &[f64], parameters: &[f64]) -> IrResult<Vec<Instruction>> {
        if parameters.len() != self.parameter_count {
            return Err(ArchitectureError::ParameterLengthMismatch {
                expected: self.parameter_count,
                got: parameters.len(),
            });
        }

        let mut instructions = vec![];
        for layer in &self.layers {
            match layer {
                Layer::Encoding(e) => instructions.extend(e.instructions(features)?),
                Layer::Variational(v) => instructions.extend(v.instructions(parameters)?),
                // Readout is interpreted by the backend, not lowered.
                Layer::Measurement(_) => {}
            }
        }
        Ok(instructions)
    }
}
