//! Layer kinds and manifest descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

use crate::encoding::EncodingLayer;
use crate::measurement::MeasurementLayer;
use crate::variational::VariationalLayer;
use crate::wire::WireId;

/// The three layer kinds an architecture is composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Non-trainable data-encoding stage.
    Encoding,
    /// Trainable rotation + entangling block.
    Variational,
    /// Expectation readout stage.
    Measurement,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Encoding => write!(f, "encoding"),
            LayerKind::Variational => write!(f, "variational"),
            LayerKind::Measurement => write!(f, "measurement"),
        }
    }
}

/// A layer in assembly order. Closed set: every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    /// Data-encoding stage.
    Encoding(EncodingLayer),
    /// One trainable block.
    Variational(VariationalLayer),
    /// Expectation readout.
    Measurement(MeasurementLayer),
}

impl Layer {
    /// The kind of this layer.
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Encoding(_) => LayerKind::Encoding,
            Layer::Variational(_) => LayerKind::Variational,
            Layer::Measurement(_) => LayerKind::Measurement,
        }
    }

    /// Trainable parameter count of this layer.
    pub fn parameter_count(&self) -> usize {
        match self {
            Layer::Variational(v) => v.parameter_count(),
            Layer::Encoding(_) | Layer::Measurement(_) => 0,
        }
    }

    /// Wires this layer touches.
    pub fn qubit_span(&self) -> Vec<WireId> {
        match self {
            Layer::Encoding(e) => e.qubit_span(),
            Layer::Variational(v) => v.qubit_span(),
            Layer::Measurement(m) => m.wires().to_vec(),
        }
    }

    /// The manifest descriptor for this layer.
    pub fn descriptor(&self) -> LayerDescriptor {
        let (parameter_shape, config) = match self {
            Layer::Encoding(e) => (
                vec![],
                config_map(json!({
                    "scheme": e.scheme().name(),
                    "feature_dim": e.feature_dim(),
                })),
            ),
            Layer::Variational(v) => (
                v.parameter_shape(),
                config_map(json!({
                    "rotation_axes": v.rotation_axes(),
                    "entangling_pattern": v.entangling().name(),
                    "param_offset": v.param_offset(),
                })),
            ),
            Layer::Measurement(m) => (
                vec![],
                config_map(json!({
                    "observable": "pauli_z",
                    "wires": m.wires().iter().map(|w| w.0).collect::<Vec<_>>(),
                })),
            ),
        };
        LayerDescriptor {
            kind: self.kind(),
            parameter_shape,
            qubit_span: self.qubit_span(),
            config,
        }
    }
}

fn config_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("layer config is always a JSON object"),
    }
}

/// One entry in the Architecture Manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Layer kind.
    pub kind: LayerKind,
    /// Shape of the trainable parameter block; empty for non-trainable kinds.
    pub parameter_shape: Vec<usize>,
    /// Wires the layer touches.
    pub qubit_span: Vec<WireId>,
    /// Recognized per-kind options.
    pub config: Map<String, Value>,
}

impl LayerDescriptor {
    /// Total trainable slots described by `parameter_shape`.
    pub fn parameter_count(&self) -> usize {
        if self.parameter_shape.is_empty() {
            0
        } else {
            self.parameter_shape.iter().product()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingScheme;
    use crate::variational::EntanglingPattern;

    #[test]
    fn test_descriptor_shapes() {
        let enc = Layer::Encoding(EncodingLayer::build(2, EncodingScheme::Angle, 3).unwrap());
        assert_eq!(enc.descriptor().parameter_count(), 0);

        let stack =
            VariationalLayer::build_stack(3, 1, 2, EntanglingPattern::Linear).unwrap();
        let var = Layer::Variational(stack.into_iter().next().unwrap());
        let desc = var.descriptor();
        assert_eq!(desc.parameter_shape, vec![3, 2]);
        assert_eq!(desc.parameter_count(), 6);
        assert_eq!(desc.config["entangling_pattern"], "linear");
    }

    #[test]
    fn test_descriptor_kind_roundtrip() {
        let m = Layer::Measurement(MeasurementLayer::first_wires(2).unwrap());
        let desc = m.descriptor();
        assert_eq!(desc.kind, LayerKind::Measurement);
        assert_eq!(desc.qubit_span, vec![WireId(0), WireId(1)]);
    }
}
