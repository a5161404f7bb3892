//! Error types for architecture construction and lowering.

use crate::wire::WireId;
use thiserror::Error;

/// Invalid or inconsistent hyperparameters, detected before any training
/// step. Never retried: a `ConfigurationError` indicates a caller mistake
/// and aborts construction immediately.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// Feature dimension does not fit the wire budget of the chosen scheme.
    #[error(
        "feature dimension {feature_dim} exceeds the {scheme} encoding budget \
         of {max} on {num_wires} wires"
    )]
    FeatureDimExceedsWires {
        /// Requested feature dimension.
        feature_dim: usize,
        /// Encoding scheme name.
        scheme: &'static str,
        /// Declared wire count.
        num_wires: u32,
        /// Maximum feature dimension the scheme supports on those wires.
        max: usize,
    },

    /// Feature dimension must be positive.
    #[error("feature dimension must be at least 1")]
    EmptyFeatureDim,

    /// Variational stacks need at least one block.
    #[error("variational depth must be at least 1, got {0}")]
    InvalidDepth(usize),

    /// Entanglement requires at least two wires.
    #[error("entanglement requires at least 2 wires, got {0}")]
    TooFewWires(u32),

    /// Rotation sub-layers support one to three axes per wire.
    #[error("rotation axes must be between 1 and 3, got {0}")]
    InvalidRotationAxes(u8),

    /// Measurement layers must read at least one wire.
    #[error("measurement layer must read at least one wire")]
    EmptyMeasurement,

    /// Uniform initialization needs a non-empty range.
    #[error("uniform initialization range is empty: low {low} >= high {high}")]
    EmptyInitRange {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },

    /// Catch-all for option validation outside this crate (training
    /// hyperparameters, CLI config files).
    #[error("invalid value for `{option}`: {reason}")]
    InvalidOption {
        /// Name of the offending configuration option.
        option: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigurationError {
    /// Convenience constructor for [`ConfigurationError::InvalidOption`].
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Layer composition inconsistency detected during assembly or lowering.
/// Never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchitectureError {
    /// A layer disagrees with the architecture about the wire count.
    #[error("{layer} layer spans {got} wires, architecture declares {expected}")]
    WireCountMismatch {
        /// Which layer kind disagreed.
        layer: &'static str,
        /// Declared architecture wire count.
        expected: u32,
        /// Wire count the layer was built for.
        got: u32,
    },

    /// A layer references a wire outside the declared wire count.
    #[error("{layer} layer references wire {wire} outside declared wire count {num_wires}")]
    WireOutOfRange {
        /// Which layer kind referenced the wire.
        layer: &'static str,
        /// The out-of-range wire.
        wire: WireId,
        /// Declared architecture wire count.
        num_wires: u32,
    },

    /// Variational parameter slots must tile the parameter vector.
    #[error("parameter slots are not contiguous: expected offset {expected}, found {found}")]
    NonContiguousParameters {
        /// Offset the next block should start at.
        expected: usize,
        /// Offset the block actually carries.
        found: usize,
    },

    /// Parameter vector length disagrees with the manifest.
    #[error("parameter vector has length {got}, manifest requires {expected}")]
    ParameterLengthMismatch {
        /// Length the manifest requires.
        expected: usize,
        /// Length supplied.
        got: usize,
    },

    /// Input feature vector length disagrees with the encoding layer.
    #[error("input has {got} features, encoding expects {expected}")]
    FeatureLengthMismatch {
        /// Feature dimension the encoding layer was built for.
        expected: usize,
        /// Length supplied.
        got: usize,
    },

    /// Amplitude encoding cannot normalize an all-zero vector.
    #[error("cannot amplitude-encode an all-zero feature vector")]
    ZeroNormInput,

    /// Construction failed before assembly.
    #[error(transparent)]
    Config(#[from] ConfigurationError),
}

/// Result type for architecture operations.
pub type IrResult<T> = Result<T, ArchitectureError>;
