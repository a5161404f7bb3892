//! Error types for the backend crate.

use thiserror::Error;

/// Errors that can occur in backend operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// Architecture is wider than the backend supports.
    #[error("architecture requires {required} wires but backend '{backend}' supports {max}")]
    TooManyWires {
        /// Backend name.
        backend: String,
        /// Wire count the architecture declares.
        required: u32,
        /// Maximum wire count the backend supports.
        max: u32,
    },

    /// Backend cannot interpret an instruction kind.
    #[error("backend '{backend}' does not support {feature}")]
    Unsupported {
        /// Backend name.
        backend: String,
        /// Human-readable feature description.
        feature: String,
    },

    /// Upstream gradient length disagrees with the architecture output.
    #[error("upstream gradient has length {got}, architecture produces {expected} outputs")]
    UpstreamLengthMismatch {
        /// Output dimension of the architecture.
        expected: usize,
        /// Length supplied.
        got: usize,
    },

    /// Lowering the architecture failed.
    #[error(transparent)]
    Architecture(#[from] grani_ir::ArchitectureError),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
