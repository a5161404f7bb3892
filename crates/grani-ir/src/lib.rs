//! Grani layered circuit representation.
//!
//! This crate provides the core data structures for describing quantum
//! neural network architectures in Grani: the three layer kinds, the
//! assembler that composes them, and the Architecture Manifest.
//!
//! # Overview
//!
//! An architecture is the fixed composition
//!
//! ```text
//!   encoding → variational block × depth → measurement
//! ```
//!
//! assembled once, validated once, and immutable afterwards. The same value
//! serves two roles:
//!
//! - **Static description** — [`ArchitectureManifest`] lists every layer with
//!   its parameter shape, qubit span, and options. Pure data, serializable,
//!   structurally comparable.
//! - **Executable graph** — [`Architecture::lower`] binds a feature vector
//!   and a Parameter Vector into a flat [`Instruction`] list that an
//!   execution backend interprets.
//!
//! # Example
//!
//! ```rust
//! use grani_ir::{
//!     Architecture, EncodingLayer, EncodingScheme, EntanglingPattern, InitPolicy,
//!     MeasurementLayer, VariationalLayer,
//! };
//!
//! let encoding = EncodingLayer::build(4, EncodingScheme::Angle, 4)?;
//! let stack = VariationalLayer::build_stack(4, 2, 3, EntanglingPattern::Linear)?;
//! let measurement = MeasurementLayer::first_wires(1)?;
//! let architecture =
//!     Architecture::assemble(encoding, stack, measurement, InitPolicy::default())?;
//!
//! assert_eq!(architecture.parameter_count(), 4 * 3 * 2);
//! # Ok::<(), grani_ir::ArchitectureError>(())
//! ```

pub mod architecture;
pub mod encoding;
pub mod error;
pub mod gate;
pub mod layer;
pub mod measurement;
pub mod variational;
pub mod wire;

pub use architecture::{Architecture, ArchitectureManifest, InitPolicy};
pub use encoding::{EncodingLayer, EncodingScheme};
pub use error::{ArchitectureError, ConfigurationError, IrResult};
pub use gate::{Gate, Instruction, InstructionKind};
pub use layer::{Layer, LayerDescriptor, LayerKind};
pub use measurement::MeasurementLayer;
pub use variational::{EntanglingPattern, VariationalLayer};
pub use wire::WireId;
