//! Grani execution substrate.
//!
//! This crate defines the boundary between Grani's training core and the
//! circuit execution substrate, plus a local statevector implementation of
//! that boundary.
//!
//! # Core Components
//!
//! - **Contract**: [`Backend`] — synchronous `execute` / `gradient` over an
//!   assembled [`grani_ir::Architecture`], with [`Capabilities`]
//!   introspection.
//! - **Engine**: [`Statevector`] — exact 2^n-amplitude simulation of the
//!   grani instruction set.
//! - **Backend**: [`StatevectorBackend`] — the shipped local backend, with
//!   parameter-shift gradients.
//!
//! The training core holds a `&dyn Backend` and never looks behind the
//! trait; swapping in a hardware adapter or a batched remote service is a
//! matter of implementing two methods.

pub mod backend;
pub mod error;
pub mod simulator;
pub mod statevector;

pub use backend::{Backend, Capabilities};
pub use error::{BackendError, BackendResult};
pub use simulator::StatevectorBackend;
pub use statevector::Statevector;
