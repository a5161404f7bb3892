//! Gate and instruction types.
//!
//! Layers lower to a flat, ordered instruction list with every angle already
//! bound to a concrete value. Execution backends interpret instructions in
//! sequence; nothing here depends on any particular backend.

use serde::{Deserialize, Serialize};

use crate::wire::WireId;

/// A gate with concrete (bound) angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Rotation around the X axis.
    Rx(f64),
    /// Rotation around the Y axis.
    Ry(f64),
    /// Rotation around the Z axis.
    Rz(f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
}

impl Gate {
    /// Get the name of this gate (OpenQASM 3 naming).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H => "h",
            Gate::X => "x",
            Gate::Rx(_) => "rx",
            Gate::Ry(_) => "ry",
            Gate::Rz(_) => "rz",
            Gate::CX => "cx",
            Gate::CZ => "cz",
        }
    }

    /// Number of wires this gate acts on.
    #[inline]
    pub fn num_wires(&self) -> usize {
        match self {
            Gate::H | Gate::X | Gate::Rx(_) | Gate::Ry(_) | Gate::Rz(_) => 1,
            Gate::CX | Gate::CZ => 2,
        }
    }

    /// The rotation angle, if this is a rotation gate.
    pub fn angle(&self) -> Option<f64> {
        match self {
            Gate::Rx(theta) | Gate::Ry(theta) | Gate::Rz(theta) => Some(*theta),
            _ => None,
        }
    }
}

/// What an instruction does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Apply a gate.
    Gate(Gate),
    /// Prepare the spanned wires in the state with the given real amplitudes.
    ///
    /// Amplitudes are indexed by basis state, wire 0 least significant, and
    /// must already be L2-normalized with length `2^wires.len()`.
    StatePrep(Vec<f64>),
}

/// A gate or state preparation bound to concrete wires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation.
    pub kind: InstructionKind,
    /// The wires the operation acts on, in operand order.
    pub wires: Vec<WireId>,
}

impl Instruction {
    /// Create a single-wire gate instruction.
    pub fn single(gate: Gate, wire: WireId) -> Self {
        debug_assert_eq!(gate.num_wires(), 1);
        Self {
            kind: InstructionKind::Gate(gate),
            wires: vec![wire],
        }
    }

    /// Create a two-wire gate instruction (control first).
    pub fn two(gate: Gate, control: WireId, target: WireId) -> Self {
        debug_assert_eq!(gate.num_wires(), 2);
        Self {
            kind: InstructionKind::Gate(gate),
            wires: vec![control, target],
        }
    }

    /// Create a state-preparation instruction over the given wires.
    pub fn state_prep(amplitudes: Vec<f64>, wires: Vec<WireId>) -> Self {
        debug_assert_eq!(amplitudes.len(), 1 << wires.len());
        Self {
            kind: InstructionKind::StatePrep(amplitudes),
            wires,
        }
    }

    /// The gate, if this instruction is a gate application.
    pub fn gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            InstructionKind::StatePrep(_) => None,
        }
    }
}
