//! Statevector simulation engine.

use num_complex::Complex64;

use grani_ir::{Gate, Instruction, InstructionKind};

/// A statevector representing a quantum state.
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of wires.
    num_wires: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_wires: usize) -> Self {
        let size = 1 << num_wires;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_wires,
        }
    }

    /// Get the number of wires.
    pub fn num_wires(&self) -> usize {
        self.num_wires
    }

    /// Apply an instruction to the statevector.
    pub fn apply(&mut self, instruction: &Instruction) {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let wires: Vec<_> = instruction.wires.iter().map(|w| w.0 as usize).collect();
                self.apply_gate(gate, &wires);
            }
            InstructionKind::StatePrep(amplitudes) => {
                self.state_prep(amplitudes, instruction.wires.len());
            }
        }
    }

    fn apply_gate(&mut self, gate: &Gate, wires: &[usize]) {
        match gate {
            Gate::H => self.apply_h(wires[0]),
            Gate::X => self.apply_x(wires[0]),
            Gate::Rx(theta) => self.apply_rx(wires[0], *theta),
            Gate::Ry(theta) => self.apply_ry(wires[0], *theta),
            Gate::Rz(theta) => self.apply_rz(wires[0], *theta),
            Gate::CX => self.apply_cx(wires[0], wires[1]),
            Gate::CZ => self.apply_cz(wires[0], wires[1]),
        }
    }

    /// Overwrite the register with prepared real amplitudes.
    ///
    /// Only full-register preparation is supported; the encoding layer pads
    /// amplitudes to 2^num_wires before lowering. Wire 0 is the least
    /// significant bit of the basis index.
    fn state_prep(&mut self, amplitudes: &[f64], span: usize) {
        debug_assert_eq!(span, self.num_wires);
        debug_assert_eq!(amplitudes.len(), self.amplitudes.len());
        for (slot, &a) in self.amplitudes.iter_mut().zip(amplitudes) {
            *slot = Complex64::new(a, 0.0);
        }
    }

    // =========================================================================
    // Single-wire gate implementations
    // =========================================================================

    fn apply_x(&mut self, wire: usize) {
        let mask = 1 << wire;
        for i in 0..(1 << self.num_wires) {
            if i & mask == 0 {
                let j = i | mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_h(&mut self, wire: usize) {
        let mask = 1 << wire;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..(1 << self.num_wires) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_rx(&mut self, wire: usize, theta: f64) {
        let mask = 1 << wire;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        let neg_i_s = Complex64::new(0.0, -s);
        for i in 0..(1 << self.num_wires) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, wire: usize, theta: f64) {
        let mask = 1 << wire;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_wires) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, wire: usize, theta: f64) {
        let mask = 1 << wire;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for i in 0..(1 << self.num_wires) {
            if i & mask == 0 {
                self.amplitudes[i] *= phase_0;
            } else {
                self.amplitudes[i] *= phase_1;
            }
        }
    }

    // =========================================================================
    // Two-wire gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_wires) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_wires) {
            if (i & ctrl_mask != 0) && (i & tgt_mask != 0) {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    // =========================================================================
    // Readout
    // =========================================================================

    /// Pauli-Z expectation value on one wire: Σ |aᵢ|² · (−1)^bit.
    pub fn expectation_z(&self, wire: usize) -> f64 {
        let mask = 1 << wire;
        let mut expectation = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let p = amp.norm_sqr();
            if i & mask == 0 {
                expectation += p;
            } else {
                expectation -= p;
            }
        }
        expectation
    }

    /// Total probability mass; 1.0 up to floating-point error for any
    /// well-formed circuit.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grani_ir::WireId;
    use std::f64::consts::PI;

    #[test]
    fn test_ground_state_expectation() {
        let sv = Statevector::new(2);
        assert!((sv.expectation_z(0) - 1.0).abs() < 1e-12);
        assert!((sv.expectation_z(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_x_flips_expectation() {
        let mut sv = Statevector::new(1);
        sv.apply(&Instruction::single(Gate::X, WireId(0)));
        assert!((sv.expectation_z(0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_h_balances_expectation() {
        let mut sv = Statevector::new(1);
        sv.apply(&Instruction::single(Gate::H, WireId(0)));
        assert!(sv.expectation_z(0).abs() < 1e-12);
    }

    #[test]
    fn test_rx_pi_is_bit_flip() {
        let mut sv = Statevector::new(1);
        sv.apply(&Instruction::single(Gate::Rx(PI), WireId(0)));
        assert!((sv.expectation_z(0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ry_half_pi_balances() {
        let mut sv = Statevector::new(1);
        sv.apply(&Instruction::single(Gate::Ry(PI / 2.0), WireId(0)));
        assert!(sv.expectation_z(0).abs() < 1e-12);
    }

    #[test]
    fn test_rz_preserves_z_expectation() {
        let mut sv = Statevector::new(1);
        sv.apply(&Instruction::single(Gate::Ry(0.7), WireId(0)));
        let before = sv.expectation_z(0);
        sv.apply(&Instruction::single(Gate::Rz(1.3), WireId(0)));
        assert!((sv.expectation_z(0) - before).abs() < 1e-12);
    }

    #[test]
    fn test_cx_entangles() {
        // H on control then CX: Bell state, both wires balanced.
        let mut sv = Statevector::new(2);
        sv.apply(&Instruction::single(Gate::H, WireId(0)));
        sv.apply(&Instruction::two(Gate::CX, WireId(0), WireId(1)));
        assert!(sv.expectation_z(0).abs() < 1e-12);
        assert!(sv.expectation_z(1).abs() < 1e-12);
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_state_prep_sets_amplitudes() {
        let mut sv = Statevector::new(2);
        let amps = vec![0.0, 1.0, 0.0, 0.0]; // |01⟩, wire 0 set
        sv.apply(&Instruction::state_prep(amps, vec![WireId(0), WireId(1)]));
        assert!((sv.expectation_z(0) + 1.0).abs() < 1e-12);
        assert!((sv.expectation_z(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_norm_preserved_by_gates() {
        let mut sv = Statevector::new(3);
        for (gate, wire) in [
            (Gate::H, 0u32),
            (Gate::Rx(0.3), 1),
            (Gate::Ry(-1.1), 2),
            (Gate::Rz(2.2), 0),
        ] {
            sv.apply(&Instruction::single(gate, WireId(wire)));
        }
        sv.apply(&Instruction::two(Gate::CX, WireId(0), WireId(2)));
        sv.apply(&Instruction::two(Gate::CZ, WireId(1), WireId(2)));
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-10);
    }
}
