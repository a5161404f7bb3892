//! Trainable variational layer.
//!
//! A variational stack is `depth` repeated blocks; each block applies a
//! rotation sub-layer (one trainable angle per wire per axis) followed by a
//! fixed-topology entangling sub-layer. The stack drives the Parameter Vector
//! length: `depth × num_wires × rotation_axes`.
//!
//! Axis sequences follow the strongly-entangling template convention:
//! 1 axis → Ry; 2 axes → Ry, Rz; 3 axes → Rz, Ry, Rz (general rotation).

use serde::{Deserialize, Serialize};

use crate::error::{ArchitectureError, ConfigurationError, IrResult};
use crate::gate::{Gate, Instruction};
use crate::wire::WireId;

/// Fixed two-wire entangling topology applied after each rotation sub-layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntanglingPattern {
    /// CX chain: wire w controls wire w+1.
    Linear,
    /// Linear chain plus a wrap-around CX from the last wire to wire 0.
    Ring,
    /// CX for every ordered pair (i, j) with i < j.
    AllToAll,
}

impl EntanglingPattern {
    /// Pattern name as it appears in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            EntanglingPattern::Linear => "linear",
            EntanglingPattern::Ring => "ring",
            EntanglingPattern::AllToAll => "all_to_all",
        }
    }

    /// Control/target pairs for `num_wires` wires.
    fn pairs(&self, num_wires: u32) -> Vec<(WireId, WireId)> {
        match self {
            EntanglingPattern::Linear => (0..num_wires - 1)
                .map(|w| (WireId(w), WireId(w + 1)))
                .collect(),
            EntanglingPattern::Ring => (0..num_wires)
                .map(|w| (WireId(w), WireId((w + 1) % num_wires)))
                .collect(),
            EntanglingPattern::AllToAll => {
                let mut pairs = vec![];
                for i in 0..num_wires {
                    for j in (i + 1)..num_wires {
                        pairs.push((WireId(i), WireId(j)));
                    }
                }
                pairs
            }
        }
    }
}

/// One trainable block: rotations on every wire, then entanglers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationalLayer {
    num_wires: u32,
    rotation_axes: u8,
    entangling: EntanglingPattern,
    /// Index of this block's first slot in the flat Parameter Vector.
    param_offset: usize,
}

impl VariationalLayer {
    /// Build a stack of `depth` blocks with contiguous parameter offsets.
    ///
    /// Fails with [`ConfigurationError`] if `depth < 1`, `num_wires < 2`
    /// (entanglement needs two wires), or `rotation_axes` is outside `1..=3`.
    pub fn build_stack(
        num_wires: u32,
        depth: usize,
        rotation_axes: u8,
        entangling: EntanglingPattern,
    ) -> Result<Vec<Self>, ConfigurationError> {
        if depth < 1 {
            return Err(ConfigurationError::InvalidDepth(depth));
        }
        if num_wires < 2 {
            return Err(ConfigurationError::TooFewWires(num_wires));
        }
        if !(1..=3).contains(&rotation_axes) {
            return Err(ConfigurationError::InvalidRotationAxes(rotation_axes));
        }

        let per_block = num_wires as usize * rotation_axes as usize;
        Ok((0..depth)
            .map(|block| Self {
                num_wires,
                rotation_axes,
                entangling,
                param_offset: block * per_block,
            })
            .collect())
    }

    /// Wire count this block was built for.
    pub fn num_wires(&self) -> u32 {
        self.num_wires
    }

    /// Rotation axes per wire (1–3).
    pub fn rotation_axes(&self) -> u8 {
        self.rotation_axes
    }

    /// Entangling topology of this block.
    pub fn entangling(&self) -> EntanglingPattern {
        self.entangling
    }

    /// Offset of this block's first slot in the Parameter Vector.
    pub fn param_offset(&self) -> usize {
        self.param_offset
    }

    /// Trainable parameter count of this block.
    pub fn parameter_count(&self) -> usize {
        self.num_wires as usize * self.rotation_axes as usize
    }

    /// Parameter shape of this block: `[num_wires, rotation_axes]`.
    pub fn parameter_shape(&self) -> Vec<usize> {
        vec![self.num_wires as usize, self.rotation_axes as usize]
    }

    /// Wires this block touches (all of them).
    pub fn qubit_span(&self) -> Vec<WireId> {
        (0..self.num_wires).map(WireId).collect()
    }

    fn rotation_gate(&self, axis: u8, theta: f64) -> Gate {
        match (self.rotation_axes, axis) {
            (1, 0) => Gate::Ry(theta),
            (2, 0) => Gate::Ry(theta),
            (2, 1) => Gate::Rz(theta),
            (3, 0) => Gate::Rz(theta),
            (3, 1) => Gate::Ry(theta),
            (3, 2) => Gate::Rz(theta),
            _ => unreachable!("axis index out of range for configured axes"),
        }
    }

    /// Lower this block against the full Parameter Vector.
    pub fn instructions(&self, parameters: &[f64]) -> IrResult<Vec<Instruction>> {
        let end = self.param_offset + self.parameter_count();
        if parameters.len() < end {
            return Err(ArchitectureError::ParameterLengthMismatch {
                expected: end,
                got: parameters.len(),
            });
        }

        let axes = self.rotation_axes as usize;
        let mut insts = Vec::with_capacity(self.parameter_count() + self.num_wires as usize);

        for w in 0..self.num_wires {
            for a in 0..axes {
                let slot = self.param_offset + w as usize * axes + a;
                insts.push(Instruction::single(
                    self.rotation_gate(a as u8, parameters[slot]),
                    WireId(w),
                ));
            }
        }
        for (control, target) in self.entangling.pairs(self.num_wires) {
            insts.push(Instruction::two(Gate::CX, control, target));
        }
        Ok(insts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_parameter_count_law() {
        for (wires, depth, axes) in [(2u32, 1usize, 1u8), (4, 2, 3), (5, 3, 2)] {
            let stack =
                VariationalLayer::build_stack(wires, depth, axes, EntanglingPattern::Linear)
                    .unwrap();
            let total: usize = stack.iter().map(|l| l.parameter_count()).sum();
            assert_eq!(total, wires as usize * axes as usize * depth);
        }
    }

    #[test]
    fn test_contiguous_offsets() {
        let stack =
            VariationalLayer::build_stack(3, 4, 2, EntanglingPattern::Ring).unwrap();
        let mut expected = 0;
        for layer in &stack {
            assert_eq!(layer.param_offset(), expected);
            expected += layer.parameter_count();
        }
    }

    #[test]
    fn test_invalid_depth() {
        assert!(matches!(
            VariationalLayer::build_stack(3, 0, 2, EntanglingPattern::Linear),
            Err(ConfigurationError::InvalidDepth(0))
        ));
    }

    #[test]
    fn test_too_few_wires() {
        assert!(matches!(
            VariationalLayer::build_stack(1, 2, 2, EntanglingPattern::Linear),
            Err(ConfigurationError::TooFewWires(1))
        ));
    }

    #[test]
    fn test_invalid_axes() {
        assert!(matches!(
            VariationalLayer::build_stack(3, 2, 4, EntanglingPattern::Linear),
            Err(ConfigurationError::InvalidRotationAxes(4))
        ));
    }

    #[test]
    fn test_entangler_counts() {
        assert_eq!(EntanglingPattern::Linear.pairs(4).len(), 3);
        assert_eq!(EntanglingPattern::Ring.pairs(4).len(), 4);
        assert_eq!(EntanglingPattern::AllToAll.pairs(4).len(), 6);
    }

    #[test]
    fn test_lowering_structure() {
        // 2 wires × 2 axes + 1 linear entangler = 5 instructions.
        let stack =
            VariationalLayer::build_stack(2, 1, 2, EntanglingPattern::Linear).unwrap();
        let insts = stack[0].instructions(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(insts.len(), 5);
        assert_eq!(insts[0].gate().unwrap(), &Gate::Ry(0.1));
        assert_eq!(insts[1].gate().unwrap(), &Gate::Rz(0.2));
        assert_eq!(insts[4].gate().unwrap(), &Gate::CX);
    }

    #[test]
    fn test_lowering_reads_own_slice() {
        let stack =
            VariationalLayer::build_stack(2, 2, 1, EntanglingPattern::Linear).unwrap();
        let params = [0.0, 0.0, 0.5, -0.5];
        let insts = stack[1].instructions(&params).unwrap();
        assert_eq!(insts[0].gate().unwrap(), &Gate::Ry(0.5));
        assert_eq!(insts[1].gate().unwrap(), &Gate::Ry(-0.5));
    }

    #[test]
    fn test_short_parameter_vector() {
        let stack =
            VariationalLayer::build_stack(2, 1, 3, EntanglingPattern::Linear).unwrap();
        assert!(matches!(
            stack[0].instructions(&[0.0; 4]),
            Err(ArchitectureError::ParameterLengthMismatch {
                expected: 6,
                got: 4
            })
        ));
    }
}
