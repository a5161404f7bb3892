//! Integration tests for architecture assembly across layer kinds.

use grani_ir::{
    Architecture, ArchitectureError, EncodingLayer, EncodingScheme, EntanglingPattern,
    InitPolicy, InstructionKind, LayerKind, MeasurementLayer, VariationalLayer,
};

fn assemble(
    feature_dim: usize,
    scheme: EncodingScheme,
    num_wires: u32,
    depth: usize,
    axes: u8,
    pattern: EntanglingPattern,
    outputs: u32,
) -> Result<Architecture, ArchitectureError> {
    let encoding = EncodingLayer::build(feature_dim, scheme, num_wires)?;
    let stack = VariationalLayer::build_stack(num_wires, depth, axes, pattern)?;
    let measurement = MeasurementLayer::first_wires(outputs)?;
    Architecture::assemble(encoding, stack, measurement, InitPolicy::default())
}

// ---------------------------------------------------------------------------
// Manifest invariants
// ---------------------------------------------------------------------------

#[test]
fn manifest_layers_are_ordered_encoding_variational_measurement() {
    let arch = assemble(
        4,
        EncodingScheme::Angle,
        4,
        3,
        2,
        EntanglingPattern::Ring,
        1,
    )
    .unwrap();
    let kinds: Vec<_> = arch.manifest().layers.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LayerKind::Encoding,
            LayerKind::Variational,
            LayerKind::Variational,
            LayerKind::Variational,
            LayerKind::Measurement,
        ]
    );
}

#[test]
fn manifest_spans_stay_inside_declared_wires() {
    let arch = assemble(
        3,
        EncodingScheme::Amplitude,
        3,
        2,
        3,
        EntanglingPattern::AllToAll,
        2,
    )
    .unwrap();
    let manifest = arch.manifest();
    for layer in &manifest.layers {
        for wire in &layer.qubit_span {
            assert!(wire.0 < manifest.num_wires);
        }
    }
}

#[test]
fn manifest_parameter_count_matches_descriptor_sum() {
    let arch = assemble(
        5,
        EncodingScheme::Angle,
        5,
        4,
        3,
        EntanglingPattern::Linear,
        1,
    )
    .unwrap();
    let manifest = arch.manifest();
    let sum: usize = manifest.layers.iter().map(|l| l.parameter_count()).sum();
    assert_eq!(sum, manifest.parameter_count);
    assert_eq!(manifest.parameter_count, 5 * 3 * 4);
}

#[test]
fn manifest_survives_json_roundtrip() {
    let arch = assemble(
        2,
        EncodingScheme::Basis,
        4,
        1,
        1,
        EntanglingPattern::Ring,
        4,
    )
    .unwrap();
    let manifest = arch.manifest();
    let json = serde_json::to_string(&manifest).unwrap();
    let back: grani_ir::ArchitectureManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(manifest, back);
}

#[test]
fn architecture_survives_json_roundtrip() {
    let arch = assemble(
        4,
        EncodingScheme::Angle,
        4,
        2,
        3,
        EntanglingPattern::Linear,
        1,
    )
    .unwrap();
    let json = serde_json::to_string(&arch).unwrap();
    let back: Architecture = serde_json::from_str(&json).unwrap();
    assert_eq!(arch, back);
    assert_eq!(arch.manifest(), back.manifest());
}

// ---------------------------------------------------------------------------
// Lowering
// ---------------------------------------------------------------------------

#[test]
fn amplitude_architecture_lowers_to_state_prep_then_rotations() {
    let arch = assemble(
        4,
        EncodingScheme::Amplitude,
        2,
        1,
        1,
        EntanglingPattern::Linear,
        1,
    )
    .unwrap();
    let insts = arch
        .lower(&[0.5, 0.5, 0.5, 0.5], &vec![0.0; arch.parameter_count()])
        .unwrap();
    assert!(matches!(insts[0].kind, InstructionKind::StatePrep(_)));
    assert_eq!(insts[1].gate().unwrap().name(), "ry");
}

#[test]
fn lowering_is_deterministic() {
    let arch = assemble(
        4,
        EncodingScheme::Angle,
        4,
        2,
        2,
        EntanglingPattern::Ring,
        2,
    )
    .unwrap();
    let params: Vec<f64> = (0..arch.parameter_count()).map(|i| i as f64 * 0.01).collect();
    let features = [0.3, -0.1, 0.7, 0.2];
    assert_eq!(
        arch.lower(&features, &params).unwrap(),
        arch.lower(&features, &params).unwrap()
    );
}
