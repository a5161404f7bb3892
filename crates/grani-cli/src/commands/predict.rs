//! Predict command implementation.
//!
//! `grani predict --model <model.json> --data <features.json> [--proba]`

use anyhow::Context;

use grani_backend::{Backend, StatevectorBackend};
use grani_train::{CostModule, ModelSnapshot};

/// Execute the predict command.
pub fn execute(model_path: &str, data_path: &str, proba: bool) -> anyhow::Result<()> {
    let snapshot = ModelSnapshot::load(model_path)
        .with_context(|| format!("loading snapshot from {model_path}"))?;

    let raw = std::fs::read_to_string(data_path)
        .with_context(|| format!("reading features from {data_path}"))?;
    let features: Vec<Vec<f64>> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing features from {data_path}"))?;

    let backend = StatevectorBackend::new();
    let cost = CostModule::new(snapshot.task);

    let mut predictions = Vec::with_capacity(features.len());
    for row in &features {
        let outputs = backend.execute(&snapshot.architecture, &snapshot.parameters, row)?;
        let prediction = if proba {
            cost.probabilities(&outputs).ok_or_else(|| {
                anyhow::anyhow!(
                    "cannot predict probabilities for a {} model",
                    snapshot.task.name()
                )
            })?
        } else {
            cost.predict(&outputs)
        };
        predictions.push(prediction);
    }

    println!("{}", serde_json::to_string_pretty(&predictions)?);
    Ok(())
}
