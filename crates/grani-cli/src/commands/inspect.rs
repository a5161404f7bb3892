//! Inspect command implementation.
//!
//! `grani inspect --model <model.json>`

use anyhow::Context;
use console::style;

use grani_train::ModelSnapshot;

/// Execute the inspect command.
pub fn execute(model_path: &str) -> anyhow::Result<()> {
    let snapshot = ModelSnapshot::load(model_path)
        .with_context(|| format!("loading snapshot from {model_path}"))?;
    let manifest = snapshot.manifest();

    println!("{}", style("Model Snapshot").bold().underlined());
    println!("  Schema:      v{}", snapshot.schema_version);
    println!("  Created:     {}", snapshot.created_at.to_rfc3339());
    if let Some(run_id) = snapshot.run_id {
        println!("  Run:         {run_id}");
    }
    println!("  Task:        {}", snapshot.task.name());
    println!("  Wires:       {}", manifest.num_wires);
    println!("  Parameters:  {}", manifest.parameter_count);
    if let Some(best) = snapshot.best_loss {
        println!("  Best loss:   {best:.6}");
    }
    println!(
        "  Optimizer:   {} (lr {})",
        snapshot.hyperparameters.optimizer.kind.name(),
        snapshot.hyperparameters.optimizer.learning_rate
    );

    println!();
    println!("{}", style("Layers").bold().underlined());
    for (index, layer) in manifest.layers.iter().enumerate() {
        let span = layer
            .qubit_span
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let shape = if layer.parameter_shape.is_empty() {
            "-".to_string()
        } else {
            format!("{:?}", layer.parameter_shape)
        };
        println!("  {index:>2}  {:<12} params {shape:<10} span [{span}]", layer.kind);
    }
    Ok(())
}
