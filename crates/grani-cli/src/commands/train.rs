//! Train command implementation.
//!
//! `grani train --config <experiment.yaml> --data <train.json> [--validation <val.json>] [--output <model.json>]`

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use grani_backend::StatevectorBackend;
use grani_train::{
    BatchSource, ExperimentConfig, InMemoryDataset, ModelSnapshot, RunStatus, Trainer,
};

/// Execute the train command.
pub fn execute(
    config_path: &str,
    data_path: &str,
    validation_path: Option<&str>,
    output_path: &str,
    checkpoint_dir: Option<&str>,
) -> anyhow::Result<()> {
    let config = ExperimentConfig::from_yaml_path(config_path)
        .with_context(|| format!("loading experiment config from {config_path}"))?;
    let architecture = config.build_architecture()?;
    let initial = config.initial_parameters(&architecture);

    let mut data = InMemoryDataset::from_json_path(data_path, config.training.batch_size)
        .with_context(|| format!("loading dataset from {data_path}"))?;
    let mut validation = validation_path
        .map(|path| {
            InMemoryDataset::from_json_path(path, config.training.batch_size)
                .with_context(|| format!("loading validation dataset from {path}"))
        })
        .transpose()?;

    info!(
        examples = data.num_examples(),
        batch_size = config.training.batch_size,
        "dataset loaded"
    );
    eprintln!(
        "{} {} task on {} wires, depth {}, {} parameters",
        style("Assembled").green().bold(),
        config.task.name(),
        architecture.num_wires(),
        config.network.depth,
        architecture.parameter_count(),
    );

    let bar = ProgressBar::new(config.training.max_epochs as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{bar:30.cyan/blue} epoch {pos}/{len}  loss {msg}",
        )
        .map_err(|e| anyhow::anyhow!("progress template: {e}"))?,
    );

    let backend = StatevectorBackend::new();
    let mut trainer = Trainer::new(
        &backend,
        architecture.clone(),
        config.task,
        config.training.clone(),
    )?;
    if let Some(dir) = checkpoint_dir {
        trainer = trainer.with_checkpoint_dir(dir);
    }
    let progress = bar.clone();
    trainer = trainer.with_epoch_hook(move |metrics| {
        progress.set_position(metrics.epoch as u64 + 1);
        progress.set_message(format!("{:.6}", metrics.best_loss));
    });

    let report = trainer.fit(
        &mut data,
        validation.as_mut().map(|v| v as &mut dyn BatchSource),
        initial,
    )?;
    bar.finish_and_clear();

    let status_label = match report.status {
        RunStatus::Converged => style("converged").green().bold(),
        RunStatus::EarlyStopped => style("early-stopped").yellow().bold(),
        RunStatus::Exhausted => style("exhausted").yellow().bold(),
        RunStatus::Diverged => style("diverged").red().bold(),
        RunStatus::Cancelled => style("cancelled").red().bold(),
    };
    eprintln!();
    eprintln!("{}", style("Training Summary").bold().underlined());
    eprintln!("  Run:         {}", report.run_id);
    eprintln!("  Status:      {status_label}");
    eprintln!(
        "  Epochs:      {} ({} steps)",
        report.history.len(),
        report.state.step
    );
    eprintln!("  Best loss:   {:.6}", report.state.best_loss);
    if let Some(detail) = &report.divergence {
        eprintln!("  Failure:     {detail}");
    }

    match ModelSnapshot::from_report(architecture, config.task, config.training, &report) {
        Some(snapshot) => {
            snapshot.save(output_path)?;
            eprintln!(
                "{} Snapshot written to {}",
                style("OK").green().bold(),
                output_path
            );
            Ok(())
        }
        None => anyhow::bail!(
            "run ended in {:?}; no usable snapshot (check --checkpoint-dir for prior checkpoints)",
            report.status
        ),
    }
}
