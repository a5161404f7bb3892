//! Grani Command-Line Interface
//!
//! ```text
//!                    G R A N I
//!       Automatic Variational Quantum Networks
//!
//!   config in → architecture assembled → trained snapshot out
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{inspect, predict, train, version};

/// Grani - automatic construction and training of variational quantum networks
#[derive(Parser)]
#[command(name = "grani")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network from an experiment config and a dataset
    Train {
        /// Experiment config file (YAML)
        #[arg(short, long)]
        config: String,

        /// Training dataset (JSON: {"features": [[..]], "targets": [[..]]})
        #[arg(short, long)]
        data: String,

        /// Validation dataset (JSON, same layout)
        #[arg(long)]
        validation: Option<String>,

        /// Output snapshot file
        #[arg(short, long, default_value = "model.json")]
        output: String,

        /// Directory for periodic checkpoints
        #[arg(long)]
        checkpoint_dir: Option<String>,
    },

    /// Run a trained model over a feature file
    Predict {
        /// Model snapshot file
        #[arg(short, long)]
        model: String,

        /// Feature file (JSON: [[..], [..]])
        #[arg(short, long)]
        data: String,

        /// Emit class probabilities instead of predictions (classification)
        #[arg(long)]
        proba: bool,
    },

    /// Summarize a model snapshot
    Inspect {
        /// Model snapshot file
        #[arg(short, long)]
        model: String,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Train {
            config,
            data,
            validation,
            output,
            checkpoint_dir,
        } => train::execute(
            &config,
            &data,
            validation.as_deref(),
            &output,
            checkpoint_dir.as_deref(),
        ),
        Commands::Predict { model, data, proba } => predict::execute(&model, &data, proba),
        Commands::Inspect { model } => inspect::execute(&model),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
