use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (written with defaults if missing)
    #[arg(long, default_value = "neuroplot.toml", global = true)]
    pub config: PathBuf,

    /// Skip titles, axes and tick labels (overrides config)
    #[arg(long, default_value_t = false, global = true)]
    pub bare: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scatter latent points colored by each label column
    Latent {
        /// Latent points, .npy of shape [n_samples, latent_dim]
        #[arg(long)]
        points: PathBuf,
        /// Label table, .csv with a header row
        #[arg(long)]
        labels: PathBuf,
        /// Output image path
        #[arg(long)]
        out: PathBuf,
    },
    /// Load cached (or simulate missing) activations and log a summary
    Activations {
        /// Comma-separated epochs, e.g. 0,5,10
        #[arg(long, value_delimiter = ',', required = true)]
        epochs: Vec<u32>,
        /// Agent model: single or dual
        #[arg(long, default_value = "single")]
        agent: String,
        /// Do not log the summary
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Plot trajectory-averaged rate maps of randomly sampled cells
    RateMaps {
        #[arg(long)]
        epoch: u32,
        /// Agent model: single or dual
        #[arg(long, default_value = "single")]
        agent: String,
        #[arg(long, default_value_t = 16)]
        num_plots: usize,
        /// Output image path
        #[arg(long)]
        out: PathBuf,
        /// Seed for cell sampling (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
}
