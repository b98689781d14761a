// Entry point: dispatches the plotting and loading subcommands.
use std::error::Error;

use clap::Parser;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use neuroplot::activations::{ActivationLoader, AgentType, CommandSimulator, plot_rate_map};
use neuroplot::cli::{Args, Command};
use neuroplot::config::AppConfig;
use neuroplot::latent::{LabelTable, plot_save_latent_space, read_points};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load_or_default(&args.config);
    if args.bare {
        config.plot.annotate = false;
    }

    match args.command {
        Command::Latent {
            points,
            labels,
            out,
        } => {
            let points = read_points(&points)?;
            let labels = LabelTable::read_csv(&labels)?;
            plot_save_latent_space(
                &out,
                points.view(),
                &labels,
                &config.palette_registry(),
                &config.plot,
            )?;
            println!("Saved latent space plot to {}", out.display());
        }
        Command::Activations {
            epochs,
            agent,
            quiet,
        } => {
            let mut loader = loader_for(&config);
            let loaded = loader.load_activations(&epochs, &agent, !quiet)?;
            if let Some(agent) = loaded.agent {
                info!("cache dir: {}", loader.layout().dir(agent).display());
            }
            println!("Loaded {} epoch(s) of {agent} agent model", loaded.len());
        }
        Command::RateMaps {
            epoch,
            agent,
            num_plots,
            out,
            seed,
        } => {
            let agent: AgentType = agent.parse()?;
            let loaded = loader_for(&config).load(&[epoch], agent, false)?;
            let seed = seed.unwrap_or_else(|| rand::rng().random());
            let mut rng = StdRng::seed_from_u64(seed);
            let idxs = plot_rate_map(
                &out,
                num_plots,
                &loaded.activations[0],
                &mut rng,
                &config.rate_map,
                &config.plot,
            )?;
            println!("Saved rate maps of cells {idxs:?} (seed {seed}) to {}", out.display());
        }
    }
    Ok(())
}

fn loader_for(config: &AppConfig) -> ActivationLoader<CommandSimulator> {
    ActivationLoader::new(
        &config.cache,
        config.run.clone(),
        CommandSimulator::from_config(&config.simulator),
    )
}
