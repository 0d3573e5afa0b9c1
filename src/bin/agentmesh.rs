use std::path::PathBuf;

use agentmesh::utils::LoggingConfig;
use agentmesh::{AgentFactoryRegistry, EnvConfig, SystemConfig};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentmesh", version, about = "AgentMesh CLI", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one orchestration and print the final system state as JSON.
    Run {
        #[arg(long)]
        task: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        rounds: Option<u32>,
        /// Seed for the analyst's random trend provider.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// List the builtin agent kinds usable in a config file.
    Kinds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            task,
            config,
            rounds,
            seed,
            pretty,
        } => handle_run(task, config, rounds, seed, pretty).await?,
        Command::Kinds => handle_kinds(),
    }
    Ok(())
}

async fn handle_run(
    task: String,
    config: Option<PathBuf>,
    rounds: Option<u32>,
    seed: Option<u64>,
    pretty: bool,
) -> anyhow::Result<()> {
    let mut system = match config {
        Some(path) => SystemConfig::from_path(&path)?,
        None => SystemConfig::market_analysis(),
    };
    system.orchestration = EnvConfig::apply(system.orchestration)?;
    if let Some(rounds) = rounds {
        system.orchestration.rounds = rounds;
    }
    if let Some(seed) = seed {
        system = system.with_analyst_seed(seed)?;
    }

    let coordinator = system.build(&AgentFactoryRegistry::with_builtins())?;
    let state = coordinator.orchestrate(&task).await;

    let content = if pretty {
        serde_json::to_string_pretty(&state)?
    } else {
        serde_json::to_string(&state)?
    };
    println!("{content}");
    Ok(())
}

fn handle_kinds() {
    let registry = AgentFactoryRegistry::with_builtins();
    for kind in registry.kinds() {
        println!("{kind}");
    }
}
