use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use tictactoe_rl::ai::PolicyRegistry;
use tictactoe_rl::config::AppConfig;
use tictactoe_rl::training::run_versus;

/// Play configured participants against each other and report win rates.
#[derive(Parser)]
#[command(name = "versus", about = "Head-to-head evaluation of tic-tac-toe policies")]
struct Cli {
    /// Path to TOML configuration file (required to exist)
    #[arg(long)]
    config: PathBuf,

    /// Override number of rounds
    #[arg(long)]
    rounds: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(rounds) = cli.rounds {
        app_config.versus.rounds = rounds;
    }

    let registry = PolicyRegistry::default();
    let versus = &app_config.versus;
    info!(
        "playing {} rounds between {}",
        versus.rounds,
        versus
            .players
            .iter()
            .map(|p| format!("{} ({})", p.name, p.policy))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let report = run_versus(&registry, &versus.players, versus.rounds).context("running match")?;
    println!("{report}");
    Ok(())
}
