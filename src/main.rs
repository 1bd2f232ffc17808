use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use tictactoe_rl::ai::{Policy, PolicyRegistry};
use tictactoe_rl::config::AppConfig;
use tictactoe_rl::engine::Engine;
use tictactoe_rl::error::ConfigError;
use tictactoe_rl::game::GridGame;

/// Play configured participants and write one replay file per game.
#[derive(Parser)]
#[command(name = "play", about = "Play tic-tac-toe games and record replays")]
struct Cli {
    /// Path to TOML configuration file (required to exist)
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of games
    #[arg(long)]
    games: Option<usize>,

    /// Override replay output directory
    #[arg(long)]
    replay_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(games) = cli.games {
        app_config.play.games = games;
    }
    if let Some(dir) = cli.replay_dir {
        app_config.play.replay_dir = dir;
    }

    let registry = PolicyRegistry::default();
    let mut policies = app_config
        .versus
        .players
        .iter()
        .map(|p| registry.build(&p.policy, &p.name, &p.params))
        .collect::<Result<Vec<Box<dyn Policy>>, ConfigError>>()
        .context("building participants")?;
    let n = policies.len();

    for index in 0..app_config.play.games {
        // Rotate seats so the first mover alternates between games.
        let mut seated: Vec<&mut dyn Policy> = policies
            .iter_mut()
            .map(|p| p.as_mut() as &mut dyn Policy)
            .collect();
        seated.rotate_left(index % n);

        let mut engine = Engine::new(GridGame::new(n), seated)?;
        let winner = engine.run().with_context(|| format!("playing game {}", index))?;
        let replay = engine.replay();

        let path = app_config
            .play
            .replay_dir
            .join(format!("replay_{:04}.json", index));
        replay
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;

        match winner {
            Some(actor) => info!(
                "game {}: {} wins in {} turns -> {}",
                index,
                replay.players[actor],
                replay.metrics.total_turns,
                path.display()
            ),
            None => info!(
                "game {}: draw after {} turns -> {}",
                index,
                replay.metrics.total_turns,
                path.display()
            ),
        }
    }
    Ok(())
}
