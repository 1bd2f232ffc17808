use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use tictactoe_rl::config::AppConfig;
use tictactoe_rl::training::TrainingSession;

/// Train two DQN learners against each other.
#[derive(Parser)]
#[command(name = "train", about = "Train a tic-tac-toe DQN agent via self-play")]
struct Cli {
    /// Resume training from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Seed the learners and the evaluation opponent
    #[arg(long)]
    seed: Option<u64>,

    /// Override checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    if let Some(lr) = cli.lr {
        app_config.dqn.learning_rate = lr;
    }
    if let Some(seed) = cli.seed {
        app_config.dqn.seed = Some(seed);
    }
    if let Some(dir) = cli.checkpoint_dir {
        app_config.checkpoint.checkpoint_dir = dir;
    }
    app_config
        .validate()
        .context("validating configuration overrides")?;

    let mut session = TrainingSession::new(
        app_config.dqn.clone(),
        app_config.training.clone(),
        app_config.checkpoint.clone(),
    )
    .context("setting up training session")?;

    if cli.resume {
        match session.resume() {
            Ok(episode) => info!("continuing after episode {}", episode),
            Err(e) if e.is_missing_checkpoint() => {
                warn!("no checkpoint to resume from ({}), starting fresh", e)
            }
            Err(e) => return Err(e).context("resuming from latest checkpoint"),
        }
    }

    session.train().context("training")?;

    let report = session.evaluate().context("final evaluation")?;
    info!(
        "final eval vs Random: win {:.2} | draw {:.2}",
        report.win_rate(),
        report.draw_rate()
    );
    Ok(())
}
