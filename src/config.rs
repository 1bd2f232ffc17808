use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::ai::DqnConfig;
use crate::checkpoint::CheckpointManagerConfig;
use crate::error::ConfigError;
use crate::training::trainer::TrainerConfig;

/// One configured participant: which registered policy to build, its
/// display name and its construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub policy: String,
    pub name: String,
    #[serde(default)]
    pub params: toml::Table,
}

/// Head-to-head match settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersusConfig {
    pub rounds: usize,
    pub players: Vec<PlayerConfig>,
}

impl Default for VersusConfig {
    fn default() -> Self {
        VersusConfig {
            rounds: 100,
            players: vec![
                PlayerConfig {
                    policy: "random".into(),
                    name: "Random-1".into(),
                    params: toml::Table::new(),
                },
                PlayerConfig {
                    policy: "random".into(),
                    name: "Random-2".into(),
                    params: toml::Table::new(),
                },
            ],
        }
    }
}

/// Settings for the `play` binary. Participants come from `[versus]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub games: usize,
    pub replay_dir: PathBuf,
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            games: 1,
            replay_dir: PathBuf::from("replays"),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dqn: DqnConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
    pub versus: VersusConfig,
    pub play: PlayConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dqn = &self.dqn;
        if dqn.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "dqn.learning_rate must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&dqn.gamma) {
            return Err(ConfigError::Validation(
                "dqn.gamma must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_start) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_start must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_min) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_min must be in [0, 1]".into(),
            ));
        }
        if dqn.epsilon_min > dqn.epsilon_start {
            return Err(ConfigError::Validation(
                "dqn.epsilon_min must be <= dqn.epsilon_start".into(),
            ));
        }
        if dqn.epsilon_decay <= 0.0 || dqn.epsilon_decay > 1.0 {
            return Err(ConfigError::Validation(
                "dqn.epsilon_decay must be in (0, 1]".into(),
            ));
        }
        if dqn.batch_size == 0 {
            return Err(ConfigError::Validation(
                "dqn.batch_size must be > 0".into(),
            ));
        }
        if dqn.replay_capacity < dqn.batch_size {
            return Err(ConfigError::Validation(
                "dqn.replay_capacity must be >= dqn.batch_size".into(),
            ));
        }
        if dqn.update_target_steps == 0 {
            return Err(ConfigError::Validation(
                "dqn.update_target_steps must be > 0".into(),
            ));
        }
        if dqn.hidden_size == 0 {
            return Err(ConfigError::Validation(
                "dqn.hidden_size must be > 0".into(),
            ));
        }

        let training = &self.training;
        if training.num_episodes == 0 {
            return Err(ConfigError::Validation(
                "training.num_episodes must be > 0".into(),
            ));
        }
        if training.log_interval == 0
            || training.eval_interval == 0
            || training.checkpoint_interval == 0
        {
            return Err(ConfigError::Validation(
                "training intervals must be > 0".into(),
            ));
        }

        if self.versus.players.len() < 2 {
            return Err(ConfigError::Validation(
                "versus.players needs at least two entries".into(),
            ));
        }
        if self.versus.rounds == 0 {
            return Err(ConfigError::Validation(
                "versus.rounds must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
    }
}
