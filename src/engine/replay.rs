use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TrainingError;
use crate::game::{Action, GameMetrics};

/// One applied move as the engine saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub actor: usize,
    pub actor_name: String,
    pub action: Action,
    pub reward: f32,
}

/// Everything needed to re-render a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReplay {
    /// Display names, indexed by actor.
    pub players: Vec<String>,
    pub turns: Vec<TurnRecord>,
    pub metrics: GameMetrics,
}

impl GameReplay {
    /// Write as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), TrainingError> {
        let replay_err = |message: String| TrainingError::Replay {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| replay_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| replay_err(e.to_string()))?;
        fs::write(path, json).map_err(|e| replay_err(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let replay_err = |message: String| TrainingError::Replay {
            path: path.to_path_buf(),
            message,
        };
        let json = fs::read_to_string(path).map_err(|e| replay_err(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| replay_err(e.to_string()))
    }
}
