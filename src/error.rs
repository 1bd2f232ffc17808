use std::path::PathBuf;

use crate::game::{Action, MoveError};

/// Errors that can occur during checkpoint and model operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("no 'latest' checkpoint recorded in {0}")]
    NoLatest(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort an episode or a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("actor {actor} selected illegal action {action} (legal: {legal:?})")]
    IllegalAction {
        actor: usize,
        action: Action,
        legal: Vec<Action>,
    },

    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveError),

    #[error("game expects {expected} policies, got {got}")]
    ActorCountMismatch { expected: usize, got: usize },

    #[error("training diverged at step {step}: loss = {loss}")]
    Divergence { step: usize, loss: f32 },

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to write replay {path}: {message}")]
    Replay { path: PathBuf, message: String },

    #[error("participant setup failed: {0}")]
    Setup(#[from] ConfigError),
}

impl TrainingError {
    /// True when resume found no `latest` checkpoint at all. Any other
    /// checkpoint failure means a checkpoint exists but is unusable.
    pub fn is_missing_checkpoint(&self) -> bool {
        matches!(self, TrainingError::Checkpoint(CheckpointError::NoLatest(_)))
    }
}

/// Errors that can occur when loading configuration or building participants.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),

    #[error("no policy registered under '{name}' (known: {known:?})")]
    UnknownPolicy { name: String, known: Vec<String> },

    #[error("invalid parameters for policy '{policy}': {source}")]
    InvalidParams {
        policy: String,
        source: toml::de::Error,
    },

    #[error("failed to load model for '{name}': {source}")]
    ModelLoad {
        name: String,
        source: CheckpointError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_error_display() {
        let err = CheckpointError::NoLatest(PathBuf::from("checkpoints"));
        assert_eq!(
            err.to_string(),
            "no 'latest' checkpoint recorded in checkpoints"
        );
    }

    #[test]
    fn test_training_error_display() {
        let err = TrainingError::IllegalAction {
            actor: 1,
            action: Action::new(0, 0),
            legal: vec![Action::new(2, 2)],
        };
        assert_eq!(
            err.to_string(),
            "actor 1 selected illegal action (0, 0) (legal: [Action { row: 2, col: 2 }])"
        );
    }

    #[test]
    fn test_move_error_converts() {
        let err: TrainingError = MoveError::Occupied(Action::new(1, 1)).into();
        assert_eq!(err.to_string(), "invalid move: cell (1, 1) is already occupied");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("dqn.learning_rate must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: dqn.learning_rate must be > 0"
        );
    }
}
