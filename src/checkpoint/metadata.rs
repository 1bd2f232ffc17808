use serde::{Deserialize, Serialize};

/// Evaluation snapshot recorded alongside a checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// Win rate against the evaluation opponent.
    pub win_rate: f32,
    pub draw_rate: f32,
    pub average_game_length: f32,
    pub current_loss: f32,
    pub training_steps: usize,
}

/// Hyperparameters recorded in checkpoint metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointHyperparameters {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon: f64,
    pub batch_size: usize,
    pub update_target_steps: usize,
    pub replay_capacity: usize,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub episode: usize,
    pub timestamp: u64,
    pub algorithm: String,
    /// Display name of the policy that was saved.
    #[serde(default)]
    pub name: String,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: CheckpointHyperparameters,
}

/// Learner state written to training_state.json; enough to resume the
/// exploration schedule and step counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqnTrainingState {
    pub epsilon: f64,
    pub step_count: usize,
    pub episode_count: usize,
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub update_target_steps: usize,
}
