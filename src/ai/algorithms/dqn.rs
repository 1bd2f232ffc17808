use std::path::Path;

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::exploration::ExplorationSchedule;
use crate::ai::policy::{EvalState, Policy, TrainablePolicy, Transition};
use crate::checkpoint::{
    CheckpointHyperparameters, CheckpointMetadata, CheckpointMetrics, DqnTrainingState,
};
use crate::error::{CheckpointError, TrainingError};
use crate::game::{Action, Observation};
use crate::training::replay_buffer::ReplayBuffer;

use super::double_dqn::{DoubleDqnLearner, LearnerConfig};

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub update_target_steps: usize,
    pub hidden_size: usize,
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.9995,
            batch_size: 64,
            replay_capacity: 50_000,
            update_target_steps: 500,
            hidden_size: 64,
            seed: None,
        }
    }
}

/// Epsilon-greedy learning policy backed by a Double-DQN learner and a
/// bounded replay buffer.
///
/// Every observed outcome becomes a [`Transition`]; once the buffer holds a
/// full batch, each new transition triggers one training step.
pub struct DqnPolicy {
    name: String,
    learner: DoubleDqnLearner,
    replay_buffer: ReplayBuffer<Transition>,
    exploration: ExplorationSchedule,
    config: DqnConfig,
    last: Option<(Observation, Action)>,
    learning: bool,
    episode_count: usize,
    pending_losses: Vec<f32>,
    rng: StdRng,
}

impl DqnPolicy {
    pub fn new(name: impl Into<String>, config: DqnConfig) -> Self {
        let learner = DoubleDqnLearner::new(LearnerConfig {
            learning_rate: config.learning_rate,
            gamma: config.gamma,
            update_target_steps: config.update_target_steps,
            hidden_size: config.hidden_size,
        });
        let (replay_buffer, rng) = match config.seed {
            Some(seed) => (
                ReplayBuffer::with_seed(config.replay_capacity, seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (
                ReplayBuffer::new(config.replay_capacity),
                StdRng::from_os_rng(),
            ),
        };
        let exploration = ExplorationSchedule::new(
            config.epsilon_start,
            config.epsilon_min,
            config.epsilon_decay,
        );

        DqnPolicy {
            name: name.into(),
            learner,
            replay_buffer,
            exploration,
            config,
            last: None,
            learning: true,
            episode_count: 0,
            pending_losses: Vec::new(),
            rng,
        }
    }

    /// Legal action with the highest online value; first in `legal` wins ties.
    pub fn greedy_action(&self, state: &Observation, legal: &[Action]) -> Action {
        assert!(!legal.is_empty(), "No legal actions");
        let q_values = self.learner.predict(state);

        let mut best_action = legal[0];
        let mut best_q = f32::NEG_INFINITY;
        for &action in legal {
            if q_values[action.index()] > best_q {
                best_q = q_values[action.index()];
                best_action = action;
            }
        }
        best_action
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy inference).
    pub fn set_epsilon(&mut self, eps: f64) {
        self.exploration.set_epsilon(eps);
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    /// Enable or suspend recording transitions and training.
    pub fn set_learning(&mut self, learning: bool) {
        self.learning = learning;
        if !learning {
            self.last = None;
        }
    }

    pub fn learner(&self) -> &DoubleDqnLearner {
        &self.learner
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Save the online estimator's parameters.
    pub fn save_model(&self, path: &Path) -> Result<(), CheckpointError> {
        self.learner.save_online(path)
    }

    /// Load the online estimator's parameters; the target estimator is
    /// synced to them.
    pub fn load_model(&mut self, path: &Path) -> Result<(), CheckpointError> {
        self.learner.load_online(path)
    }

    /// Export current training state for checkpointing.
    pub fn training_state(&self) -> DqnTrainingState {
        DqnTrainingState {
            epsilon: self.exploration.epsilon(),
            step_count: self.learner.step_count(),
            episode_count: self.episode_count,
            learning_rate: self.config.learning_rate,
            gamma: self.config.gamma,
            epsilon_start: self.config.epsilon_start,
            epsilon_min: self.config.epsilon_min,
            epsilon_decay: self.config.epsilon_decay,
            batch_size: self.config.batch_size,
            replay_capacity: self.config.replay_capacity,
            update_target_steps: self.config.update_target_steps,
        }
    }

    /// Restore training state from a checkpoint. Network shape is unchanged.
    pub fn restore_training_state(&mut self, state: &DqnTrainingState) {
        self.episode_count = state.episode_count;
        self.learner.set_step_count(state.step_count);
        self.config = DqnConfig {
            learning_rate: state.learning_rate,
            gamma: state.gamma,
            epsilon_start: state.epsilon_start,
            epsilon_min: state.epsilon_min,
            epsilon_decay: state.epsilon_decay,
            batch_size: state.batch_size,
            replay_capacity: state.replay_capacity,
            update_target_steps: state.update_target_steps,
            ..self.config.clone()
        };
        self.exploration =
            ExplorationSchedule::new(state.epsilon, state.epsilon_min, state.epsilon_decay);
    }

    fn train_from_memory(&mut self) -> Result<(), TrainingError> {
        let Some(batch) = self.replay_buffer.sample(self.config.batch_size) else {
            return Ok(());
        };
        let loss = self.learner.train_step(&batch)?;
        self.pending_losses.push(loss);
        Ok(())
    }
}

impl Policy for DqnPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, state: &Observation, legal_actions: &[Action]) -> Action {
        assert!(!legal_actions.is_empty(), "No legal actions");
        if self.rng.random::<f64>() < self.exploration.epsilon() {
            let idx = self.rng.random_range(0..legal_actions.len());
            return legal_actions[idx];
        }
        self.greedy_action(state, legal_actions)
    }

    fn observe(
        &mut self,
        next_state: &Observation,
        reward: f32,
        done: bool,
        _actor: usize,
    ) -> Result<(), TrainingError> {
        if !self.learning {
            return Ok(());
        }
        let Some((state, action)) = self.last else {
            return Ok(());
        };
        if done {
            self.last = None;
        }

        self.replay_buffer.push(Transition {
            state,
            action,
            reward,
            next_state: *next_state,
            done,
        });
        self.train_from_memory()
    }

    fn set_last(&mut self, state: &Observation, action: Action) {
        if self.learning {
            self.last = Some((*state, action));
        }
    }
}

impl TrainablePolicy for DqnPolicy {
    fn algorithm_name(&self) -> &str {
        "DQN"
    }

    fn episode_count(&self) -> usize {
        self.episode_count
    }

    fn step_count(&self) -> usize {
        self.learner.step_count()
    }

    fn exploration_rate(&self) -> f64 {
        self.exploration.epsilon()
    }

    fn end_episode(&mut self) {
        self.episode_count += 1;
        self.exploration.decay_episode();
        self.last = None;
    }

    fn take_losses(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.pending_losses)
    }

    fn enter_eval_mode(&mut self) -> EvalState {
        let saved = EvalState {
            epsilon: self.exploration.epsilon(),
            learning: self.learning,
        };
        self.exploration.set_epsilon(0.0);
        self.learning = false;
        self.last = None;
        debug!("{} entered eval mode", self.name);
        saved
    }

    fn exit_eval_mode(&mut self, state: EvalState) {
        self.exploration.set_epsilon(state.epsilon);
        self.learning = state.learning;
        self.last = None;
    }

    fn save_weights_to_dir(&self, dir: &Path) -> Result<(), CheckpointError> {
        self.save_model(&dir.join("q_network"))
    }

    fn load_weights_from_dir(&mut self, dir: &Path) -> Result<(), CheckpointError> {
        self.load_model(&dir.join("q_network"))
    }

    fn training_state_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string_pretty(&self.training_state())?)
    }

    fn restore_training_state_json(&mut self, json: &str) -> Result<(), CheckpointError> {
        let state: DqnTrainingState = serde_json::from_str(json)?;
        self.restore_training_state(&state);
        Ok(())
    }

    fn build_checkpoint_metadata(
        &self,
        metrics: &CheckpointMetrics,
        episode: usize,
        timestamp: u64,
    ) -> CheckpointMetadata {
        let ts = self.training_state();
        CheckpointMetadata {
            episode,
            timestamp,
            algorithm: self.algorithm_name().to_string(),
            name: self.name.clone(),
            metrics: metrics.clone(),
            hyperparameters: CheckpointHyperparameters {
                learning_rate: ts.learning_rate,
                gamma: ts.gamma,
                epsilon: ts.epsilon,
                batch_size: ts.batch_size,
                update_target_steps: ts.update_target_steps,
                replay_capacity: ts.replay_capacity,
                epsilon_start: ts.epsilon_start,
                epsilon_min: ts.epsilon_min,
                epsilon_decay: ts.epsilon_decay,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::EvalModeGuard;
    use crate::game::{Board, GridGame};

    fn small_config() -> DqnConfig {
        DqnConfig {
            batch_size: 2,
            replay_capacity: 16,
            hidden_size: 16,
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_dqn_policy_selects_legal_action() {
        let mut policy = DqnPolicy::new("DQN", DqnConfig::default());
        let board = Board::from_rows([[1, 2, 0], [0, 1, 0], [2, 0, 0]]);
        let game = GridGame::from_board(board, 0, 2);
        let legal = game.valid_actions(0);

        for eps in [1.0, 0.0] {
            policy.set_epsilon(eps);
            for _ in 0..20 {
                let action = policy.act(&game.observation(0), &legal);
                assert!(legal.contains(&action), "Action {} is not legal", action);
            }
        }
    }

    #[test]
    fn test_greedy_matches_online_argmax_over_legal() {
        let policy = DqnPolicy::new("DQN", small_config());
        let game = GridGame::from_board(Board::from_rows([[1, 0, 2], [0, 0, 0], [0, 0, 0]]), 0, 2);
        let state = game.observation(0);
        let legal = game.valid_actions(0);

        let q = policy.learner().predict(&state);
        let expected = legal
            .iter()
            .copied()
            .fold(None::<Action>, |best, a| match best {
                Some(b) if q[b.index()] >= q[a.index()] => Some(b),
                _ => Some(a),
            })
            .unwrap();
        assert_eq!(policy.greedy_action(&state, &legal), expected);
    }

    #[test]
    fn test_observe_without_set_last_records_nothing() {
        let mut policy = DqnPolicy::new("DQN", small_config());
        let state = GridGame::new(2).observation(0);
        policy.observe(&state, 1.0, false, 0).unwrap();
        assert_eq!(policy.replay_len(), 0);
    }

    #[test]
    fn test_training_starts_once_batch_is_available() {
        let mut policy = DqnPolicy::new("DQN", small_config());
        let mut game = GridGame::new(2);

        let s0 = game.observation(0);
        policy.set_last(&s0, Action::new(1, 1));
        let out = game.step(&[(0, Action::new(1, 1))]).unwrap();
        policy.observe(&out.next_state, out.rewards[0], out.done, 0).unwrap();
        assert_eq!(policy.replay_len(), 1);
        assert_eq!(policy.step_count(), 0);

        game.step(&[(1, Action::new(0, 0))]).unwrap();
        let s1 = game.observation(0);
        policy.set_last(&s1, Action::new(2, 2));
        let out = game.step(&[(0, Action::new(2, 2))]).unwrap();
        policy.observe(&out.next_state, out.rewards[0], out.done, 0).unwrap();
        assert_eq!(policy.replay_len(), 2);
        assert_eq!(policy.step_count(), 1);
        assert_eq!(policy.take_losses().len(), 1);
        assert!(policy.take_losses().is_empty());
    }

    #[test]
    fn test_done_clears_pending_decision() {
        let mut policy = DqnPolicy::new("DQN", small_config());
        let state = GridGame::new(2).observation(0);
        policy.set_last(&state, Action::new(0, 0));
        policy.observe(&state, 3.0, true, 0).unwrap();
        policy.observe(&state, 3.0, true, 0).unwrap();
        assert_eq!(policy.replay_len(), 1);
    }

    #[test]
    fn test_end_episode_decays_epsilon() {
        let mut policy = DqnPolicy::new("DQN", DqnConfig::default());
        for _ in 0..10 {
            policy.end_episode();
        }
        assert_eq!(policy.episode_count(), 10);
        assert!((policy.epsilon() - 0.9995f64.powi(10)).abs() < 1e-12);
    }

    #[test]
    fn test_eval_guard_restores_on_every_exit() {
        let mut policy = DqnPolicy::new("DQN", small_config());
        policy.set_epsilon(0.4);

        fn failing_eval(policy: &mut DqnPolicy) -> Result<(), TrainingError> {
            let guard = EvalModeGuard::new(policy);
            assert_eq!(guard.epsilon(), 0.0);
            assert!(!guard.is_learning());
            Err(TrainingError::ActorCountMismatch {
                expected: 2,
                got: 1,
            })
        }

        assert!(failing_eval(&mut policy).is_err());
        assert!((policy.epsilon() - 0.4).abs() < 1e-12);
        assert!(policy.is_learning());
    }

    #[test]
    fn test_eval_mode_suspends_learning() {
        let mut policy = DqnPolicy::new("DQN", small_config());
        let state = GridGame::new(2).observation(0);
        {
            let mut guard = EvalModeGuard::new(&mut policy);
            guard.set_last(&state, Action::new(0, 0));
            guard.observe(&state, 1.0, false, 0).unwrap();
        }
        assert_eq!(policy.replay_len(), 0);
    }

    #[test]
    fn test_training_state_roundtrip() {
        let mut policy = DqnPolicy::new(
            "DQN",
            DqnConfig {
                learning_rate: 0.002,
                gamma: 0.9,
                ..Default::default()
            },
        );
        policy.set_epsilon(0.42);
        policy.end_episode();

        let json = policy.training_state_json().unwrap();
        let mut restored = DqnPolicy::new("DQN", DqnConfig::default());
        restored.restore_training_state_json(&json).unwrap();
        assert_eq!(restored.episode_count(), 1);
        assert!((restored.epsilon() - 0.42 * 0.9995).abs() < 1e-12);
        assert!((restored.config().learning_rate - 0.002).abs() < 1e-12);
        assert!((restored.config().gamma - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_save_and_load_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model");
        let source = DqnPolicy::new("a", small_config());
        source.save_model(&path).unwrap();

        let mut target = DqnPolicy::new("b", small_config());
        target.load_model(&path).unwrap();

        let state = GridGame::new(2).observation(0);
        assert_eq!(
            source.learner().predict(&state),
            target.learner().predict(&state)
        );
    }
}
