use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::checkpoint::{CheckpointMetadata, CheckpointMetrics};
use crate::error::{CheckpointError, TrainingError};
use crate::game::{Action, Observation};

/// A single step of experience for RL training. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Observation,
    pub action: Action,
    pub reward: f32,
    pub next_state: Observation,
    /// The episode ended as a result of this action.
    pub done: bool,
}

/// Decision-making contract shared by scripted and learned participants.
///
/// The engine calls `act`, then `set_last` with the same state and action,
/// applies the move and finally `observe`s the outcome. Only learning
/// policies need the last two hooks.
pub trait Policy {
    /// Display name used in histories and reports.
    fn name(&self) -> &str;

    /// Pick one element of `legal_actions`.
    fn act(&mut self, state: &Observation, legal_actions: &[Action]) -> Action;

    /// Outcome of the most recent decision, from this actor's point of view.
    fn observe(
        &mut self,
        _next_state: &Observation,
        _reward: f32,
        _done: bool,
        _actor: usize,
    ) -> Result<(), TrainingError> {
        Ok(())
    }

    /// Remember the decision about to be applied.
    fn set_last(&mut self, _state: &Observation, _action: Action) {}
}

/// What `enter_eval_mode` suspended, handed back to `exit_eval_mode`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalState {
    pub epsilon: f64,
    pub learning: bool,
}

/// Extension trait for policies that support the full training lifecycle.
pub trait TrainablePolicy: Policy {
    /// Algorithm name for logs and checkpoint metadata ("DQN").
    fn algorithm_name(&self) -> &str;
    /// Completed episodes (for resume offset).
    fn episode_count(&self) -> usize;
    /// Gradient steps taken so far.
    fn step_count(&self) -> usize;
    /// Current exploration rate.
    fn exploration_rate(&self) -> f64;
    /// Close an episode: decay exploration and bump the episode count.
    fn end_episode(&mut self);
    /// Drain the losses of training steps run since the last call.
    fn take_losses(&mut self) -> Vec<f32>;
    /// Disable exploration and learning. Returns state to restore.
    fn enter_eval_mode(&mut self) -> EvalState;
    /// Restore what `enter_eval_mode` suspended.
    fn exit_eval_mode(&mut self, state: EvalState);
    /// Save network weights to a directory.
    fn save_weights_to_dir(&self, dir: &Path) -> Result<(), CheckpointError>;
    /// Load network weights from a directory.
    fn load_weights_from_dir(&mut self, dir: &Path) -> Result<(), CheckpointError>;
    /// Serialize training state to JSON.
    fn training_state_json(&self) -> Result<String, CheckpointError>;
    /// Restore training state from JSON produced by `training_state_json`.
    fn restore_training_state_json(&mut self, json: &str) -> Result<(), CheckpointError>;
    /// Build checkpoint metadata for this policy's algorithm.
    fn build_checkpoint_metadata(
        &self,
        metrics: &CheckpointMetrics,
        episode: usize,
        timestamp: u64,
    ) -> CheckpointMetadata;
}

/// Scoped evaluation mode. The previous exploration state is restored when
/// the guard drops, whichever way the scope is left.
pub struct EvalModeGuard<'a, P: TrainablePolicy + ?Sized> {
    policy: &'a mut P,
    saved: Option<EvalState>,
}

impl<'a, P: TrainablePolicy + ?Sized> EvalModeGuard<'a, P> {
    pub fn new(policy: &'a mut P) -> Self {
        let saved = policy.enter_eval_mode();
        EvalModeGuard {
            policy,
            saved: Some(saved),
        }
    }
}

impl<P: TrainablePolicy + ?Sized> Deref for EvalModeGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.policy
    }
}

impl<P: TrainablePolicy + ?Sized> DerefMut for EvalModeGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.policy
    }
}

impl<P: TrainablePolicy + ?Sized> Drop for EvalModeGuard<'_, P> {
    fn drop(&mut self) {
        if let Some(state) = self.saved.take() {
            self.policy.exit_eval_mode(state);
        }
    }
}
