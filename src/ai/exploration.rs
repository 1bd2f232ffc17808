use serde::{Deserialize, Serialize};

/// Multiplicative per-episode epsilon decay with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    epsilon: f64,
    epsilon_min: f64,
    decay: f64,
}

impl ExplorationSchedule {
    pub fn new(epsilon_start: f64, epsilon_min: f64, decay: f64) -> Self {
        ExplorationSchedule {
            epsilon: epsilon_start,
            epsilon_min,
            decay,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy inference).
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    /// Apply one episode's decay. Never raises epsilon, even when it was set
    /// below the floor by hand.
    pub fn decay_episode(&mut self) {
        if self.epsilon > self.epsilon_min {
            self.epsilon = (self.epsilon * self.decay).max(self.epsilon_min);
        }
    }
}
