use std::collections::VecDeque;

use crate::engine::EpisodeResult;

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    episode_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            episode_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    /// Record the mean of one episode's training-step losses. Episodes
    /// without a training step leave the loss window untouched.
    pub fn record_episode_losses(&mut self, losses: &[f32]) {
        if losses.is_empty() {
            return;
        }
        let mean = losses.iter().sum::<f32>() / losses.len() as f32;
        self.episode_losses.push_back(mean);
        if self.episode_losses.len() > self.capacity {
            self.episode_losses.pop_front();
        }
    }

    fn recent(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> {
        self.episode_results.iter().rev().take(last_n)
    }

    fn window(&self, last_n: usize) -> usize {
        self.episode_results.len().min(last_n)
    }

    /// Share of the last N episodes won by `actor`.
    pub fn win_rate(&self, actor: usize, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let wins = self
            .recent(n)
            .filter(|r| r.winner == Some(actor))
            .count();
        wins as f32 / n as f32
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let draws = self.recent(n).filter(|r| r.winner.is_none()).count();
        draws as f32 / n as f32
    }

    /// Average of the per-episode mean losses over the last N training episodes.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.episode_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.episode_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.window(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.recent(n).map(|r| r.game_length).sum();
        total as f32 / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
