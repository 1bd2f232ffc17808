use log::{info, warn};

use crate::ai::{DqnConfig, DqnPolicy, Policy, TrainablePolicy};
use crate::checkpoint::{CheckpointManager, CheckpointManagerConfig, CheckpointMetrics};
use crate::engine::{Engine, EpisodeResult};
use crate::error::TrainingError;
use crate::game::GridGame;
use crate::training::evaluation::{evaluate_vs_random, EvalReport};
use crate::training::metrics::TrainingMetrics;

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    pub log_interval: usize,
    pub eval_interval: usize,
    pub eval_games: usize,
    pub checkpoint_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 30_000,
            log_interval: 500,
            eval_interval: 500,
            eval_games: 50,
            checkpoint_interval: 5000,
        }
    }
}

/// Self-play training of two DQN learners against each other.
///
/// Learner 0 always moves first. Everything the loop mutates lives here,
/// so a session can be stepped one episode at a time or run to completion.
pub struct TrainingSession {
    config: TrainerConfig,
    learners: [DqnPolicy; 2],
    metrics: TrainingMetrics,
    checkpoint_manager: CheckpointManager,
    episode: usize,
    best_win_rate: f32,
    eval_seed: Option<u64>,
}

impl TrainingSession {
    pub fn new(
        dqn: DqnConfig,
        config: TrainerConfig,
        checkpoint: CheckpointManagerConfig,
    ) -> Result<Self, TrainingError> {
        let second = DqnConfig {
            seed: dqn.seed.map(|s| s.wrapping_add(1_000)),
            ..dqn.clone()
        };
        let eval_seed = dqn.seed.map(|s| s.wrapping_add(2_000));
        Ok(TrainingSession {
            learners: [DqnPolicy::new("DQN-1", dqn), DqnPolicy::new("DQN-2", second)],
            metrics: TrainingMetrics::with_capacity(config.log_interval.max(1)),
            checkpoint_manager: CheckpointManager::new(checkpoint)?,
            config,
            episode: 0,
            best_win_rate: 0.0,
            eval_seed,
        })
    }

    /// Restore learner 0 from the latest checkpoint and copy it into
    /// learner 1. Returns the episode training continues from.
    pub fn resume(&mut self) -> Result<usize, TrainingError> {
        let data = self.checkpoint_manager.load_latest()?;
        for learner in self.learners.iter_mut() {
            self.checkpoint_manager.restore_into(&data, learner)?;
        }
        self.episode = data.metadata.episode;
        info!(
            "resumed from {} at episode {} (epsilon {:.3})",
            data.path.display(),
            self.episode,
            self.learners[0].exploration_rate()
        );
        Ok(self.episode)
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn learner(&self, index: usize) -> &DqnPolicy {
        &self.learners[index]
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn best_win_rate(&self) -> f32 {
        self.best_win_rate
    }

    pub fn checkpoint_manager(&self) -> &CheckpointManager {
        &self.checkpoint_manager
    }

    /// Play one self-play game, then decay both learners' exploration.
    pub fn run_episode(&mut self) -> Result<EpisodeResult, TrainingError> {
        let [first, second] = &mut self.learners;
        let policies: Vec<&mut dyn Policy> = vec![first as &mut dyn Policy, second];
        let mut engine = Engine::new(GridGame::new(2), policies)?;
        engine.run()?;
        let result = engine.result();
        drop(engine);

        let mut losses = Vec::new();
        for learner in self.learners.iter_mut() {
            losses.extend(learner.take_losses());
            learner.end_episode();
        }
        self.metrics.record_episode(result);
        self.metrics.record_episode_losses(&losses);
        self.episode += 1;
        Ok(result)
    }

    /// Greedy games of learner 0 against the uniform-random policy.
    pub fn evaluate(&mut self) -> Result<EvalReport, TrainingError> {
        evaluate_vs_random(&mut self.learners[0], self.config.eval_games, self.eval_seed)
    }

    /// Run `num_episodes` more episodes with periodic logging, evaluation
    /// and checkpointing.
    pub fn train(&mut self) -> Result<(), TrainingError> {
        let start_episode = self.episode + 1;
        let end_episode = self.episode + self.config.num_episodes;
        info!(
            "starting self-play training for {} episodes ({}..={})",
            self.config.num_episodes, start_episode, end_episode
        );

        while self.episode < end_episode {
            self.run_episode()?;
            let episode = self.episode;

            if episode % self.config.log_interval == 0 {
                let window = self.config.log_interval;
                info!(
                    "episode {}/{} | eps: {:.3} | avg episode loss: {:.4} | first-mover wins: {:.1}% | draws: {:.1}% | avg_len: {:.1}",
                    episode,
                    end_episode,
                    self.learners[0].exploration_rate(),
                    self.metrics.average_loss(window),
                    self.metrics.win_rate(0, window) * 100.0,
                    self.metrics.draw_rate(window) * 100.0,
                    self.metrics.average_game_length(window),
                );
            }

            let mut eval_report = None;
            if episode % self.config.eval_interval == 0 {
                let report = self.evaluate()?;
                info!(
                    "eval at episode {} vs Random ({} games): win {:.2} | draw {:.2} | eps {:.3}",
                    episode,
                    report.games,
                    report.win_rate(),
                    report.draw_rate(),
                    self.learners[0].exploration_rate()
                );
                self.maybe_save_best(&report, episode);
                eval_report = Some(report);
            }

            if episode % self.config.checkpoint_interval == 0 {
                let report = match eval_report {
                    Some(report) => report,
                    None => self.evaluate()?,
                };
                let metrics = self.checkpoint_metrics(&report);
                if let Err(e) =
                    self.checkpoint_manager
                        .save_checkpoint(&self.learners[0], &metrics, episode)
                {
                    warn!("checkpoint at episode {} failed: {}", episode, e);
                }
            }
        }

        info!(
            "training complete: {} episodes, best eval win rate {:.2}",
            self.metrics.total_episodes(),
            self.best_win_rate
        );
        Ok(())
    }

    /// Save learner 0 as the best model when `report` strictly beats the
    /// best win rate so far. The record only moves once the save succeeded.
    fn maybe_save_best(&mut self, report: &EvalReport, episode: usize) -> bool {
        if report.win_rate() <= self.best_win_rate {
            return false;
        }
        let metrics = self.checkpoint_metrics(report);
        match self
            .checkpoint_manager
            .save_best(&self.learners[0], &metrics, episode)
        {
            Ok(_) => {
                self.best_win_rate = report.win_rate();
                true
            }
            Err(e) => {
                warn!("saving best model failed: {}", e);
                false
            }
        }
    }

    fn checkpoint_metrics(&self, report: &EvalReport) -> CheckpointMetrics {
        CheckpointMetrics {
            win_rate: report.win_rate(),
            draw_rate: report.draw_rate(),
            average_game_length: report.average_game_length(),
            current_loss: self.metrics.average_loss(self.config.log_interval),
            training_steps: self.learners[0].step_count(),
        }
    }
}
