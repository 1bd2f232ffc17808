use crate::ai::{EvalModeGuard, Policy, RandomPolicy, TrainablePolicy};
use crate::engine::Engine;
use crate::error::TrainingError;
use crate::game::GridGame;

/// Outcome counts of an evaluation run, from the evaluated policy's side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalReport {
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub total_turns: usize,
}

impl EvalReport {
    pub fn win_rate(&self) -> f32 {
        self.rate(self.wins)
    }

    pub fn draw_rate(&self) -> f32 {
        self.rate(self.draws)
    }

    pub fn average_game_length(&self) -> f32 {
        self.rate(self.total_turns)
    }

    fn rate(&self, count: usize) -> f32 {
        if self.games == 0 {
            0.0
        } else {
            count as f32 / self.games as f32
        }
    }
}

/// Play `games` greedy games against `opponent`, alternating who moves
/// first. Exploration and learning are suspended for the duration and
/// restored afterwards, whether or not a game fails.
pub fn evaluate<P: TrainablePolicy>(
    policy: &mut P,
    opponent: &mut dyn Policy,
    games: usize,
) -> Result<EvalReport, TrainingError> {
    let mut guard = EvalModeGuard::new(policy);
    let mut report = EvalReport {
        games,
        ..Default::default()
    };

    for game_idx in 0..games {
        let policy_actor = game_idx % 2;
        let subject: &mut dyn Policy = &mut *guard;
        let policies: Vec<&mut dyn Policy> = if policy_actor == 0 {
            vec![subject, &mut *opponent]
        } else {
            vec![&mut *opponent, subject]
        };
        let mut engine = Engine::new(GridGame::new(2), policies)?;
        let winner = engine.run()?;
        report.total_turns += engine.history().len();

        match winner {
            Some(w) if w == policy_actor => report.wins += 1,
            Some(_) => report.losses += 1,
            None => report.draws += 1,
        }
    }

    Ok(report)
}

/// [`evaluate`] against a fresh uniform-random opponent.
pub fn evaluate_vs_random<P: TrainablePolicy>(
    policy: &mut P,
    games: usize,
    seed: Option<u64>,
) -> Result<EvalReport, TrainingError> {
    let mut random = match seed {
        Some(seed) => RandomPolicy::with_seed("Random", seed),
        None => RandomPolicy::default(),
    };
    evaluate(policy, &mut random, games)
}
