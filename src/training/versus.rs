use std::borrow::Cow;
use std::fmt;

use log::debug;

use crate::ai::{Policy, PolicyRegistry};
use crate::config::PlayerConfig;
use crate::engine::Engine;
use crate::error::{ConfigError, TrainingError};
use crate::game::GridGame;

/// Wins and draws over a set of rounds. `wins[i]` belongs to configured
/// player `i` regardless of who moved first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTally {
    pub rounds: usize,
    pub wins: Vec<usize>,
    pub draws: usize,
}

impl MatchTally {
    fn new(players: usize) -> Self {
        MatchTally {
            rounds: 0,
            wins: vec![0; players],
            draws: 0,
        }
    }

    fn record(&mut self, winner: Option<usize>) {
        self.rounds += 1;
        match winner {
            Some(player) => self.wins[player] += 1,
            None => self.draws += 1,
        }
    }

    pub fn win_rate(&self, player: usize) -> f32 {
        ratio(self.wins[player], self.rounds)
    }

    pub fn draw_rate(&self) -> f32 {
        ratio(self.draws, self.rounds)
    }
}

fn ratio(count: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32
    }
}

/// Head-to-head results, overall and split by starting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersusReport {
    pub players: Vec<String>,
    pub global: MatchTally,
    /// Rounds in configured order: the first player moved first.
    pub first_starts: MatchTally,
    /// Rounds in reversed order: the last player moved first.
    pub second_starts: MatchTally,
}

impl fmt::Display for VersusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- EVALUATION ({} rounds) ---", self.global.rounds)?;
        writeln!(f)?;
        writeln!(f, "Global win rate:")?;
        for (i, name) in self.players.iter().enumerate() {
            writeln!(f, "  {}: {:.2}", name, self.global.win_rate(i))?;
        }
        writeln!(f, "Global draw rate: {:.2}", self.global.draw_rate())?;

        let (Some(first), Some(last)) = (self.players.first(), self.players.last()) else {
            return Ok(());
        };
        writeln!(f)?;
        writeln!(
            f,
            "When {} starts ({} rounds):",
            first, self.first_starts.rounds
        )?;
        for (i, name) in self.players.iter().enumerate() {
            writeln!(f, "  {}: {:.2}", name, self.first_starts.win_rate(i))?;
        }
        writeln!(f, "  Draw rate: {:.2}", self.first_starts.draw_rate())?;

        writeln!(f)?;
        writeln!(
            f,
            "When {} starts ({} rounds):",
            last, self.second_starts.rounds
        )?;
        for (i, name) in self.players.iter().enumerate().rev() {
            writeln!(f, "  {}: {:.2}", name, self.second_starts.win_rate(i))?;
        }
        write!(f, "  Draw rate: {:.2}", self.second_starts.draw_rate())
    }
}

/// Parameters for one round's build of a participant. A configured `seed`
/// is offset by the round index so seeded participants do not replay the
/// same game every round.
fn round_params(params: &toml::Table, round: usize) -> Cow<'_, toml::Table> {
    match params.get("seed").and_then(toml::Value::as_integer) {
        Some(seed) => {
            let mut params = params.clone();
            params.insert(
                "seed".to_string(),
                toml::Value::Integer(seed.wrapping_add(round as i64)),
            );
            Cow::Owned(params)
        }
        None => Cow::Borrowed(params),
    }
}

/// Play `rounds` games between the configured players. The first half uses
/// the configured order, the rest the reversed order. Every round gets
/// freshly built policies.
pub fn run_versus(
    registry: &PolicyRegistry,
    players: &[PlayerConfig],
    rounds: usize,
) -> Result<VersusReport, TrainingError> {
    if players.len() < 2 {
        return Err(ConfigError::Validation(format!(
            "versus needs at least two players, got {}",
            players.len()
        ))
        .into());
    }

    let n = players.len();
    let half = rounds / 2;
    let mut report = VersusReport {
        players: players.iter().map(|p| p.name.clone()).collect(),
        global: MatchTally::new(n),
        first_starts: MatchTally::new(n),
        second_starts: MatchTally::new(n),
    };

    for round in 0..rounds {
        let configured_order = round < half;
        // seat -> configured player index
        let seats: Vec<usize> = if configured_order {
            (0..n).collect()
        } else {
            (0..n).rev().collect()
        };

        let mut policies = seats
            .iter()
            .map(|&i| {
                let p = &players[i];
                registry.build(&p.policy, &p.name, &round_params(&p.params, round))
            })
            .collect::<Result<Vec<Box<dyn Policy>>, ConfigError>>()?;
        let seated: Vec<&mut dyn Policy> = policies
            .iter_mut()
            .map(|p| p.as_mut() as &mut dyn Policy)
            .collect();

        let mut engine = Engine::new(GridGame::new(n), seated)?;
        let winner = engine.run()?.map(|seat| seats[seat]);
        debug!(
            "round {}: winner {:?}",
            round + 1,
            winner.map(|i| &players[i].name)
        );

        report.global.record(winner);
        if configured_order {
            report.first_starts.record(winner);
        } else {
            report.second_starts.record(winner);
        }
    }

    Ok(report)
}
