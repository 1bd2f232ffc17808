use log::debug;

use crate::ai::Policy;
use crate::error::TrainingError;
use crate::game::GridGame;

use super::replay::{GameReplay, TurnRecord};

/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Idle,
    Running,
    Done,
}

/// Summary of one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeResult {
    pub winner: Option<usize>,
    pub game_length: usize,
}

/// Runs one game to completion, asking each actor's policy for its move in
/// turn. Policy `i` plays actor `i`.
pub struct Engine<'p> {
    game: GridGame,
    policies: Vec<&'p mut dyn Policy>,
    status: EngineStatus,
    history: Vec<TurnRecord>,
}

impl<'p> Engine<'p> {
    /// Fails unless there is exactly one policy per actor.
    pub fn new(game: GridGame, policies: Vec<&'p mut dyn Policy>) -> Result<Self, TrainingError> {
        if policies.len() != game.num_actors() {
            return Err(TrainingError::ActorCountMismatch {
                expected: game.num_actors(),
                got: policies.len(),
            });
        }
        Ok(Engine {
            game,
            policies,
            status: EngineStatus::Idle,
            history: Vec::new(),
        })
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn game(&self) -> &GridGame {
        &self.game
    }

    /// (actor, name, action, reward) per applied move, oldest first.
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// Reset the game and play it out. Returns the winner, `None` for a draw.
    pub fn run(&mut self) -> Result<Option<usize>, TrainingError> {
        self.game.reset();
        self.play_out()
    }

    /// Play from the game's current position until nobody is left to move.
    ///
    /// Each move is applied on its own, so `next_state` always reflects
    /// exactly one more mark. When a move ends the game, every other policy
    /// also observes the terminal position with its own terminal reward.
    pub fn play_out(&mut self) -> Result<Option<usize>, TrainingError> {
        self.status = EngineStatus::Running;
        self.history.clear();

        loop {
            let actors = self.game.current_players();
            if actors.is_empty() {
                break;
            }
            for actor in actors {
                let state = self.game.observation(actor);
                let legal = self.game.valid_actions(actor);
                let policy = &mut self.policies[actor];

                let action = policy.act(&state, &legal);
                if !legal.contains(&action) {
                    return Err(TrainingError::IllegalAction {
                        actor,
                        action,
                        legal,
                    });
                }
                policy.set_last(&state, action);

                let outcome = self.game.step(&[(actor, action)])?;
                let reward = outcome.rewards[actor];
                policy.observe(&outcome.next_state, reward, outcome.done, actor)?;
                debug!(
                    "{} (actor {}) played {} -> reward {:.2}",
                    policy.name(),
                    actor,
                    action,
                    reward
                );
                self.history.push(TurnRecord {
                    actor,
                    actor_name: policy.name().to_string(),
                    action,
                    reward,
                });

                if outcome.done {
                    for (other, policy) in self.policies.iter_mut().enumerate() {
                        if other != actor {
                            let terminal = self.game.observation(other);
                            policy.observe(&terminal, outcome.rewards[other], true, other)?;
                        }
                    }
                    break;
                }
            }
        }

        self.status = EngineStatus::Done;
        let winner = self.game.winner();
        debug!("game over after {} turns, winner {:?}", self.history.len(), winner);
        Ok(winner)
    }

    pub fn result(&self) -> EpisodeResult {
        EpisodeResult {
            winner: self.game.winner(),
            game_length: self.history.len(),
        }
    }

    /// Replay record of the last run.
    pub fn replay(&self) -> GameReplay {
        GameReplay {
            players: self.policies.iter().map(|p| p.name().to_string()).collect(),
            turns: self.history.clone(),
            metrics: self.game.metrics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RandomPolicy;
    use crate::game::{Action, Board, Observation};

    /// Plays a fixed list of cells and remembers everything it observed.
    struct Scripted {
        name: String,
        moves: Vec<Action>,
        last: Option<(Observation, Action)>,
        observed: Vec<(f32, bool)>,
    }

    impl Scripted {
        fn new(name: &str, cells: &[usize]) -> Self {
            Scripted {
                name: name.to_string(),
                moves: cells.iter().rev().map(|&c| Action::from_index(c)).collect(),
                last: None,
                observed: Vec::new(),
            }
        }
    }

    impl Policy for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        fn act(&mut self, _state: &Observation, _legal: &[Action]) -> Action {
            self.moves.pop().unwrap()
        }

        fn observe(
            &mut self,
            _next_state: &Observation,
            reward: f32,
            done: bool,
            _actor: usize,
        ) -> Result<(), TrainingError> {
            self.observed.push((reward, done));
            Ok(())
        }

        fn set_last(&mut self, state: &Observation, action: Action) {
            self.last = Some((*state, action));
        }
    }

    #[test]
    fn test_rejects_policy_count_mismatch() {
        let mut only = RandomPolicy::default();
        let err = Engine::new(GridGame::new(2), vec![&mut only as &mut dyn Policy])
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TrainingError::ActorCountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_random_game_runs_to_completion() {
        let mut a = RandomPolicy::with_seed("A", 1);
        let mut b = RandomPolicy::with_seed("B", 2);
        let policies: Vec<&mut dyn Policy> = vec![&mut a as &mut dyn Policy, &mut b];
        let mut engine = Engine::new(GridGame::new(2), policies).unwrap();
        assert_eq!(engine.status(), EngineStatus::Idle);

        let winner = engine.run().unwrap();
        assert_eq!(engine.status(), EngineStatus::Done);
        assert!(engine.game().is_terminal());
        assert_eq!(winner, engine.game().winner());
        assert!((5..=9).contains(&engine.history().len()));
        for (i, turn) in engine.history().iter().enumerate() {
            assert_eq!(turn.actor, i % 2);
        }
    }

    #[test]
    fn test_winner_and_terminal_observations() {
        // X takes the top row while O plays the middle row.
        let mut x = Scripted::new("X", &[0, 1, 2]);
        let mut o = Scripted::new("O", &[3, 4]);
        {
            let policies: Vec<&mut dyn Policy> = vec![&mut x as &mut dyn Policy, &mut o];
            let mut engine = Engine::new(GridGame::new(2), policies).unwrap();
            assert_eq!(engine.run().unwrap(), Some(0));

            let names: Vec<&str> = engine.history().iter().map(|t| t.actor_name.as_str()).collect();
            assert_eq!(names, vec!["X", "O", "X", "O", "X"]);
            assert_eq!(engine.history()[4].reward, 3.0);
            assert_eq!(engine.result().game_length, 5);
        }
        assert_eq!(x.observed.last(), Some(&(3.0, true)));
        assert_eq!(x.observed.len(), 3);
        // O saw its two moves plus the terminal penalty.
        assert_eq!(o.observed.len(), 3);
        assert_eq!(o.observed.last(), Some(&(-3.0, true)));
        assert_eq!(o.last.map(|(_, a)| a), Some(Action::from_index(4)));
    }

    #[test]
    fn test_illegal_action_aborts() {
        let mut x = Scripted::new("X", &[4, 0]);
        let mut o = Scripted::new("O", &[4]);
        let policies: Vec<&mut dyn Policy> = vec![&mut x as &mut dyn Policy, &mut o];
        let mut engine = Engine::new(GridGame::new(2), policies).unwrap();
        let err = engine.run().unwrap_err();
        match err {
            TrainingError::IllegalAction { actor, action, legal } => {
                assert_eq!(actor, 1);
                assert_eq!(action, Action::new(1, 1));
                assert_eq!(legal.len(), 8);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.game().board().filled_count(), 1);
    }

    #[test]
    fn test_play_out_from_position() {
        let board = Board::from_rows([[1, 1, 0], [2, 2, 0], [0, 0, 0]]);
        let mut x = Scripted::new("X", &[2]);
        let mut o = RandomPolicy::with_seed("O", 0);
        let policies: Vec<&mut dyn Policy> = vec![&mut x as &mut dyn Policy, &mut o];
        let mut engine = Engine::new(GridGame::from_board(board, 0, 2), policies).unwrap();
        assert_eq!(engine.play_out().unwrap(), Some(0));
        assert_eq!(engine.history().len(), 1);

        let replay = engine.replay();
        assert_eq!(replay.players, vec!["X".to_string(), "O".to_string()]);
        assert_eq!(replay.metrics.winner, Some(0));
    }
}
