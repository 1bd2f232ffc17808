use serde::{Deserialize, Serialize};

use super::board::{Action, Board, MoveError, NUM_CELLS};
use super::observation::Observation;
use super::reward::{shaped_reward, terminal_rewards};

/// Result of applying one turn's moves.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Board as seen by the last actor that moved in this step.
    pub next_state: Observation,
    /// One reward per actor in the game.
    pub rewards: Vec<f32>,
    pub done: bool,
}

/// Observational summary of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    pub total_turns: usize,
    pub winner: Option<usize>,
    /// Percentage of filled cells, rounded to one decimal.
    pub fill_percent: f32,
}

/// Sequential-turn grid game: owns the board, turn order and move history,
/// and scores every step.
#[derive(Debug, Clone)]
pub struct GridGame {
    board: Board,
    num_actors: usize,
    current_actor: usize,
    history: Vec<(usize, Action)>,
    done: bool,
}

impl GridGame {
    /// Create a game for `num_actors` participants; actor 0 moves first.
    pub fn new(num_actors: usize) -> Self {
        assert!(
            (1..u8::MAX as usize).contains(&num_actors),
            "unsupported actor count {num_actors}"
        );
        GridGame {
            board: Board::new(),
            num_actors,
            current_actor: 0,
            history: Vec::new(),
            done: false,
        }
    }

    /// Start from an arbitrary position with `current_actor` to move.
    pub fn from_board(board: Board, current_actor: usize, num_actors: usize) -> Self {
        let mut game = GridGame::new(num_actors);
        assert!(current_actor < num_actors, "unknown actor {current_actor}");
        game.board = board;
        game.current_actor = current_actor;
        game.done = board.is_terminal();
        game
    }

    /// Clear the board, hand the turn to actor 0 and drop the history.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_actor = 0;
        self.history.clear();
        self.done = false;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn num_actors(&self) -> usize {
        self.num_actors
    }

    pub fn current_actor(&self) -> usize {
        self.current_actor
    }

    pub fn history(&self) -> &[(usize, Action)] {
        &self.history
    }

    /// Actors that must act this turn: the single current actor, or nobody
    /// once the game is over.
    pub fn current_players(&self) -> Vec<usize> {
        if self.done {
            Vec::new()
        } else {
            vec![self.current_actor]
        }
    }

    /// Empty cells. Legality is shared, so `actor` does not matter.
    pub fn valid_actions(&self, _actor: usize) -> Vec<Action> {
        self.board.empty_cells()
    }

    /// The board normalized for `actor`.
    pub fn observation(&self, actor: usize) -> Observation {
        Observation::from_board(&self.board, actor)
    }

    pub fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    /// Owner of a completed line, or `None` for a draw / unfinished game.
    pub fn winner(&self) -> Option<usize> {
        self.board.completed_line_mark().map(|mark| mark as usize - 1)
    }

    /// Apply this turn's moves in order, score them and pass the turn on.
    ///
    /// Nothing is applied if any move is rejected.
    pub fn step(&mut self, moves: &[(usize, Action)]) -> Result<StepOutcome, MoveError> {
        if self.done {
            return Err(MoveError::GameOver);
        }
        if moves.is_empty() {
            return Err(MoveError::EmptyTurn);
        }

        let mut board = self.board;
        let mut rewards = vec![0.0f32; self.num_actors];
        for &(actor, action) in moves {
            if actor >= self.num_actors {
                return Err(MoveError::UnknownActor(actor));
            }
            if actor != self.current_actor {
                return Err(MoveError::OutOfTurn(actor));
            }
            let mark = actor as u8 + 1;
            let before = board;
            board.place(action, mark)?;
            rewards[actor] += shaped_reward(&before, action, mark);
        }

        self.board = board;
        self.history.extend_from_slice(moves);
        self.done = self.board.is_terminal();
        if self.done {
            rewards = terminal_rewards(self.winner(), self.num_actors);
        }

        // `moves` is non-empty
        let last_actor = moves[moves.len() - 1].0;
        self.current_actor = (self.current_actor + 1) % self.num_actors;

        Ok(StepOutcome {
            next_state: self.observation(last_actor),
            rewards,
            done: self.done,
        })
    }

    pub fn metrics(&self) -> GameMetrics {
        let filled = self.board.filled_count() as f32 / NUM_CELLS as f32 * 100.0;
        GameMetrics {
            total_turns: self.history.len(),
            winner: self.winner(),
            fill_percent: (filled * 10.0).round() / 10.0,
        }
    }
}
