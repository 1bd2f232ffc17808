//! Core tic-tac-toe logic: board, actor-relative observations, reward
//! shaping and the turn-based game state machine.

mod board;
mod observation;
pub mod reward;
mod state;

pub use board::{Action, Board, MoveError, EMPTY, LINES, NUM_CELLS, SIZE};
pub use observation::Observation;
pub use state::{GameMetrics, GridGame, StepOutcome};
