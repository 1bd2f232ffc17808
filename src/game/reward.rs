//! Terminal rewards and the shaped intermediate reward for non-terminal moves.

use super::board::{Action, Board, EMPTY};

pub const WIN_REWARD: f32 = 3.0;
pub const LOSS_REWARD: f32 = -3.0;
pub const DRAW_REWARD: f32 = 0.0;

/// Move leaves two or more own lines one mark short of completion.
pub const DOUBLE_THREAT_BONUS: f32 = 0.3;
/// Move leaves exactly one own line one mark short of completion.
pub const THREAT_BONUS: f32 = 0.2;
/// Move fills the last gap in a line holding two marks of one opponent.
pub const BLOCK_BONUS: f32 = 0.2;
/// Per fully empty line through the played cell, measured before the move.
pub const OPENNESS_BONUS: f32 = 0.02;

/// Rewards for every actor at a terminal step: the winner gets
/// [`WIN_REWARD`], every other actor [`LOSS_REWARD`]; a draw scores
/// [`DRAW_REWARD`] for all.
pub fn terminal_rewards(winner: Option<usize>, num_actors: usize) -> Vec<f32> {
    match winner {
        Some(w) => (0..num_actors)
            .map(|i| if i == w { WIN_REWARD } else { LOSS_REWARD })
            .collect(),
        None => vec![DRAW_REWARD; num_actors],
    }
}

/// Heuristic reward for `mark` playing `action` on `before` (the board prior
/// to the move). Only meaningful for moves that do not end the game.
pub fn shaped_reward(before: &Board, action: Action, mark: u8) -> f32 {
    let mut reward = 0.0;
    let mut threats = 0;
    let mut blocked = false;
    let mut open_lines = 0;

    for line in Board::lines_through(action) {
        let marks = before.line_marks(line);
        let own = marks.iter().filter(|&&m| m == mark).count();
        let empty = marks.iter().filter(|&&m| m == EMPTY).count();

        if empty == line.len() {
            open_lines += 1;
        }

        // After the move: two own marks and one gap.
        if own == 1 && empty == 2 {
            threats += 1;
        }

        // The played cell was the only gap; the other two belong to one opponent.
        if empty == 1 {
            let others: Vec<u8> = marks.iter().copied().filter(|&m| m != EMPTY).collect();
            if others[0] != mark && others[0] == others[1] {
                blocked = true;
            }
        }
    }

    if threats >= 2 {
        reward += DOUBLE_THREAT_BONUS;
    } else if threats == 1 {
        reward += THREAT_BONUS;
    }
    if blocked {
        reward += BLOCK_BONUS;
    }
    reward + OPENNESS_BONUS * open_lines as f32
}
