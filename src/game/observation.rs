use super::board::{Board, EMPTY, NUM_CELLS, SIZE};

/// Actor-relative view of the board: the querying actor's marks are +1,
/// every other actor's marks are -1, empty cells are 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    board: [[i8; SIZE]; SIZE],
    actor: usize,
}

impl Observation {
    pub fn from_board(board: &Board, actor: usize) -> Self {
        let own = actor as u8 + 1;
        let mut cells = [[0i8; SIZE]; SIZE];
        for (row, marks) in board.rows().iter().enumerate() {
            for (col, &mark) in marks.iter().enumerate() {
                cells[row][col] = match mark {
                    EMPTY => 0,
                    m if m == own => 1,
                    _ => -1,
                };
            }
        }
        Observation {
            board: cells,
            actor,
        }
    }

    /// Index of the actor this view was built for.
    pub fn actor(&self) -> usize {
        self.actor
    }

    pub fn get(&self, row: usize, col: usize) -> i8 {
        self.board[row][col]
    }

    pub fn board(&self) -> &[[i8; SIZE]; SIZE] {
        &self.board
    }

    /// Row-major flattening fed to the estimators.
    pub fn flatten(&self) -> [f32; NUM_CELLS] {
        let mut out = [0.0f32; NUM_CELLS];
        for (i, &cell) in self.board.iter().flatten().enumerate() {
            out[i] = cell as f32;
        }
        out
    }
}
