use std::fmt;

use serde::{Deserialize, Serialize};

pub const SIZE: usize = 3;
pub const NUM_CELLS: usize = SIZE * SIZE;

/// Mark value of an empty cell. Actor `i` marks cells with `i + 1`.
pub const EMPTY: u8 = 0;

/// Every row, column and both diagonals, as (row, col) triples.
pub const LINES: [[(usize, usize); SIZE]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// A (row, column) coordinate into the board, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub row: usize,
    pub col: usize,
}

impl Action {
    pub fn new(row: usize, col: usize) -> Self {
        Action { row, col }
    }

    /// Flat index used by the estimators (`row * 3 + col`).
    pub fn index(self) -> usize {
        self.row * SIZE + self.col
    }

    pub fn from_index(index: usize) -> Self {
        Action {
            row: index / SIZE,
            col: index % SIZE,
        }
    }

    pub fn in_bounds(self) -> bool {
        self.row < SIZE && self.col < SIZE
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("cell {0} is already occupied")]
    Occupied(Action),

    #[error("cell {0} is outside the board")]
    OutOfBounds(Action),

    #[error("actor {0} does not take part in this game")]
    UnknownActor(usize),

    #[error("actor {0} is not due to move this turn")]
    OutOfTurn(usize),

    #[error("no moves supplied for this turn")]
    EmptyTurn,

    #[error("game is already over")]
    GameOver,
}

/// Fixed 3x3 grid of marks. Once non-zero, a cell only returns to zero
/// through a full reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[u8; SIZE]; SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[EMPTY; SIZE]; SIZE],
        }
    }

    /// Build a board from raw marks (0 = empty, `i + 1` = actor `i`).
    pub fn from_rows(cells: [[u8; SIZE]; SIZE]) -> Self {
        Board { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[[u8; SIZE]; SIZE] {
        &self.cells
    }

    pub fn is_empty_at(&self, action: Action) -> bool {
        self.cells[action.row][action.col] == EMPTY
    }

    /// Place `mark` on an empty cell.
    pub fn place(&mut self, action: Action, mark: u8) -> Result<(), MoveError> {
        if !action.in_bounds() {
            return Err(MoveError::OutOfBounds(action));
        }
        if !self.is_empty_at(action) {
            return Err(MoveError::Occupied(action));
        }
        self.cells[action.row][action.col] = mark;
        Ok(())
    }

    /// All empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Action> {
        (0..NUM_CELLS)
            .map(Action::from_index)
            .filter(|&a| self.is_empty_at(a))
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell != EMPTY)
            .count()
    }

    pub fn is_full(&self) -> bool {
        self.filled_count() == NUM_CELLS
    }

    /// Mark of the first line (rows, then columns, then diagonals) filled
    /// entirely by a single actor.
    pub fn completed_line_mark(&self) -> Option<u8> {
        LINES.iter().find_map(|line| {
            let first = self.cells[line[0].0][line[0].1];
            let complete = first != EMPTY
                && line
                    .iter()
                    .all(|&(row, col)| self.cells[row][col] == first);
            complete.then_some(first)
        })
    }

    /// A completed line exists or no empty cell remains.
    pub fn is_terminal(&self) -> bool {
        self.completed_line_mark().is_some() || self.is_full()
    }

    /// Lines passing through the given cell.
    pub fn lines_through(action: Action) -> impl Iterator<Item = &'static [(usize, usize); SIZE]> {
        LINES
            .iter()
            .filter(move |line| line.contains(&(action.row, action.col)))
    }

    /// Marks along a line.
    pub fn line_marks(&self, line: &[(usize, usize); SIZE]) -> [u8; SIZE] {
        line.map(|(row, col)| self.cells[row][col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.filled_count(), 0);
        assert_eq!(board.empty_cells().len(), NUM_CELLS);
        assert!(!board.is_terminal());
    }

    #[test]
    fn test_place_marks_cell() {
        let mut board = Board::new();
        board.place(Action::new(1, 2), 1).unwrap();
        assert_eq!(board.get(1, 2), 1);
        assert_eq!(board.filled_count(), 1);
        assert!(!board.empty_cells().contains(&Action::new(1, 2)));
    }

    #[test]
    fn test_place_on_occupied_cell_fails() {
        let mut board = Board::new();
        board.place(Action::new(0, 0), 1).unwrap();
        assert_eq!(
            board.place(Action::new(0, 0), 2),
            Err(MoveError::Occupied(Action::new(0, 0)))
        );
        assert_eq!(board.get(0, 0), 1);
    }

    #[test]
    fn test_place_out_of_bounds_fails() {
        let mut board = Board::new();
        assert_eq!(
            board.place(Action::new(3, 0), 1),
            Err(MoveError::OutOfBounds(Action::new(3, 0)))
        );
    }

    #[test]
    fn test_action_index_roundtrip() {
        for i in 0..NUM_CELLS {
            assert_eq!(Action::from_index(i).index(), i);
        }
        assert_eq!(Action::new(2, 1).index(), 7);
    }

    #[test]
    fn test_row_column_and_diagonal_wins() {
        let row = Board::from_rows([[0, 0, 0], [2, 2, 2], [1, 1, 0]]);
        assert_eq!(row.completed_line_mark(), Some(2));

        let col = Board::from_rows([[1, 2, 0], [1, 2, 0], [1, 0, 0]]);
        assert_eq!(col.completed_line_mark(), Some(1));

        let diag = Board::from_rows([[1, 2, 0], [2, 1, 0], [0, 0, 1]]);
        assert_eq!(diag.completed_line_mark(), Some(1));

        let anti = Board::from_rows([[1, 1, 2], [0, 2, 0], [2, 0, 1]]);
        assert_eq!(anti.completed_line_mark(), Some(2));
    }

    #[test]
    fn test_full_board_without_line_is_terminal() {
        let board = Board::from_rows([[1, 2, 1], [1, 2, 2], [2, 1, 1]]);
        assert_eq!(board.completed_line_mark(), None);
        assert!(board.is_full());
        assert!(board.is_terminal());
    }

    #[test]
    fn test_lines_through_counts() {
        assert_eq!(Board::lines_through(Action::new(1, 1)).count(), 4);
        assert_eq!(Board::lines_through(Action::new(0, 0)).count(), 3);
        assert_eq!(Board::lines_through(Action::new(0, 1)).count(), 2);
    }
}
