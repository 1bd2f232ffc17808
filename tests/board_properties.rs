use tictactoe_rl::game::{Board, GridGame, LINES, NUM_CELLS, SIZE};

/// Every assignment of {empty, actor 0, actor 1} to the nine cells.
fn all_boards() -> impl Iterator<Item = Board> {
    (0..3usize.pow(NUM_CELLS as u32)).map(|mut code| {
        let mut cells = [[0u8; SIZE]; SIZE];
        for i in 0..NUM_CELLS {
            cells[i / SIZE][i % SIZE] = (code % 3) as u8;
            code /= 3;
        }
        Board::from_rows(cells)
    })
}

/// Marks owning at least one full line.
fn line_owners(board: &Board) -> Vec<u8> {
    let mut owners: Vec<u8> = LINES
        .iter()
        .filter_map(|line| {
            let marks = line.map(|(r, c)| board.get(r, c));
            (marks[0] != 0 && marks.iter().all(|&m| m == marks[0])).then_some(marks[0])
        })
        .collect();
    owners.sort();
    owners.dedup();
    owners
}

#[test]
fn terminal_iff_line_or_full() {
    let mut checked = 0;
    for board in all_boards() {
        let has_line = !line_owners(&board).is_empty();
        let full = (0..SIZE).all(|r| (0..SIZE).all(|c| board.get(r, c) != 0));
        assert_eq!(
            board.is_terminal(),
            has_line || full,
            "board {:?}",
            board.rows()
        );
        checked += 1;
    }
    assert_eq!(checked, 19_683);
}

#[test]
fn winner_owns_the_completed_line() {
    for board in all_boards() {
        let owners = line_owners(&board);
        let game = GridGame::from_board(board, 0, 2);
        match owners.as_slice() {
            [] => assert_eq!(game.winner(), None, "board {:?}", board.rows()),
            [mark] => {
                assert_eq!(
                    game.winner(),
                    Some(*mark as usize - 1),
                    "board {:?}",
                    board.rows()
                );
                assert!(game.is_terminal());
            }
            // Both actors holding a line cannot arise in play.
            _ => assert!(game.winner().is_some()),
        }
    }
}

#[test]
fn terminal_games_accept_no_moves() {
    for board in all_boards().filter(|b| b.is_terminal()) {
        let game = GridGame::from_board(board, 0, 2);
        assert!(game.current_players().is_empty());
    }
}
