use tictactoe_rl::ai::{DqnConfig, DqnPolicy, Policy, RandomPolicy, TrainablePolicy};
use tictactoe_rl::engine::{Engine, EngineStatus, GameReplay};
use tictactoe_rl::game::reward::{OPENNESS_BONUS, WIN_REWARD};
use tictactoe_rl::game::{Action, Board, GridGame, Observation};

/// Plays the given cells in order.
struct Script(Vec<usize>);

impl Policy for Script {
    fn name(&self) -> &str {
        "Script"
    }

    fn act(&mut self, _state: &Observation, _legal: &[Action]) -> Action {
        Action::from_index(self.0.remove(0))
    }
}

#[test]
fn completing_a_row_wins() {
    let board = Board::from_rows([[1, 1, 0], [2, 2, 0], [0, 0, 0]]);
    let mut game = GridGame::from_board(board, 0, 2);
    let legal = game.valid_actions(0);
    assert!(legal.contains(&Action::new(0, 2)));
    assert!(legal.contains(&Action::new(1, 2)));

    let out = game.step(&[(0, Action::new(0, 2))]).unwrap();
    assert!(out.done);
    assert_eq!(game.winner(), Some(0));
    assert_eq!(out.rewards[0], WIN_REWARD);
}

#[test]
fn center_opening_collects_four_openness_bonuses() {
    let mut game = GridGame::new(2);
    let out = game.step(&[(0, Action::new(1, 1))]).unwrap();
    assert!(!out.done);
    assert!((out.rewards[0] - 4.0 * OPENNESS_BONUS).abs() < 1e-6);
}

#[test]
fn full_board_without_line_is_a_draw() {
    // X O X
    // X O O
    // O X X
    let mut x = Script(vec![0, 2, 3, 7, 8]);
    let mut o = Script(vec![1, 4, 5, 6]);
    let policies: Vec<&mut dyn Policy> = vec![&mut x as &mut dyn Policy, &mut o];
    let mut engine = Engine::new(GridGame::new(2), policies).unwrap();

    assert_eq!(engine.run().unwrap(), None);
    assert_eq!(engine.status(), EngineStatus::Done);
    let last = engine.history().last().unwrap();
    assert_eq!(last.action, Action::new(2, 2));
    assert_eq!(last.reward, 0.0);
    let metrics = engine.game().metrics();
    assert_eq!(metrics.total_turns, 9);
    assert_eq!(metrics.winner, None);
    assert_eq!(metrics.fill_percent, 100.0);
}

#[test]
fn learner_vs_random_produces_replay() {
    let mut dqn = DqnPolicy::new(
        "DQN",
        DqnConfig {
            batch_size: 2,
            hidden_size: 8,
            seed: Some(5),
            ..Default::default()
        },
    );
    let mut random = RandomPolicy::with_seed("Random", 9);

    let dir = tempfile::tempdir().unwrap();
    for game_idx in 0..4 {
        let policies: Vec<&mut dyn Policy> = if game_idx % 2 == 0 {
            vec![&mut dqn as &mut dyn Policy, &mut random]
        } else {
            vec![&mut random as &mut dyn Policy, &mut dqn]
        };
        let mut engine = Engine::new(GridGame::new(2), policies).unwrap();
        let winner = engine.run().unwrap();

        let replay = engine.replay();
        assert_eq!(replay.metrics.winner, winner);
        assert_eq!(replay.turns.len(), replay.metrics.total_turns);
        let path = dir.path().join(format!("replay_{:04}.json", game_idx));
        replay.save(&path).unwrap();
        assert_eq!(GameReplay::load(&path).unwrap(), replay);

        drop(engine);
        dqn.end_episode();
    }

    assert_eq!(dqn.episode_count(), 4);
    assert!(dqn.replay_len() >= 8);
    assert!(dqn.step_count() > 0);
}
