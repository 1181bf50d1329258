//! Tests for the Mastermind session.

use breakroom_mastermind::{
    Board, BoardConfig, Color, GameStatus, MastermindGame, Move, MoveError, Peg,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn game_with_secret(secret: &[u8], guesses: usize) -> MastermindGame {
    let board = Board::with_secret(secret.iter().copied().map(Color).collect(), 6, guesses).unwrap();
    let mut game = MastermindGame::with_board("g1".into(), "alice".into(), board);
    game.start();
    game
}

fn guess(game: &mut MastermindGame, colors: &[u8]) -> GameStatus {
    for c in colors {
        game.apply_move("alice", Move::Color(Color(*c))).unwrap();
    }
    game.apply_move("alice", Move::Submit).unwrap()
}

#[test]
fn test_not_started() {
    let board = Board::with_secret(vec![Color(0), Color(1)], 4, 3).unwrap();
    let mut game = MastermindGame::with_board("g1".into(), "alice".into(), board);
    assert_eq!(
        game.apply_move("alice", Move::Undo).unwrap_err(),
        MoveError::NotStarted
    );
    assert!(game.history().is_empty());
}

#[test]
fn test_start_records_opening_board() {
    let game = game_with_secret(&[0, 1, 2, 3], 6);
    assert_eq!(game.status(), GameStatus::InProgress);
    assert_eq!(game.history().len(), 1);
    assert!(game.history()[0].played.is_none());
}

#[test]
fn test_only_owner_may_move() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 6);
    let before = game.clone();
    assert_eq!(
        game.apply_move("bob", Move::Color(Color(1))).unwrap_err(),
        MoveError::NotYourGame {
            owner: "alice".into()
        }
    );
    assert_eq!(game, before);
}

#[test]
fn test_sequencing_errors_leave_game_unchanged() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 6);
    let before = game.clone();
    assert_eq!(
        game.apply_move("alice", Move::Undo).unwrap_err(),
        MoveError::NothingToUndo
    );
    assert_eq!(
        game.apply_move("alice", Move::Submit).unwrap_err(),
        MoveError::MustCompleteCode
    );
    assert_eq!(game, before);

    for c in [4, 4, 4, 4] {
        game.apply_move("alice", Move::Color(Color(c))).unwrap();
    }
    assert_eq!(
        game.apply_move("alice", Move::Color(Color(5))).unwrap_err(),
        MoveError::MustSubmitGuess
    );
}

#[test]
fn test_undo_on_full_row() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 6);
    for c in [5, 4, 3, 2] {
        game.apply_move("alice", Move::Color(Color(c))).unwrap();
    }
    game.apply_move("alice", Move::Undo).unwrap();
    game.apply_move("alice", Move::Color(Color(3))).unwrap();
    assert_eq!(
        game.board().rows()[0].slots(),
        &[Some(Color(5)), Some(Color(4)), Some(Color(3)), Some(Color(3))]
    );
}

#[test]
fn test_win_ends_game() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 6);
    assert_eq!(guess(&mut game, &[3, 2, 1, 0]), GameStatus::InProgress);
    assert_eq!(guess(&mut game, &[0, 1, 2, 3]), GameStatus::Won);
    assert!(game.is_terminal());
    assert!(game.ended_at().is_some());
    assert_eq!(game.guesses_used(), 2);
    assert_eq!(
        game.apply_move("alice", Move::Undo).unwrap_err(),
        MoveError::GameOver
    );
}

#[test]
fn test_loss_on_last_row() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 3);
    assert_eq!(guess(&mut game, &[4, 5, 4, 5]), GameStatus::InProgress);
    assert_eq!(guess(&mut game, &[1, 0, 3, 2]), GameStatus::InProgress);
    assert_eq!(guess(&mut game, &[0, 1, 3, 2]), GameStatus::Lost);
    assert_eq!(game.secret(), &[Color(0), Color(1), Color(2), Color(3)]);
    assert_eq!(
        game.board().rows()[2].feedback(),
        &[Peg::Black, Peg::Black, Peg::White, Peg::White]
    );
}

#[test]
fn test_history_snapshots_are_independent() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 6);
    game.apply_move("alice", Move::Color(Color(2))).unwrap();
    game.apply_move("alice", Move::Undo).unwrap();

    let history = game.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].played, Some(Move::Color(Color(2))));
    assert_eq!(history[1].board.rows()[0].slots()[0], Some(Color(2)));
    assert_eq!(history[2].board.rows()[0].slots()[0], None);
}

#[test]
fn test_seeded_game_is_reproducible() {
    let a = MastermindGame::new(
        "a".into(),
        "alice".into(),
        BoardConfig::default(),
        &mut StdRng::seed_from_u64(42),
    )
    .unwrap();
    let b = MastermindGame::new(
        "b".into(),
        "alice".into(),
        BoardConfig::default(),
        &mut StdRng::seed_from_u64(42),
    )
    .unwrap();
    assert_eq!(a.secret(), b.secret());
}

#[test]
fn test_serde_round_trip() {
    let mut game = game_with_secret(&[0, 1, 2, 3], 6);
    guess(&mut game, &[0, 1, 5, 4]);
    let json = serde_json::to_string(&game).unwrap();
    let back: MastermindGame = serde_json::from_str(&json).unwrap();
    assert_eq!(back, game);
}
