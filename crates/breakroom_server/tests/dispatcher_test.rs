//! Tests for the move dispatcher against in-memory collaborators.

mod common;

use breakroom_connect4::{Coord, MoveError as Connect4MoveError};
use breakroom_mastermind::MoveError as MastermindMoveError;
use breakroom_server::{
    BoardImage, DispatchError, DispatchOutcome, GameKind, GameOutcome, IgnoreReason, MemoryStore,
    MoveRejection, ServerConfig, SessionRecord, SessionStore, StartConnect4, StartError,
    StartMastermind, Started,
};
use common::{Harness, RESPONSE_URL, block_texts, connect4_press, mastermind_press, press};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn challenge(challenger: &str, opponent: &str, theme: Option<&str>) -> StartConnect4 {
    StartConnect4 {
        challenger_id: challenger.into(),
        challenger_name: "alice".into(),
        opponent_id: opponent.into(),
        opponent_name: Some("bob".into()),
        channel_id: "C1".into(),
        theme: theme.map(str::to_string),
    }
}

async fn stored(store: &MemoryStore, game_id: &str) -> Option<Vec<u8>> {
    store.get(game_id).await.unwrap()
}

/// The last message that replaced the game message, skipping recap posts.
fn final_game_message(harness: &Harness) -> serde_json::Value {
    harness
        .notifier
        .sent()
        .into_iter()
        .rev()
        .find(|(_, message)| message["replace_original"] == true)
        .unwrap()
        .1
}

/// Plays `moves` as (user, column) presses, returning the last outcome.
async fn play_connect4(harness: &Harness, game_id: &str, moves: &[(&str, usize)]) -> DispatchOutcome {
    let mut last = None;
    for (user, column) in moves {
        last = Some(
            harness
                .dispatcher
                .handle_interaction(&connect4_press(user, game_id, *column))
                .await
                .unwrap(),
        );
    }
    last.unwrap()
}

async fn start_connect4(harness: &Harness) -> Started {
    harness
        .dispatcher
        .start_connect4(challenge("U1", "U2", None))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_start_connect4_stores_session() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;

    assert_eq!(started.message["response_type"], "in_channel");
    let blocks = started.message["blocks"].as_array().unwrap();
    let actions = blocks.iter().find(|b| b["type"] == "actions").unwrap();
    assert_eq!(actions["block_id"], started.game_id.as_str());
    assert!(block_texts(&started.message).contains(&"<@U1>'s Turn".to_string()));

    let bytes = stored(&harness.store, &started.game_id).await.unwrap();
    let record = SessionRecord::decode(&bytes).unwrap();
    assert_eq!(record.theme(), "classic");
    assert_eq!(record.frames().len(), 1);
    assert_eq!(record.display_name("U2"), "bob");
    assert_eq!(record.game().session().kind(), GameKind::Connect4);
}

#[tokio::test]
async fn test_start_mastermind_uses_owner() {
    let harness = Harness::new();
    let started = harness
        .dispatcher
        .start_mastermind(StartMastermind {
            owner_id: "U1".into(),
            owner_name: "alice".into(),
            channel_id: "C1".into(),
            theme: Some("CANDY".into()),
        })
        .await
        .unwrap();

    let texts = block_texts(&started.message);
    assert_eq!(texts[0], "<@U1>'s game");
    assert!(texts.contains(&"Guess the code...".to_string()));

    let record =
        SessionRecord::decode(&stored(&harness.store, &started.game_id).await.unwrap()).unwrap();
    assert_eq!(record.theme(), "candy");
}

#[tokio::test]
async fn test_start_rejects_self_play() {
    let harness = Harness::new();
    let err = harness
        .dispatcher
        .start_connect4(challenge("U1", "U1", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StartError::SelfPlayNotAllowed));
    assert!(err.is_user_error());
    assert!(harness.store.is_empty().await);
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_rejects_unknown_theme() {
    let harness = Harness::new();
    let err = harness
        .dispatcher
        .start_connect4(challenge("U1", "U2", Some("neon")))
        .await
        .unwrap_err();
    match &err {
        StartError::UnknownTheme(unknown) => {
            assert_eq!(unknown.name, "neon");
            assert!(unknown.available.contains(&"classic".to_string()));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("Available connect4 themes"));
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn test_start_render_failure_stores_nothing() {
    let harness = Harness::new();
    harness.renderer.fail.store(true, Ordering::SeqCst);
    let err = harness
        .dispatcher
        .start_connect4(challenge("U1", "U2", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StartError::Dispatch(DispatchError::Render(_))));
    assert!(!err.is_user_error());
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn test_connect4_move_updates_message_and_store() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;

    let outcome = harness
        .dispatcher
        .handle_interaction(&connect4_press("U1", &started.game_id, 4))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Applied { terminal: false });

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, RESPONSE_URL);
    assert_eq!(sent[0].1["replace_original"], true);
    assert!(block_texts(&sent[0].1).contains(&"<@U2>'s Turn".to_string()));

    let record =
        SessionRecord::decode(&stored(&harness.store, &started.game_id).await.unwrap()).unwrap();
    assert_eq!(record.frames().len(), 2);
    assert_eq!(record.game().session().moves_played(), 1);
}

#[tokio::test]
async fn test_wrong_turn_is_silent() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;
    let before = stored(&harness.store, &started.game_id).await;

    let outcome = harness
        .dispatcher
        .handle_interaction(&connect4_press("U2", &started.game_id, 1))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Rejected(MoveRejection::Connect4(Connect4MoveError::NotYourTurn {
            actor: "U2".into()
        }))
    );
    assert!(harness.notifier.sent().is_empty());
    assert_eq!(stored(&harness.store, &started.game_id).await, before);
}

#[tokio::test]
async fn test_mastermind_error_shown_inline() {
    let harness = Harness::new();
    let before = harness.seed_mastermind("mm-1", "U1").await;

    let outcome = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", -1))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Rejected(MoveRejection::Mastermind(MastermindMoveError::NothingToUndo))
    );

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(
        block_texts(&sent[0].1)
            .contains(&":red_circle: *Nothing to undo in the current code* :red_circle:".to_string())
    );
    assert_eq!(stored(&harness.store, "mm-1").await, Some(before));
}

#[tokio::test]
async fn test_mastermind_other_user_is_silent() {
    let harness = Harness::new();
    let before = harness.seed_mastermind("mm-1", "U1").await;

    let outcome = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U2", "mm-1", 0))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DispatchOutcome::Rejected(MoveRejection::Mastermind(
            MastermindMoveError::NotYourGame { .. }
        ))
    ));
    assert!(harness.notifier.sent().is_empty());
    assert_eq!(stored(&harness.store, "mm-1").await, Some(before));
}

#[tokio::test]
async fn test_failed_notification_leaves_store_unchanged() {
    let harness = Harness::new();
    let before = harness.seed_mastermind("mm-1", "U1").await;
    harness.notifier.fail.store(true, Ordering::SeqCst);

    let err = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Notify(_)));
    assert_eq!(stored(&harness.store, "mm-1").await, Some(before));
}

#[tokio::test]
async fn test_failed_render_leaves_store_unchanged() {
    let harness = Harness::new();
    let before = harness.seed_mastermind("mm-1", "U1").await;
    harness.renderer.fail.store(true, Ordering::SeqCst);

    let err = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Render(_)));
    assert!(harness.notifier.sent().is_empty());
    assert_eq!(stored(&harness.store, "mm-1").await, Some(before));
}

#[tokio::test]
async fn test_slow_renderer_times_out() {
    let config = ServerConfig::from_toml("collaborator_timeout_ms = 50").unwrap();
    let harness = Harness::with_config(config);
    let before = harness.seed_mastermind("mm-1", "U1").await;
    *harness.renderer.delay.lock().unwrap() = Some(Duration::from_secs(2));

    let err = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Timeout {
            collaborator: "renderer",
            timeout_ms: 50
        }
    ));
    assert_eq!(stored(&harness.store, "mm-1").await, Some(before));
}

#[tokio::test]
async fn test_unknown_session_is_ignored() {
    let harness = Harness::new();
    let outcome = harness
        .dispatcher
        .handle_interaction(&connect4_press("U1", "gone", 1))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Ignored(IgnoreReason::SessionNotFound));
    assert!(harness.notifier.sent().is_empty());
    assert_eq!(harness.renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_press_is_an_error() {
    let harness = Harness::new();
    let err = harness
        .dispatcher
        .handle_interaction(&press("U1", "poll-vote", "g1", "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_duplicate_presses_apply_in_turn() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;
    *harness.renderer.delay.lock().unwrap() = Some(Duration::from_millis(20));

    let first = {
        let dispatcher = harness.dispatcher.clone();
        let payload = connect4_press("U1", &started.game_id, 1);
        tokio::spawn(async move { dispatcher.handle_interaction(&payload).await.unwrap() })
    };
    let second = {
        let dispatcher = harness.dispatcher.clone();
        let payload = connect4_press("U1", &started.game_id, 1);
        tokio::spawn(async move { dispatcher.handle_interaction(&payload).await.unwrap() })
    };
    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    let applied = outcomes
        .iter()
        .filter(|o| **o == DispatchOutcome::Applied { terminal: false })
        .count();
    let rejected = outcomes
        .iter()
        .filter(|o| {
            matches!(
                o,
                DispatchOutcome::Rejected(MoveRejection::Connect4(
                    Connect4MoveError::NotYourTurn { .. }
                ))
            )
        })
        .count();
    assert_eq!((applied, rejected), (1, 1));

    let record =
        SessionRecord::decode(&stored(&harness.store, &started.game_id).await.unwrap()).unwrap();
    assert_eq!(record.game().session().moves_played(), 1);
}

#[tokio::test]
async fn test_winning_guess_closes_session_and_records_history() {
    let harness = Harness::new();
    harness.seed_mastermind("mm-1", "U1").await;

    for value in [0, 1, 2, 3] {
        let outcome = harness
            .dispatcher
            .handle_interaction(&mastermind_press("U1", "mm-1", value))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Applied { terminal: false });
    }
    let outcome = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", -2))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Applied { terminal: true });
    assert!(!harness.store.exists("mm-1").await.unwrap());

    let final_message = harness
        .notifier
        .sent()
        .into_iter()
        .rev()
        .find(|(_, message)| message["replace_original"] == true)
        .unwrap()
        .1;
    assert!(final_message["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|b| b["type"] != "actions"));
    assert!(block_texts(&final_message).contains(&":tada: *You won!!* :confetti_ball:".to_string()));

    let late = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", 0))
        .await
        .unwrap();
    assert_eq!(late, DispatchOutcome::Ignored(IgnoreReason::SessionNotFound));

    let (notifier, recorder) = harness.drain().await;
    let records = recorder.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.game_id, "mm-1");
    assert_eq!(record.kind, GameKind::Mastermind);
    assert_eq!(record.moves_count, 5);
    assert_eq!(record.players.len(), 1);
    assert_eq!(record.players[0].outcome, GameOutcome::Win);
    assert_eq!(
        record.recap_url.as_deref(),
        Some("https://img.test/mm-1/recap-6.gif")
    );

    let (_, recap) = notifier.sent().last().unwrap().clone();
    assert_eq!(recap["response_type"], "in_channel");
    assert_eq!(recap["text"], "<@U1> cracked the code in 1 guesses");
}

#[tokio::test]
async fn test_start_connect4_renders_player_banner() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;

    let banners = harness.renderer.banners();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].game_id, started.game_id);
    assert_eq!(banners[0].players, vec!["alice".to_string(), "bob".to_string()]);

    let banner_url = format!("https://img.test/{}/banner.png", started.game_id);
    assert_eq!(started.message["blocks"][1]["image_url"], banner_url.as_str());
    let record =
        SessionRecord::decode(&stored(&harness.store, &started.game_id).await.unwrap()).unwrap();
    assert_eq!(record.banner_url().as_deref(), Some(banner_url.as_str()));

    play_connect4(&harness, &started.game_id, &[("U1", 3)]).await;
    let message = final_game_message(&harness);
    assert_eq!(message["blocks"][1]["image_url"], banner_url.as_str());
}

#[tokio::test]
async fn test_mastermind_start_has_no_banner() {
    let harness = Harness::new();
    harness
        .dispatcher
        .start_mastermind(StartMastermind {
            owner_id: "U1".into(),
            owner_name: "alice".into(),
            channel_id: "C1".into(),
            theme: None,
        })
        .await
        .unwrap();
    assert!(harness.renderer.banners().is_empty());
}

#[tokio::test]
async fn test_connect4_win_closes_session_and_records_both_players() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;

    let outcome = play_connect4(
        &harness,
        &started.game_id,
        &[("U1", 1), ("U2", 2), ("U1", 1), ("U2", 2), ("U1", 1), ("U2", 2), ("U1", 1)],
    )
    .await;
    assert_eq!(outcome, DispatchOutcome::Applied { terminal: true });
    assert!(!harness.store.exists(&started.game_id).await.unwrap());

    match harness.renderer.last_request().unwrap().board {
        BoardImage::Connect4 { highlight, .. } => assert_eq!(
            highlight,
            vec![
                Coord::new(2, 0),
                Coord::new(3, 0),
                Coord::new(4, 0),
                Coord::new(5, 0)
            ]
        ),
        other => panic!("unexpected board {:?}", other),
    }

    let message = final_game_message(&harness);
    assert!(message["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|b| b["type"] != "actions"));
    assert!(block_texts(&message).contains(&"<@U1> WON!!!".to_string()));

    let (notifier, recorder) = harness.drain().await;
    let records = recorder.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.kind, GameKind::Connect4);
    assert_eq!(record.moves_count, 7);
    assert_eq!(record.players.len(), 2);
    assert_eq!(record.players[0].player_id, "U1");
    assert_eq!(record.players[0].outcome, GameOutcome::Win);
    assert_eq!(record.players[1].player_id, "U2");
    assert_eq!(record.players[1].outcome, GameOutcome::Loss);

    let (_, recap) = notifier.sent().last().unwrap().clone();
    assert_eq!(recap["text"], "<@U1> beat <@U2> at Connect 4 in 7 moves");
}

#[tokio::test]
async fn test_connect4_tie_records_a_draw_for_both() {
    let config = ServerConfig::from_toml("[connect4]\nrows = 2\ncols = 2").unwrap();
    let harness = Harness::with_config(config);
    let started = start_connect4(&harness).await;

    let outcome = play_connect4(
        &harness,
        &started.game_id,
        &[("U1", 1), ("U2", 2), ("U1", 1), ("U2", 2)],
    )
    .await;
    assert_eq!(outcome, DispatchOutcome::Applied { terminal: true });
    assert!(!harness.store.exists(&started.game_id).await.unwrap());

    match harness.renderer.last_request().unwrap().board {
        BoardImage::Connect4 { highlight, .. } => assert_eq!(highlight, vec![Coord::new(0, 1)]),
        other => panic!("unexpected board {:?}", other),
    }
    assert!(block_texts(&final_game_message(&harness)).contains(&"It's a Tie!".to_string()));

    let (notifier, recorder) = harness.drain().await;
    let records = recorder.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert!(records[0]
        .players
        .iter()
        .all(|p| p.outcome == GameOutcome::Draw));
    assert_eq!(records[0].players.len(), 2);

    let (_, recap) = notifier.sent().last().unwrap().clone();
    assert_eq!(recap["text"], "Connect 4 between <@U1> and <@U2> ended in a tie");
}

#[tokio::test]
async fn test_mastermind_last_wrong_guess_records_loss() {
    let harness = Harness::new();
    harness.seed_mastermind_with_guesses("mm-1", "U1", 1).await;

    for value in [4, 5, 4, 5] {
        harness
            .dispatcher
            .handle_interaction(&mastermind_press("U1", "mm-1", value))
            .await
            .unwrap();
    }
    let outcome = harness
        .dispatcher
        .handle_interaction(&mastermind_press("U1", "mm-1", -2))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Applied { terminal: true });
    assert!(!harness.store.exists("mm-1").await.unwrap());

    match harness.renderer.last_request().unwrap().board {
        BoardImage::Mastermind { secret, .. } => assert_eq!(secret.map(|s| s.len()), Some(4)),
        other => panic!("unexpected board {:?}", other),
    }
    assert!(block_texts(&final_game_message(&harness))
        .iter()
        .any(|text| text.starts_with(":disappointed: *You failed to guess the code of ")));

    let (notifier, recorder) = harness.drain().await;
    let records = recorder.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].moves_count, 5);
    assert_eq!(records[0].players.len(), 1);
    assert_eq!(records[0].players[0].outcome, GameOutcome::Loss);

    let (_, recap) = notifier.sent().last().unwrap().clone();
    assert!(recap["text"]
        .as_str()
        .unwrap()
        .starts_with("<@U1> ran out of guesses, the code was "));
}

#[tokio::test]
async fn test_corrupted_session_is_a_codec_error() {
    let harness = Harness::new();
    let started = start_connect4(&harness).await;
    let bytes = stored(&harness.store, &started.game_id).await.unwrap();
    let mut json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    json["game"]["game"]["board"]["cells"]
        .as_array_mut()
        .unwrap()
        .truncate(5);
    let corrupted = serde_json::to_vec(&json).unwrap();
    harness
        .store
        .put(&started.game_id, corrupted.clone())
        .await
        .unwrap();

    let err = harness
        .dispatcher
        .handle_interaction(&connect4_press("U1", &started.game_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Codec(_)));
    assert!(harness.notifier.sent().is_empty());
    assert_eq!(stored(&harness.store, &started.game_id).await, Some(corrupted));
}
