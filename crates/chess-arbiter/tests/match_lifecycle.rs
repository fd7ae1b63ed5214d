//! Integration tests for the match entity driven through the manager.
//!
//! These tests verify the core lifecycle functionality:
//! - Creating matches
//! - Making moves
//! - Pause and resume
//! - Resignation
//! - Draw offers and acceptance
//! - Serialization round-trips and draw bookkeeping

use std::sync::Arc;

use chess_arbiter::{
    ArbiterError, HistoryFormat, Match, MatchId, MatchManager, MatchResult, MatchStatus,
    MemoryMatchStore, MoveHistory, PlayerId, ResultDetail, TimeControl,
};

fn manager() -> MatchManager {
    MatchManager::with_default_config(Arc::new(MemoryMatchStore::new()))
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_full_lifecycle_scenario() {
    let manager = manager();
    let (a, b) = (PlayerId::new(), PlayerId::new());
    let game = manager.create(a, b, None).await.unwrap();

    manager.apply_move(game.id(), "e4").await.unwrap();
    manager.apply_move(game.id(), "e5").await.unwrap();

    manager.pause(game.id(), a).await.unwrap();

    let err = manager.apply_move(game.id(), "Nf3").await.unwrap_err();
    let ArbiterError::IllegalState { reason } = err else {
        panic!("expected illegal state");
    };
    assert_eq!(reason, "paused");

    manager.resume(game.id()).await.unwrap();
    manager.apply_move(game.id(), "Nf3").await.unwrap();

    let loaded = manager.get(game.id()).await.unwrap().unwrap();
    assert_eq!(loaded.move_log(), ["e4", "e5", "Nf3"]);
    assert_eq!(loaded.status(), MatchStatus::Active);
}

#[tokio::test]
async fn test_new_match_initial_properties() {
    let manager = manager();
    let (a, b) = (PlayerId::new(), PlayerId::new());
    let game = manager.create(a, b, None).await.unwrap();

    assert_eq!(game.status(), MatchStatus::Active);
    assert_eq!(game.turn(), a);
    assert!(game.move_log().is_empty());
    assert_eq!(game.position_history().values().sum::<u32>(), 1);
}

#[tokio::test]
async fn test_completed_match_rejects_all_mutations() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();
    let (white, black) = (game.white(), game.black());

    manager
        .complete(game.id(), MatchResult::Draw)
        .await
        .unwrap();
    let before = manager.get(game.id()).await.unwrap().unwrap().dump();

    assert!(manager.apply_move(game.id(), "e4").await.is_err());
    assert!(manager.pause(game.id(), white).await.is_err());
    assert!(manager.resign(game.id(), black).await.is_err());
    assert!(manager.offer_draw(game.id(), white).await.is_err());
    assert!(manager
        .complete(game.id(), MatchResult::Draw)
        .await
        .is_err());

    let after = manager.get(game.id()).await.unwrap().unwrap().dump();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_checkmate_ends_the_match_atomically() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();

    for san in ["f3", "e5", "g4"] {
        manager.apply_move(game.id(), san).await.unwrap();
    }
    let applied = manager.apply_move(game.id(), "Qh4#").await.unwrap();

    assert!(applied.match_over);
    assert_eq!(applied.result, Some(MatchResult::BlackWins));
    assert_eq!(applied.result_detail, Some(ResultDetail::Checkmate));

    let loaded = manager.get(game.id()).await.unwrap().unwrap();
    assert_eq!(loaded.status(), MatchStatus::Completed);
}

#[tokio::test]
async fn test_rejected_move_reports_reason_and_suggestion() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();

    let err = manager.apply_move(game.id(), "Ne5").await.unwrap_err();
    let ArbiterError::InvalidMove { reason, suggestion } = err else {
        panic!("expected invalid move");
    };
    assert!(reason.contains("Ne5"));
    assert!(suggestion.is_some());

    let probe = manager.validate_move(game.id(), "Ne5").await.unwrap();
    assert!(!probe.valid);
    assert!(probe.suggestion.is_some());

    let probe = manager.validate_move(game.id(), "e4").await.unwrap();
    assert!(probe.valid);
}

// =============================================================================
// Draw offers
// =============================================================================

#[tokio::test]
async fn test_draw_offer_asymmetry() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();
    let (white, black) = (game.white(), game.black());

    manager.offer_draw(game.id(), white).await.unwrap();

    // The offering participant cannot accept their own offer
    let err = manager.accept_draw(game.id(), white).await.unwrap_err();
    let ArbiterError::IllegalState { reason } = err else {
        panic!("expected illegal state");
    };
    assert_eq!(reason, "cannot accept own offer");

    // The other participant can
    let updated = manager.accept_draw(game.id(), black).await.unwrap();
    assert_eq!(updated.status(), MatchStatus::Completed);
    assert_eq!(updated.result(), Some(MatchResult::Draw));
    assert_eq!(updated.result_detail(), Some(ResultDetail::DrawAgreement));
}

#[tokio::test]
async fn test_decline_clears_the_offer() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();

    assert!(manager.decline_draw(game.id()).await.is_err());

    manager.offer_draw(game.id(), game.black()).await.unwrap();
    let updated = manager.decline_draw(game.id()).await.unwrap();
    assert!(updated.draw_offer().is_none());
    assert_eq!(updated.status(), MatchStatus::Active);
}

#[tokio::test]
async fn test_resignation_awards_the_other_side() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();

    let updated = manager.resign(game.id(), game.white()).await.unwrap();
    assert_eq!(updated.result(), Some(MatchResult::BlackWins));
    assert_eq!(updated.result_detail(), Some(ResultDetail::Resignation));
}

// =============================================================================
// Draw bookkeeping
// =============================================================================

#[tokio::test]
async fn test_repetition_counting_over_a_shuffle() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();

    let status = manager.draw_status(game.id()).await.unwrap().unwrap();
    assert_eq!(status.repetition_count, 1);

    for san in ["Nf3", "Nf6", "Ng1", "Ng8"] {
        manager.apply_move(game.id(), san).await.unwrap();
    }
    let status = manager.draw_status(game.id()).await.unwrap().unwrap();
    assert_eq!(status.repetition_count, 2);
    assert!(status.is_approaching_repetition);

    for san in ["Nf3", "Nf6", "Ng1", "Ng8"] {
        manager.apply_move(game.id(), san).await.unwrap();
    }
    let status = manager.draw_status(game.id()).await.unwrap().unwrap();
    assert_eq!(status.repetition_count, 3);
}

#[tokio::test]
async fn test_draw_status_is_none_when_not_active() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();

    manager.pause(game.id(), game.white()).await.unwrap();
    assert!(manager.draw_status(game.id()).await.unwrap().is_none());

    manager.resume(game.id()).await.unwrap();
    manager
        .complete(game.id(), MatchResult::Draw)
        .await
        .unwrap();
    assert!(manager.draw_status(game.id()).await.unwrap().is_none());
}

// =============================================================================
// Serialization
// =============================================================================

#[tokio::test]
async fn test_serialize_deserialize_serialize_is_idempotent() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), Some(TimeControl::BLITZ))
        .await
        .unwrap();
    for san in ["e4", "c5", "Nf3"] {
        manager.apply_move(game.id(), san).await.unwrap();
    }
    manager.offer_draw(game.id(), game.white()).await.unwrap();

    let loaded = manager.get(game.id()).await.unwrap().unwrap();
    let first = loaded.dump();

    let json = serde_json::to_string(&first).unwrap();
    let reparsed: chess_arbiter::MatchDump = serde_json::from_str(&json).unwrap();
    let second = Match::restore(reparsed).unwrap().dump();

    assert_eq!(first, second);
    assert_eq!(first.position_history, second.position_history);
}

#[tokio::test]
async fn test_restore_rederives_turn_from_position() {
    let mut game = Match::new(MatchId::new(), PlayerId::new(), PlayerId::new(), None);
    game.apply_move("e4").unwrap();

    let restored = Match::restore(game.dump()).unwrap();
    assert_eq!(restored.turn(), game.black());
}

#[tokio::test]
async fn test_restore_rejects_tampered_move_log() {
    let mut game = Match::new(MatchId::new(), PlayerId::new(), PlayerId::new(), None);
    game.apply_move("e4").unwrap();

    let mut dump = game.dump();
    dump.move_log.push("Ra5".to_string());
    let err = Match::restore(dump).unwrap_err();
    assert!(matches!(err, ArbiterError::CorruptState { .. }));
}

// =============================================================================
// History projections
// =============================================================================

#[tokio::test]
async fn test_move_history_shapes() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();
    for san in ["e4", "d5", "exd5"] {
        manager.apply_move(game.id(), san).await.unwrap();
    }

    let MoveHistory::Plain(plain) = manager
        .move_history(game.id(), HistoryFormat::Plain)
        .await
        .unwrap()
    else {
        panic!("expected plain history");
    };
    assert_eq!(plain, ["e4", "d5", "exd5"]);

    let MoveHistory::WithPositions(positions) = manager
        .move_history(game.id(), HistoryFormat::WithPositions)
        .await
        .unwrap()
    else {
        panic!("expected positions history");
    };
    assert_eq!(positions.len(), 3);

    let MoveHistory::Detailed(detailed) = manager
        .move_history(game.id(), HistoryFormat::Detailed)
        .await
        .unwrap()
    else {
        panic!("expected detailed history");
    };
    assert!(detailed[2].is_capture);

    let pgn = manager.pgn(game.id()).await.unwrap();
    assert!(pgn.ends_with("1. e4 d5 2. exd5 *\n"));
}

// =============================================================================
// Clocks
// =============================================================================

#[tokio::test]
async fn test_untimed_match_never_grows_clocks() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), None)
        .await
        .unwrap();
    manager.apply_move(game.id(), "e4").await.unwrap();

    let loaded = manager.get(game.id()).await.unwrap().unwrap();
    assert!(loaded.time_control().is_none());
    assert!(loaded
        .time_remaining(chess_arbiter::Color::White)
        .is_none());
}

#[tokio::test]
async fn test_timed_match_keeps_clocks_present() {
    let manager = manager();
    let game = manager
        .create(PlayerId::new(), PlayerId::new(), Some(TimeControl::RAPID))
        .await
        .unwrap();
    manager.apply_move(game.id(), "e4").await.unwrap();

    let loaded = manager.get(game.id()).await.unwrap().unwrap();
    assert!(loaded
        .time_remaining(chess_arbiter::Color::White)
        .is_some());
    assert!(loaded
        .time_remaining(chess_arbiter::Color::Black)
        .is_some());
}
