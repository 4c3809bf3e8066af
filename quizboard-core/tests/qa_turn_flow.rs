//! QA tests for complete turns against a scripted model.
//!
//! No network access is needed; the model and icon search are mocks.
//! Run with: `cargo test -p quizboard-core --test qa_turn_flow`

use quizboard_core::game::{Challenge, GameEvent};
use quizboard_core::generation::fallback::FALLBACK_QUESTION;
use quizboard_core::testing::{assert_mastered, assert_phase, assert_score, assert_streak};
use quizboard_core::{
    CornerRole, GameSession, MemoryStore, MockIcons, MockModel, MockReply, Pacing, Phase,
    SaveSlot, Services, SessionConfig, TestHarness,
};
use std::sync::Arc;

fn offline_session(model: MockModel, store: Arc<MemoryStore>, seed: u64) -> GameSession {
    let services = Services::new(Arc::new(model), Arc::new(MockIcons::new()), store);
    GameSession::new(SessionConfig::new("Logistics"), services)
        .with_pacing(Pacing::instant())
        .with_seed(seed)
}

/// Roll until a property question opens. Returns the score just before the question.
async fn roll_to_question(session: &mut GameSession) -> u64 {
    for _ in 0..40 {
        session.roll().await.expect("roll failed");
        if session.phase() == Phase::AwaitingAnswer {
            return session.game().player().score;
        }
        assert_phase(session.game(), Phase::AwaitingRoll);
    }
    panic!("no question opened in 40 rolls");
}

// =============================================================================
// Offline play on canned content
// =============================================================================

#[tokio::test]
async fn test_offline_correct_answer_scores_and_masters() {
    let store = Arc::new(MemoryStore::new());
    let mut session = offline_session(MockModel::failing(), store.clone(), 7);
    session.start().await.unwrap();

    let board = session.game().board();
    assert_eq!(board.tile(1).name, "Logistics 1");
    assert_eq!(board.tile(19).name, "Logistics 16");

    let before = roll_to_question(&mut session).await;
    let tile_index = match session.game().challenge() {
        Some(Challenge::Question(q)) => {
            assert_eq!(q.question, *FALLBACK_QUESTION);
            q.tile_index
        }
        other => panic!("expected a question, got {other:?}"),
    };

    let events = session.answer(1).await.unwrap();
    assert_eq!(
        events[0],
        GameEvent::AnswerCorrect {
            reward: 110,
            streak: 1
        }
    );
    assert!(events.contains(&GameEvent::TileMastered { index: tile_index }));
    assert_score(session.game(), before + 110);
    assert_streak(session.game(), 1);
    assert_eq!(session.game().player().xp, 50);
    assert_mastered(session.game(), tile_index);

    let saved = SaveSlot::new(store).load().await.unwrap();
    assert_eq!(saved.score, before + 110);
    assert!(saved.tiles[tile_index].mastered);

    session.acknowledge().unwrap();
    assert_phase(session.game(), Phase::AwaitingRoll);
}

#[tokio::test]
async fn test_offline_wrong_answer_costs_fifty() {
    let store = Arc::new(MemoryStore::new());
    let mut session = offline_session(MockModel::failing(), store, 11);
    session.start().await.unwrap();

    let before = roll_to_question(&mut session).await;
    session.answer(0).await.unwrap();
    assert_score(session.game(), before.saturating_sub(50));
    assert_streak(session.game(), 0);
}

#[test]
fn test_harness_scenario_from_thousand_credits() {
    let mut harness = TestHarness::new();
    harness.open_question(3, FALLBACK_QUESTION.clone());
    harness.game.answer(1).unwrap();

    assert_score(&harness.game, 1110);
    assert_streak(&harness.game, 1);
    assert_eq!(harness.game.player().xp, 50);
    assert_mastered(&harness.game, 3);
}

// =============================================================================
// Board generation
// =============================================================================

#[tokio::test]
async fn test_short_concept_list_fills_board_cyclically() {
    let reply = r#"Sure! ```json
{"title": "Port Operations", "tiles": ["Cranes", "Berths", {"name": "Customs", "keyword": "passport"}],}
```"#;
    let model = MockModel::new().with_reply(MockReply::text(reply));
    let mut session = offline_session(model, Arc::new(MemoryStore::new()), 3);
    session.start().await.unwrap();

    let board = session.game().board();
    assert_eq!(board.title(), Some("Port Operations"));
    assert_eq!(board.tiles().len(), 20);
    assert_eq!(board.properties().count(), 16);

    let names: Vec<&str> = board.properties().map(|t| t.name.as_str()).collect();
    for (ordinal, name) in names.iter().enumerate() {
        assert_eq!(*name, ["Cranes", "Berths", "Customs"][ordinal % 3]);
    }

    for (index, role) in [
        (0, CornerRole::Start),
        (5, CornerRole::Break),
        (10, CornerRole::Bonus),
        (15, CornerRole::Risk),
    ] {
        assert_eq!(board.tile(index).corner_role(), Some(role));
        assert_eq!(board.tile(index).name, role.name());
    }
}

#[tokio::test]
async fn test_scheduled_boss_preempts_landing() {
    let store = Arc::new(MemoryStore::new());
    let mut session = offline_session(MockModel::failing(), store, 5);
    session.start().await.unwrap();
    session.schedule_boss().await;

    let events = session.roll().await.unwrap();
    assert!(events.contains(&GameEvent::ChallengeOpened {
        kind: quizboard_core::ContentKind::Boss
    }));
    assert!(matches!(session.game().challenge(), Some(Challenge::Boss(_))));
    assert!(!session.game().boss_pending());
}
