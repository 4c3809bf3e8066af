//! Testing utilities for the quiz board.
//!
//! This module provides tools for deterministic testing:
//! - `MockModel` for scripted model replies without network calls
//! - `MockIcons` for canned icon lookups
//! - `TestHarness` for driving a seeded game directly
//! - Assertion helpers for verifying game state

use crate::board::Board;
use crate::content::{Question, TileConcept};
use crate::game::{Game, LandingOutcome, Phase};
use crate::generation::ModelClient;
use crate::icons::IconSearch;
use async_trait::async_trait;
use llm_client::{Error, Message, TextStream};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A scripted reply from the mock model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Full reply text, delivered in one fragment.
    Text(String),
    /// The request fails before any text arrives.
    StreamError,
    /// Streaming delivers this partial text, then fails.
    BrokenStream(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    calls: Vec<Vec<Message>>,
    complete_calls: usize,
}

/// A model that returns scripted replies in order.
///
/// Streamed and non-streamed requests share one queue. Once the queue is
/// empty every request fails.
#[derive(Debug, Default)]
pub struct MockModel {
    state: Mutex<MockState>,
    always_fail: bool,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model whose every request fails.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.lock().replies.push_back(reply);
        self
    }

    /// Every conversation sent, streamed or not, in order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Number of non-streaming requests.
    pub fn complete_count(&self) -> usize {
        self.lock().complete_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, messages: &[Message], streaming: bool) -> Result<MockReply, Error> {
        let mut state = self.lock();
        state.calls.push(messages.to_vec());
        if !streaming {
            state.complete_calls += 1;
        }
        if self.always_fail {
            return Err(Error::Network("mock model is offline".to_string()));
        }
        state
            .replies
            .pop_front()
            .ok_or_else(|| Error::Network("no scripted reply".to_string()))
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn stream_completion(&self, messages: &[Message]) -> Result<TextStream, Error> {
        let fragments = match self.next_reply(messages, true)? {
            MockReply::Text(text) => vec![Ok(text)],
            MockReply::StreamError => {
                return Err(Error::Api {
                    status: 503,
                    message: "stream unavailable".to_string(),
                })
            }
            MockReply::BrokenStream(partial) => vec![
                Ok(partial),
                Err(Error::Stream("connection reset".to_string())),
            ],
        };
        Ok(Box::pin(futures::stream::iter(fragments)))
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, Error> {
        match self.next_reply(messages, false)? {
            MockReply::Text(text) => Ok(text),
            MockReply::StreamError | MockReply::BrokenStream(_) => Err(Error::Api {
                status: 500,
                message: "completion failed".to_string(),
            }),
        }
    }
}

/// Icon search with a fixed keyword table.
#[derive(Debug, Default)]
pub struct MockIcons {
    icons: HashMap<String, String>,
    lookups: Mutex<Vec<String>>,
}

impl MockIcons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_icon(mut self, keyword: impl Into<String>, icon: impl Into<String>) -> Self {
        self.icons.insert(keyword.into(), icon.into());
        self
    }

    /// Keywords searched so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl IconSearch for MockIcons {
    async fn search(&self, keyword: &str) -> Option<String> {
        self.lookups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(keyword.to_string());
        self.icons.get(keyword).cloned()
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Seed used by [`TestHarness::new`].
pub const DEFAULT_TEST_SEED: u64 = 42;

/// Board used by the harness: four finance concepts cycled over sixteen slots.
pub fn sample_board() -> Board {
    let concepts = [
        TileConcept::new("Cash Flow", "cash"),
        TileConcept::new("Balance Sheet", "scale"),
        TileConcept::new("Market Share", "chart-pie"),
        TileConcept::new("Supply Chain", "truck"),
    ];
    Board::generated(Some("Test Board".to_string()), &concepts, &[])
}

/// A seeded game with the sample board installed, waiting for a roll.
pub struct TestHarness {
    pub game: Game,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_TEST_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut game = Game::new(1000).with_seed(seed);
        if let Err(e) = game.install_board(sample_board()) {
            panic!("sample board rejected: {e}");
        }
        Self { game }
    }

    /// Set the player's score.
    pub fn with_score(mut self, score: u64) -> Self {
        self.game.player.score = score;
        self
    }

    /// Put the player on `index` and resolve the landing.
    pub fn land_on(&mut self, index: usize) -> LandingOutcome {
        self.game.player.position = index;
        self.game.phase = Phase::Landing;
        self.game.land().unwrap()
    }

    /// Land on `index` and open `question` there.
    pub fn open_question(&mut self, index: usize, question: Question) {
        self.land_on(index);
        self.game.present_question(question).unwrap();
    }
}

// ============================================================================
// Assertions
// ============================================================================

#[track_caller]
pub fn assert_score(game: &Game, expected: u64) {
    assert_eq!(
        game.player().score,
        expected,
        "expected score {expected}, got {}",
        game.player().score
    );
}

#[track_caller]
pub fn assert_streak(game: &Game, expected: u32) {
    assert_eq!(
        game.player().streak,
        expected,
        "expected streak {expected}, got {}",
        game.player().streak
    );
}

#[track_caller]
pub fn assert_phase(game: &Game, expected: Phase) {
    assert_eq!(game.phase(), expected, "unexpected phase");
}

#[track_caller]
pub fn assert_mastered(game: &Game, index: usize) {
    assert!(
        game.board().tile(index).mastered,
        "expected tile {index} ({}) to be mastered",
        game.board().tile(index).name
    );
}
