//! Canned content used when the model cannot produce anything usable.
//!
//! These values are fixed: two sessions that both fall back receive
//! identical content, and fallback answers are never shuffled.

use crate::content::{
    BoardSpec, BossEncounter, ContentKind, Event, EventOption, EventRisk, GeneratedContent,
    Question, TileConcept, BOARD_CONCEPT_COUNT,
};

/// Icon keyword used for every placeholder tile.
pub const PLACEHOLDER_KEYWORD: &str = "shape";

// ============================================================================
// Canned content
// ============================================================================

lazy_static::lazy_static! {
    /// Question served after repeated generation failures.
    pub static ref FALLBACK_QUESTION: Question = Question {
        gm_comment: Some("The connection is static... I'll give you a standard test.".to_string()),
        scenario: None,
        question: "Which of the following is a key component of logical analysis?".to_string(),
        options: vec![
            "Emotion".to_string(),
            "Data Verification".to_string(),
            "Assumption".to_string(),
            "Impulse".to_string(),
        ],
        correct_index: 1,
        hint: None,
        explanation: "Data verification is crucial for objective analysis.".to_string(),
        reward: 100,
    };

    /// Event served after repeated generation failures.
    pub static ref FALLBACK_EVENT: Event = Event {
        gm_comment: Some("A sudden twist of fate!".to_string()),
        scenario: "You find a lost wallet in the boardroom.".to_string(),
        options: vec![
            EventOption::new("Return it", "Safe: +50 Karma/Credits", EventRisk::Safe),
            EventOption::new("Keep it", "Risky: High Reward or Penalty", EventRisk::Risky),
        ],
    };

    /// Boss encounter served after repeated generation failures.
    pub static ref FALLBACK_BOSS: BossEncounter = BossEncounter {
        gm_comment: Some("The Boss looks impatient.".to_string()),
        scenario: "The market crashes unexpectedly. What is your immediate move?".to_string(),
        options: vec![
            "Panic Sell".to_string(),
            "Hold and Analyze".to_string(),
            "Buy the Dip blindly".to_string(),
            "Ignore".to_string(),
        ],
        correct_index: 1,
        explanation: "Holding allows for level-headed assessment.".to_string(),
    };
}

/// Sixteen placeholder concepts named after the domain.
pub fn fallback_board(domain: &str) -> BoardSpec {
    let tiles = (1..=BOARD_CONCEPT_COUNT)
        .map(|n| TileConcept::new(format!("{domain} {n}"), PLACEHOLDER_KEYWORD))
        .collect();
    BoardSpec { title: None, tiles }
}

/// Canned content for a kind. `domain` names the placeholder board tiles.
pub fn fallback_content(kind: ContentKind, domain: &str) -> GeneratedContent {
    match kind {
        ContentKind::Board => GeneratedContent::Board(fallback_board(domain)),
        ContentKind::Question => GeneratedContent::Question(FALLBACK_QUESTION.clone()),
        ContentKind::Event => GeneratedContent::Event(FALLBACK_EVENT.clone()),
        ContentKind::Boss => GeneratedContent::Boss(FALLBACK_BOSS.clone()),
    }
}
