//! Typed content produced by the generation pipeline.
//!
//! Model output arrives as loosely shaped JSON. Each kind is normalized and
//! validated once here, so the rest of the crate only sees well-formed
//! values: questions always carry exactly four options, events exactly two,
//! and boards exactly sixteen tile concepts.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Options every question and boss encounter carries.
pub const OPTION_COUNT: usize = 4;

/// Options every event carries.
pub const EVENT_OPTION_COUNT: usize = 2;

/// Tile concepts a board needs to fill its property slots.
pub const BOARD_CONCEPT_COUNT: usize = 16;

/// Reward used when the model omits one.
pub const DEFAULT_REWARD: u64 = 100;

/// Filler options appended, in order, to questions with too few options.
pub const OPTION_FILLERS: [&str; 4] = [
    "None of the above",
    "All of the above",
    "Not applicable",
    "Other",
];

/// Errors from shaping decoded JSON into typed content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("Expected a JSON object for {0}")]
    NotAnObject(ContentKind),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Correct index {index} is outside the {count} available options")]
    CorrectIndexOutOfRange { index: usize, count: usize },

    #[error("Event needs at least two options, got {0}")]
    TooFewEventOptions(usize),

    #[error("Board contains no usable tile concepts")]
    NoUsableConcepts,
}

/// The kinds of content the pipeline can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Board,
    Question,
    Event,
    Boss,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentKind::Board => "board",
            ContentKind::Question => "question",
            ContentKind::Event => "event",
            ContentKind::Boss => "boss",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Board
// ============================================================================

/// A generated property concept: a display name and an icon search keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileConcept {
    pub name: String,
    pub keyword: String,
}

impl TileConcept {
    pub fn new(name: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyword: keyword.into(),
        }
    }
}

/// The generated layout for a board's property tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSpec {
    pub title: Option<String>,
    /// Always exactly [`BOARD_CONCEPT_COUNT`] entries.
    pub tiles: Vec<TileConcept>,
}

impl BoardSpec {
    /// Build from a list of concepts, cycling or truncating to sixteen.
    pub fn from_concepts(
        title: Option<String>,
        concepts: Vec<TileConcept>,
    ) -> Result<Self, ContentError> {
        if concepts.is_empty() {
            return Err(ContentError::NoUsableConcepts);
        }
        let tiles = concepts
            .iter()
            .cycle()
            .take(BOARD_CONCEPT_COUNT)
            .cloned()
            .collect();
        Ok(Self { title, tiles })
    }

    /// Accepts `{title, tiles: [...]}` or a bare array. Items may be strings
    /// or `{name, keyword}` objects; empty or nameless entries are dropped.
    pub fn from_value(value: Value) -> Result<Self, ContentError> {
        let (title, items) = match value {
            Value::Array(items) => (None, items),
            Value::Object(mut map) => {
                let title = text_field(&map, "title");
                let items = match map.remove("tiles") {
                    Some(Value::Array(items)) => items,
                    _ => return Err(ContentError::MissingField("tiles")),
                };
                (title, items)
            }
            _ => return Err(ContentError::NotAnObject(ContentKind::Board)),
        };

        let concepts = items.iter().filter_map(concept_from_value).collect();
        Self::from_concepts(title, concepts)
    }
}

fn concept_from_value(item: &Value) -> Option<TileConcept> {
    match item {
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| TileConcept::new(name, name))
        }
        Value::Object(map) => {
            let name = text_field(map, "name")?;
            let keyword = text_field(map, "keyword").unwrap_or_else(|| name.clone());
            Some(TileConcept { name, keyword })
        }
        _ => None,
    }
}

// ============================================================================
// Question
// ============================================================================

/// A multiple-choice question for a property tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "gm_comment", default, skip_serializing_if = "Option::is_none")]
    pub gm_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub question: String,
    /// Always exactly [`OPTION_COUNT`] entries.
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default)]
    pub explanation: String,
    pub reward: u64,
}

impl Question {
    pub fn from_value(value: Value) -> Result<Self, ContentError> {
        let Value::Object(map) = value else {
            return Err(ContentError::NotAnObject(ContentKind::Question));
        };

        let question = text_field(&map, "question").ok_or(ContentError::MissingField("question"))?;
        let options = normalize_options(map.get("options"));
        let correct_index = checked_index(&map, options.len())?;

        Ok(Self {
            gm_comment: text_field(&map, "gm_comment"),
            scenario: text_field(&map, "scenario"),
            question,
            options,
            correct_index,
            hint: text_field(&map, "hint"),
            explanation: text_field(&map, "explanation").unwrap_or_default(),
            reward: number_field(&map, "reward").unwrap_or(DEFAULT_REWARD),
        })
    }

    /// The correct option's text.
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Apply the XP boost reward multiplier (x1.5, floored).
    pub fn apply_boost(&mut self) {
        self.reward = self.reward.saturating_add(self.reward / 2);
    }

    /// Shuffle options, keeping `correct_index` on the same answer.
    pub fn shuffle_options<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.correct_index = shuffle_tracking(&mut self.options, self.correct_index, rng);
    }
}

// ============================================================================
// Event
// ============================================================================

/// Whether an event choice is the safe or the gamble option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRisk {
    #[default]
    Safe,
    Risky,
}

/// One side of a two-choice event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    pub text: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(rename = "type", default)]
    pub risk: EventRisk,
}

impl EventOption {
    pub fn new(text: impl Into<String>, outcome: impl Into<String>, risk: EventRisk) -> Self {
        Self {
            text: text.into(),
            outcome: outcome.into(),
            risk,
        }
    }
}

/// A random dilemma with a safe and a risky choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_comment: Option<String>,
    pub scenario: String,
    /// Always exactly [`EVENT_OPTION_COUNT`] entries.
    pub options: Vec<EventOption>,
}

impl Event {
    pub fn from_value(value: Value) -> Result<Self, ContentError> {
        let Value::Object(map) = value else {
            return Err(ContentError::NotAnObject(ContentKind::Event));
        };

        let scenario = text_field(&map, "scenario").ok_or(ContentError::MissingField("scenario"))?;
        let mut options: Vec<EventOption> = match map.get("options") {
            Some(Value::Array(items)) => items.iter().filter_map(event_option_from_value).collect(),
            _ => Vec::new(),
        };
        if options.len() < EVENT_OPTION_COUNT {
            return Err(ContentError::TooFewEventOptions(options.len()));
        }
        options.truncate(EVENT_OPTION_COUNT);

        Ok(Self {
            gm_comment: text_field(&map, "gm_comment"),
            scenario,
            options,
        })
    }
}

fn event_option_from_value(item: &Value) -> Option<EventOption> {
    match item {
        Value::String(text) if !text.trim().is_empty() => {
            Some(EventOption::new(text.trim(), "", EventRisk::Safe))
        }
        Value::Object(map) => {
            let text = text_field(map, "text")?;
            let risk = match text_field(map, "type").as_deref().map(str::to_ascii_lowercase) {
                Some(kind) if kind == "risky" => EventRisk::Risky,
                _ => EventRisk::Safe,
            };
            Some(EventOption {
                text,
                outcome: text_field(map, "outcome").unwrap_or_default(),
                risk,
            })
        }
        _ => None,
    }
}

// ============================================================================
// Boss
// ============================================================================

/// A high-stakes four-option boss scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossEncounter {
    #[serde(rename = "gm_comment", default, skip_serializing_if = "Option::is_none")]
    pub gm_comment: Option<String>,
    pub scenario: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl BossEncounter {
    pub fn from_value(value: Value) -> Result<Self, ContentError> {
        let Value::Object(map) = value else {
            return Err(ContentError::NotAnObject(ContentKind::Boss));
        };

        let scenario = text_field(&map, "scenario")
            .or_else(|| text_field(&map, "question"))
            .ok_or(ContentError::MissingField("scenario"))?;
        let options = normalize_options(map.get("options"));
        let correct_index = checked_index(&map, options.len())?;

        Ok(Self {
            gm_comment: text_field(&map, "gm_comment"),
            scenario,
            options,
            correct_index,
            explanation: text_field(&map, "explanation").unwrap_or_default(),
        })
    }

    pub fn shuffle_options<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.correct_index = shuffle_tracking(&mut self.options, self.correct_index, rng);
    }
}

// ============================================================================
// Union
// ============================================================================

/// Content resolved from a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum GeneratedContent {
    Board(BoardSpec),
    Question(Question),
    Event(Event),
    Boss(BossEncounter),
}

impl GeneratedContent {
    /// Shape a decoded value into the content kind that was requested.
    pub fn from_value(kind: ContentKind, value: Value) -> Result<Self, ContentError> {
        Ok(match kind {
            ContentKind::Board => GeneratedContent::Board(BoardSpec::from_value(value)?),
            ContentKind::Question => GeneratedContent::Question(Question::from_value(value)?),
            ContentKind::Event => GeneratedContent::Event(Event::from_value(value)?),
            ContentKind::Boss => GeneratedContent::Boss(BossEncounter::from_value(value)?),
        })
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            GeneratedContent::Board(_) => ContentKind::Board,
            GeneratedContent::Question(_) => ContentKind::Question,
            GeneratedContent::Event(_) => ContentKind::Event,
            GeneratedContent::Boss(_) => ContentKind::Boss,
        }
    }

    pub fn into_board(self) -> Option<BoardSpec> {
        match self {
            GeneratedContent::Board(board) => Some(board),
            _ => None,
        }
    }

    pub fn into_question(self) -> Option<Question> {
        match self {
            GeneratedContent::Question(question) => Some(question),
            _ => None,
        }
    }

    pub fn into_event(self) -> Option<Event> {
        match self {
            GeneratedContent::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn into_boss(self) -> Option<BossEncounter> {
        match self {
            GeneratedContent::Boss(boss) => Some(boss),
            _ => None,
        }
    }
}

// ============================================================================
// Normalization helpers
// ============================================================================

/// Coerce an `options` field into exactly four option strings.
///
/// Missing or non-array input yields `Option A`..`Option D`. Short lists are
/// padded with [`OPTION_FILLERS`] and then `Option E`, `Option F`, ...; long
/// lists are truncated. Existing options keep their indices.
pub fn normalize_options(options: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = options else {
        return (0..OPTION_COUNT).map(option_label).collect();
    };

    let mut options: Vec<String> = items.iter().map(option_text).collect();
    let mut fillers = OPTION_FILLERS.iter();
    while options.len() < OPTION_COUNT {
        let filler = match fillers.next() {
            Some(filler) => filler.to_string(),
            None => option_label(options.len()),
        };
        options.push(filler);
    }
    options.truncate(OPTION_COUNT);
    options
}

/// `Option A`, `Option B`, ... for the given position.
pub fn option_label(index: usize) -> String {
    let letter = char::from_u32('A' as u32 + index as u32).unwrap_or('?');
    format!("Option {letter}")
}

fn option_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(map) => text_field(map, "text").unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}

/// Shuffle `options` in place; returns the new position of `correct`.
fn shuffle_tracking<R: Rng + ?Sized>(options: &mut [String], correct: usize, rng: &mut R) -> usize {
    let mut order: Vec<usize> = (0..options.len()).collect();
    order.shuffle(rng);
    let original = options.to_vec();
    for (slot, &from) in options.iter_mut().zip(&order) {
        *slot = original[from].clone();
    }
    order.iter().position(|&i| i == correct).unwrap_or(correct)
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<u64> {
    match map.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.floor() as u64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f.floor() as u64),
        _ => None,
    }
}

fn checked_index(map: &Map<String, Value>, count: usize) -> Result<usize, ContentError> {
    let index = number_field(map, "correctIndex")
        .or_else(|| number_field(map, "correct_index"))
        .ok_or(ContentError::MissingField("correctIndex"))? as usize;
    if index >= count {
        return Err(ContentError::CorrectIndexOutOfRange { index, count });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_question_from_value() {
        let question = Question::from_value(json!({
            "scenario": "A supplier misses a deadline.",
            "question": "What do you check first?",
            "options": ["Contract", "Mood", "Weather", "Rumors"],
            "correctIndex": 0,
            "hint": "Paperwork matters.",
            "explanation": "The contract defines remedies.",
            "reward": 150
        }))
        .unwrap();

        assert_eq!(question.correct_option(), "Contract");
        assert_eq!(question.reward, 150);
        assert_eq!(question.hint.as_deref(), Some("Paperwork matters."));
    }

    #[test]
    fn test_question_defaults_reward() {
        let question = Question::from_value(json!({
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correctIndex": 3
        }))
        .unwrap();
        assert_eq!(question.reward, DEFAULT_REWARD);
        assert_eq!(question.explanation, "");
    }

    #[test]
    fn test_options_padded_in_order() {
        let options = normalize_options(Some(&json!(["X", "Y"])));
        assert_eq!(options, vec!["X", "Y", "None of the above", "All of the above"]);
    }

    #[test]
    fn test_options_missing_become_placeholders() {
        assert_eq!(
            normalize_options(None),
            vec!["Option A", "Option B", "Option C", "Option D"]
        );
        assert_eq!(
            normalize_options(Some(&json!("not a list"))),
            vec!["Option A", "Option B", "Option C", "Option D"]
        );
    }

    #[test]
    fn test_options_truncated() {
        let options = normalize_options(Some(&json!(["a", "b", "c", "d", "e", "f"])));
        assert_eq!(options, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_options_padded_with_fillers() {
        let options = normalize_options(Some(&json!([])));
        assert_eq!(options, OPTION_FILLERS.to_vec());
    }

    #[test]
    fn test_option_label() {
        assert_eq!(option_label(0), "Option A");
        assert_eq!(option_label(4), "Option E");
        assert_eq!(option_label(5), "Option F");
    }

    #[test]
    fn test_correct_index_out_of_range_rejected() {
        let err = Question::from_value(json!({
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correctIndex": 7
        }))
        .unwrap_err();
        assert_eq!(err, ContentError::CorrectIndexOutOfRange { index: 7, count: 4 });
    }

    #[test]
    fn test_correct_index_as_string_accepted() {
        let question = Question::from_value(json!({
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correctIndex": "2"
        }))
        .unwrap();
        assert_eq!(question.correct_index, 2);
    }

    #[test]
    fn test_boost_floors() {
        let mut question = Question::from_value(json!({
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correctIndex": 0,
            "reward": 75
        }))
        .unwrap();
        question.apply_boost();
        assert_eq!(question.reward, 112);
    }

    #[test]
    fn test_boost_huge_reward_saturates() {
        let mut question = Question::from_value(json!({
            "question": "Q?",
            "options": ["a", "b", "c", "d"],
            "correctIndex": 0,
            "reward": 1e30
        }))
        .unwrap();
        assert_eq!(question.reward, u64::MAX);
        question.apply_boost();
        assert_eq!(question.reward, u64::MAX);
    }

    #[test]
    fn test_shuffle_tracks_correct_answer() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut question = Question::from_value(json!({
                "question": "Q?",
                "options": ["right", "w1", "w2", "w3"],
                "correctIndex": 0
            }))
            .unwrap();
            question.shuffle_options(&mut rng);
            assert_eq!(question.correct_option(), "right");
            assert_eq!(question.options.len(), OPTION_COUNT);
        }
    }

    #[test]
    fn test_event_from_value() {
        let event = Event::from_value(json!({
            "gm_comment": "Fate intervenes.",
            "scenario": "An investor calls.",
            "options": [
                {"text": "Decline", "outcome": "Safe: +50", "type": "safe"},
                {"text": "Accept", "outcome": "Risky", "type": "RISKY"},
                {"text": "Ignore", "outcome": "?", "type": "safe"}
            ]
        }))
        .unwrap();
        assert_eq!(event.options.len(), 2);
        assert_eq!(event.options[1].risk, EventRisk::Risky);
    }

    #[test]
    fn test_event_needs_two_options() {
        let err = Event::from_value(json!({
            "scenario": "Alone.",
            "options": [{"text": "Only", "type": "safe"}]
        }))
        .unwrap_err();
        assert_eq!(err, ContentError::TooFewEventOptions(1));
    }

    #[test]
    fn test_boss_pads_options() {
        let boss = BossEncounter::from_value(json!({
            "scenario": "The board demands answers.",
            "options": ["Cut costs", "Invest"],
            "correctIndex": 1
        }))
        .unwrap();
        assert_eq!(boss.options.len(), OPTION_COUNT);
        assert_eq!(boss.options[1], "Invest");
    }

    #[test]
    fn test_board_from_object() {
        let spec = BoardSpec::from_value(json!({
            "title": "Supply Chain Saga",
            "tiles": [
                {"name": "Logistics", "keyword": "truck"},
                {"name": "Inventory"},
                null,
                {"keyword": "nameless"},
                "Forecasting"
            ]
        }))
        .unwrap();

        assert_eq!(spec.title.as_deref(), Some("Supply Chain Saga"));
        assert_eq!(spec.tiles.len(), BOARD_CONCEPT_COUNT);
        assert_eq!(spec.tiles[0], TileConcept::new("Logistics", "truck"));
        assert_eq!(spec.tiles[1], TileConcept::new("Inventory", "Inventory"));
        assert_eq!(spec.tiles[2], TileConcept::new("Forecasting", "Forecasting"));
        assert_eq!(spec.tiles[3], spec.tiles[0]);
    }

    #[test]
    fn test_board_from_bare_array_truncates() {
        let items: Vec<Value> = (0..25).map(|i| json!({"name": format!("T{i}")})).collect();
        let spec = BoardSpec::from_value(Value::Array(items)).unwrap();
        assert_eq!(spec.title, None);
        assert_eq!(spec.tiles.len(), BOARD_CONCEPT_COUNT);
        assert_eq!(spec.tiles[15].name, "T15");
    }

    #[test]
    fn test_board_without_usable_concepts_rejected() {
        let err = BoardSpec::from_value(json!({"tiles": [null, "", {"keyword": "x"}]})).unwrap_err();
        assert_eq!(err, ContentError::NoUsableConcepts);
    }

    #[test]
    fn test_generated_content_kind() {
        let content = GeneratedContent::from_value(
            ContentKind::Boss,
            json!({"scenario": "S", "options": ["a", "b", "c", "d"], "correctIndex": 2}),
        )
        .unwrap();
        assert_eq!(content.kind(), ContentKind::Boss);
        assert!(content.clone().into_question().is_none());
        assert_eq!(content.into_boss().unwrap().correct_index, 2);
    }
}
