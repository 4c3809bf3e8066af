//! Content generation with retry and fallback.
//!
//! The [`GenerationPipeline`] turns a conversation into typed
//! [`GeneratedContent`]. It never fails: transport errors, undecodable text
//! and malformed shapes are retried once with a corrective note, and the
//! canned content for the requested kind is used if the retry fails too.
//!
//! ```ignore
//! let pipeline = GenerationPipeline::new(model);
//! let request = GenerationRequest::question(prompts::question_messages(&config, topic, &player));
//! let question = pipeline.generate(&request).await.content.into_question();
//! ```

pub mod fallback;
pub mod model;
pub mod prompts;

pub use model::ModelClient;

use crate::content::{ContentError, ContentKind, GeneratedContent};
use crate::relaxed::{self, DecodeError};
use futures::StreamExt;
use llm_client::{Message, Role};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Corrective instruction appended to the conversation on retry.
pub const RETRY_NOTE: &str =
    "IMPORTANT: Previous attempt failed. Output STRICT VALID JSON ONLY. No markdown.";

/// Attempts made against the model before using canned content.
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// Why a single generation attempt failed.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Transport error: {0}")]
    Transport(#[from] llm_client::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Invalid content: {0}")]
    Content(#[from] ContentError),
}

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Total model attempts before falling back.
    pub max_attempts: usize,
    /// Note appended to the last user message on retries.
    pub retry_note: String,
    /// Shuffle options of model-generated questions and bosses.
    pub shuffle_answers: bool,
    /// Seed for answer shuffling.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_note: RETRY_NOTE.to_string(),
            shuffle_answers: true,
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_shuffle_answers(mut self, shuffle: bool) -> Self {
        self.shuffle_answers = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A request for one piece of content.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: ContentKind,
    pub messages: Vec<Message>,
    /// Scale the question reward by the XP boost multiplier.
    pub boosted: bool,
    /// Domain used to name placeholder tiles if board generation falls back.
    pub domain: String,
}

impl GenerationRequest {
    pub fn new(kind: ContentKind, messages: Vec<Message>) -> Self {
        Self {
            kind,
            messages,
            boosted: false,
            domain: String::new(),
        }
    }

    pub fn board(messages: Vec<Message>, domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::new(ContentKind::Board, messages)
        }
    }

    pub fn question(messages: Vec<Message>) -> Self {
        Self::new(ContentKind::Question, messages)
    }

    pub fn event(messages: Vec<Message>) -> Self {
        Self::new(ContentKind::Event, messages)
    }

    pub fn boss(messages: Vec<Message>) -> Self {
        Self::new(ContentKind::Boss, messages)
    }

    pub fn with_boost(mut self, boosted: bool) -> Self {
        self.boosted = boosted;
        self
    }
}

/// Where generated content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Decoded from the model on the given attempt (1-based).
    Model { attempt: usize },
    /// Canned content after every attempt failed.
    Fallback,
}

/// Content plus its provenance.
#[derive(Debug, Clone)]
pub struct Generated {
    pub content: GeneratedContent,
    pub source: ContentSource,
}

impl Generated {
    pub fn is_fallback(&self) -> bool {
        self.source == ContentSource::Fallback
    }
}

/// Produces typed content from a [`ModelClient`], never failing.
pub struct GenerationPipeline {
    model: Arc<dyn ModelClient>,
    config: PipelineConfig,
    rng: Mutex<StdRng>,
}

impl GenerationPipeline {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self::with_config(model, PipelineConfig::default())
    }

    pub fn with_config(model: Arc<dyn ModelClient>, config: PipelineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            model,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate content for `request`, retrying and then falling back.
    pub async fn generate(&self, request: &GenerationRequest) -> Generated {
        for attempt in 1..=self.config.max_attempts.max(1) {
            let messages = if attempt == 1 {
                request.messages.clone()
            } else {
                with_retry_note(&request.messages, &self.config.retry_note)
            };

            match self.attempt(request.kind, &messages).await {
                Ok(content) => {
                    tracing::debug!(kind = %request.kind, attempt, "Generated content from model");
                    return Generated {
                        content: self.finish(content, request, true),
                        source: ContentSource::Model { attempt },
                    };
                }
                Err(e) => {
                    tracing::warn!(kind = %request.kind, attempt, error = %e, "Generation attempt failed");
                }
            }
        }

        tracing::warn!(kind = %request.kind, "Using fallback content");
        let content = fallback::fallback_content(request.kind, &request.domain);
        Generated {
            content: self.finish(content, request, false),
            source: ContentSource::Fallback,
        }
    }

    async fn attempt(
        &self,
        kind: ContentKind,
        messages: &[Message],
    ) -> Result<GeneratedContent, GenerationError> {
        let text = self.fetch_text(messages).await?;
        tracing::debug!(kind = %kind, raw = %text, "Raw model output");
        let value = relaxed::decode(&text)?;
        Ok(GeneratedContent::from_value(kind, value)?)
    }

    /// Stream the completion; on any stream failure, ask once without streaming.
    async fn fetch_text(&self, messages: &[Message]) -> Result<String, llm_client::Error> {
        match self.collect_stream(messages).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(error = %e, "Streaming failed, retrying without streaming");
                self.model.complete(messages).await
            }
        }
    }

    async fn collect_stream(&self, messages: &[Message]) -> Result<String, llm_client::Error> {
        let mut stream = self.model.stream_completion(messages).await?;
        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    fn finish(
        &self,
        mut content: GeneratedContent,
        request: &GenerationRequest,
        from_model: bool,
    ) -> GeneratedContent {
        if from_model && self.config.shuffle_answers {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match &mut content {
                GeneratedContent::Question(question) => question.shuffle_options(&mut *rng),
                GeneratedContent::Boss(boss) => boss.shuffle_options(&mut *rng),
                _ => {}
            }
        }
        if request.boosted {
            if let GeneratedContent::Question(question) = &mut content {
                question.apply_boost();
            }
        }
        content
    }
}

/// Append `note` to the last user message, or add it as a new user message.
fn with_retry_note(messages: &[Message], note: &str) -> Vec<Message> {
    let mut messages = messages.to_vec();
    match messages.last_mut() {
        Some(last) if last.role == Role::User => {
            last.content.push_str("\n\n");
            last.content.push_str(note);
        }
        _ => messages.push(Message::user(note)),
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BOARD_CONCEPT_COUNT;
    use crate::testing::{MockModel, MockReply};
    use fallback::{FALLBACK_BOSS, FALLBACK_EVENT, FALLBACK_QUESTION};

    const GOOD_QUESTION: &str = r#"```json
{"question": "Which ratio measures liquidity?", "options": ["Current ratio", "P/E", "ROE", "Beta"], "correctIndex": 0, "reward": 120}
```"#;

    fn pipeline(model: Arc<MockModel>) -> GenerationPipeline {
        GenerationPipeline::with_config(model, PipelineConfig::default().with_seed(11))
    }

    fn question_request() -> GenerationRequest {
        GenerationRequest::question(vec![
            Message::system("persona"),
            Message::user("Ask me something"),
        ])
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let model = Arc::new(MockModel::new().with_reply(MockReply::text(GOOD_QUESTION)));
        let generated = pipeline(model.clone()).generate(&question_request()).await;

        assert_eq!(generated.source, ContentSource::Model { attempt: 1 });
        let question = generated.content.into_question().unwrap();
        assert_eq!(question.correct_option(), "Current ratio");
        assert_eq!(question.reward, 120);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_appends_note() {
        let model = Arc::new(
            MockModel::new()
                .with_reply(MockReply::text("I cannot help with that."))
                .with_reply(MockReply::text(GOOD_QUESTION)),
        );
        let generated = pipeline(model.clone()).generate(&question_request()).await;

        assert_eq!(generated.source, ContentSource::Model { attempt: 2 });
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0][1].content.contains(RETRY_NOTE));
        assert!(calls[1][1].content.ends_with(RETRY_NOTE));
        assert_eq!(calls[1].len(), 2);
    }

    #[tokio::test]
    async fn test_two_failures_use_fallback_question() {
        let model = Arc::new(
            MockModel::new()
                .with_reply(MockReply::text("garbage"))
                .with_reply(MockReply::text("more garbage")),
        );
        let generated = pipeline(model).generate(&question_request()).await;

        assert!(generated.is_fallback());
        assert_eq!(generated.content.into_question().unwrap(), *FALLBACK_QUESTION);
    }

    #[tokio::test]
    async fn test_fallback_per_kind() {
        let model = Arc::new(MockModel::failing());
        let pipeline = pipeline(model);

        let event = pipeline
            .generate(&GenerationRequest::event(vec![Message::user("e")]))
            .await;
        assert_eq!(event.content.into_event().unwrap(), *FALLBACK_EVENT);

        let boss = pipeline
            .generate(&GenerationRequest::boss(vec![Message::user("b")]))
            .await;
        assert_eq!(boss.content.into_boss().unwrap(), *FALLBACK_BOSS);

        let board = pipeline
            .generate(&GenerationRequest::board(vec![Message::user("b")], "Geology"))
            .await;
        let board = board.content.into_board().unwrap();
        assert_eq!(board.tiles.len(), BOARD_CONCEPT_COUNT);
        assert_eq!(board.tiles[2].name, "Geology 3");
    }

    #[tokio::test]
    async fn test_stream_failure_uses_non_streaming_request() {
        let model = Arc::new(
            MockModel::new()
                .with_reply(MockReply::StreamError)
                .with_reply(MockReply::text(GOOD_QUESTION)),
        );
        let generated = pipeline(model.clone()).generate(&question_request()).await;

        assert_eq!(generated.source, ContentSource::Model { attempt: 1 });
        assert_eq!(model.complete_count(), 1);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_uses_non_streaming_request() {
        let model = Arc::new(
            MockModel::new()
                .with_reply(MockReply::BrokenStream("{\"question\":".to_string()))
                .with_reply(MockReply::text(GOOD_QUESTION)),
        );
        let generated = pipeline(model.clone()).generate(&question_request()).await;

        assert_eq!(generated.source, ContentSource::Model { attempt: 1 });
        assert_eq!(model.complete_count(), 1);
    }

    #[tokio::test]
    async fn test_boost_scales_fallback_reward() {
        let model = Arc::new(MockModel::failing());
        let generated = pipeline(model)
            .generate(&question_request().with_boost(true))
            .await;
        assert_eq!(generated.content.into_question().unwrap().reward, 150);
    }

    #[tokio::test]
    async fn test_boost_with_huge_model_reward() {
        let model = Arc::new(MockModel::new().with_reply(MockReply::text(
            r#"{"question": "Q", "options": ["a","b","c","d"], "correctIndex": 2, "reward": 1e30}"#,
        )));
        let generated = pipeline(model)
            .generate(&question_request().with_boost(true))
            .await;
        assert_eq!(generated.source, ContentSource::Model { attempt: 1 });
        assert_eq!(generated.content.into_question().unwrap().reward, u64::MAX);
    }

    #[tokio::test]
    async fn test_fallback_not_shuffled() {
        let model = Arc::new(MockModel::failing());
        let pipeline = pipeline(model);
        for _ in 0..5 {
            let question = pipeline
                .generate(&question_request())
                .await
                .content
                .into_question()
                .unwrap();
            assert_eq!(question.correct_index, 1);
            assert_eq!(question.options, FALLBACK_QUESTION.options);
        }
    }

    #[tokio::test]
    async fn test_invalid_shape_counts_as_failure() {
        let model = Arc::new(
            MockModel::new()
                .with_reply(MockReply::text(
                    r#"{"question": "Q", "options": ["a","b","c","d"], "correctIndex": 9}"#,
                ))
                .with_reply(MockReply::text(GOOD_QUESTION)),
        );
        let generated = pipeline(model).generate(&question_request()).await;
        assert_eq!(generated.source, ContentSource::Model { attempt: 2 });
    }

    #[test]
    fn test_retry_note_pushed_after_system_message() {
        let messages = with_retry_note(&[Message::system("persona")], RETRY_NOTE);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::user(RETRY_NOTE));
    }
}
