//! GameSession - the primary public API for quiz board play.
//!
//! A session ties the [`Game`] state machine to content generation, icon
//! lookup and the save slot. Every method takes `&mut self`, so only one
//! roll or generation is ever in flight.

use crate::board::Board;
use crate::game::{ChallengeRequest, Game, GameError, GameEvent, Lifeline, Phase, ShopItem};
use crate::generation::{
    fallback, prompts, GenerationPipeline, GenerationRequest, ModelClient, PipelineConfig,
};
use crate::icons::{self, IconSearch, IconifyClient};
use crate::persist::{FileStore, PersistError, SaveSlot, SaveStore, Snapshot};
use llm_client::{Client, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Persona used when the session has none.
pub const DEFAULT_PERSONA: &str =
    "You are a strategic game AI designed to test business acumen and critical thinking.";

/// Raised when no usable model endpoint is configured.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No model endpoint configured - set LLM_BASE_URL")]
    NoEndpoint,

    #[error("Invalid model configuration: {0}")]
    Invalid(String),
}

impl From<llm_client::Error> for ConfigError {
    fn from(error: llm_client::Error) -> Self {
        match error {
            llm_client::Error::NoEndpoint => ConfigError::NoEndpoint,
            other => ConfigError::Invalid(other.to_string()),
        }
    }
}

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy")]
    Easy,
    #[default]
    #[serde(alias = "normal")]
    Normal,
    #[serde(alias = "hard")]
    Hard,
}

impl Difficulty {
    pub fn starting_score(&self) -> u64 {
        match self {
            Difficulty::Easy => 1500,
            Difficulty::Normal => 1000,
            Difficulty::Hard => 500,
        }
    }

    /// Extra instruction for question prompts.
    pub fn prompt_note(&self) -> Option<&'static str> {
        match self {
            Difficulty::Easy => Some("Question should be foundational/basic."),
            Difficulty::Normal => None,
            Difficulty::Hard => Some("Question should be complex."),
        }
    }
}

/// Configuration for a game session. Fixed for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Subject the board and questions are themed on.
    pub domain: String,
    pub difficulty: Difficulty,
    /// System prompt for generation; empty means [`DEFAULT_PERSONA`].
    pub system_persona: String,
    /// Free-form guidance for question style.
    pub question_preferences: String,
}

impl SessionConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            difficulty: Difficulty::Normal,
            system_persona: String::new(),
            question_preferences: String::new(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_system_persona(mut self, persona: impl Into<String>) -> Self {
        self.system_persona = persona.into();
        self
    }

    pub fn with_question_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.question_preferences = preferences.into();
        self
    }

    /// The configured persona, or the default one.
    pub fn persona(&self) -> &str {
        if self.system_persona.trim().is_empty() {
            DEFAULT_PERSONA
        } else {
            &self.system_persona
        }
    }
}

/// Presentation delays between turn stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Dice animation before the value is drawn.
    pub roll: Duration,
    /// Delay between single-tile moves.
    pub step: Duration,
    /// Pause on the landing tile before it resolves.
    pub landing: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            roll: Duration::from_millis(1040),
            step: Duration::from_millis(250),
            landing: Duration::from_millis(300),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            roll: Duration::ZERO,
            step: Duration::ZERO,
            landing: Duration::ZERO,
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// External collaborators a session needs.
#[derive(Clone)]
pub struct Services {
    pub model: Arc<dyn ModelClient>,
    pub icons: Arc<dyn IconSearch>,
    pub store: Arc<dyn SaveStore>,
}

impl Services {
    pub fn new(
        model: Arc<dyn ModelClient>,
        icons: Arc<dyn IconSearch>,
        store: Arc<dyn SaveStore>,
    ) -> Self {
        Self {
            model,
            icons,
            store,
        }
    }

    /// Live services: an HTTP model client, Iconify search and file saves.
    pub fn connect(model: ModelConfig, save_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let client = Client::new(model)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(IconifyClient::new()),
            Arc::new(FileStore::new(save_dir)),
        ))
    }

    /// [`Services::connect`] with the model configured from the environment.
    pub fn from_env(save_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::connect(ModelConfig::from_env()?, save_dir)
    }
}

// ============================================================================
// Session
// ============================================================================

/// A single-player quiz board session.
pub struct GameSession {
    id: Uuid,
    config: SessionConfig,
    game: Game,
    services: Services,
    pipeline: GenerationPipeline,
    saves: SaveSlot,
    pacing: Pacing,
}

impl GameSession {
    /// A fresh session in [`Phase::Setup`]. Call [`GameSession::start`] next.
    pub fn new(config: SessionConfig, services: Services) -> Self {
        let game = Game::new(config.difficulty.starting_score());
        Self::assemble(Uuid::new_v4(), config, game, services)
    }

    /// Resume from the save slot, if it holds a usable snapshot.
    pub async fn resume(services: Services) -> Option<Self> {
        let saves = SaveSlot::new(services.store.clone());
        let snapshot = saves.load().await?;
        let game = match snapshot.restore_game() {
            Ok(game) => game,
            Err(e) => {
                tracing::warn!(error = %e, "Saved game could not be restored, ignoring");
                return None;
            }
        };
        let id = snapshot.session_id.unwrap_or_else(Uuid::new_v4);
        tracing::info!(session = %id, domain = %snapshot.domain, "Resumed saved game");
        Some(Self::assemble(id, snapshot.config(), game, services))
    }

    fn assemble(id: Uuid, config: SessionConfig, game: Game, services: Services) -> Self {
        Self {
            id,
            config,
            game,
            pipeline: GenerationPipeline::new(services.model.clone()),
            saves: SaveSlot::new(services.store.clone()),
            services,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline = GenerationPipeline::with_config(self.services.model.clone(), config);
        self
    }

    /// Seed dice, corners, lifelines and answer shuffling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.game = self.game.with_seed(seed);
        let config = self.pipeline.config().clone().with_seed(seed);
        self.with_pipeline_config(config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn phase(&self) -> Phase {
        self.game.phase()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.id, &self.config, &self.game)
    }

    /// Write the current state to the save slot.
    pub async fn save(&self) -> Result<(), SessionError> {
        self.saves.save(&self.snapshot()).await?;
        Ok(())
    }

    async fn autosave(&self) {
        if let Err(e) = self.save().await {
            tracing::warn!(error = %e, "Failed to save game");
        }
    }

    /// Clear any old save, generate the board and open the first turn.
    pub async fn start(&mut self) -> Result<GameEvent, SessionError> {
        if self.game.phase() != Phase::Setup {
            return Err(GameError::InvalidPhase(self.game.phase()).into());
        }
        self.saves.clear().await?;
        tracing::info!(session = %self.id, domain = %self.config.domain, "Generating board");

        let request = GenerationRequest::board(
            prompts::board_messages(&self.config),
            self.config.domain.clone(),
        );
        let generated = self.pipeline.generate(&request).await;
        let spec = generated
            .content
            .into_board()
            .unwrap_or_else(|| fallback::fallback_board(&self.config.domain));

        let icons = icons::resolve_icons(&spec.tiles, self.services.icons.as_ref()).await;
        let board = Board::generated(spec.title, &spec.tiles, &icons);
        let event = self.game.install_board(board)?;
        self.autosave().await;
        Ok(event)
    }

    /// Roll, move, land and, if needed, open the challenge for the tile.
    pub async fn roll(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        self.game.begin_roll()?;
        pause(self.pacing.roll).await;
        let mut events = vec![self.game.finish_roll()?];

        while self.game.phase() == Phase::Moving {
            pause(self.pacing.step).await;
            events.push(self.game.step()?);
        }
        self.autosave().await;

        pause(self.pacing.landing).await;
        let outcome = self.game.land()?;
        events.extend(outcome.events);
        match outcome.request {
            Some(request) => events.push(self.open_challenge(request).await?),
            None => self.autosave().await,
        }
        Ok(events)
    }

    /// Open a two-choice event between turns.
    pub async fn trigger_event(&mut self, context: impl Into<String>) -> Result<GameEvent, SessionError> {
        let request = self.game.trigger_event(context)?;
        self.open_challenge(request).await
    }

    async fn open_challenge(&mut self, request: ChallengeRequest) -> Result<GameEvent, SessionError> {
        let player = self.game.player();
        let generation = match &request {
            ChallengeRequest::Question { topic, boosted, .. } => GenerationRequest::question(
                prompts::question_messages(&self.config, topic, player),
            )
            .with_boost(*boosted),
            ChallengeRequest::Event { context } => {
                GenerationRequest::event(prompts::event_messages(&self.config, context, player))
            }
            ChallengeRequest::Boss => {
                GenerationRequest::boss(prompts::boss_messages(&self.config, player))
            }
        };

        let generated = self.pipeline.generate(&generation).await;
        tracing::debug!(kind = %request.kind(), source = ?generated.source, "Challenge content ready");

        match self.game.present(generated.content) {
            Ok(event) => Ok(event),
            Err(e) => {
                tracing::warn!(error = %e, "Could not present challenge, returning to roll");
                if let Err(abort) = self.game.abort_challenge() {
                    tracing::warn!(error = %abort, "Abort failed");
                }
                Err(e.into())
            }
        }
    }

    /// Answer the open challenge.
    pub async fn answer(&mut self, index: usize) -> Result<Vec<GameEvent>, SessionError> {
        let events = self.game.answer(index)?;
        self.autosave().await;
        Ok(events)
    }

    /// Close the resolved challenge.
    pub fn acknowledge(&mut self) -> Result<(), SessionError> {
        Ok(self.game.acknowledge()?)
    }

    pub fn use_lifeline(&mut self, lifeline: Lifeline) -> Result<GameEvent, SessionError> {
        Ok(self.game.use_lifeline(lifeline)?)
    }

    pub async fn buy(&mut self, item: ShopItem) -> Result<GameEvent, SessionError> {
        let event = self.game.buy(item)?;
        self.autosave().await;
        Ok(event)
    }

    /// Make the next landing a boss encounter.
    pub async fn schedule_boss(&mut self) -> GameEvent {
        let event = self.game.schedule_boss();
        self.autosave().await;
        event
    }

    /// Close the open challenge without scoring it.
    pub fn abort_challenge(&mut self) -> Result<GameEvent, SessionError> {
        Ok(self.game.abort_challenge()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fallback::FALLBACK_QUESTION;
    use crate::persist::MemoryStore;
    use crate::testing::{MockIcons, MockModel, MockReply};

    const BOARD_REPLY: &str = r#"Here is your board:
{"title": "Ocean Depths", "tiles": [{"name": "Coral Reefs", "keyword": "coral"}, {"name": "Plankton", "keyword": "microscope"}, {"name": "Tides", "keyword": "wave"}]}"#;

    fn services(model: MockModel, store: Arc<MemoryStore>) -> Services {
        Services::new(
            Arc::new(model),
            Arc::new(MockIcons::new().with_icon("coral", "mdi:coral")),
            store,
        )
    }

    fn session(model: MockModel, store: Arc<MemoryStore>) -> GameSession {
        GameSession::new(SessionConfig::new("Oceanography"), services(model, store))
            .with_pacing(Pacing::instant())
            .with_seed(5)
    }

    #[test]
    fn test_difficulty_starting_scores() {
        assert_eq!(Difficulty::Easy.starting_score(), 1500);
        assert_eq!(Difficulty::Normal.starting_score(), 1000);
        assert_eq!(Difficulty::Hard.starting_score(), 500);
    }

    #[test]
    fn test_default_persona() {
        let config = SessionConfig::new("x");
        assert_eq!(config.persona(), DEFAULT_PERSONA);
        let config = config.with_system_persona("You are a pirate.");
        assert_eq!(config.persona(), "You are a pirate.");
    }

    #[test]
    fn test_connect_requires_endpoint() {
        let result = Services::connect(ModelConfig::new(""), "/tmp/unused");
        assert!(matches!(result, Err(ConfigError::NoEndpoint)));
    }

    #[tokio::test]
    async fn test_start_generates_board_and_saves() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(MockModel::new().with_reply(MockReply::text(BOARD_REPLY)), store.clone());

        let event = session.start().await.unwrap();
        assert_eq!(
            event,
            GameEvent::BoardReady {
                title: Some("Ocean Depths".to_string())
            }
        );

        let board = session.game().board();
        assert_eq!(board.tile(1).name, "Coral Reefs");
        assert_eq!(board.tile(1).icon, "mdi:coral");
        assert_eq!(board.tile(2).icon, "mdi:square");
        assert_eq!(board.tile(4).name, "Coral Reefs");
        assert_eq!(session.phase(), Phase::AwaitingRoll);

        let saved = SaveSlot::new(store).load().await.unwrap();
        assert_eq!(saved.title.as_deref(), Some("Ocean Depths"));
        assert_eq!(saved.tiles.len(), 20);
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(MockModel::new(), store);
        session.start().await.unwrap();
        assert!(matches!(
            session.start().await,
            Err(SessionError::Game(GameError::InvalidPhase(Phase::AwaitingRoll)))
        ));
    }

    #[tokio::test]
    async fn test_roll_opens_fallback_question_on_property() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(MockModel::new(), store);
        session.start().await.unwrap();

        for _ in 0..20 {
            let events = session.roll().await.unwrap();
            assert!(matches!(events[0], GameEvent::Rolled { .. }));
            if session.phase() == Phase::AwaitingAnswer {
                let crate::game::Challenge::Question(challenge) = session.game().challenge().unwrap()
                else {
                    panic!("expected a question");
                };
                assert_eq!(challenge.question, *FALLBACK_QUESTION);
                return;
            }
        }
        panic!("never landed on a property tile");
    }

    #[tokio::test]
    async fn test_resume_restores_progress() {
        let store = Arc::new(MemoryStore::new());
        let mut first = session(MockModel::new().with_reply(MockReply::text(BOARD_REPLY)), store.clone());
        first.start().await.unwrap();
        first.buy(ShopItem::Shield).await.unwrap();
        first.schedule_boss().await;

        let resumed = GameSession::resume(services(MockModel::new(), store)).await.unwrap();
        assert_eq!(resumed.id(), first.id());
        assert_eq!(resumed.config().domain, "Oceanography");
        assert_eq!(resumed.game().player().inventory.shield, 1);
        assert_eq!(resumed.game().player().score, 500);
        assert!(resumed.game().boss_pending());
        assert_eq!(resumed.game().board().tile(1).name, "Coral Reefs");
        assert_eq!(resumed.phase(), Phase::AwaitingRoll);
    }

    #[tokio::test]
    async fn test_resume_without_save() {
        let store = Arc::new(MemoryStore::new());
        assert!(GameSession::resume(services(MockModel::new(), store)).await.is_none());
    }

    #[tokio::test]
    async fn test_new_game_clears_save() {
        let store = Arc::new(MemoryStore::new());
        let mut first = session(MockModel::new(), store.clone());
        first.start().await.unwrap();
        first.buy(ShopItem::Shield).await.unwrap();

        let mut second = session(MockModel::new(), store.clone());
        second.start().await.unwrap();
        let saved = SaveSlot::new(store).load().await.unwrap();
        assert_eq!(saved.inventory.shield, 0);
        assert_eq!(saved.session_id, Some(second.id()));
    }
}
