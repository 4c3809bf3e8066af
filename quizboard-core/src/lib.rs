//! Trivia board game engine with language-model generated content.
//!
//! This crate provides:
//! - A twenty-tile board themed on any subject the player picks
//! - Questions, events and boss encounters generated by a chat model
//! - Relaxed JSON recovery for unreliable model output, with canned fallbacks
//! - Scoring, streaks, XP, lifelines and a small shop
//! - Single-slot save and resume
//!
//! # Quick Start
//!
//! ```ignore
//! use quizboard_core::{Difficulty, GameSession, Services, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let services = Services::from_env("saves")?;
//!     let config = SessionConfig::new("Supply Chain Management")
//!         .with_difficulty(Difficulty::Hard);
//!
//!     let mut session = GameSession::new(config, services);
//!     session.start().await?;
//!
//!     for event in session.roll().await? {
//!         println!("{event:?}");
//!     }
//!     if session.game().challenge().is_some() {
//!         session.answer(0).await?;
//!         session.acknowledge()?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod content;
pub mod dice;
pub mod game;
pub mod generation;
pub mod icons;
pub mod persist;
pub mod player;
pub mod relaxed;
pub mod session;
pub mod testing;

pub use board::{Board, CornerRole, Tile, TileKind, BOARD_SIZE};
pub use content::{BoardSpec, BossEncounter, ContentKind, Event, GeneratedContent, Question};
pub use game::{Challenge, Game, GameError, GameEvent, Lifeline, Phase, ShopItem};
pub use generation::{GenerationPipeline, ModelClient, PipelineConfig};
pub use icons::{IconSearch, IconifyClient};
pub use persist::{FileStore, MemoryStore, SaveSlot, SaveStore, Snapshot};
pub use player::{Inventory, Player};
pub use session::{
    ConfigError, Difficulty, GameSession, Pacing, Services, SessionConfig, SessionError,
};
pub use testing::{MockIcons, MockModel, MockReply, TestHarness};

// Re-export model types used in the public API
pub use llm_client::{Message, ModelConfig, Role};
