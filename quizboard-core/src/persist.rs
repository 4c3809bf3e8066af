//! Save slot persistence.
//!
//! A single snapshot of the session lives under [`SAVE_SLOT_KEY`] in a
//! key-value [`SaveStore`]. Snapshots are camelCase JSON and every field has
//! a default, so older or partial saves still load. A save that cannot be
//! parsed or rebuilt is treated as no save at all.

use crate::board::{Board, CornerRole, Tile, TileKind};
use crate::game::Game;
use crate::player::{ActiveEffects, Inventory, Player};
use crate::session::{Difficulty, SessionConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The one save slot.
pub const SAVE_SLOT_KEY: &str = "boardGameState";

/// Current snapshot format version.
pub const SAVE_VERSION: u32 = 1;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid save: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: expected at most {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

// ============================================================================
// Stores
// ============================================================================

/// Async key-value storage for saves.
#[async_trait]
pub trait SaveStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError>;
    async fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl SaveStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store, for tests and headless play.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SaveStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Stored form of one tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSummary {
    pub name: String,
    /// `"corner"` or `"property"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
    /// Question topic; `null` on corners.
    pub metadata: Option<String>,
    pub mastered: bool,
}

impl TileSummary {
    fn from_tile(tile: &Tile) -> Self {
        let kind = match tile.kind {
            TileKind::Corner(_) => "corner",
            TileKind::Property => "property",
        };
        Self {
            name: tile.name.clone(),
            kind: kind.to_string(),
            icon: tile.icon.clone(),
            metadata: tile.topic.clone(),
            mastered: tile.mastered,
        }
    }

    fn to_tile(&self, index: usize) -> Result<Tile, PersistError> {
        let mut tile = match (self.kind.as_str(), CornerRole::at(index)) {
            ("corner", Some(role)) => Tile::corner(role, index),
            ("property", None) => {
                let mut tile = Tile::property(index, self.name.clone(), self.icon.clone());
                if let Some(topic) = &self.metadata {
                    tile.topic = Some(topic.clone());
                }
                tile
            }
            (kind, _) => {
                return Err(PersistError::InvalidFormat(format!(
                    "tile {index} has unexpected type {kind:?}"
                )))
            }
        };
        tile.mastered = self.mastered;
        Ok(tile)
    }
}

/// Everything needed to resume a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub session_id: Option<Uuid>,
    pub domain: String,
    pub title: Option<String>,
    pub difficulty: Difficulty,
    pub system_persona: String,
    pub question_preferences: String,
    pub score: u64,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub inventory: Inventory,
    pub active_effects: ActiveEffects,
    pub player_position: usize,
    pub pending_boss: bool,
    pub tiles: Vec<TileSummary>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub version: u32,
}

impl Snapshot {
    /// Capture the current session state.
    pub fn capture(session_id: Uuid, config: &SessionConfig, game: &Game) -> Self {
        let player = game.player();
        Self {
            session_id: Some(session_id),
            domain: config.domain.clone(),
            title: game.board().title().map(str::to_string),
            difficulty: config.difficulty,
            system_persona: config.system_persona.clone(),
            question_preferences: config.question_preferences.clone(),
            score: player.score,
            xp: player.xp,
            level: player.level,
            streak: player.streak,
            inventory: player.inventory,
            active_effects: player.effects,
            player_position: player.position,
            pending_boss: game.boss_pending(),
            tiles: game.board().tiles().iter().map(TileSummary::from_tile).collect(),
            timestamp: now_millis(),
            version: SAVE_VERSION,
        }
    }

    /// Session config stored in the snapshot.
    pub fn config(&self) -> SessionConfig {
        SessionConfig::new(self.domain.clone())
            .with_difficulty(self.difficulty)
            .with_system_persona(self.system_persona.clone())
            .with_question_preferences(self.question_preferences.clone())
    }

    /// Rebuild a game positioned between turns.
    pub fn restore_game(&self) -> Result<Game, PersistError> {
        if self.version > SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }

        let tiles = self
            .tiles
            .iter()
            .enumerate()
            .map(|(index, summary)| summary.to_tile(index))
            .collect::<Result<Vec<_>, _>>()?;
        let board = Board::from_tiles(self.title.clone(), tiles)
            .map_err(|e| PersistError::InvalidFormat(e.to_string()))?;

        if self.player_position >= board.tiles().len() {
            return Err(PersistError::InvalidFormat(format!(
                "player position {} is off the board",
                self.player_position
            )));
        }

        let mut player = Player::new(self.score);
        player.xp = self.xp;
        player.level = self.level.max(1);
        player.refresh_level();
        player.streak = self.streak;
        player.inventory = self.inventory;
        player.effects = self.active_effects;
        player.position = self.player_position;

        Ok(Game::restore(board, player, self.pending_boss))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ============================================================================
// Save slot
// ============================================================================

/// The single named save slot.
#[derive(Clone)]
pub struct SaveSlot {
    store: Arc<dyn SaveStore>,
    key: String,
}

impl SaveSlot {
    pub fn new(store: Arc<dyn SaveStore>) -> Self {
        Self {
            store,
            key: SAVE_SLOT_KEY.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrite the slot.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let content = serde_json::to_string(snapshot)?;
        self.store.write(&self.key, &content).await?;
        tracing::debug!(key = %self.key, "Game saved");
        Ok(())
    }

    /// Read the slot. Missing, unreadable or corrupted saves yield `None`.
    pub async fn load(&self) -> Option<Snapshot> {
        let content = match self.store.read(&self.key).await {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read save");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Save file corrupted, ignoring");
                None
            }
        }
    }

    /// Remove the slot.
    pub async fn clear(&self) -> Result<(), PersistError> {
        self.store.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    fn sample_snapshot() -> Snapshot {
        let mut harness = TestHarness::new();
        harness.game.player.xp = 260;
        harness.game.player.level = 2;
        harness.game.player.streak = 3;
        harness.game.player.position = 7;
        harness.game.player.inventory.shield = 2;
        harness.game.board.tile_mut(4).master();
        harness.game.schedule_boss();
        Snapshot::capture(Uuid::new_v4(), &SessionConfig::new("Marine Biology"), &harness.game)
    }

    #[test]
    fn test_snapshot_field_names() {
        let value = serde_json::to_value(sample_snapshot()).unwrap();
        for field in [
            "domain",
            "difficulty",
            "systemPersona",
            "questionPreferences",
            "score",
            "xp",
            "level",
            "streak",
            "inventory",
            "activeEffects",
            "playerPosition",
            "pendingBoss",
            "tiles",
            "timestamp",
            "version",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["tiles"][0]["type"], "corner");
        assert_eq!(value["tiles"][1]["type"], "property");
        assert_eq!(value["inventory"]["masterKey"], 0);
        assert_eq!(value["activeEffects"]["xpBoostTurns"], 0);
    }

    #[test]
    fn test_snapshot_restores_game() {
        let snapshot = sample_snapshot();
        let game = snapshot.restore_game().unwrap();

        assert_eq!(game.phase(), crate::game::Phase::AwaitingRoll);
        assert_eq!(game.player().position, 7);
        assert_eq!(game.player().streak, 3);
        assert_eq!(game.player().inventory.shield, 2);
        assert!(game.board().tile(4).mastered);
        assert!(game.boss_pending());
        assert_eq!(snapshot.config().domain, "Marine Biology");
    }

    #[test]
    fn test_sparse_save_loads_with_defaults() {
        let json = r#"{
            "domain": "Chess",
            "difficulty": "Hard",
            "score": 700,
            "xp": 450,
            "playerPosition": 2,
            "tiles": []
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.difficulty, Difficulty::Hard);
        assert_eq!(snapshot.inventory, Inventory::default());
        assert_eq!(snapshot.active_effects.xp_multiplier, 1.0);
        assert!(!snapshot.pending_boss);
        assert!(snapshot.restore_game().is_err());
    }

    #[test]
    fn test_level_restored_from_xp() {
        let mut snapshot = sample_snapshot();
        snapshot.level = 0;
        snapshot.xp = 450;
        let game = snapshot.restore_game().unwrap();
        assert_eq!(game.player().level, 3);
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut snapshot = sample_snapshot();
        snapshot.version = SAVE_VERSION + 1;
        assert!(matches!(
            snapshot.restore_game(),
            Err(PersistError::VersionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_slot_round_trip_in_memory() {
        let slot = SaveSlot::new(Arc::new(MemoryStore::new()));
        assert!(slot.load().await.is_none());

        let snapshot = sample_snapshot();
        slot.save(&snapshot).await.unwrap();
        assert_eq!(slot.load().await, Some(snapshot));

        slot.clear().await.unwrap();
        assert!(slot.load().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_save_is_absent() {
        let store = Arc::new(MemoryStore::new());
        store.write(SAVE_SLOT_KEY, "{not json").await.unwrap();
        let slot = SaveSlot::new(store);
        assert!(slot.load().await.is_none());
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("saves"));

        assert_eq!(store.read("slot").await.unwrap(), None);
        store.write("slot", "{}").await.unwrap();
        assert_eq!(store.read("slot").await.unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("saves").join("slot.json").exists());

        store.remove("slot").await.unwrap();
        store.remove("slot").await.unwrap();
        assert_eq!(store.read("slot").await.unwrap(), None);
    }
}
