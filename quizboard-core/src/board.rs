//! The 20-tile board ring.

use crate::content::{TileConcept, BOARD_CONCEPT_COUNT};
use crate::icons::fallback_icon;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tiles on the ring.
pub const BOARD_SIZE: usize = 20;

/// Name shown on property tiles before the board is generated.
const PLACEHOLDER_NAME: &str = "...";

/// Errors from building a board out of stored tiles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board must have 20 tiles, found {0}")]
    WrongSize(usize),

    #[error("Tile {0} does not match its corner layout")]
    CornerMismatch(usize),
}

/// Fixed role of each corner tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CornerRole {
    Start,
    Break,
    Bonus,
    Risk,
}

impl CornerRole {
    /// The corner role at `index`, if `index` is a corner.
    pub fn at(index: usize) -> Option<Self> {
        match index {
            0 => Some(CornerRole::Start),
            5 => Some(CornerRole::Break),
            10 => Some(CornerRole::Bonus),
            15 => Some(CornerRole::Risk),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CornerRole::Start => "START",
            CornerRole::Break => "BREAK",
            CornerRole::Bonus => "BONUS",
            CornerRole::Risk => "RISK",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CornerRole::Start => "flag-fill",
            CornerRole::Break => "cup-hot-fill",
            CornerRole::Bonus => "star-fill",
            CornerRole::Risk => "exclamation-diamond-fill",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Corner(CornerRole),
    Property,
}

/// A single board slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub index: usize,
    pub kind: TileKind,
    pub name: String,
    pub icon: String,
    /// Topic passed to question generation; `None` on corners.
    pub topic: Option<String>,
    pub mastered: bool,
}

impl Tile {
    pub fn corner(role: CornerRole, index: usize) -> Self {
        Self {
            index,
            kind: TileKind::Corner(role),
            name: role.name().to_string(),
            icon: role.icon().to_string(),
            topic: None,
            mastered: false,
        }
    }

    pub fn property(index: usize, name: impl Into<String>, icon: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            index,
            kind: TileKind::Property,
            topic: Some(name.clone()),
            name,
            icon: icon.into(),
            mastered: false,
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self.kind, TileKind::Corner(_))
    }

    pub fn corner_role(&self) -> Option<CornerRole> {
        match self.kind {
            TileKind::Corner(role) => Some(role),
            TileKind::Property => None,
        }
    }

    /// Topic for question prompts, falling back to the display name.
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(&self.name)
    }

    /// Mark mastered. Returns `true` only the first time.
    pub fn master(&mut self) -> bool {
        let first = !self.mastered;
        self.mastered = true;
        first
    }
}

/// A ring of [`BOARD_SIZE`] tiles with corners at 0, 5, 10 and 15.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    title: Option<String>,
    tiles: Vec<Tile>,
}

impl Board {
    /// Board shown before generation: corners plus unnamed properties.
    pub fn placeholder() -> Self {
        let mut ordinal = 0;
        let tiles = (0..BOARD_SIZE)
            .map(|index| match CornerRole::at(index) {
                Some(role) => Tile::corner(role, index),
                None => {
                    let tile = Tile::property(index, PLACEHOLDER_NAME, fallback_icon(ordinal));
                    ordinal += 1;
                    tile
                }
            })
            .collect();
        Self { title: None, tiles }
    }

    /// Assign concepts and icons to the sixteen property slots in order.
    ///
    /// Concepts and icons are reused cyclically if fewer than sixteen are
    /// given; missing icons fall back to the fixed pool.
    pub fn generated(title: Option<String>, concepts: &[TileConcept], icons: &[String]) -> Self {
        let mut board = Self::placeholder();
        board.title = title;
        if concepts.is_empty() {
            return board;
        }

        let properties = board.tiles.iter_mut().filter(|t| !t.is_corner());
        for (ordinal, tile) in properties.enumerate().take(BOARD_CONCEPT_COUNT) {
            let concept = &concepts[ordinal % concepts.len()];
            let icon = icons
                .get(ordinal)
                .cloned()
                .unwrap_or_else(|| fallback_icon(ordinal).to_string());
            *tile = Tile::property(tile.index, concept.name.clone(), icon);
        }
        board
    }

    /// Rebuild from stored tiles, checking size and corner layout.
    pub fn from_tiles(title: Option<String>, tiles: Vec<Tile>) -> Result<Self, BoardError> {
        if tiles.len() != BOARD_SIZE {
            return Err(BoardError::WrongSize(tiles.len()));
        }
        for (index, tile) in tiles.iter().enumerate() {
            if tile.index != index || tile.corner_role() != CornerRole::at(index) {
                return Err(BoardError::CornerMismatch(index));
            }
        }
        Ok(Self { title, tiles })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at `index`, wrapping around the ring.
    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index % BOARD_SIZE]
    }

    pub fn tile_mut(&mut self, index: usize) -> &mut Tile {
        &mut self.tiles[index % BOARD_SIZE]
    }

    pub fn properties(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| !t.is_corner())
    }

    pub fn mastered_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.mastered).count()
    }
}

/// Position one step clockwise.
pub fn next_position(position: usize) -> usize {
    (position + 1) % BOARD_SIZE
}
