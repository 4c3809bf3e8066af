//! Player progress, inventory and timed effects.

use crate::board::{next_position, BOARD_SIZE};
use serde::{Deserialize, Serialize};

/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 200;

/// Turns an XP boost lasts once bought.
pub const XP_BOOST_TURNS: u32 = 5;

/// Reward multiplier while an XP boost is active.
pub const XP_BOOST_MULTIPLIER: f64 = 1.5;

/// Level for a given XP total: `xp / 200 + 1`.
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Consumable items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inventory {
    pub shield: u32,
    pub xp_boost: u32,
    pub master_key: u32,
}

/// Timed effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveEffects {
    pub xp_multiplier: f64,
    pub xp_boost_turns: u32,
}

impl Default for ActiveEffects {
    fn default() -> Self {
        Self {
            xp_multiplier: 1.0,
            xp_boost_turns: 0,
        }
    }
}

/// The single player's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: usize,
    pub score: u64,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub inventory: Inventory,
    pub effects: ActiveEffects,
}

impl Player {
    pub fn new(starting_score: u64) -> Self {
        Self {
            position: 0,
            score: starting_score,
            xp: 0,
            level: 1,
            streak: 0,
            inventory: Inventory::default(),
            effects: ActiveEffects::default(),
        }
    }

    /// Advance one tile clockwise and return the new position.
    pub fn step(&mut self) -> usize {
        self.position = next_position(self.position % BOARD_SIZE);
        self.position
    }

    pub fn add_score(&mut self, amount: u64) {
        self.score = self.score.saturating_add(amount);
    }

    /// Deduct up to `amount`, stopping at zero. Returns what was deducted.
    pub fn deduct_score(&mut self, amount: u64) -> u64 {
        let deducted = amount.min(self.score);
        self.score -= deducted;
        deducted
    }

    /// Spend exactly `cost` if affordable.
    pub fn try_spend(&mut self, cost: u64) -> bool {
        if self.score < cost {
            return false;
        }
        self.score -= cost;
        true
    }

    /// Add XP and recompute level. Returns the new level on level-up.
    pub fn gain_xp(&mut self, amount: u64) -> Option<u32> {
        self.xp = self.xp.saturating_add(amount);
        self.refresh_level()
    }

    /// Raise the level to match XP; never lowers it.
    pub fn refresh_level(&mut self) -> Option<u32> {
        let derived = level_for_xp(self.xp);
        if derived > self.level {
            self.level = derived;
            Some(derived)
        } else {
            None
        }
    }

    pub fn xp_boost_active(&self) -> bool {
        self.effects.xp_boost_turns > 0
    }

    pub fn arm_xp_boost(&mut self) {
        self.effects.xp_boost_turns = XP_BOOST_TURNS;
        self.effects.xp_multiplier = XP_BOOST_MULTIPLIER;
    }

    /// Use one boosted turn if any remain. Returns whether one was used.
    pub fn consume_xp_boost_turn(&mut self) -> bool {
        if self.effects.xp_boost_turns == 0 {
            return false;
        }
        self.effects.xp_boost_turns -= 1;
        if self.effects.xp_boost_turns == 0 {
            self.effects.xp_multiplier = 1.0;
        }
        true
    }
}
