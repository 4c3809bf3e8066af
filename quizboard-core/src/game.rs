//! The turn state machine.
//!
//! [`Game`] owns the board, the player and the active challenge, and applies
//! every economy rule. It is synchronous: content generation and pacing
//! live in [`crate::session::GameSession`], which feeds generated content
//! back in through [`Game::present`].
//!
//! A turn runs:
//!
//! ```text
//! AwaitingRoll -> Rolling -> Moving -> Landing -+-> AwaitingRoll            (corner)
//!                                               +-> AwaitingAnswer -> Resolving -> AwaitingRoll
//! ```
//!
//! Every operation either succeeds and returns [`GameEvent`]s describing what
//! changed, or fails with a [`GameError`] and leaves the state untouched.

use crate::board::{Board, CornerRole};
use crate::content::{BossEncounter, ContentKind, Event, EventRisk, GeneratedContent, Question};
use crate::dice;
use crate::player::Player;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Rules
// ============================================================================

/// Credits for landing on START.
pub const START_BONUS: u64 = 200;

/// XP for a correct answer.
pub const CORRECT_ANSWER_XP: u64 = 50;

/// Credits lost on an unshielded wrong answer.
pub const WRONG_ANSWER_PENALTY: u64 = 50;

pub const BOSS_XP_REWARD: u64 = 500;
pub const BOSS_SCORE_REWARD: u64 = 1000;

pub const SAFE_EVENT_REWARD: u64 = 50;
pub const RISKY_EVENT_REWARD: u64 = 300;
pub const RISKY_EVENT_PENALTY: u64 = 100;

/// Shown when a hint is bought for a question without one.
pub const NO_HINT_TEXT: &str = "No hint available.";

/// Options removed by the fifty-fifty lifeline.
const FIFTY_FIFTY_REMOVES: usize = 2;

/// Reward for a correct answer at the given (already incremented) streak:
/// `floor(base * (1 + streak / 10))`, computed in integers.
pub fn streak_reward(base: u64, streak: u32) -> u64 {
    base.saturating_mul(10 + u64::from(streak)) / 10
}

/// Paid help for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifeline {
    Hint,
    FiftyFifty,
}

impl Lifeline {
    /// Cost at the player's level; higher levels unlock discounts.
    pub fn cost(&self, level: u32) -> u64 {
        match self {
            Lifeline::Hint if level >= 2 => 25,
            Lifeline::Hint => 50,
            Lifeline::FiftyFifty if level >= 5 => 50,
            Lifeline::FiftyFifty => 100,
        }
    }
}

impl fmt::Display for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifeline::Hint => write!(f, "Hint"),
            Lifeline::FiftyFifty => write!(f, "50/50"),
        }
    }
}

/// Items sold in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItem {
    Shield,
    XpBoost,
}

impl ShopItem {
    pub fn cost(&self) -> u64 {
        match self {
            ShopItem::Shield => 500,
            ShopItem::XpBoost => 800,
        }
    }
}

// ============================================================================
// Phases, challenges, events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No board yet.
    Setup,
    AwaitingRoll,
    Rolling,
    Moving,
    Landing,
    /// A challenge is open or being generated.
    AwaitingAnswer,
    /// An answer was given; waiting for acknowledgement.
    Resolving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("A roll is already in progress")]
    RollInProgress,

    #[error("Not allowed during {0}")]
    InvalidPhase(Phase),

    #[error("Insufficient funds: costs {cost}, you have {available}")]
    InsufficientFunds { cost: u64, available: u64 },

    #[error("{0} already used on this question")]
    LifelineUsed(Lifeline),

    #[error("Lifelines can only be used on questions")]
    LifelineUnavailable,

    #[error("No active challenge")]
    NoActiveChallenge,

    #[error("Option {0} cannot be chosen")]
    InvalidOption(usize),

    #[error("Expected {expected} content, got {got}")]
    UnexpectedContent { expected: ContentKind, got: ContentKind },
}

/// Content the game needs before a challenge can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeRequest {
    Question {
        tile_index: usize,
        topic: String,
        /// An XP boost turn was used; the reward should be scaled.
        boosted: bool,
    },
    Event {
        context: String,
    },
    Boss,
}

impl ChallengeRequest {
    pub fn kind(&self) -> ContentKind {
        match self {
            ChallengeRequest::Question { .. } => ContentKind::Question,
            ChallengeRequest::Event { .. } => ContentKind::Event,
            ChallengeRequest::Boss => ContentKind::Boss,
        }
    }
}

/// An open question with its lifeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionChallenge {
    pub tile_index: usize,
    pub question: Question,
    pub revealed_hint: Option<String>,
    pub eliminated: Vec<usize>,
    pub fifty_fifty_used: bool,
}

impl QuestionChallenge {
    fn new(tile_index: usize, question: Question) -> Self {
        Self {
            tile_index,
            question,
            revealed_hint: None,
            eliminated: Vec::new(),
            fifty_fifty_used: false,
        }
    }

    pub fn hint_used(&self) -> bool {
        self.revealed_hint.is_some()
    }

    fn is_used(&self, lifeline: Lifeline) -> bool {
        match lifeline {
            Lifeline::Hint => self.hint_used(),
            Lifeline::FiftyFifty => self.fifty_fifty_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChallenge {
    pub context: String,
    pub event: Event,
}

/// The challenge currently shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Question(QuestionChallenge),
    Event(EventChallenge),
    Boss(BossEncounter),
}

impl Challenge {
    pub fn kind(&self) -> ContentKind {
        match self {
            Challenge::Question(_) => ContentKind::Question,
            Challenge::Event(_) => ContentKind::Event,
            Challenge::Boss(_) => ContentKind::Boss,
        }
    }

    fn option_count(&self) -> usize {
        match self {
            Challenge::Question(q) => q.question.options.len(),
            Challenge::Event(e) => e.event.options.len(),
            Challenge::Boss(b) => b.options.len(),
        }
    }
}

/// What changed, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    BoardReady {
        title: Option<String>,
    },
    Rolled {
        value: u8,
    },
    Moved {
        position: usize,
    },
    Landed {
        position: usize,
        tile: String,
    },
    CornerResolved {
        role: CornerRole,
        delta: i64,
    },
    XpBoostConsumed {
        turns_left: u32,
    },
    XpBoostExpired,
    BossScheduled,
    ChallengeOpened {
        kind: ContentKind,
    },
    HintRevealed {
        text: String,
        cost: u64,
    },
    OptionsEliminated {
        indices: Vec<usize>,
        cost: u64,
    },
    AnswerCorrect {
        reward: u64,
        streak: u32,
    },
    AnswerIncorrect {
        correct_index: usize,
        penalty: u64,
    },
    ShieldAbsorbed {
        correct_index: usize,
        shields_left: u32,
    },
    TileMastered {
        index: usize,
    },
    LevelUp {
        level: u32,
    },
    BossDefeated {
        xp: u64,
        score: u64,
    },
    BossFailed {
        correct_index: usize,
    },
    EventResolved {
        risk: EventRisk,
        success: bool,
        delta: i64,
    },
    ItemPurchased {
        item: ShopItem,
        cost: u64,
    },
    ChallengeAborted,
}

/// Result of [`Game::land`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingOutcome {
    pub events: Vec<GameEvent>,
    /// Content needed before play continues; `None` when the turn is over.
    pub request: Option<ChallengeRequest>,
}

// ============================================================================
// Game
// ============================================================================

/// Authoritative game state.
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) board: Board,
    pub(crate) player: Player,
    pub(crate) phase: Phase,
    pub(crate) boss_pending: bool,
    pub(crate) pending: Option<ChallengeRequest>,
    pub(crate) challenge: Option<Challenge>,
    pub(crate) steps_remaining: u8,
    pub(crate) last_roll: Option<u8>,
    rng: StdRng,
}

impl Game {
    /// A game in [`Phase::Setup`] with a placeholder board.
    pub fn new(starting_score: u64) -> Self {
        Self::with_rng(Board::placeholder(), Player::new(starting_score), StdRng::from_entropy())
    }

    /// Resume play on an existing board and player.
    pub fn restore(board: Board, player: Player, boss_pending: bool) -> Self {
        let mut game = Self::with_rng(board, player, StdRng::from_entropy());
        game.phase = Phase::AwaitingRoll;
        game.boss_pending = boss_pending;
        game
    }

    fn with_rng(board: Board, player: Player, rng: StdRng) -> Self {
        Self {
            board,
            player,
            phase: Phase::Setup,
            boss_pending: false,
            pending: None,
            challenge: None,
            steps_remaining: 0,
            last_roll: None,
            rng,
        }
    }

    /// Use a deterministic random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn boss_pending(&self) -> bool {
        self.boss_pending
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    /// Content requested by the last landing or event trigger, not yet presented.
    pub fn pending_request(&self) -> Option<&ChallengeRequest> {
        self.pending.as_ref()
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.last_roll
    }

    pub fn steps_remaining(&self) -> u8 {
        self.steps_remaining
    }

    fn require(&self, phase: Phase) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::InvalidPhase(self.phase))
        }
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Install the generated board and open the first turn.
    pub fn install_board(&mut self, board: Board) -> Result<GameEvent, GameError> {
        self.require(Phase::Setup)?;
        let title = board.title().map(str::to_string);
        self.board = board;
        self.phase = Phase::AwaitingRoll;
        tracing::info!(title = ?title, "Board installed");
        Ok(GameEvent::BoardReady { title })
    }

    /// Make the next landing a boss encounter.
    pub fn schedule_boss(&mut self) -> GameEvent {
        self.boss_pending = true;
        GameEvent::BossScheduled
    }

    // ------------------------------------------------------------------
    // Rolling and moving
    // ------------------------------------------------------------------

    /// Start a roll. A second call before the turn finishes is rejected.
    pub fn begin_roll(&mut self) -> Result<(), GameError> {
        match self.phase {
            Phase::AwaitingRoll => {
                self.phase = Phase::Rolling;
                Ok(())
            }
            Phase::Rolling | Phase::Moving | Phase::Landing => Err(GameError::RollInProgress),
            other => Err(GameError::InvalidPhase(other)),
        }
    }

    /// Draw the die value and start moving.
    pub fn finish_roll(&mut self) -> Result<GameEvent, GameError> {
        self.require(Phase::Rolling)?;
        let value = dice::roll_die(&mut self.rng);
        self.last_roll = Some(value);
        self.steps_remaining = value;
        self.phase = Phase::Moving;
        tracing::debug!(value, "Rolled");
        Ok(GameEvent::Rolled { value })
    }

    /// [`Game::begin_roll`] and [`Game::finish_roll`] in one call.
    pub fn roll(&mut self) -> Result<u8, GameError> {
        self.begin_roll()?;
        self.finish_roll()?;
        Ok(self.steps_remaining)
    }

    /// Move one tile. The last step enters [`Phase::Landing`].
    pub fn step(&mut self) -> Result<GameEvent, GameError> {
        self.require(Phase::Moving)?;
        let position = self.player.step();
        self.steps_remaining = self.steps_remaining.saturating_sub(1);
        if self.steps_remaining == 0 {
            self.phase = Phase::Landing;
        }
        Ok(GameEvent::Moved { position })
    }

    /// Take every remaining step.
    pub fn advance(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.require(Phase::Moving)?;
        let mut events = Vec::with_capacity(self.steps_remaining as usize);
        while self.phase == Phase::Moving {
            events.push(self.step()?);
        }
        Ok(events)
    }

    // ------------------------------------------------------------------
    // Landing
    // ------------------------------------------------------------------

    /// Resolve the tile under the player.
    ///
    /// A scheduled boss pre-empts the tile. Corners resolve immediately;
    /// properties request a question.
    pub fn land(&mut self) -> Result<LandingOutcome, GameError> {
        self.require(Phase::Landing)?;
        let position = self.player.position;
        let tile = self.board.tile(position);
        let mut events = vec![GameEvent::Landed {
            position,
            tile: tile.name.clone(),
        }];

        if self.boss_pending {
            self.boss_pending = false;
            return Ok(self.open_request(ChallengeRequest::Boss, events));
        }

        if let Some(role) = tile.corner_role() {
            let delta = self.resolve_corner(role);
            events.push(GameEvent::CornerResolved { role, delta });
            self.phase = Phase::AwaitingRoll;
            tracing::info!(corner = role.name(), delta, score = self.player.score, "Corner resolved");
            return Ok(LandingOutcome {
                events,
                request: None,
            });
        }

        let topic = tile.topic().to_string();
        let boosted = self.player.consume_xp_boost_turn();
        if boosted {
            let turns_left = self.player.effects.xp_boost_turns;
            events.push(GameEvent::XpBoostConsumed { turns_left });
            if turns_left == 0 {
                events.push(GameEvent::XpBoostExpired);
            }
        }
        let request = ChallengeRequest::Question {
            tile_index: position,
            topic,
            boosted,
        };
        Ok(self.open_request(request, events))
    }

    fn open_request(&mut self, request: ChallengeRequest, events: Vec<GameEvent>) -> LandingOutcome {
        self.pending = Some(request.clone());
        self.phase = Phase::AwaitingAnswer;
        LandingOutcome {
            events,
            request: Some(request),
        }
    }

    fn resolve_corner(&mut self, role: CornerRole) -> i64 {
        match role {
            CornerRole::Start => {
                self.player.add_score(START_BONUS);
                START_BONUS as i64
            }
            CornerRole::Bonus => {
                let bonus = dice::bonus_payout(&mut self.rng);
                self.player.add_score(bonus);
                bonus as i64
            }
            CornerRole::Risk => {
                let penalty = dice::risk_penalty(&mut self.rng);
                -(self.player.deduct_score(penalty) as i64)
            }
            CornerRole::Break => 0,
        }
    }

    /// Open a two-choice event. Only between turns.
    pub fn trigger_event(&mut self, context: impl Into<String>) -> Result<ChallengeRequest, GameError> {
        self.require(Phase::AwaitingRoll)?;
        let request = ChallengeRequest::Event {
            context: context.into(),
        };
        self.pending = Some(request.clone());
        self.phase = Phase::AwaitingAnswer;
        Ok(request)
    }

    // ------------------------------------------------------------------
    // Challenges
    // ------------------------------------------------------------------

    /// Open the challenge for the pending request with generated content.
    pub fn present(&mut self, content: GeneratedContent) -> Result<GameEvent, GameError> {
        self.require(Phase::AwaitingAnswer)?;
        let Some(request) = self.pending.take() else {
            return Err(GameError::NoActiveChallenge);
        };

        let challenge = match (request, content) {
            (ChallengeRequest::Question { tile_index, .. }, GeneratedContent::Question(question)) => {
                Challenge::Question(QuestionChallenge::new(tile_index, question))
            }
            (ChallengeRequest::Event { context }, GeneratedContent::Event(event)) => {
                Challenge::Event(EventChallenge { context, event })
            }
            (ChallengeRequest::Boss, GeneratedContent::Boss(boss)) => Challenge::Boss(boss),
            (request, content) => {
                let error = GameError::UnexpectedContent {
                    expected: request.kind(),
                    got: content.kind(),
                };
                self.pending = Some(request);
                return Err(error);
            }
        };

        let kind = challenge.kind();
        self.challenge = Some(challenge);
        Ok(GameEvent::ChallengeOpened { kind })
    }

    pub fn present_question(&mut self, question: Question) -> Result<GameEvent, GameError> {
        self.present(GeneratedContent::Question(question))
    }

    pub fn present_event(&mut self, event: Event) -> Result<GameEvent, GameError> {
        self.present(GeneratedContent::Event(event))
    }

    pub fn present_boss(&mut self, boss: BossEncounter) -> Result<GameEvent, GameError> {
        self.present(GeneratedContent::Boss(boss))
    }

    /// Buy a lifeline for the open question.
    pub fn use_lifeline(&mut self, lifeline: Lifeline) -> Result<GameEvent, GameError> {
        self.require(Phase::AwaitingAnswer)?;
        let challenge = match self.challenge.as_mut() {
            Some(Challenge::Question(challenge)) => challenge,
            Some(_) => return Err(GameError::LifelineUnavailable),
            None => return Err(GameError::NoActiveChallenge),
        };
        if challenge.is_used(lifeline) {
            return Err(GameError::LifelineUsed(lifeline));
        }

        let cost = lifeline.cost(self.player.level);
        if !self.player.try_spend(cost) {
            return Err(GameError::InsufficientFunds {
                cost,
                available: self.player.score,
            });
        }

        let event = match lifeline {
            Lifeline::Hint => {
                let text = challenge
                    .question
                    .hint
                    .clone()
                    .unwrap_or_else(|| NO_HINT_TEXT.to_string());
                challenge.revealed_hint = Some(text.clone());
                GameEvent::HintRevealed { text, cost }
            }
            Lifeline::FiftyFifty => {
                let correct = challenge.question.correct_index;
                let wrong: Vec<usize> = (0..challenge.question.options.len())
                    .filter(|i| *i != correct && !challenge.eliminated.contains(i))
                    .collect();
                let indices = dice::pick_distinct(&mut self.rng, &wrong, FIFTY_FIFTY_REMOVES);
                challenge.eliminated.extend(&indices);
                challenge.fifty_fifty_used = true;
                GameEvent::OptionsEliminated { indices, cost }
            }
        };
        tracing::debug!(%lifeline, cost, "Lifeline used");
        Ok(event)
    }

    /// Answer the open challenge with the option at `index`.
    pub fn answer(&mut self, index: usize) -> Result<Vec<GameEvent>, GameError> {
        self.require(Phase::AwaitingAnswer)?;
        let Some(challenge) = self.challenge.take() else {
            return Err(GameError::NoActiveChallenge);
        };

        let eliminated = match &challenge {
            Challenge::Question(q) => q.eliminated.contains(&index),
            _ => false,
        };
        if index >= challenge.option_count() || eliminated {
            self.challenge = Some(challenge);
            return Err(GameError::InvalidOption(index));
        }

        let events = match &challenge {
            Challenge::Question(q) => self.resolve_question(q.tile_index, &q.question, index),
            Challenge::Boss(boss) => self.resolve_boss(boss, index),
            Challenge::Event(e) => self.resolve_event(&e.event, index),
        };
        self.challenge = Some(challenge);
        self.phase = Phase::Resolving;
        Ok(events)
    }

    fn resolve_question(&mut self, tile_index: usize, question: &Question, index: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if index == question.correct_index {
            self.player.streak += 1;
            let reward = streak_reward(question.reward, self.player.streak);
            self.player.add_score(reward);
            events.push(GameEvent::AnswerCorrect {
                reward,
                streak: self.player.streak,
            });

            let level_up = self.player.gain_xp(CORRECT_ANSWER_XP);
            if self.board.tile_mut(tile_index).master() {
                events.push(GameEvent::TileMastered { index: tile_index });
            }
            if let Some(level) = level_up {
                events.push(GameEvent::LevelUp { level });
            }
            tracing::info!(reward, streak = self.player.streak, score = self.player.score, "Correct answer");
        } else if self.player.inventory.shield > 0 {
            self.player.inventory.shield -= 1;
            events.push(GameEvent::ShieldAbsorbed {
                correct_index: question.correct_index,
                shields_left: self.player.inventory.shield,
            });
            tracing::info!(shields_left = self.player.inventory.shield, "Shield absorbed wrong answer");
        } else {
            self.player.streak = 0;
            let penalty = self.player.deduct_score(WRONG_ANSWER_PENALTY);
            events.push(GameEvent::AnswerIncorrect {
                correct_index: question.correct_index,
                penalty,
            });
            tracing::info!(penalty, score = self.player.score, "Wrong answer");
        }

        events
    }

    fn resolve_boss(&mut self, boss: &BossEncounter, index: usize) -> Vec<GameEvent> {
        if index != boss.correct_index {
            tracing::info!("Boss encounter failed");
            return vec![GameEvent::BossFailed {
                correct_index: boss.correct_index,
            }];
        }

        self.player.inventory.master_key += 1;
        self.player.add_score(BOSS_SCORE_REWARD);
        let mut events = vec![GameEvent::BossDefeated {
            xp: BOSS_XP_REWARD,
            score: BOSS_SCORE_REWARD,
        }];
        if let Some(level) = self.player.gain_xp(BOSS_XP_REWARD) {
            events.push(GameEvent::LevelUp { level });
        }
        tracing::info!(master_keys = self.player.inventory.master_key, "Boss defeated");
        events
    }

    fn resolve_event(&mut self, event: &Event, index: usize) -> Vec<GameEvent> {
        let risk = event.options[index].risk;
        let (success, delta) = match risk {
            EventRisk::Safe => {
                self.player.add_score(SAFE_EVENT_REWARD);
                (true, SAFE_EVENT_REWARD as i64)
            }
            EventRisk::Risky if dice::risky_choice_succeeds(&mut self.rng) => {
                self.player.add_score(RISKY_EVENT_REWARD);
                (true, RISKY_EVENT_REWARD as i64)
            }
            EventRisk::Risky => (false, -(self.player.deduct_score(RISKY_EVENT_PENALTY) as i64)),
        };
        tracing::info!(?risk, success, delta, "Event resolved");
        vec![GameEvent::EventResolved {
            risk,
            success,
            delta,
        }]
    }

    /// Close the resolved challenge and start the next turn.
    pub fn acknowledge(&mut self) -> Result<(), GameError> {
        self.require(Phase::Resolving)?;
        self.challenge = None;
        self.phase = Phase::AwaitingRoll;
        Ok(())
    }

    /// Drop the open challenge without applying any score change.
    pub fn abort_challenge(&mut self) -> Result<GameEvent, GameError> {
        match self.phase {
            Phase::AwaitingAnswer | Phase::Resolving => {
                self.challenge = None;
                self.pending = None;
                self.phase = Phase::AwaitingRoll;
                tracing::warn!("Challenge aborted");
                Ok(GameEvent::ChallengeAborted)
            }
            other => Err(GameError::InvalidPhase(other)),
        }
    }

    // ------------------------------------------------------------------
    // Shop
    // ------------------------------------------------------------------

    /// Buy an item. Not available while a challenge is open.
    pub fn buy(&mut self, item: ShopItem) -> Result<GameEvent, GameError> {
        if matches!(
            self.phase,
            Phase::Setup | Phase::AwaitingAnswer | Phase::Resolving
        ) {
            return Err(GameError::InvalidPhase(self.phase));
        }

        let cost = item.cost();
        if !self.player.try_spend(cost) {
            return Err(GameError::InsufficientFunds {
                cost,
                available: self.player.score,
            });
        }

        match item {
            ShopItem::Shield => self.player.inventory.shield += 1,
            ShopItem::XpBoost => {
                self.player.inventory.xp_boost += 1;
                self.player.arm_xp_boost();
            }
        }
        tracing::info!(?item, cost, score = self.player.score, "Item purchased");
        Ok(GameEvent::ItemPurchased { item, cost })
    }
}
