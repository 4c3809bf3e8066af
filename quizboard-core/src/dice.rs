//! Random draws used by the turn rules.

use rand::Rng;
use std::ops::Range;

/// Faces on the movement die.
pub const DIE_SIDES: u8 = 6;

/// BONUS corner payout range.
pub const BONUS_RANGE: Range<u64> = 100..400;

/// RISK corner penalty range.
pub const RISK_RANGE: Range<u64> = 50..250;

/// Chance a risky event choice pays off.
pub const RISKY_SUCCESS_CHANCE: f64 = 0.6;

/// Roll the movement die: uniform in `1..=6`.
pub fn roll_die<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=DIE_SIDES)
}

pub fn bonus_payout<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(BONUS_RANGE)
}

pub fn risk_penalty<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(RISK_RANGE)
}

pub fn risky_choice_succeeds<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.gen_bool(RISKY_SUCCESS_CHANCE)
}

/// Pick `count` distinct indices from `candidates`, uniformly.
pub fn pick_distinct<R: Rng + ?Sized>(rng: &mut R, candidates: &[usize], count: usize) -> Vec<usize> {
    rand::seq::index::sample(rng, candidates.len(), count.min(candidates.len()))
        .into_iter()
        .map(|i| candidates[i])
        .collect()
}
