//! Seeded random streams and the dice seam used during resolution.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;
use std::collections::VecDeque;

use crate::mission::ValueRange;

/// Source of die rolls and repair penalties for round resolution.
pub trait DiceSource {
    /// Roll a die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;

    /// Roll a repair penalty from `range`.
    fn roll_repair(&mut self, range: ValueRange) -> u32;
}

/// Independent per-concern streams derived from one match seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    missions: CountingRng<SmallRng>,
    dice: CountingRng<SmallRng>,
    repairs: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            missions: CountingRng::new(derive_stream_seed(seed, b"missions")),
            dice: CountingRng::new(derive_stream_seed(seed, b"dice")),
            repairs: CountingRng::new(derive_stream_seed(seed, b"repairs")),
        }
    }

    /// Access the mission generation stream.
    pub fn missions(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.missions
    }

    /// Draw counts per stream as `(missions, dice, repairs)`.
    #[must_use]
    pub const fn draws(&self) -> (u64, u64, u64) {
        (self.missions.draws(), self.dice.draws(), self.repairs.draws())
    }
}

impl DiceSource for RngBundle {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.dice.gen_range(1..=sides.max(1))
    }

    fn roll_repair(&mut self, range: ValueRange) -> u32 {
        range.sample(&mut self.repairs)
    }
}

/// RNG wrapper that counts draw calls.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// HMAC-SHA256 of `domain_tag` keyed by the user seed, truncated to 64 bits.
fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Replays a fixed sequence of die rolls and repair penalties.
///
/// Rolls are clamped to the die's faces. When a queue runs dry the die
/// shows 1 and repairs charge the range minimum.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    repairs: VecDeque<u32>,
}

impl ScriptedDice {
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            repairs: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn with_repairs(mut self, repairs: impl IntoIterator<Item = u32>) -> Self {
        self.repairs = repairs.into_iter().collect();
        self
    }

    /// Rolls not yet consumed.
    #[must_use]
    pub fn remaining_rolls(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rolls.pop_front().unwrap_or(1).clamp(1, sides.max(1))
    }

    fn roll_repair(&mut self, range: ValueRange) -> u32 {
        self.repairs.pop_front().unwrap_or(range.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_reproducible_per_seed() {
        let mut first = RngBundle::from_user_seed(42);
        let mut second = RngBundle::from_user_seed(42);
        let rolls_a: Vec<u32> = (0..16).map(|_| first.roll_die(6)).collect();
        let rolls_b: Vec<u32> = (0..16).map(|_| second.roll_die(6)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|roll| (1..=6).contains(roll)));
    }

    #[test]
    fn streams_are_domain_separated() {
        assert_ne!(
            derive_stream_seed(42, b"missions"),
            derive_stream_seed(42, b"dice")
        );
    }

    #[test]
    fn draws_are_counted_per_stream() {
        let mut bundle = RngBundle::from_user_seed(9);
        let _ = bundle.roll_die(6);
        let _ = bundle.roll_die(6);
        let _: u32 = bundle.missions().gen_range(0..10);
        let (missions, dice, repairs) = bundle.draws();
        assert!(missions >= 1);
        assert!(dice >= 2);
        assert_eq!(repairs, 0);
    }

    #[test]
    fn scripted_dice_replays_and_clamps() {
        let mut dice = ScriptedDice::new([6, 9]).with_repairs([17]);
        assert_eq!(dice.roll_die(6), 6);
        assert_eq!(dice.roll_die(6), 6);
        assert_eq!(dice.roll_die(6), 1);
        assert_eq!(dice.roll_repair(ValueRange::new(10, 25)), 17);
        assert_eq!(dice.roll_repair(ValueRange::new(10, 25)), 10);
        assert_eq!(dice.remaining_rolls(), 0);
    }
}
