//! Deterministic random number generation.
//!
//! RULE: Nothing in the core may call any platform RNG.
//! All randomness flows through a `RandomSource`. The production source is a
//! `GameRng` derived from the single master seed; tests may inject a
//! scripted source to pin exact task sequences.
//!
//! Each slot gets its own RNG stream, seeded from
//! (master_seed XOR slot_index * golden ratio constant), so adding a slot
//! never changes existing streams.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// The narrow randomness interface the simulation consumes.
pub trait RandomSource {
    /// Draw a u64 in [0, n). `n` must be > 0.
    fn next_below(&mut self, n: u64) -> u64;
}

/// Pick uniformly through a trait object.
pub fn pick_from<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let idx = rng.next_below(items.len() as u64) as usize;
    items.get(idx)
}

/// A named, deterministic RNG for a single slot.
pub struct GameRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl GameRng {
    /// Create an RNG from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RandomSource for GameRng {
    fn next_below(&mut self, n: u64) -> u64 {
        use rand::Rng;
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }
}

/// Derives per-slot RNGs from one master seed.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_slot(&self, slot: RngSlot) -> GameRng {
        GameRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngSlot {
    TaskSelection = 0,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskSelection => "task_selection",
        }
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
/// Each draw is reduced modulo `n`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<u64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(draws: Vec<u64>) -> Self {
        assert!(!draws.is_empty(), "scripted random needs at least one draw");
        Self { draws, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value % n
    }
}
