//! The authoritative game record.
//!
//! GameState is owned by the engine and lent out through narrow views.
//! Fields are private; each field has exactly one writer:
//!
//!   screen, day                      → engine (flow controller)
//!   money                            → EconomyLedger
//!   energy                           → EnergyMeter (work-day drain)
//!   current_job, current_hour        → engine on selection, work day per hour
//!   items, gene_modifications        → EconomyLedger purchases
//!   generation, max_energy + resets  → GenerationManager
//!
//! Everyone else reads through the getters.

use crate::{
    config::{GameConfig, Job, PurchaseKind},
    economy::EconomyLedger,
    error::GameResult,
    types::ItemKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Energy at or below this is treated as fully depleted, absorbing float
/// drift from repeated fractional drains.
pub const ENERGY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Newspaper,
    Work,
    Shop,
    Death,
    Rebirth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    screen:             Screen,
    generation:         u32,
    energy:             f64,
    max_energy:         f64,
    money:              u64,
    day:                u32,
    current_job:        Option<Job>,
    current_hour:       u32,
    items:              BTreeSet<ItemKey>,
    gene_modifications: BTreeSet<ItemKey>,
}

impl GameState {
    /// Fresh first-generation state from the catalog defaults.
    pub fn initial(config: &GameConfig) -> Self {
        Self {
            screen:             Screen::Newspaper,
            generation:         1,
            energy:             config.energy.starting_energy,
            max_energy:         config.energy.starting_energy,
            money:              config.economy.starting_money,
            day:                1,
            current_job:        None,
            current_hour:       0,
            items:              BTreeSet::new(),
            gene_modifications: BTreeSet::new(),
        }
    }

    // ── Read access ────────────────────────────────────────────

    pub fn screen(&self) -> Screen { self.screen }
    pub fn generation(&self) -> u32 { self.generation }
    pub fn energy(&self) -> f64 { self.energy }
    pub fn max_energy(&self) -> f64 { self.max_energy }
    pub fn money(&self) -> u64 { self.money }
    pub fn day(&self) -> u32 { self.day }
    pub fn current_job(&self) -> Option<&Job> { self.current_job.as_ref() }
    pub fn current_hour(&self) -> u32 { self.current_hour }
    pub fn items(&self) -> &BTreeSet<ItemKey> { &self.items }
    pub fn gene_modifications(&self) -> &BTreeSet<ItemKey> { &self.gene_modifications }

    pub fn owns(&self, kind: PurchaseKind, key: &str) -> bool {
        match kind {
            PurchaseKind::Item => self.items.contains(key),
            PurchaseKind::Gene => self.gene_modifications.contains(key),
        }
    }

    /// Whole energy segments left, rounded up, for energy-bar style displays.
    pub fn energy_segments(&self) -> u32 {
        self.energy.max(0.0).ceil() as u32
    }

    // ── Component views ────────────────────────────────────────

    pub(crate) fn ledger(&mut self) -> EconomyLedger<'_> {
        EconomyLedger::new(&mut self.money)
    }

    pub(crate) fn energy_meter(&mut self) -> EnergyMeter<'_> {
        EnergyMeter { energy: &mut self.energy }
    }

    /// Ledger purchase into the owned set for `kind`.
    pub(crate) fn purchase(&mut self, kind: PurchaseKind, key: &str, cost: u64) -> GameResult<()> {
        let owned = match kind {
            PurchaseKind::Item => &mut self.items,
            PurchaseKind::Gene => &mut self.gene_modifications,
        };
        EconomyLedger::new(&mut self.money).purchase(key, cost, owned)
    }

    // ── Flow-controller writes ─────────────────────────────────

    pub(crate) fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub(crate) fn begin_shift(&mut self, job: Job) {
        self.current_job = Some(job);
        self.current_hour = 0;
    }

    /// Next day. The last job stays on record; the hour counter does not.
    pub(crate) fn advance_day(&mut self) {
        self.day += 1;
        self.current_hour = 0;
    }

    // ── Work-day writes ────────────────────────────────────────

    /// Start the next hour. Returns the new hour number (1-based).
    pub(crate) fn clock_in_hour(&mut self) -> u32 {
        self.current_hour += 1;
        self.current_hour
    }

    // ── Generation writes ──────────────────────────────────────

    pub(crate) fn reset_for_generation(&mut self, starting_energy: f64, starting_money: u64) {
        self.generation += 1;
        self.energy = starting_energy;
        self.max_energy = starting_energy;
        self.money = starting_money;
        self.day = 1;
        self.current_job = None;
        self.current_hour = 0;
        self.items.clear();
        // gene_modifications persist
    }

    /// Restore invariants after loading a snapshot. Returns a description of
    /// every correction made.
    pub(crate) fn normalize(&mut self, config: &GameConfig) -> Vec<String> {
        let mut fixes = Vec::new();

        if self.generation == 0 {
            self.generation = 1;
            fixes.push("generation raised to 1".to_string());
        }
        if self.day == 0 {
            self.day = 1;
            fixes.push("day raised to 1".to_string());
        }
        if !(self.max_energy.is_finite() && self.max_energy > 0.0) {
            self.max_energy = config.energy.starting_energy;
            fixes.push(format!("max_energy reset to {}", self.max_energy));
        }
        if !self.energy.is_finite() || self.energy < 0.0 {
            self.energy = 0.0;
            fixes.push("energy clamped to 0".to_string());
        }
        if self.energy > self.max_energy {
            self.energy = self.max_energy;
            fixes.push(format!("energy clamped to max_energy {}", self.max_energy));
        }

        let unknown_items: Vec<_> = self
            .items
            .iter()
            .filter(|k| !config.shop_items.contains_key(*k))
            .cloned()
            .collect();
        for key in unknown_items {
            self.items.remove(&key);
            fixes.push(format!("dropped unknown item '{key}'"));
        }

        // A snapshot is only ever written between work days, so a restored
        // game always resumes on the newspaper screen with no hour running.
        if self.screen != Screen::Newspaper {
            fixes.push(format!("screen {:?} resumed as Newspaper", self.screen));
            self.screen = Screen::Newspaper;
        }
        if self.current_hour != 0 {
            self.current_hour = 0;
            fixes.push("current_hour reset to 0".to_string());
        }
        fixes
    }
}

/// The work day's view over energy.
pub struct EnergyMeter<'a> {
    energy: &'a mut f64,
}

impl EnergyMeter<'_> {
    /// Subtract `amount`, clamping at zero. Returns the remaining energy.
    pub fn drain(&mut self, amount: f64) -> f64 {
        let next = *self.energy - amount;
        *self.energy = if next <= ENERGY_EPSILON { 0.0 } else { next };
        *self.energy
    }

    pub fn is_depleted(&self) -> bool {
        *self.energy <= ENERGY_EPSILON
    }
}
