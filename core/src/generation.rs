//! Generation manager: cross-generation inheritance.
//!
//! Gene modifications are inert until a rebirth: this is the only place
//! their effects are turned into starting stats.

use crate::{
    config::{GameConfig, ItemEffect},
    state::GameState,
    types::ItemKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the next generation will start with. Shown on the rebirth screen
/// before anything is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RebirthPreview {
    pub next_generation: u32,
    pub base_energy:     f64,
    pub energy_bonus:    u32,
    pub starting_energy: f64,
    pub starting_money:  u64,
}

pub struct GenerationManager<'a> {
    config: &'a GameConfig,
}

impl<'a> GenerationManager<'a> {
    pub fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Sum of `bonus` over owned child-energy gene mods.
    /// Keys missing from the catalog are ignored.
    pub fn compute_energy_bonus(&self, gene_modifications: &BTreeSet<ItemKey>) -> u32 {
        gene_modifications
            .iter()
            .filter_map(|key| self.config.gene_modifications.get(key))
            .filter(|gene| gene.effect == ItemEffect::ChildEnergyBonus)
            .map(|gene| gene.bonus.unwrap_or(0))
            .sum()
    }

    pub fn preview(&self, state: &GameState) -> RebirthPreview {
        let base_energy = self.config.energy.starting_energy;
        let energy_bonus = self.compute_energy_bonus(state.gene_modifications());
        let starting_energy = base_energy + f64::from(energy_bonus);
        RebirthPreview {
            next_generation: state.generation() + 1,
            base_energy,
            energy_bonus,
            starting_energy,
            starting_money: self.config.economy.starting_money,
        }
    }

    /// Start the next generation in place. Items are lost; gene
    /// modifications carry over.
    pub fn rebirth(&self, state: &mut GameState) -> RebirthPreview {
        let preview = self.preview(state);
        state.reset_for_generation(preview.starting_energy, preview.starting_money);
        log::info!(
            "generation={} rebirth: energy={} (base {} + bonus {}) genes={:?}",
            state.generation(),
            preview.starting_energy,
            preview.base_energy,
            preview.energy_bonus,
            state.gene_modifications()
        );
        preview
    }
}
