//! Economy ledger: the only writer of the player's money.
//!
//! Every debit checks affordability before touching anything else, so a
//! rejected purchase or newspaper leaves the whole state untouched.

use crate::{
    config::{CatalogItem, GameConfig, PurchaseKind},
    error::{GameError, GameResult},
    state::GameState,
    types::ItemKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A borrowed view over the money balance.
pub struct EconomyLedger<'a> {
    money: &'a mut u64,
}

impl<'a> EconomyLedger<'a> {
    pub fn new(money: &'a mut u64) -> Self {
        Self { money }
    }

    pub fn balance(&self) -> u64 {
        *self.money
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        cost <= *self.money
    }

    /// Debit exactly `cost`. Fails without mutation when it exceeds the
    /// balance. Returns the new balance.
    pub fn charge(&mut self, cost: u64) -> GameResult<u64> {
        if !self.can_afford(cost) {
            return Err(GameError::InsufficientFunds { cost, money: *self.money });
        }
        *self.money -= cost;
        Ok(*self.money)
    }

    /// Credit `amount`. Returns the new balance.
    pub fn pay(&mut self, amount: u64) -> u64 {
        *self.money = self.money.saturating_add(amount);
        *self.money
    }

    /// Buy `key` into `owned`. Already-owned keys are rejected before the
    /// balance is checked; nothing changes on any failure.
    pub fn purchase(
        &mut self,
        key:   &str,
        cost:  u64,
        owned: &mut BTreeSet<ItemKey>,
    ) -> GameResult<()> {
        if owned.contains(key) {
            return Err(GameError::AlreadyOwned { key: key.to_string() });
        }
        self.charge(cost)?;
        owned.insert(key.to_string());
        Ok(())
    }
}

/// One row of the shop screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopEntry {
    pub kind:        PurchaseKind,
    pub key:         ItemKey,
    pub name:        String,
    pub cost:        u64,
    pub description: String,
    pub owned:       bool,
    pub affordable:  bool,
}

impl ShopEntry {
    /// Clickable in the shop: not owned and affordable.
    pub fn purchasable(&self) -> bool {
        !self.owned && self.affordable
    }
}

/// General store items first, then the gene booth, each in key order.
pub fn shop_listing(config: &GameConfig, state: &GameState) -> Vec<ShopEntry> {
    let entry = |kind: PurchaseKind, key: &String, item: &CatalogItem| ShopEntry {
        kind,
        key:         key.clone(),
        name:        item.name.clone(),
        cost:        item.cost,
        description: item.description.clone(),
        owned:       state.owns(kind, key),
        affordable:  item.cost <= state.money(),
    };

    config
        .shop_items
        .iter()
        .map(|(k, i)| entry(PurchaseKind::Item, k, i))
        .chain(
            config
                .gene_modifications
                .iter()
                .map(|(k, i)| entry(PurchaseKind::Gene, k, i)),
        )
        .collect()
}
