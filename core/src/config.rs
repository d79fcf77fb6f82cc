//! Content catalog and tuning.
//!
//! Everything here is read-only once the engine is built. The catalog is
//! normally loaded from `data/catalog.json`; `GameConfig::default()` carries
//! the same values for tests and for running without a data directory.

use crate::{
    error::{GameError, GameResult},
    task::TaskKind,
    types::Millis,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyConfig {
    /// Energy (and max energy) of a first-generation character.
    pub starting_energy: f64,
    /// Energy lost per drain interval while working.
    pub drain_rate: f64,
    /// Catalog energy ceiling. Only checked against `starting_energy`;
    /// inherited energy is not limited by it.
    pub max_energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    pub starting_money: u64,
    /// Reference salary for day one. Jobs carry their own salary; this is
    /// kept for catalog tooling only.
    #[serde(default)]
    pub day_1_salary: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub title:   String,
    pub company: String,
    pub salary:  u64,
    pub hours:   u32,
    /// Task-type identifiers, in catalog order.
    pub tasks:   Vec<String>,
}

impl Job {
    /// Task kinds from this job that have an implementation.
    /// Unknown identifiers (e.g. "typing") are skipped.
    pub fn playable_tasks(&self) -> Vec<TaskKind> {
        self.tasks
            .iter()
            .filter_map(|id| TaskKind::from_id(id))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewspaperConfig {
    pub name: String,
    pub cost: u64,
    #[serde(default)]
    pub locked_message: Option<String>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl NewspaperConfig {
    /// Only the first listed job is ever offered.
    pub fn featured_job(&self) -> Option<&Job> {
        self.jobs.first()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    /// Pen refill tasks start with one pen already placed.
    PenTaskBonus,
    /// Children start with `bonus` extra energy.
    ChildEnergyBonus,
    #[serde(other)]
    Unknown,
}

/// A shop item or a gene modification. Both share one shape; only gene
/// modifications set `permanent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub name:        String,
    pub cost:        u64,
    #[serde(default)]
    pub description: String,
    pub effect:      ItemEffect,
    #[serde(default)]
    pub bonus:       Option<u32>,
    #[serde(default)]
    pub permanent:   bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DayConfig {
    pub hours:      u32,
    /// Carried through to every task's work surface; no mechanic reads it yet.
    pub difficulty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaplingConfig {
    pub required_clicks: u32,
    /// Track units moved per movement tick.
    pub stapler_speed: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_track_min")]
    pub track_min: f64,
    #[serde(default = "default_track_max")]
    pub track_max: f64,
    #[serde(default = "default_start_position")]
    pub start_position: f64,
    /// Centre of the paper stack the stapler has to line up with.
    #[serde(default = "default_target_position")]
    pub target_position: f64,
    #[serde(default = "default_movement_tick_ms")]
    pub tick_interval_ms: Millis,
    #[serde(default = "default_stapling_delay_ms")]
    pub completion_delay_ms: Millis,
    #[serde(default)]
    pub base_energy_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenRefillConfig {
    pub required_pens:   u32,
    pub holders_count:   u32,
    pub pens_per_holder: u32,
    /// Pens available in the supply box.
    #[serde(default = "default_pen_supply")]
    pub pen_supply: u32,
    #[serde(default = "default_combo_window_ms")]
    pub combo_window_ms: Millis,
    #[serde(default = "default_pen_delay_ms")]
    pub completion_delay_ms: Millis,
    #[serde(default)]
    pub base_energy_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinigamesConfig {
    pub stapling:   StaplingConfig,
    pub pen_refill: PenRefillConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    pub drain_interval_ms:  Millis,
    pub next_task_pause_ms: Millis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            drain_interval_ms:  1_000,
            next_task_pause_ms: 1_000,
        }
    }
}

fn default_tolerance() -> f64 { 40.0 }
fn default_track_min() -> f64 { 20.0 }
fn default_track_max() -> f64 { 320.0 }
fn default_start_position() -> f64 { 50.0 }
fn default_target_position() -> f64 { 170.0 }
fn default_movement_tick_ms() -> Millis { 16 }
fn default_stapling_delay_ms() -> Millis { 1_000 }
fn default_pen_supply() -> u32 { 15 }
fn default_combo_window_ms() -> Millis { 2_000 }
fn default_pen_delay_ms() -> Millis { 2_000 }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub energy:             EnergyConfig,
    pub economy:            EconomyConfig,
    pub newspapers:         BTreeMap<String, NewspaperConfig>,
    #[serde(default)]
    pub shop_items:         BTreeMap<String, CatalogItem>,
    #[serde(default)]
    pub gene_modifications: BTreeMap<String, CatalogItem>,
    #[serde(default)]
    pub day_progression:    BTreeMap<String, DayConfig>,
    pub minigames:          MinigamesConfig,
    #[serde(default)]
    pub timing:             TimingConfig,
}

impl GameConfig {
    /// Load from the data/ directory.
    /// In tests, use GameConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/catalog.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GameConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the work-day shape for `day`, falling back to the job's own
    /// hours at difficulty 1.0 when the catalog has no `day_N` entry.
    pub fn day_config(&self, day: u32, job: &Job) -> DayConfig {
        self.day_progression
            .get(&format!("day_{day}"))
            .copied()
            .unwrap_or(DayConfig { hours: job.hours, difficulty: 1.0 })
    }

    /// Look up a shop item or gene modification by key.
    pub fn catalog_item(&self, kind: PurchaseKind, key: &str) -> Option<&CatalogItem> {
        match kind {
            PurchaseKind::Item => self.shop_items.get(key),
            PurchaseKind::Gene => self.gene_modifications.get(key),
        }
    }

    /// Reject catalogs that would break state invariants at runtime.
    pub fn validate(&self) -> GameResult<()> {
        let invalid = |msg: String| Err(GameError::InvalidCatalog(msg));

        if self.energy.starting_energy <= 0.0 {
            return invalid("energy.starting_energy must be positive".into());
        }
        if self.energy.drain_rate < 0.0 {
            return invalid("energy.drain_rate must not be negative".into());
        }
        if self.energy.max_energy < self.energy.starting_energy {
            return invalid("energy.max_energy is below starting_energy".into());
        }

        for (key, paper) in &self.newspapers {
            for job in &paper.jobs {
                if job.hours == 0 {
                    return invalid(format!("job '{}' in '{key}' has zero hours", job.title));
                }
                if job.playable_tasks().is_empty() {
                    return invalid(format!(
                        "job '{}' in '{key}' has no playable tasks ({:?})",
                        job.title, job.tasks
                    ));
                }
            }
        }

        for key in self.day_progression.keys() {
            let valid = key
                .strip_prefix("day_")
                .and_then(|n| n.parse::<u32>().ok())
                .is_some_and(|n| n >= 1);
            if !valid {
                return invalid(format!("day_progression key '{key}' is not day_N"));
            }
        }

        let s = &self.minigames.stapling;
        if s.required_clicks == 0 {
            return invalid("stapling.required_clicks must be positive".into());
        }
        if s.track_min >= s.track_max || s.stapler_speed <= 0.0 || s.tick_interval_ms == 0 {
            return invalid("stapling track or movement settings are degenerate".into());
        }
        if !(s.track_min..=s.track_max).contains(&s.start_position) {
            return invalid(format!(
                "stapling.start_position {} is outside the track {}..={}",
                s.start_position, s.track_min, s.track_max
            ));
        }
        if s.target_position + s.tolerance < s.track_min
            || s.target_position - s.tolerance > s.track_max
        {
            return invalid("stapling target can never be hit".into());
        }

        let p = &self.minigames.pen_refill;
        if p.required_pens == 0 || p.holders_count == 0 || p.pens_per_holder == 0 {
            return invalid("pen_refill counts must be positive".into());
        }
        if p.required_pens > p.holders_count * p.pens_per_holder {
            return invalid("pen_refill.required_pens exceeds total holder capacity".into());
        }
        if p.pen_supply < p.required_pens {
            return invalid("pen_refill.pen_supply cannot cover required_pens".into());
        }

        if self.timing.drain_interval_ms == 0 {
            return invalid("timing.drain_interval_ms must be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    Item,
    Gene,
}

impl Default for GameConfig {
    fn default() -> Self {
        let tabloid = NewspaperConfig {
            name: "Daily Gossip Rag".into(),
            cost: 0,
            locked_message: None,
            jobs: vec![Job {
                title:   "Temp Office Worker".into(),
                company: "Yamada Logistics".into(),
                salary:  100,
                hours:   2,
                tasks:   vec!["stapling".into(), "pen_refill".into()],
            }],
        };
        let business = NewspaperConfig {
            name: "Business Weekly".into(),
            cost: 200,
            locked_message: Some("Better jobs inside! (Need ¥200)".into()),
            jobs: vec![Job {
                title:   "Junior Analyst".into(),
                company: "Sakura Corp".into(),
                salary:  200,
                hours:   3,
                tasks:   vec!["stapling".into(), "pen_refill".into(), "typing".into()],
            }],
        };

        let pocket_protector = CatalogItem {
            name:        "Pocket Protector".into(),
            cost:        25,
            description: "Start pen tasks with 1 pen pre-filled".into(),
            effect:      ItemEffect::PenTaskBonus,
            bonus:       None,
            permanent:   false,
        };
        let basic_stamina = CatalogItem {
            name:        "Enhanced Stamina Genes".into(),
            cost:        75,
            description: "Your children will have +1 Energy".into(),
            effect:      ItemEffect::ChildEnergyBonus,
            bonus:       Some(1),
            permanent:   true,
        };

        Self {
            energy: EnergyConfig {
                starting_energy: 3.0,
                drain_rate:      0.1,
                max_energy:      10.0,
            },
            economy: EconomyConfig {
                starting_money: 0,
                day_1_salary:   100,
            },
            newspapers: [
                ("free_tabloid".into(), tabloid),
                ("business_times".into(), business),
            ].into(),
            shop_items: [("pocket_protector".into(), pocket_protector)].into(),
            gene_modifications: [("basic_stamina".into(), basic_stamina)].into(),
            day_progression: [
                ("day_1".into(), DayConfig { hours: 2, difficulty: 1.0 }),
                ("day_2".into(), DayConfig { hours: 5, difficulty: 1.2 }),
                ("day_3".into(), DayConfig { hours: 7, difficulty: 1.5 }),
            ].into(),
            minigames: MinigamesConfig {
                stapling: StaplingConfig {
                    required_clicks:     15,
                    stapler_speed:       1.5,
                    tolerance:           default_tolerance(),
                    track_min:           default_track_min(),
                    track_max:           default_track_max(),
                    start_position:      default_start_position(),
                    target_position:     default_target_position(),
                    tick_interval_ms:    default_movement_tick_ms(),
                    completion_delay_ms: default_stapling_delay_ms(),
                    base_energy_cost:    1,
                },
                pen_refill: PenRefillConfig {
                    required_pens:       12,
                    holders_count:       4,
                    pens_per_holder:     3,
                    pen_supply:          default_pen_supply(),
                    combo_window_ms:     default_combo_window_ms(),
                    completion_delay_ms: default_pen_delay_ms(),
                    base_energy_cost:    2,
                },
            },
            timing: TimingConfig::default(),
        }
    }
}
