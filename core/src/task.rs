//! Minigame task contract.
//!
//! RULE: Every work-hour minigame implements MinigameTask.
//! The work day owns the active task, forwards its timers and the player's
//! logical inputs to it, and collects its result.
//!
//! Lifecycle: constructed → start() → (inputs, timers) → Complete →
//! result emitted once, after a fixed delay. destroy() may be called at any
//! point, any number of times; afterwards the task owns no timers and will
//! never emit.
//!
//! Tasks only see a read-only WorkSurface. They never touch GameState.

use crate::{
    clock::{Scheduler, TimerId},
    config::{DayConfig, GameConfig, ItemEffect, MinigamesConfig},
    pen_refill_task::PenRefillTask,
    stapling_task::StaplingTask,
    state::GameState,
    types::ItemKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Stapling,
    PenRefill,
}

impl TaskKind {
    /// Map a catalog task identifier to an implemented kind.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "stapling"   => Some(Self::Stapling),
            "pen_refill" => Some(Self::PenRefill),
            _            => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Stapling  => "stapling",
            Self::PenRefill => "pen_refill",
        }
    }

    /// Player-facing description of the task.
    pub fn info(&self, config: &MinigamesConfig) -> TaskInfo {
        match self {
            Self::Stapling => TaskInfo {
                name:           "Staple Papers",
                description:    "Click to staple documents together",
                energy_cost:    config.stapling.base_energy_cost,
                estimated_time: "30-60 seconds",
            },
            Self::PenRefill => TaskInfo {
                name:           "Organize Pen Holders",
                description:    "Drag colorful pens to fill the organizer holders efficiently",
                energy_cost:    config.pen_refill.base_energy_cost,
                estimated_time: "45-90 seconds",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TaskInfo {
    pub name:           &'static str,
    pub description:    &'static str,
    pub energy_cost:    u32,
    pub estimated_time: &'static str,
}

/// The read-only slice of the world a task is allowed to see.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkSurface {
    /// 1-based hour of the work day this task fills.
    pub hour:           u32,
    pub difficulty:     f64,
    pub owned_items:    BTreeSet<ItemKey>,
    /// Owned item granting the pen-task head start, if any.
    pub pen_bonus_item: Option<ItemKey>,
}

impl WorkSurface {
    pub fn new(hour: u32, day: DayConfig, state: &GameState, config: &GameConfig) -> Self {
        let pen_bonus_item = state
            .items()
            .iter()
            .find(|key| {
                config
                    .shop_items
                    .get(*key)
                    .is_some_and(|item| item.effect == ItemEffect::PenTaskBonus)
            })
            .cloned();
        Self {
            hour,
            difficulty: day.difficulty,
            owned_items: state.items().clone(),
            pen_bonus_item,
        }
    }

    /// A bare surface with no owned items.
    pub fn plain(hour: u32) -> Self {
        Self {
            hour,
            difficulty: 1.0,
            owned_items: BTreeSet::new(),
            pen_bonus_item: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub base:        u32,
    pub time_bonus:  u32,
    pub combo_bonus: u32,
    pub total:       u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PenRefillStats {
    /// Combo standing when the last pen went in.
    pub max_combo:         u32,
    pub completed_holders: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinigameResult {
    pub task_type:       TaskKind,
    /// Seconds from start() to completion, excluding the emit delay.
    pub completion_time: f64,
    pub success:         bool,
    pub score:           Option<ScoreBreakdown>,
    /// Item whose bonus was applied to this task.
    pub bonus_item:      Option<ItemKey>,
    pub stats:           Option<PenRefillStats>,
}

impl MinigameResult {
    pub fn bonus_applied(&self) -> bool {
        self.bonus_item.is_some()
    }
}

/// Logical player inputs. Gesture capture happens outside the core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum TaskInput {
    ActivateTarget,
    PlacePen { holder: usize },
}

/// Transient answer to an input. Never an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InputOutcome {
    Hit { clicks_remaining: u32 },
    /// Outside tolerance: no progress, not a failure.
    Miss { distance: f64 },
    Placed {
        holder:           usize,
        pens_in_holder:   u32,
        pens_filled:      u32,
        combo:            u32,
        holder_completed: bool,
    },
    HolderFull { holder: usize },
    NoSuchHolder { holder: usize },
    SupplyEmpty,
    /// The task is not accepting input (not started, complete or destroyed).
    Inactive,
    /// The input belongs to a different task kind.
    WrongTask,
    /// There is no task running.
    NoTask,
}

impl InputOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Hit { .. } | Self::Placed { .. })
    }
}

/// Display-only view of a running task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskProgress {
    Stapling {
        clicks_remaining: u32,
        required_clicks:  u32,
        position:         f64,
        target_position:  f64,
        tolerance:        f64,
        status:           TaskStatus,
    },
    PenRefill {
        pens_filled:       u32,
        required_pens:     u32,
        holders:           Vec<u32>,
        pens_per_holder:   u32,
        combo:             u32,
        completed_holders: u32,
        supply_left:       u32,
        status:            TaskStatus,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Idle,
    Active,
    /// Finished; result waiting on the emit delay.
    Complete,
    Emitted,
    Destroyed,
}

/// One-shot completion guard.
///
/// `fire` hands the result out the first time only; after a cancel or a
/// previous fire it swallows the result.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    state: LatchState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum LatchState {
    #[default]
    Armed,
    Fired,
    Cancelled,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&mut self, result: MinigameResult) -> Option<MinigameResult> {
        match self.state {
            LatchState::Armed => {
                self.state = LatchState::Fired;
                Some(result)
            }
            LatchState::Fired => {
                log::warn!("{} task tried to complete twice; ignored", result.task_type.id());
                None
            }
            LatchState::Cancelled => None,
        }
    }

    pub fn cancel(&mut self) {
        if self.state == LatchState::Armed {
            self.state = LatchState::Cancelled;
        }
    }

    pub fn has_fired(&self) -> bool {
        self.state == LatchState::Fired
    }
}

/// The contract every minigame must fulfill.
pub trait MinigameTask {
    fn kind(&self) -> TaskKind;

    /// Begin: record the start time and arm any internal timers.
    /// Calling it again is a no-op.
    fn start(&mut self, scheduler: &mut Scheduler);

    /// True if `timer` belongs to this task.
    fn owns_timer(&self, timer: TimerId) -> bool;

    /// Called when one of this task's timers fires. Returns the completion
    /// result exactly once over the task's life.
    fn on_timer(&mut self, timer: TimerId, scheduler: &mut Scheduler) -> Option<MinigameResult>;

    fn handle_input(&mut self, input: TaskInput, scheduler: &mut Scheduler) -> InputOutcome;

    fn progress(&self) -> TaskProgress;

    fn status(&self) -> TaskStatus;

    /// Cancel every owned timer and suppress completion. Idempotent.
    fn destroy(&mut self, scheduler: &mut Scheduler);
}

/// Build the task for `kind`. The caller starts it.
pub fn spawn_task(
    kind:    TaskKind,
    surface: WorkSurface,
    config:  &MinigamesConfig,
) -> Box<dyn MinigameTask> {
    match kind {
        TaskKind::Stapling  => Box::new(StaplingTask::new(config.stapling.clone(), surface)),
        TaskKind::PenRefill => Box::new(PenRefillTask::new(config.pen_refill.clone(), surface)),
    }
}
