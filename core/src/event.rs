//! Game events: the notification stream for the rendering layer.
//!
//! Every state change the player could care about is announced here, and
//! every event is appended to the store's event log. Events are facts about
//! what already happened; nothing reacts to them inside the core.

use crate::{
    config::PurchaseKind,
    generation::RebirthPreview,
    state::Screen,
    task::{InputOutcome, MinigameResult, TaskKind},
    types::{ItemKey, Millis, SessionId},
};
use serde::{Deserialize, Serialize};

/// Variants are appended over time; never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Session ────────────────────────────────────
    SessionStarted {
        session_id: SessionId,
        seed: u64,
    },
    StateRestored {
        generation: u32,
        day: u32,
        corrections: Vec<String>,
    },
    StateSaved {
        generation: u32,
        day: u32,
    },

    // ── Flow ───────────────────────────────────────
    ScreenChanged {
        from: Screen,
        to: Screen,
    },
    NewspaperSelected {
        newspaper: String,
        cost: u64,
        job_title: String,
        money: u64,
    },
    ItemPurchased {
        kind: PurchaseKind,
        key: ItemKey,
        cost: u64,
        money: u64,
    },
    DayAdvanced {
        day: u32,
    },
    RebirthPreviewed {
        preview: RebirthPreview,
    },
    GenerationStarted {
        generation: u32,
        starting_energy: f64,
        energy_bonus: u32,
    },

    // ── Work day ───────────────────────────────────
    WorkDayStarted {
        day: u32,
        hours: u32,
        difficulty: f64,
        job_title: String,
    },
    TaskStarted {
        hour: u32,
        task: TaskKind,
    },
    TaskCompleted {
        hour: u32,
        result: MinigameResult,
    },
    EnergyDrained {
        energy: f64,
    },
    DayCompleted {
        day: u32,
        salary: u64,
        money: u64,
        total_score: u32,
    },
    PlayerDied {
        generation: u32,
        day: u32,
        hour: u32,
    },

    // ── Task feedback ──────────────────────────────
    StapleHit {
        hour: u32,
        clicks_remaining: u32,
    },
    StapleMissed {
        hour: u32,
        distance: f64,
    },
    PenPlaced {
        hour: u32,
        holder: usize,
        pens_filled: u32,
        combo: u32,
    },
    HolderCompleted {
        hour: u32,
        holder: usize,
    },
    InputRejected {
        hour: u32,
        outcome: InputOutcome,
    },
}

impl GameEvent {
    /// Stable name for the event_type column of the event log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. }    => "session_started",
            Self::StateRestored { .. }     => "state_restored",
            Self::StateSaved { .. }        => "state_saved",
            Self::ScreenChanged { .. }     => "screen_changed",
            Self::NewspaperSelected { .. } => "newspaper_selected",
            Self::ItemPurchased { .. }     => "item_purchased",
            Self::DayAdvanced { .. }       => "day_advanced",
            Self::RebirthPreviewed { .. }  => "rebirth_previewed",
            Self::GenerationStarted { .. } => "generation_started",
            Self::WorkDayStarted { .. }    => "work_day_started",
            Self::TaskStarted { .. }       => "task_started",
            Self::TaskCompleted { .. }     => "task_completed",
            Self::EnergyDrained { .. }     => "energy_drained",
            Self::DayCompleted { .. }      => "day_completed",
            Self::PlayerDied { .. }        => "player_died",
            Self::StapleHit { .. }         => "staple_hit",
            Self::StapleMissed { .. }      => "staple_missed",
            Self::PenPlaced { .. }         => "pen_placed",
            Self::HolderCompleted { .. }   => "holder_completed",
            Self::InputRejected { .. }     => "input_rejected",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub generation: u32,
    pub day:        u32,
    pub at_ms:      Millis,
    pub event_type: String,
    pub payload:    String, // JSON-serialized GameEvent
}
