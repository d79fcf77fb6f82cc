use serde::{Deserialize, Serialize};
use crate::{
    config::PurchaseKind,
    types::{ItemKey, Millis},
};

/// Everything a player (or a front end acting for one) can ask of the engine.
/// Variants are appended over time; never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Screen actions ────────────────────────────
    SelectNewspaper { newspaper: String },
    Purchase { kind: PurchaseKind, key: ItemKey },
    ContinueToNextDay,
    AdvanceToRebirth,
    ConfirmRebirth,

    // ── Clock ─────────────────────────────────────
    AdvanceTime { ms: Millis },

    // ── Task inputs ───────────────────────────────
    ActivateTarget,
    PlacePen { holder: usize },
}

impl PlayerCommand {
    /// Name used in logs and InvalidAction errors.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::SelectNewspaper { .. } => "select_newspaper",
            Self::Purchase { .. }        => "purchase",
            Self::ContinueToNextDay      => "continue_to_next_day",
            Self::AdvanceToRebirth       => "advance_to_rebirth",
            Self::ConfirmRebirth         => "confirm_rebirth",
            Self::AdvanceTime { .. }     => "advance_time",
            Self::ActivateTarget         => "activate_target",
            Self::PlacePen { .. }        => "place_pen",
        }
    }
}
