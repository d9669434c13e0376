//! Events emitted by the leveling passes.
//!
//! RULE: passes report what they did ONLY through events. The engine folds
//! them into the report; nothing reads a pass's internals.

use crate::{
    report::{Alert, Suggestion},
    types::ZoneId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelEvent {
    // ── Output events ──────────────────────────────
    SuggestionMade(Suggestion),
    AlertRaised(Alert),

    // ── Progress events ────────────────────────────
    ZoneLeveled {
        zone: ZoneId,
        donors: u32,
        moves: u32,
    },
    PassSkipped {
        pass: String,
        reason: String,
    },
}

impl LevelEvent {
    /// Stable name for logs and the event table.
    pub fn type_name(&self) -> &'static str {
        match self {
            LevelEvent::SuggestionMade(_) => "suggestion_made",
            LevelEvent::AlertRaised(_) => "alert_raised",
            LevelEvent::ZoneLeveled { .. } => "zone_leveled",
            LevelEvent::PassSkipped { .. } => "pass_skipped",
        }
    }
}
