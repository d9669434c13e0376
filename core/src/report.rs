//! Output records: suggestions, alerts, zone summaries and the run report.
//!
//! Everything here is plain data with serde derives. The runner persists
//! it; the engine never reads it back.

use crate::{
    clock::ShiftClock,
    config::DayKind,
    order::Order,
    types::{OrderId, TechId, ZoneId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Suggestions ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Pool order handed to a technician in its own zone.
    Unassigned,
    /// Same-zone move between technicians.
    LoadLeveling,
    /// Move to a technician of an adjacent zone.
    InterZone,
    /// Freed technician takes an order from a heavy neighbouring zone.
    Proactive,
    /// Freed technician with no feasible order yet.
    ProactiveStandby,
    /// Same-zone move toward a closer technician.
    Proximity,
    Swap,
}

impl SuggestionKind {
    pub fn label(self) -> &'static str {
        match self {
            SuggestionKind::Unassigned => "ASIGNACION",
            SuggestionKind::LoadLeveling => "NIVELACION",
            SuggestionKind::InterZone => "INTERZONA",
            SuggestionKind::Proactive => "PROACTIVA",
            SuggestionKind::ProactiveStandby => "PROACTIVA (DISPONIBLE)",
            SuggestionKind::Proximity => "PROXIMIDAD",
            SuggestionKind::Swap => "INTERCAMBIO",
        }
    }

    /// Crosses a zone boundary.
    pub fn is_inter_zone(self) -> bool {
        matches!(
            self,
            SuggestionKind::InterZone | SuggestionKind::Proactive | SuggestionKind::ProactiveStandby
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub before: u32,
    pub after: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub zone: ZoneId,
    /// The other zone of an inter-zone or proactive suggestion.
    pub target_zone: Option<ZoneId>,
    pub subzone: ZoneId,
    pub sector: String,
    /// Technician id, or the unassigned sentinel for pool orders.
    pub origin: String,
    /// `None` only for a standby suggestion.
    pub destination: Option<TechId>,
    /// One id for a move, two for a swap (origin's order first).
    pub order_ids: Vec<OrderId>,
    pub windows: Vec<String>,
    pub address: String,
    pub distance_km: Option<f64>,
    pub origin_pending: PendingChange,
    pub destination_pending: PendingChange,
    pub justification: String,
}

// ── Alerts ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overload,
    MultiActive,
    WindowAtRisk,
    DuplicatedWindows,
    LateExcess,
    AmbiguousStatus,
    TightWindow,
}

impl AlertKind {
    pub fn label(self) -> &'static str {
        match self {
            AlertKind::Overload => "SOBRECARGA",
            AlertKind::MultiActive => "MULTI-ESTADO ACTIVO",
            AlertKind::WindowAtRisk => "FRANJA EN RIESGO",
            AlertKind::DuplicatedWindows => "FRANJAS DUPLICADAS",
            AlertKind::LateExcess => "EXCESO TARDE",
            AlertKind::AmbiguousStatus => "ESTADO AMBIGUO",
            AlertKind::TightWindow => "FRANJA AJUSTADA",
        }
    }

    /// Sort rank in the report; lower is more urgent.
    pub fn priority(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub zone: ZoneId,
    pub technician: String,
    pub order_ids: Vec<OrderId>,
    pub detail: String,
}

// ── Summaries ──────────────────────────────────────────────────────

/// Pending load of one zone at one point of the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub technicians: u32,
    pub pending: u32,
    pub unassigned: u32,
    pub finalized: u32,
    pub avg_pending: f64,
    pub min_pending: u32,
    pub max_pending: u32,
}

impl ZoneSnapshot {
    pub fn imbalance(&self) -> u32 {
        self.max_pending - self.min_pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: ZoneId,
    pub before: ZoneSnapshot,
    pub after: ZoneSnapshot,
    pub moves: u32,
}

/// Pending work of one owner inside one subzone, from the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubzoneBreakdown {
    pub zone: ZoneId,
    pub subzone: ZoneId,
    pub technician: String,
    pub pending: u32,
    pub finalized: u32,
    pub total_load: u32,
    pub statuses: BTreeMap<String, u32>,
}

/// Final load of one technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianLoad {
    pub technician: TechId,
    pub home_zone: ZoneId,
    pub total: u32,
    pub pending: u32,
    pub finalized: u32,
    pub cross_zone: bool,
}

// ── Report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelingReport {
    pub clock: ShiftClock,
    pub day_kind: DayKind,
    pub suggestions: Vec<Suggestion>,
    pub alerts: Vec<Alert>,
    pub zones: Vec<ZoneSummary>,
    pub subzones: Vec<SubzoneBreakdown>,
    pub technicians: Vec<TechnicianLoad>,
    /// Every order with its owner after all suggestions are applied.
    pub orders: Vec<Order>,
}

impl LevelingReport {
    pub fn total_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn suggestions_of(&self, kind: SuggestionKind) -> impl Iterator<Item = &Suggestion> {
        self.suggestions.iter().filter(move |s| s.kind == kind)
    }

    pub fn alerts_of(&self, kind: AlertKind) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |a| a.kind == kind)
    }

    pub fn technician(&self, id: &str) -> Option<&TechnicianLoad> {
        self.technicians.iter().find(|t| t.technician == id)
    }

    /// One-paragraph outcome, in the wording the dispatch desk reads.
    pub fn summary_message(&self) -> String {
        let mut msg = format!(
            "Nivelacion completada. Sugerencias generadas: {}. Alertas detectadas: {}. \
             Zonas analizadas: {}. Total ordenes: {}.",
            self.suggestions.len(),
            self.alerts.len(),
            self.zones.len(),
            self.total_orders()
        );
        if self.suggestions.is_empty() {
            msg.push_str(
                " No se requieren movimientos: la carga ya esta balanceada o las \
                 restricciones de franja impiden mover ordenes.",
            );
        }
        msg
    }
}
