//! Status classification.
//!
//! Free-text statuses map onto a closed `StatusClass` through
//! case-insensitive substring matching against the vocabulary tables.
//! The tables are data (and can be overridden from config); the mapping
//! itself is total: every string lands in exactly one class, and a string
//! matching both the movable and the finalized vocabulary is reported as
//! ambiguous instead of being silently resolved.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest progress level an active order can report.
pub const MAX_PROGRESS: u8 = 5;

/// Progress at or above this level means the technician is physically on site.
pub const ON_SITE_PROGRESS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "level", rename_all = "snake_case")]
pub enum StatusClass {
    /// Not started yet; eligible for reassignment.
    Movable,
    /// Terminal; excluded from load and feasibility.
    Finalized,
    /// In progress, levels 1–5.
    Active(u8),
    /// Neither movable, finalized nor on the progress table.
    Unknown,
}

impl StatusClass {
    pub fn is_movable(self) -> bool {
        matches!(self, StatusClass::Movable)
    }

    pub fn is_finalized(self) -> bool {
        matches!(self, StatusClass::Finalized)
    }

    /// Progress on the 0–5 scale. Anything not active reports 0.
    pub fn progress(self) -> u8 {
        match self {
            StatusClass::Active(level) => level,
            _ => 0,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, StatusClass::Active(_))
    }
}

/// A status string that matched both the movable and finalized vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousStatus {
    pub status: String,
    pub movable_match: String,
    pub finalized_match: String,
}

impl fmt::Display for AmbiguousStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "estado '{}' coincide con '{}' (programable) y '{}' (finalizado)",
            self.status, self.movable_match, self.finalized_match
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressStep {
    pub pattern: String,
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusVocabulary {
    pub movable: Vec<String>,
    pub finalized: Vec<String>,
    /// Ordered: the first matching pattern wins.
    pub progress: Vec<ProgressStep>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        let step = |pattern: &str, level: u8| ProgressStep { pattern: pattern.into(), level };
        Self {
            movable: words(&["programado", "programada"]),
            finalized: words(&[
                "finalizado", "finalizada", "por auditar", "cancelado", "cancelada",
                "cerrado", "cerrada", "completado", "completada",
            ]),
            progress: vec![
                step("programado", 0),
                step("programada", 0),
                step("inbound", 1),    // en camino al sitio
                step("en camino", 1),
                step("en sitio", 2),   // apenas llego
                step("iniciado", 3),   // trabajando dentro del predio
                step("iniciada", 3),
                step("mac principal enviada", 4),
                step("dispositivos cargados", 5), // a punto de finalizar
            ],
        }
    }
}

impl StatusVocabulary {
    fn first_match<'a>(list: &'a [String], lower: &str) -> Option<&'a String> {
        list.iter().find(|s| lower.contains(s.as_str()))
    }

    pub fn is_movable(&self, status: &str) -> bool {
        Self::first_match(&self.movable, &status.to_lowercase()).is_some()
    }

    pub fn is_finalized(&self, status: &str) -> bool {
        Self::first_match(&self.finalized, &status.to_lowercase()).is_some()
    }

    /// Progress level in `[0, 5]`; unmatched statuses report 0.
    pub fn status_progress(&self, status: &str) -> u8 {
        let lower = status.to_lowercase();
        self.progress
            .iter()
            .find(|s| lower.contains(s.pattern.as_str()))
            .map_or(0, |s| s.level.min(MAX_PROGRESS))
    }

    pub fn classify(&self, status: &str) -> Result<StatusClass, AmbiguousStatus> {
        let lower = status.to_lowercase();
        let movable = Self::first_match(&self.movable, &lower);
        let finalized = Self::first_match(&self.finalized, &lower);
        match (movable, finalized) {
            (Some(m), Some(f)) => Err(AmbiguousStatus {
                status: status.to_string(),
                movable_match: m.clone(),
                finalized_match: f.clone(),
            }),
            (Some(_), None) => Ok(StatusClass::Movable),
            (None, Some(_)) => Ok(StatusClass::Finalized),
            (None, None) => match self.status_progress(status) {
                0 => Ok(StatusClass::Unknown),
                level => Ok(StatusClass::Active(level)),
            },
        }
    }
}
