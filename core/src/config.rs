use crate::{
    error::{LevelError, LevelResult},
    status::StatusVocabulary,
    types::{Hour, ZoneId},
};
use anyhow::Context;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Capacity ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityLimits {
    /// Hard cap of pending orders a technician may hold in one window.
    pub max_orders_per_slot: u32,
    /// How many windows may hold two or more orders.
    pub max_duplicated_slots: u32,
    /// Windows starting at or after this hour count as "late".
    pub late_window_start_hour: Hour,
    /// Cap on late-window orders across a technician's day.
    pub max_late_orders: u32,
    /// Same-zone moves must close the donor/receiver gap by more than this.
    pub min_imbalance_to_move: u32,
    /// Two window starts closer than this are the same start.
    pub same_start_tolerance_hours: Hour,
}

// ── Day profile ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Standard,
    Reduced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayCaps {
    pub ideal_load: u32,
    pub absolute_load: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducedDayRule {
    /// A day with this many distinct window labels or fewer is reduced.
    pub max_distinct_windows: usize,
    /// Weekdays that are always reduced.
    pub weekdays: Vec<Weekday>,
}

// ── Projection ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub order_duration_hours: Hour,
    pub worst_case_duration_hours: Hour,
    /// Remaining hours on an active order at progress levels 3, 4 and 5.
    pub remaining_by_level: [Hour; 3],
    /// Floor for remaining time once an order has overrun its share.
    pub min_remaining_hours: Hour,
    /// Allowed lateness past the window end when accepting an order.
    pub grace_hours: Hour,
    /// Within this many hours of a window's end the timing check is skipped.
    pub already_late_hours: Hour,
    /// Worst-case lateness tolerated before a technician becomes a donor.
    pub risk_tolerance_hours: Hour,
}

// ── Scoring ────────────────────────────────────────────────────────

/// Receiver scoring contract. Lower score wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub pending_weight: f64,
    pub total_weight: f64,
    /// Per kilometre from the order to the receiver's centroid.
    pub distance_weight: f64,
    /// Subtracted when the receiver already serves the order's subzone.
    pub subzone_bonus: f64,
    /// Per hour of projected lateness. Must dominate every other term.
    pub lateness_weight: f64,
    pub max_distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorRules {
    /// Pending above zone average + margin makes a donor.
    pub zone_average_margin: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProactiveConfig {
    pub enabled: bool,
    /// Hours after the first window's end before the pass activates.
    pub first_window_buffer_hours: Hour,
    /// A zone is light when its mean pending is this far below ideal.
    pub light_zone_margin: f64,
    /// Minimum mean-pending gap between light and heavy neighbour.
    pub min_zone_gap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSearchConfig {
    pub relocation_gain_km: f64,
    pub swap_gain_km: f64,
    /// Proximity relocation only between technicians this close in pending.
    pub max_pending_difference: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelingConfig {
    pub capacity: CapacityLimits,
    pub standard_day: DayCaps,
    pub reduced_day: DayCaps,
    pub reduced_day_rule: ReducedDayRule,
    /// Forces the day kind instead of detecting it.
    pub day_kind: Option<DayKind>,
    pub projection: ProjectionConfig,
    pub scoring: ScoringWeights,
    pub donors: DonorRules,
    pub proactive: ProactiveConfig,
    pub local_search: LocalSearchConfig,
    pub zone_adjacency: BTreeMap<ZoneId, Vec<ZoneId>>,
    pub status: StatusVocabulary,
}

impl LevelingConfig {
    /// Load from a JSON file. Missing sections fall back to their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
        let config: LevelingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LevelResult<()> {
        let invalid = |field: &str, reason: &str| LevelError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        };
        if self.capacity.max_orders_per_slot == 0 {
            return Err(invalid("capacity.max_orders_per_slot", "must be at least 1"));
        }
        for (name, caps) in [("standard_day", &self.standard_day), ("reduced_day", &self.reduced_day)] {
            if caps.ideal_load > caps.absolute_load {
                return Err(invalid(name, "ideal_load exceeds absolute_load"));
            }
        }
        if self.projection.worst_case_duration_hours < self.projection.order_duration_hours {
            return Err(invalid(
                "projection.worst_case_duration_hours",
                "must not be shorter than order_duration_hours",
            ));
        }
        if self.projection.min_remaining_hours <= 0.0 {
            return Err(invalid("projection.min_remaining_hours", "must be positive"));
        }
        if self.scoring.max_distance_km <= 0.0 {
            return Err(invalid("scoring.max_distance_km", "must be positive"));
        }
        Ok(())
    }

    /// Adjacent zones of `zone`. Adjacency is symmetric: listing B under A
    /// also makes A adjacent to B.
    pub fn adjacent_zones(&self, zone: &str) -> BTreeSet<ZoneId> {
        let mut out: BTreeSet<ZoneId> = self
            .zone_adjacency
            .get(zone)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default();
        for (other, neighbours) in &self.zone_adjacency {
            if neighbours.iter().any(|n| n == zone) {
                out.insert(other.clone());
            }
        }
        out.remove(zone);
        out
    }

    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        a != b && self.adjacent_zones(a).contains(b)
    }
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            capacity: CapacityLimits {
                max_orders_per_slot: 2,
                max_duplicated_slots: 1,
                late_window_start_hour: 14.5,
                max_late_orders: 2,
                min_imbalance_to_move: 1,
                same_start_tolerance_hours: 0.1,
            },
            standard_day: DayCaps { ideal_load: 5, absolute_load: 6 },
            reduced_day: DayCaps { ideal_load: 3, absolute_load: 4 },
            reduced_day_rule: ReducedDayRule {
                max_distinct_windows: 2,
                weekdays: vec![Weekday::Sat, Weekday::Sun],
            },
            day_kind: None,
            projection: ProjectionConfig {
                order_duration_hours: 1.0,
                worst_case_duration_hours: 1.5, // 1h 30min
                remaining_by_level: [0.6, 0.3, 0.1],
                min_remaining_hours: 0.05,
                grace_hours: 0.25, // 15 min
                already_late_hours: 0.5,
                risk_tolerance_hours: 0.1,
            },
            scoring: ScoringWeights {
                pending_weight: 400.0,
                total_weight: 500.0,
                distance_weight: 300.0,
                subzone_bonus: 2000.0,
                lateness_weight: 100_000.0,
                max_distance_km: 8.0,
            },
            donors: DonorRules { zone_average_margin: 1.1 },
            proactive: ProactiveConfig {
                enabled: true,
                first_window_buffer_hours: 0.25,
                light_zone_margin: 2.0,
                min_zone_gap: 3.0,
            },
            local_search: LocalSearchConfig {
                relocation_gain_km: 2.0,
                swap_gain_km: 2.0,
                max_pending_difference: 1,
            },
            zone_adjacency: BTreeMap::new(),
            status: StatusVocabulary::default(),
        }
    }
}
