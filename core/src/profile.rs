//! Shift profile: the load caps and order durations for one run.
//!
//! Computed once per run from the config, the day's distinct window labels
//! and the weekday, then passed to every component. A reduced day (weekend
//! or a day with very few distinct windows) uses the tighter caps.

use crate::{
    config::{DayKind, LevelingConfig},
    types::Hour,
};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftProfile {
    pub kind: DayKind,
    pub ideal_load: u32,
    pub absolute_load: u32,
    pub order_duration: Hour,
    pub worst_case_duration: Hour,
}

impl ShiftProfile {
    pub fn detect(config: &LevelingConfig, distinct_windows: usize, weekday: Weekday) -> Self {
        let rule = &config.reduced_day_rule;
        let kind = config.day_kind.unwrap_or_else(|| {
            let few_windows = distinct_windows > 0 && distinct_windows <= rule.max_distinct_windows;
            if few_windows || rule.weekdays.contains(&weekday) {
                DayKind::Reduced
            } else {
                DayKind::Standard
            }
        });
        Self::for_kind(config, kind)
    }

    pub fn for_kind(config: &LevelingConfig, kind: DayKind) -> Self {
        let caps = match kind {
            DayKind::Standard => config.standard_day,
            DayKind::Reduced => config.reduced_day,
        };
        Self {
            kind,
            ideal_load: caps.ideal_load,
            absolute_load: caps.absolute_load,
            order_duration: config.projection.order_duration_hours,
            worst_case_duration: config.projection.worst_case_duration_hours,
        }
    }
}
