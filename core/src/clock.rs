//! Shift clock: the "now" every projection is measured from.
//!
//! The engine never reads the system clock. Callers pass a `ShiftClock`
//! in, which keeps runs reproducible and tests deterministic.

use crate::types::Hour;
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftClock {
    /// Current decimal hour of the day.
    pub now: Hour,
    pub weekday: Weekday,
}

impl ShiftClock {
    pub fn at(now: Hour, weekday: Weekday) -> Self {
        Self { now, weekday }
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let now = dt.hour() as f64 + dt.minute() as f64 / 60.0;
        Self { now, weekday: dt.weekday() }
    }

    /// `HH:MM` rendering of `now`, for summaries.
    pub fn label(&self) -> String {
        let total_minutes = (self.now * 60.0).round() as i64;
        format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
    }
}
