use crate::{
    clock::ShiftClock,
    config::LevelingConfig,
    order::Order,
    profile::ShiftProfile,
    types::Hour,
};
use std::collections::BTreeSet;

/// Everything a pass needs besides the mutable world: the config, the
/// profile derived for this run, and the clock.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub config: &'a LevelingConfig,
    pub profile: ShiftProfile,
    pub clock: ShiftClock,
}

impl<'a> RunContext<'a> {
    pub fn new(config: &'a LevelingConfig, clock: ShiftClock, orders: &[Order]) -> Self {
        let distinct_windows: BTreeSet<&str> = orders
            .iter()
            .filter(|o| o.window.is_some())
            .map(|o| o.window_label.as_str())
            .collect();
        let profile = ShiftProfile::detect(config, distinct_windows.len(), clock.weekday);
        log::info!(
            "shift profile: {:?} (distinct windows={}, weekday={}, ideal={}, absolute={})",
            profile.kind,
            distinct_windows.len(),
            clock.weekday,
            profile.ideal_load,
            profile.absolute_load
        );
        Self { config, profile, clock }
    }

    pub fn with_profile(config: &'a LevelingConfig, clock: ShiftClock, profile: ShiftProfile) -> Self {
        Self { config, profile, clock }
    }

    pub fn now(&self) -> Hour {
        self.clock.now
    }
}
