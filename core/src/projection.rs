//! Completion projection.
//!
//! A technician reaches an order's window after finishing the order in
//! hand and every earlier-window order in the queue. Two projections are
//! kept side by side: one with the nominal order duration and one with the
//! worst-case duration. Timing decisions use the worst case.

use crate::{
    config::ProjectionConfig,
    context::RunContext,
    profile::ShiftProfile,
    state::WorldState,
    status::StatusClass,
    types::{Hour, OrderIdx},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub normal: Hour,
    pub worst: Hour,
}

/// Hours left on the order currently in hand.
pub fn remaining_hours(
    class: StatusClass,
    on_site_since: Option<Hour>,
    now: Hour,
    cfg: &ProjectionConfig,
    profile: &ShiftProfile,
) -> Hour {
    let base = match class.progress() {
        0..=2 => profile.order_duration,
        3 => cfg.remaining_by_level[0],
        4 => cfg.remaining_by_level[1],
        _ => cfg.remaining_by_level[2],
    };
    match on_site_since {
        Some(start) => {
            let elapsed = (now - start).max(0.0);
            base.min(profile.order_duration - elapsed).max(cfg.min_remaining_hours)
        }
        None => base,
    }
}

/// Project when `tech` can start an order whose window opens at
/// `target_start`. `ignoring` is left out of the queue (the outgoing side
/// of a swap).
pub fn project_arrival(
    world: &WorldState,
    tech: &str,
    target_start: Hour,
    ctx: &RunContext<'_>,
    ignoring: Option<OrderIdx>,
) -> Projection {
    let now = ctx.now();
    let in_hand = world
        .active_order(tech)
        .map(|i| {
            let o = &world.orders[i];
            remaining_hours(o.class, o.on_site_since, now, &ctx.config.projection, &ctx.profile)
        })
        .unwrap_or(0.0);

    let queued = world
        .movable_orders(tech)
        .into_iter()
        .filter(|i| Some(*i) != ignoring)
        .filter(|i| world.orders[*i].window.is_some_and(|w| w.start < target_start))
        .count() as f64;

    Projection {
        normal: (now + in_hand + queued * ctx.profile.order_duration).max(target_start),
        worst: (now + in_hand + queued * ctx.profile.worst_case_duration).max(target_start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DayKind, LevelingConfig};

    #[test]
    fn remaining_time_by_level() {
        let cfg = LevelingConfig::default();
        let profile = ShiftProfile::for_kind(&cfg, DayKind::Standard);
        let p = &cfg.projection;
        assert_eq!(remaining_hours(StatusClass::Active(1), None, 9.0, p, &profile), 1.0);
        assert_eq!(remaining_hours(StatusClass::Active(3), None, 9.0, p, &profile), 0.6);
        assert_eq!(remaining_hours(StatusClass::Active(4), None, 9.0, p, &profile), 0.3);
        assert_eq!(remaining_hours(StatusClass::Active(5), None, 9.0, p, &profile), 0.1);
    }

    #[test]
    fn elapsed_time_shortens_and_floors() {
        let cfg = LevelingConfig::default();
        let profile = ShiftProfile::for_kind(&cfg, DayKind::Standard);
        let p = &cfg.projection;
        let r = remaining_hours(StatusClass::Active(2), Some(9.0), 9.75, p, &profile);
        assert!((r - 0.25).abs() < 1e-9, "got {r}");
        let overrun = remaining_hours(StatusClass::Active(2), Some(7.0), 9.75, p, &profile);
        assert_eq!(overrun, p.min_remaining_hours);
    }
}
