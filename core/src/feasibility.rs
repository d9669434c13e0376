//! Feasibility checker: may technician `t` take order `o` without breaking
//! a capacity rule or arriving late?
//!
//! Checks run in a fixed order and the first failure is the answer:
//!   1. slot cap            (never waived)
//!   2. duplicate budget    (waived for same-location orders)
//!   3. late-window cap
//!   4. exact-start collision (waived for same-location orders)
//!   5. timing              (worst-case ready time vs window end + grace)
//!
//! An order without a parseable window occupies no slot and has no timing
//! constraint, so it passes every check.

use crate::{
    context::RunContext,
    projection::project_arrival,
    state::{TechState, WorldState},
    types::{Hour, OrderIdx},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptOptions {
    /// Treat the candidate as sharing a building with the receiver's queue.
    pub same_location: bool,
    /// Leave this order out of the receiver's counts (outgoing swap side).
    pub ignoring: Option<OrderIdx>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rejection {
    SlotFull { window: String, held: u32 },
    DuplicateBudget { window: String, duplicated: u32 },
    LateCap { late_orders: u32 },
    SameStart { window: String, other_order: String },
    TooLate { ready: Hour, end: Hour },
    UnknownTechnician,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::SlotFull { window, held } => {
                write!(f, "franja {window} llena ({held} ordenes)")
            }
            Rejection::DuplicateBudget { window, duplicated } => write!(
                f,
                "franja {window} seria duplicada y ya tiene {duplicated} franja(s) duplicada(s)"
            ),
            Rejection::LateCap { late_orders } => {
                write!(f, "ya tiene {late_orders} ordenes en franjas tardias")
            }
            Rejection::SameStart { window, other_order } => {
                write!(f, "misma hora de inicio que la orden {other_order} ({window})")
            }
            Rejection::TooLate { ready, end } => {
                write!(f, "llegaria a las {ready:.2}h, la franja termina a las {end:.2}h")
            }
            Rejection::UnknownTechnician => write!(f, "tecnico desconocido"),
        }
    }
}

/// Pending count per window for `t`, with `ignoring` taken out.
fn count_in(world: &WorldState, t: &TechState, label: &str, ignoring: Option<OrderIdx>) -> u32 {
    let held = t.window_count(label);
    match ignoring {
        Some(i) if world.orders[i].window_label == label && world.orders[i].is_pending() => {
            held.saturating_sub(1)
        }
        _ => held,
    }
}

/// True when the receiver already holds a pending order at the same
/// building and in the same window as the candidate.
pub fn colocated_in_window(world: &WorldState, tech: &str, idx: OrderIdx) -> bool {
    let candidate = &world.orders[idx];
    world.pending_orders(tech).into_iter().any(|i| {
        i != idx
            && world.orders[i].window_label == candidate.window_label
            && world.orders[i].same_location(candidate)
    })
}

pub fn can_accept(
    world: &WorldState,
    tech: &str,
    idx: OrderIdx,
    ctx: &RunContext<'_>,
    opts: AcceptOptions,
) -> Result<(), Rejection> {
    let Some(t) = world.tech(tech) else {
        return Err(Rejection::UnknownTechnician);
    };
    let candidate = &world.orders[idx];
    let Some(window) = candidate.window else {
        return Ok(());
    };
    let caps = &ctx.config.capacity;
    let label = candidate.window_label.as_str();
    let waived = opts.same_location || colocated_in_window(world, tech, idx);

    // 1. slot cap
    let held = count_in(world, t, label, opts.ignoring);
    if held >= caps.max_orders_per_slot {
        return Err(Rejection::SlotFull { window: label.to_string(), held });
    }

    // 2. duplicate budget
    if held >= 1 && !waived {
        let duplicated = t
            .window_counts
            .keys()
            .filter(|w| count_in(world, t, w, opts.ignoring) >= 2)
            .count() as u32;
        if duplicated >= caps.max_duplicated_slots {
            return Err(Rejection::DuplicateBudget { window: label.to_string(), duplicated });
        }
    }

    // 3. late-window cap
    if window.is_late(caps.late_window_start_hour) {
        let late_orders = world
            .pending_orders(tech)
            .into_iter()
            .filter(|i| Some(*i) != opts.ignoring)
            .filter(|i| world.orders[*i].window.is_some_and(|w| w.is_late(caps.late_window_start_hour)))
            .count() as u32;
        if late_orders >= caps.max_late_orders {
            return Err(Rejection::LateCap { late_orders });
        }
    }

    // 4. exact-start collision
    if !waived {
        let clash = world
            .pending_orders(tech)
            .into_iter()
            .filter(|i| Some(*i) != opts.ignoring)
            .find(|i| {
                world.orders[*i]
                    .window
                    .is_some_and(|w| (w.start - window.start).abs() < caps.same_start_tolerance_hours)
            });
        if let Some(other) = clash {
            return Err(Rejection::SameStart {
                window: label.to_string(),
                other_order: world.orders[other].id.clone(),
            });
        }
    }

    // 5. timing
    let proj = &ctx.config.projection;
    if ctx.now() >= window.end - proj.already_late_hours {
        return Ok(());
    }
    let ready = project_arrival(world, tech, window.start, ctx, opts.ignoring).worst;
    if ready > window.end + proj.grace_hours {
        return Err(Rejection::TooLate { ready, end: window.end });
    }
    Ok(())
}
