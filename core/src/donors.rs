//! Donor selection for one zone.
//!
//! A donor is anyone who should give up work: the zone's unassigned pool,
//! a technician over the absolute cap, a technician above the ideal load or
//! well above the zone average, or a technician whose worst-case schedule
//! already misses a window. Only technicians holding movable orders donate.

use crate::{
    context::RunContext,
    projection::project_arrival,
    state::WorldState,
    types::{Hour, OrderId, TechId, ZoneId, UNASSIGNED},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Donor {
    Pool(ZoneId),
    Technician(TechId),
}

impl Donor {
    pub fn label(&self) -> &str {
        match self {
            Donor::Pool(_) => UNASSIGNED,
            Donor::Technician(id) => id.as_str(),
        }
    }

    pub fn technician(&self) -> Option<&str> {
        match self {
            Donor::Pool(_) => None,
            Donor::Technician(id) => Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DonorReason {
    Unassigned { orders: usize },
    Overload { total: u32, cap: u32 },
    AboveIdeal { pending: u32, ideal: u32 },
    AboveAverage { pending: u32, average: f64 },
    AtRisk { order_id: OrderId, worst: Hour, end: Hour },
}

impl fmt::Display for DonorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonorReason::Unassigned { orders } => write!(f, "{orders} ordenes sin asignar"),
            DonorReason::Overload { total, cap } => write!(f, "sobrecarga {total}/{cap}"),
            DonorReason::AboveIdeal { pending, ideal } => {
                write!(f, "{pending} pendientes sobre ideal {ideal}")
            }
            DonorReason::AboveAverage { pending, average } => {
                write!(f, "{pending} pendientes sobre promedio de zona {average:.1}")
            }
            DonorReason::AtRisk { order_id, worst, end } => {
                write!(f, "orden {order_id} en riesgo (peor caso {worst:.2}h > {end:.2}h)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorCandidate {
    pub donor: Donor,
    pub reason: DonorReason,
}

/// Load-based reason for `tech` to donate, if any.
pub fn load_reason(world: &WorldState, tech: &str, ctx: &RunContext<'_>) -> Option<DonorReason> {
    let t = world.tech(tech)?;
    if world.movable_orders(tech).is_empty() {
        return None;
    }
    let profile = &ctx.profile;
    if t.total > profile.absolute_load {
        return Some(DonorReason::Overload { total: t.total, cap: profile.absolute_load });
    }
    if t.pending > profile.ideal_load {
        return Some(DonorReason::AboveIdeal { pending: t.pending, ideal: profile.ideal_load });
    }
    let average = world.zone_average_pending(&t.home_zone);
    if t.pending as f64 > average + ctx.config.donors.zone_average_margin {
        return Some(DonorReason::AboveAverage { pending: t.pending, average });
    }
    None
}

/// First movable order whose worst-case start misses its window.
pub fn risk_reason(world: &WorldState, tech: &str, ctx: &RunContext<'_>) -> Option<DonorReason> {
    let tolerance = ctx.config.projection.risk_tolerance_hours;
    world.movable_orders(tech).into_iter().find_map(|i| {
        let order = &world.orders[i];
        let window = order.window?;
        let worst = project_arrival(world, tech, window.start, ctx, None).worst;
        (worst > window.end + tolerance).then(|| DonorReason::AtRisk {
            order_id: order.id.clone(),
            worst,
            end: window.end,
        })
    })
}

/// Whether `donor` still has a reason to give. Re-evaluated after every
/// move out of it.
pub fn still_donates(world: &WorldState, donor: &Donor, ctx: &RunContext<'_>) -> bool {
    match donor {
        Donor::Pool(zone) => !world.pool_orders(zone).is_empty(),
        Donor::Technician(id) => {
            load_reason(world, id, ctx).is_some() || risk_reason(world, id, ctx).is_some()
        }
    }
}

/// Donors of `zone`: the pool first, then load donors, then schedule-risk
/// donors, each group by technician id.
pub fn select_donors(world: &WorldState, zone: &str, ctx: &RunContext<'_>) -> Vec<DonorCandidate> {
    let mut out = Vec::new();
    let pooled = world.pool_orders(zone).len();
    if pooled > 0 {
        out.push(DonorCandidate {
            donor: Donor::Pool(zone.to_string()),
            reason: DonorReason::Unassigned { orders: pooled },
        });
    }

    let techs = world.techs_in_zone(zone);
    for tech in &techs {
        if let Some(reason) = load_reason(world, tech, ctx) {
            out.push(DonorCandidate { donor: Donor::Technician(tech.clone()), reason });
        }
    }
    for tech in &techs {
        let already = out.iter().any(|c| c.donor.technician() == Some(tech.as_str()));
        if already {
            continue;
        }
        if let Some(reason) = risk_reason(world, tech, ctx) {
            out.push(DonorCandidate { donor: Donor::Technician(tech.clone()), reason });
        }
    }

    for c in &out {
        log::debug!("zone {zone}: donor {} ({})", c.donor.label(), c.reason);
    }
    out
}
