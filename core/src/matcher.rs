//! Receiver scoring and move commitment.
//!
//! Score contract (lower wins):
//!   pending * W_pending + total * W_total + distance_km * W_distance
//!   + lateness_hours * W_lateness - (subzone_bonus if already served)
//! The lateness weight dwarfs the others, so any projected lateness loses
//! to any on-time candidate. Ties keep the first candidate in id order.

use crate::{
    context::RunContext,
    error::LevelResult,
    feasibility::{can_accept, AcceptOptions},
    geo::haversine_km,
    projection::project_arrival,
    report::{PendingChange, Suggestion, SuggestionKind},
    state::WorldState,
    types::{OrderIdx, TechId, ZoneId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pending: u32,
    pub total: u32,
    pub distance_km: Option<f64>,
    pub lateness_hours: f64,
    pub same_subzone: bool,
    pub score: f64,
}

impl ScoreBreakdown {
    pub fn justification(&self) -> String {
        let mut parts = vec![format!("carga {} pendientes / {} total", self.pending, self.total)];
        match self.distance_km {
            Some(d) => parts.push(format!("a {d:.1} km")),
            None => parts.push("sin ubicacion".into()),
        }
        if self.same_subzone {
            parts.push("ya atiende la subzona".into());
        }
        if self.lateness_hours > 0.0 {
            parts.push(format!("retraso proyectado {:.2}h", self.lateness_hours));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub technician: TechId,
    pub breakdown: ScoreBreakdown,
}

/// Score `receiver` for `idx`. `None` when the order is farther than the
/// distance cap from the receiver's centroid.
pub fn score_receiver(
    world: &WorldState,
    receiver: &str,
    idx: OrderIdx,
    ctx: &RunContext<'_>,
) -> Option<ScoreBreakdown> {
    let t = world.tech(receiver)?;
    let order = &world.orders[idx];
    let w = &ctx.config.scoring;

    let distance_km = match (order.coord, world.centroid(receiver, None)) {
        (Some(o), Some(c)) => Some(haversine_km(o, c)),
        _ => None,
    };
    if distance_km.is_some_and(|d| d > w.max_distance_km) {
        return None;
    }

    let lateness_hours = order.window.map_or(0.0, |win| {
        let worst = project_arrival(world, receiver, win.start, ctx, None).worst;
        (worst - win.end).max(0.0)
    });
    let same_subzone = t.serves_subzone(&order.subzone);

    let score = t.pending as f64 * w.pending_weight
        + t.total as f64 * w.total_weight
        + distance_km.unwrap_or(0.0) * w.distance_weight
        + lateness_hours * w.lateness_weight
        - if same_subzone { w.subzone_bonus } else { 0.0 };

    Some(ScoreBreakdown {
        pending: t.pending,
        total: t.total,
        distance_km,
        lateness_hours,
        same_subzone,
        score,
    })
}

/// Best feasible receiver among `candidates` for `idx`.
///
/// `donor_pending` enables the imbalance filter used for same-zone moves
/// between technicians: the donor must lead the receiver by more than the
/// configured minimum.
pub fn best_receiver(
    world: &WorldState,
    idx: OrderIdx,
    candidates: &[TechId],
    donor_pending: Option<u32>,
    ctx: &RunContext<'_>,
) -> Option<Candidate> {
    let owner = world.owner_of(idx).cloned();
    let mut best: Option<Candidate> = None;
    for tech in candidates {
        if Some(tech) == owner.as_ref() {
            continue;
        }
        let Some(t) = world.tech(tech) else {
            continue;
        };
        if t.total >= ctx.profile.absolute_load {
            continue;
        }
        if let Some(dp) = donor_pending {
            if dp <= t.pending + ctx.config.capacity.min_imbalance_to_move {
                continue;
            }
        }
        if let Err(why) = can_accept(world, tech, idx, ctx, AcceptOptions::default()) {
            log::trace!("{tech} rejects {}: {why}", world.orders[idx].id);
            continue;
        }
        let Some(breakdown) = score_receiver(world, tech, idx, ctx) else {
            continue;
        };
        if best.as_ref().is_none_or(|b| breakdown.score < b.breakdown.score) {
            best = Some(Candidate { technician: tech.clone(), breakdown });
        }
    }
    best
}

/// Where a committed move sits relative to zone boundaries.
#[derive(Debug, Clone)]
pub struct MoveContext {
    pub kind: SuggestionKind,
    pub zone: ZoneId,
    pub target_zone: Option<ZoneId>,
    pub justification: String,
}

/// Apply a single move and describe it.
pub fn commit_move(
    world: &mut WorldState,
    idx: OrderIdx,
    to: &str,
    distance_km: Option<f64>,
    mc: MoveContext,
) -> LevelResult<Suggestion> {
    let origin = world.orders[idx].owner_label().to_string();
    let pending_of = |world: &WorldState, who: &str| -> u32 {
        match world.tech(who) {
            Some(t) => t.pending,
            None => world.pool.get(&world.orders[idx].zone).map_or(0, |p| p.len() as u32),
        }
    };
    let origin_before = pending_of(world, &origin);
    let dest_before = pending_of(world, to);

    world.apply_move(idx, to)?;

    let order = &world.orders[idx];
    let suggestion = Suggestion {
        kind: mc.kind,
        zone: mc.zone,
        target_zone: mc.target_zone,
        subzone: order.subzone.clone(),
        sector: order.sector(),
        origin: origin.clone(),
        destination: Some(to.to_string()),
        order_ids: vec![order.id.clone()],
        windows: vec![order.window_label.clone()],
        address: order.address.clone(),
        distance_km,
        origin_pending: PendingChange { before: origin_before, after: pending_of(world, &origin) },
        destination_pending: PendingChange { before: dest_before, after: pending_of(world, to) },
        justification: mc.justification,
    };
    log::info!(
        "{} {}: {} -> {} ({})",
        suggestion.kind.label(),
        order.id,
        suggestion.origin,
        to,
        suggestion.justification
    );
    Ok(suggestion)
}
