//! Local search: proximity relocation, then pairwise swaps.
//!
//! Both moves only ever shorten travel (or use the same-building waiver);
//! load is not traded away. Each order moves at most once in this pass.

use crate::{
    context::RunContext,
    error::LevelResult,
    event::LevelEvent,
    feasibility::{can_accept, AcceptOptions},
    geo::haversine_km,
    matcher::{commit_move, MoveContext},
    order::Order,
    pass::LevelingPass,
    report::{PendingChange, Suggestion, SuggestionKind},
    state::WorldState,
    types::{OrderIdx, TechId},
};
use std::collections::BTreeSet;

/// Swaps between two orders at the same building in different windows skip
/// the duplicate-window rule and the distance test.
pub fn swap_waiver(a: &Order, b: &Order) -> bool {
    a.same_location(b) && a.window_label != b.window_label
}

#[derive(Debug, Default)]
pub struct LocalSearchPass {
    touched: BTreeSet<OrderIdx>,
}

impl LocalSearchPass {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Proximity relocation ───────────────────────────────────────

    fn relocate(&mut self, world: &mut WorldState, ctx: &RunContext<'_>) -> LevelResult<Vec<LevelEvent>> {
        let cfg = &ctx.config.local_search;
        let mut events = Vec::new();
        for zone in world.zones() {
            let techs = world.techs_in_zone(&zone);
            for from in &techs {
                for to in techs.iter().filter(|t| *t != from) {
                    for idx in world.movable_orders(from) {
                        if self.touched.contains(&idx) {
                            continue;
                        }
                        let (Some(pf), Some(pt)) = (world.tech(from), world.tech(to)) else {
                            continue;
                        };
                        if pf.pending.abs_diff(pt.pending) > cfg.max_pending_difference {
                            break;
                        }
                        let Some(at) = world.orders[idx].coord else {
                            continue;
                        };
                        let (Some(own), Some(other)) = (world.centroid(from, Some(idx)), world.centroid(to, None))
                        else {
                            continue;
                        };
                        let (d_own, d_other) = (haversine_km(at, own), haversine_km(at, other));
                        let gain = d_own - d_other;
                        if gain <= cfg.relocation_gain_km || d_other > ctx.config.scoring.max_distance_km {
                            continue;
                        }
                        if let Err(why) = can_accept(world, to, idx, ctx, AcceptOptions::default()) {
                            log::trace!("proximity {} -> {to} rejected: {why}", world.orders[idx].id);
                            continue;
                        }
                        let s = commit_move(
                            world,
                            idx,
                            to,
                            Some(d_other),
                            MoveContext {
                                kind: SuggestionKind::Proximity,
                                zone: zone.clone(),
                                target_zone: None,
                                justification: format!(
                                    "{to} esta {gain:.1} km mas cerca ({d_other:.1} km vs {d_own:.1} km)"
                                ),
                            },
                        )?;
                        self.touched.insert(idx);
                        events.push(LevelEvent::SuggestionMade(s));
                    }
                }
            }
        }
        Ok(events)
    }

    // ── Swaps ──────────────────────────────────────────────────────

    fn swap_pairs(world: &WorldState, ctx: &RunContext<'_>) -> Vec<(TechId, TechId)> {
        let techs: Vec<&TechId> = world.techs.keys().collect();
        let mut pairs = Vec::new();
        for (i, a) in techs.iter().enumerate() {
            for b in &techs[i + 1..] {
                let (za, zb) = (&world.techs[*a].home_zone, &world.techs[*b].home_zone);
                if za == zb || ctx.config.are_adjacent(za, zb) {
                    pairs.push(((*a).clone(), (*b).clone()));
                }
            }
        }
        pairs
    }

    /// Travel saved by exchanging `a` (held by `ta`) and `b` (held by `tb`),
    /// measured against each side's centroid without the outgoing order.
    fn saving(world: &WorldState, ta: &str, a: OrderIdx, tb: &str, b: OrderIdx) -> Option<f64> {
        let (pa, pb) = (world.orders[a].coord?, world.orders[b].coord?);
        let ca = world.centroid(ta, Some(a))?;
        let cb = world.centroid(tb, Some(b))?;
        let current = haversine_km(pa, ca) + haversine_km(pb, cb);
        let swapped = haversine_km(pa, cb) + haversine_km(pb, ca);
        Some(current - swapped)
    }

    fn swap(&mut self, world: &mut WorldState, ctx: &RunContext<'_>) -> LevelResult<Vec<LevelEvent>> {
        let min_gain = ctx.config.local_search.swap_gain_km;
        let mut events = Vec::new();
        for (ta, tb) in Self::swap_pairs(world, ctx) {
            let cross_zone = world.techs[&ta].home_zone != world.techs[&tb].home_zone;
            for a in world.movable_orders(&ta) {
                if cross_zone && (world.is_cross_zone_donated(&ta) || world.is_cross_zone_donated(&tb)) {
                    break;
                }
                if self.touched.contains(&a) {
                    continue;
                }
                for b in world.movable_orders(&tb) {
                    if self.touched.contains(&b) {
                        continue;
                    }
                    let waived = swap_waiver(&world.orders[a], &world.orders[b]);
                    let saving = Self::saving(world, &ta, a, &tb, b);
                    if !waived && saving.is_none_or(|s| s <= min_gain) {
                        continue;
                    }
                    let into_a = AcceptOptions { same_location: waived, ignoring: Some(a) };
                    let into_b = AcceptOptions { same_location: waived, ignoring: Some(b) };
                    if can_accept(world, &ta, b, ctx, into_a).is_err()
                        || can_accept(world, &tb, a, ctx, into_b).is_err()
                    {
                        continue;
                    }

                    let suggestion = Self::commit_swap(world, &ta, a, &tb, b, saving, waived)?;
                    if cross_zone {
                        world.mark_cross_zone(&ta);
                        world.mark_cross_zone(&tb);
                    }
                    self.touched.insert(a);
                    self.touched.insert(b);
                    events.push(LevelEvent::SuggestionMade(suggestion));
                    break;
                }
            }
        }
        Ok(events)
    }

    fn commit_swap(
        world: &mut WorldState,
        ta: &str,
        a: OrderIdx,
        tb: &str,
        b: OrderIdx,
        saving: Option<f64>,
        waived: bool,
    ) -> LevelResult<Suggestion> {
        let pending = |w: &WorldState, t: &str| w.tech(t).map_or(0, |s| s.pending);
        let (before_a, before_b) = (pending(world, ta), pending(world, tb));
        world.apply_swap(a, b)?;

        let (oa, ob) = (&world.orders[a], &world.orders[b]);
        let (za, zb) = (
            world.techs[ta].home_zone.clone(),
            world.techs[tb].home_zone.clone(),
        );
        let justification = match (waived, saving) {
            (true, _) => format!("misma direccion ({}), franjas distintas", oa.address),
            (false, Some(s)) => format!("ahorro estimado {s:.1} km"),
            (false, None) => String::new(),
        };
        log::info!("INTERCAMBIO {} ({ta}) <-> {} ({tb}): {justification}", oa.id, ob.id);
        Ok(Suggestion {
            kind: SuggestionKind::Swap,
            target_zone: (za != zb).then(|| zb.clone()),
            zone: za,
            subzone: oa.subzone.clone(),
            sector: oa.sector(),
            origin: ta.to_string(),
            destination: Some(tb.to_string()),
            order_ids: vec![oa.id.clone(), ob.id.clone()],
            windows: vec![oa.window_label.clone(), ob.window_label.clone()],
            address: oa.address.clone(),
            distance_km: saving,
            origin_pending: PendingChange { before: before_a, after: pending(world, ta) },
            destination_pending: PendingChange { before: before_b, after: pending(world, tb) },
            justification,
        })
    }
}

impl LevelingPass for LocalSearchPass {
    fn name(&self) -> &'static str {
        "local_search"
    }

    fn run(&mut self, world: &mut WorldState, ctx: &RunContext<'_>) -> LevelResult<Vec<LevelEvent>> {
        self.touched.clear();
        let mut events = self.relocate(world, ctx)?;
        let moved = events.len();
        events.extend(self.swap(world, ctx)?);
        log::debug!("local search: {moved} relocations, {} swaps", events.len() - moved);
        Ok(events)
    }
}
