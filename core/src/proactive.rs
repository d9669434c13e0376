//! Proactive inter-zone pass.
//!
//! Once the first window of the day is over, a lightly loaded zone can lend
//! a technician to a heavily loaded neighbour. The lent technician is freed
//! first: either someone already idle, or someone whose remaining movable
//! orders can all be spread over the rest of the zone. Spreading is tried on
//! a scratch copy of the world and only committed when every order lands.

use crate::{
    context::RunContext,
    error::LevelResult,
    event::LevelEvent,
    feasibility::{can_accept, AcceptOptions},
    geo::haversine_km,
    matcher::{best_receiver, commit_move, MoveContext},
    pass::LevelingPass,
    report::{PendingChange, Suggestion, SuggestionKind},
    state::WorldState,
    types::{OrderIdx, TechId, ZoneId, UNASSIGNED},
};

#[derive(Debug, Default)]
pub struct ProactivePass;

impl ProactivePass {
    pub fn new() -> Self {
        Self
    }

    /// Heaviest adjacent zone that is at or above the ideal load and far
    /// enough above `light`.
    fn heavy_neighbour(world: &WorldState, light: &str, ctx: &RunContext<'_>) -> Option<ZoneId> {
        let light_mean = world.zone_mean_with_pool(light);
        let cfg = &ctx.config.proactive;
        let mut best: Option<(ZoneId, f64)> = None;
        for zone in ctx.config.adjacent_zones(light) {
            let mean = world.zone_mean_with_pool(&zone);
            let gap = mean - light_mean;
            if mean < ctx.profile.ideal_load as f64 || gap <= cfg.min_zone_gap {
                continue;
            }
            if best.as_ref().is_none_or(|(_, g)| gap > *g) {
                best = Some((zone, gap));
            }
        }
        best.map(|(z, _)| z)
    }

    /// Free one technician of `zone`, returning them together with the
    /// suggestions that spread their work.
    fn release(
        world: &mut WorldState,
        zone: &str,
        ctx: &RunContext<'_>,
    ) -> LevelResult<Option<(TechId, Vec<Suggestion>)>> {
        let techs = world.techs_in_zone(zone);
        let eligible: Vec<TechId> = techs
            .iter()
            .filter(|t| !world.is_cross_zone_donated(t) && world.active_order(t).is_none())
            .cloned()
            .collect();

        if let Some(idle) = eligible.iter().find(|t| world.tech(t).is_some_and(|s| s.pending == 0)) {
            return Ok(Some((idle.clone(), Vec::new())));
        }

        // Least loaded first, and only technicians whose whole queue can move.
        let mut candidates: Vec<(u32, TechId)> = eligible
            .iter()
            .filter_map(|t| {
                let s = world.tech(t)?;
                (world.movable_orders(t).len() as u32 == s.pending).then(|| (s.pending, t.clone()))
            })
            .collect();
        candidates.sort();

        for (_, tech) in candidates {
            let others: Vec<TechId> = techs.iter().filter(|t| **t != tech).cloned().collect();
            if others.is_empty() {
                break;
            }
            let mut scratch = world.clone();
            let mut moved = Vec::new();
            let mut complete = true;
            for idx in scratch.movable_orders(&tech) {
                let Some(best) = best_receiver(&scratch, idx, &others, None, ctx) else {
                    complete = false;
                    break;
                };
                let s = commit_move(
                    &mut scratch,
                    idx,
                    &best.technician,
                    best.breakdown.distance_km,
                    MoveContext {
                        kind: SuggestionKind::LoadLeveling,
                        zone: zone.to_string(),
                        target_zone: None,
                        justification: format!(
                            "liberar a {tech} para apoyo interzona; receptor: {}",
                            best.breakdown.justification()
                        ),
                    },
                )?;
                moved.push(s);
            }
            if complete {
                *world = scratch;
                return Ok(Some((tech, moved)));
            }
            log::debug!("zone {zone}: cannot free {tech}, queue does not fit elsewhere");
        }
        Ok(None)
    }

    /// Order the freed technician should go for: the heavy zone's earliest
    /// unassigned order while its pool has not crossed a zone boundary yet,
    /// else the earliest movable order of its most loaded technician that
    /// has not crossed zones yet.
    fn target_order(world: &WorldState, heavy: &str) -> Option<OrderIdx> {
        if !world.pool_donated.contains(heavy) {
            if let Some(idx) = world.pool_orders(heavy).first() {
                return Some(*idx);
            }
        }
        let mut techs: Vec<(u32, TechId)> = world
            .techs_in_zone(heavy)
            .into_iter()
            .filter(|t| !world.is_cross_zone_donated(t))
            .filter_map(|t| world.tech(&t).map(|s| (s.pending, t)))
            .filter(|(_, t)| !world.movable_orders(t).is_empty())
            .collect();
        // Most loaded first, ties by id.
        techs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        let (_, tech) = techs.first()?;
        world.movable_orders(tech).first().copied()
    }

    fn standby(world: &WorldState, freed: &str, light: &str, heavy: &str) -> Suggestion {
        let pending = world.tech(freed).map_or(0, |t| t.pending);
        Suggestion {
            kind: SuggestionKind::ProactiveStandby,
            zone: light.to_string(),
            target_zone: Some(heavy.to_string()),
            subzone: String::new(),
            sector: String::new(),
            origin: freed.to_string(),
            destination: None,
            order_ids: Vec::new(),
            windows: Vec::new(),
            address: String::new(),
            distance_km: None,
            origin_pending: PendingChange { before: pending, after: pending },
            destination_pending: PendingChange::default(),
            justification: format!(
                "{freed} queda disponible para apoyar {heavy}; ninguna orden factible por ahora"
            ),
        }
    }
}

impl LevelingPass for ProactivePass {
    fn name(&self) -> &'static str {
        "proactive"
    }

    fn run(&mut self, world: &mut WorldState, ctx: &RunContext<'_>) -> LevelResult<Vec<LevelEvent>> {
        let cfg = &ctx.config.proactive;
        let skipped = |reason: String| {
            log::info!("proactive pass skipped: {reason}");
            Ok(vec![LevelEvent::PassSkipped { pass: self.name().to_string(), reason }])
        };
        if !cfg.enabled {
            return skipped("disabled".into());
        }
        let Some(first_end) = world.first_window_end() else {
            return skipped("no windows".into());
        };
        if ctx.now() < first_end + cfg.first_window_buffer_hours {
            return skipped(format!("first window still open (ends {first_end:.2}h)"));
        }

        let mut events = Vec::new();
        let light_limit = ctx.profile.ideal_load as f64 - cfg.light_zone_margin;
        for light in world.zones() {
            if world.zone_mean_with_pool(&light) > light_limit {
                continue;
            }
            let Some(heavy) = Self::heavy_neighbour(world, &light, ctx) else {
                continue;
            };
            let Some((freed, spread)) = Self::release(world, &light, ctx)? else {
                log::debug!("zone {light}: light but no technician can be freed");
                continue;
            };
            events.extend(spread.into_iter().map(LevelEvent::SuggestionMade));

            let target = Self::target_order(world, &heavy).filter(|idx| {
                can_accept(world, &freed, *idx, ctx, AcceptOptions::default()).is_ok()
            });
            let suggestion = match target {
                Some(idx) => {
                    let origin = world.owner_of(idx).cloned();
                    let distance_km = match (world.orders[idx].coord, world.centroid(&freed, None)) {
                        (Some(o), Some(c)) => Some(haversine_km(o, c)),
                        _ => None,
                    };
                    let s = commit_move(
                        world,
                        idx,
                        &freed,
                        distance_km,
                        MoveContext {
                            kind: SuggestionKind::Proactive,
                            zone: light.clone(),
                            target_zone: Some(heavy.clone()),
                            justification: format!(
                                "zona {light} liviana ({:.1}) junto a {heavy} cargada ({:.1}); {} pasa a {freed}",
                                world.zone_mean_with_pool(&light),
                                world.zone_mean_with_pool(&heavy),
                                origin.as_deref().unwrap_or(UNASSIGNED),
                            ),
                        },
                    )?;
                    match origin {
                        Some(o) => world.mark_cross_zone(&o),
                        None => {
                            world.pool_donated.insert(heavy.clone());
                        }
                    }
                    s
                }
                None => Self::standby(world, &freed, &light, &heavy),
            };
            world.mark_cross_zone(&freed);
            events.push(LevelEvent::SuggestionMade(suggestion));
        }
        Ok(events)
    }
}
