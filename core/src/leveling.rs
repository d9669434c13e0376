//! Zone leveling pass.
//!
//! Zones are processed in sorted order. For each zone: raise alerts on the
//! state as the zone is reached, select donors, then move donor orders
//! (earliest window first) to the best receiver. Receivers are searched in
//! the donor's own zone first; adjacent zones are tried only when nobody in
//! the zone can take the order, and each donor crosses a zone boundary at
//! most once per run.

use crate::{
    alerts,
    context::RunContext,
    donors::{select_donors, still_donates, Donor},
    error::LevelResult,
    event::LevelEvent,
    matcher::{best_receiver, commit_move, MoveContext},
    pass::LevelingPass,
    report::SuggestionKind,
    state::WorldState,
    types::{OrderIdx, TechId},
};

#[derive(Debug, Default)]
pub struct ZoneLevelingPass;

impl ZoneLevelingPass {
    pub fn new() -> Self {
        Self
    }

    fn donor_orders(world: &WorldState, donor: &Donor) -> Vec<OrderIdx> {
        match donor {
            Donor::Pool(zone) => world.pool_orders(zone),
            Donor::Technician(id) => world.movable_orders(id),
        }
    }

    fn donor_crossed(world: &WorldState, donor: &Donor) -> bool {
        match donor {
            Donor::Pool(zone) => world.pool_donated.contains(zone),
            Donor::Technician(id) => world.is_cross_zone_donated(id),
        }
    }

    fn mark_crossed(world: &mut WorldState, donor: &Donor) {
        match donor {
            Donor::Pool(zone) => {
                world.pool_donated.insert(zone.clone());
            }
            Donor::Technician(id) => world.mark_cross_zone(id),
        }
    }

    fn level_zone(
        &self,
        world: &mut WorldState,
        zone: &str,
        ctx: &RunContext<'_>,
        events: &mut Vec<LevelEvent>,
    ) -> LevelResult<u32> {
        let donors = select_donors(world, zone, ctx);
        let in_zone = world.techs_in_zone(zone);
        let adjacent: Vec<TechId> = ctx
            .config
            .adjacent_zones(zone)
            .iter()
            .flat_map(|z| world.techs_in_zone(z))
            .collect();
        let mut moves = 0;

        for candidate in &donors {
            let donor = &candidate.donor;
            for idx in Self::donor_orders(world, donor) {
                if !still_donates(world, donor, ctx) {
                    break;
                }
                let donor_pending = donor.technician().and_then(|d| world.tech(d)).map(|t| t.pending);

                // Pass 1: own zone.
                if let Some(best) = best_receiver(world, idx, &in_zone, donor_pending, ctx) {
                    let kind = match donor {
                        Donor::Pool(_) => SuggestionKind::Unassigned,
                        Donor::Technician(_) => SuggestionKind::LoadLeveling,
                    };
                    let justification = format!("{}; receptor: {}", candidate.reason, best.breakdown.justification());
                    let s = commit_move(
                        world,
                        idx,
                        &best.technician,
                        best.breakdown.distance_km,
                        MoveContext { kind, zone: zone.to_string(), target_zone: None, justification },
                    )?;
                    events.push(LevelEvent::SuggestionMade(s));
                    moves += 1;
                    continue;
                }

                // Pass 2: adjacent zones, once per donor.
                if Self::donor_crossed(world, donor) || adjacent.is_empty() {
                    continue;
                }
                if let Some(best) = best_receiver(world, idx, &adjacent, None, ctx) {
                    let target_zone = world.tech(&best.technician).map(|t| t.home_zone.clone());
                    let justification = format!(
                        "{}; sin receptor en la zona, apoyo desde zona vecina: {}",
                        candidate.reason,
                        best.breakdown.justification()
                    );
                    let s = commit_move(
                        world,
                        idx,
                        &best.technician,
                        best.breakdown.distance_km,
                        MoveContext {
                            kind: SuggestionKind::InterZone,
                            zone: zone.to_string(),
                            target_zone,
                            justification,
                        },
                    )?;
                    Self::mark_crossed(world, donor);
                    events.push(LevelEvent::SuggestionMade(s));
                    moves += 1;
                }
            }
        }

        events.push(LevelEvent::ZoneLeveled {
            zone: zone.to_string(),
            donors: donors.len() as u32,
            moves,
        });
        Ok(moves)
    }
}

impl LevelingPass for ZoneLevelingPass {
    fn name(&self) -> &'static str {
        "zone_leveling"
    }

    fn run(&mut self, world: &mut WorldState, ctx: &RunContext<'_>) -> LevelResult<Vec<LevelEvent>> {
        let mut events = Vec::new();
        for zone in world.zones() {
            for a in alerts::scan_zone(world, &zone, ctx) {
                events.push(LevelEvent::AlertRaised(a));
            }
            let moves = self.level_zone(world, &zone, ctx, &mut events)?;
            log::debug!("zone {zone}: {moves} moves");
        }
        Ok(events)
    }
}
