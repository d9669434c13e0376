//! Zone and subzone summaries.

use crate::{
    report::{SubzoneBreakdown, TechnicianLoad, ZoneSnapshot},
    state::WorldState,
    types::NO_ZONE,
};
use std::collections::BTreeMap;

pub fn zone_snapshot(world: &WorldState, zone: &str) -> ZoneSnapshot {
    let techs: Vec<_> = world.techs.values().filter(|t| t.home_zone == zone).collect();
    let pendings: Vec<u32> = techs.iter().map(|t| t.pending).collect();
    let pending: u32 = pendings.iter().sum();
    ZoneSnapshot {
        technicians: techs.len() as u32,
        pending,
        unassigned: world.pool.get(zone).map_or(0, |p| p.len() as u32),
        finalized: techs.iter().map(|t| t.finalized).sum(),
        avg_pending: if techs.is_empty() { 0.0 } else { pending as f64 / techs.len() as f64 },
        min_pending: pendings.iter().copied().min().unwrap_or(0),
        max_pending: pendings.iter().copied().max().unwrap_or(0),
    }
}

/// Per zone, subzone and owner: pending and finalized counts plus a
/// status histogram of the pending orders.
pub fn subzone_breakdown(world: &WorldState) -> Vec<SubzoneBreakdown> {
    let mut rows: BTreeMap<(String, String, String), SubzoneBreakdown> = BTreeMap::new();
    for order in world.orders.iter().filter(|o| o.zone != NO_ZONE) {
        let owner = order.owner_label().to_string();
        let key = (order.zone.clone(), order.subzone.clone(), owner.clone());
        let row = rows.entry(key).or_insert_with(|| SubzoneBreakdown {
            zone: order.zone.clone(),
            subzone: order.subzone.clone(),
            technician: owner.clone(),
            pending: 0,
            finalized: 0,
            total_load: world.tech(&owner).map_or(0, |t| t.total),
            statuses: BTreeMap::new(),
        });
        if order.is_pending() {
            row.pending += 1;
            *row.statuses.entry(order.status.clone()).or_insert(0) += 1;
        } else {
            row.finalized += 1;
        }
    }
    rows.into_values().collect()
}

pub fn technician_loads(world: &WorldState) -> Vec<TechnicianLoad> {
    world
        .techs
        .values()
        .map(|t| TechnicianLoad {
            technician: t.id.clone(),
            home_zone: t.home_zone.clone(),
            total: t.total,
            pending: t.pending,
            finalized: t.finalized,
            cross_zone: t.donated_cross_zone,
        })
        .collect()
}
