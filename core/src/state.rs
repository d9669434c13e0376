//! Mutable world state for one leveling run.
//!
//! RULE: every reassignment goes through `apply_move` or `apply_swap`.
//! Both update the owning `TechState` aggregates in place, so no pass ever
//! needs to recompute loads from the order list. Aggregates are built once
//! by `WorldState::build` (see aggregate.rs).

use crate::{
    error::{LevelError, LevelResult},
    geo::{centroid, Coord},
    order::Order,
    status::ON_SITE_PROGRESS,
    types::{OrderIdx, TechId, ZoneId, NO_ZONE},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Running aggregates for one technician.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechState {
    pub id: TechId,
    /// Zone of the first zoned order seen for this technician.
    pub home_zone: ZoneId,
    /// Every order held, in arrival order.
    pub orders: Vec<OrderIdx>,
    pub total: u32,
    pub pending: u32,
    pub finalized: u32,
    /// Pending orders per window label. Unparseable windows occupy nothing.
    pub window_counts: BTreeMap<String, u32>,
    /// Pending orders per subzone.
    pub subzones: BTreeMap<ZoneId, u32>,
    /// Holds an order at one of the two last progress levels.
    pub near_finish: bool,
    /// Already took part in a cross-zone transfer this run.
    pub donated_cross_zone: bool,
}

impl TechState {
    fn new(id: &str, home_zone: &str) -> Self {
        Self { id: id.to_string(), home_zone: home_zone.to_string(), ..Default::default() }
    }

    pub fn serves_subzone(&self, subzone: &str) -> bool {
        self.subzones.get(subzone).is_some_and(|n| *n > 0)
    }

    pub fn window_count(&self, label: &str) -> u32 {
        self.window_counts.get(label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    pub orders: Vec<Order>,
    pub techs: BTreeMap<TechId, TechState>,
    /// Unassigned movable orders, per zone.
    pub pool: BTreeMap<ZoneId, Vec<OrderIdx>>,
    /// Zones whose pool already sent one order across a zone boundary.
    pub pool_donated: BTreeSet<ZoneId>,
}

impl WorldState {
    // ── Queries ────────────────────────────────────────────────────

    pub fn tech(&self, id: &str) -> Option<&TechState> {
        self.techs.get(id)
    }

    /// Zones with at least one order, sorted. The missing-zone sentinel is
    /// never leveled.
    pub fn zones(&self) -> Vec<ZoneId> {
        let set: BTreeSet<&str> = self
            .orders
            .iter()
            .map(|o| o.zone.as_str())
            .chain(self.techs.values().map(|t| t.home_zone.as_str()))
            .filter(|z| *z != NO_ZONE)
            .collect();
        set.into_iter().map(String::from).collect()
    }

    /// Technicians whose home zone is `zone`, sorted by id.
    pub fn techs_in_zone(&self, zone: &str) -> Vec<TechId> {
        self.techs
            .values()
            .filter(|t| t.home_zone == zone)
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn pool_orders(&self, zone: &str) -> Vec<OrderIdx> {
        let mut out = self.pool.get(zone).cloned().unwrap_or_default();
        out.sort_by(|a, b| self.orders[*a].window_sort_key().total_cmp(&self.orders[*b].window_sort_key()));
        out
    }

    /// Movable orders held by `tech`, earliest window first.
    pub fn movable_orders(&self, tech: &str) -> Vec<OrderIdx> {
        let Some(t) = self.techs.get(tech) else {
            return Vec::new();
        };
        let mut out: Vec<OrderIdx> = t
            .orders
            .iter()
            .copied()
            .filter(|i| self.orders[*i].class.is_movable())
            .collect();
        out.sort_by(|a, b| self.orders[*a].window_sort_key().total_cmp(&self.orders[*b].window_sort_key()));
        out
    }

    /// Pending (non-finalized) orders held by `tech`.
    pub fn pending_orders(&self, tech: &str) -> Vec<OrderIdx> {
        self.techs
            .get(tech)
            .map(|t| t.orders.iter().copied().filter(|i| self.orders[*i].is_pending()).collect())
            .unwrap_or_default()
    }

    /// The order the technician is working on right now, if any.
    pub fn active_order(&self, tech: &str) -> Option<OrderIdx> {
        self.techs
            .get(tech)?
            .orders
            .iter()
            .copied()
            .find(|i| self.orders[*i].class.is_active())
    }

    /// Orders at or past the on-site progress level.
    pub fn on_site_orders(&self, tech: &str) -> Vec<OrderIdx> {
        self.pending_orders(tech)
            .into_iter()
            .filter(|i| self.orders[*i].class.progress() >= ON_SITE_PROGRESS)
            .collect()
    }

    /// Centroid of the technician's pending located orders, optionally
    /// leaving one order out.
    pub fn centroid(&self, tech: &str, excluding: Option<OrderIdx>) -> Option<Coord> {
        centroid(
            self.pending_orders(tech)
                .into_iter()
                .filter(|i| Some(*i) != excluding)
                .filter_map(|i| self.orders[i].coord),
        )
    }

    pub fn owner_of(&self, idx: OrderIdx) -> Option<&TechId> {
        self.orders.get(idx)?.technician.as_ref()
    }

    pub fn total_pending(&self) -> u32 {
        self.techs.values().map(|t| t.pending).sum::<u32>()
            + self.pool.values().map(|p| p.len() as u32).sum::<u32>()
    }

    pub fn is_cross_zone_donated(&self, tech: &str) -> bool {
        self.techs.get(tech).is_some_and(|t| t.donated_cross_zone)
    }

    pub fn mark_cross_zone(&mut self, tech: &str) {
        if let Some(t) = self.techs.get_mut(tech) {
            t.donated_cross_zone = true;
        }
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Reassign a movable order to `to`, from its technician or the pool.
    pub fn apply_move(&mut self, idx: OrderIdx, to: &str) -> LevelResult<()> {
        let order = self
            .orders
            .get(idx)
            .ok_or_else(|| anyhow::anyhow!("order index {idx} out of range"))?;
        if !order.class.is_movable() {
            return Err(LevelError::Other(anyhow::anyhow!(
                "order {} is not movable (status '{}')",
                order.id,
                order.status
            )));
        }
        if !self.techs.contains_key(to) {
            return Err(LevelError::Other(anyhow::anyhow!("unknown technician {to}")));
        }
        if order.technician.as_deref() == Some(to) {
            return Ok(());
        }
        self.detach(idx);
        self.attach(idx, to);
        Ok(())
    }

    /// Exchange two movable orders between their technicians.
    pub fn apply_swap(&mut self, a: OrderIdx, b: OrderIdx) -> LevelResult<()> {
        let (Some(ta), Some(tb)) = (self.owner_of(a).cloned(), self.owner_of(b).cloned()) else {
            return Err(LevelError::Other(anyhow::anyhow!(
                "swap needs two assigned orders ({a}, {b})"
            )));
        };
        self.apply_move(a, &tb)?;
        self.apply_move(b, &ta)?;
        Ok(())
    }

    /// Add one order's contribution to a technician. Used by `build` and
    /// by every move.
    pub(crate) fn attach(&mut self, idx: OrderIdx, tech: &str) {
        let order = &mut self.orders[idx];
        order.technician = Some(tech.to_string());
        let order = &self.orders[idx];
        let home = order.zone.clone();
        let t = self
            .techs
            .entry(tech.to_string())
            .or_insert_with(|| TechState::new(tech, &home));
        if t.home_zone == NO_ZONE && order.zone != NO_ZONE {
            t.home_zone = order.zone.clone();
        }
        t.orders.push(idx);
        t.total += 1;
        if order.class.is_finalized() {
            t.finalized += 1;
            return;
        }
        t.pending += 1;
        if order.window.is_some() {
            *t.window_counts.entry(order.window_label.clone()).or_insert(0) += 1;
        }
        *t.subzones.entry(order.subzone.clone()).or_insert(0) += 1;
        if order.class.progress() >= crate::status::MAX_PROGRESS - 1 {
            t.near_finish = true;
        }
    }

    pub(crate) fn add_to_pool(&mut self, idx: OrderIdx) {
        self.orders[idx].technician = None;
        let zone = self.orders[idx].zone.clone();
        self.pool.entry(zone).or_default().push(idx);
    }

    fn detach(&mut self, idx: OrderIdx) {
        let order = &self.orders[idx];
        match order.technician.clone() {
            None => {
                if let Some(p) = self.pool.get_mut(&order.zone) {
                    p.retain(|i| *i != idx);
                }
            }
            Some(owner) => {
                let Some(t) = self.techs.get_mut(&owner) else {
                    return;
                };
                t.orders.retain(|i| *i != idx);
                t.total = t.total.saturating_sub(1);
                if order.class.is_finalized() {
                    t.finalized = t.finalized.saturating_sub(1);
                    return;
                }
                t.pending = t.pending.saturating_sub(1);
                decrement(&mut t.window_counts, &order.window_label);
                decrement(&mut t.subzones, &order.subzone);
            }
        }
    }
}

fn decrement(map: &mut BTreeMap<String, u32>, key: &str) {
    if let Some(n) = map.get_mut(key) {
        *n = n.saturating_sub(1);
        if *n == 0 {
            map.remove(key);
        }
    }
}
