//! Load aggregation: one pass over the orders builds every technician's
//! aggregates and the unassigned pool. Zone-level statistics are read off
//! the result.

use crate::{order::Order, state::WorldState};

impl WorldState {
    /// Aggregate the normalised orders. Row order does not change any
    /// count, only which zone a technician with orders in several zones
    /// calls home (the first one seen).
    pub fn build(orders: Vec<Order>) -> Self {
        let mut world = WorldState { orders, ..Default::default() };
        let mut unassigned = 0usize;
        for idx in 0..world.orders.len() {
            match world.orders[idx].technician.clone() {
                Some(tech) => world.attach(idx, &tech),
                None if world.orders[idx].class.is_movable() => {
                    world.add_to_pool(idx);
                    unassigned += 1;
                }
                // Unassigned but not movable: counted nowhere.
                None => {}
            }
        }
        log::debug!(
            "aggregated {} orders: {} technicians, {} unassigned in {} zones",
            world.orders.len(),
            world.techs.len(),
            unassigned,
            world.pool.len()
        );
        world
    }

    /// Mean pending per technician in `zone`, without the pool.
    pub fn zone_average_pending(&self, zone: &str) -> f64 {
        let techs: Vec<_> = self.techs.values().filter(|t| t.home_zone == zone).collect();
        if techs.is_empty() {
            return 0.0;
        }
        techs.iter().map(|t| t.pending as f64).sum::<f64>() / techs.len() as f64
    }

    /// Mean pending per technician in `zone`, counting the pool as work to
    /// be shared. A zone with no technicians reports its pool size.
    pub fn zone_mean_with_pool(&self, zone: &str) -> f64 {
        let techs: Vec<_> = self.techs.values().filter(|t| t.home_zone == zone).collect();
        let pool = self.pool.get(zone).map_or(0, Vec::len) as f64;
        let pending: f64 = techs.iter().map(|t| t.pending as f64).sum();
        if techs.is_empty() {
            pool
        } else {
            (pending + pool) / techs.len() as f64
        }
    }

    /// End of the earliest window of the day, by start time.
    pub fn first_window_end(&self) -> Option<f64> {
        self.orders
            .iter()
            .filter_map(|o| o.window)
            .min_by(|a, b| a.start.total_cmp(&b.start))
            .map(|w| w.end)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        order::{Order, OrderRecord},
        state::WorldState,
        status::StatusVocabulary,
    };

    fn order(id: &str, tech: Option<&str>, zone: &str, status: &str) -> Order {
        let (o, _) = Order::from_record(
            OrderRecord {
                order_id: id.into(),
                technician: tech.map(String::from),
                zone: Some(zone.into()),
                status: Some(status.into()),
                window: Some("08:00-09:30".into()),
                ..Default::default()
            },
            &StatusVocabulary::default(),
        );
        o
    }

    #[test]
    fn counts_pending_finalized_and_pool() {
        let world = WorldState::build(vec![
            order("1", Some("A"), "Norte", "Programado"),
            order("2", Some("A"), "Norte", "Finalizado"),
            order("3", Some("A"), "Norte", "En sitio"),
            order("4", None, "Norte", "Programado"),
            order("5", None, "Norte", "Finalizado"),
        ]);
        let a = world.tech("A").unwrap();
        assert_eq!((a.total, a.pending, a.finalized), (3, 2, 1));
        assert_eq!(a.window_count("08:00-09:30"), 2);
        assert_eq!(world.pool_orders("Norte").len(), 1);
        assert_eq!(world.total_pending(), 3);
    }

    #[test]
    fn home_zone_is_first_zone_seen() {
        let world = WorldState::build(vec![
            order("1", Some("A"), "Sur", "Programado"),
            order("2", Some("A"), "Norte", "Programado"),
        ]);
        assert_eq!(world.tech("A").unwrap().home_zone, "Sur");
    }

    #[test]
    fn move_keeps_aggregates_in_step() {
        let mut world = WorldState::build(vec![
            order("1", Some("A"), "Norte", "Programado"),
            order("2", Some("B"), "Norte", "Programado"),
            order("3", None, "Norte", "Programado"),
        ]);
        world.apply_move(0, "B").unwrap();
        world.apply_move(2, "A").unwrap();
        assert_eq!(world.tech("A").unwrap().pending, 1);
        assert_eq!(world.tech("B").unwrap().pending, 2);
        assert_eq!(world.tech("B").unwrap().window_count("08:00-09:30"), 2);
        assert!(world.pool_orders("Norte").is_empty());
        assert_eq!(world.orders[2].technician.as_deref(), Some("A"));
    }

    #[test]
    fn active_orders_never_move() {
        let mut world = WorldState::build(vec![
            order("1", Some("A"), "Norte", "Iniciado"),
            order("2", Some("B"), "Norte", "Programado"),
        ]);
        assert!(world.apply_move(0, "B").is_err());
        assert_eq!(world.tech("A").unwrap().pending, 1);
    }
}
