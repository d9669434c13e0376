//! Shared fixtures: an order builder and a seeded shift generator.
#![allow(dead_code)]

use chrono::Weekday;
use leveling_core::{
    clock::ShiftClock,
    config::{DayKind, LevelingConfig},
    context::RunContext,
    engine::LevelingEngine,
    order::OrderRecord,
    profile::ShiftProfile,
    report::LevelingReport,
    state::WorldState,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub fn order(id: &str, tech: Option<&str>, zone: &str, window: &str, status: &str) -> OrderRecord {
    OrderRecord {
        order_id: id.into(),
        technician: tech.map(String::from),
        zone: Some(zone.into()),
        subzone: Some(format!("{zone}-centro")),
        status: Some(status.into()),
        window: Some(window.into()),
        ..Default::default()
    }
}

pub trait RecordExt {
    fn at(self, lat: f64, lon: f64) -> Self;
    fn address(self, address: &str) -> Self;
    fn subzone(self, subzone: &str) -> Self;
}

impl RecordExt for OrderRecord {
    fn at(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    fn address(mut self, address: &str) -> Self {
        self.address = Some(address.into());
        self
    }

    fn subzone(mut self, subzone: &str) -> Self {
        self.subzone = Some(subzone.into());
        self
    }
}

pub fn run(records: Vec<OrderRecord>, config: LevelingConfig, now: f64) -> LevelingReport {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = LevelingEngine::build(config);
    engine
        .run(records, ShiftClock::at(now, Weekday::Wed))
        .expect("leveling run should succeed")
}

/// Normalised world for direct donor and matcher checks.
pub fn world_of(records: Vec<OrderRecord>) -> WorldState {
    let (orders, _) = LevelingEngine::new(LevelingConfig::default()).normalize(records);
    WorldState::build(orders)
}

/// Wednesday context with a fixed day kind.
pub fn context(config: &LevelingConfig, now: f64, kind: DayKind) -> RunContext<'_> {
    RunContext::with_profile(config, ShiftClock::at(now, Weekday::Wed), ShiftProfile::for_kind(config, kind))
}

pub fn index_of(world: &WorldState, id: &str) -> usize {
    world
        .orders
        .iter()
        .position(|o| o.id == id)
        .unwrap_or_else(|| panic!("unknown order {id}"))
}

/// Consecutive non-overlapping windows, one per queued order.
pub const DAY: &[&str] = &[
    "08:00-09:30",
    "09:30-11:00",
    "11:00-12:30",
    "12:30-14:00",
    "14:30-16:00",
    "16:00-17:30",
    "17:30-19:00",
];

/// `n` scheduled orders for `tech`, one per window of `DAY`.
pub fn queue(prefix: &str, tech: Option<&str>, zone: &str, n: usize) -> Vec<OrderRecord> {
    DAY.iter()
        .cycle()
        .take(n)
        .enumerate()
        .map(|(i, w)| order(&format!("{prefix}{}", i + 1), tech, zone, w, "Programado"))
        .collect()
}

const WINDOWS: &[&str] = &[
    "08:00-09:30",
    "09:30-11:00",
    "11:00-12:30",
    "12:30-14:00",
    "14:30-16:00",
    "16:00-17:30",
];
const STATUSES: &[&str] = &["Programado", "Programado", "Programado", "Finalizado", "En camino", "Iniciado"];
const ZONES: &[(&str, f64, f64)] = &[("Norte", 4.70, -74.05), ("Centro", 4.62, -74.08), ("Sur", 4.55, -74.12)];

/// A deterministic synthetic shift: a few technicians per zone with uneven
/// loads, some unassigned orders, scattered around each zone's center.
pub fn synthetic_shift(seed: u64) -> Vec<OrderRecord> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let mut out = Vec::new();
    let mut next_id = 0;
    for (zone, lat, lon) in ZONES {
        let techs = rng.gen_range(2..=4);
        for t in 0..=techs {
            // The extra slot is the zone's unassigned pool.
            let tech = (t < techs).then(|| format!("{zone}-T{t}"));
            let load = if tech.is_some() { rng.gen_range(0..=8) } else { rng.gen_range(0..=2) };
            let mut has_active = false;
            for _ in 0..load {
                next_id += 1;
                let mut status = STATUSES[rng.gen_range(0..STATUSES.len())];
                if tech.is_none() || (has_active && status != "Finalizado") {
                    status = "Programado";
                }
                has_active |= matches!(status, "En camino" | "Iniciado");
                let rec = order(
                    &format!("O{next_id:03}"),
                    tech.as_deref(),
                    zone,
                    WINDOWS[rng.gen_range(0..WINDOWS.len())],
                    status,
                )
                .at(lat + rng.gen_range(-0.04..0.04), lon + rng.gen_range(-0.04..0.04));
                out.push(rec);
            }
        }
    }
    out
}

pub fn adjacent_config() -> LevelingConfig {
    let mut config = LevelingConfig::default();
    config.zone_adjacency.insert("Norte".into(), vec!["Centro".into()]);
    config.zone_adjacency.insert("Centro".into(), vec!["Sur".into()]);
    config
}
