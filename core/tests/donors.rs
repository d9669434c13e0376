mod common;

use common::{context, index_of, order, queue, world_of};
use leveling_core::{
    config::{DayKind, LevelingConfig},
    donors::{load_reason, risk_reason, select_donors, still_donates, Donor, DonorReason},
    order::OrderRecord,
};

fn reasons(records: Vec<OrderRecord>, zone: &str, now: f64, kind: DayKind) -> Vec<(String, DonorReason)> {
    let config = LevelingConfig::default();
    let world = world_of(records);
    let ctx = context(&config, now, kind);
    select_donors(&world, zone, &ctx)
        .into_iter()
        .map(|c| (c.donor.label().to_string(), c.reason))
        .collect()
}

#[test]
fn overload_wins_over_the_softer_load_reasons() {
    let donors = reasons(queue("A", Some("Ana"), "Norte", 7), "Norte", 7.0, DayKind::Standard);
    assert_eq!(donors, vec![("Ana".to_string(), DonorReason::Overload { total: 7, cap: 6 })]);
}

#[test]
fn above_ideal_without_reaching_the_cap() {
    let donors = reasons(queue("A", Some("Ana"), "Norte", 6), "Norte", 7.0, DayKind::Standard);
    assert_eq!(donors, vec![("Ana".to_string(), DonorReason::AboveIdeal { pending: 6, ideal: 5 })]);
}

#[test]
fn well_above_the_zone_average() {
    let mut records = queue("A", Some("Ana"), "Norte", 4);
    records.push(order("B1", Some("Beto"), "Norte", "08:00-09:30", "Programado"));
    records.push(order("C1", Some("Ceci"), "Norte", "09:30-11:00", "Programado"));

    let donors = reasons(records, "Norte", 7.0, DayKind::Standard);
    assert_eq!(donors.len(), 1, "only Ana leads the average of 2 by more than the margin");
    assert_eq!(donors[0].0, "Ana");
    match donors[0].1 {
        DonorReason::AboveAverage { pending, average } => {
            assert_eq!(pending, 4);
            assert!((average - 2.0).abs() < 1e-9, "average {average}");
        }
        ref other => panic!("expected AboveAverage, got {other:?}"),
    }
}

#[test]
fn queue_running_past_a_window_is_a_risk() {
    let config = LevelingConfig::default();
    let world = world_of(vec![
        order("A1", Some("Ana"), "Norte", "08:00-09:00", "Iniciado"),
        order("A2", Some("Ana"), "Norte", "09:00-10:00", "Programado"),
    ]);
    // 9.7 now + 0.6 left on the order in hand lands past 10:00 plus tolerance.
    let ctx = context(&config, 9.7, DayKind::Standard);

    assert_eq!(load_reason(&world, "Ana", &ctx), None);
    match risk_reason(&world, "Ana", &ctx) {
        Some(DonorReason::AtRisk { order_id, worst, end }) => {
            assert_eq!(order_id, "A2");
            assert!((worst - 10.3).abs() < 1e-9, "worst {worst}");
            assert_eq!(end, 10.0);
        }
        other => panic!("expected AtRisk, got {other:?}"),
    }

    // Inside the tolerance nothing is flagged.
    let early = context(&config, 9.45, DayKind::Standard);
    assert_eq!(risk_reason(&world, "Ana", &early), None);
}

#[test]
fn pool_first_then_load_then_risk() {
    let mut records = vec![
        order("P1", None, "Norte", "12:00-13:30", "Programado"),
        order("A1", Some("Ana"), "Norte", "08:00-09:00", "Iniciado"),
        order("A2", Some("Ana"), "Norte", "09:00-10:00", "Programado"),
    ];
    records.extend(queue("B", Some("Beto"), "Norte", 7));

    let donors = reasons(records, "Norte", 9.7, DayKind::Standard);
    let labels: Vec<&str> = donors.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec!["SIN_ASIGNAR", "Beto", "Ana"], "risk donors come after load donors");
    assert_eq!(donors[0].1, DonorReason::Unassigned { orders: 1 });
    assert_eq!(donors[1].1, DonorReason::Overload { total: 7, cap: 6 });
    assert!(matches!(donors[2].1, DonorReason::AtRisk { .. }));
}

#[test]
fn reduced_day_caps_are_four_and_three() {
    let overloaded = reasons(queue("A", Some("Ana"), "Norte", 5), "Norte", 7.0, DayKind::Reduced);
    assert_eq!(overloaded, vec![("Ana".to_string(), DonorReason::Overload { total: 5, cap: 4 })]);

    let above_ideal = reasons(queue("A", Some("Ana"), "Norte", 4), "Norte", 7.0, DayKind::Reduced);
    assert_eq!(above_ideal, vec![("Ana".to_string(), DonorReason::AboveIdeal { pending: 4, ideal: 3 })]);

    let standard = reasons(queue("A", Some("Ana"), "Norte", 4), "Norte", 7.0, DayKind::Standard);
    assert!(standard.is_empty(), "four orders is fine on a standard day");
}

#[test]
fn finished_work_alone_never_donates() {
    let records: Vec<OrderRecord> = queue("A", Some("Ana"), "Norte", 7)
        .into_iter()
        .map(|mut r| {
            r.status = Some("Finalizado".into());
            r
        })
        .collect();
    assert!(reasons(records, "Norte", 7.0, DayKind::Standard).is_empty());
}

#[test]
fn donating_stops_once_back_under_the_caps() {
    let config = LevelingConfig::default();
    let mut records = queue("A", Some("Ana"), "Norte", 6);
    records.push(order("B1", Some("Beto"), "Sur", "08:00-09:30", "Finalizado"));
    records.push(order("P1", None, "Norte", "12:00-13:30", "Programado"));
    let mut world = world_of(records);
    let ctx = context(&config, 7.0, DayKind::Standard);

    let ana = Donor::Technician("Ana".into());
    let pool = Donor::Pool("Norte".into());
    assert!(still_donates(&world, &ana, &ctx));
    assert!(still_donates(&world, &pool, &ctx));

    let first = world.movable_orders("Ana")[0];
    world.apply_move(first, "Beto").expect("move");
    assert!(!still_donates(&world, &ana, &ctx), "five pending is the ideal, not above it");

    world.apply_move(index_of(&world, "P1"), "Beto").expect("move");
    assert!(!still_donates(&world, &pool, &ctx));
}
