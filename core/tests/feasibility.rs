mod common;

use chrono::Weekday;
use common::{order, RecordExt};
use leveling_core::{
    clock::ShiftClock,
    config::{DayKind, LevelingConfig},
    context::RunContext,
    engine::LevelingEngine,
    feasibility::{can_accept, AcceptOptions, Rejection},
    order::OrderRecord,
    state::WorldState,
};

fn standard_config() -> LevelingConfig {
    LevelingConfig { day_kind: Some(DayKind::Standard), ..Default::default() }
}

/// Build the world and ask whether `tech` may take `candidate`.
fn check(
    records: Vec<OrderRecord>,
    tech: &str,
    candidate: &str,
    now: f64,
    opts: impl FnOnce(&WorldState) -> AcceptOptions,
) -> Result<(), Rejection> {
    let config = standard_config();
    let (orders, _) = LevelingEngine::new(config.clone()).normalize(records);
    let ctx = RunContext::new(&config, ShiftClock::at(now, Weekday::Wed), &orders);
    let world = WorldState::build(orders);
    let idx = idx(&world, candidate);
    let opts = opts(&world);
    can_accept(&world, tech, idx, &ctx, opts)
}

fn idx(world: &WorldState, id: &str) -> usize {
    world.orders.iter().position(|o| o.id == id).expect("order in world")
}

fn plain(_: &WorldState) -> AcceptOptions {
    AcceptOptions::default()
}

#[test]
fn full_slot_rejects() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("A2", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("P", None, "Norte", "10:00-11:30", "Programado"),
    ];
    let verdict = check(records, "Ana", "P", 7.0, plain);
    assert_eq!(verdict, Err(Rejection::SlotFull { window: "10:00-11:30".into(), held: 2 }));
}

#[test]
fn slot_cap_is_never_waived() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("A2", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("P", None, "Norte", "10:00-11:30", "Programado"),
    ];
    let verdict = check(records, "Ana", "P", 7.0, |_| AcceptOptions { same_location: true, ignoring: None });
    assert!(matches!(verdict, Err(Rejection::SlotFull { .. })), "{verdict:?}");
}

#[test]
fn outgoing_swap_side_frees_its_slot() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("A2", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("P", None, "Norte", "10:00-11:30", "Programado"),
    ];
    let verdict = check(records, "Ana", "P", 7.0, |w| AcceptOptions {
        same_location: false,
        ignoring: Some(idx(w, "A1")),
    });
    // The slot now has room; A2 still starts at the same time.
    assert_eq!(
        verdict,
        Err(Rejection::SameStart { window: "10:00-11:30".into(), other_order: "A2".into() })
    );
}

#[test]
fn second_duplicated_window_exceeds_budget() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "08:00-09:30", "Programado"),
        order("A2", Some("Ana"), "Norte", "08:00-09:30", "Programado"),
        order("A3", Some("Ana"), "Norte", "12:00-13:30", "Programado"),
        order("P", None, "Norte", "12:00-13:30", "Programado"),
    ];
    let verdict = check(records.clone(), "Ana", "P", 7.0, plain);
    assert_eq!(
        verdict,
        Err(Rejection::DuplicateBudget { window: "12:00-13:30".into(), duplicated: 1 })
    );

    let waived = check(records, "Ana", "P", 7.0, |_| AcceptOptions { same_location: true, ignoring: None });
    assert_eq!(waived, Ok(()));
}

#[test]
fn colocated_order_in_the_same_window_waives_automatically() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "08:00-09:30", "Programado"),
        order("A2", Some("Ana"), "Norte", "08:00-09:30", "Programado"),
        order("A3", Some("Ana"), "Norte", "12:00-13:30", "Programado").address("Calle 1 # 2-3"),
        order("P", None, "Norte", "12:00-13:30", "Programado").address("calle 1 # 2-3"),
    ];
    assert_eq!(check(records, "Ana", "P", 7.0, plain), Ok(()));
}

#[test]
fn late_windows_are_capped() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "14:30-16:00", "Programado"),
        order("A2", Some("Ana"), "Norte", "16:00-17:30", "Programado"),
        order("P", None, "Norte", "17:30-19:00", "Programado"),
    ];
    assert_eq!(check(records, "Ana", "P", 7.0, plain), Err(Rejection::LateCap { late_orders: 2 }));
}

#[test]
fn same_start_under_another_label_collides() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("P", None, "Norte", "10:00-12:00", "Programado"),
    ];
    assert_eq!(
        check(records.clone(), "Ana", "P", 7.0, plain),
        Err(Rejection::SameStart { window: "10:00-12:00".into(), other_order: "A1".into() })
    );
    let waived = check(records, "Ana", "P", 7.0, |_| AcceptOptions { same_location: true, ignoring: None });
    assert_eq!(waived, Ok(()));
}

fn busy_morning() -> Vec<OrderRecord> {
    vec![
        order("A1", Some("Ana"), "Norte", "07:00-08:00", "Programado"),
        order("A2", Some("Ana"), "Norte", "08:00-09:30", "Programado"),
        order("A3", Some("Ana"), "Norte", "09:30-11:00", "Programado"),
        order("A4", Some("Ana"), "Norte", "11:00-12:30", "Programado"),
        order("A5", Some("Ana"), "Norte", "12:30-14:00", "Programado"),
        order("P", None, "Norte", "13:00-14:30", "Programado"),
    ]
}

#[test]
fn worst_case_arrival_past_grace_is_too_late() {
    // Five queued orders at 1.5h each from 08:00: ready at 15:30.
    let verdict = check(busy_morning(), "Ana", "P", 8.0, plain);
    assert_eq!(verdict, Err(Rejection::TooLate { ready: 15.5, end: 14.5 }));
}

#[test]
fn timing_is_skipped_once_the_window_is_nearly_over() {
    assert_eq!(check(busy_morning(), "Ana", "P", 14.1, plain), Ok(()));
}

#[test]
fn active_order_in_hand_delays_arrival() {
    // 09:00 + 0.6h left on the order in hand: fits before 10:15.
    let in_hand_only = vec![
        order("A1", Some("Ana"), "Norte", "08:00-09:30", "Iniciado"),
        order("P", None, "Norte", "09:00-10:00", "Programado"),
    ];
    assert_eq!(check(in_hand_only, "Ana", "P", 9.0, plain), Ok(()));

    // One more queued order at 1.5h pushes the worst case to 11:06.
    let with_queue = vec![
        order("A1", Some("Ana"), "Norte", "08:00-09:30", "Iniciado"),
        order("A2", Some("Ana"), "Norte", "08:00-08:30", "Programado"),
        order("P", None, "Norte", "09:00-10:00", "Programado"),
    ];
    match check(with_queue, "Ana", "P", 9.0, plain) {
        Err(Rejection::TooLate { ready, end }) => {
            assert!((ready - 11.1).abs() < 1e-9, "ready {ready}");
            assert_eq!(end, 10.0);
        }
        other => panic!("expected TooLate, got {other:?}"),
    }
}

#[test]
fn unknown_receiver_is_rejected() {
    let records = vec![
        order("A1", Some("Ana"), "Norte", "10:00-11:30", "Programado"),
        order("P", None, "Norte", "12:00-13:30", "Programado"),
    ];
    assert_eq!(check(records, "Nadie", "P", 7.0, plain), Err(Rejection::UnknownTechnician));
}

#[test]
fn rejection_reads_as_a_reason() {
    let r = Rejection::SlotFull { window: "10:00-11:30".into(), held: 2 };
    assert_eq!(r.to_string(), "franja 10:00-11:30 llena (2 ordenes)");
}
