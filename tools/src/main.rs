//! leveling-runner: headless workload leveling over a shift snapshot.
//!
//! Usage:
//!   leveling-runner --input shift.json --now 10:30 --weekday tue
//!   leveling-runner --input shift.json --config leveling.json --db runs.db
//!
//! The input is a JSON table: `{"headers": [...], "rows": [[...], ...]}`.

mod store;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveTime, Timelike, Weekday};
use leveling_core::{
    clock::ShiftClock,
    config::LevelingConfig,
    engine::LevelingEngine,
    input::Table,
    report::LevelingReport,
};
use std::env;
use store::RunStore;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = arg_str(&args, "--input").context("missing --input <table.json>")?;
    let db = arg_str(&args, "--db").unwrap_or(":memory:");
    let config_path = arg_str(&args, "--config");
    let report_json = arg_str(&args, "--report-json");
    let clock = parse_clock(&args)?;

    println!("leveling-runner: nivelacion de carga");
    println!("  input:   {input}");
    println!("  config:  {}", config_path.unwrap_or("(defaults)"));
    println!("  db:      {db}");
    println!("  now:     {} {}", clock.weekday, clock.label());
    println!();

    let config = match config_path {
        Some(path) => LevelingConfig::load(path)?,
        None => LevelingConfig::default(),
    };

    let raw = std::fs::read_to_string(input).with_context(|| format!("Cannot read {input}"))?;
    let table: Table = serde_json::from_str(&raw).with_context(|| format!("{input} is not a JSON table"))?;
    let records = table.into_records()?;

    let mut engine = LevelingEngine::build(config);
    let report = engine.run(records, clock)?;
    let run_id = format!("run-{}", uuid::Uuid::new_v4());

    print_summary(&run_id, &report);

    if let Some(path) = report_json {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("cannot write report to {path}"))?;
    }

    if let Err(e) = persist(db, &run_id, input, &report) {
        eprintln!("ERROR: el resultado no pudo guardarse ({e:#}); se imprime completo:");
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Err(e);
    }
    Ok(())
}

fn persist(db: &str, run_id: &str, input: &str, report: &LevelingReport) -> Result<()> {
    let mut store = RunStore::open(db).with_context(|| format!("cannot open database {db}"))?;
    store.migrate().context("schema migration failed")?;
    store.save_report(run_id, input, report)?;
    Ok(())
}

fn print_summary(run_id: &str, report: &LevelingReport) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {run_id}");
    println!("  day kind:     {:?}", report.day_kind);
    println!("  orders:       {}", report.total_orders());
    println!("  suggestions:  {}", report.suggestions.len());
    println!("  alerts:       {}", report.alerts.len());
    println!();
    println!("{}", report.summary_message());
    println!();

    if !report.zones.is_empty() {
        println!("=== ZONES ===");
        for z in &report.zones {
            println!(
                "  {:<20} techs {:>2} | pending {:>3} -> {:>3} | sin asignar {:>2} -> {:>2} | desbalance {} -> {}",
                z.zone,
                z.before.technicians,
                z.before.pending,
                z.after.pending,
                z.before.unassigned,
                z.after.unassigned,
                z.before.imbalance(),
                z.after.imbalance(),
            );
        }
        println!();
    }

    if !report.suggestions.is_empty() {
        println!("=== SUGGESTIONS ===");
        for s in &report.suggestions {
            println!(
                "  [{}] {} | {} -> {} | {} | {}",
                s.kind.label(),
                s.order_ids.join(" / "),
                s.origin,
                s.destination.as_deref().unwrap_or("-"),
                s.windows.join(" / "),
                s.justification
            );
        }
        println!();
    }

    if !report.alerts.is_empty() {
        println!("=== ALERTS ===");
        for a in &report.alerts {
            println!("  [{}] {} ({}): {}", a.kind.label(), a.technician, a.zone, a.detail);
        }
    }
}

/// `--now HH:MM` and `--weekday mon..sun`, each defaulting to the local clock.
fn parse_clock(args: &[String]) -> Result<ShiftClock> {
    let local = Local::now();
    let now = match arg_str(args, "--now") {
        Some(raw) => {
            let t = NaiveTime::parse_from_str(raw, "%H:%M").with_context(|| format!("bad --now value '{raw}'"))?;
            t.hour() as f64 + t.minute() as f64 / 60.0
        }
        None => local.hour() as f64 + local.minute() as f64 / 60.0,
    };
    let weekday = match arg_str(args, "--weekday") {
        Some(raw) => raw
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("bad --weekday value '{raw}'"))?,
        None => local.weekday(),
    };
    Ok(ShiftClock::at(now, weekday))
}

fn arg_str<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
