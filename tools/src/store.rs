//! SQLite persistence for leveling runs.
//!
//! RULE: Only store.rs talks to the database.

use leveling_core::report::LevelingReport;
use rusqlite::{params, Connection};

pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    /// Open (or create) the run database at `path`.
    pub fn open(path: &str) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_runs.sql"))?;
        Ok(())
    }

    /// Persist one report atomically under `run_id`.
    pub fn save_report(
        &mut self,
        run_id: &str,
        input_path: &str,
        report: &LevelingReport,
    ) -> anyhow::Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO run (run_id, version, input_path, shift_clock, day_kind, total_orders, summary, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                env!("CARGO_PKG_VERSION"),
                input_path,
                format!("{} {}", report.clock.weekday, report.clock.label()),
                format!("{:?}", report.day_kind),
                report.total_orders() as i64,
                report.summary_message(),
                chrono::Local::now().to_rfc3339(),
            ],
        )?;

        // ── Suggestions ────────────────────────────────────────
        for (seq, s) in report.suggestions.iter().enumerate() {
            tx.execute(
                "INSERT INTO suggestion (run_id, seq, kind, zone, target_zone, origin, destination, order_ids, distance_km, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    run_id,
                    seq as i64,
                    s.kind.label(),
                    s.zone,
                    s.target_zone,
                    s.origin,
                    s.destination,
                    s.order_ids.join(","),
                    s.distance_km,
                    serde_json::to_string(s)?,
                ],
            )?;
        }

        // ── Alerts ─────────────────────────────────────────────
        for a in &report.alerts {
            tx.execute(
                "INSERT INTO alert (run_id, kind, zone, technician, detail) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![run_id, a.kind.label(), a.zone, a.technician, a.detail],
            )?;
        }

        // ── Zone summaries ─────────────────────────────────────
        for z in &report.zones {
            tx.execute(
                "INSERT INTO zone_summary (run_id, zone, technicians, pending_before, pending_after,
                     unassigned_before, unassigned_after, imbalance_before, imbalance_after, moves)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    run_id,
                    z.zone,
                    z.before.technicians,
                    z.before.pending,
                    z.after.pending,
                    z.before.unassigned,
                    z.after.unassigned,
                    z.before.imbalance(),
                    z.after.imbalance(),
                    z.moves,
                ],
            )?;
        }

        tx.commit()?;
        log::info!(
            "run {run_id} persisted: {} suggestions, {} alerts, {} zones",
            report.suggestions.len(),
            report.alerts.len(),
            report.zones.len()
        );
        Ok(())
    }

    pub fn suggestion_count(&self, run_id: &str) -> rusqlite::Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM suggestion WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )
    }

    pub fn alert_count(&self, run_id: &str) -> rusqlite::Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM alert WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use leveling_core::{
        clock::ShiftClock, config::LevelingConfig, engine::LevelingEngine, order::OrderRecord,
    };

    fn record(id: &str, tech: &str, window: &str) -> OrderRecord {
        OrderRecord {
            order_id: id.into(),
            technician: Some(tech.into()),
            zone: Some("Norte".into()),
            status: Some("Programado".into()),
            window: Some(window.into()),
            ..Default::default()
        }
    }

    #[test]
    fn saves_a_full_report() {
        let mut records: Vec<OrderRecord> = (0..7)
            .map(|i| record(&format!("A{i}"), "Ana", &format!("{:02}:00-{:02}:30", 8 + i, 9 + i)))
            .collect();
        records.push(record("B0", "Beto", "08:00-09:30"));
        let mut engine = LevelingEngine::build(LevelingConfig::default());
        let report = engine
            .run(records, ShiftClock::at(7.0, Weekday::Tue))
            .expect("run should succeed");

        let mut store = RunStore::in_memory().expect("open");
        store.migrate().expect("migrate");
        store.save_report("run-1", "shift.json", &report).expect("save");

        assert_eq!(store.suggestion_count("run-1").unwrap(), report.suggestions.len() as i64);
        assert_eq!(store.alert_count("run-1").unwrap(), report.alerts.len() as i64);
        assert!(!report.suggestions.is_empty(), "overloaded Ana should donate");
    }
}
