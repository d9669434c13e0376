//! The leveling engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Normalize records, classify statuses, aggregate  (engine)
//!   1. Zone leveling   (alerts, donors, in-zone then adjacent-zone moves)
//!   2. Proactive       (free a light-zone technician for a heavy neighbour)
//!   3. Local search    (proximity relocation, then swaps)
//!
//! RULES:
//!   - Passes run once each, in registration order, over one WorldState.
//!   - Every pass sees the moves of the passes before it.
//!   - All changes to the world go through apply_move / apply_swap.
//!   - Everything a pass did is reported as events.

use crate::{
    alerts,
    clock::ShiftClock,
    config::LevelingConfig,
    context::RunContext,
    error::{LevelError, LevelResult},
    event::LevelEvent,
    leveling::ZoneLevelingPass,
    local_search::LocalSearchPass,
    order::{Order, OrderRecord},
    pass::LevelingPass,
    proactive::ProactivePass,
    report::{Alert, LevelingReport, Suggestion, ZoneSummary},
    state::WorldState,
    summary::{subzone_breakdown, technician_loads, zone_snapshot},
};
use std::collections::BTreeMap;

pub struct LevelingEngine {
    config: LevelingConfig,
    passes: Vec<Box<dyn LevelingPass>>,
}

impl LevelingEngine {
    pub fn new(config: LevelingConfig) -> Self {
        Self { config, passes: Vec::new() }
    }

    /// Engine with the three leveling passes in their fixed order:
    /// zone leveling, proactive lending, local search.
    pub fn build(config: LevelingConfig) -> Self {
        let mut engine = LevelingEngine::new(config);
        // Later passes see the moves of earlier ones.
        engine.register(Box::new(ZoneLevelingPass::new()));
        engine.register(Box::new(ProactivePass::new()));
        engine.register(Box::new(LocalSearchPass::new()));
        engine
    }

    /// Append a pass; passes run in the order they were registered.
    pub fn register(&mut self, pass: Box<dyn LevelingPass>) {
        self.passes.push(pass);
    }

    pub fn config(&self) -> &LevelingConfig {
        &self.config
    }

    /// Normalise records. Ambiguous statuses come back as alerts.
    pub fn normalize(&self, records: Vec<OrderRecord>) -> (Vec<Order>, Vec<Alert>) {
        let mut orders = Vec::with_capacity(records.len());
        let mut flagged = Vec::new();
        for record in records {
            let (order, ambiguity) = Order::from_record(record, &self.config.status);
            if let Some(amb) = ambiguity {
                flagged.push(alerts::ambiguous_status(
                    order.zone.clone(),
                    order.owner_label(),
                    &order.id,
                    &amb,
                ));
            }
            orders.push(order);
        }
        (orders, flagged)
    }

    /// One full leveling run over a snapshot of the shift.
    pub fn run(&mut self, records: Vec<OrderRecord>, clock: ShiftClock) -> LevelResult<LevelingReport> {
        if records.is_empty() {
            return Err(LevelError::EmptyDataset);
        }
        let (orders, mut alert_log) = self.normalize(records);
        log::info!("leveling {} orders at {} ({})", orders.len(), clock.label(), clock.weekday);

        let ctx = RunContext::new(&self.config, clock, &orders);
        let mut world = WorldState::build(orders);

        let zones = world.zones();
        let before: BTreeMap<String, _> = zones.iter().map(|z| (z.clone(), zone_snapshot(&world, z))).collect();
        let subzones = subzone_breakdown(&world);

        let mut suggestions: Vec<Suggestion> = Vec::new();
        let mut moves_by_zone: BTreeMap<String, u32> = BTreeMap::new();
        for pass in &mut self.passes {
            let events = pass.run(&mut world, &ctx)?;
            log::debug!("pass {} emitted {} events", pass.name(), events.len());
            for event in events {
                log::trace!("{}: {}", pass.name(), event.type_name());
                match event {
                    LevelEvent::SuggestionMade(s) => {
                        *moves_by_zone.entry(s.zone.clone()).or_insert(0) += 1;
                        suggestions.push(s);
                    }
                    LevelEvent::AlertRaised(a) => alert_log.push(a),
                    LevelEvent::ZoneLeveled { .. } | LevelEvent::PassSkipped { .. } => {}
                }
            }
        }

        alerts::sort_alerts(&mut alert_log);
        let zone_summaries: Vec<ZoneSummary> = zones
            .iter()
            .map(|z| ZoneSummary {
                zone: z.clone(),
                before: before.get(z).cloned().unwrap_or_default(),
                after: zone_snapshot(&world, z),
                moves: moves_by_zone.get(z).copied().unwrap_or(0),
            })
            .collect();

        let report = LevelingReport {
            clock,
            day_kind: ctx.profile.kind,
            suggestions,
            alerts: alert_log,
            zones: zone_summaries,
            subzones,
            technicians: technician_loads(&world),
            orders: world.orders,
        };
        log::info!("{}", report.summary_message());
        Ok(report)
    }
}
