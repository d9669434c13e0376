//! Alert generator. Advisory only: reads the world, never mutates it.

use crate::{
    context::RunContext,
    projection::project_arrival,
    report::{Alert, AlertKind},
    state::WorldState,
    status::AmbiguousStatus,
    types::ZoneId,
};

fn alert(kind: AlertKind, zone: &str, tech: &str, order_ids: Vec<String>, detail: String) -> Alert {
    Alert { kind, zone: zone.to_string(), technician: tech.to_string(), order_ids, detail }
}

/// Every alert for one technician's current state.
pub fn scan_technician(world: &WorldState, tech: &str, ctx: &RunContext<'_>) -> Vec<Alert> {
    let Some(t) = world.tech(tech) else {
        return Vec::new();
    };
    let zone = t.home_zone.as_str();
    let caps = &ctx.config.capacity;
    let mut out = Vec::new();

    if t.total > ctx.profile.absolute_load {
        out.push(alert(
            AlertKind::Overload,
            zone,
            tech,
            Vec::new(),
            format!("{} ordenes (maximo {})", t.total, ctx.profile.absolute_load),
        ));
    }

    let on_site = world.on_site_orders(tech);
    if on_site.len() > 1 {
        let ids: Vec<String> = on_site.iter().map(|i| world.orders[*i].id.clone()).collect();
        out.push(alert(
            AlertKind::MultiActive,
            zone,
            tech,
            ids.clone(),
            format!("{} ordenes en sitio a la vez: {}", ids.len(), ids.join(", ")),
        ));
    }

    for idx in world.movable_orders(tech) {
        let order = &world.orders[idx];
        let Some(window) = order.window else {
            continue;
        };
        let proj = project_arrival(world, tech, window.start, ctx, None);
        if proj.worst > window.end {
            out.push(alert(
                AlertKind::WindowAtRisk,
                zone,
                tech,
                vec![order.id.clone()],
                format!(
                    "orden {} franja {}: llegada peor caso {:.2}h",
                    order.id, order.window_label, proj.worst
                ),
            ));
        } else if proj.normal > window.start {
            out.push(alert(
                AlertKind::TightWindow,
                zone,
                tech,
                vec![order.id.clone()],
                format!(
                    "orden {} franja {}: llegada estimada {:.2}h",
                    order.id, order.window_label, proj.normal
                ),
            ));
        }
    }

    let duplicated: Vec<&String> = t
        .window_counts
        .iter()
        .filter(|(_, n)| **n >= 2)
        .map(|(w, _)| w)
        .collect();
    if duplicated.len() as u32 > caps.max_duplicated_slots {
        out.push(alert(
            AlertKind::DuplicatedWindows,
            zone,
            tech,
            Vec::new(),
            format!(
                "{} franjas duplicadas (maximo {}): {}",
                duplicated.len(),
                caps.max_duplicated_slots,
                duplicated.iter().map(|w| w.as_str()).collect::<Vec<_>>().join(", ")
            ),
        ));
    }

    let late: Vec<String> = world
        .pending_orders(tech)
        .into_iter()
        .filter(|i| world.orders[*i].window.is_some_and(|w| w.is_late(caps.late_window_start_hour)))
        .map(|i| world.orders[i].id.clone())
        .collect();
    if late.len() as u32 > caps.max_late_orders {
        out.push(alert(
            AlertKind::LateExcess,
            zone,
            tech,
            late.clone(),
            format!("{} ordenes en franjas tardias (maximo {})", late.len(), caps.max_late_orders),
        ));
    }

    out
}

/// Alerts for every technician whose home zone is `zone`.
pub fn scan_zone(world: &WorldState, zone: &str, ctx: &RunContext<'_>) -> Vec<Alert> {
    world
        .techs_in_zone(zone)
        .iter()
        .flat_map(|t| scan_technician(world, t, ctx))
        .collect()
}

/// Data-quality alert for a status matching both vocabularies.
pub fn ambiguous_status(zone: ZoneId, tech: &str, order_id: &str, amb: &AmbiguousStatus) -> Alert {
    log::warn!("order {order_id}: {amb}; treated as unknown");
    Alert {
        kind: AlertKind::AmbiguousStatus,
        zone,
        technician: tech.to_string(),
        order_ids: vec![order_id.to_string()],
        detail: amb.to_string(),
    }
}

/// Most urgent first; stable within a kind.
pub fn sort_alerts(alerts: &mut [Alert]) {
    alerts.sort_by_key(|a| a.kind.priority());
}
