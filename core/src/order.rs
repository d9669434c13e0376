//! Orders: the immutable facts of one scheduled visit plus its current owner.

use crate::{
    geo::Coord,
    status::{AmbiguousStatus, StatusClass, StatusVocabulary},
    types::{Hour, OrderId, TechId, ZoneId, NO_STATUS, NO_SUBZONE, NO_WINDOW, NO_ZONE, UNASSIGNED},
    window::{normalize_label, parse_window, TimeWindow},
};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// One normalised input row, as handed over by the ingestion layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub subzone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    /// "On site since" timestamp: `HH:MM`, `YYYY-MM-DD HH:MM[:SS]` or RFC 3339.
    #[serde(default)]
    pub on_site_since: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// `None` while the order sits in the unassigned pool.
    pub technician: Option<TechId>,
    pub zone: ZoneId,
    pub subzone: ZoneId,
    pub status: String,
    pub class: StatusClass,
    pub window_label: String,
    pub window: Option<TimeWindow>,
    pub coord: Option<Coord>,
    pub address: String,
    /// Building key: two orders with the same key are at the same place.
    pub location_key: Option<String>,
    pub on_site_since: Option<Hour>,
}

fn clean(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() || matches!(v.to_lowercase().as_str(), "none" | "nan" | "null") {
        None
    } else {
        Some(v.to_string())
    }
}

/// Parse an "on site since" value into a decimal hour of the day.
pub fn parse_clock_time(raw: &str) -> Option<Hour> {
    let raw = raw.trim();
    let to_hour = |t: NaiveTime| t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0;
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_hour(dt.time()));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(to_hour(dt.time()));
        }
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
            return Some(to_hour(t));
        }
    }
    None
}

fn address_key(address: &str) -> Option<String> {
    let key = address
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!key.is_empty()).then_some(key)
}

fn coord_key(coord: Coord) -> String {
    format!("{:.4},{:.4}", coord.lat, coord.lon)
}

impl Order {
    /// Normalise a record. Unparseable fields fall back to sentinels; a
    /// status matching both vocabularies is classified `Unknown` and the
    /// ambiguity is handed back to the caller.
    pub fn from_record(
        record: OrderRecord,
        vocab: &StatusVocabulary,
    ) -> (Order, Option<AmbiguousStatus>) {
        let technician = clean(record.technician.as_deref())
            .filter(|t| !t.eq_ignore_ascii_case(UNASSIGNED));
        let zone = clean(record.zone.as_deref()).unwrap_or_else(|| NO_ZONE.into());
        let subzone = clean(record.subzone.as_deref()).unwrap_or_else(|| NO_SUBZONE.into());
        let status = clean(record.status.as_deref()).unwrap_or_else(|| NO_STATUS.into());
        let window_label = clean(record.window.as_deref())
            .map(|w| normalize_label(&w))
            .unwrap_or_else(|| NO_WINDOW.into());
        let window = parse_window(&window_label);
        let coord = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => Coord::new(lat, lon),
            _ => None,
        };
        let address = clean(record.address.as_deref()).unwrap_or_default();
        let location_key = address_key(&address).or_else(|| coord.map(coord_key));
        let on_site_since = record.on_site_since.as_deref().and_then(parse_clock_time);

        let (class, ambiguity) = match vocab.classify(&status) {
            Ok(class) => (class, None),
            Err(amb) => (StatusClass::Unknown, Some(amb)),
        };

        let order = Order {
            id: record.order_id.trim().to_string(),
            technician,
            zone,
            subzone,
            status,
            class,
            window_label,
            window,
            coord,
            address,
            location_key,
            on_site_since,
        };
        (order, ambiguity)
    }

    pub fn owner_label(&self) -> &str {
        self.technician.as_deref().unwrap_or(UNASSIGNED)
    }

    pub fn is_pending(&self) -> bool {
        !self.class.is_finalized()
    }

    pub fn same_location(&self, other: &Order) -> bool {
        matches!((&self.location_key, &other.location_key), (Some(a), Some(b)) if a == b)
    }

    /// `"<subzone> (<lat>, <lon>)"`, or `"Sin ubicacion"` without coordinates.
    pub fn sector(&self) -> String {
        match self.coord {
            Some(c) => format!("{} ({:.4}, {:.4})", self.subzone, c.lat, c.lon),
            None => "Sin ubicacion".into(),
        }
    }

    /// Sort key for earliest-window-first processing; no window sorts last.
    pub fn window_sort_key(&self) -> Hour {
        self.window.map_or(99.0, |w| w.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> OrderRecord {
        OrderRecord { order_id: id.into(), ..Default::default() }
    }

    #[test]
    fn blank_fields_fall_back_to_sentinels() {
        let vocab = StatusVocabulary::default();
        let (o, amb) = Order::from_record(
            OrderRecord { technician: Some("nan".into()), ..record("1") },
            &vocab,
        );
        assert!(amb.is_none());
        assert!(o.technician.is_none());
        assert_eq!(o.owner_label(), UNASSIGNED);
        assert_eq!(o.zone, NO_ZONE);
        assert_eq!(o.subzone, NO_SUBZONE);
        assert_eq!(o.status, NO_STATUS);
        assert_eq!(o.window_label, NO_WINDOW);
        assert!(o.window.is_none());
        assert_eq!(o.class, StatusClass::Unknown);
    }

    #[test]
    fn location_key_prefers_address() {
        let vocab = StatusVocabulary::default();
        let (a, _) = Order::from_record(
            OrderRecord {
                address: Some("Calle 10  # 5-20 ".into()),
                latitude: Some(4.6),
                longitude: Some(-74.1),
                ..record("a")
            },
            &vocab,
        );
        let (b, _) = Order::from_record(
            OrderRecord { address: Some("calle 10 # 5-20".into()), ..record("b") },
            &vocab,
        );
        assert!(a.same_location(&b));

        let (c, _) = Order::from_record(
            OrderRecord { latitude: Some(4.6), longitude: Some(-74.1), ..record("c") },
            &vocab,
        );
        assert_eq!(c.location_key.as_deref(), Some("4.6000,-74.1000"));
    }

    #[test]
    fn clock_time_formats() {
        assert_eq!(parse_clock_time("09:30"), Some(9.5));
        assert_eq!(parse_clock_time("2026-02-17 10:15:00"), Some(10.25));
        assert_eq!(parse_clock_time("2026-02-17T10:45:00-05:00"), Some(10.75));
        assert_eq!(parse_clock_time("ayer"), None);
    }
}
