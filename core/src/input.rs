//! Input contract: locating the columns of a shift export and turning its
//! rows into `OrderRecord`s.
//!
//! The spreadsheet reader itself lives outside the engine; it hands over a
//! `Table` of header names and already-read cell values. Columns are found
//! by case-insensitive alias lists. Technician and order id are required;
//! every other column is optional and falls back to sentinels.

use crate::{
    error::{LevelError, LevelResult},
    order::OrderRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TECH_ALIASES: &[&str] = &["tecnico", "technician", "tecnico asignado", "técnico asignado", "técnico", "tech"];
const ORDER_ALIASES: &[&str] = &["appointment_id", "id", "numero de orden", "número de orden", "order id"];
const STATUS_ALIASES: &[&str] = &["status_txt", "estado", "estado de orden de trabajo"];
const ZONE_ALIASES: &[&str] = &["cities__name", "ciudad", "zona"];
const ZONE_FALLBACK_ALIASES: &[&str] = &["zone name"];
const ZONE_OP_ALIASES: &[&str] = &["zona_op"];
const SUBZONE_ALIASES: &[&str] = &["subzone", "subzona", "sites"];
const WINDOW_ALIASES: &[&str] = &["franja_label", "franja", "cita", "ventana"];
const LAT_ALIASES: &[&str] = &["latitude", "latitud", "lat"];
const LON_ALIASES: &[&str] = &["longitude", "longitud", "lon", "lng"];
const ADDRESS_ALIASES: &[&str] = &["addresses__address", "direccion", "dirección"];
const ON_SITE_ALIASES: &[&str] = &["en_sitio_desde", "on_site_since", "started_at"];

/// An already-parsed sheet: one header row plus data rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Column positions resolved against a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub technician: usize,
    pub order_id: usize,
    pub status: Option<usize>,
    pub zone: Option<usize>,
    pub zone_fallback: Option<usize>,
    pub zone_op: Option<usize>,
    pub subzone: Option<usize>,
    pub window: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    pub address: Option<usize>,
    pub on_site_since: Option<usize>,
}

fn find(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    aliases
        .iter()
        .find_map(|alias| lowered.iter().position(|h| h == alias))
}

impl ColumnMap {
    /// Fails fast naming every required concept that has no column.
    pub fn resolve(headers: &[String]) -> LevelResult<Self> {
        let technician = find(headers, TECH_ALIASES);
        let order_id = find(headers, ORDER_ALIASES);

        let mut missing = Vec::new();
        if technician.is_none() {
            missing.push("Tecnico");
        }
        if order_id.is_none() {
            missing.push("ID Orden");
        }
        let (Some(technician), Some(order_id)) = (technician, order_id) else {
            return Err(LevelError::MissingColumn { concept: missing.join(", ") });
        };

        Ok(Self {
            technician,
            order_id,
            status: find(headers, STATUS_ALIASES),
            zone: find(headers, ZONE_ALIASES),
            zone_fallback: find(headers, ZONE_FALLBACK_ALIASES),
            zone_op: find(headers, ZONE_OP_ALIASES),
            subzone: find(headers, SUBZONE_ALIASES),
            window: find(headers, WINDOW_ALIASES),
            latitude: find(headers, LAT_ALIASES),
            longitude: find(headers, LON_ALIASES),
            address: find(headers, ADDRESS_ALIASES),
            on_site_since: find(headers, ON_SITE_ALIASES),
        })
    }
}

fn cell_text(row: &[Value], idx: Option<usize>) -> Option<String> {
    match row.get(idx?)? {
        Value::Null => None,
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty() && !t.eq_ignore_ascii_case("none")).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn cell_number(row: &[Value], idx: Option<usize>) -> Option<f64> {
    match row.get(idx?)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

impl Table {
    /// Resolve the columns and convert every non-blank row.
    pub fn into_records(self) -> LevelResult<Vec<OrderRecord>> {
        let cols = ColumnMap::resolve(&self.headers)?;
        let records: Vec<OrderRecord> = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|v| !v.is_null()))
            .map(|row| {
                // Zone priority: city > zone name > operational zone.
                let zone = cell_text(row, cols.zone)
                    .or_else(|| cell_text(row, cols.zone_fallback))
                    .or_else(|| cell_text(row, cols.zone_op).map(|z| format!("Zona {z}")));
                OrderRecord {
                    order_id: cell_text(row, Some(cols.order_id)).unwrap_or_else(|| "N/A".into()),
                    technician: cell_text(row, Some(cols.technician)),
                    zone,
                    subzone: cell_text(row, cols.subzone),
                    status: cell_text(row, cols.status),
                    window: cell_text(row, cols.window),
                    latitude: cell_number(row, cols.latitude),
                    longitude: cell_number(row, cols.longitude),
                    address: cell_text(row, cols.address),
                    on_site_since: cell_text(row, cols.on_site_since),
                }
            })
            .collect();

        if records.is_empty() {
            return Err(LevelError::EmptyDataset);
        }
        Ok(records)
    }
}
