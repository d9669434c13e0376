//! Shared primitive types used across the entire engine.

/// Decimal hour of the day. 14:30 is `14.5`.
pub type Hour = f64;

/// Stable technician identity as it appears in the shift export.
pub type TechId = String;

/// Order identifier as it appears in the shift export.
pub type OrderId = String;

/// Zone / subzone grouping key.
pub type ZoneId = String;

/// Index of an order inside `WorldState::orders`.
pub type OrderIdx = usize;

/// Sentinel owner for orders nobody is assigned to.
pub const UNASSIGNED: &str = "SIN_ASIGNAR";

/// Sentinel zone for orders whose zone could not be read.
pub const NO_ZONE: &str = "SIN_ZONA";

/// Sentinel subzone for orders whose subzone could not be read.
pub const NO_SUBZONE: &str = "SIN_SUBZONA";

/// Sentinel window label for orders without a window.
pub const NO_WINDOW: &str = "Sin Franja";

/// Sentinel status for orders without a status.
pub const NO_STATUS: &str = "Sin Estado";
