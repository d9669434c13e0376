//! Workload leveling for field technicians.
//!
//! Takes a snapshot of a shift's orders and proposes reassignments (moves,
//! swaps and cross-zone transfers) that even out load and travel without
//! ever breaking a window, plus advisory alerts and zone summaries.
//! See engine.rs for the execution order.

pub mod aggregate;
pub mod alerts;
pub mod clock;
pub mod config;
pub mod context;
pub mod donors;
pub mod engine;
pub mod error;
pub mod event;
pub mod feasibility;
pub mod geo;
pub mod input;
pub mod leveling;
pub mod local_search;
pub mod matcher;
pub mod order;
pub mod pass;
pub mod proactive;
pub mod profile;
pub mod projection;
pub mod report;
pub mod state;
pub mod status;
pub mod summary;
pub mod types;
pub mod window;
