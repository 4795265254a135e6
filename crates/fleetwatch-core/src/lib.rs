//! fleetwatch-core — shared types and configuration for fleetwatch.
//!
//! Everything here is loaded once at startup and read-only for the
//! process lifetime: the parsed config (servers, tasks, global knobs)
//! and the `ScanResult` shape that flows from host workers into the
//! per-round aggregation.

pub mod config;
pub mod types;

pub use config::{FleetConfig, GlobalConfig, ServerConfig, TaskConfig};
pub use types::ScanResult;
