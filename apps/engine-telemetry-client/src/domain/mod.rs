//! Domain layer - Core telemetry state and derived signals.
//!
//! No transport or I/O concerns live here; everything is synchronous,
//! deterministic, and testable in isolation.

/// Shared state store: merged metrics snapshot and bounded transaction log.
pub mod state;

/// Pure derived-signal projections over the metrics snapshot.
pub mod signals;
