//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete transport and configuration code: WebSocket stream sessions,
//! the control API client, env-driven settings, and tracing setup.

/// Engine WebSocket stream adapters (metrics and transaction channels).
pub mod engine;

/// Fire-and-forget control API client.
pub mod control;

/// Configuration loading.
pub mod config;

/// Tracing initialization.
pub mod telemetry;
