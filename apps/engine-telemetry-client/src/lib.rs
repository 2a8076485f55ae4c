#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::default_trait_access
    )
)]

//! Engine Telemetry Client
//!
//! A resilient streaming client for the Pulse ledger simulation engine.
//! Maintains two reconnecting WebSocket connections (metrics and
//! transaction channels), reconciles inbound frames into a shared local
//! view, and exposes pure derived signals for display.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: State and projections with no transport dependencies
//!   - `state`: Merged metrics snapshot + bounded transaction log
//!   - `signals`: Queue pressure, congestion, session throughput
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `engine`: WebSocket stream sessions, codec, reconnect policy
//!   - `control`: Fire-and-forget HTTP control client
//!   - `config`: Environment-driven settings
//!   - `telemetry`: Tracing setup
//!
//! # Data Flow
//!
//! ```text
//! engine /ws/metrics --> MetricsStreamClient --+
//!                                              |     +----------------+
//!                                              +---->| TelemetryStore |--> snapshot()
//! engine /ws/tx ------> TxStreamClient --------+     |  (watch notify)|--> DerivedSignals
//!                                                    +----------------+
//! ```
//!
//! Both streams are receive-only; each store field has a single logical
//! writer, and stream-layer failures never escape the sessions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core telemetry state with no transport dependencies.
pub mod domain;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::signals::{CONGESTION_THRESHOLD_PCT, DerivedSignals};
pub use domain::state::{
    DEFAULT_LOG_CAPACITY, MetricsSnapshot, MetricsUpdate, TelemetryStore, TransactionEvent,
};

// Infrastructure config
pub use infrastructure::config::{ClientConfig, LogSettings, StreamSettings};

// Stream sessions
pub use infrastructure::engine::{
    ConnectionPhase, MetricsStreamClient, MetricsStreamConfig, ReconnectConfig, ReconnectPolicy,
    StreamError, TxStreamClient, TxStreamConfig,
};

// Control API
pub use infrastructure::control::{ControlClient, ControlError};
