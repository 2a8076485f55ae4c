//! Tracing Initialization
//!
//! Sets up the `tracing` subscriber for the client binary.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `engine_telemetry_client=info`)

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise logs this crate at `info`.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("engine_telemetry_client=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
