//! Engine Telemetry Client Binary
//!
//! Connects to the engine's metrics and transaction streams and logs a
//! periodic status line with the derived signals.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p engine-telemetry-client
//! ```
//!
//! # Environment Variables
//!
//! - `PULSE_ENGINE_HTTP_URL`: Engine control API base (default: <http://localhost:8080>)
//! - `PULSE_ENGINE_WS_URL`: Engine stream base (default: ws://localhost:8080)
//! - `PULSE_RECONNECT_DELAY_INITIAL_MS`: Metrics backoff floor (default: 500)
//! - `PULSE_RECONNECT_DELAY_MAX_MS`: Metrics backoff ceiling (default: 5000)
//! - `PULSE_RECONNECT_DELAY_MULTIPLIER`: Metrics backoff growth (default: 1.5)
//! - `PULSE_TX_RETRY_DELAY_MS`: Transaction stream fixed retry (default: 1000)
//! - `PULSE_TX_LOG_CAPACITY`: Transaction log bound (default: 100)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use engine_telemetry_client::infrastructure::telemetry;
use engine_telemetry_client::{
    ClientConfig, DerivedSignals, MetricsStreamClient, MetricsStreamConfig, ReconnectConfig,
    TelemetryStore, TxStreamClient, TxStreamConfig,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Interval between status log lines.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting engine telemetry client");

    let config = ClientConfig::from_env();
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let store = Arc::new(TelemetryStore::new(config.log.transaction_log_capacity));

    let metrics_client = Arc::new(MetricsStreamClient::new(
        MetricsStreamConfig {
            url: config.metrics_stream_url(),
            reconnect: ReconnectConfig {
                initial_delay: config.stream.reconnect_delay_initial,
                max_delay: config.stream.reconnect_delay_max,
                multiplier: config.stream.reconnect_delay_multiplier,
                jitter_factor: 0.0,
                max_attempts: config.stream.max_reconnect_attempts,
            },
        },
        Arc::clone(&store),
        shutdown_token.clone(),
    ));

    let tx_client = Arc::new(TxStreamClient::new(
        TxStreamConfig {
            url: config.tx_stream_url(),
            retry_delay: config.stream.tx_retry_delay,
            max_attempts: config.stream.max_reconnect_attempts,
        },
        Arc::clone(&store),
        shutdown_token.clone(),
    ));

    tokio::spawn(async move {
        if let Err(e) = metrics_client.run().await {
            tracing::error!(error = %e, "Metrics stream client error");
        }
    });

    tokio::spawn(async move {
        if let Err(e) = tx_client.run().await {
            tracing::error!(error = %e, "Transaction stream client error");
        }
    });

    let status_store = Arc::clone(&store);
    let status_cancel = shutdown_token.clone();
    tokio::spawn(async move {
        log_status(status_store, status_cancel).await;
    });

    tracing::info!("Telemetry client ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Telemetry client stopped");
    Ok(())
}

/// Log the derived signals once a second while the client runs.
async fn log_status(store: Arc<TelemetryStore>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(STATUS_INTERVAL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        let snapshot = store.snapshot();
        let signals = DerivedSignals::compute(&snapshot);
        tracing::info!(
            connected = snapshot.is_connected,
            processed = snapshot.processed,
            session_processed = signals.session_processed,
            queue_pressure_pct = signals.queue_pressure,
            congested = signals.is_congested,
            transactions = store.transaction_count(),
            "Engine status"
        );
    }
}

/// Log the parsed configuration.
fn log_config(config: &ClientConfig) {
    tracing::info!(
        http_base_url = %config.http_base_url,
        metrics_stream_url = %config.metrics_stream_url(),
        tx_stream_url = %config.tx_stream_url(),
        tx_log_capacity = config.log.transaction_log_capacity,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
