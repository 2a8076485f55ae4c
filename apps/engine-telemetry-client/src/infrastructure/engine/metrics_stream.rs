//! Metrics Stream Session
//!
//! Owns one reconnecting connection to the engine's metrics channel and is
//! the single writer of the store's metrics fields.
//!
//! Per connection lifetime:
//! - on open, the backoff delay resets to its floor and the store is marked
//!   connected;
//! - each frame decodes to a partial update and merges into the store,
//!   which captures the session baseline from the first `processed` value;
//! - a malformed frame is dropped and logged, the connection stays up;
//! - on close (remote close, socket error, stream end, or disposal of an
//!   open session) the store is marked disconnected, clearing the baseline;
//!   unless disposed, a reconnect is scheduled with growing delay.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::JsonCodec;
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use super::session::{ConnectionPhase, StreamError};
use crate::domain::state::TelemetryStore;

/// Configuration for the metrics stream session.
#[derive(Debug, Clone)]
pub struct MetricsStreamConfig {
    /// WebSocket URL of the metrics channel.
    pub url: String,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
}

impl MetricsStreamConfig {
    /// Create a configuration with default backoff.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Reconnecting client for the metrics channel.
pub struct MetricsStreamClient {
    config: MetricsStreamConfig,
    codec: JsonCodec,
    store: Arc<TelemetryStore>,
    cancel: CancellationToken,
    phase: parking_lot::RwLock<ConnectionPhase>,
}

impl MetricsStreamClient {
    /// Create a new metrics stream client writing into `store`.
    #[must_use]
    pub fn new(
        config: MetricsStreamConfig,
        store: Arc<TelemetryStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec: JsonCodec::new(),
            store,
            cancel,
            phase: parking_lot::RwLock::new(ConnectionPhase::Idle),
        }
    }

    /// Current connection phase.
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        *self.phase.read()
    }

    /// Tear the session down: suppress all future reconnects and close any
    /// live transport. Idempotent.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    /// Run the session until disposed.
    ///
    /// Transport and decode failures never escape this loop; the session
    /// retries forever unless `max_attempts` is configured.
    ///
    /// # Errors
    ///
    /// Returns an error only when the configured reconnection attempts are
    /// exhausted.
    pub async fn run(self: Arc<Self>) -> Result<(), StreamError> {
        let mut policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                self.set_phase(ConnectionPhase::Disposed);
                tracing::info!("Metrics stream disposed");
                return Ok(());
            }

            self.set_phase(ConnectionPhase::Connecting);
            match self.connect_and_run(&mut policy).await {
                Ok(()) => {
                    self.set_phase(ConnectionPhase::Disposed);
                    tracing::info!("Metrics stream disposed");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Metrics stream connection lost");
                    self.store.set_disconnected();
                    self.set_phase(ConnectionPhase::Closed);

                    if let Some(delay) = policy.next_delay() {
                        tracing::info!(
                            attempt = policy.attempt_count(),
                            delay_ms = delay.as_millis(),
                            "Reconnecting to metrics stream"
                        );
                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                self.set_phase(ConnectionPhase::Disposed);
                                tracing::info!("Metrics stream disposed during reconnect delay");
                                return Ok(());
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        return Err(StreamError::MaxReconnectAttemptsExceeded);
                    }
                }
            }
        }
    }

    /// Connect and process frames until an error or cancellation.
    async fn connect_and_run(&self, policy: &mut ReconnectPolicy) -> Result<(), StreamError> {
        tracing::info!(url = %self.config.url, "Connecting to metrics stream");
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        policy.reset();
        self.set_phase(ConnectionPhase::Open);
        self.store.set_connected();
        tracing::info!("Metrics stream connected");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    // Teardown is a disconnect like any other: the flag
                    // drops and the session baseline clears.
                    self.store.set_disconnected();
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match self.codec.decode_metrics(&text) {
                                Ok(update) => self.store.merge_metrics(&update),
                                Err(e) => {
                                    // Non-fatal: drop the frame, keep the connection.
                                    tracing::warn!(error = %e, "Dropping malformed metrics frame");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Metrics stream received close frame");
                            return Err(StreamError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore pong/binary frames.
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        None => {
                            return Err(StreamError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        *self.phase.write() = phase;
    }
}
