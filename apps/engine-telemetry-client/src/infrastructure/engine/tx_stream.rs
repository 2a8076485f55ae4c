//! Transaction Stream Session
//!
//! Owns one reconnecting connection to the engine's transaction channel
//! and is the single writer of the store's transaction log.
//!
//! Simpler than the metrics session: a fixed retry delay instead of
//! growing backoff, no baseline logic, and no connectivity flag writes.
//! The displayed connectivity state is owned by the metrics stream alone;
//! transaction presence is supplementary.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::JsonCodec;
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use super::session::{ConnectionPhase, StreamError};
use crate::domain::state::TelemetryStore;

/// Default fixed retry delay for the transaction stream.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Configuration for the transaction stream session.
#[derive(Debug, Clone)]
pub struct TxStreamConfig {
    /// WebSocket URL of the transaction channel.
    pub url: String,
    /// Fixed delay between reconnection attempts.
    pub retry_delay: Duration,
    /// Maximum attempts before giving up (0 = retry forever).
    pub max_attempts: u32,
}

impl TxStreamConfig {
    /// Create a configuration with the default fixed retry delay.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
            max_attempts: 0,
        }
    }
}

/// Reconnecting client for the transaction channel.
pub struct TxStreamClient {
    config: TxStreamConfig,
    codec: JsonCodec,
    store: Arc<TelemetryStore>,
    cancel: CancellationToken,
    phase: parking_lot::RwLock<ConnectionPhase>,
}

impl TxStreamClient {
    /// Create a new transaction stream client writing into `store`.
    #[must_use]
    pub fn new(
        config: TxStreamConfig,
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
    /// # Errors
    ///
    /// Returns an error only when the configured reconnection attempts are
    /// exhausted.
    pub async fn run(self: Arc<Self>) -> Result<(), StreamError> {
        let mut policy = ReconnectPolicy::new(ReconnectConfig {
            max_attempts: self.config.max_attempts,
            ..ReconnectConfig::fixed(self.config.retry_delay)
        });

        loop {
            if self.cancel.is_cancelled() {
                self.set_phase(ConnectionPhase::Disposed);
                tracing::info!("Transaction stream disposed");
                return Ok(());
            }

            self.set_phase(ConnectionPhase::Connecting);
            match self.connect_and_run(&mut policy).await {
                Ok(()) => {
                    self.set_phase(ConnectionPhase::Disposed);
                    tracing::info!("Transaction stream disposed");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Transaction stream connection lost");
                    self.set_phase(ConnectionPhase::Closed);

                    if let Some(delay) = policy.next_delay() {
                        tracing::info!(
                            attempt = policy.attempt_count(),
                            delay_ms = delay.as_millis(),
                            "Reconnecting to transaction stream"
                        );
                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                self.set_phase(ConnectionPhase::Disposed);
                                tracing::info!("Transaction stream disposed during reconnect delay");
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
        tracing::info!(url = %self.config.url, "Connecting to transaction stream");
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        policy.reset();
        self.set_phase(ConnectionPhase::Open);
        tracing::info!("Transaction stream connected");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match self.codec.decode_transactions(&text) {
                                Ok(events) => self.store.append_transactions(events),
                                Err(e) => {
                                    // Non-fatal: drop the frame, keep the connection.
                                    tracing::warn!(error = %e, "Dropping malformed transaction frame");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Transaction stream received close frame");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_exits_immediately_when_disposed() {
        let cancel = CancellationToken::new();
        let client = Arc::new(TxStreamClient::new(
            TxStreamConfig::new("ws://127.0.0.1:1/ws/tx"),
            Arc::new(TelemetryStore::with_defaults()),
            cancel,
        ));
        client.dispose();

        client.clone().run().await.unwrap();
        assert_eq!(client.phase(), ConnectionPhase::Disposed);
    }

    #[tokio::test]
    async fn failed_connects_do_not_touch_connectivity() {
        let store = Arc::new(TelemetryStore::with_defaults());
        let config = TxStreamConfig {
            url: "ws://127.0.0.1:1/ws/tx".to_string(),
            retry_delay: Duration::from_millis(1),
            max_attempts: 2,
        };
        let client = Arc::new(TxStreamClient::new(
            config,
            Arc::clone(&store),
            CancellationToken::new(),
        ));

        let result = client.run().await;
        assert!(matches!(
            result,
            Err(StreamError::MaxReconnectAttemptsExceeded)
        ));
        // The transaction stream never writes the connectivity flag or
        // the session baseline.
        assert!(!store.snapshot().is_connected);
        assert_eq!(store.snapshot().session_baseline, None);
    }
}
