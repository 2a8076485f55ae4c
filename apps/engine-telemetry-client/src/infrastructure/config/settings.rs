//! Client Configuration Settings
//!
//! Settings for the telemetry client, loaded from environment variables.
//! Everything has a sensible local-engine default; no variable is required.

use std::time::Duration;

/// Default engine HTTP base URL.
const DEFAULT_HTTP_BASE_URL: &str = "http://localhost:8080";

/// Default engine WebSocket base URL.
const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8080";

/// Stream connection settings.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Initial metrics-stream reconnection delay (and reset floor).
    pub reconnect_delay_initial: Duration,
    /// Maximum metrics-stream reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Metrics-stream reconnection delay growth factor.
    pub reconnect_delay_multiplier: f64,
    /// Fixed transaction-stream retry delay.
    pub tx_retry_delay: Duration,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_initial: Duration::from_millis(500),
            reconnect_delay_max: Duration::from_secs(5),
            reconnect_delay_multiplier: 1.5,
            tx_retry_delay: Duration::from_secs(1),
            max_reconnect_attempts: 0, // Unlimited
        }
    }
}

/// Transaction log settings.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Bound on the transaction log.
    pub transaction_log_capacity: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            transaction_log_capacity: 100,
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Engine HTTP base URL (control API).
    pub http_base_url: String,
    /// Engine WebSocket base URL (stream channels).
    pub ws_base_url: String,
    /// Stream connection settings.
    pub stream: StreamSettings,
    /// Transaction log settings.
    pub log: LogSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http_base_url: DEFAULT_HTTP_BASE_URL.to_string(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_string(),
            stream: StreamSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = StreamSettings::default();

        let http_base_url =
            std::env::var("PULSE_ENGINE_HTTP_URL").unwrap_or_else(|_| DEFAULT_HTTP_BASE_URL.to_string());
        let ws_base_url =
            std::env::var("PULSE_ENGINE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_BASE_URL.to_string());

        let stream = StreamSettings {
            reconnect_delay_initial: parse_env_duration_millis(
                "PULSE_RECONNECT_DELAY_INITIAL_MS",
                defaults.reconnect_delay_initial,
            ),
            reconnect_delay_max: parse_env_duration_millis(
                "PULSE_RECONNECT_DELAY_MAX_MS",
                defaults.reconnect_delay_max,
            ),
            reconnect_delay_multiplier: parse_env_f64(
                "PULSE_RECONNECT_DELAY_MULTIPLIER",
                defaults.reconnect_delay_multiplier,
            ),
            tx_retry_delay: parse_env_duration_millis(
                "PULSE_TX_RETRY_DELAY_MS",
                defaults.tx_retry_delay,
            ),
            max_reconnect_attempts: parse_env_u32(
                "PULSE_MAX_RECONNECT_ATTEMPTS",
                defaults.max_reconnect_attempts,
            ),
        };

        let log = LogSettings {
            transaction_log_capacity: parse_env_usize(
                "PULSE_TX_LOG_CAPACITY",
                LogSettings::default().transaction_log_capacity,
            ),
        };

        Self {
            http_base_url,
            ws_base_url,
            stream,
            log,
        }
    }

    /// WebSocket URL of the metrics channel.
    #[must_use]
    pub fn metrics_stream_url(&self) -> String {
        format!("{}/ws/metrics", self.ws_base_url.trim_end_matches('/'))
    }

    /// WebSocket URL of the transaction channel.
    #[must_use]
    pub fn tx_stream_url(&self) -> String {
        format!("{}/ws/tx", self.ws_base_url.trim_end_matches('/'))
    }
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
