//! Engine Control API Client
//!
//! Fire-and-forget control requests to the engine's HTTP API: submit load,
//! resize the worker pool, reset counters, change the synthetic latency.
//!
//! No retry logic lives here. Errors are returned to the immediate caller,
//! with rate limiting (HTTP 429) surfaced distinctly from generic HTTP
//! failure so the caller can present it differently.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

/// Default request timeout for control calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the control API.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The engine rejected the request because its queue is saturated.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Message from the engine's 429 response body.
        message: String,
    },

    /// Non-2xx, non-429 response.
    #[error("HTTP error: status {status}")]
    Http {
        /// Response status code.
        status: u16,
    },

    /// Network or protocol failure.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ControlError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Body shape of the engine's 429 responses.
#[derive(Debug, Deserialize)]
struct RateLimitBody {
    message: String,
}

/// HTTP client for the engine control API.
#[derive(Debug, Clone)]
pub struct ControlClient {
    client: reqwest::Client,
    base_url: String,
}

impl ControlClient {
    /// Create a client for the engine at `base_url` (e.g. `http://localhost:8080`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ControlError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ControlError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Submit a batch of `count` synthetic transactions.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::RateLimited`] when the engine's queue cannot
    /// accept the batch, or a generic error for other failures.
    pub async fn submit(&self, count: u64) -> Result<(), ControlError> {
        self.post("/submit", Some(json!({ "count": count }))).await
    }

    /// Resize the engine's worker pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn resize(&self, workers: u64) -> Result<(), ControlError> {
        self.post("/resize", Some(json!({ "workers": workers })))
            .await
    }

    /// Reset the engine's counters and queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn reset(&self) -> Result<(), ControlError> {
        self.post("/reset", None).await
    }

    /// Set the engine's synthetic per-transaction latency, in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn set_latency(&self, latency_ms: u64) -> Result<(), ControlError> {
        self.post("/latency", Some(json!({ "latency": latency_ms })))
            .await
    }

    async fn post(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), ControlError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let message = response
                .json::<RateLimitBody>()
                .await
                .map_or_else(|_| "rate limited".to_string(), |body| body.message);
            return Err(ControlError::RateLimited { message });
        }

        if !status.is_success() {
            return Err(ControlError::Http {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_stripped_from_base_url() {
        let client = ControlClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn rate_limited_display_carries_message() {
        let err = ControlError::RateLimited {
            message: "queue full".to_string(),
        };
        assert_eq!(err.to_string(), "rate limited: queue full");
    }

    #[test]
    fn http_error_display_carries_status() {
        let err = ControlError::Http { status: 503 };
        assert_eq!(err.to_string(), "HTTP error: status 503");
    }
}
