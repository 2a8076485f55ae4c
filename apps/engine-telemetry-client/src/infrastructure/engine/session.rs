//! Stream Session Primitives
//!
//! Connection lifecycle types shared by the metrics and transaction
//! stream clients.

/// Lifecycle of one logical stream connection.
///
/// A session cycles `Idle -> Connecting -> Open -> Closed -> Connecting ...`
/// until disposed. `Disposed` is terminal and reached only by explicit
/// caller teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// Not yet started.
    #[default]
    Idle,
    /// Dialing the transport.
    Connecting,
    /// Connected; frames are flowing.
    Open,
    /// Transport lost; a reconnect is pending (or attempts are spent).
    Closed,
    /// Torn down by the caller; no further reconnects.
    Disposed,
}

/// Errors from a stream session.
///
/// Transport failures are contained inside the session's run loop and
/// drive reconnection; the only errors that escape are teardown results.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Remote closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Maximum reconnection attempts exceeded.
    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,
}
