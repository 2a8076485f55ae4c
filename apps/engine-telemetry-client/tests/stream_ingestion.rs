//! Stream Ingestion Integration Tests
//!
//! Runs the stream clients against an in-process WebSocket server and
//! verifies the full path: frame -> codec -> store -> derived signals,
//! including baseline capture across reconnects.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::any;
use tokio_util::sync::CancellationToken;

use engine_telemetry_client::{
    ConnectionPhase, DerivedSignals, MetricsStreamClient, MetricsStreamConfig, ReconnectConfig,
    TelemetryStore, TxStreamClient, TxStreamConfig,
};

/// Scripted frames per connection, shared with the fixture handler.
#[derive(Clone)]
struct Script {
    /// Frame batches, one entry per accepted connection. A connection sends
    /// its frames and then either holds the socket open (last entry) or
    /// closes it.
    connections: Arc<Vec<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
}

impl Script {
    fn new(connections: Vec<Vec<String>>) -> Self {
        Self {
            connections: Arc::new(connections),
            accepted: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(script): State<Script>) -> Response {
    ws.on_upgrade(move |socket| run_script(socket, script))
}

async fn run_script(mut socket: WebSocket, script: Script) {
    let index = script.accepted.fetch_add(1, Ordering::SeqCst);
    let is_last = index + 1 >= script.connections.len();
    let frames = script
        .connections
        .get(index.min(script.connections.len() - 1))
        .cloned()
        .unwrap_or_default();

    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }

    if is_last {
        // Hold the socket open until the client goes away.
        while socket.recv().await.is_some() {}
    }
    // Otherwise drop the socket, closing the connection.
}

async fn spawn_server(script: Script) -> SocketAddr {
    let app = Router::new()
        .route("/ws/metrics", any(ws_handler))
        .route("/ws/tx", any(ws_handler))
        .with_state(script);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(100),
        multiplier: 1.5,
        jitter_factor: 0.0,
        max_attempts: 0,
    }
}

async fn wait_for(store: &TelemetryStore, predicate: impl Fn(&TelemetryStore) -> bool) {
    let mut rx = store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !predicate(store) {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("store did not reach expected state in time");
}

// =============================================================================
// Metrics Stream
// =============================================================================

#[tokio::test]
async fn metrics_frames_merge_and_capture_baseline() {
    let script = Script::new(vec![vec![
        r#"{"processed":100,"queue_len":5,"worker_pool":32}"#.to_string(),
        r#"{"processed":150}"#.to_string(),
    ]]);
    let addr = spawn_server(script.clone()).await;

    let store = Arc::new(TelemetryStore::with_defaults());
    let cancel = CancellationToken::new();
    let client = Arc::new(MetricsStreamClient::new(
        MetricsStreamConfig {
            url: format!("ws://{addr}/ws/metrics"),
            reconnect: fast_reconnect(),
        },
        Arc::clone(&store),
        cancel.clone(),
    ));
    let handle = tokio::spawn(client.clone().run());

    wait_for(&store, |s| s.snapshot().processed == 150).await;

    let snapshot = store.snapshot();
    // Baseline is the first observed processed value, unchanged by later frames.
    assert_eq!(snapshot.session_baseline, Some(100));
    // Fields absent from the second frame are retained.
    assert_eq!(snapshot.queue_len, 5);
    assert_eq!(snapshot.worker_pool, 32);
    assert!(snapshot.is_connected);
    assert_eq!(client.phase(), ConnectionPhase::Open);

    let signals = DerivedSignals::compute(&snapshot);
    assert_eq!(signals.session_processed, 50);

    client.dispose();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(client.phase(), ConnectionPhase::Disposed);

    // Teardown counts as a disconnect: flag down, baseline cleared.
    let after = store.snapshot();
    assert!(!after.is_connected);
    assert_eq!(after.session_baseline, None);
}

#[tokio::test]
async fn reconnect_starts_a_fresh_session_baseline() {
    // First connection delivers one frame then closes; the second delivers
    // a frame with a different counter and stays up.
    let script = Script::new(vec![
        vec![r#"{"processed":100}"#.to_string()],
        vec![r#"{"processed":500}"#.to_string()],
    ]);
    let addr = spawn_server(script.clone()).await;

    let store = Arc::new(TelemetryStore::with_defaults());
    let cancel = CancellationToken::new();
    let client = Arc::new(MetricsStreamClient::new(
        MetricsStreamConfig {
            url: format!("ws://{addr}/ws/metrics"),
            reconnect: fast_reconnect(),
        },
        Arc::clone(&store),
        cancel.clone(),
    ));
    tokio::spawn(client.clone().run());

    wait_for(&store, |s| s.snapshot().processed == 500).await;

    // The disconnect cleared the old baseline; the new session's first
    // frame became the new zero-point.
    assert_eq!(store.snapshot().session_baseline, Some(500));
    assert!(script.accepted() >= 2);

    client.dispose();
}

#[tokio::test]
async fn malformed_metrics_frame_does_not_drop_the_connection() {
    let script = Script::new(vec![vec![
        "not json at all".to_string(),
        r#"{"processed":42}"#.to_string(),
    ]]);
    let addr = spawn_server(script.clone()).await;

    let store = Arc::new(TelemetryStore::with_defaults());
    let client = Arc::new(MetricsStreamClient::new(
        MetricsStreamConfig {
            url: format!("ws://{addr}/ws/metrics"),
            reconnect: fast_reconnect(),
        },
        Arc::clone(&store),
        CancellationToken::new(),
    ));
    tokio::spawn(client.clone().run());

    wait_for(&store, |s| s.snapshot().processed == 42).await;

    // The good frame arrived on the same connection as the bad one.
    assert_eq!(script.accepted(), 1);
    client.dispose();
}

// =============================================================================
// Transaction Stream
// =============================================================================

fn tx_json(id: u64) -> String {
    format!(r#"{{"id":{id},"from":1,"to":2,"amount":1,"submitted_by":"t","ts":{id}}}"#)
}

#[tokio::test]
async fn tx_stream_appends_single_events_and_batches() {
    let batch = format!(
        r#"[{},{{"garbage":true}},{}]"#,
        tx_json(1),
        tx_json(3)
    );
    let script = Script::new(vec![vec![tx_json(7), batch]]);
    let addr = spawn_server(script.clone()).await;

    let store = Arc::new(TelemetryStore::with_defaults());
    let client = Arc::new(TxStreamClient::new(
        TxStreamConfig {
            url: format!("ws://{addr}/ws/tx"),
            retry_delay: Duration::from_millis(20),
            max_attempts: 0,
        },
        Arc::clone(&store),
        CancellationToken::new(),
    ));
    tokio::spawn(client.clone().run());

    wait_for(&store, |s| s.transaction_count() == 3).await;

    // Single event first, then the two well-formed batch elements in
    // array order; the malformed element was dropped silently.
    let ids: Vec<u64> = store.transactions().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![7, 1, 3]);

    // The transaction stream never owns the connectivity flag.
    assert!(!store.snapshot().is_connected);

    client.dispose();
}

#[tokio::test]
async fn tx_stream_reconnects_after_close() {
    let script = Script::new(vec![vec![tx_json(1)], vec![tx_json(2)]]);
    let addr = spawn_server(script.clone()).await;

    let store = Arc::new(TelemetryStore::with_defaults());
    let client = Arc::new(TxStreamClient::new(
        TxStreamConfig {
            url: format!("ws://{addr}/ws/tx"),
            retry_delay: Duration::from_millis(20),
            max_attempts: 0,
        },
        Arc::clone(&store),
        CancellationToken::new(),
    ));
    tokio::spawn(client.clone().run());

    wait_for(&store, |s| s.transaction_count() == 2).await;

    let ids: Vec<u64> = store.transactions().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(script.accepted() >= 2);

    client.dispose();
}
