//! Shared State Store
//!
//! Process-wide view of the latest known engine metrics plus a bounded log
//! of observed transactions. The store is explicitly owned: callers create
//! a `TelemetryStore`, wrap it in an `Arc`, and hand it to each stream
//! session. All mutation flows through the store's own methods, so each
//! field keeps a single logical writer (metrics fields by the metrics
//! session, the log by the transaction session).
//!
//! Consumers observe changes through a `watch`-based revision counter:
//! every mutation bumps the revision synchronously, and readers recompute
//! whatever derived view they need from `snapshot()`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Default bound on the transaction log.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Default engine queue capacity, used until the first update arrives.
const DEFAULT_QUEUE_CAP: i64 = 10_000_000;

// =============================================================================
// Data Model
// =============================================================================

/// Merged view of the engine's current metrics.
///
/// Counter fields mirror the engine's wire names. `session_baseline` and
/// `is_connected` are client-side fields maintained by the store itself and
/// never arrive over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// OS threads available to the engine.
    pub cpu_threads: i64,
    /// Live goroutine count reported by the engine.
    pub goroutines: i64,
    /// Configured worker pool size.
    pub worker_pool: i64,
    /// Total transactions processed since engine start (or reset).
    pub processed: i64,
    /// Total transactions that failed (insufficient balance).
    pub failed: i64,
    /// Current queue backlog.
    pub queue_len: i64,
    /// Queue capacity.
    pub queue_cap: i64,
    /// Value of `processed` when the current connection opened.
    pub session_baseline: Option<i64>,
    /// Whether the metrics stream is currently connected.
    pub is_connected: bool,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            cpu_threads: 0,
            goroutines: 0,
            worker_pool: 0,
            processed: 0,
            failed: 0,
            queue_len: 0,
            queue_cap: DEFAULT_QUEUE_CAP,
            session_baseline: None,
            is_connected: false,
        }
    }
}

/// Partial metrics update as received from the metrics channel.
///
/// Every field is optional: fields present in a frame overwrite the
/// snapshot, fields absent retain their prior value. Unknown fields in the
/// frame are ignored by the deserializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsUpdate {
    /// OS threads available to the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_threads: Option<i64>,
    /// Live goroutine count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goroutines: Option<i64>,
    /// Configured worker pool size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_pool: Option<i64>,
    /// Total processed transactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<i64>,
    /// Total failed transactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<i64>,
    /// Current queue backlog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_len: Option<i64>,
    /// Queue capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_cap: Option<i64>,
}

/// One ledger transfer observed by the engine. Immutable after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Engine-assigned transaction id.
    pub id: u64,
    /// Source account.
    pub from: u32,
    /// Destination account.
    pub to: u32,
    /// Transfer amount.
    pub amount: i64,
    /// Submitter identity (client address as seen by the engine).
    pub submitted_by: String,
    /// Submission timestamp, unix milliseconds.
    pub ts: i64,
}

// =============================================================================
// Store
// =============================================================================

struct StoreState {
    snapshot: MetricsSnapshot,
    log: VecDeque<TransactionEvent>,
}

/// Shared state store for the telemetry client.
///
/// # Example
///
/// ```rust
/// use engine_telemetry_client::domain::state::{MetricsUpdate, TelemetryStore};
///
/// let store = TelemetryStore::with_defaults();
/// store.merge_metrics(&MetricsUpdate {
///     processed: Some(42),
///     ..MetricsUpdate::default()
/// });
/// assert_eq!(store.snapshot().processed, 42);
/// assert_eq!(store.snapshot().session_baseline, Some(42));
/// ```
pub struct TelemetryStore {
    state: parking_lot::RwLock<StoreState>,
    log_capacity: usize,
    revision: watch::Sender<u64>,
}

impl TelemetryStore {
    /// Create a store with the given transaction log capacity.
    #[must_use]
    pub fn new(log_capacity: usize) -> Self {
        Self {
            state: parking_lot::RwLock::new(StoreState {
                snapshot: MetricsSnapshot::default(),
                log: VecDeque::with_capacity(log_capacity),
            }),
            log_capacity,
            revision: watch::channel(0).0,
        }
    }

    /// Create a store with the default log capacity.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }

    /// Get the current merged metrics view.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state.read().snapshot.clone()
    }

    /// Shallow-merge a partial update into the snapshot.
    ///
    /// Fields present in the update overwrite the snapshot; absent fields
    /// retain their prior value. If no session baseline is set and the
    /// update carries `processed`, that value is captured as the baseline
    /// before merging, so the first observed count becomes the session
    /// zero-point. Receiving any update implies the stream is live, so
    /// `is_connected` is always set.
    pub fn merge_metrics(&self, update: &MetricsUpdate) {
        {
            let mut state = self.state.write();
            let snapshot = &mut state.snapshot;

            if snapshot.session_baseline.is_none()
                && let Some(processed) = update.processed
            {
                snapshot.session_baseline = Some(processed);
            }

            merge_field(&mut snapshot.cpu_threads, update.cpu_threads);
            merge_field(&mut snapshot.goroutines, update.goroutines);
            merge_field(&mut snapshot.worker_pool, update.worker_pool);
            merge_field(&mut snapshot.processed, update.processed);
            merge_field(&mut snapshot.failed, update.failed);
            merge_field(&mut snapshot.queue_len, update.queue_len);
            merge_field(&mut snapshot.queue_cap, update.queue_cap);
            snapshot.is_connected = true;
        }
        self.bump();
    }

    /// Mark the metrics stream connected without touching any counter.
    pub fn set_connected(&self) {
        self.state.write().snapshot.is_connected = true;
        self.bump();
    }

    /// Mark the metrics stream disconnected and clear the session baseline,
    /// so the next connection starts a fresh session.
    pub fn set_disconnected(&self) {
        {
            let mut state = self.state.write();
            state.snapshot.is_connected = false;
            state.snapshot.session_baseline = None;
        }
        self.bump();
    }

    /// Append one transaction to the log, evicting from the front if the
    /// bound is exceeded. Eviction is defined behavior, not a fault.
    pub fn append_transaction(&self, event: TransactionEvent) {
        {
            let mut state = self.state.write();
            push_bounded(&mut state.log, event, self.log_capacity);
        }
        self.bump();
    }

    /// Append a batch of transactions in order, with a single notification.
    pub fn append_transactions<I>(&self, events: I)
    where
        I: IntoIterator<Item = TransactionEvent>,
    {
        let mut appended = false;
        {
            let mut state = self.state.write();
            for event in events {
                push_bounded(&mut state.log, event, self.log_capacity);
                appended = true;
            }
        }
        if appended {
            self.bump();
        }
    }

    /// Get the transaction log in arrival order (oldest first).
    #[must_use]
    pub fn transactions(&self) -> Vec<TransactionEvent> {
        self.state.read().log.iter().cloned().collect()
    }

    /// Get the current transaction log length.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.state.read().log.len()
    }

    /// Get the configured log bound.
    #[must_use]
    pub const fn log_capacity(&self) -> usize {
        self.log_capacity
    }

    /// Subscribe to store changes.
    ///
    /// The receiver yields a monotonically increasing revision; readers
    /// call `snapshot()` / `transactions()` to pick up the new state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

fn merge_field(target: &mut i64, value: Option<i64>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn push_bounded(log: &mut VecDeque<TransactionEvent>, event: TransactionEvent, capacity: usize) {
    log.push_back(event);
    while log.len() > capacity {
        log.pop_front();
    }
}

// =============================================================================
// Tests
// =============================================================================
