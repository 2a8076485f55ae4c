//! Derived Signal Layer
//!
//! Pure projections over a [`MetricsSnapshot`]. Nothing here holds state;
//! consumers recompute on every store notification.

use super::state::MetricsSnapshot;

/// Queue pressure above which the engine is considered congested, percent.
pub const CONGESTION_THRESHOLD_PCT: f64 = 80.0;

/// Queue occupancy as a percentage of capacity.
///
/// Returns `0.0` when capacity is zero rather than failing.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn queue_pressure(snapshot: &MetricsSnapshot) -> f64 {
    if snapshot.queue_cap == 0 {
        return 0.0;
    }
    (snapshot.queue_len as f64 / snapshot.queue_cap as f64) * 100.0
}

/// Whether queue pressure exceeds the congestion threshold.
///
/// Strictly greater: a pressure of exactly 80% is not congested.
#[must_use]
pub fn is_congested(snapshot: &MetricsSnapshot) -> bool {
    queue_pressure(snapshot) > CONGESTION_THRESHOLD_PCT
}

/// Transactions processed since the current session's baseline.
///
/// Returns `0` when no baseline is set, and floors transient negative
/// deltas (e.g. a counter reset mid-session) at zero.
#[must_use]
pub fn session_processed(snapshot: &MetricsSnapshot) -> i64 {
    snapshot
        .session_baseline
        .map_or(0, |baseline| (snapshot.processed - baseline).max(0))
}

/// All derived signals, computed together for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSignals {
    /// Queue occupancy, percent.
    pub queue_pressure: f64,
    /// Whether the queue is congested.
    pub is_congested: bool,
    /// Session-relative processed count.
    pub session_processed: i64,
}

impl DerivedSignals {
    /// Compute all signals from a snapshot.
    #[must_use]
    pub fn compute(snapshot: &MetricsSnapshot) -> Self {
        Self {
            queue_pressure: queue_pressure(snapshot),
            is_congested: is_congested(snapshot),
            session_processed: session_processed(snapshot),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn snapshot(queue_len: i64, queue_cap: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len,
            queue_cap,
            ..MetricsSnapshot::default()
        }
    }

    #[test_case(0, 0, 0.0; "zero capacity guards division")]
    #[test_case(5_000_000, 10_000_000, 50.0; "half full")]
    #[test_case(10_000_000, 10_000_000, 100.0; "full")]
    #[test_case(0, 10_000_000, 0.0; "empty")]
    fn pressure_cases(queue_len: i64, queue_cap: i64, expected: f64) {
        let pressure = queue_pressure(&snapshot(queue_len, queue_cap));
        assert!((pressure - expected).abs() < f64::EPSILON);
    }

    #[test_case(80, 100, false; "exactly at threshold is not congested")]
    #[test_case(81, 100, true; "above threshold")]
    #[test_case(79, 100, false; "below threshold")]
    #[test_case(100, 0, false; "zero capacity never congested")]
    fn congestion_boundary(queue_len: i64, queue_cap: i64, expected: bool) {
        assert_eq!(is_congested(&snapshot(queue_len, queue_cap)), expected);
    }

    #[test]
    fn session_processed_without_baseline_is_zero() {
        let s = MetricsSnapshot {
            processed: 1_000,
            session_baseline: None,
            ..MetricsSnapshot::default()
        };
        assert_eq!(session_processed(&s), 0);
    }

    #[test]
    fn session_processed_relative_to_baseline() {
        let s = MetricsSnapshot {
            processed: 1_000,
            session_baseline: Some(400),
            ..MetricsSnapshot::default()
        };
        assert_eq!(session_processed(&s), 600);
    }

    #[test]
    fn session_processed_floors_negative_delta() {
        // Counter reset mid-session: processed drops below the baseline.
        let s = MetricsSnapshot {
            processed: 10,
            session_baseline: Some(400),
            ..MetricsSnapshot::default()
        };
        assert_eq!(session_processed(&s), 0);
    }

    #[test]
    fn compute_bundles_all_signals() {
        let s = MetricsSnapshot {
            processed: 150,
            session_baseline: Some(100),
            queue_len: 9_000_000,
            queue_cap: 10_000_000,
            ..MetricsSnapshot::default()
        };

        let signals = DerivedSignals::compute(&s);
        assert!((signals.queue_pressure - 90.0).abs() < f64::EPSILON);
        assert!(signals.is_congested);
        assert_eq!(signals.session_processed, 50);
    }
}
