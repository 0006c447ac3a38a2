//! # Error Metrics
//!
//! Per-kind failure counters shared by every in-flight request.
//!
//! ## Hot Path (Lock-Free)
//!
//! `ErrorMetrics` keeps one `AtomicU64` per failure kind for errors, retries and ignores.
//! Increments never lock and never allocate. Each increment is mirrored to the `metrics`
//! facade, so whichever recorder the process installs (the CLI installs the Prometheus
//! exporter) sees the same counts.
//!
//! ## Injection
//!
//! Counters are not ambient globals: a session is handed an `Arc<ErrorMetrics>` and tests build
//! isolated instances. Several sessions may share one instance.
//!
//! | Metric | Labels | Meaning |
//! |--------|--------|---------|
//! | `meridian_request_errors_total` | `kind` | failures observed, retried or not |
//! | `meridian_request_retries_total` | `kind` | retry decisions taken after a failure |
//! | `meridian_request_ignores_total` | `kind` | failures suppressed into degraded results |
//! | `meridian_no_host_available_total` | | requests that ran out of hosts |
//! | `meridian_requests_cancelled_total` | | requests cancelled by their caller |
//! | `meridian_host_state` | `host` | 0 up, 0.5 suspected, 1 down |
//! | `meridian_host_transitions_total` | `state` | hosts entering each health state |

use crate::{
    cluster::HostState,
    errors::FailureKind,
};
use metrics::{counter, gauge};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
};

pub const REQUEST_ERRORS: &str = "meridian_request_errors_total";
pub const REQUEST_RETRIES: &str = "meridian_request_retries_total";
pub const REQUEST_IGNORES: &str = "meridian_request_ignores_total";
pub const NO_HOST_AVAILABLE: &str = "meridian_no_host_available_total";
pub const REQUESTS_CANCELLED: &str = "meridian_requests_cancelled_total";
pub const HOST_STATE: &str = "meridian_host_state";
pub const HOST_TRANSITIONS: &str = "meridian_host_transitions_total";

pub trait MetricsState {
    fn as_metric_str(&self) -> &'static str;
    fn as_gauge_value(&self) -> f64;
}

impl MetricsState for HostState {
    fn as_metric_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Suspected => "suspected",
        }
    }

    fn as_gauge_value(&self) -> f64 {
        match self {
            Self::Up => 0.0,
            Self::Suspected => 0.5,
            Self::Down => 1.0,
        }
    }
}

const KINDS: usize = FailureKind::ALL.len();

/// Process-wide failure counters keyed by [`FailureKind`].
///
/// Counters are monotonic. There is no reset.
#[derive(Debug)]
pub struct ErrorMetrics {
    errors: [AtomicU64; KINDS],
    retries: [AtomicU64; KINDS],
    ignores: [AtomicU64; KINDS],
}

impl Default for ErrorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            errors: std::array::from_fn(|_| AtomicU64::new(0)),
            retries: std::array::from_fn(|_| AtomicU64::new(0)),
            ignores: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Counts one observed failure. Called exactly once per failed attempt.
    pub fn record_error(&self, kind: FailureKind) {
        self.errors[kind.index()].fetch_add(1, Ordering::Relaxed);
        counter!(REQUEST_ERRORS, "kind" => kind.as_str()).increment(1);
    }

    pub fn record_retry(&self, kind: FailureKind) {
        self.retries[kind.index()].fetch_add(1, Ordering::Relaxed);
        counter!(REQUEST_RETRIES, "kind" => kind.as_str()).increment(1);
    }

    pub fn record_ignore(&self, kind: FailureKind) {
        self.ignores[kind.index()].fetch_add(1, Ordering::Relaxed);
        counter!(REQUEST_IGNORES, "kind" => kind.as_str()).increment(1);
    }

    #[must_use]
    pub fn errors(&self, kind: FailureKind) -> u64 {
        self.errors[kind.index()].load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn retries(&self, kind: FailureKind) -> u64 {
        self.retries[kind.index()].load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn ignores(&self, kind: FailureKind) -> u64 {
        self.ignores[kind.index()].load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.errors.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Point-in-time copy of every counter. Kinds are read independently, so a snapshot taken
    /// under load may straddle concurrent increments.
    #[must_use]
    pub fn snapshot(&self) -> ErrorMetricsSnapshot {
        let collect = |counters: &[AtomicU64; KINDS]| {
            FailureKind::ALL
                .iter()
                .map(|kind| (*kind, counters[kind.index()].load(Ordering::Relaxed)))
                .collect::<BTreeMap<_, _>>()
        };
        ErrorMetricsSnapshot {
            errors: collect(&self.errors),
            retries: collect(&self.retries),
            ignores: collect(&self.ignores),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMetricsSnapshot {
    pub errors: BTreeMap<FailureKind, u64>,
    pub retries: BTreeMap<FailureKind, u64>,
    pub ignores: BTreeMap<FailureKind, u64>,
}

/// Terminal outcomes that are not failures of a single attempt; facade only.
pub fn record_no_host_available() {
    counter!(NO_HOST_AVAILABLE).increment(1);
}

pub fn record_cancelled() {
    counter!(REQUESTS_CANCELLED).increment(1);
}

pub fn record_host_state(address: SocketAddr, state: HostState) {
    gauge!(HOST_STATE, "host" => address.to_string()).set(state.as_gauge_value());
    counter!(HOST_TRANSITIONS, "state" => state.as_metric_str()).increment(1);
}
