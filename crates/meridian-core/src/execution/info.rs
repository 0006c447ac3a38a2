use std::{net::SocketAddr, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{cluster::Host, errors::HostFailure, types::ConsistencyLevel};

/// Server-side trace of a request, returned when the statement enabled tracing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTrace {
    pub trace_id: Uuid,
    pub coordinator: SocketAddr,
    #[serde(default)]
    pub duration_micros: Option<u64>,
}

impl QueryTrace {
    #[must_use]
    pub fn new(coordinator: SocketAddr) -> Self {
        Self { trace_id: Uuid::new_v4(), coordinator, duration_micros: None }
    }
}

/// Record of how a finished request was executed.
///
/// `tried_hosts` lists every attempt in order, including repeated attempts on the same host.
/// A result produced by an `Ignore` decision carries the suppressed failure, which is what
/// [`is_degraded`](Self::is_degraded) reports.
#[derive(Debug, Clone)]
pub struct ExecutionInfo {
    tried_hosts: Vec<Arc<Host>>,
    achieved_consistency: ConsistencyLevel,
    retry_count: u32,
    trace: Option<QueryTrace>,
    suppressed: Option<HostFailure>,
}

impl ExecutionInfo {
    #[must_use]
    pub fn new(tried_hosts: Vec<Arc<Host>>, achieved_consistency: ConsistencyLevel) -> Self {
        Self { tried_hosts, achieved_consistency, retry_count: 0, trace: None, suppressed: None }
    }

    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: Option<QueryTrace>) -> Self {
        self.trace = trace;
        self
    }

    /// Marks the result as degraded by a suppressed failure.
    #[must_use]
    pub fn with_suppressed(mut self, failure: HostFailure) -> Self {
        self.suppressed = Some(failure);
        self
    }

    #[must_use]
    pub fn tried_hosts(&self) -> &[Arc<Host>] {
        &self.tried_hosts
    }

    #[must_use]
    pub fn tried_addresses(&self) -> Vec<SocketAddr> {
        self.tried_hosts.iter().map(|h| h.address()).collect()
    }

    /// The host that produced the final answer.
    #[must_use]
    pub fn queried_host(&self) -> Option<&Arc<Host>> {
        self.tried_hosts.last()
    }

    /// Consistency level of the last attempt. Differs from the requested level when a retry
    /// policy downgraded it.
    #[must_use]
    pub const fn achieved_consistency(&self) -> ConsistencyLevel {
        self.achieved_consistency
    }

    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    #[must_use]
    pub fn trace(&self) -> Option<&QueryTrace> {
        self.trace.as_ref()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.suppressed.is_some()
    }

    #[must_use]
    pub fn suppressed_failure(&self) -> Option<&HostFailure> {
        self.suppressed.as_ref()
    }
}
