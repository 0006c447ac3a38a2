//! Test Helper Functions and Utilities
//!
//! Common helpers for creating hosts, failures and sessions.

use std::{net::SocketAddr, sync::Arc};

use meridian_core::{
    cluster::Host,
    errors::RequestFailure,
    execution::Transport,
    policies::{LoadBalancingPolicy, RetryDecision, RetryPolicy, SortedPolicy},
    types::{ConsistencyLevel, Statement, WriteType},
    Session,
};

/// Address `127.0.0.N:9042`.
#[must_use]
pub fn addr(n: u8) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, n], 9042))
}

#[must_use]
pub fn addrs(ns: &[u8]) -> Vec<SocketAddr> {
    ns.iter().copied().map(addr).collect()
}

#[must_use]
pub fn host(n: u8) -> Host {
    Host::new(addr(n))
}

#[must_use]
pub fn dc_host(n: u8, datacenter: &str) -> Host {
    Host::new(addr(n)).with_datacenter(datacenter)
}

#[must_use]
pub fn unavailable() -> RequestFailure {
    RequestFailure::Unavailable { consistency: ConsistencyLevel::One, required: 1, alive: 0 }
}

#[must_use]
pub fn read_timeout(received: u32, data_retrieved: bool) -> RequestFailure {
    RequestFailure::ReadTimeout {
        consistency: ConsistencyLevel::Quorum,
        required: 2,
        received,
        data_retrieved,
    }
}

#[must_use]
pub fn write_timeout(write_type: WriteType, received: u32) -> RequestFailure {
    RequestFailure::WriteTimeout {
        consistency: ConsistencyLevel::Quorum,
        write_type,
        required: 2,
        received,
    }
}

/// Session over hosts `127.0.0.N` with the given policies.
///
/// # Panics
///
/// Panics if the session cannot be built.
#[must_use]
pub fn session_with(
    transport: &Arc<impl Transport + 'static>,
    load_balancing: Arc<dyn LoadBalancingPolicy>,
    retry: Arc<dyn RetryPolicy>,
    hosts: &[u8],
) -> Session {
    Session::builder()
        .transport(Arc::clone(transport) as Arc<dyn Transport>)
        .load_balancing_policy(load_balancing)
        .retry_policy(retry)
        .contact_points(hosts.iter().copied().map(host))
        .build()
        .expect("session should build")
}

/// Session with a deterministic address-ordered plan and the given retry policy.
///
/// # Panics
///
/// Panics if the session cannot be built.
#[must_use]
pub fn sorted_session(
    transport: &Arc<impl Transport + 'static>,
    retry: Arc<dyn RetryPolicy>,
    hosts: &[u8],
) -> Session {
    session_with(transport, Arc::new(SortedPolicy::new()), retry, hosts)
}

/// Moves to the next host on `Unavailable` and rethrows timeouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TryNextHostOnUnavailable;

impl RetryPolicy for TryNextHostOnUnavailable {
    fn on_unavailable(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_replicas: u32,
        _alive_replicas: u32,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::try_next_host(None)
    }

    fn on_read_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_responses: u32,
        _received_responses: u32,
        _data_retrieved: bool,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::rethrow()
    }

    fn on_write_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _write_type: WriteType,
        _required_acks: u32,
        _received_acks: u32,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::rethrow()
    }
}

/// Returns the same decision for every server-classified failure, up to `limit` retries, then
/// rethrows.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision {
    pub decision: RetryDecision,
    pub limit: u32,
}

impl FixedDecision {
    #[must_use]
    pub const fn new(decision: RetryDecision) -> Self {
        Self { decision, limit: u32::MAX }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn decide(&self, retry_count: u32) -> RetryDecision {
        if retry_count >= self.limit {
            RetryDecision::rethrow()
        } else {
            self.decision
        }
    }
}

impl RetryPolicy for FixedDecision {
    fn on_unavailable(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_replicas: u32,
        _alive_replicas: u32,
        retry_count: u32,
    ) -> RetryDecision {
        self.decide(retry_count)
    }

    fn on_read_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_responses: u32,
        _received_responses: u32,
        _data_retrieved: bool,
        retry_count: u32,
    ) -> RetryDecision {
        self.decide(retry_count)
    }

    fn on_write_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _write_type: WriteType,
        _required_acks: u32,
        _received_acks: u32,
        retry_count: u32,
    ) -> RetryDecision {
        self.decide(retry_count)
    }
}
