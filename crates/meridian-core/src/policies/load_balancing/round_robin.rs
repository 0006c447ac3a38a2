use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use super::{rotated, LiveHosts, LoadBalancingPolicy, QueryPlan};
use crate::{
    cluster::{Host, HostDistance, HostRegistry},
    types::Statement,
};

/// Cycles through every live host, starting one position later on each plan.
///
/// Every host is `Local`. The starting position is shared across requests, so two consecutive
/// plans over the same hosts differ by one rotation; ordering is not stable across calls.
pub struct RoundRobinPolicy {
    live: LiveHosts,
    index: AtomicUsize,
}

impl Default for RoundRobinPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundRobinPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self { live: LiveHosts::new(), index: AtomicUsize::new(0) }
    }
}

impl std::fmt::Debug for RoundRobinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundRobinPolicy").field("live_hosts", &self.live.len()).finish()
    }
}

impl LoadBalancingPolicy for RoundRobinPolicy {
    fn init(&self, _registry: &HostRegistry, hosts: &[Arc<Host>]) {
        for host in hosts.iter().filter(|h| h.is_up()) {
            self.live.insert(host);
        }
    }

    fn distance(&self, _host: &Host) -> HostDistance {
        HostDistance::Local
    }

    fn new_query_plan(&self, _keyspace: Option<&str>, _statement: &Statement) -> QueryPlan {
        let hosts = self.live.snapshot();
        if hosts.is_empty() {
            return QueryPlan::empty();
        }

        let start = self.index.fetch_add(1, Ordering::Relaxed) % hosts.len();
        tracing::trace!(start, live_hosts = hosts.len(), "round robin plan");
        QueryPlan::new(rotated(hosts, start))
    }

    fn on_up(&self, host: &Arc<Host>) {
        self.live.insert(host);
    }

    fn on_down(&self, host: &Arc<Host>) {
        self.live.remove(host);
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
