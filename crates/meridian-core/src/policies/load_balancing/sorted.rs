use std::{cmp::Ordering, sync::Arc};

use super::{LiveHosts, LoadBalancingPolicy, QueryPlan};
use crate::{
    cluster::{Host, HostDistance, HostRegistry},
    types::Statement,
};

/// Orders live hosts by socket address, the same way on every plan.
///
/// Useful when tests or operators need a reproducible attempt order: `127.0.0.1` is always
/// tried before `127.0.0.2`. Every host is `Local`.
pub struct SortedPolicy {
    live: LiveHosts,
}

fn by_address(a: &Host, b: &Host) -> Ordering {
    a.address().cmp(&b.address())
}

impl Default for SortedPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self { live: LiveHosts::sorted_by(by_address) }
    }
}

impl std::fmt::Debug for SortedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedPolicy").field("live_hosts", &self.live.len()).finish()
    }
}

impl LoadBalancingPolicy for SortedPolicy {
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
        QueryPlan::new((0..hosts.len()).map(move |i| Arc::clone(&hosts[i])))
    }

    fn on_up(&self, host: &Arc<Host>) {
        self.live.insert(host);
    }

    fn on_down(&self, host: &Arc<Host>) {
        self.live.remove(host);
    }

    fn name(&self) -> &'static str {
        "sorted"
    }
}
