use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, OnceLock,
    },
};

use tracing::info;

use super::{rotated, LiveHosts, LoadBalancingPolicy, QueryPlan};
use crate::{
    cluster::{Host, HostDistance, HostRegistry},
    types::Statement,
};

/// Datacenter-aware round robin.
///
/// Hosts of the local datacenter come first, rotated per plan like [`RoundRobinPolicy`]. They
/// are followed by at most `used_hosts_per_remote_dc` hosts from each remote datacenter, in
/// datacenter name order. Remote hosts beyond that budget are `Ignored`.
///
/// When no local datacenter is configured, the datacenter of the first initial host that
/// declares one is used. Hosts without a datacenter are treated as local.
///
/// Statements at a datacenter-local consistency level (`LOCAL_ONE`, `LOCAL_QUORUM`, ...) never
/// go to remote hosts unless `allow_remote_dcs_for_local_cl` is set.
///
/// [`RoundRobinPolicy`]: super::RoundRobinPolicy
pub struct DcAwareRoundRobinPolicy {
    local_dc: OnceLock<String>,
    used_hosts_per_remote_dc: usize,
    allow_remote_dcs_for_local_cl: bool,
    live: LiveHosts,
    index: AtomicUsize,
}

impl DcAwareRoundRobinPolicy {
    #[must_use]
    pub fn new(local_dc: Option<String>) -> Self {
        let cell = OnceLock::new();
        if let Some(dc) = local_dc {
            let _ = cell.set(dc);
        }
        Self {
            local_dc: cell,
            used_hosts_per_remote_dc: 0,
            allow_remote_dcs_for_local_cl: false,
            live: LiveHosts::new(),
            index: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_used_hosts_per_remote_dc(mut self, count: usize) -> Self {
        self.used_hosts_per_remote_dc = count;
        self
    }

    #[must_use]
    pub fn with_remote_dcs_for_local_cl(mut self, allow: bool) -> Self {
        self.allow_remote_dcs_for_local_cl = allow;
        self
    }

    #[must_use]
    pub fn local_dc(&self) -> Option<&str> {
        self.local_dc.get().map(String::as_str)
    }

    fn is_local(&self, host: &Host) -> bool {
        match (host.datacenter(), self.local_dc.get()) {
            (Some(dc), Some(local)) => dc == local,
            _ => true,
        }
    }

    /// Remote hosts within budget, grouped by datacenter name.
    fn remote_hosts(&self, hosts: &[Arc<Host>]) -> Vec<Arc<Host>> {
        if self.used_hosts_per_remote_dc == 0 {
            return Vec::new();
        }
        let mut by_dc: BTreeMap<&str, Vec<Arc<Host>>> = BTreeMap::new();
        for host in hosts.iter().filter(|h| !self.is_local(h)) {
            if let Some(dc) = host.datacenter() {
                let slot = by_dc.entry(dc).or_default();
                if slot.len() < self.used_hosts_per_remote_dc {
                    slot.push(Arc::clone(host));
                }
            }
        }
        by_dc.into_values().flatten().collect()
    }
}

impl std::fmt::Debug for DcAwareRoundRobinPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcAwareRoundRobinPolicy")
            .field("local_dc", &self.local_dc.get())
            .field("used_hosts_per_remote_dc", &self.used_hosts_per_remote_dc)
            .field("live_hosts", &self.live.len())
            .finish()
    }
}

impl LoadBalancingPolicy for DcAwareRoundRobinPolicy {
    fn init(&self, _registry: &HostRegistry, hosts: &[Arc<Host>]) {
        if self.local_dc.get().is_none() {
            if let Some(dc) = hosts.iter().find_map(|h| h.datacenter()) {
                if self.local_dc.set(dc.to_string()).is_ok() {
                    info!(local_dc = dc, "inferred local datacenter from contact points");
                }
            }
        }
        for host in hosts.iter().filter(|h| h.is_up()) {
            self.live.insert(host);
        }
    }

    fn distance(&self, host: &Host) -> HostDistance {
        if self.is_local(host) {
            return HostDistance::Local;
        }
        let within_budget = self
            .remote_hosts(&self.live.snapshot())
            .iter()
            .any(|h| h.address() == host.address());
        if within_budget {
            HostDistance::Remote
        } else {
            HostDistance::Ignored
        }
    }

    fn new_query_plan(&self, _keyspace: Option<&str>, statement: &Statement) -> QueryPlan {
        let hosts = self.live.snapshot();
        let local: Arc<Vec<Arc<Host>>> =
            Arc::new(hosts.iter().filter(|h| self.is_local(h)).cloned().collect());

        let local_only = statement.consistency().is_some_and(|cl| cl.is_dc_local())
            && !self.allow_remote_dcs_for_local_cl;
        let remote = if local_only { Vec::new() } else { self.remote_hosts(&hosts) };

        let start = if local.is_empty() {
            0
        } else {
            self.index.fetch_add(1, Ordering::Relaxed) % local.len()
        };
        QueryPlan::new(rotated(local, start).chain(remote))
    }

    fn on_up(&self, host: &Arc<Host>) {
        self.live.insert(host);
    }

    fn on_down(&self, host: &Arc<Host>) {
        self.live.remove(host);
    }

    fn name(&self) -> &'static str {
        "dc_aware_round_robin"
    }
}
