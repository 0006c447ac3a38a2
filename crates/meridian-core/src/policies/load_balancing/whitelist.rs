use std::{collections::HashSet, net::SocketAddr, sync::Arc};

use super::{LoadBalancingPolicy, QueryPlan};
use crate::{
    cluster::{Host, HostDistance, HostRegistry},
    types::Statement,
};

/// Restricts a child policy to an explicit set of addresses.
///
/// Hosts outside the set are `Ignored`: the child never hears about them and they never
/// appear in a plan.
#[derive(Debug)]
pub struct WhiteListPolicy {
    child: Arc<dyn LoadBalancingPolicy>,
    allowed: Arc<HashSet<SocketAddr>>,
}

impl WhiteListPolicy {
    pub fn new(
        child: Arc<dyn LoadBalancingPolicy>,
        allowed: impl IntoIterator<Item = SocketAddr>,
    ) -> Self {
        Self { child, allowed: Arc::new(allowed.into_iter().collect()) }
    }

    fn is_allowed(&self, host: &Host) -> bool {
        self.allowed.contains(&host.address())
    }
}

impl LoadBalancingPolicy for WhiteListPolicy {
    fn init(&self, registry: &HostRegistry, hosts: &[Arc<Host>]) {
        let allowed: Vec<_> = hosts.iter().filter(|h| self.is_allowed(h)).cloned().collect();
        self.child.init(registry, &allowed);
    }

    fn distance(&self, host: &Host) -> HostDistance {
        if self.is_allowed(host) {
            self.child.distance(host)
        } else {
            HostDistance::Ignored
        }
    }

    fn new_query_plan(&self, keyspace: Option<&str>, statement: &Statement) -> QueryPlan {
        let allowed = Arc::clone(&self.allowed);
        self.child
            .new_query_plan(keyspace, statement)
            .filter(move |host| allowed.contains(&host.address()))
    }

    fn on_add(&self, host: &Arc<Host>) {
        if self.is_allowed(host) {
            self.child.on_add(host);
        }
    }

    fn on_up(&self, host: &Arc<Host>) {
        if self.is_allowed(host) {
            self.child.on_up(host);
        }
    }

    fn on_down(&self, host: &Arc<Host>) {
        if self.is_allowed(host) {
            self.child.on_down(host);
        }
    }

    fn on_remove(&self, host: &Arc<Host>) {
        if self.is_allowed(host) {
            self.child.on_remove(host);
        }
    }

    fn on_suspected(&self, host: &Arc<Host>) {
        if self.is_allowed(host) {
            self.child.on_suspected(host);
        }
    }

    fn name(&self) -> &'static str {
        "whitelist"
    }
}
