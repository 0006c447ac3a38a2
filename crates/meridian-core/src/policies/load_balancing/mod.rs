//! Host selection: which hosts a request may use, and in which order.
//!
//! A [`LoadBalancingPolicy`] keeps its own view of live hosts, fed by topology callbacks, and
//! turns it into a fresh [`QueryPlan`] for every request. Plans iterate over an immutable
//! snapshot taken when the plan was created, so topology changes during a request never
//! invalidate the iteration; a removed host may still be yielded and remains attemptable.

mod dc_aware;
mod round_robin;
mod sorted;
mod whitelist;

pub use dc_aware::DcAwareRoundRobinPolicy;
pub use round_robin::RoundRobinPolicy;
pub use sorted::SortedPolicy;
pub use whitelist::WhiteListPolicy;

use crate::{
    cluster::{Host, HostDistance, HostRegistry, HostStateListener},
    types::Statement,
};
use arc_swap::ArcSwap;
use std::{cmp::Ordering, fmt, sync::Arc};

/// Strategy that orders candidate hosts for each request.
///
/// Implementations must be safe to call concurrently: callbacks may race with each other and
/// with `new_query_plan`. A host whose `distance` is [`HostDistance::Ignored`] must never be
/// yielded by a plan.
pub trait LoadBalancingPolicy: Send + Sync + fmt::Debug {
    /// Called once when the session activates the policy, with the initial membership.
    fn init(&self, registry: &HostRegistry, hosts: &[Arc<Host>]);

    fn distance(&self, host: &Host) -> HostDistance;

    /// Builds the candidate sequence for one execution.
    ///
    /// For a fixed internal state and statement the order is the same on every call, unless the
    /// implementation documents otherwise.
    fn new_query_plan(&self, keyspace: Option<&str>, statement: &Statement) -> QueryPlan;

    /// A newly added host is usable.
    fn on_add(&self, host: &Arc<Host>) {
        self.on_up(host);
    }

    fn on_up(&self, host: &Arc<Host>);

    fn on_down(&self, host: &Arc<Host>);

    /// A removed host is unusable.
    fn on_remove(&self, host: &Arc<Host>) {
        self.on_down(host);
    }

    /// Suspected hosts stay in plans unless a policy decides otherwise.
    fn on_suspected(&self, _host: &Arc<Host>) {}

    fn name(&self) -> &'static str;
}

/// Lazily produced, single-pass sequence of candidate hosts for one request.
pub struct QueryPlan {
    hosts: Box<dyn Iterator<Item = Arc<Host>> + Send>,
}

impl QueryPlan {
    pub fn new<I>(hosts: I) -> Self
    where
        I: IntoIterator<Item = Arc<Host>>,
        I::IntoIter: Send + 'static,
    {
        Self { hosts: Box::new(hosts.into_iter()) }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Keeps only the hosts matching `predicate`, preserving order.
    #[must_use]
    pub fn filter<P>(self, mut predicate: P) -> Self
    where
        P: FnMut(&Arc<Host>) -> bool + Send + 'static,
    {
        Self::new(self.hosts.filter(move |host| predicate(host)))
    }
}

impl Iterator for QueryPlan {
    type Item = Arc<Host>;

    fn next(&mut self) -> Option<Self::Item> {
        self.hosts.next()
    }
}

impl fmt::Debug for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlan").finish_non_exhaustive()
    }
}

/// Yields `hosts` starting at `start`, wrapping around once.
pub(crate) fn rotated(
    hosts: Arc<Vec<Arc<Host>>>,
    start: usize,
) -> impl Iterator<Item = Arc<Host>> + Send {
    let len = hosts.len();
    (0..len).map(move |i| Arc::clone(&hosts[(start + i) % len]))
}

/// Copy-on-write set of hosts a policy currently considers live.
///
/// Reads are a lock-free snapshot; inserts and removals publish a new vector.
pub(crate) struct LiveHosts {
    hosts: ArcSwap<Vec<Arc<Host>>>,
    order: Option<fn(&Host, &Host) -> Ordering>,
}

impl LiveHosts {
    /// Keeps hosts in insertion order.
    pub(crate) fn new() -> Self {
        Self { hosts: ArcSwap::from_pointee(Vec::new()), order: None }
    }

    /// Keeps hosts sorted with `order`.
    pub(crate) fn sorted_by(order: fn(&Host, &Host) -> Ordering) -> Self {
        Self { hosts: ArcSwap::from_pointee(Vec::new()), order: Some(order) }
    }

    pub(crate) fn insert(&self, host: &Arc<Host>) {
        let order = self.order;
        self.hosts.rcu(|current| {
            if current.iter().any(|h| h.address() == host.address()) {
                return Arc::clone(current);
            }
            let mut next = (**current).clone();
            match order {
                Some(cmp) => {
                    let at = next.partition_point(|h| cmp(h, host) == Ordering::Less);
                    next.insert(at, Arc::clone(host));
                }
                None => next.push(Arc::clone(host)),
            }
            Arc::new(next)
        });
    }

    pub(crate) fn remove(&self, host: &Host) {
        self.hosts.rcu(|current| {
            if !current.iter().any(|h| h.address() == host.address()) {
                return Arc::clone(current);
            }
            Arc::new(current.iter().filter(|h| h.address() != host.address()).cloned().collect())
        });
    }

    pub(crate) fn contains(&self, host: &Host) -> bool {
        self.hosts.load().iter().any(|h| h.address() == host.address())
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Host>>> {
        self.hosts.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.hosts.load().len()
    }
}

/// Forwards registry transitions to a load-balancing policy.
pub struct PolicyListener {
    policy: Arc<dyn LoadBalancingPolicy>,
}

impl PolicyListener {
    #[must_use]
    pub fn new(policy: Arc<dyn LoadBalancingPolicy>) -> Self {
        Self { policy }
    }
}

impl HostStateListener for PolicyListener {
    fn on_add(&self, host: &Arc<Host>) {
        self.policy.on_add(host);
    }

    fn on_up(&self, host: &Arc<Host>) {
        self.policy.on_up(host);
    }

    fn on_down(&self, host: &Arc<Host>) {
        self.policy.on_down(host);
    }

    fn on_suspected(&self, host: &Arc<Host>) {
        self.policy.on_suspected(host);
    }

    fn on_remove(&self, host: &Arc<Host>) {
        self.policy.on_remove(host);
    }
}
