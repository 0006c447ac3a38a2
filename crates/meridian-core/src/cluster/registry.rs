use std::{net::SocketAddr, sync::Arc};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use super::host::{Host, HostState};
use crate::metrics;

/// Receives topology transitions from a [`HostRegistry`].
///
/// Callbacks run on the thread that performed the transition, while the registry's writer lock
/// is held, so they are delivered in the same order the transitions were applied. They must not
/// call back into the registry's mutating methods.
pub trait HostStateListener: Send + Sync {
    fn on_add(&self, host: &Arc<Host>);
    fn on_up(&self, host: &Arc<Host>);
    fn on_down(&self, host: &Arc<Host>);
    fn on_suspected(&self, host: &Arc<Host>);
    fn on_remove(&self, host: &Arc<Host>);
}

/// Membership counts by health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub up: usize,
    pub down: usize,
    pub suspected: usize,
}

/// Process-wide source of truth for cluster membership and health.
///
/// Membership is an `ArcSwap` over an immutable vector of `Arc<Host>`: readers take a snapshot
/// without locking, writers publish a new vector with read-copy-update. Writers are serialized
/// by a small mutex so that state changes and listener notifications happen in one order.
/// Health changes are stored in place on the host's atomic cell and are visible to every
/// snapshot that holds the host.
pub struct HostRegistry {
    hosts: ArcSwap<Vec<Arc<Host>>>,
    listeners: ArcSwap<Vec<Arc<dyn HostStateListener>>>,
    write_lock: Mutex<()>,
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hosts: ArcSwap::from_pointee(Vec::new()),
            listeners: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Registers a listener for subsequent transitions.
    pub fn register_listener(&self, listener: Arc<dyn HostStateListener>) {
        let _guard = self.write_lock.lock();
        self.listeners.rcu(|current| {
            let mut next = (**current).clone();
            next.push(listener.clone());
            next
        });
    }

    /// Registers a host with the state it carries (normally `Up`).
    ///
    /// Idempotent: if a host with the same address is already known, the existing handle is
    /// returned and nothing is notified. Listeners receive `on_add` unless the host arrives
    /// already `Down`; they learn about it on its first `mark_up` instead.
    pub fn add(&self, host: Host) -> Arc<Host> {
        let _guard = self.write_lock.lock();
        if let Some(existing) = self.find(host.address()) {
            debug!(host = %existing.address(), "host already registered");
            return existing;
        }

        let host = Arc::new(host);
        self.hosts.rcu(|current| {
            let mut next = (**current).clone();
            next.push(host.clone());
            next
        });

        let state = host.state();
        info!(host = %host.address(), datacenter = ?host.datacenter(), state = ?state, "host added");
        metrics::record_host_state(host.address(), state);
        if state != HostState::Down {
            for listener in self.listeners.load().iter() {
                listener.on_add(&host);
            }
        }
        host
    }

    /// Marks a host up. Returns false if the address is unknown.
    pub fn mark_up(&self, address: SocketAddr) -> bool {
        self.transition(address, HostState::Up)
    }

    /// Marks a host down. Returns false if the address is unknown.
    pub fn mark_down(&self, address: SocketAddr) -> bool {
        self.transition(address, HostState::Down)
    }

    /// Marks a host suspected. Returns false if the address is unknown.
    pub fn mark_suspected(&self, address: SocketAddr) -> bool {
        self.transition(address, HostState::Suspected)
    }

    fn transition(&self, address: SocketAddr, state: HostState) -> bool {
        let _guard = self.write_lock.lock();
        let Some(host) = self.find(address) else {
            debug!(host = %address, state = ?state, "ignoring transition for unknown host");
            return false;
        };

        let previous = host.set_state(state);
        if previous == state {
            debug!(host = %address, state = ?state, "host state unchanged");
        } else {
            info!(host = %address, from = ?previous, to = ?state, "host state changed");
        }
        metrics::record_host_state(address, state);

        for listener in self.listeners.load().iter() {
            match state {
                HostState::Up => listener.on_up(&host),
                HostState::Down => listener.on_down(&host),
                HostState::Suspected => listener.on_suspected(&host),
            }
        }
        true
    }

    /// Removes a host from the live membership view.
    ///
    /// The returned handle (and any handle already held elsewhere) stays valid.
    pub fn remove(&self, address: SocketAddr) -> Option<Arc<Host>> {
        let _guard = self.write_lock.lock();
        let host = self.find(address)?;

        self.hosts.rcu(|current| {
            current.iter().filter(|h| h.address() != address).cloned().collect::<Vec<_>>()
        });

        info!(host = %address, "host removed");
        for listener in self.listeners.load().iter() {
            listener.on_remove(&host);
        }
        Some(host)
    }

    /// Returns the current membership. Never blocks on writers.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Arc<Host>>> {
        self.hosts.load_full()
    }

    #[must_use]
    pub fn get(&self, address: SocketAddr) -> Option<Arc<Host>> {
        self.find(address)
    }

    #[must_use]
    pub fn contains(&self, address: SocketAddr) -> bool {
        self.find(address).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.load().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let hosts = self.hosts.load();
        let mut stats = RegistryStats { total: hosts.len(), ..RegistryStats::default() };
        for host in hosts.iter() {
            match host.state() {
                HostState::Up => stats.up += 1,
                HostState::Down => stats.down += 1,
                HostState::Suspected => stats.suspected += 1,
            }
        }
        stats
    }

    fn find(&self, address: SocketAddr) -> Option<Arc<Host>> {
        self.hosts.load().iter().find(|h| h.address() == address).cloned()
    }
}
