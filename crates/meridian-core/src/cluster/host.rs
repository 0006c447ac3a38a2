//! Cluster node identity and health.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
    net::SocketAddr,
    sync::atomic::{AtomicU8, Ordering},
};

/// Health of a host as last reported by topology events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HostState {
    #[default]
    Up = 0,
    Down = 1,
    /// Reported unreachable by a peer but not yet confirmed down.
    Suspected = 2,
}

impl HostState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Down,
            2 => Self::Suspected,
            _ => Self::Up,
        }
    }
}

/// How a load-balancing policy intends to use a host.
///
/// Connection pools are sized from this; `Ignored` hosts never appear in a query plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostDistance {
    Local,
    Remote,
    Ignored,
}

/// Static description of a host: where it is and where it lives in the topology.
///
/// Used for contact points in configuration and for `HostEvent::Added`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMetadata {
    pub address: SocketAddr,
    #[serde(default)]
    pub datacenter: Option<String>,
    #[serde(default)]
    pub rack: Option<String>,
}

impl HostMetadata {
    #[must_use]
    pub const fn new(address: SocketAddr) -> Self {
        Self { address, datacenter: None, rack: None }
    }

    #[must_use]
    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }
}

/// A node in the cluster.
///
/// The address, datacenter and rack never change after creation. Health is an atomic cell
/// mutated only by the [`HostRegistry`](super::HostRegistry), so readers always see a whole
/// state. Hosts are shared as `Arc<Host>`: removing a host from the registry does not
/// invalidate references already held by in-flight query plans.
pub struct Host {
    address: SocketAddr,
    datacenter: Option<String>,
    rack: Option<String>,
    state: AtomicU8,
}

impl Host {
    /// Creates a host in the `Up` state.
    #[must_use]
    pub fn new(address: SocketAddr) -> Self {
        Self { address, datacenter: None, rack: None, state: AtomicU8::new(HostState::Up as u8) }
    }

    #[must_use]
    pub fn from_metadata(metadata: HostMetadata) -> Self {
        Self {
            address: metadata.address,
            datacenter: metadata.datacenter,
            rack: metadata.rack,
            state: AtomicU8::new(HostState::Up as u8),
        }
    }

    #[must_use]
    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    #[must_use]
    pub fn with_rack(mut self, rack: impl Into<String>) -> Self {
        self.rack = Some(rack.into());
        self
    }

    /// Sets the initial state before the host is registered.
    #[must_use]
    pub fn with_state(self, state: HostState) -> Self {
        self.state.store(state as u8, Ordering::Release);
        self
    }

    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    #[must_use]
    pub fn datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref()
    }

    #[must_use]
    pub fn rack(&self) -> Option<&str> {
        self.rack.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> HostState {
        HostState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_up(&self) -> bool {
        self.state() == HostState::Up
    }

    #[must_use]
    pub fn metadata(&self) -> HostMetadata {
        HostMetadata {
            address: self.address,
            datacenter: self.datacenter.clone(),
            rack: self.rack.clone(),
        }
    }

    /// Stores a new state and returns the previous one. Last writer wins.
    pub(crate) fn set_state(&self, state: HostState) -> HostState {
        HostState::from_u8(self.state.swap(state as u8, Ordering::AcqRel))
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Host {}

impl Hash for Host {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("address", &self.address)
            .field("datacenter", &self.datacenter)
            .field("rack", &self.rack)
            .field("state", &self.state())
            .finish()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
