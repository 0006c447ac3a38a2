use std::{net::SocketAddr, sync::Arc};

use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info};

use super::{
    host::{Host, HostMetadata},
    registry::HostRegistry,
};

/// A topology or health notification for one host.
///
/// Events for different hosts arrive in no particular order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Added(HostMetadata),
    Up(SocketAddr),
    Down(SocketAddr),
    Suspected(SocketAddr),
    Removed(SocketAddr),
}

impl HostEvent {
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        match self {
            Self::Added(metadata) => metadata.address,
            Self::Up(address)
            | Self::Down(address)
            | Self::Suspected(address)
            | Self::Removed(address) => *address,
        }
    }
}

impl HostRegistry {
    /// Applies one event. Returns false when it referred to an unknown host.
    pub fn apply(&self, event: HostEvent) -> bool {
        match event {
            HostEvent::Added(metadata) => {
                self.add(Host::from_metadata(metadata));
                true
            }
            HostEvent::Up(address) => self.mark_up(address),
            HostEvent::Down(address) => self.mark_down(address),
            HostEvent::Suspected(address) => self.mark_suspected(address),
            HostEvent::Removed(address) => self.remove(address).is_some(),
        }
    }
}

/// Background task that feeds topology events into a registry.
pub struct EventDispatcher {
    registry: Arc<HostRegistry>,
}

impl EventDispatcher {
    #[must_use]
    pub const fn new(registry: Arc<HostRegistry>) -> Self {
        Self { registry }
    }

    /// Spawns the dispatch loop.
    ///
    /// The loop ends when the event channel closes or a shutdown signal arrives, and resolves to
    /// the number of events applied. Events for unknown hosts are skipped and not counted.
    pub fn spawn(
        self,
        mut events: mpsc::Receiver<HostEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut applied = 0u64;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => {
                        info!(applied, "event dispatcher shutting down");
                        break;
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            debug!(applied, "event channel closed");
                            break;
                        };
                        let address = event.address();
                        if self.registry.apply(event) {
                            applied += 1;
                        } else {
                            debug!(host = %address, "event referred to unknown host");
                        }
                    }
                }
            }
            applied
        })
    }
}
