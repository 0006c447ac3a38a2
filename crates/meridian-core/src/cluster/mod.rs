//! Cluster membership: hosts, their health, and the registry that tracks them.

pub mod events;
pub mod host;
pub mod registry;

pub use events::{EventDispatcher, HostEvent};
pub use host::{Host, HostDistance, HostMetadata, HostState};
pub use registry::{HostRegistry, HostStateListener, RegistryStats};
