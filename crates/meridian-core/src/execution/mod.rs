//! Request execution: the coordinator state machine and what it produces.
//!
//! A request moves through `Start → Attempting → (RetryWait → Attempting)* → Done`. The
//! [`Transport`] seam performs each attempt; [`ExecutionInfo`] records how the request got to
//! its outcome.

pub mod cancel;
pub mod coordinator;
pub mod info;
pub mod result;
pub mod transport;

pub use cancel::{cancellation, CancelHandle, CancelSignal};
pub use coordinator::{Coordinator, CoordinatorConfig};
pub use info::{ExecutionInfo, QueryTrace};
pub use result::{ResultSet, Row};
pub use transport::{Response, Transport};
