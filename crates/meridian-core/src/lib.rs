//! # Meridian Core
//!
//! Client-side request coordination for a distributed database driver.
//!
//! This crate provides the components that sit between a caller submitting a statement and the
//! transport that talks to individual nodes:
//!
//! - **[`cluster`]**: Host registry with lock-free membership snapshots, atomic per-host health
//!   and asynchronous topology event delivery.
//!
//! - **[`policies`]**: Pluggable load-balancing policies (query plans and host distance) and
//!   retry policies (failure classification into retry decisions).
//!
//! - **[`execution`]**: The request coordinator state machine, the transport seam it drives, and
//!   the per-request execution metadata it produces.
//!
//! - **[`metrics`]**: Injected error counters keyed by failure kind, mirrored to the `metrics`
//!   facade for Prometheus export.
//!
//! - **[`mapping`]**: Row-to-entity mapping over result sets.
//!
//! - **[`session`]**: The `Session` facade and its builder.
//!
//! - **[`config`]**: Layered driver configuration.
//!
//! ## Request Flow
//!
//! ```text
//! Session::execute(statement)
//!       │
//!       ▼
//! ┌──────────────────────┐
//! │ LoadBalancingPolicy  │ ─── empty plan ──► NoHostAvailable
//! │   new_query_plan     │
//! └──────────┬───────────┘
//!            │ host
//!            ▼
//! ┌──────────────────────┐
//! │      Transport       │ ─── success ──► ResultSet + ExecutionInfo
//! └──────────┬───────────┘
//!            │ RequestFailure
//!            ▼
//! ┌──────────────────────┐
//! │    ErrorMetrics      │  (counted once per failure)
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │     RetryPolicy      │
//! └──────────┬───────────┘
//!    ┌───────┼──────────────┬──────────────┐
//!    ▼       ▼              ▼              ▼
//! Rethrow  Ignore     RetrySameHost   TryNextHost
//!    │       │              │              │
//!    ▼       ▼              └── same ──┐   └── plan.next() ──► exhausted? NoHostAvailable
//!  Error  degraded                     ▼
//!         result                  Transport ...
//! ```

pub mod cluster;
pub mod config;
pub mod errors;
pub mod execution;
pub mod mapping;
pub mod metrics;
pub mod policies;
pub mod session;
pub mod types;

pub use errors::{DriverError, FailureKind, HostFailure, RequestFailure};
pub use session::{Session, SessionBuilder};
pub use types::{ConsistencyLevel, Statement, WriteType};
