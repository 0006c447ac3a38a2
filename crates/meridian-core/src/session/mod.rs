//! The caller-facing entry point.
//!
//! A [`Session`] owns the host registry and the coordinator. It is `Send + Sync` and meant to be
//! shared behind an `Arc`; any number of requests may run through it concurrently, each with
//! its own query plan and retry budget.

mod builder;

pub use builder::{BuilderError, SessionBuilder};

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    cluster::{EventDispatcher, HostEvent, HostRegistry},
    errors::DriverError,
    execution::{CancelSignal, Coordinator, ResultSet},
    mapping::{MappedResult, SerdeMapper},
    metrics::ErrorMetrics,
    policies::LoadBalancingPolicy,
    types::Statement,
};

pub struct Session {
    registry: Arc<HostRegistry>,
    coordinator: Coordinator,
    load_balancing: Arc<dyn LoadBalancingPolicy>,
    metrics: Arc<ErrorMetrics>,
}

impl Session {
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Executes a statement.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::execute`].
    pub async fn execute(&self, statement: &Statement) -> Result<ResultSet, DriverError> {
        self.coordinator.execute(statement).await
    }

    /// Executes a statement that stops early once `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::execute_with_cancel`].
    pub async fn execute_with_cancel(
        &self,
        statement: &Statement,
        cancel: CancelSignal,
    ) -> Result<ResultSet, DriverError> {
        self.coordinator.execute_with_cancel(statement, cancel).await
    }

    /// Executes a statement and maps its rows onto `T` by column name.
    ///
    /// # Errors
    ///
    /// Execution errors only; mapping errors surface per row from the returned result.
    pub async fn execute_mapped<T: DeserializeOwned>(
        &self,
        statement: &Statement,
    ) -> Result<MappedResult<T>, DriverError> {
        let rows = self.coordinator.execute(statement).await?;
        Ok(MappedResult::new(rows, SerdeMapper::new()))
    }

    /// Applies a topology event synchronously. Returns `false` if the event names an unknown
    /// host.
    pub fn apply_event(&self, event: HostEvent) -> bool {
        self.registry.apply(event)
    }

    /// A dispatcher delivering events to this session's registry from a background task.
    #[must_use]
    pub fn event_dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new(Arc::clone(&self.registry))
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    #[must_use]
    pub const fn error_metrics(&self) -> &Arc<ErrorMetrics> {
        &self.metrics
    }

    #[must_use]
    pub const fn load_balancing_policy(&self) -> &Arc<dyn LoadBalancingPolicy> {
        &self.load_balancing
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("hosts", &self.registry.len())
            .field("load_balancing", &self.load_balancing.name())
            .finish_non_exhaustive()
    }
}
