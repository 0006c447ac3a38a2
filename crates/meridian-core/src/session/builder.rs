//! Builder pattern for constructing a [`Session`] with flexible configuration.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::Session;
use crate::{
    cluster::{Host, HostRegistry},
    config::DriverConfig,
    execution::{Coordinator, CoordinatorConfig, Transport},
    metrics::ErrorMetrics,
    policies::{
        DefaultRetryPolicy, LoadBalancingPolicy, PolicyListener, RetryPolicy, RoundRobinPolicy,
    },
};

/// Errors that can occur during session construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// A transport is required but was not provided
    #[error("a transport is required but was not provided")]
    MissingTransport,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Builder for constructing a [`Session`].
///
/// Only the transport is required. Without further settings the session uses a
/// [`RoundRobinPolicy`], a [`DefaultRetryPolicy`] and a fresh [`ErrorMetrics`].
///
/// # Examples
///
/// ```no_run
/// # use meridian_core::{execution::Transport, policies::SortedPolicy, SessionBuilder};
/// # use std::{net::SocketAddr, sync::Arc};
/// # fn example(transport: Arc<dyn Transport>) -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionBuilder::new()
///     .transport(transport)
///     .load_balancing_policy(Arc::new(SortedPolicy::new()))
///     .contact_point("10.0.0.1:9042".parse::<SocketAddr>()?)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    transport: Option<Arc<dyn Transport>>,
    load_balancing: Option<Arc<dyn LoadBalancingPolicy>>,
    retry: Option<Arc<dyn RetryPolicy>>,
    metrics: Option<Arc<ErrorMetrics>>,
    contact_points: Vec<Host>,
    coordinator_config: CoordinatorConfig,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a validated [`DriverConfig`]: contact points, policies and request defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidConfig`] if the configuration fails validation.
    pub fn from_config(config: &DriverConfig) -> Result<Self, BuilderError> {
        config.validate().map_err(BuilderError::InvalidConfig)?;

        Ok(Self {
            transport: None,
            load_balancing: Some(config.load_balancing.build()),
            retry: Some(config.retry.build()),
            metrics: None,
            contact_points: config.contact_hosts(),
            coordinator_config: config.coordinator_config(),
        })
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn load_balancing_policy(mut self, policy: Arc<dyn LoadBalancingPolicy>) -> Self {
        self.load_balancing = Some(policy);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Shares an existing counter registry, e.g. between sessions of one process.
    #[must_use]
    pub fn error_metrics(mut self, metrics: Arc<ErrorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn contact_point(mut self, address: std::net::SocketAddr) -> Self {
        self.contact_points.push(Host::new(address));
        self
    }

    /// Adds hosts with their topology metadata (and optionally a non-`Up` initial state).
    #[must_use]
    pub fn contact_points(mut self, hosts: impl IntoIterator<Item = Host>) -> Self {
        self.contact_points.extend(hosts);
        self
    }

    #[must_use]
    pub fn coordinator_config(mut self, config: CoordinatorConfig) -> Self {
        self.coordinator_config = config;
        self
    }

    /// Builds the session.
    ///
    /// Contact points are added to a new registry, the load-balancing policy is initialised
    /// with them, and the policy is then registered for later topology changes.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::MissingTransport` if no transport was provided.
    pub fn build(self) -> Result<Session, BuilderError> {
        let transport = self.transport.ok_or(BuilderError::MissingTransport)?;
        let load_balancing =
            self.load_balancing.unwrap_or_else(|| Arc::new(RoundRobinPolicy::new()));
        let retry = self.retry.unwrap_or_else(|| Arc::new(DefaultRetryPolicy::new()));
        let metrics = self.metrics.unwrap_or_default();

        let registry = Arc::new(HostRegistry::new());
        let hosts: Vec<_> = self.contact_points.into_iter().map(|h| registry.add(h)).collect();
        load_balancing.init(&registry, &hosts);
        registry.register_listener(Arc::new(PolicyListener::new(Arc::clone(&load_balancing))));

        info!(
            contact_points = hosts.len(),
            load_balancing = load_balancing.name(),
            retry = ?retry,
            "session initialized"
        );

        let coordinator = Coordinator::new(
            Arc::clone(&load_balancing),
            retry,
            transport,
            Arc::clone(&metrics),
            self.coordinator_config,
        );

        Ok(Session { registry, coordinator, load_balancing, metrics })
    }
}
