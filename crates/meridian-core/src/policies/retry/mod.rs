//! Failure classification into retry decisions.
//!
//! A [`RetryPolicy`] is consulted by the coordinator after every failed attempt, with the
//! failure details and the number of retries already spent on the request. It never selects
//! hosts; it only says whether to stay on the current host, move to the next one in the plan,
//! suppress the failure, or give up.

mod default;
mod downgrading;
mod fallthrough;
mod logging;

pub use default::DefaultRetryPolicy;
pub use downgrading::DowngradingConsistencyRetryPolicy;
pub use fallthrough::FallthroughRetryPolicy;
pub use logging::LoggingRetryPolicy;

use crate::{
    errors::RequestFailure,
    types::{ConsistencyLevel, Statement, WriteType},
};
use std::fmt;

/// What the coordinator does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Surface the failure to the caller.
    Rethrow,
    /// Attempt the same host again, optionally at another consistency level.
    RetrySameHost(Option<ConsistencyLevel>),
    /// Move to the next host of the query plan, optionally at another consistency level.
    TryNextHost(Option<ConsistencyLevel>),
    /// Treat the failure as success and return an empty, degraded result.
    Ignore,
}

impl RetryDecision {
    #[must_use]
    pub const fn rethrow() -> Self {
        Self::Rethrow
    }

    #[must_use]
    pub const fn retry_same_host(consistency: Option<ConsistencyLevel>) -> Self {
        Self::RetrySameHost(consistency)
    }

    #[must_use]
    pub const fn try_next_host(consistency: Option<ConsistencyLevel>) -> Self {
        Self::TryNextHost(consistency)
    }

    #[must_use]
    pub const fn ignore() -> Self {
        Self::Ignore
    }

    /// Consistency override carried by a retry, if any.
    #[must_use]
    pub const fn consistency(&self) -> Option<ConsistencyLevel> {
        match self {
            Self::RetrySameHost(cl) | Self::TryNextHost(cl) => *cl,
            Self::Rethrow | Self::Ignore => None,
        }
    }

    #[must_use]
    pub const fn is_retry(&self) -> bool {
        matches!(self, Self::RetrySameHost(_) | Self::TryNextHost(_))
    }
}

impl fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rethrow => f.write_str("rethrow"),
            Self::RetrySameHost(None) => f.write_str("retry same host"),
            Self::RetrySameHost(Some(cl)) => write!(f, "retry same host at {cl}"),
            Self::TryNextHost(None) => f.write_str("try next host"),
            Self::TryNextHost(Some(cl)) => write!(f, "try next host at {cl}"),
            Self::Ignore => f.write_str("ignore"),
        }
    }
}

/// Decides how to react to a classified failure.
///
/// Every entry point receives the statement, the consistency level of the failed attempt and
/// `retry_count`, the number of retries already taken for this request. Implementations are
/// shared across concurrent requests and must not keep per-request state.
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Not enough replicas were alive to even try the request.
    fn on_unavailable(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        required_replicas: u32,
        alive_replicas: u32,
        retry_count: u32,
    ) -> RetryDecision;

    /// Replicas did not answer a read in time. `data_retrieved` is true if the replica asked for
    /// the actual data responded.
    fn on_read_timeout(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        required_responses: u32,
        received_responses: u32,
        data_retrieved: bool,
        retry_count: u32,
    ) -> RetryDecision;

    /// Replicas did not acknowledge a write in time.
    fn on_write_timeout(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        write_type: WriteType,
        required_acks: u32,
        received_acks: u32,
        retry_count: u32,
    ) -> RetryDecision;

    /// The transport could not complete the attempt, or the coordinator was overloaded.
    ///
    /// Defaults to moving on to the next host, so one bad host does not fail the request.
    fn on_request_error(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _failure: &RequestFailure,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::try_next_host(None)
    }
}

/// Routes a failure to the matching entry point of `policy`.
///
/// Invalid queries are not the host's fault and are rethrown without consulting the policy.
pub fn decide(
    policy: &dyn RetryPolicy,
    statement: &Statement,
    consistency: ConsistencyLevel,
    failure: &RequestFailure,
    retry_count: u32,
) -> RetryDecision {
    if !failure.is_retryable() {
        return RetryDecision::Rethrow;
    }
    match failure {
        RequestFailure::Unavailable { required, alive, .. } => {
            policy.on_unavailable(statement, consistency, *required, *alive, retry_count)
        }
        RequestFailure::ReadTimeout { required, received, data_retrieved, .. } => policy
            .on_read_timeout(
                statement,
                consistency,
                *required,
                *received,
                *data_retrieved,
                retry_count,
            ),
        RequestFailure::WriteTimeout { write_type, required, received, .. } => policy
            .on_write_timeout(
                statement,
                consistency,
                *write_type,
                *required,
                *received,
                retry_count,
            ),
        _ => policy.on_request_error(statement, consistency, failure, retry_count),
    }
}
