use crate::types::{ConsistencyLevel, WriteType};
use serde::{Deserialize, Serialize};
use std::{fmt::Write as _, net::SocketAddr};
use thiserror::Error;

/// Classification of a single failed attempt, used to key error counters.
///
/// Unavailable, read timeout and write timeout are reported by the coordinator node and routed
/// through the matching retry policy entry point. Connection errors are raised by the transport
/// before any server answer. `Other` covers overloaded coordinators and invalid queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    ReadTimeout,
    WriteTimeout,
    ConnectionError,
    Other,
}

impl FailureKind {
    pub const ALL: [Self; 5] =
        [Self::Unavailable, Self::ReadTimeout, Self::WriteTimeout, Self::ConnectionError, Self::Other];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::ReadTimeout => "read_timeout",
            Self::WriteTimeout => "write_timeout",
            Self::ConnectionError => "connection_error",
            Self::Other => "other",
        }
    }

    /// Dense index for per-kind counter arrays.
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Failure of one attempt against one host, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RequestFailure {
    #[error(
        "not enough replicas available at consistency {consistency} \
         ({required} required but only {alive} alive)"
    )]
    Unavailable { consistency: ConsistencyLevel, required: u32, alive: u32 },

    #[error(
        "timeout during read at consistency {consistency} \
         ({received} of {required} responses, data retrieved: {data_retrieved})"
    )]
    ReadTimeout { consistency: ConsistencyLevel, required: u32, received: u32, data_retrieved: bool },

    #[error(
        "timeout during {write_type} write at consistency {consistency} \
         ({received} of {required} acknowledgements)"
    )]
    WriteTimeout { consistency: ConsistencyLevel, write_type: WriteType, required: u32, received: u32 },

    /// The transport could not reach the host or lost the connection mid-request.
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("coordinator overloaded: {0}")]
    Overloaded(String),

    /// The host rejected the statement itself. Never retried.
    #[error("invalid query: {0}")]
    Invalid(String),
}

impl RequestFailure {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Unavailable { .. } => FailureKind::Unavailable,
            Self::ReadTimeout { .. } => FailureKind::ReadTimeout,
            Self::WriteTimeout { .. } => FailureKind::WriteTimeout,
            Self::Connection(_) => FailureKind::ConnectionError,
            Self::Overloaded(_) | Self::Invalid(_) => FailureKind::Other,
        }
    }

    /// Returns true if a retry policy gets to decide what happens next.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

/// A failure paired with the host that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{host}: {failure}")]
pub struct HostFailure {
    pub host: SocketAddr,
    #[source]
    pub failure: RequestFailure,
}

impl HostFailure {
    #[must_use]
    pub const fn new(host: SocketAddr, failure: RequestFailure) -> Self {
        Self { host, failure }
    }
}

/// Terminal failure of a request, surfaced to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DriverError {
    /// The retry policy rethrew, or the failure was not retryable.
    #[error("request failed on {host}: {failure}")]
    Request {
        host: SocketAddr,
        #[source]
        failure: RequestFailure,
        tried_hosts: Vec<SocketAddr>,
    },

    /// The query plan was empty or ran out of hosts.
    #[error("no host available to execute the request (tried: [{}])", join_hosts(.tried_hosts))]
    NoHostAvailable {
        tried_hosts: Vec<SocketAddr>,
        #[source]
        last_failure: Option<HostFailure>,
    },

    #[error("request cancelled after {} attempt(s)", .tried_hosts.len())]
    Cancelled { tried_hosts: Vec<SocketAddr> },
}

impl DriverError {
    /// Hosts attempted before the request terminated, in attempt order.
    #[must_use]
    pub fn tried_hosts(&self) -> &[SocketAddr] {
        match self {
            Self::Request { tried_hosts, .. }
            | Self::NoHostAvailable { tried_hosts, .. }
            | Self::Cancelled { tried_hosts } => tried_hosts,
        }
    }

    /// Kind of the failure that ended the request, if one was observed.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Request { failure, .. } => Some(failure.kind()),
            Self::NoHostAvailable { last_failure, .. } => {
                last_failure.as_ref().map(|f| f.failure.kind())
            }
            Self::Cancelled { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_no_host_available(&self) -> bool {
        matches!(self, Self::NoHostAvailable { .. })
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn join_hosts(hosts: &[SocketAddr]) -> String {
    let mut out = String::new();
    for (i, host) in hosts.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{host}");
    }
    out
}
