use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Durability requirement of a request.
///
/// Host selection treats it as opaque. Retry policies may ask for a different level when they
/// retry, in which case the coordinator threads the new level into the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    #[default]
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl ConsistencyLevel {
    #[must_use]
    pub const fn is_serial(self) -> bool {
        matches!(self, Self::Serial | Self::LocalSerial)
    }

    /// Returns true for levels that only involve replicas of the coordinator's datacenter.
    #[must_use]
    pub const fn is_dc_local(self) -> bool {
        matches!(self, Self::LocalQuorum | Self::LocalSerial | Self::LocalOne)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
            Self::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANY" => Ok(Self::Any),
            "ONE" => Ok(Self::One),
            "TWO" => Ok(Self::Two),
            "THREE" => Ok(Self::Three),
            "QUORUM" => Ok(Self::Quorum),
            "ALL" => Ok(Self::All),
            "LOCAL_QUORUM" => Ok(Self::LocalQuorum),
            "EACH_QUORUM" => Ok(Self::EachQuorum),
            "SERIAL" => Ok(Self::Serial),
            "LOCAL_SERIAL" => Ok(Self::LocalSerial),
            "LOCAL_ONE" => Ok(Self::LocalOne),
            other => Err(format!("unknown consistency level: {other}")),
        }
    }
}

/// Kind of write that timed out, as reported by the coordinator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteType {
    /// Single partition write (or logged batch that went through the batch log).
    Simple,
    /// Logged batch; the batch log write succeeded.
    Batch,
    UnloggedBatch,
    Counter,
    /// Timeout while writing the batch log itself; nothing has been applied yet.
    BatchLog,
    /// Paxos phase of a lightweight transaction.
    Cas,
}

impl WriteType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Batch => "BATCH",
            Self::UnloggedBatch => "UNLOGGED_BATCH",
            Self::Counter => "COUNTER",
            Self::BatchLog => "BATCH_LOG",
            Self::Cas => "CAS",
        }
    }
}

impl fmt::Display for WriteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement submitted for execution.
///
/// The query text is never parsed here; it is handed to the transport as-is. Keyspace and
/// consistency are optional overrides of the session defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    query: String,
    keyspace: Option<String>,
    consistency: Option<ConsistencyLevel>,
    tracing: bool,
}

impl Statement {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), keyspace: None, consistency: None, tracing: false }
    }

    #[must_use]
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    #[must_use]
    pub fn with_consistency(mut self, consistency: ConsistencyLevel) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Requests a server-side trace; the transport returns it with the response.
    #[must_use]
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing = enabled;
        self
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    #[must_use]
    pub fn consistency(&self) -> Option<ConsistencyLevel> {
        self.consistency
    }

    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.tracing
    }
}
