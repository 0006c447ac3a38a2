use std::sync::Arc;

use async_trait::async_trait;

use super::{info::QueryTrace, result::Row};
use crate::{
    cluster::Host,
    errors::RequestFailure,
    types::{ConsistencyLevel, Statement},
};

/// Successful answer from one host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub rows: Vec<Row>,
    /// Present when the statement asked for tracing and the host returned a trace.
    pub trace: Option<QueryTrace>,
}

impl Response {
    #[must_use]
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self { rows, trace: None }
    }
}

/// Sends one statement to one host.
///
/// Connection pooling, encoding and socket-level retries live behind this seam. The
/// coordinator calls it once per attempt and never holds a registry or policy lock across the
/// await.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`RequestFailure`] classifying why the attempt failed.
    async fn execute(
        &self,
        host: &Arc<Host>,
        statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<Response, RequestFailure>;
}
