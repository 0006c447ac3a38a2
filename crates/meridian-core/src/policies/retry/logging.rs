use std::sync::Arc;

use tracing::info;

use super::{RetryDecision, RetryPolicy};
use crate::{
    errors::RequestFailure,
    types::{ConsistencyLevel, Statement, WriteType},
};

/// Wraps another policy and logs every decision other than rethrow.
#[derive(Debug, Clone)]
pub struct LoggingRetryPolicy {
    inner: Arc<dyn RetryPolicy>,
}

impl LoggingRetryPolicy {
    #[must_use]
    pub fn new(inner: Arc<dyn RetryPolicy>) -> Self {
        Self { inner }
    }
}

fn log(decision: RetryDecision, failure: &str, consistency: ConsistencyLevel, retry_count: u32) {
    if decision == RetryDecision::Rethrow {
        return;
    }
    info!(
        failure,
        %consistency,
        %decision,
        target_consistency = ?decision.consistency(),
        retry_count,
        "retry policy decision"
    );
}

impl RetryPolicy for LoggingRetryPolicy {
    fn on_unavailable(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        required_replicas: u32,
        alive_replicas: u32,
        retry_count: u32,
    ) -> RetryDecision {
        let decision = self.inner.on_unavailable(
            statement,
            consistency,
            required_replicas,
            alive_replicas,
            retry_count,
        );
        log(decision, "unavailable", consistency, retry_count);
        decision
    }

    fn on_read_timeout(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        required_responses: u32,
        received_responses: u32,
        data_retrieved: bool,
        retry_count: u32,
    ) -> RetryDecision {
        let decision = self.inner.on_read_timeout(
            statement,
            consistency,
            required_responses,
            received_responses,
            data_retrieved,
            retry_count,
        );
        log(decision, "read_timeout", consistency, retry_count);
        decision
    }

    fn on_write_timeout(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        write_type: WriteType,
        required_acks: u32,
        received_acks: u32,
        retry_count: u32,
    ) -> RetryDecision {
        let decision = self.inner.on_write_timeout(
            statement,
            consistency,
            write_type,
            required_acks,
            received_acks,
            retry_count,
        );
        log(decision, "write_timeout", consistency, retry_count);
        decision
    }

    fn on_request_error(
        &self,
        statement: &Statement,
        consistency: ConsistencyLevel,
        failure: &RequestFailure,
        retry_count: u32,
    ) -> RetryDecision {
        let decision = self.inner.on_request_error(statement, consistency, failure, retry_count);
        log(decision, failure.kind().as_str(), consistency, retry_count);
        decision
    }
}
