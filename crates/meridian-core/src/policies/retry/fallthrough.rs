use super::{RetryDecision, RetryPolicy};
use crate::{
    errors::RequestFailure,
    types::{ConsistencyLevel, Statement, WriteType},
};

/// Never retries: every failure, including connection errors, goes back to the caller.
///
/// For applications that implement their own retry logic around the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallthroughRetryPolicy;

impl RetryPolicy for FallthroughRetryPolicy {
    fn on_unavailable(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_replicas: u32,
        _alive_replicas: u32,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::rethrow()
    }

    fn on_read_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_responses: u32,
        _received_responses: u32,
        _data_retrieved: bool,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::rethrow()
    }

    fn on_write_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _write_type: WriteType,
        _required_acks: u32,
        _received_acks: u32,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::rethrow()
    }

    fn on_request_error(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _failure: &RequestFailure,
        _retry_count: u32,
    ) -> RetryDecision {
        RetryDecision::rethrow()
    }
}
