use super::{RetryDecision, RetryPolicy};
use crate::types::{ConsistencyLevel, Statement, WriteType};

/// Conservative retries that never change the consistency level.
///
/// - read timeout: retry the same host if enough replicas answered but the data replica did
///   not; the read repair triggered by the first attempt usually lets the retry succeed.
/// - write timeout: retry the same host only for `BATCH_LOG` writes, which have not been
///   applied anywhere yet.
/// - unavailable: try the next host, whose view of the cluster may differ.
/// - request errors: try the next host (the trait default).
///
/// Server-classified failures are retried at most `max_retries` times per request (default 1).
/// Request errors are not capped and fail over until the plan runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRetryPolicy {
    max_retries: u32,
}

impl Default for DefaultRetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultRetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 1;

    #[must_use]
    pub const fn new() -> Self {
        Self { max_retries: Self::DEFAULT_MAX_RETRIES }
    }

    #[must_use]
    pub const fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries }
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    const fn exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn on_unavailable(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        _required_replicas: u32,
        _alive_replicas: u32,
        retry_count: u32,
    ) -> RetryDecision {
        if self.exhausted(retry_count) {
            return RetryDecision::rethrow();
        }
        RetryDecision::try_next_host(None)
    }

    fn on_read_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        required_responses: u32,
        received_responses: u32,
        data_retrieved: bool,
        retry_count: u32,
    ) -> RetryDecision {
        if self.exhausted(retry_count) {
            return RetryDecision::rethrow();
        }
        if received_responses >= required_responses && !data_retrieved {
            RetryDecision::retry_same_host(None)
        } else {
            RetryDecision::rethrow()
        }
    }

    fn on_write_timeout(
        &self,
        _statement: &Statement,
        _consistency: ConsistencyLevel,
        write_type: WriteType,
        _required_acks: u32,
        _received_acks: u32,
        retry_count: u32,
    ) -> RetryDecision {
        if self.exhausted(retry_count) {
            return RetryDecision::rethrow();
        }
        if write_type == WriteType::BatchLog {
            RetryDecision::retry_same_host(None)
        } else {
            RetryDecision::rethrow()
        }
    }
}
