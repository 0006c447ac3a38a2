use super::{RetryDecision, RetryPolicy};
use crate::types::{ConsistencyLevel, Statement, WriteType};

/// Trades consistency for availability: when the requested level cannot be met, retries once
/// at the highest level the failure says is still reachable.
///
/// Applications using this policy must be able to live with reads that may miss recent writes
/// and writes that may not reach the requested number of replicas. The consistency actually
/// achieved is reported in `ExecutionInfo::achieved_consistency`.
///
/// | Failure | Decision |
/// |---------|----------|
/// | unavailable, serial level | next host, same level |
/// | unavailable | same host at `THREE`/`TWO`/`ONE` from alive replicas |
/// | read timeout, too few responses | same host at the level the responses allow |
/// | read timeout, data missing | same host, same level |
/// | write timeout, `SIMPLE`/`BATCH` with any ack | ignore (the write is persisted somewhere) |
/// | write timeout, `UNLOGGED_BATCH` | same host at the level the acks allow |
/// | write timeout, `BATCH_LOG` | same host, same level |
///
/// Everything else, and any second failure, is rethrown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DowngradingConsistencyRetryPolicy;

impl DowngradingConsistencyRetryPolicy {
    fn max_likely_to_work(known_ok: u32, current: ConsistencyLevel) -> RetryDecision {
        let level = match known_ok {
            0 if current != ConsistencyLevel::EachQuorum => return RetryDecision::rethrow(),
            // EACH_QUORUM does not report a global alive count; a replica elsewhere may be up.
            0 | 1 => ConsistencyLevel::One,
            2 => ConsistencyLevel::Two,
            _ => ConsistencyLevel::Three,
        };
        RetryDecision::retry_same_host(Some(level))
    }
}

impl RetryPolicy for DowngradingConsistencyRetryPolicy {
    fn on_unavailable(
        &self,
        _statement: &Statement,
        consistency: ConsistencyLevel,
        _required_replicas: u32,
        alive_replicas: u32,
        retry_count: u32,
    ) -> RetryDecision {
        if retry_count != 0 {
            return RetryDecision::rethrow();
        }
        // Paxos failed on this coordinator; another one may not be partitioned away.
        if consistency.is_serial() {
            return RetryDecision::try_next_host(None);
        }
        Self::max_likely_to_work(alive_replicas, consistency)
    }

    fn on_read_timeout(
        &self,
        _statement: &Statement,
        consistency: ConsistencyLevel,
        required_responses: u32,
        received_responses: u32,
        data_retrieved: bool,
        retry_count: u32,
    ) -> RetryDecision {
        if retry_count != 0 || consistency.is_serial() {
            return RetryDecision::rethrow();
        }
        if received_responses < required_responses {
            Self::max_likely_to_work(received_responses, consistency)
        } else if !data_retrieved {
            RetryDecision::retry_same_host(None)
        } else {
            RetryDecision::rethrow()
        }
    }

    fn on_write_timeout(
        &self,
        _statement: &Statement,
        consistency: ConsistencyLevel,
        write_type: WriteType,
        _required_acks: u32,
        received_acks: u32,
        retry_count: u32,
    ) -> RetryDecision {
        if retry_count != 0 {
            return RetryDecision::rethrow();
        }
        match write_type {
            WriteType::Simple | WriteType::Batch if received_acks > 0 => RetryDecision::ignore(),
            WriteType::UnloggedBatch => Self::max_likely_to_work(received_acks, consistency),
            WriteType::BatchLog => RetryDecision::retry_same_host(None),
            _ => RetryDecision::rethrow(),
        }
    }
}
