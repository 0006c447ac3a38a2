//! Pluggable strategies consulted by the request coordinator.
//!
//! The two roles are independent: load balancing never sees failures, and retry policies never
//! see hosts. The coordinator composes them.

pub mod load_balancing;
pub mod retry;

pub use load_balancing::{
    DcAwareRoundRobinPolicy, LoadBalancingPolicy, PolicyListener, QueryPlan, RoundRobinPolicy,
    SortedPolicy, WhiteListPolicy,
};
pub use retry::{
    DefaultRetryPolicy, DowngradingConsistencyRetryPolicy, FallthroughRetryPolicy,
    LoggingRetryPolicy, RetryDecision, RetryPolicy,
};
