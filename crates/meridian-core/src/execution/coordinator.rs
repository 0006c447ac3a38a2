use std::{borrow::Cow, mem, net::SocketAddr, sync::Arc, time::Duration};

use tracing::{debug, warn};

use super::{
    cancel::CancelSignal,
    info::ExecutionInfo,
    result::ResultSet,
    transport::{Response, Transport},
};
use crate::{
    cluster::Host,
    errors::{DriverError, HostFailure, RequestFailure},
    metrics::{self, ErrorMetrics},
    policies::{
        load_balancing::{LoadBalancingPolicy, QueryPlan},
        retry::{self, RetryDecision, RetryPolicy},
    },
    types::{ConsistencyLevel, Statement},
};

/// Request-level defaults applied by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Used when the statement does not set a consistency level.
    pub default_consistency: ConsistencyLevel,
    /// Passed to the load-balancing policy when the statement does not name a keyspace.
    pub default_keyspace: Option<String>,
    /// Pause before each retry. Zero retries immediately.
    pub retry_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_consistency: ConsistencyLevel::One,
            default_keyspace: None,
            retry_delay: Duration::ZERO,
        }
    }
}

/// Per-request state, owned by one `run` call and never shared.
struct RequestExecution {
    consistency: ConsistencyLevel,
    tried_hosts: Vec<Arc<Host>>,
    retry_count: u32,
    last_failure: Option<HostFailure>,
}

impl RequestExecution {
    const fn new(consistency: ConsistencyLevel) -> Self {
        Self { consistency, tried_hosts: Vec::new(), retry_count: 0, last_failure: None }
    }

    fn tried_addresses(&self) -> Vec<SocketAddr> {
        self.tried_hosts.iter().map(|h| h.address()).collect()
    }

    fn retry(&mut self, consistency: Option<ConsistencyLevel>, failure: HostFailure) {
        self.retry_count += 1;
        if let Some(consistency) = consistency {
            self.consistency = consistency;
        }
        self.last_failure = Some(failure);
    }

    fn finish(&mut self) -> ExecutionInfo {
        ExecutionInfo::new(mem::take(&mut self.tried_hosts), self.consistency)
            .with_retry_count(self.retry_count)
    }
}

enum State {
    Start,
    Attempting(Arc<Host>),
    RetryWait(Arc<Host>),
    Done(Result<ResultSet, DriverError>),
}

/// Drives one statement to a terminal outcome.
///
/// The loop pulls hosts from the load-balancing policy's query plan, dispatches each attempt to
/// the transport, and on failure counts it, asks the retry policy what to do, and either stops,
/// stays on the host, or advances the plan. Attempts within a request are strictly sequential.
/// No lock is held while an attempt is in flight.
pub struct Coordinator {
    load_balancing: Arc<dyn LoadBalancingPolicy>,
    retry_policy: Arc<dyn RetryPolicy>,
    transport: Arc<dyn Transport>,
    metrics: Arc<ErrorMetrics>,
    config: CoordinatorConfig,
}

impl Coordinator {
    #[must_use]
    pub fn new(
        load_balancing: Arc<dyn LoadBalancingPolicy>,
        retry_policy: Arc<dyn RetryPolicy>,
        transport: Arc<dyn Transport>,
        metrics: Arc<ErrorMetrics>,
        config: CoordinatorConfig,
    ) -> Self {
        Self { load_balancing, retry_policy, transport, metrics, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Executes `statement` until it succeeds, is suppressed, or fails terminally.
    ///
    /// # Errors
    ///
    /// - [`DriverError::Request`] when the retry policy rethrows or the query is invalid.
    /// - [`DriverError::NoHostAvailable`] when the query plan is empty or exhausted.
    pub async fn execute(&self, statement: &Statement) -> Result<ResultSet, DriverError> {
        self.run(statement, None).await
    }

    /// Like [`execute`](Self::execute), but stops as soon as `cancel` fires.
    ///
    /// # Errors
    ///
    /// Additionally returns [`DriverError::Cancelled`]. Counters already incremented stand.
    pub async fn execute_with_cancel(
        &self,
        statement: &Statement,
        cancel: CancelSignal,
    ) -> Result<ResultSet, DriverError> {
        self.run(statement, Some(cancel)).await
    }

    async fn run(
        &self,
        statement: &Statement,
        mut cancel: Option<CancelSignal>,
    ) -> Result<ResultSet, DriverError> {
        let consistency = statement.consistency().unwrap_or(self.config.default_consistency);
        let keyspace = statement.keyspace().or(self.config.default_keyspace.as_deref());
        // Policies route on the effective level, so a session default is filled in first.
        let routed = match statement.consistency() {
            Some(_) => Cow::Borrowed(statement),
            None => Cow::Owned(statement.clone().with_consistency(consistency)),
        };
        let mut plan = self.load_balancing.new_query_plan(keyspace, &routed);
        let mut request = RequestExecution::new(consistency);
        let mut state = State::Start;

        loop {
            state = match state {
                State::Start => match plan.next() {
                    Some(host) => State::Attempting(host),
                    None => State::Done(Err(self.no_host_available(&mut request))),
                },
                State::Attempting(host) => {
                    if cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
                        State::Done(Err(self.cancelled(&request)))
                    } else {
                        request.tried_hosts.push(Arc::clone(&host));
                        debug!(
                            host = %host.address(),
                            attempt = request.tried_hosts.len(),
                            consistency = %request.consistency,
                            "dispatching request"
                        );

                        let dispatch = self.transport.execute(&host, statement, request.consistency);
                        let outcome = match cancel.as_mut() {
                            Some(signal) => tokio::select! {
                                biased;
                                () = signal.cancelled() => None,
                                outcome = dispatch => Some(outcome),
                            },
                            None => Some(dispatch.await),
                        };

                        match outcome {
                            None => State::Done(Err(self.cancelled(&request))),
                            Some(Ok(response)) => {
                                State::Done(Ok(Self::succeed(&mut request, statement, response)))
                            }
                            Some(Err(failure)) => {
                                self.on_failure(&mut request, statement, host, failure, &mut plan)
                            }
                        }
                    }
                }
                State::RetryWait(host) => {
                    let delay = self.config.retry_delay;
                    let cancelled = match cancel.as_mut() {
                        Some(signal) => tokio::select! {
                            biased;
                            () = signal.cancelled() => true,
                            () = tokio::time::sleep(delay) => false,
                        },
                        None => {
                            tokio::time::sleep(delay).await;
                            false
                        }
                    };
                    if cancelled {
                        State::Done(Err(self.cancelled(&request)))
                    } else {
                        State::Attempting(host)
                    }
                }
                State::Done(outcome) => return outcome,
            };
        }
    }

    fn on_failure(
        &self,
        request: &mut RequestExecution,
        statement: &Statement,
        host: Arc<Host>,
        failure: RequestFailure,
        plan: &mut QueryPlan,
    ) -> State {
        let kind = failure.kind();
        self.metrics.record_error(kind);

        let decision = retry::decide(
            self.retry_policy.as_ref(),
            statement,
            request.consistency,
            &failure,
            request.retry_count,
        );
        debug!(
            host = %host.address(),
            error = %failure,
            %decision,
            retry_count = request.retry_count,
            "attempt failed"
        );

        let address = host.address();
        match decision {
            RetryDecision::Rethrow => {
                warn!(host = %address, error = %failure, attempts = request.tried_hosts.len(), "request failed");
                State::Done(Err(DriverError::Request {
                    host: address,
                    failure,
                    tried_hosts: request.tried_addresses(),
                }))
            }
            RetryDecision::Ignore => {
                self.metrics.record_ignore(kind);
                let info = request.finish().with_suppressed(HostFailure::new(address, failure));
                State::Done(Ok(ResultSet::degraded(info)))
            }
            RetryDecision::RetrySameHost(consistency) => {
                self.metrics.record_retry(kind);
                request.retry(consistency, HostFailure::new(address, failure));
                self.next_attempt(host)
            }
            RetryDecision::TryNextHost(consistency) => {
                request.retry(consistency, HostFailure::new(address, failure));
                match plan.next() {
                    Some(next) => {
                        self.metrics.record_retry(kind);
                        self.next_attempt(next)
                    }
                    None => State::Done(Err(self.no_host_available(request))),
                }
            }
        }
    }

    fn next_attempt(&self, host: Arc<Host>) -> State {
        if self.config.retry_delay.is_zero() {
            State::Attempting(host)
        } else {
            State::RetryWait(host)
        }
    }

    fn succeed(request: &mut RequestExecution, statement: &Statement, response: Response) -> ResultSet {
        let trace = response.trace.filter(|_| statement.is_tracing());
        ResultSet::new(response.rows, request.finish().with_trace(trace))
    }

    fn no_host_available(&self, request: &mut RequestExecution) -> DriverError {
        metrics::record_no_host_available();
        let tried_hosts = request.tried_addresses();
        warn!(
            attempts = tried_hosts.len(),
            policy = self.load_balancing.name(),
            "no host available to execute request"
        );
        DriverError::NoHostAvailable { tried_hosts, last_failure: request.last_failure.take() }
    }

    fn cancelled(&self, request: &RequestExecution) -> DriverError {
        metrics::record_cancelled();
        debug!(attempts = request.tried_hosts.len(), retry_count = request.retry_count, "request cancelled");
        DriverError::Cancelled { tried_hosts: request.tried_addresses() }
    }
}
