//! Scripted transport for coordinator and session tests.

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::Arc,
};

use async_trait::async_trait;
use meridian_core::{
    cluster::Host,
    errors::RequestFailure,
    execution::{Response, Row, Transport},
    types::{ConsistencyLevel, Statement},
};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// One call the coordinator made into the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub host: SocketAddr,
    pub consistency: ConsistencyLevel,
    pub query: String,
}

/// Holds attempts against one host in flight until released.
#[derive(Debug, Default)]
pub struct AttemptGate {
    entered: Notify,
    release: Notify,
}

impl AttemptGate {
    /// Resolves once an attempt has reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets one held attempt continue.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Transport whose answers are scripted per host.
///
/// Each host has a queue of one-shot outcomes consumed in order. Once the queue is empty the
/// host falls back to its persistent failure, if any, and otherwise succeeds with a single row
/// naming the host.
#[derive(Debug, Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<SocketAddr, VecDeque<Result<Response, RequestFailure>>>>,
    persistent: Mutex<HashMap<SocketAddr, RequestFailure>>,
    gates: Mutex<HashMap<SocketAddr, Arc<AttemptGate>>>,
    attempts: Mutex<Vec<Attempt>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next attempt against `host` fails with `failure`.
    pub fn push_failure(&self, host: SocketAddr, failure: RequestFailure) -> &Self {
        self.scripts.lock().entry(host).or_default().push_back(Err(failure));
        self
    }

    /// The next attempt against `host` returns `rows`.
    pub fn push_rows(&self, host: SocketAddr, rows: Vec<Row>) -> &Self {
        self.push_response(host, Response::with_rows(rows))
    }

    pub fn push_response(&self, host: SocketAddr, response: Response) -> &Self {
        self.scripts.lock().entry(host).or_default().push_back(Ok(response));
        self
    }

    /// Every unscripted attempt against `host` fails with `failure`.
    pub fn always_fail(&self, host: SocketAddr, failure: RequestFailure) -> &Self {
        self.persistent.lock().insert(host, failure);
        self
    }

    /// Installs a gate holding every attempt against `host` until released.
    pub fn gate(&self, host: SocketAddr) -> Arc<AttemptGate> {
        Arc::clone(self.gates.lock().entry(host).or_default())
    }

    #[must_use]
    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().clone()
    }

    #[must_use]
    pub fn attempted_hosts(&self) -> Vec<SocketAddr> {
        self.attempts.lock().iter().map(|a| a.host).collect()
    }

    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    fn next_outcome(&self, host: SocketAddr) -> Result<Response, RequestFailure> {
        if let Some(outcome) = self.scripts.lock().get_mut(&host).and_then(VecDeque::pop_front) {
            return outcome;
        }
        if let Some(failure) = self.persistent.lock().get(&host) {
            return Err(failure.clone());
        }
        Ok(Response::with_rows(vec![Row::new().with("host", host.to_string())]))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        host: &Arc<Host>,
        statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<Response, RequestFailure> {
        let address = host.address();
        self.attempts.lock().push(Attempt {
            host: address,
            consistency,
            query: statement.query().to_string(),
        });

        let gate = self.gates.lock().get(&address).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.next_outcome(address)
    }
}
