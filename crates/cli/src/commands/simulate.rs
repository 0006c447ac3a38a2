use std::{collections::HashMap, net::SocketAddr, str::FromStr, sync::Arc};

use async_trait::async_trait;
use clap::Args;
use meridian_core::{
    cluster::{Host, HostEvent},
    config::DriverConfig,
    errors::RequestFailure,
    execution::{Response, Row, Transport},
    types::{ConsistencyLevel, Statement, WriteType},
    session::SessionBuilder,
    Session,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use super::utils::{print_info, CliError, CliResult};

#[derive(Args)]
pub struct SimulateArgs {
    /// Path to config file (defaults to config/meridian.toml)
    #[arg(short, long, default_value = "config/meridian.toml")]
    file: String,

    /// Number of statements to execute
    #[arg(short = 'n', long, default_value = "5")]
    requests: usize,

    /// Statement text sent to the simulated hosts
    #[arg(short, long, default_value = "SELECT release_version FROM system.local")]
    query: String,

    /// Consistency level override for every statement
    #[arg(short, long)]
    consistency: Option<ConsistencyLevel>,

    /// Make a host always fail: `ADDR=KIND` where KIND is unavailable, read_timeout,
    /// write_timeout, connection, overloaded or invalid (can be specified multiple times)
    #[arg(long = "fail", value_parser = parse_fault)]
    faults: Vec<(SocketAddr, Fault)>,

    /// Probability in [0, 1] that any otherwise healthy attempt fails with a connection error
    #[arg(long, default_value = "0.0")]
    failure_rate: f64,

    /// Mark hosts down before running, delivered through the background event dispatcher
    #[arg(long)]
    down: Vec<SocketAddr>,

    /// Print the Prometheus exposition after the run
    #[arg(long)]
    prometheus: bool,
}

impl SimulateArgs {
    #[must_use]
    pub fn config_file(&self) -> &str {
        &self.file
    }
}

/// Failure a simulated host answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Unavailable,
    ReadTimeout,
    WriteTimeout,
    Connection,
    Overloaded,
    Invalid,
}

impl FromStr for Fault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unavailable" => Ok(Self::Unavailable),
            "read_timeout" => Ok(Self::ReadTimeout),
            "write_timeout" => Ok(Self::WriteTimeout),
            "connection" => Ok(Self::Connection),
            "overloaded" => Ok(Self::Overloaded),
            "invalid" => Ok(Self::Invalid),
            other => Err(format!("unknown failure kind '{other}'")),
        }
    }
}

impl Fault {
    fn failure(self, host: SocketAddr, consistency: ConsistencyLevel) -> RequestFailure {
        match self {
            Self::Unavailable => RequestFailure::Unavailable { consistency, required: 2, alive: 1 },
            Self::ReadTimeout => RequestFailure::ReadTimeout {
                consistency,
                required: 2,
                received: 2,
                data_retrieved: false,
            },
            Self::WriteTimeout => RequestFailure::WriteTimeout {
                consistency,
                write_type: WriteType::Simple,
                required: 2,
                received: 1,
            },
            Self::Connection => RequestFailure::Connection(format!("connection to {host} refused")),
            Self::Overloaded => RequestFailure::Overloaded(format!("{host} is overloaded")),
            Self::Invalid => RequestFailure::Invalid("simulated syntax error".to_string()),
        }
    }
}

fn parse_fault(value: &str) -> Result<(SocketAddr, Fault), String> {
    let (address, kind) =
        value.split_once('=').ok_or_else(|| format!("expected ADDR=KIND, got '{value}'"))?;
    let address = address.parse::<SocketAddr>().map_err(|e| format!("{address}: {e}"))?;
    Ok((address, kind.parse()?))
}

/// In-process transport answering from a fixed fault table.
struct SimulatedTransport {
    faults: HashMap<SocketAddr, Fault>,
    failure_rate: f64,
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn execute(
        &self,
        host: &Arc<Host>,
        _statement: &Statement,
        consistency: ConsistencyLevel,
    ) -> Result<Response, RequestFailure> {
        let address = host.address();
        if let Some(fault) = self.faults.get(&address) {
            return Err(fault.failure(address, consistency));
        }
        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            return Err(RequestFailure::Connection(format!("injected failure on {address}")));
        }

        let row = Row::new()
            .with("coordinator", address.to_string())
            .with("consistency", consistency.as_str())
            .with("release_version", "4.1.0");
        Ok(Response::with_rows(vec![row]))
    }
}

pub async fn run_simulation(args: SimulateArgs) -> CliResult<()> {
    if !(0.0..=1.0).contains(&args.failure_rate) {
        return Err(CliError::Config("--failure-rate must be within [0, 1]".to_string()));
    }

    let config = DriverConfig::from_file(&args.file)?;
    let exporter = if config.metrics.enabled && (args.prometheus || config.metrics.prometheus) {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| CliError::General(format!("failed to install recorder: {e}")))?,
        )
    } else {
        None
    };

    let transport = SimulatedTransport {
        faults: args.faults.into_iter().collect(),
        failure_rate: args.failure_rate,
    };
    let session = SessionBuilder::from_config(&config)?.transport(Arc::new(transport)).build()?;

    if !args.down.is_empty() {
        mark_down(&session, args.down).await?;
    }

    print_info(&format!(
        "Running {} statements against {} hosts ({})",
        args.requests,
        session.registry().len(),
        session.load_balancing_policy().name()
    ));

    let mut statement = Statement::new(args.query);
    if let Some(consistency) = args.consistency {
        statement = statement.with_consistency(consistency);
    }

    for request in 1..=args.requests {
        match session.execute(&statement).await {
            Ok(result) => {
                let info = result.execution_info();
                println!(
                    "request {request}: ok tried={} consistency={} retries={}{}",
                    format_hosts(&info.tried_addresses()),
                    info.achieved_consistency(),
                    info.retry_count(),
                    if info.is_degraded() { " (degraded)" } else { "" }
                );
            }
            Err(error) => {
                println!(
                    "request {request}: failed tried={} error={error}",
                    format_hosts(error.tried_hosts())
                );
            }
        }
    }

    let summary = json!({
        "hosts": session.registry().stats(),
        "errors": session.error_metrics().snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(handle) = exporter {
        println!("{}", handle.render());
    }
    Ok(())
}

async fn mark_down(session: &Session, hosts: Vec<SocketAddr>) -> CliResult<()> {
    let (events_tx, events_rx) = mpsc::channel(hosts.len().max(1));
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let dispatcher = session.event_dispatcher().spawn(events_rx, shutdown_rx);

    for host in hosts {
        debug!(host = %host, "queueing down event");
        events_tx
            .send(HostEvent::Down(host))
            .await
            .map_err(|e| CliError::General(format!("event dispatcher stopped: {e}")))?;
    }
    drop(events_tx);

    let applied =
        dispatcher.await.map_err(|e| CliError::General(format!("event dispatcher failed: {e}")))?;
    info!(applied, "topology events applied");
    Ok(())
}

fn format_hosts(hosts: &[SocketAddr]) -> String {
    let hosts: Vec<String> = hosts.iter().map(ToString::to_string).collect();
    format!("[{}]", hosts.join(", "))
}
