use anyhow::Result;
use clap::{Parser, Subcommand};
use meridian_core::config::{DriverConfig, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{handle_config_command, run_simulation, ConfigCommands, SimulateArgs};

#[derive(Parser)]
#[command(name = "meridian-cli")]
#[command(about = "Meridian CLI - Inspect and exercise the driver's request coordination")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Run statements through a session backed by simulated hosts
    Simulate(SimulateArgs),
}

impl Commands {
    /// Configuration file the command reads, if any.
    fn config_file(&self) -> Option<&str> {
        match self {
            Self::Config(command) => command.config_file(),
            Self::Simulate(args) => Some(args.config_file()),
        }
    }
}

/// Logging settings from the file the command reads, or from `MERIDIAN_CONFIG`.
fn logging_config(command: &Commands) -> LoggingConfig {
    let config = match command.config_file() {
        Some(file) => DriverConfig::from_file(file),
        None => DriverConfig::load(),
    };
    config.map(|c| c.logging).unwrap_or_default()
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,meridian_core={0},meridian_cli={0}", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        // "pretty" and any other format default to pretty logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&logging_config(&cli.command));

    match cli.command {
        Commands::Config(config_command) => handle_config_command(config_command)?,
        Commands::Simulate(args) => run_simulation(args).await?,
    }

    Ok(())
}
