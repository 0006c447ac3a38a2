use clap::Subcommand;
use meridian_core::config::DriverConfig;
use std::path::Path;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file (defaults to config/meridian.toml)
        #[arg(short, long, default_value = "config/meridian.toml")]
        file: String,
    },

    /// Show the effective configuration (file plus MERIDIAN__* overrides)
    Show {
        /// Path to config file (defaults to config/meridian.toml)
        #[arg(short, long, default_value = "config/meridian.toml")]
        file: String,
    },

    /// Generate a configuration file with every default spelled out
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/meridian.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommands {
    /// Configuration file the command reads, if any.
    #[must_use]
    pub fn config_file(&self) -> Option<&str> {
        match self {
            Self::Validate { file } | Self::Show { file } => Some(file),
            Self::Generate { .. } => None,
        }
    }
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file } => show_config(&file),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = DriverConfig::from_file(file)?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Contact points: {}", config.contact_points.len());
    println!("  Default consistency: {}", config.query.default_consistency);
    println!("  Load balancing: {:?}", config.load_balancing.policy);
    if let Some(whitelist) = &config.load_balancing.whitelist {
        println!("    whitelisted hosts: {}", whitelist.len());
    }
    println!(
        "  Retry: {:?} (max retries {}, delay {}ms)",
        config.retry.policy, config.retry.max_retries, config.retry.retry_delay_ms
    );
    println!(
        "  Metrics: {}",
        if config.metrics.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    Ok(())
}

fn show_config(file: &str) -> CliResult<()> {
    let config = DriverConfig::from_file(file)?;
    let rendered = toml::to_string_pretty(&config).map_err(|e| CliError::General(e.to_string()))?;

    println!("# Effective configuration from {file}");
    println!("{rendered}");
    Ok(())
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let rendered = toml::to_string_pretty(&DriverConfig::default())
        .map_err(|e| CliError::General(e.to_string()))?;
    std::fs::write(output, rendered)?;

    print_success(&format!("Configuration written to {output}"));
    Ok(())
}
