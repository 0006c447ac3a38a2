//! Layered configuration loading and environment overrides.

use std::path::PathBuf;

use meridian_core::{
    config::{DriverConfig, LoadBalancingPolicyKind, RetryPolicyKind},
    session::SessionBuilder,
    ConsistencyLevel, Statement,
};
use serial_test::serial;

use crate::mock_infrastructure::{addr, unavailable, MockTransport};

const OVERRIDES: [&str; 3] = [
    "MERIDIAN__RETRY__MAX_RETRIES",
    "MERIDIAN__LOAD_BALANCING__POLICY",
    "MERIDIAN__QUERY__DEFAULT_CONSISTENCY",
];

fn clear_overrides() {
    for key in OVERRIDES {
        std::env::remove_var(key);
    }
    std::env::remove_var("MERIDIAN_CONFIG");
}

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("meridian-{}-{name}.toml", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

const CLUSTER: &str = r#"
[[contact_points]]
address = "127.0.0.1:9042"
datacenter = "east"

[[contact_points]]
address = "127.0.0.2:9042"
datacenter = "east"

[load_balancing]
policy = "sorted"

[retry]
max_retries = 1
"#;

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_overrides();

    let config = DriverConfig::from_file("does/not/exist.toml").unwrap();

    assert_eq!(config, DriverConfig::default());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_overrides();
    let path = write_config("env", CLUSTER);
    std::env::set_var("MERIDIAN__RETRY__MAX_RETRIES", "4");
    std::env::set_var("MERIDIAN__LOAD_BALANCING__POLICY", "round_robin");
    std::env::set_var("MERIDIAN__QUERY__DEFAULT_CONSISTENCY", "LOCAL_QUORUM");

    let config = DriverConfig::from_file(&path);
    clear_overrides();
    std::fs::remove_file(&path).unwrap();
    let config = config.unwrap();

    assert_eq!(config.contact_points.len(), 2);
    assert_eq!(config.retry.max_retries, 4);
    assert_eq!(config.retry.policy, RetryPolicyKind::Default);
    assert_eq!(config.load_balancing.policy, LoadBalancingPolicyKind::RoundRobin);
    assert_eq!(config.query.default_consistency, ConsistencyLevel::LocalQuorum);
}

#[test]
#[serial]
fn test_load_reads_path_from_environment() {
    clear_overrides();
    let path = write_config("load", CLUSTER);
    std::env::set_var("MERIDIAN_CONFIG", &path);

    let config = DriverConfig::load();
    clear_overrides();
    std::fs::remove_file(&path).unwrap();
    let config = config.unwrap();

    assert_eq!(config.load_balancing.policy, LoadBalancingPolicyKind::Sorted);
    assert_eq!(config.contact_points[1].address, addr(2));
    assert!(config.validate().is_ok());
}

#[tokio::test]
#[serial]
async fn test_session_from_loaded_config() {
    clear_overrides();
    let path = write_config("session", CLUSTER);
    let config = DriverConfig::from_file(&path);
    std::fs::remove_file(&path).unwrap();
    let config = config.unwrap();

    let transport = MockTransport::new();
    transport.push_failure(addr(1), unavailable());
    let session = SessionBuilder::from_config(&config)
        .unwrap()
        .transport(transport.clone())
        .build()
        .unwrap();

    let result = session.execute(&Statement::new("SELECT 1")).await.unwrap();

    assert_eq!(session.load_balancing_policy().name(), "sorted");
    assert_eq!(result.execution_info().tried_addresses(), vec![addr(1), addr(2)]);
}
