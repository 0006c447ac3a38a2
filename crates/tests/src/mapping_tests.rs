//! Typed entities over executed statements.

use std::sync::Arc;

use meridian_core::{
    execution::Row,
    mapping::MappingError,
    policies::{DefaultRetryPolicy, DowngradingConsistencyRetryPolicy},
    Statement, WriteType,
};
use serde::Deserialize;

use crate::mock_infrastructure::{addr, sorted_session, unavailable, write_timeout, MockTransport};

#[derive(Debug, PartialEq, Deserialize)]
struct Account {
    id: i64,
    owner: String,
    #[serde(default)]
    balance: i64,
}

fn account(id: i64, owner: &str) -> Row {
    Row::new().with("id", id).with("owner", owner).with("balance", id * 100)
}

#[tokio::test]
async fn test_execute_mapped_walks_rows() {
    let transport = MockTransport::new();
    transport
        .push_rows(addr(1), vec![account(1, "ada"), account(2, "grace"), account(3, "alan")]);
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2]);

    let mut accounts = session
        .execute_mapped::<Account>(&Statement::new("SELECT * FROM accounts"))
        .await
        .unwrap();

    assert!(accounts.has_more());
    assert_eq!(
        accounts.next_entity().unwrap(),
        Account { id: 1, owner: "ada".into(), balance: 100 }
    );
    let rest = accounts.drain_all().unwrap();
    assert_eq!(rest.iter().map(|a| a.owner.as_str()).collect::<Vec<_>>(), vec!["grace", "alan"]);
    assert!(!accounts.has_more());
    assert!(matches!(accounts.next_entity(), Err(MappingError::Exhausted)));
}

#[tokio::test]
async fn test_mapped_result_exposes_execution_info_unchanged() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), unavailable());
    transport.push_rows(addr(2), vec![account(7, "edsger")]);
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2]);

    let accounts = session
        .execute_mapped::<Account>(&Statement::new("SELECT * FROM accounts"))
        .await
        .unwrap();

    assert_eq!(accounts.execution_info().tried_addresses(), vec![addr(1), addr(2)]);
    assert_eq!(accounts.execution_info().retry_count(), 1);
    let owners: Vec<String> = accounts.map(|a| a.unwrap().owner).collect();
    assert_eq!(owners, vec!["edsger".to_string()]);
}

#[tokio::test]
async fn test_degraded_result_maps_to_nothing() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), write_timeout(WriteType::Batch, 1));
    let session =
        sorted_session(&transport, Arc::new(DowngradingConsistencyRetryPolicy), &[1, 2]);

    let mut accounts = session
        .execute_mapped::<Account>(&Statement::new("UPDATE accounts"))
        .await
        .unwrap();

    assert!(accounts.is_degraded());
    assert!(!accounts.has_more());
    assert!(accounts.drain_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_column_is_a_mapping_error() {
    let transport = MockTransport::new();
    transport.push_rows(addr(1), vec![Row::new().with("id", 1)]);
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1]);

    let mut accounts = session
        .execute_mapped::<Account>(&Statement::new("SELECT id FROM accounts"))
        .await
        .unwrap();

    assert!(matches!(accounts.next_entity(), Err(MappingError::Deserialize(_))));
}
