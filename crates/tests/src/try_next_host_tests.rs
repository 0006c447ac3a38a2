//! Fail-over along a deterministic query plan.

use std::sync::Arc;

use meridian_core::{errors::FailureKind, ConsistencyLevel, DriverError, Statement};

use crate::mock_infrastructure::{
    addr, addrs, sorted_session, unavailable, MockTransport, TryNextHostOnUnavailable,
};

#[tokio::test]
async fn test_should_try_on_next_host_in_query_plan() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), unavailable());
    let session = sorted_session(&transport, Arc::new(TryNextHostOnUnavailable), &[1, 2, 3]);

    let statement = Statement::new("mock query").with_consistency(ConsistencyLevel::One);
    let result = session.execute(&statement).await.unwrap();

    let tried = result.execution_info().tried_addresses();
    assert_eq!(tried, vec![addr(1), addr(2)]);
    assert_eq!(session.error_metrics().errors(FailureKind::Unavailable), 1);
    assert_eq!(session.error_metrics().retries(FailureKind::Unavailable), 1);
}

#[tokio::test]
async fn test_tried_hosts_follow_plan_order_for_any_failure_count() {
    const HOSTS: [u8; 3] = [1, 2, 3];

    for failing in 0..=HOSTS.len() + 1 {
        let transport = MockTransport::new();
        for n in HOSTS.iter().take(failing) {
            transport.always_fail(addr(*n), unavailable());
        }
        let session = sorted_session(&transport, Arc::new(TryNextHostOnUnavailable), &HOSTS);

        let outcome = session.execute(&Statement::new("mock query")).await;
        let failed = failing.min(HOSTS.len());

        if failing < HOSTS.len() {
            let result = outcome.unwrap();
            assert_eq!(result.execution_info().tried_addresses(), addrs(&HOSTS[..=failing]));
        } else {
            let err = outcome.unwrap_err();
            assert!(matches!(err, DriverError::NoHostAvailable { .. }));
            assert_eq!(err.tried_hosts(), addrs(&HOSTS).as_slice());
        }
        assert_eq!(transport.attempted_hosts()[..failed], addrs(&HOSTS[..failed]));
        assert_eq!(
            session.error_metrics().errors(FailureKind::Unavailable),
            u64::try_from(failed).unwrap()
        );
    }
}

#[tokio::test]
async fn test_exhausted_plan_reports_last_failure() {
    let transport = MockTransport::new();
    for n in [1, 2] {
        transport.always_fail(addr(n), unavailable());
    }
    let session = sorted_session(&transport, Arc::new(TryNextHostOnUnavailable), &[1, 2]);

    let err = session.execute(&Statement::new("mock query")).await.unwrap_err();

    let DriverError::NoHostAvailable { tried_hosts, last_failure } = err else {
        panic!("expected NoHostAvailable, got {err}");
    };
    assert_eq!(tried_hosts, vec![addr(1), addr(2)]);
    let last = last_failure.unwrap();
    assert_eq!(last.host, addr(2));
    assert_eq!(last.failure.kind(), FailureKind::Unavailable);
}
