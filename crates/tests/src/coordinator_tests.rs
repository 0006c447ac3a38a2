//! Retry decisions, metrics accounting and terminal outcomes of the coordinator.

use std::sync::Arc;

use futures::future::join_all;
use meridian_core::{
    cluster::HostEvent,
    errors::{FailureKind, RequestFailure},
    execution::cancellation,
    metrics::ErrorMetrics,
    policies::{
        DefaultRetryPolicy, DowngradingConsistencyRetryPolicy, FallthroughRetryPolicy,
        RetryDecision, SortedPolicy,
    },
    ConsistencyLevel, DriverError, Session, Statement, WriteType,
};

use crate::mock_infrastructure::{
    addr, read_timeout, sorted_session, unavailable, write_timeout, FixedDecision, MockTransport,
    TryNextHostOnUnavailable,
};

#[tokio::test]
async fn test_rethrow_on_first_unavailable() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), unavailable());
    let session = sorted_session(&transport, Arc::new(FallthroughRetryPolicy), &[1, 2, 3]);

    let err = session.execute(&Statement::new("SELECT 1")).await.unwrap_err();

    let DriverError::Request { host, failure, tried_hosts } = err else {
        panic!("expected a request error, got {err}");
    };
    assert_eq!(host, addr(1));
    assert_eq!(failure, unavailable());
    assert_eq!(tried_hosts, vec![addr(1)]);
    assert_eq!(session.error_metrics().errors(FailureKind::Unavailable), 1);
    assert_eq!(session.error_metrics().retries(FailureKind::Unavailable), 0);
    assert_eq!(transport.attempt_count(), 1);
}

#[tokio::test]
async fn test_empty_plan_is_no_host_available() {
    let transport = MockTransport::new();
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[]);

    let err = session.execute(&Statement::new("SELECT 1")).await.unwrap_err();

    assert!(err.is_no_host_available());
    assert!(err.tried_hosts().is_empty());
    assert_eq!(transport.attempt_count(), 0);
    for kind in FailureKind::ALL {
        assert_eq!(session.error_metrics().errors(kind), 0);
    }
}

#[tokio::test]
async fn test_all_hosts_down_is_no_host_available() {
    let transport = MockTransport::new();
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2]);
    assert!(session.apply_event(HostEvent::Down(addr(1))));
    assert!(session.apply_event(HostEvent::Down(addr(2))));

    let err = session.execute(&Statement::new("SELECT 1")).await.unwrap_err();

    assert!(err.is_no_host_available());
    assert_eq!(transport.attempt_count(), 0);
    assert_eq!(session.error_metrics().total_errors(), 0);
}

#[tokio::test]
async fn test_retry_same_host_records_duplicate_entries() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), unavailable()).push_failure(addr(1), unavailable());
    let policy = FixedDecision::new(RetryDecision::retry_same_host(None)).with_limit(2);
    let session = sorted_session(&transport, Arc::new(policy), &[1, 2]);

    let result = session.execute(&Statement::new("SELECT 1")).await.unwrap();

    let info = result.execution_info();
    assert_eq!(info.tried_addresses(), vec![addr(1), addr(1), addr(1)]);
    assert_eq!(info.retry_count(), 2);
    assert_eq!(session.error_metrics().errors(FailureKind::Unavailable), 2);
    assert_eq!(session.error_metrics().retries(FailureKind::Unavailable), 2);
}

#[tokio::test]
async fn test_retry_same_host_budget_then_rethrow() {
    let transport = MockTransport::new();
    transport.always_fail(addr(1), read_timeout(2, false));
    let policy = FixedDecision::new(RetryDecision::retry_same_host(None)).with_limit(3);
    let session = sorted_session(&transport, Arc::new(policy), &[1, 2]);

    let err = session.execute(&Statement::new("SELECT 1")).await.unwrap_err();

    assert_eq!(err.tried_hosts(), &[addr(1); 4]);
    assert_eq!(err.failure_kind(), Some(FailureKind::ReadTimeout));
    assert_eq!(session.error_metrics().errors(FailureKind::ReadTimeout), 4);
}

#[tokio::test]
async fn test_ignore_yields_degraded_result() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), write_timeout(WriteType::Simple, 1));
    let session =
        sorted_session(&transport, Arc::new(FixedDecision::new(RetryDecision::ignore())), &[1, 2]);

    let ignored = session.execute(&Statement::new("INSERT")).await.unwrap();
    let ordinary = session.execute(&Statement::new("INSERT")).await.unwrap();

    assert!(ignored.is_degraded());
    assert!(ignored.is_exhausted());
    let suppressed = ignored.execution_info().suppressed_failure().unwrap();
    assert_eq!(suppressed.host, addr(1));
    assert_eq!(suppressed.failure.kind(), FailureKind::WriteTimeout);
    assert!(!ordinary.is_degraded());
    assert_eq!(ordinary.remaining(), 1);

    let metrics = session.error_metrics();
    assert_eq!(metrics.errors(FailureKind::WriteTimeout), 1);
    assert_eq!(metrics.ignores(FailureKind::WriteTimeout), 1);
    assert_eq!(metrics.retries(FailureKind::WriteTimeout), 0);
}

#[tokio::test]
async fn test_default_policy_retry_budget() {
    let transport = MockTransport::new();
    for n in 1..=4 {
        transport.always_fail(addr(n), unavailable());
    }
    let session =
        sorted_session(&transport, Arc::new(DefaultRetryPolicy::with_max_retries(2)), &[1, 2, 3, 4]);

    let err = session.execute(&Statement::new("SELECT 1")).await.unwrap_err();

    assert!(matches!(err, DriverError::Request { .. }));
    assert_eq!(err.tried_hosts(), &[addr(1), addr(2), addr(3)]);
    assert_eq!(session.error_metrics().errors(FailureKind::Unavailable), 3);
    assert_eq!(session.error_metrics().retries(FailureKind::Unavailable), 2);
}

#[tokio::test]
async fn test_connection_errors_walk_the_whole_plan() {
    let transport = MockTransport::new();
    for n in 1..=3 {
        transport.always_fail(addr(n), RequestFailure::Connection(format!("host {n} refused")));
    }
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2, 3]);

    let err = session.execute(&Statement::new("SELECT 1")).await.unwrap_err();

    let DriverError::NoHostAvailable { tried_hosts, last_failure } = err else {
        panic!("expected NoHostAvailable, got {err}");
    };
    assert_eq!(tried_hosts, vec![addr(1), addr(2), addr(3)]);
    assert_eq!(last_failure.unwrap().failure, RequestFailure::Connection("host 3 refused".into()));
    assert_eq!(session.error_metrics().errors(FailureKind::ConnectionError), 3);
    assert_eq!(session.error_metrics().retries(FailureKind::ConnectionError), 2);
}

#[tokio::test]
async fn test_overloaded_and_invalid_count_as_other() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), RequestFailure::Overloaded("busy".into()));
    transport.push_failure(addr(2), RequestFailure::Invalid("no such table".into()));
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2, 3]);

    let err = session.execute(&Statement::new("SELECT * FROM missing")).await.unwrap_err();

    assert!(matches!(
        err,
        DriverError::Request { failure: RequestFailure::Invalid(_), .. }
    ));
    assert_eq!(err.tried_hosts(), &[addr(1), addr(2)]);
    assert_eq!(session.error_metrics().errors(FailureKind::Other), 2);
    assert_eq!(session.error_metrics().retries(FailureKind::Other), 1);
}

#[tokio::test]
async fn test_downgraded_consistency_reaches_transport() {
    let transport = MockTransport::new();
    transport.push_failure(
        addr(1),
        RequestFailure::Unavailable { consistency: ConsistencyLevel::Quorum, required: 2, alive: 1 },
    );
    let session =
        sorted_session(&transport, Arc::new(DowngradingConsistencyRetryPolicy), &[1, 2]);

    let statement = Statement::new("SELECT 1").with_consistency(ConsistencyLevel::Quorum);
    let result = session.execute(&statement).await.unwrap();

    let levels: Vec<_> = transport.attempts().into_iter().map(|a| a.consistency).collect();
    assert_eq!(levels, vec![ConsistencyLevel::Quorum, ConsistencyLevel::One]);
    assert_eq!(result.execution_info().achieved_consistency(), ConsistencyLevel::One);
    assert_eq!(result.execution_info().tried_addresses(), vec![addr(1), addr(1)]);
}

#[tokio::test]
async fn test_cancel_while_attempt_in_flight() {
    let transport = MockTransport::new();
    let gate = transport.gate(addr(1));
    let session =
        Arc::new(sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2]));
    let (handle, signal) = cancellation();

    let request = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            session.execute_with_cancel(&Statement::new("SELECT 1"), signal).await
        })
    };
    gate.entered().await;
    handle.cancel();

    let err = request.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.tried_hosts(), &[addr(1)]);
    assert_eq!(transport.attempt_count(), 1);
    assert_eq!(session.error_metrics().total_errors(), 0);
}

#[tokio::test]
async fn test_uncancelled_signal_does_not_interfere() {
    let transport = MockTransport::new();
    transport.push_failure(addr(1), unavailable());
    let session = sorted_session(&transport, Arc::new(DefaultRetryPolicy::new()), &[1, 2]);
    let (_handle, signal) = cancellation();

    let result = session.execute_with_cancel(&Statement::new("SELECT 1"), signal).await.unwrap();

    assert_eq!(result.execution_info().tried_addresses(), vec![addr(1), addr(2)]);
}

#[tokio::test]
async fn test_concurrent_requests_share_metrics() {
    let transport = MockTransport::new();
    transport.always_fail(addr(1), unavailable());
    let session =
        Arc::new(sorted_session(&transport, Arc::new(TryNextHostOnUnavailable), &[1, 2, 3]));

    let requests = (0..32).map(|i| {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            session.execute(&Statement::new(format!("SELECT {i}"))).await
        })
    });
    let results = join_all(requests).await;

    for result in results {
        let result = result.unwrap().unwrap();
        assert_eq!(result.execution_info().tried_addresses(), vec![addr(1), addr(2)]);
    }
    assert_eq!(session.error_metrics().errors(FailureKind::Unavailable), 32);
    assert_eq!(session.error_metrics().retries(FailureKind::Unavailable), 32);
}

#[tokio::test]
async fn test_sessions_can_share_error_metrics() {
    let metrics = Arc::new(ErrorMetrics::new());
    let transport = MockTransport::new();
    transport.always_fail(addr(1), unavailable());

    let build = || {
        Session::builder()
            .transport(transport.clone())
            .load_balancing_policy(Arc::new(SortedPolicy::new()))
            .retry_policy(Arc::new(TryNextHostOnUnavailable))
            .error_metrics(Arc::clone(&metrics))
            .contact_point(addr(1))
            .contact_point(addr(2))
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();

    first.execute(&Statement::new("SELECT 1")).await.unwrap();
    second.execute(&Statement::new("SELECT 1")).await.unwrap();

    assert_eq!(metrics.errors(FailureKind::Unavailable), 2);
    assert_eq!(metrics.snapshot().errors[&FailureKind::Unavailable], 2);
}
