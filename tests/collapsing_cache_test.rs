//! Integration tests for the request collapsing cache: one execution per
//! group, identical fan-out, independent execution for non-cacheable
//! commands, and the late-registration policy.

mod common;

use common::{init_tracing, TestCommand};
use faultline::{FaultlineError, RequestCollapsingCache, Settings};
use futures::future::join_all;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn concurrent_identical_requests_collapse_into_one_execution() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();

    let commands: Vec<_> = (0..5)
        .map(|n| TestCommand::succeeding(&format!("get-user-{n}"), Some("user:42"), "user 42"))
        .collect();
    let request_ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

    for (request_id, command) in request_ids.iter().zip(&commands) {
        cache.register(*request_id, command.clone());
    }

    let mut deferreds = Vec::new();
    for request_id in &request_ids {
        deferreds.push(cache.resolve(*request_id).unwrap());
    }

    let outcomes = join_all(deferreds.into_iter().map(|deferred| deferred.wait())).await;
    for outcome in outcomes {
        assert_eq!(outcome, Ok("user 42".to_string()));
    }

    let total_runs: usize = commands.iter().map(|command| command.run_count()).sum();
    assert_eq!(total_runs, 1, "exactly one real execution per group");
    assert_eq!(cache.group_count(), 1);
}

#[tokio::test]
async fn commands_without_cache_key_execute_independently() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();

    let commands: Vec<_> = (0..3)
        .map(|_| TestCommand::succeeding("lookup", None, "value"))
        .collect();
    let request_ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    for (request_id, command) in request_ids.iter().zip(&commands) {
        cache.register(*request_id, command.clone());
    }
    for request_id in &request_ids {
        let deferred = cache.resolve(*request_id).unwrap();
        assert_eq!(deferred.wait().await, Ok("value".to_string()));
    }

    for command in &commands {
        assert_eq!(command.run_count(), 1, "each request executes on its own");
    }
    assert_eq!(cache.group_count(), 3);
}

#[tokio::test]
async fn caching_disabled_in_settings_bypasses_collapsing() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();
    let settings = Settings::builder().with_request_cache_enabled(false).build();

    let commands: Vec<_> = (0..2)
        .map(|_| {
            TestCommand::succeeding("lookup", Some("shared-key"), "value")
                .with_settings(settings.clone())
        })
        .collect();
    let request_ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();

    for (request_id, command) in request_ids.iter().zip(&commands) {
        cache.register(*request_id, command.clone());
    }
    for request_id in &request_ids {
        cache.resolve(*request_id).unwrap().wait().await.unwrap();
    }

    for command in &commands {
        assert_eq!(command.run_count(), 1);
    }
    assert_eq!(cache.group_count(), 2);
}

#[tokio::test]
async fn failure_is_broadcast_identically_to_every_waiter() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();

    let first_id = Uuid::new_v4();
    let second_id = Uuid::new_v4();
    cache
        .register(
            first_id,
            TestCommand::failing("get-user", Some("user:7"), "connection refused"),
        )
        .register(
            second_id,
            TestCommand::failing("get-user", Some("user:7"), "connection refused"),
        );

    let first = cache.resolve(first_id).unwrap();
    let second = cache.resolve(second_id).unwrap();

    let expected = Err(FaultlineError::ExecutionFailed("connection refused".into()));
    assert_eq!(first.wait().await, expected);
    assert_eq!(second.wait().await, expected);
}

#[tokio::test]
async fn resolving_an_unregistered_request_is_a_usage_error() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();
    assert!(matches!(
        cache.resolve(Uuid::new_v4()),
        Err(FaultlineError::Usage(_))
    ));
}

#[tokio::test]
async fn late_registration_joins_in_flight_group() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();

    let early = TestCommand::succeeding("get-user", Some("user:9"), "user 9")
        .with_delay(Duration::from_millis(50));
    let early_id = Uuid::new_v4();
    cache.register(early_id, early.clone());
    let early_deferred = cache.resolve(early_id).unwrap();

    // The group is now executing; a second request id arrives for the same key.
    let late = TestCommand::succeeding("get-user", Some("user:9"), "user 9");
    let late_id = Uuid::new_v4();
    cache.register(late_id, late.clone());
    let late_deferred = cache.resolve(late_id).unwrap();

    assert_eq!(early_deferred.wait().await, Ok("user 9".to_string()));
    assert_eq!(late_deferred.wait().await, Ok("user 9".to_string()));

    assert_eq!(early.run_count(), 1);
    assert_eq!(late.run_count(), 0, "late command never executes");
}

#[tokio::test]
async fn create_request_binds_a_fresh_request_id() {
    init_tracing();
    let mut cache: RequestCollapsingCache<String> = RequestCollapsingCache::new();

    let command = TestCommand::succeeding("get-account", Some("account:1"), "account 1");
    let request = cache.create_request(command.clone());
    request.register(&mut cache);

    let outcome = request.resolve(&mut cache).unwrap().wait().await;
    assert_eq!(outcome, Ok("account 1".to_string()));
    assert_eq!(command.run_count(), 1);
}
