//! Polling behaviour of the status reconciler on virtual time.

use std::sync::Arc;
use std::time::Duration;

use downstream_core::fakes::{build, ScriptedClient};
use downstream_core::{BuildStatus, DownstreamError, StatusReconciler, Target, TriggerRecord};
use tokio::time::Instant;

fn triggers(entries: &[(&str, u64)]) -> TriggerRecord {
    let mut record = TriggerRecord::new();
    for (descriptor, number) in entries {
        record.record(Target::parse(descriptor, "main").unwrap(), *number);
    }
    record
}

fn client_with(builds: &[(&str, u64)]) -> Arc<ScriptedClient> {
    let client = Arc::new(ScriptedClient::new());
    for (repo, number) in builds {
        client.add_builds(repo, vec![build(*number, "main", "push", "pending")]);
    }
    client
}

#[tokio::test(start_paused = true)]
async fn all_builds_satisfied_returns_before_timeout() {
    let client = client_with(&[("org/a", 101), ("org/b", 102)]);
    client.script_statuses("org/a", 101, &["success"]);
    client.script_statuses("org/b", 102, &["running", "success"]);

    let timeout = Duration::from_secs(30 * 60);
    let start = Instant::now();
    StatusReconciler::new(client.clone())
        .reconcile(
            &triggers(&[("org/a", 101), ("org/b", 102)]),
            &[BuildStatus::Success],
            timeout,
        )
        .await
        .expect("reconciled");

    // Grace period plus one poll interval.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
    assert!(elapsed < timeout);

    // Poll 1 fetches both; poll 2 only the one still running.
    let polled: Vec<u64> = client.get_calls().iter().map(|(_, n)| *n).collect();
    assert_eq!(polled, vec![101, 102, 102]);
}

#[tokio::test(start_paused = true)]
async fn non_target_terminal_status_aborts_immediately() {
    let client = client_with(&[("org/a", 7), ("org/b", 8)]);
    client.script_statuses("org/a", 7, &["failure"]);
    client.script_statuses("org/b", 8, &["running"]);

    let err = StatusReconciler::new(client.clone())
        .reconcile(
            &triggers(&[("org/a", 7), ("org/b", 8)]),
            &[BuildStatus::Success],
            Duration::from_secs(600),
        )
        .await
        .unwrap_err();

    match err {
        DownstreamError::BuildFailed {
            repo,
            number,
            status,
        } => {
            assert_eq!(repo, "org/a");
            assert_eq!(number, 7);
            assert_eq!(status, "failure");
        }
        other => panic!("unexpected error: {other}"),
    }
    // org/b is never polled once org/a has failed.
    assert_eq!(client.get_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn pending_past_deadline_times_out() {
    let client = client_with(&[("org/a", 5)]);
    client.script_statuses("org/a", 5, &["running"]);

    let start = Instant::now();
    let err = StatusReconciler::new(client.clone())
        .reconcile(
            &triggers(&[("org/a", 5)]),
            &[BuildStatus::Success],
            Duration::from_secs(60),
        )
        .await
        .unwrap_err();

    match err {
        DownstreamError::Timeout {
            timeout_secs,
            pending,
        } => {
            assert_eq!(timeout_secs, 60);
            assert_eq!(pending, vec!["org/a/5".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Polls at 30s, 60s and 90s; the deadline is 60s after the grace period.
    assert_eq!(client.get_calls().len(), 3);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(90) && elapsed < Duration::from_secs(91));
}

#[tokio::test(start_paused = true)]
async fn poll_failure_is_fatal_without_retry() {
    let client = client_with(&[("org/a", 5)]);
    client.fail_get("org/a", 5);

    let err = StatusReconciler::new(client.clone())
        .reconcile(
            &triggers(&[("org/a", 5)]),
            &[BuildStatus::Success],
            Duration::from_secs(600),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DownstreamError::Transport { .. }));
    assert!(err.to_string().contains("org/a/5"));
    assert_eq!(client.get_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn same_number_in_two_repos_tracked_separately() {
    let client = client_with(&[("org/a", 3), ("org/b", 3)]);
    client.script_statuses("org/a", 3, &["success"]);
    client.script_statuses("org/b", 3, &["running", "running", "success"]);

    StatusReconciler::new(client.clone())
        .with_intervals(Duration::from_secs(1), Duration::from_secs(1))
        .reconcile(
            &triggers(&[("org/a", 3), ("org/b", 3)]),
            &[BuildStatus::Success],
            Duration::from_secs(600),
        )
        .await
        .expect("reconciled");

    let b_polls = client
        .get_calls()
        .iter()
        .filter(|(repo, _)| repo == "org/b")
        .count();
    assert_eq!(b_polls, 3);
}

#[tokio::test(start_paused = true)]
async fn empty_trigger_record_returns_without_waiting() {
    let client = Arc::new(ScriptedClient::new());
    let start = Instant::now();
    StatusReconciler::new(client.clone())
        .reconcile(
            &TriggerRecord::new(),
            &[BuildStatus::Success],
            Duration::from_secs(60),
        )
        .await
        .expect("nothing to wait on");
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(client.get_calls().is_empty());
}
