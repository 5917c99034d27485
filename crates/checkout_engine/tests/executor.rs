mod common;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use checkout_core::{ErrorCategory, ItemStatus, Outcome, RemoteError, RunState, WorkItem};
use checkout_engine::{Attempted, ChannelObserver, ItemExecutor, NoopObserver, RunEvent};
use common::{config, init_logging, ScriptedRemote};
use pretty_assertions::assert_eq;

fn item() -> WorkItem {
    WorkItem::new("user0", "BC0000")
}

#[tokio::test(start_paused = true)]
async fn retries_server_errors_with_exponential_backoff() {
    init_logging();
    let remote = ScriptedRemote::new().script(
        "BC0000",
        vec![
            Err(RemoteError::new(503, "Service Unavailable")),
            Err(RemoteError::new(503, "Service Unavailable")),
        ],
    );
    let config = config(10);
    let executor = ItemExecutor::new(&remote, &config);
    let (observer, events) = ChannelObserver::pair();

    let started = tokio::time::Instant::now();
    let attempted = executor.attempt(0, &item(), &observer).await;

    assert_eq!(
        attempted,
        Attempted {
            outcome: Outcome::Success,
            attempts: 3
        }
    );
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(3), "waited {waited:?}");
    assert!(waited < Duration::from_millis(3_100), "waited {waited:?}");

    let delays: Vec<_> = events
        .try_iter()
        .filter_map(|event| match event {
            RunEvent::Retrying { delay, status, .. } => Some((status, delay)),
            _ => None,
        })
        .collect();
    assert_eq!(
        delays,
        vec![(503, Duration::from_secs(1)), (503, Duration::from_secs(2))]
    );
}

#[tokio::test]
async fn bad_request_is_never_retried() {
    let remote = ScriptedRemote::new().script("BC0000", vec![Err(RemoteError::new(400, "Bad"))]);
    let config = config(10);
    let executor = ItemExecutor::new(&remote, &config);

    let attempted = executor.attempt(0, &item(), &NoopObserver).await;

    assert_eq!(attempted.attempts, 1);
    assert_eq!(attempted.outcome.category(), Some(ErrorCategory::InvalidRequest));
    assert_eq!(remote.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_the_last_error() {
    let remote = ScriptedRemote::new().script(
        "BC0000",
        vec![
            Err(RemoteError::transport("connection refused")),
            Err(RemoteError::new(502, "Bad Gateway")),
            Err(RemoteError::transport("connection reset")),
        ],
    );
    let config = config(10);
    let executor = ItemExecutor::new(&remote, &config);

    let attempted = executor.attempt(0, &item(), &NoopObserver).await;

    assert_eq!(attempted.attempts, 3);
    assert_eq!(
        attempted.outcome,
        Outcome::error(ErrorCategory::TransportError, "Network error - check your connection")
    );
}

#[tokio::test(start_paused = true)]
async fn server_error_after_retries_is_a_server_error() {
    let unavailable = || Err(RemoteError::new(500, "Internal Server Error"));
    let remote =
        ScriptedRemote::new().script("BC0000", vec![unavailable(), unavailable(), unavailable()]);
    let config = config(10);
    let executor = ItemExecutor::new(&remote, &config);

    let attempted = executor.attempt(0, &item(), &NoopObserver).await;

    assert_eq!(attempted.outcome.category(), Some(ErrorCategory::ServerError));
    assert_eq!(attempted.outcome.message(), "Server error - please try again later");
}

#[tokio::test]
async fn execute_records_the_outcome_exactly_once() {
    let remote = ScriptedRemote::new().script("BC0000", vec![Err(RemoteError::new(404, "Nope"))]);
    let config = config(10);
    let executor = ItemExecutor::new(&remote, &config);
    let state = Mutex::new(RunState::new());
    let (index, claimed) = {
        let mut guard = state.lock().unwrap();
        guard.begin(vec![item()], Instant::now());
        guard.next_dispatch().unwrap()
    };
    let (observer, events) = ChannelObserver::pair();

    let finished = executor
        .execute(index, claimed.clone(), &state, &observer)
        .await
        .unwrap();
    assert_eq!(finished.status(), ItemStatus::Error);
    assert_eq!(finished.message(), "User or item not found");

    assert!(executor
        .execute(index, claimed, &state, &observer)
        .await
        .is_none());

    let guard = state.lock().unwrap();
    assert_eq!(guard.processed(), 1);
    assert_eq!(guard.error_count(), 1);
    assert_eq!(
        events
            .try_iter()
            .filter(|event| matches!(event, RunEvent::ItemFinished { .. }))
            .count(),
        1
    );
}
