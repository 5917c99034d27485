use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use batch_logging::{batch_debug, batch_warn};
use checkout_core::{classify, BatchConfig, Outcome, RetryPolicy, RunState, WorkItem};

use crate::{RemoteCall, RunEvent, RunObserver};

/// Terminal outcome of one item plus the number of remote calls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted {
    pub outcome: Outcome,
    pub attempts: u32,
}

/// Drives a single item to a terminal state.
pub struct ItemExecutor<'a> {
    remote: &'a dyn RemoteCall,
    config: &'a BatchConfig,
    policy: RetryPolicy,
}

impl<'a> ItemExecutor<'a> {
    pub fn new(remote: &'a dyn RemoteCall, config: &'a BatchConfig) -> Self {
        Self {
            remote,
            config,
            policy: RetryPolicy::from_config(config),
        }
    }

    /// Calls the remote until it succeeds, fails terminally, or runs out of
    /// attempts. Backoff sleeps suspend only this item.
    pub async fn attempt(
        &self,
        index: usize,
        item: &WorkItem,
        observer: &dyn RunObserver,
    ) -> Attempted {
        let mut attempt = 1;
        loop {
            let err = match self.remote.call(item, self.config).await {
                Ok(()) => {
                    return Attempted {
                        outcome: Outcome::Success,
                        attempts: attempt,
                    }
                }
                Err(err) => err,
            };

            let decision = self.policy.should_retry(&err, attempt);
            if !decision.retry {
                let outcome = classify(&err);
                batch_debug!(
                    "item {} ({}) failed after {} attempt(s): {}",
                    index,
                    item.token,
                    attempt,
                    err
                );
                return Attempted {
                    outcome,
                    attempts: attempt,
                };
            }

            batch_warn!(
                "item {} ({}) attempt {} failed with status {}; retrying in {:?}",
                index,
                item.token,
                attempt,
                err.status,
                decision.delay
            );
            observer.on_event(RunEvent::Retrying {
                index,
                attempt,
                status: err.status,
                delay: decision.delay,
            });
            tokio::time::sleep(decision.delay).await;
            attempt += 1;
        }
    }

    /// Runs the item and records its outcome in `state`. Counters move exactly
    /// once, when the outcome is recorded.
    pub async fn execute(
        &self,
        index: usize,
        item: WorkItem,
        state: &Mutex<RunState>,
        observer: &dyn RunObserver,
    ) -> Option<WorkItem> {
        let attempted = self.attempt(index, &item, observer).await;
        let finished = lock(state).finalize(index, &attempted.outcome, Instant::now());
        match &finished {
            Some(done) => observer.on_event(RunEvent::ItemFinished {
                index,
                item: done.clone(),
            }),
            None => batch_warn!("item {} was already terminal; outcome dropped", index),
        }
        finished
    }
}

pub(crate) fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
