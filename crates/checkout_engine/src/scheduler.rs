use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use batch_logging::{batch_debug, batch_info, batch_warn};
use checkout_core::{
    BatchConfig, ConfigError, ProgressSnapshot, RunPhase, RunState, RunSummary, WorkItem,
};
use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::executor::{lock, ItemExecutor};
use crate::{NoopObserver, RemoteCall, RunEvent, RunObserver};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("invalid batch config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Runs a batch through a fixed-size worker pool.
///
/// `run` and `cancel` take `&self`, so a scheduler shared through an `Arc`
/// can be cancelled from another task while a run is in progress.
pub struct BatchScheduler {
    remote: Arc<dyn RemoteCall>,
    observer: Arc<dyn RunObserver>,
    state: Mutex<RunState>,
    cancel_token: Mutex<CancellationToken>,
    active: AtomicBool,
}

/// Clears the active flag when `run` returns or its future is dropped.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BatchScheduler {
    pub fn new(remote: Arc<dyn RemoteCall>) -> Self {
        Self {
            remote,
            observer: Arc::new(NoopObserver),
            state: Mutex::new(RunState::new()),
            cancel_token: Mutex::new(CancellationToken::new()),
            active: AtomicBool::new(false),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Resets every item to Pending and runs the batch to completion or
    /// cancellation. Resolves once every item is terminal.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        config: &BatchConfig,
    ) -> Result<RunSummary, SchedulerError> {
        config.validate()?;
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }
        let _active = ActiveGuard(&self.active);

        let token = CancellationToken::new();
        *self
            .cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = token.clone();

        let total = items.len();
        lock(&self.state).begin(items, Instant::now());
        batch_info!(
            "run started: {} items at {}/{} (concurrency {})",
            total,
            config.library,
            config.circ_desk,
            config.concurrency_limit
        );
        self.observer.on_event(RunEvent::RunStarted { total });

        let executor = ItemExecutor::new(self.remote.as_ref(), config);
        let workers = config.concurrency_limit.min(total);
        join_all((0..workers).map(|worker| self.worker(worker, &executor, &token))).await;

        let summary = {
            let state = lock(&self.state);
            if !state.is_settled() {
                batch_warn!(
                    "workers stopped with {} of {} items unsettled",
                    state.total() - state.processed(),
                    state.total()
                );
            }
            state.summary()
        };
        batch_info!("{}", summary.message());
        self.observer.on_event(RunEvent::RunFinished(summary.clone()));
        Ok(summary)
    }

    async fn worker(&self, worker: usize, executor: &ItemExecutor<'_>, token: &CancellationToken) {
        loop {
            if token.is_cancelled() {
                batch_debug!("worker {} stopping: run cancelled", worker);
                break;
            }
            let Some((index, item)) = lock(&self.state).next_dispatch() else {
                break;
            };
            executor
                .execute(index, item, &self.state, self.observer.as_ref())
                .await;
        }
    }

    /// Stops dispatch. Items already in flight finish and count normally;
    /// undispatched items become "Cancelled by user" errors before this
    /// returns. Returns the number of items swept.
    pub fn cancel(&self) -> usize {
        let (swept, in_flight) = {
            let mut state = lock(&self.state);
            if state.phase() != RunPhase::Running {
                return 0;
            }
            let swept = state.cancel(Instant::now());
            (swept, state.in_flight())
        };
        self.cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();

        let count = swept.len();
        for (index, item) in swept {
            self.observer.on_event(RunEvent::ItemFinished { index, item });
        }
        batch_info!(
            "run cancelled: {} pending items swept, {} still in flight",
            count,
            in_flight
        );
        count
    }

    /// True from the start of `run` until it resolves.
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Items dispatched to the remote that have not finished yet.
    pub fn in_flight(&self) -> usize {
        lock(&self.state).in_flight()
    }

    pub fn phase(&self) -> RunPhase {
        lock(&self.state).phase()
    }

    pub fn items(&self) -> Vec<WorkItem> {
        lock(&self.state).items().to_vec()
    }

    pub fn summary(&self) -> RunSummary {
        lock(&self.state).summary()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        lock(&self.state).progress(Instant::now())
    }
}
