#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use checkout_core::{BatchConfig, RemoteError, WorkItem};
use checkout_engine::RemoteCall;
use tokio_util::sync::CancellationToken;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(batch_logging::initialize_for_tests);
}

pub fn work_items(count: usize) -> Vec<WorkItem> {
    (0..count)
        .map(|i| WorkItem::new(format!("user{i}"), format!("BC{i:04}")))
        .collect()
}

pub fn config(concurrency_limit: usize) -> BatchConfig {
    BatchConfig {
        concurrency_limit,
        ..BatchConfig::new("MAIN", "DESK1")
    }
}

/// Fake remote: answers from a per-token script (default success), optionally
/// holding every call until `release` is cancelled, and tracks how many calls
/// are active at once.
#[derive(Default)]
pub struct ScriptedRemote {
    scripts: Mutex<HashMap<String, VecDeque<Result<(), RemoteError>>>>,
    latency: Duration,
    gate: Option<CancellationToken>,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn gated(mut self, gate: CancellationToken) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn script(self, token: &str, responses: Vec<Result<(), RemoteError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(token.to_string(), responses.into());
        self
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteCall for ScriptedRemote {
    async fn call(&self, item: &WorkItem, _config: &BatchConfig) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.cancelled().await;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&item.token)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(()));
        self.active.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
