use std::sync::mpsc;
use std::time::Duration;

use checkout_core::{RunSummary, WorkItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    RunStarted {
        total: usize,
    },
    /// A failed attempt is about to be retried after `delay`.
    Retrying {
        index: usize,
        attempt: u32,
        status: u16,
        delay: Duration,
    },
    /// Emitted once per item, including items swept by cancellation.
    ItemFinished {
        index: usize,
        item: WorkItem,
    },
    /// Emitted exactly once per run.
    RunFinished(RunSummary),
}

pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: RunEvent);
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_event(&self, _event: RunEvent) {}
}

pub struct ChannelObserver {
    tx: mpsc::Sender<RunEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx }
    }

    /// Observer plus the receiving end of its channel.
    pub fn pair() -> (Self, mpsc::Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl RunObserver for ChannelObserver {
    fn on_event(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }
}
