use std::time::{Duration, Instant};

use crate::{ItemStatus, Outcome, ProgressSnapshot, ProgressTracker, WorkItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Items swept to Error by cancellation before they were dispatched.
    pub cancelled_pending: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn message(&self) -> String {
        if self.cancelled {
            format!(
                "Processing cancelled. Success: {}, Errors: {}, Pending: {}",
                self.success_count, self.error_count, self.cancelled_pending
            )
        } else {
            format!(
                "Processing complete. Success: {}, Errors: {}",
                self.success_count, self.error_count
            )
        }
    }
}

/// Counters and item statuses for one run.
///
/// Every mutation of item status and counters goes through this type, so a
/// single lock around it is the run's only synchronization point.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    items: Vec<WorkItem>,
    dispatched: Vec<bool>,
    cursor: usize,
    processed: usize,
    success: usize,
    error: usize,
    cancelled_pending: usize,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    phase: RunPhase,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets counters and every item to Pending, then enters `Running`.
    pub fn begin(&mut self, mut items: Vec<WorkItem>, now: Instant) {
        items.iter_mut().for_each(WorkItem::reset);
        self.dispatched = vec![false; items.len()];
        self.items = items;
        self.cursor = 0;
        self.processed = 0;
        self.success = 0;
        self.error = 0;
        self.cancelled_pending = 0;
        self.started_at = Some(now);
        self.finished_at = None;
        self.phase = RunPhase::Running;
        if self.items.is_empty() {
            self.settle(now);
        }
    }

    /// Claims the next undispatched Pending item in input order.
    pub fn next_dispatch(&mut self) -> Option<(usize, WorkItem)> {
        if self.phase != RunPhase::Running {
            return None;
        }
        while self.cursor < self.items.len() {
            let index = self.cursor;
            self.cursor += 1;
            if self.items[index].status() == ItemStatus::Pending && !self.dispatched[index] {
                self.dispatched[index] = true;
                return Some((index, self.items[index].clone()));
            }
        }
        None
    }

    /// Records the terminal outcome of an item. Counters move only on the
    /// first call for a given item; later calls return `None`.
    pub fn finalize(&mut self, index: usize, outcome: &Outcome, now: Instant) -> Option<WorkItem> {
        let item = self.items.get_mut(index)?;
        if !item.finish(outcome) {
            return None;
        }
        let finished = item.clone();
        self.count(outcome);
        if self.processed == self.items.len() {
            self.settle(now);
        }
        Some(finished)
    }

    /// Stops dispatch and sweeps every undispatched Pending item to Error.
    /// Returns the swept items; empty when the run was not `Running`.
    pub fn cancel(&mut self, now: Instant) -> Vec<(usize, WorkItem)> {
        if self.phase != RunPhase::Running {
            return Vec::new();
        }
        self.phase = RunPhase::Cancelled;
        let outcome = Outcome::cancelled();
        let mut swept = Vec::new();
        for (index, item) in self.items.iter_mut().enumerate() {
            if !self.dispatched[index] && item.finish(&outcome) {
                swept.push((index, item.clone()));
            }
        }
        for _ in &swept {
            self.count(&outcome);
        }
        self.cancelled_pending = swept.len();
        if self.processed == self.items.len() {
            self.finished_at = Some(now);
        }
        swept
    }

    fn count(&mut self, outcome: &Outcome) {
        self.processed += 1;
        if outcome.is_success() {
            self.success += 1;
        } else {
            self.error += 1;
        }
    }

    fn settle(&mut self, now: Instant) {
        self.finished_at = Some(now);
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Completed;
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn success_count(&self) -> usize {
        self.success
    }

    pub fn error_count(&self) -> usize {
        self.error
    }

    /// Dispatched items that have not reached a terminal state yet.
    pub fn in_flight(&self) -> usize {
        self.items
            .iter()
            .zip(&self.dispatched)
            .filter(|(item, dispatched)| **dispatched && !item.is_terminal())
            .count()
    }

    /// True once every item is terminal.
    pub fn is_settled(&self) -> bool {
        self.phase != RunPhase::Idle && self.processed == self.items.len()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self.finished_at.unwrap_or(now).saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.items.len(),
            success_count: self.success,
            error_count: self.error,
            cancelled_pending: self.cancelled_pending,
            cancelled: self.phase == RunPhase::Cancelled,
        }
    }

    pub fn progress(&self, now: Instant) -> ProgressSnapshot {
        ProgressTracker::snapshot(self.processed, self.items.len(), self.elapsed(now))
    }
}
