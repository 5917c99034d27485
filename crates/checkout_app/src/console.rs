use std::sync::Arc;
use std::time::Duration;

use batch_logging::{batch_debug, batch_info, batch_warn};
use checkout_core::ItemStatus;
use checkout_engine::{BatchScheduler, RunEvent, RunObserver};

/// Logs per-item results as they arrive.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_event(&self, event: RunEvent) {
        match event {
            RunEvent::ItemFinished { index, item } => match item.status() {
                ItemStatus::Error => batch_warn!(
                    "row {}: {} / {}: {}",
                    index + 1,
                    item.identifier,
                    item.token,
                    item.message()
                ),
                _ => batch_debug!("row {}: {} checked out", index + 1, item.token),
            },
            RunEvent::Retrying { .. } | RunEvent::RunStarted { .. } | RunEvent::RunFinished(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    CancelRun,
    Exit,
}

/// Counts Ctrl-C presses: the first cancels the run, any later one exits.
#[derive(Debug, Default)]
pub struct InterruptState {
    presses: u32,
}

impl InterruptState {
    pub fn press(&mut self) -> InterruptAction {
        self.presses += 1;
        if self.presses == 1 {
            InterruptAction::CancelRun
        } else {
            InterruptAction::Exit
        }
    }
}

/// Logs a progress line every `interval` while the run is active.
pub async fn report_progress(scheduler: Arc<BatchScheduler>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if !scheduler.is_running() {
            break;
        }
        let progress = scheduler.progress();
        batch_info!(
            "Progress: {}/{} ({:.0}%) - remaining {} - {} in flight",
            progress.processed,
            progress.total,
            progress.percent_complete,
            progress.eta_display(),
            scheduler.in_flight()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_interrupt_cancels_and_later_ones_exit() {
        let mut state = InterruptState::default();
        assert_eq!(state.press(), InterruptAction::CancelRun);
        assert_eq!(state.press(), InterruptAction::Exit);
        assert_eq!(state.press(), InterruptAction::Exit);
    }
}
