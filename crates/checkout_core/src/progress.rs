use std::time::Duration;

/// Read-only progress view of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub percent_complete: f64,
    /// `None` until at least one item has completed.
    pub eta: Option<Duration>,
}

impl ProgressSnapshot {
    pub fn eta_display(&self) -> String {
        self.eta
            .map(format_remaining)
            .unwrap_or_else(|| "--".to_string())
    }
}

/// Derives percentage and remaining time from run counters.
pub struct ProgressTracker;

impl ProgressTracker {
    pub fn percent_complete(processed: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        processed as f64 / total as f64 * 100.0
    }

    pub fn estimated_remaining(processed: usize, total: usize, elapsed: Duration) -> Option<Duration> {
        if processed == 0 {
            return None;
        }
        let avg_secs = elapsed.as_secs_f64() / processed as f64;
        let remaining_items = total.saturating_sub(processed);
        Some(Duration::from_secs_f64(avg_secs * remaining_items as f64))
    }

    pub fn snapshot(processed: usize, total: usize, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            processed,
            total,
            percent_complete: Self::percent_complete(processed, total),
            eta: Self::estimated_remaining(processed, total, elapsed),
        }
    }
}

/// Formats as `"{m}m {s}s"`, or `"{s}s"` when under a minute.
pub fn format_remaining(remaining: Duration) -> String {
    let total_ms = remaining.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
