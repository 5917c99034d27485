//! Checkout core: pure batch model, retry policy, run accounting and intake.
mod config;
pub mod intake;
mod item;
mod outcome;
mod progress;
mod retry;
mod state;

pub use config::{BatchConfig, ConfigError, DEFAULT_CONCURRENCY_LIMIT};
pub use intake::{IntakeError, SheetFormat, MAX_ITEMS};
pub use item::{ItemInput, ItemStatus, WorkItem};
pub use outcome::{
    classify, ErrorCategory, Outcome, RemoteError, CANCELLED_MESSAGE, SUCCESS_MESSAGE,
};
pub use progress::{format_remaining, ProgressSnapshot, ProgressTracker};
pub use retry::{RetryDecision, RetryPolicy};
pub use state::{RunPhase, RunState, RunSummary};
