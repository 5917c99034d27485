//! Checkout engine: async batch execution against the loans service.
mod events;
mod executor;
mod persist;
mod remote;
mod results;
mod scheduler;

pub use events::{ChannelObserver, NoopObserver, RunEvent, RunObserver};
pub use executor::{Attempted, ItemExecutor};
pub use persist::{OutputDir, PersistError};
pub use remote::{AlmaLoanClient, AlmaSettings, RemoteCall};
pub use results::{
    render_results_csv, render_return_file, write_results, ResultsError, ResultsFiles,
    ResultsOptions,
};
pub use scheduler::{BatchScheduler, SchedulerError};
