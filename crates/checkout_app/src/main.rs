mod cli;
mod console;
mod settings;

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use batch_logging::{batch_error, batch_info, batch_warn, LogDestination};
use checkout_core::{intake, RunSummary, SheetFormat, WorkItem};
use checkout_engine::{write_results, AlmaLoanClient, BatchScheduler, OutputDir, ResultsOptions};
use clap::Parser;
use log::LevelFilter;

use cli::Cli;
use console::{report_progress, ConsoleObserver, InterruptAction, InterruptState};
use settings::Settings;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if cli.log_file {
        LogDestination::terminal_and_default_file()
    } else {
        LogDestination::Terminal
    };
    batch_logging::initialize(destination, level);

    match run(cli).await {
        Ok(summary) if summary.error_count == 0 && !summary.cancelled => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(err) => {
            batch_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunSummary> {
    let settings = Settings::resolve(&cli)?;

    let file = File::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let items: Vec<WorkItem> = intake::read_sheet(file, SheetFormat::from_path(&cli.input))
        .with_context(|| format!("reading {}", cli.input.display()))?
        .into_iter()
        .map(WorkItem::from)
        .collect();
    batch_info!(
        "File validated successfully. {} items ready to process at {} - {}.",
        items.len(),
        settings.batch.library,
        settings.batch.circ_desk
    );

    let client = AlmaLoanClient::new(settings.alma.clone()).context("building HTTP client")?;
    let scheduler = Arc::new(
        BatchScheduler::new(Arc::new(client)).with_observer(Arc::new(ConsoleObserver)),
    );

    let interrupt = tokio::spawn(handle_interrupts(scheduler.clone()));
    let progress = tokio::spawn(report_progress(scheduler.clone(), PROGRESS_INTERVAL));

    let outcome = scheduler.run(items, &settings.batch).await;
    interrupt.abort();
    progress.abort();
    let summary = outcome?;
    batch_info!("{}", summary.message());

    let files = write_results(
        &OutputDir::new(&settings.output_dir),
        &scheduler.items(),
        &ResultsOptions::default(),
    )
    .context("writing results")?;
    batch_info!("Results written to {}", files.results_path.display());
    match &files.return_path {
        Some(path) => batch_info!(
            "Return file with {} barcodes written to {}. Use the Bulk Scan-in app to process returns.",
            files.returned,
            path.display()
        ),
        None => batch_info!("No successful checkouts to include in return file"),
    }

    Ok(summary)
}

/// First Ctrl-C cancels the run and lets in-flight requests finish; a second
/// one exits immediately.
async fn handle_interrupts(scheduler: Arc<BatchScheduler>) {
    let mut interrupts = InterruptState::default();
    while tokio::signal::ctrl_c().await.is_ok() {
        match interrupts.press() {
            InterruptAction::CancelRun => {
                batch_warn!(
                    "Interrupt received; finishing {} in-flight requests. Press Ctrl-C again to quit",
                    scheduler.in_flight()
                );
                scheduler.cancel();
            }
            InterruptAction::Exit => {
                batch_error!("Second interrupt received; exiting without waiting");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        }
    }
}
