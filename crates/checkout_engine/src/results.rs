use std::path::PathBuf;

use checkout_core::{ItemStatus, WorkItem};

use crate::persist::{OutputDir, PersistError};

#[derive(Debug, Clone)]
pub struct ResultsOptions {
    pub results_filename: String,
    pub return_filename: String,
}

impl Default for ResultsOptions {
    fn default() -> Self {
        Self {
            results_filename: "checkout_results.csv".to_string(),
            return_filename: "return_barcodes.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsFiles {
    pub results_path: PathBuf,
    /// `None` when no item succeeded.
    pub return_path: Option<PathBuf>,
    pub returned: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// One row per item: identifier, barcode, lowercase status, message.
pub fn render_results_csv(items: &[WorkItem]) -> Result<Vec<u8>, ResultsError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Primary Identifier", "Barcode", "Status", "Message"])?;
    for item in items {
        writer.write_record([
            item.identifier.as_str(),
            item.token.as_str(),
            item.status().as_str(),
            item.message(),
        ])?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|err| ResultsError::Io(err.into_error()))
}

/// Barcodes of successful items, one per line, for the returns workflow.
pub fn render_return_file(items: &[WorkItem]) -> Option<String> {
    let barcodes: Vec<&str> = items
        .iter()
        .filter(|item| item.status() == ItemStatus::Success)
        .map(|item| item.token.as_str())
        .collect();
    if barcodes.is_empty() {
        None
    } else {
        Some(barcodes.join("\n"))
    }
}

pub fn write_results(
    dir: &OutputDir,
    items: &[WorkItem],
    options: &ResultsOptions,
) -> Result<ResultsFiles, ResultsError> {
    let results_path = dir.write_atomic(&options.results_filename, &render_results_csv(items)?)?;

    let returns = render_return_file(items);
    let returned = returns.as_ref().map_or(0, |text| text.lines().count());
    let return_path = returns
        .map(|text| dir.write_atomic(&options.return_filename, text.as_bytes()))
        .transpose()?;

    Ok(ResultsFiles {
        results_path,
        return_path,
        returned,
    })
}
