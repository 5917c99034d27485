//! Sheet intake: turns an uploaded CSV or Excel workbook into validated
//! `{identifier, token}` rows.
//!
//! The batch engine assumes its input already passed through here.
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::Reader;

use crate::ItemInput;

/// Largest batch accepted in one upload.
pub const MAX_ITEMS: usize = 250;

const IDENTIFIER_COLUMN: &str = "PRIMARYIDENTIFIER";
const TOKEN_COLUMN: &str = "BARCODE";

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("error parsing file: {0}")]
    Csv(#[from] csv::Error),
    #[error("error parsing workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("file is empty or missing headers")]
    Empty,
    #[error("file must contain PRIMARYIDENTIFIER and BARCODE columns")]
    MissingColumns,
    #[error("no valid rows found")]
    NoValidRows,
    #[error("file contains {count} items; maximum allowed is {max}")]
    TooManyItems { count: usize, max: usize },
    #[error("duplicate barcodes found: {}", .0.join(", "))]
    DuplicateTokens(Vec<String>),
    #[error("found {0} items with empty primary ID or barcode")]
    EmptyValues(usize),
    #[error(
        "invalid barcode format detected (use alphanumeric, dash, underscore only). Examples: {}",
        .examples.join(", ")
    )]
    InvalidTokenFormat { examples: Vec<String> },
}

/// How an uploaded sheet is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    /// Picks the format from the file extension; anything that is not a
    /// spreadsheet extension is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Self::Workbook,
            _ => Self::Csv,
        }
    }
}

/// Parses and validates a sheet in the given format.
pub fn read_sheet<R: Read>(reader: R, format: SheetFormat) -> Result<Vec<ItemInput>, IntakeError> {
    match format {
        SheetFormat::Csv => read_items(reader),
        SheetFormat::Workbook => read_workbook_items(reader),
    }
}

/// Parses and validates a CSV sheet in one step.
pub fn read_items<R: Read>(reader: R) -> Result<Vec<ItemInput>, IntakeError> {
    check_items(parse_rows(reader)?)
}

/// Parses and validates the first worksheet of a workbook.
pub fn read_workbook_items<R: Read>(reader: R) -> Result<Vec<ItemInput>, IntakeError> {
    check_items(parse_workbook_rows(reader)?)
}

fn check_items(items: Vec<ItemInput>) -> Result<Vec<ItemInput>, IntakeError> {
    if items.len() > MAX_ITEMS {
        return Err(IntakeError::TooManyItems {
            count: items.len(),
            max: MAX_ITEMS,
        });
    }
    validate_items(&items)?;
    Ok(items)
}

/// Reads the header row, locates the identifier and barcode columns
/// (case-insensitive) and collects every row that has both values.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<ItemInput>, IntakeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let records = csv_reader
        .records()
        .map(|record| record.map(|row| row.iter().map(str::to_owned).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, csv::Error>>()?;
    collect_items(&records)
}

/// Same as [`parse_rows`] for the first worksheet of an xlsx/xls/ods workbook.
/// Cells are read as displayed text, so numeric barcodes keep their digits.
pub fn parse_workbook_rows<R: Read>(mut reader: R) -> Result<Vec<ItemInput>, IntakeError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IntakeError::NoWorksheet)??;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    collect_items(&rows)
}

fn collect_items(records: &[Vec<String>]) -> Result<Vec<ItemInput>, IntakeError> {
    if records.len() < 2 {
        return Err(IntakeError::Empty);
    }

    let headers: Vec<String> = records[0]
        .iter()
        .map(|h| h.trim().to_ascii_uppercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h.as_str() == name);
    let (Some(id_index), Some(token_index)) = (column(IDENTIFIER_COLUMN), column(TOKEN_COLUMN))
    else {
        return Err(IntakeError::MissingColumns);
    };

    let items: Vec<ItemInput> = records[1..]
        .iter()
        .filter_map(|row| {
            let identifier = row.get(id_index).map(|v| v.trim()).unwrap_or_default();
            let token = row.get(token_index).map(|v| v.trim()).unwrap_or_default();
            if identifier.is_empty() || token.is_empty() {
                None
            } else {
                Some(ItemInput::new(identifier, token))
            }
        })
        .collect();

    if items.is_empty() {
        return Err(IntakeError::NoValidRows);
    }
    Ok(items)
}

/// Rejects duplicate barcodes, empty values and malformed barcodes.
pub fn validate_items(items: &[ItemInput]) -> Result<(), IntakeError> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for item in items {
        if !seen.insert(item.token.as_str()) && !duplicates.contains(&item.token) {
            duplicates.push(item.token.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(IntakeError::DuplicateTokens(duplicates));
    }

    let empty = items
        .iter()
        .filter(|item| item.identifier.is_empty() || item.token.is_empty())
        .count();
    if empty > 0 {
        return Err(IntakeError::EmptyValues(empty));
    }

    let examples: Vec<String> = items
        .iter()
        .filter(|item| !is_valid_token(&item.token))
        .take(3)
        .map(|item| item.token.clone())
        .collect();
    if !examples.is_empty() {
        return Err(IntakeError::InvalidTokenFormat { examples });
    }
    Ok(())
}

/// `^[A-Za-z0-9_-]+$`
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
