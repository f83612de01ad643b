//! Spreadsheet gateway: the narrow interface to the remote system of record.
//!
//! The inventory has no local store. Every read and write goes through a
//! [`SpreadsheetGateway`], which addresses one named spreadsheet and exposes exactly three
//! operations: read every row, append a batch of rows, and overwrite one row in place.
//!
//! Writes are last-write-wins. Two callers updating the same row position concurrently race
//! at the remote service; nothing here locks, versions, or detects the conflict.
//!
//! Implementations:
//!
//! - [`google::GoogleSheets`]: the Google Sheets v4 API, authenticated as a service account
//! - [`memory::MemorySheet`]: an in-process sheet for local runs and tests

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::codec::{Row, RowPosition};
use crate::config::{SheetsBackend, SheetsConfig};

pub mod auth;
pub mod google;
pub mod memory;

/// Failures surfaced by a spreadsheet gateway. None of them are retried.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The spreadsheet does not exist, or the service account cannot see it
    #[error("Spreadsheet '{name}' not found")]
    SheetNotFound { name: String },

    /// Credential material is missing or malformed, or the token exchange was rejected
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Anything else the remote API reported (rate limits, bad ranges, transport errors)
    #[error("{message}")]
    RemoteService { message: String },
}

impl From<reqwest::Error> for SheetError {
    fn from(err: reqwest::Error) -> Self {
        SheetError::RemoteService {
            message: format!("Spreadsheet request failed: {err}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// A data row together with its current position in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRow {
    pub position: RowPosition,
    pub cells: Row,
}

/// Full contents of the sheet: the header row and every data row in sheet order.
///
/// Data rows are numbered from 2, since row 1 is the header. An empty sheet has an empty
/// header and no rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetListing {
    pub header: Row,
    pub rows: Vec<ListedRow>,
}

impl SheetListing {
    /// Split raw sheet values into header and numbered data rows.
    pub fn from_values(values: Vec<Row>) -> Self {
        let mut values = values.into_iter();
        let header = values.next().unwrap_or_default();
        let rows = values
            .zip(crate::codec::FIRST_DATA_ROW..)
            .map(|(cells, position)| ListedRow { position, cells })
            .collect();

        Self { header, rows }
    }
}

/// Access to one named remote spreadsheet.
///
/// Implementations must be safe to call concurrently; each call is an independent
/// request against the remote service.
#[async_trait]
pub trait SpreadsheetGateway: Send + Sync {
    /// Read every row. Row 1 is treated as the header.
    async fn list_all_rows(&self) -> Result<SheetListing>;

    /// Append all `rows` after the existing data in one remote call, preserving order.
    /// An empty slice is a no-op.
    async fn append_rows(&self, rows: &[Row]) -> Result<()>;

    /// Overwrite the cells of the row at `position`. No other row is touched.
    async fn update_row(&self, position: RowPosition, row: &Row) -> Result<()>;
}

/// Build the gateway selected by configuration.
pub fn create_gateway(config: &SheetsConfig) -> anyhow::Result<Arc<dyn SpreadsheetGateway>> {
    match config.backend {
        SheetsBackend::Google => Ok(Arc::new(google::GoogleSheets::new(config)?)),
        SheetsBackend::Memory => Ok(Arc::new(memory::MemorySheet::with_headers())),
    }
}

/// Count a gateway call by operation and outcome.
pub(crate) fn record_call<T>(operation: &'static str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(SheetError::SheetNotFound { .. }) => "not_found",
        Err(SheetError::AuthenticationFailed { .. }) => "auth_failed",
        Err(SheetError::RemoteService { .. }) => "remote_error",
    };
    metrics::counter!("inventario_sheet_calls_total", "operation" => operation, "outcome" => outcome).increment(1);
}
