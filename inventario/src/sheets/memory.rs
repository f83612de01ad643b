//! In-process spreadsheet.

use async_trait::async_trait;
use std::sync::RwLock;
use tracing::debug;

use super::{Result, SheetError, SheetListing, SpreadsheetGateway};
use crate::codec::{Row, RowPosition};

/// How far past the last row an update may write, like the spare rows of a fresh Google sheet.
pub const GRID_GROWTH_LIMIT: usize = 1000;

/// Header row written to a fresh inventory sheet.
pub const DEFAULT_HEADERS: [&str; 7] = ["Unidade", "Categoria", "Descrição", "Marca", "Nº de Série", "Estado", "Data/Hora"];

/// A spreadsheet held in memory, with the same row numbering as the remote one.
///
/// Useful for running the service without Google credentials. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySheet {
    values: RwLock<Vec<Row>>,
}

impl MemorySheet {
    /// A sheet containing only the standard header row.
    pub fn with_headers() -> Self {
        Self::from_values(vec![DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect()])
    }

    /// A sheet with the given raw values; the first row is the header.
    pub fn from_values(values: Vec<Row>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Copy of the raw values, header included.
    pub fn snapshot(&self) -> Vec<Row> {
        self.values.read().map(|values| values.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> SheetError {
    SheetError::RemoteService {
        message: "In-memory sheet lock poisoned".to_string(),
    }
}

#[async_trait]
impl SpreadsheetGateway for MemorySheet {
    async fn list_all_rows(&self) -> Result<SheetListing> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(SheetListing::from_values(values.clone()))
    }

    async fn append_rows(&self, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut values = self.values.write().map_err(poisoned)?;
        values.extend(rows.iter().cloned());
        debug!("Appended {} rows to in-memory sheet", rows.len());
        Ok(())
    }

    async fn update_row(&self, position: RowPosition, row: &Row) -> Result<()> {
        if position == 0 {
            return Err(SheetError::RemoteService {
                message: "Invalid range: row 0".to_string(),
            });
        }
        let index = (position - 1) as usize;
        let mut values = self.values.write().map_err(poisoned)?;
        if index >= values.len() + GRID_GROWTH_LIMIT {
            return Err(SheetError::RemoteService {
                message: format!("Range A{position}:G{position} exceeds grid limits ({} rows)", values.len()),
            });
        }

        // Writing past the end of the data grows the sheet, as the remote API does
        if values.len() <= index {
            values.resize_with(index + 1, Vec::new);
        }
        values[index] = row.clone();
        Ok(())
    }
}
