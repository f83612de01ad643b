//! Inventory use cases: list, submit, update.
//!
//! Each call is one stateless round trip to the spreadsheet. Nothing read here is cached, so a
//! `row_position` is only meaningful until the sheet is next reordered or has rows removed.

use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::codec::{self, AssetDraft, AssetRecord, FIRST_DATA_ROW, RowPosition};
use crate::config::LimitsConfig;
use crate::errors::{Error, Result};
use crate::sheets::SpreadsheetGateway;

/// Source of the current local time for server-side timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the server's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Fields shared by every unit of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonFields {
    pub unit: String,
    pub category: String,
    pub description: String,
    pub brand: String,
    pub condition: String,
}

/// How serial numbers are assigned to the units of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialMode {
    /// `quantity` identical units sharing one serial number
    SameSerial { serial: String, quantity: u32 },
    /// One unit per serial number
    DistinctSerials { serials: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub common: CommonFields,
    pub mode: SerialMode,
}

pub struct InventoryService {
    gateway: Arc<dyn SpreadsheetGateway>,
    clock: Arc<dyn Clock>,
    limits: LimitsConfig,
}

impl InventoryService {
    pub fn new(gateway: Arc<dyn SpreadsheetGateway>, clock: Arc<dyn Clock>, limits: LimitsConfig) -> Self {
        Self { gateway, clock, limits }
    }

    /// Every data row of the sheet, in sheet order.
    #[instrument(skip_all, err)]
    pub async fn list_items(&self) -> Result<Vec<AssetRecord>> {
        let listing = self.gateway.list_all_rows().await?;
        let header_count = listing.header.len();

        Ok(listing
            .rows
            .iter()
            .map(|row| codec::decode(&row.cells, header_count, row.position))
            .collect())
    }

    /// Append one row per unit in a single gateway call. Returns the number of rows written.
    ///
    /// All rows carry the same timestamp, taken once per submission.
    #[instrument(skip_all, err)]
    pub async fn submit_items(&self, submission: Submission) -> Result<usize> {
        let serials = match submission.mode {
            SerialMode::SameSerial { serial, quantity } => {
                if quantity > self.limits.max_quantity {
                    return Err(Error::bad_request(format!(
                        "Quantidade máxima por envio é {}",
                        self.limits.max_quantity
                    )));
                }
                vec![serial; quantity as usize]
            }
            SerialMode::DistinctSerials { serials } => {
                if serials.len() > self.limits.max_serials {
                    return Err(Error::bad_request(format!(
                        "Número máximo de séries por envio é {}",
                        self.limits.max_serials
                    )));
                }
                serials
            }
        };

        if serials.is_empty() {
            info!("Submission produced no rows; nothing appended");
            return Ok(0);
        }

        let recorded_at = codec::format_timestamp(self.clock.now());
        let common = submission.common;
        let rows: Vec<_> = serials
            .into_iter()
            .map(|serial_number| {
                let draft = AssetDraft {
                    unit: Some(common.unit.clone()),
                    category: Some(common.category.clone()),
                    description: Some(common.description.clone()),
                    brand: Some(common.brand.clone()),
                    serial_number: Some(serial_number),
                    condition: Some(common.condition.clone()),
                    recorded_at: Some(recorded_at.clone()),
                };
                codec::encode(&draft, || self.clock.now())
            })
            .collect();

        self.gateway.append_rows(&rows).await?;

        metrics::counter!("inventario_rows_appended_total").increment(rows.len() as u64);
        info!("Appended {} rows to the inventory", rows.len());
        Ok(rows.len())
    }

    /// Overwrite the row at `position`. The timestamp defaults to now.
    #[instrument(skip(self, draft), err)]
    pub async fn update_item(&self, position: RowPosition, draft: AssetDraft) -> Result<()> {
        if position < FIRST_DATA_ROW {
            return Err(Error::bad_request(format!(
                "Linha inválida: {position} (os dados começam na linha {FIRST_DATA_ROW})"
            )));
        }

        let row = codec::encode(&draft, || self.clock.now());
        self.gateway.update_row(position, &row).await?;

        metrics::counter!("inventario_rows_updated_total").increment(1);
        info!("Updated inventory row {position}");
        Ok(())
    }
}
