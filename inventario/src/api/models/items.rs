//! Models for the JSON inventory API.

use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::ToSchema;

use crate::codec::{AssetDraft, AssetRecord, RowPosition};

/// An inventory item together with the sheet row it lives on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ItemResponse {
    /// Sheet row of the item; pass it back to `/api/update_row`. Only valid until rows are
    /// reordered or removed in the sheet.
    #[schema(example = 2)]
    pub row_number: RowPosition,
    pub unidade: String,
    pub categoria: String,
    pub descricao: String,
    pub marca: String,
    pub n_serie: String,
    pub estado: String,
    /// `DD/MM/YYYY HH:MM:SS`
    #[schema(example = "31/12/2024 23:59:59")]
    pub timestamp: String,
}

impl From<AssetRecord> for ItemResponse {
    fn from(record: AssetRecord) -> Self {
        Self {
            row_number: record.row_position,
            unidade: record.unit,
            categoria: record.category,
            descricao: record.description,
            marca: record.brand,
            n_serie: record.serial_number,
            estado: record.condition,
            timestamp: record.recorded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListItemsResponse {
    /// Every item, in sheet order
    pub items: Vec<ItemResponse>,
}

/// A row number as sent by the browser: a JSON number (`3` or `3.0`) or a numeric string.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RowNumber {
    Number(i64),
    Float(f64),
    Text(String),
}

impl RowNumber {
    /// The addressed row, if the value is a non-negative integer.
    pub fn position(&self) -> Option<RowPosition> {
        match self {
            RowNumber::Number(n) => RowPosition::try_from(*n).ok(),
            RowNumber::Float(f) if f.fract() == 0.0 && (0.0..=RowPosition::MAX as f64).contains(f) => Some(*f as RowPosition),
            RowNumber::Float(_) => None,
            RowNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Overwrite one row. Missing fields are written as empty cells; a missing `timestamp`
/// becomes the current time, an explicit `null` one an empty cell.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRowRequest {
    pub row_number: Option<RowNumber>,
    pub unidade: Option<String>,
    pub categoria: Option<String>,
    pub descricao: Option<String>,
    pub marca: Option<String>,
    pub n_serie: Option<String>,
    pub estado: Option<String>,
    /// Absent = now, `null` = empty cell
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub timestamp: Option<Option<String>>,
}

impl UpdateRowRequest {
    /// Split into the target row and the new contents. `None` if the row number is missing
    /// or not an integer.
    pub fn into_parts(self) -> Option<(RowPosition, AssetDraft)> {
        let position = self.row_number.as_ref()?.position()?;
        let draft = AssetDraft {
            unit: self.unidade,
            category: self.categoria,
            description: self.descricao,
            brand: self.marca,
            serial_number: self.n_serie,
            condition: self.estado,
            recorded_at: self.timestamp.map(Option::unwrap_or_default),
        };
        Some((position, draft))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}
