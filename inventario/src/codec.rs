//! Mapping between spreadsheet rows and asset records.
//!
//! A row in the inventory sheet is an ordered list of seven text cells:
//!
//! | A       | B         | C         | D     | E            | F      | G          |
//! |---------|-----------|-----------|-------|--------------|--------|------------|
//! | unidade | categoria | descricao | marca | n_serie      | estado | timestamp  |
//!
//! Row 1 holds the headers. Everything here is a pure, total mapping: short rows are padded,
//! extra cells are ignored and missing fields become empty strings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of columns the inventory sheet uses.
pub const COLUMN_COUNT: usize = 7;

/// Format of the `recorded_at` cell, e.g. `31/12/2024 23:59:59`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// 1-based row address inside the sheet. Row 1 is the header, data starts at 2.
pub type RowPosition = u32;

/// First row position that holds data.
pub const FIRST_DATA_ROW: RowPosition = 2;

/// A raw spreadsheet row.
pub type Row = Vec<String>;

/// An asset as read back from the sheet, including its current address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub unit: String,
    pub category: String,
    pub description: String,
    pub brand: String,
    pub serial_number: String,
    pub condition: String,
    pub recorded_at: String,
    pub row_position: RowPosition,
}

/// The business fields of an asset, any of which may be absent.
///
/// Absent fields are written as empty cells; an absent `recorded_at` is filled in with the
/// current time when the draft is encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetDraft {
    pub unit: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub serial_number: Option<String>,
    pub condition: Option<String>,
    pub recorded_at: Option<String>,
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode a raw row into a record.
///
/// The row is padded to `header_count` (and never below [`COLUMN_COUNT`]) before the first
/// seven cells are mapped, so a row shorter than the header simply yields empty fields.
pub fn decode(raw: &[String], header_count: usize, position: RowPosition) -> AssetRecord {
    let width = header_count.max(COLUMN_COUNT);
    let mut cells = raw.iter().cloned().chain(std::iter::repeat(String::new())).take(width);
    let mut next = || cells.next().unwrap_or_default();

    AssetRecord {
        unit: next(),
        category: next(),
        description: next(),
        brand: next(),
        serial_number: next(),
        condition: next(),
        recorded_at: next(),
        row_position: position,
    }
}

/// Encode a draft into exactly [`COLUMN_COUNT`] cells in sheet order.
///
/// `now` is only called when the draft carries no timestamp.
pub fn encode(draft: &AssetDraft, now: impl FnOnce() -> NaiveDateTime) -> Row {
    let cell = |value: &Option<String>| value.clone().unwrap_or_default();
    let recorded_at = match &draft.recorded_at {
        Some(stamp) => stamp.clone(),
        None => format_timestamp(now()),
    };

    vec![
        cell(&draft.unit),
        cell(&draft.category),
        cell(&draft.description),
        cell(&draft.brand),
        cell(&draft.serial_number),
        cell(&draft.condition),
        recorded_at,
    ]
}
