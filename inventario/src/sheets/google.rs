//! Google Sheets v4 implementation of [`SpreadsheetGateway`].
//!
//! The spreadsheet is located by its display name through the Drive API, and all reads and
//! writes target its first worksheet. The located spreadsheet id and worksheet title are cached
//! after the first success and forgotten again if the API later reports the spreadsheet gone.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

use super::auth::{CredentialSource, TokenProvider};
use super::{Result, SheetError, SheetListing, SpreadsheetGateway, record_call};
use crate::codec::{COLUMN_COUNT, Row, RowPosition};
use crate::config::SheetsConfig;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Column letter of the last inventory column.
const LAST_COLUMN: char = (b'A' + COLUMN_COUNT as u8 - 1) as char;

/// The spreadsheet and worksheet every operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSheet {
    pub spreadsheet_id: String,
    pub worksheet_title: String,
}

impl LocatedSheet {
    /// Quoted worksheet reference for A1 notation, e.g. `'Página1'`.
    fn quoted_title(&self) -> String {
        format!("'{}'", self.worksheet_title.replace('\'', "''"))
    }

    fn whole_sheet_range(&self) -> String {
        self.quoted_title()
    }

    fn row_range(&self, position: RowPosition) -> String {
        format!("{}!A{position}:{LAST_COLUMN}{position}", self.quoted_title())
    }

    fn table_range(&self) -> String {
        self.row_range(1)
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<WorksheetEntry>,
}

#[derive(Debug, Deserialize)]
struct WorksheetEntry {
    properties: WorksheetProperties,
}

#[derive(Debug, Deserialize)]
struct WorksheetProperties {
    title: String,
    #[serde(default)]
    index: u32,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<&'a str>,
    major_dimension: &'static str,
    values: &'a [Row],
}

/// Cells come back as strings for formatted values, but be lenient with numbers and booleans.
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Escape a value for use inside a single-quoted Drive query string.
fn drive_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Append path segments to a base URL, percent-encoding each one.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SheetError::RemoteService {
            message: format!("Cannot use {base} as a base URL"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub struct GoogleSheets {
    client: Client,
    tokens: TokenProvider,
    spreadsheet_name: String,
    sheets_base_url: Url,
    drive_base_url: Url,
    located: ArcSwapOption<LocatedSheet>,
}

impl GoogleSheets {
    pub fn new(config: &SheetsConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))?;
        let source = CredentialSource::new(config.credentials_json.clone(), config.credentials_file.clone());

        Ok(Self {
            tokens: TokenProvider::new(client.clone(), source),
            client,
            spreadsheet_name: config.spreadsheet_name.clone(),
            sheets_base_url: config.sheets_base_url.clone(),
            drive_base_url: config.drive_base_url.clone(),
            located: ArcSwapOption::empty(),
        })
    }

    fn not_found(&self) -> SheetError {
        SheetError::SheetNotFound {
            name: self.spreadsheet_name.clone(),
        }
    }

    /// Send an authenticated request and translate failure statuses.
    ///
    /// 403 and 404 mean the spreadsheet is gone or not shared with the service account; 401
    /// means the token was rejected, so it is dropped before failing.
    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                debug!("{operation} returned {status}: {body}");
                self.located.store(None);
                Err(self.not_found())
            }
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate().await;
                Err(SheetError::AuthenticationFailed {
                    message: format!("{operation} rejected the access token: {body}"),
                })
            }
            _ => {
                tracing::error!("Google API error during {operation}: {status} - {body}");
                Err(SheetError::RemoteService {
                    message: format!("Google API error during {operation}: {status} - {body}"),
                })
            }
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Resolve the spreadsheet by name and pick its first worksheet.
    #[instrument(skip(self), fields(name = %self.spreadsheet_name), err)]
    async fn locate(&self) -> Result<Arc<LocatedSheet>> {
        if let Some(located) = self.located.load_full() {
            return Ok(located);
        }

        let mut files_url = endpoint(&self.drive_base_url, &["files"])?;
        files_url
            .query_pairs_mut()
            .append_pair(
                "q",
                &format!(
                    "name = '{}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false",
                    drive_query_literal(&self.spreadsheet_name)
                ),
            )
            .append_pair("fields", "files(id,name)")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");

        let list: DriveFileList = self
            .send(self.request(Method::GET, files_url), "spreadsheet lookup")
            .await?
            .json()
            .await?;
        let spreadsheet_id = list.files.into_iter().next().ok_or_else(|| self.not_found())?.id;

        let mut metadata_url = endpoint(&self.sheets_base_url, &["spreadsheets", &spreadsheet_id])?;
        metadata_url.query_pairs_mut().append_pair("fields", "sheets.properties");
        let metadata: SpreadsheetMetadata = self
            .send(self.request(Method::GET, metadata_url), "spreadsheet metadata")
            .await?
            .json()
            .await?;
        let first = metadata
            .sheets
            .into_iter()
            .min_by_key(|sheet| sheet.properties.index)
            .ok_or_else(|| self.not_found())?;

        let located = Arc::new(LocatedSheet {
            spreadsheet_id,
            worksheet_title: first.properties.title,
        });
        info!(
            "Using spreadsheet {} (worksheet '{}')",
            located.spreadsheet_id, located.worksheet_title
        );
        self.located.store(Some(located.clone()));
        Ok(located)
    }

    fn values_url(&self, sheet: &LocatedSheet, range_segment: &str) -> Result<Url> {
        endpoint(
            &self.sheets_base_url,
            &["spreadsheets", &sheet.spreadsheet_id, "values", range_segment],
        )
    }

    async fn fetch_all(&self) -> Result<SheetListing> {
        let sheet = self.locate().await?;
        let mut url = self.values_url(&sheet, &sheet.whole_sheet_range())?;
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");

        let range: ValueRange = self.send(self.request(Method::GET, url), "read rows").await?.json().await?;
        let values = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(SheetListing::from_values(values))
    }

    async fn append(&self, rows: &[Row]) -> Result<()> {
        let sheet = self.locate().await?;
        let mut url = self.values_url(&sheet, &format!("{}:append", sheet.table_range()))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = ValueRangeBody {
            range: None,
            major_dimension: "ROWS",
            values: rows,
        };
        self.send(self.request(Method::POST, url).json(&body), "append rows").await?;
        Ok(())
    }

    async fn overwrite(&self, position: RowPosition, row: &Row) -> Result<()> {
        let sheet = self.locate().await?;
        let range = sheet.row_range(position);
        let mut url = self.values_url(&sheet, &range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let rows = std::slice::from_ref(row);
        let body = ValueRangeBody {
            range: Some(&range),
            major_dimension: "ROWS",
            values: rows,
        };
        self.send(self.request(Method::PUT, url).json(&body), "update row").await?;
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetGateway for GoogleSheets {
    #[instrument(skip(self), err)]
    async fn list_all_rows(&self) -> Result<SheetListing> {
        let result = self.fetch_all().await;
        record_call("list_all_rows", &result);
        result
    }

    #[instrument(skip_all, fields(rows = rows.len()), err)]
    async fn append_rows(&self, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let result = self.append(rows).await;
        record_call("append_rows", &result);
        result
    }

    #[instrument(skip(self, row), err)]
    async fn update_row(&self, position: RowPosition, row: &Row) -> Result<()> {
        let result = self.overwrite(position, row).await;
        record_call("update_row", &result);
        result
    }
}
