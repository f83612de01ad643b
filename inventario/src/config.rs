//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `config.yaml` and can be changed with the `-f` flag or the `INVENTARIO_CONFIG`
//! environment variable. A missing file is fine: every field has a default.
//!
//! ## Loading Priority
//!
//! Later sources override earlier ones:
//!
//! 1. **YAML config file**
//! 2. **Environment variables** prefixed with `INVENTARIO_`. Nested values use a double
//!    underscore, e.g. `INVENTARIO_SHEETS__SPREADSHEET_NAME="Inventário 2025"`.
//! 3. **GOOGLE_CREDENTIALS_JSON**: the service account key JSON, as delivered by the hosting
//!    platform. Overrides `sheets.credentials_json`.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 5000
//! sheets:
//!   backend: google
//!   spreadsheet_name: Levantamento de Bens - FUNDEC
//!   credentials_file: /run/secrets/service-account.json
//!   request_timeout: 20s
//! limits:
//!   max_quantity: 200
//! ```
//!
//! Credentials are not checked at startup. If they are missing or malformed, the first request
//! that touches the spreadsheet fails with an authentication error.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "INVENTARIO_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Expose Prometheus metrics at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Where inventory rows are stored
    pub sheets: SheetsConfig,
    /// Bounds on a single submission
    pub limits: LimitsConfig,
}

/// Which spreadsheet implementation backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetsBackend {
    /// Google Sheets, authenticated with a service account
    #[default]
    Google,
    /// Process-local sheet; data is lost on restart
    Memory,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetsConfig {
    pub backend: SheetsBackend,
    /// Display name of the spreadsheet, as shown in Google Drive. The first worksheet is used.
    pub spreadsheet_name: String,
    /// Service account key JSON. Usually supplied via `GOOGLE_CREDENTIALS_JSON`; may also be
    /// written inline as a YAML mapping.
    #[serde(skip_serializing, deserialize_with = "credentials_from_any")]
    pub credentials_json: Option<String>,
    /// Path to a service account key file, used when `credentials_json` is not set
    pub credentials_file: Option<PathBuf>,
    pub sheets_base_url: Url,
    pub drive_base_url: Url,
    /// Timeout applied to every call to Google
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn credentials_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        serde_json::Value::String(raw) => raw,
        other => other.to_string(),
    }))
}

impl fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsConfig")
            .field("backend", &self.backend)
            .field("spreadsheet_name", &self.spreadsheet_name)
            .field("credentials_json", &self.credentials_json.as_ref().map(|_| "<redacted>"))
            .field("credentials_file", &self.credentials_file)
            .field("sheets_base_url", &self.sheets_base_url.as_str())
            .field("drive_base_url", &self.drive_base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest `quantidade` accepted when every unit shares one serial number
    pub max_quantity: u32,
    /// Largest number of distinct serial numbers accepted in one submission
    pub max_serials: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_metrics: true,
            enable_otel_export: false,
            sheets: SheetsConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            backend: SheetsBackend::default(),
            spreadsheet_name: "Levantamento de Bens - FUNDEC".to_string(),
            credentials_json: None,
            credentials_file: None,
            sheets_base_url: Url::parse("https://sheets.googleapis.com/v4/").expect("valid default URL"),
            drive_base_url: Url::parse("https://www.googleapis.com/drive/v3/").expect("valid default URL"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_quantity: 500,
            max_serials: 500,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // INVENTARIO_CONFIG names the file itself, it is not a config key
            .merge(Env::prefixed("INVENTARIO_").ignore(&["config"]).split("__"))
            .merge(
                Env::raw()
                    .only(&["GOOGLE_CREDENTIALS_JSON"])
                    .map(|_| "sheets.credentials_json".into()),
            )
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.port == 0 {
            return Err(anyhow::anyhow!("Config validation: port must be non-zero").into());
        }
        if self.sheets.backend == SheetsBackend::Google && self.sheets.spreadsheet_name.trim().is_empty() {
            return Err(anyhow::anyhow!("Config validation: sheets.spreadsheet_name must not be empty").into());
        }
        if self.limits.max_quantity == 0 || self.limits.max_serials == 0 {
            return Err(anyhow::anyhow!(
                "Config validation: limits.max_quantity ({}) and limits.max_serials ({}) must be positive",
                self.limits.max_quantity,
                self.limits.max_serials
            )
            .into());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
