//! Service account authentication against Google's OAuth 2.0 token endpoint.
//!
//! A signed RS256 JWT assertion is exchanged for a bearer token
//! (`urn:ietf:params:oauth:grant-type:jwt-bearer`). Tokens are cached until shortly before they
//! expire. Credential material is read lazily, on the first call that needs a token, so a
//! missing key fails that call rather than process startup.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{Result, SheetError};

/// Scopes requested for every token: read/write sheets, and read-only Drive to look the
/// spreadsheet up by name.
pub const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service account key file that matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SheetError::AuthenticationFailed {
            message: format!("Invalid service account credentials: {e}"),
        })
    }
}

/// Where the key comes from.
#[derive(Clone)]
pub enum CredentialSource {
    Inline(String),
    File(PathBuf),
    Missing,
}

impl CredentialSource {
    pub fn new(inline: Option<String>, file: Option<PathBuf>) -> Self {
        match (inline, file) {
            (Some(json), _) => CredentialSource::Inline(json),
            (None, Some(path)) => CredentialSource::File(path),
            (None, None) => CredentialSource::Missing,
        }
    }

    async fn load(&self) -> Result<ServiceAccountKey> {
        match self {
            CredentialSource::Inline(json) => ServiceAccountKey::from_json(json),
            CredentialSource::File(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| SheetError::AuthenticationFailed {
                    message: format!("Cannot read credentials file {}: {e}", path.display()),
                })?;
                ServiceAccountKey::from_json(&raw)
            }
            CredentialSource::Missing => Err(SheetError::AuthenticationFailed {
                message: "GOOGLE_CREDENTIALS_JSON is not set".to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    refresh_at: DateTime<Utc>,
}

/// Build the signed assertion for a key.
pub fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| SheetError::AuthenticationFailed {
        message: format!("Invalid service account private key: {e}"),
    })?;
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: SCOPES,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).map_err(|e| SheetError::AuthenticationFailed {
        message: format!("Failed to sign token assertion: {e}"),
    })
}

/// Hands out bearer tokens for the service account, refreshing them as needed.
pub struct TokenProvider {
    client: Client,
    source: CredentialSource,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, source: CredentialSource) -> Self {
        Self {
            client,
            source,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, from cache when possible.
    #[instrument(skip_all, err)]
    pub async fn access_token(&self) -> Result<String> {
        // Held across the exchange so concurrent callers wait for one refresh
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Utc::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let key = self.source.load().await?;
        let now = Utc::now();
        let assertion = sign_assertion(&key, now)?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", JWT_BEARER_GRANT)
            .append_pair("assertion", &assertion)
            .finish();

        debug!("Requesting access token for {} from {}", key.client_email, key.token_uri);
        let response = self
            .client
            .post(key.token_uri.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| SheetError::RemoteService {
                message: format!("Token request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Token endpoint returned {status}: {body}");
            // Only a 4xx says anything about the credentials themselves
            return Err(if status.is_client_error() {
                SheetError::AuthenticationFailed { message }
            } else {
                SheetError::RemoteService { message }
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| SheetError::RemoteService {
            message: format!("Malformed token response: {e}"),
        })?;

        let lifetime = (token.expires_in - EXPIRY_MARGIN_SECS).max(0);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: now + Duration::seconds(lifetime),
        });

        Ok(token.access_token)
    }

    /// Drop the cached token, e.g. after the API rejected it.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }
}
