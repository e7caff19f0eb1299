// ABOUTME: OAuth credential material for the calendar provider and its on-disk storage
// ABOUTME: Loads, validates, refreshes, and persists authorized-user tokens and client secrets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! Calendar OAuth credentials
//!
//! The token file uses Google's authorized-user JSON layout (`token`,
//! `refresh_token`, `token_uri`, `client_id`, `client_secret`, `scopes`,
//! `expiry`) so token files written by other Google client libraries load
//! unchanged. Unknown fields are preserved on save.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info};

use crate::errors::{AppError, AppResult};

const SERVICE_NAME: &str = "Google OAuth";

/// Default token endpoint when neither the credential nor the client secret names one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Default authorization endpoint for the consent flow
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Scope granting access to the user's calendars
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 60;

/// Authorized-user OAuth credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Current access token
    #[serde(default)]
    pub token: Option<String>,
    /// Long-lived refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token endpoint used for refresh
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry (UTC)
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Remaining fields written by other client libraries
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

impl Credential {
    /// Whether the access token has passed (or is about to pass) its expiry
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry)
    }

    /// Whether the access token has passed its expiry right now
    #[must_use]
    pub fn expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the credential can authorize requests at `now`
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty()) && !self.is_expired_at(now)
    }

    /// Whether the credential can authorize requests right now
    #[must_use]
    pub fn valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether an expired credential can be renewed without user interaction
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Access token for the `Authorization` header
    ///
    /// # Errors
    ///
    /// Returns an external-service error if the credential holds no token.
    pub fn access_token(&self) -> AppResult<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "Credential has no access token"))
    }

    /// Load a credential from the token file, returning `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> AppResult<Option<Self>> {
        if !fs::try_exists(path).await? {
            debug!("No stored credential at {}", path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(path).await?;
        let credential = serde_json::from_str(&raw).map_err(|e| {
            AppError::config(format!("Invalid credential file {}: {e}", path.display()))
        })?;
        Ok(Some(credential))
    }

    /// Write the credential to the token file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        let rendered = serde_json::to_string(self)?;
        fs::write(path, rendered).await?;
        info!("Saved calendar credential to {}", path.display());
        Ok(())
    }

    /// Apply a token endpoint response
    ///
    /// Providers omit `refresh_token` on refresh, in which case the existing one
    /// is kept.
    pub fn apply_token_response(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        self.expiry = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs));
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(str::to_owned).collect();
        }
    }

    /// Exchange the refresh token for a new access token
    ///
    /// # Errors
    ///
    /// Returns an external-service error if there is no refresh token or the
    /// token endpoint rejects the request.
    pub async fn refresh(&mut self, http_client: &Client) -> AppResult<()> {
        let refresh_token = self
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "No refresh token available"))?;

        info!("Refreshing calendar access token");
        let response = request_token(
            http_client,
            &self.token_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ],
        )
        .await?;
        self.apply_token_response(response, Utc::now());
        Ok(())
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// New access token
    pub access_token: String,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// New refresh token (authorization-code grants, sometimes refresh grants)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space-separated granted scopes
    #[serde(default)]
    pub scope: Option<String>,
}

/// POST a form to the token endpoint and decode the response
///
/// # Errors
///
/// Returns an external-service error on transport failure, non-success status,
/// or an undecodable body.
pub async fn request_token(
    http_client: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> AppResult<TokenResponse> {
    let response = http_client
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(AppError::external_service(
            SERVICE_NAME,
            format!("Token request failed with HTTP {status}: {text}"),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}")))
}

/// OAuth client registration (`credentials.json`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization endpoint
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_owned()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    #[serde(default)]
    installed: Option<ClientSecrets>,
    #[serde(default)]
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a client-secret document with an `installed` or `web` section
    ///
    /// # Errors
    ///
    /// Returns a config error if the JSON is invalid or has neither section.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(raw)
            .map_err(|e| AppError::config(format!("Invalid client secret file: {e}")))?;
        file.installed.or(file.web).ok_or_else(|| {
            AppError::config("Client secret file must contain an `installed` or `web` section")
        })
    }

    /// Read and parse the client-secret file
    ///
    /// # Errors
    ///
    /// Returns a config error if the file is missing or invalid.
    pub async fn load(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path).await.map_err(|e| {
            AppError::config(format!("Cannot read client secret file {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Build a credential from a completed authorization-code exchange
    #[must_use]
    pub fn credential_from(
        &self,
        response: TokenResponse,
        scopes: &[String],
        now: DateTime<Utc>,
    ) -> Credential {
        let mut credential = Credential {
            token: None,
            refresh_token: None,
            token_uri: self.token_uri.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scopes: scopes.to_vec(),
            expiry: None,
            extra: Map::new(),
        };
        credential.apply_token_response(response, now);
        credential
    }
}
