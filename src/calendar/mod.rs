// ABOUTME: Calendar gateway owning the OAuth session and the upcoming-week event query
// ABOUTME: Exposes the CalendarSource trait consumed by the tool executor and events route
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! # Calendar Gateway
//!
//! One [`CalendarGateway`] exists per process. It is constructed from
//! configuration, initialized once before the HTTP listener starts, and shared
//! by every request through an `Arc`. Fetching before [`CalendarGateway::initialize`]
//! fails with a not-initialized error.
//!
//! ## Credential lifecycle
//!
//! 1. Load the token file if present
//! 2. If the credential is missing or invalid: refresh it when it is expired
//!    and has a refresh token, otherwise run the interactive consent flow
//! 3. Persist the credential after any change
//!
//! An access token that expires while the server is running is refreshed
//! before the next fetch.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, instrument};

use crate::errors::{AppError, AppResult};
use crate::models::RawCalendarEvent;

/// Interactive loopback consent flow
pub mod consent;
/// OAuth credential material and storage
pub mod credentials;

pub use credentials::{ClientSecrets, Credential, CALENDAR_SCOPE};

const SERVICE_NAME: &str = "Google Calendar API";

/// Length of the look-ahead window for upcoming events
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Source of upcoming calendar events
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Events on the primary calendar in `[now, now + 7 days)`, single
    /// occurrences expanded, ordered by start time
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not initialized or the provider fails.
    async fn fetch_upcoming_week(&self) -> AppResult<Vec<RawCalendarEvent>>;
}

/// Time bounds of the upcoming-week query
#[must_use]
pub fn upcoming_week_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::days(UPCOMING_WINDOW_DAYS))
}

/// Calendar gateway configuration
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Persisted authorized-user credential
    pub token_path: PathBuf,
    /// Client registration used by the consent flow
    pub client_secret_path: PathBuf,
    /// Calendar API base URL (default: <https://www.googleapis.com/calendar/v3>)
    pub base_url: String,
    /// Requested OAuth scopes
    pub scopes: Vec<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            client_secret_path: PathBuf::from("credentials.json"),
            base_url: "https://www.googleapis.com/calendar/v3".to_owned(),
            scopes: vec![CALENDAR_SCOPE.to_owned()],
        }
    }
}

/// Events list response (only `items` is used)
#[derive(Debug, Deserialize)]
struct EventsListResponse {
    #[serde(default)]
    items: Vec<RawCalendarEvent>,
}

/// Credentialed session established by `initialize`
struct CalendarSession {
    credential: RwLock<Credential>,
}

/// Process-wide calendar gateway
pub struct CalendarGateway {
    config: CalendarConfig,
    http_client: Client,
    session: OnceCell<CalendarSession>,
}

impl CalendarGateway {
    /// Create an uninitialized gateway
    #[must_use]
    pub fn new(config: CalendarConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
            session: OnceCell::new(),
        }
    }

    /// Whether `initialize` has completed
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.initialized()
    }

    /// Establish the credentialed session
    ///
    /// Runs the credential lifecycle once; later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be loaded, refreshed,
    /// obtained through the consent flow, or persisted.
    pub async fn initialize(&self) -> AppResult<()> {
        self.session
            .get_or_try_init(|| async {
                let credential = self.obtain_credential().await?;
                info!("Calendar gateway initialized");
                Ok::<_, AppError>(CalendarSession {
                    credential: RwLock::new(credential),
                })
            })
            .await?;
        Ok(())
    }

    /// Initialize with an already-obtained credential, skipping file and consent handling
    ///
    /// # Errors
    ///
    /// Returns an internal error if the gateway was already initialized.
    pub fn initialize_with(&self, credential: Credential) -> AppResult<()> {
        self.session
            .set(CalendarSession {
                credential: RwLock::new(credential),
            })
            .map_err(|_| AppError::internal("Calendar gateway already initialized"))
    }

    async fn obtain_credential(&self) -> AppResult<Credential> {
        let stored = Credential::load(&self.config.token_path).await?;
        if let Some(credential) = stored.as_ref().filter(|c| c.valid()) {
            info!("Using stored calendar credential");
            return Ok(credential.clone());
        }

        let credential = match stored {
            Some(mut credential) if credential.expired() && credential.can_refresh() => {
                credential.refresh(&self.http_client).await?;
                credential
            }
            _ => {
                info!("No usable calendar credential; starting consent flow");
                let secrets = ClientSecrets::load(&self.config.client_secret_path).await?;
                consent::run_local_server(&self.http_client, &secrets, &self.config.scopes)
                    .await?
            }
        };

        credential.save(&self.config.token_path).await?;
        Ok(credential)
    }

    /// Current access token, refreshing and persisting the credential if it expired
    async fn access_token(&self, session: &CalendarSession) -> AppResult<String> {
        {
            let credential = session.credential.read().await;
            if credential.valid() || !credential.can_refresh() {
                return credential.access_token().map(str::to_owned);
            }
        }

        let mut credential = session.credential.write().await;
        // Another request may have refreshed while we waited for the lock
        if !credential.valid() {
            credential.refresh(&self.http_client).await?;
            credential.save(&self.config.token_path).await?;
        }
        credential.access_token().map(str::to_owned)
    }
}

#[async_trait]
impl CalendarSource for CalendarGateway {
    #[instrument(skip(self))]
    async fn fetch_upcoming_week(&self) -> AppResult<Vec<RawCalendarEvent>> {
        let session = self
            .session
            .get()
            .ok_or_else(|| AppError::not_initialized("Google Calendar service"))?;
        let token = self.access_token(session).await?;

        let (time_min, time_max) = upcoming_week_window(Utc::now());
        let url = format!(
            "{}/calendars/primary/events",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min.to_rfc3339().as_str()),
                ("timeMax", time_max.to_rfc3339().as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("Events request failed with HTTP {status}"),
            ));
        }

        let events: EventsListResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        info!("Fetched {} upcoming calendar events", events.items.len());
        Ok(events.items)
    }
}
