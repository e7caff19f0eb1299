// ABOUTME: Interactive installed-app OAuth consent flow over a loopback redirect
// ABOUTME: Serves a one-shot local callback endpoint and exchanges the returned code for tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! Loopback consent flow
//!
//! Used only when no usable credential exists at startup. The operator opens
//! the logged authorization URL, grants access, and the provider redirects the
//! browser to `http://localhost:<port>/` where a single-request listener
//! captures the authorization code.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use super::credentials::{request_token, ClientSecrets, Credential};
use crate::errors::{AppError, AppResult};

/// Query parameters the provider appends to the redirect
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

/// Build the authorization URL the operator must open
///
/// # Errors
///
/// Returns a config error if the client's `auth_uri` is not a valid URL.
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> AppResult<Url> {
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scopes.join(" ").as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AppError::config(format!("Invalid auth_uri {}: {e}", secrets.auth_uri)))
}

async fn handle_callback(
    State(sender): State<CallbackSender>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    if let Some(tx) = sender.lock().await.take() {
        let _ = tx.send(params);
    }
    Html("<p>Pebble has access to your calendar. You may close this window.</p>")
}

/// Run the consent flow and return a fresh credential
///
/// # Errors
///
/// Returns an error if the loopback listener cannot bind, the user denies
/// access, the `state` does not match, or the code exchange fails.
pub async fn run_local_server(
    http_client: &Client,
    secrets: &ClientSecrets,
    scopes: &[String],
) -> AppResult<Credential> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .map_err(|e| AppError::internal(format!("Cannot bind consent listener: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| AppError::internal(format!("Cannot read consent listener address: {e}")))?
        .port();
    let redirect_uri = format!("http://localhost:{port}/");
    let state = Uuid::new_v4().to_string();

    let auth_url = authorization_url(secrets, &redirect_uri, scopes, &state)?;
    info!("Open this URL in a browser to authorize calendar access: {auth_url}");

    let (tx, rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = Router::new()
        .route("/", get(handle_callback))
        .with_state(Arc::new(Mutex::new(Some(tx))));

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let params = rx
        .await
        .map_err(|_| AppError::internal("Consent listener stopped before receiving a callback"));
    let _ = shutdown_tx.send(());
    if let Err(e) = server.await {
        warn!("Consent listener task failed: {e}");
    }
    let params = params?;

    if let Some(error) = params.error {
        return Err(AppError::external_service(
            "Google OAuth",
            format!("Authorization denied: {error}"),
        ));
    }
    if params.state.as_deref() != Some(state.as_str()) {
        return Err(AppError::external_service(
            "Google OAuth",
            "Authorization state mismatch",
        ));
    }
    let code = params
        .code
        .ok_or_else(|| AppError::external_service("Google OAuth", "Callback carried no code"))?;

    let response = request_token(
        http_client,
        &secrets.token_uri,
        &[
            ("code", code.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ],
    )
    .await?;

    info!("Calendar authorization granted");
    Ok(secrets.credential_from(response, scopes, Utc::now()))
}
