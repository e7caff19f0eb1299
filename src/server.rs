// ABOUTME: HTTP server assembly with CORS and request tracing middleware
// ABOUTME: Merges the route modules and serves them until Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{info, warn, Level};

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use crate::routes::{CalendarRoutes, ChatRoutes, HealthRoutes};

/// Pebble HTTP server
pub struct PebbleServer {
    resources: Arc<ServerResources>,
}

impl PebbleServer {
    /// Create a server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Full application router with middleware applied
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Bind the configured address and serve until Ctrl-C
    ///
    /// # Errors
    /// Returns an error if the address is invalid or the listener fails
    pub async fn run(&self) -> AppResult<()> {
        let config = &self.resources.config;
        let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
            .parse()
            .map_err(|e| AppError::config(format!("Invalid bind address: {e}")))?;

        let app = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Transport error: {e}")))?;
        info!("Pebble server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Transport error: {e}")))?;

        info!("Pebble server stopped");
        Ok(())
    }
}

/// Merge route modules and apply tracing and CORS layers
///
/// CORS covers the `/api` routes only; `/health` answers without it.
#[must_use]
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(ChatRoutes::routes(Arc::clone(resources)))
        .merge(CalendarRoutes::routes(Arc::clone(resources)))
        .layer(setup_cors(&resources.config.cors_allowed_origins));

    Router::new()
        .merge(HealthRoutes::routes())
        .merge(api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
}

/// Credentialed CORS layer for the configured origins
///
/// A `*` entry (or an empty list) allows any origin by echoing the request's
/// `Origin` back, since a literal `*` is not valid alongside credentials.
/// Requested methods and headers are mirrored the same way. Unparseable
/// origins are skipped with a warning.
#[must_use]
pub fn setup_cors(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::mirror_request());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin `{origin}`: {e}");
                None
            }
        })
        .collect();

    base.allow_origin(allowed)
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
