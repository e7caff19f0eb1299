// ABOUTME: Liveness endpoint for deployment probes
// ABOUTME: Reports service name and version without touching external services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "pebble-server";

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
}

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create health routes
    pub fn routes() -> Router {
        Router::new().route("/health", get(Self::health))
    }

    async fn health() -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok".to_owned(),
            service: SERVICE_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }
}
