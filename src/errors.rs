// ABOUTME: Unified error type with stable error codes and HTTP status mapping
// ABOUTME: Converts every request failure into an opaque JSON error body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! Unified error handling
//!
//! Every fallible operation in the crate returns [`AppResult`]. Handlers return
//! `Result<Response, AppError>` and rely on the [`IntoResponse`] implementation
//! below to produce the HTTP response. Server-side failures never leak their
//! details to the caller: the message is logged and a generic body is returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::io;
use thiserror::Error;
use tracing::{error, warn};

/// Stable error codes surfaced in error response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request payload was malformed or carried an unsupported value
    InvalidInput,
    /// A component was used before its initialization step ran
    NotInitialized,
    /// The LLM or calendar provider returned an error or was unreachable
    ExternalServiceError,
    /// The model kept requesting capabilities past the configured limit
    ToolLoopExhausted,
    /// Configuration was missing or invalid
    ConfigError,
    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// HTTP status associated with this code
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::ExternalServiceError | Self::ToolLoopExhausted => StatusCode::BAD_GATEWAY,
            Self::NotInitialized | Self::ConfigError | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to clients for server-side failures
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid request",
            Self::NotInitialized => "Service is not ready",
            Self::ExternalServiceError => "Upstream service failure",
            Self::ToolLoopExhausted => "Assistant could not complete the request",
            Self::ConfigError | Self::InternalError => "Internal server error",
        }
    }
}

/// Application error carrying a code and a diagnostic message
#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Diagnostic message (only returned to clients for 4xx errors)
    pub message: String,
}

/// Result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Malformed request or unsupported value
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Component used before initialization
    pub fn not_initialized(component: &str) -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            format!("{component} not initialized. Call initialize() first."),
        )
    }

    /// Failure reported by an external service
    pub fn external_service(service: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ExternalServiceError, format!("{service}: {message}"))
    }

    /// Agent loop exceeded its iteration bound
    #[must_use]
    pub fn tool_loop_exhausted(limit: usize) -> Self {
        Self::new(
            ErrorCode::ToolLoopExhausted,
            format!("Model requested capabilities for more than {limit} rounds"),
        )
    }

    /// Missing or invalid configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Unexpected internal failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// HTTP status for this error
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {err}"))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::internal(format!("IO error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let message = if status.is_server_error() {
            error!(code = ?self.code, "Request failed: {}", self.message);
            self.code.public_message().to_owned()
        } else {
            warn!(code = ?self.code, "Request rejected: {}", self.message);
            self.message
        };

        let body = json!({
            "error": {
                "code": self.code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}
