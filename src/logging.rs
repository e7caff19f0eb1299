// ABOUTME: Tracing subscriber setup for text or JSON log output
// ABOUTME: Called once by the server binary before anything else logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{AppError, AppResult};

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns a config error if the filter directives are invalid or a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| AppError::config(format!("Invalid log filter `{}`: {e}", config.filter)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    };

    result.map_err(|e| AppError::config(format!("Logging already initialized: {e}")))
}
