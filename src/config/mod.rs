// ABOUTME: Configuration module entry point
// ABOUTME: Re-exports the environment-based server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

/// Environment variable configuration
pub mod environment;

pub use environment::{LogFormat, LoggingConfig, ServerConfig};
