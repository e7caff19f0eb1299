// ABOUTME: Main library entry point for the Pebble study-companion backend
// ABOUTME: Provides the agent loop, calendar gateway, and HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

#![deny(unsafe_code)]

//! # Pebble Server
//!
//! Backend for Pebble, a conversational study companion. A language model
//! answers student messages and may call one capability, fetching the
//! student's calendar events for the coming week, before it replies.
//!
//! ## Architecture
//!
//! - **Agent**: bounded loop alternating model steps and capability execution
//! - **Calendar**: OAuth credential lifecycle and the upcoming-week query
//! - **LLM**: chat-completions provider and prompt construction
//! - **Routes**: chat, study plan, events, and health endpoints
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pebble_server::config::ServerConfig;
//! use pebble_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Pebble configured on {}:{}", config.host, config.http_port);
//!     Ok(())
//! }
//! ```

/// Agent loop
pub mod agent;

/// Calendar gateway and OAuth credentials
pub mod calendar;

/// Environment configuration
pub mod config;

/// Unified error handling
pub mod errors;

/// LLM provider abstraction and prompts
pub mod llm;

/// Tracing subscriber setup
pub mod logging;

/// Conversation and calendar data types
pub mod models;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Server assembly and lifecycle
pub mod server;
