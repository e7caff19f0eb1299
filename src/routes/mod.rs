// ABOUTME: Route module organization for the Pebble HTTP endpoints
// ABOUTME: Each domain module owns its paths and thin handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! HTTP routes
//!
//! | Method | Path                              | Module     |
//! |--------|-----------------------------------|------------|
//! | POST   | `/api/chat-with-pebble`           | `chat`     |
//! | POST   | `/api/create-study-plan`          | `chat`     |
//! | GET    | `/api/get-upcoming-week-events`   | `calendar` |
//! | GET    | `/health`                         | `health`   |

/// Upcoming calendar events
pub mod calendar;
/// Chat and study plan
pub mod chat;
/// Liveness probe
pub mod health;

pub use calendar::CalendarRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
