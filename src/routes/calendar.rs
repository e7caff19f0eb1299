// ABOUTME: Calendar route returning the raw upcoming-week events
// ABOUTME: Passes provider event records through without normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::RawCalendarEvent;
use crate::resources::ServerResources;

/// Response body for `GET /api/get-upcoming-week-events`
///
/// Events keep the provider's shape, unlike the normalized records the chat
/// tool hands to the model. Front ends read this shape directly.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpcomingEventsResponse {
    /// Provider event records ordered by start time
    pub events: Vec<RawCalendarEvent>,
}

/// Calendar routes handler
pub struct CalendarRoutes;

impl CalendarRoutes {
    /// Create all calendar routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/get-upcoming-week-events",
                get(Self::get_upcoming_week_events),
            )
            .route(
                "/api/get-upcoming-week-events/",
                get(Self::get_upcoming_week_events),
            )
            .with_state(resources)
    }

    async fn get_upcoming_week_events(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let events = resources.calendar.fetch_upcoming_week().await?;
        Ok((StatusCode::OK, Json(UpcomingEventsResponse { events })).into_response())
    }
}
