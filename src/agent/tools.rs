// ABOUTME: Tool executor running model-requested capabilities against the calendar source
// ABOUTME: Normalizes raw events to summary/start/end records returned as tool-result turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::controller::UPCOMING_EVENTS_CAPABILITY;
use crate::calendar::CalendarSource;
use crate::errors::AppResult;
use crate::models::{CalendarEvent, CapabilityRequest, CapabilityResult, RawCalendarEvent, Turn};

/// Project raw provider events down to the normalized shape
#[must_use]
pub fn normalize_events(events: &[RawCalendarEvent]) -> Vec<CalendarEvent> {
    events.iter().map(CalendarEvent::from).collect()
}

/// Executes capability requests on behalf of the model
pub struct ToolExecutor {
    calendar: Arc<dyn CalendarSource>,
}

impl ToolExecutor {
    /// Create an executor backed by `calendar`
    pub fn new(calendar: Arc<dyn CalendarSource>) -> Self {
        Self { calendar }
    }

    /// Run every capability requested on `turn`, one tool-result turn per request
    ///
    /// Results are returned in request order.
    ///
    /// # Errors
    ///
    /// Propagates calendar errors, including a not-initialized gateway.
    pub async fn execute(&self, turn: &Turn) -> AppResult<Vec<Turn>> {
        let mut results = Vec::with_capacity(turn.capability_requests().len());
        for request in turn.capability_requests() {
            results.push(self.execute_one(request).await?);
        }
        Ok(results)
    }

    async fn execute_one(&self, request: &CapabilityRequest) -> AppResult<Turn> {
        info!("Executing tool: {}", request.name);

        let payload = if request.name == UPCOMING_EVENTS_CAPABILITY {
            let raw = self.calendar.fetch_upcoming_week().await?;
            serde_json::to_value(normalize_events(&raw))?
        } else {
            // Reported back to the model as a tool result
            warn!("Model requested unknown tool {}", request.name);
            json!({
                "error": format!(
                    "Unknown tool `{}`. The only available tool is `{UPCOMING_EVENTS_CAPABILITY}`.",
                    request.name
                )
            })
        };

        Ok(Turn::tool_result(CapabilityResult {
            call_id: request.id.clone(),
            name: request.name.clone(),
            payload,
        }))
    }
}
