// ABOUTME: Conversation controller running one model step over the current turn list
// ABOUTME: Prepends the timestamped persona and declares the calendar capability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use crate::errors::AppResult;
use crate::llm::{prompts, ChatRequest, FunctionDeclaration, LlmProvider};
use crate::models::Turn;

/// Name of the only capability offered to the model
pub const UPCOMING_EVENTS_CAPABILITY: &str = "get_upcoming_week_events";

/// Declaration of the calendar capability (no arguments)
#[must_use]
pub fn upcoming_events_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: UPCOMING_EVENTS_CAPABILITY.to_owned(),
        description: "Retrieve Google Calendar events for the next 7 days. Returns a list of \
                      events with summary, start_date_time and end_date_time (ISO datetime, \
                      or date for all-day events)."
            .to_owned(),
        parameters: Some(json!({"type": "object", "properties": {}})),
    }
}

/// Agent step: one model call producing one assistant turn
pub struct ConversationController {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl ConversationController {
    /// Create a controller using `model` on `provider`
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Model name sent with every request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one step at the current wall-clock time
    ///
    /// # Errors
    ///
    /// Propagates any provider error.
    pub async fn step(&self, turns: &[Turn]) -> AppResult<Turn> {
        self.step_at(turns, Utc::now()).await
    }

    /// Run one step with an explicit timestamp for the system turn
    ///
    /// The input is not modified; the caller appends the returned turn.
    ///
    /// # Errors
    ///
    /// Propagates any provider error.
    pub async fn step_at(&self, turns: &[Turn], now: DateTime<Utc>) -> AppResult<Turn> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(Turn::system(prompts::pebble_system_prompt(now)));
        messages.extend_from_slice(turns);

        let request = ChatRequest::new(messages)
            .with_model(self.model.as_str())
            .with_tools(vec![upcoming_events_declaration()]);

        let response = self.provider.complete_with_tools(&request).await?;
        debug!(
            provider = self.provider.name(),
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            requests = response.capability_requests.len(),
            "Model step complete"
        );
        Ok(response.into_turn())
    }
}
