// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides scripted LLM and calendar fakes plus server resource builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `pebble_server`

use std::collections::VecDeque;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use pebble_server::{
    calendar::CalendarSource,
    config::ServerConfig,
    errors::{AppError, AppResult},
    llm::{ChatRequest, ChatResponse, LlmProvider},
    models::{CapabilityRequest, RawCalendarEvent},
    resources::ServerResources,
};
use serde_json::json;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            Ok("WARN" | "ERROR") | _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// LLM fakes
// ============================================================================

/// Provider that replays canned responses and records every request
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<AppResult<ChatResponse>>>,
    requests: Mutex<Vec<ChatRequest>>,
    repeat_last: Option<ChatResponse>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Always answer with the same response once the script runs out
    pub fn repeating(response: ChatResponse) -> Self {
        Self {
            repeat_last: Some(response),
            ..Self::default()
        }
    }

    pub fn failing(error: AppError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(error)])),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete_with_tools(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        self.repeat_last
            .clone()
            .ok_or_else(|| AppError::internal("ScriptedLlm ran out of responses"))
    }
}

/// Plain text reply
pub fn text_reply(content: &str) -> ChatResponse {
    ChatResponse {
        content: Some(content.to_owned()),
        finish_reason: Some("stop".to_owned()),
        ..ChatResponse::default()
    }
}

/// Reply requesting the calendar capability
pub fn calendar_request_reply(call_id: &str) -> ChatResponse {
    ChatResponse {
        content: None,
        capability_requests: vec![CapabilityRequest {
            id: call_id.to_owned(),
            name: "get_upcoming_week_events".to_owned(),
            arguments: json!({}),
        }],
        finish_reason: Some("tool_calls".to_owned()),
        ..ChatResponse::default()
    }
}

// ============================================================================
// Calendar fakes
// ============================================================================

/// Calendar source returning a fixed event list
pub struct StaticCalendar {
    events: Vec<RawCalendarEvent>,
    calls: AtomicUsize,
}

impl StaticCalendar {
    pub fn new(events: Vec<RawCalendarEvent>) -> Self {
        Self {
            events,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSource for StaticCalendar {
    async fn fetch_upcoming_week(&self) -> AppResult<Vec<RawCalendarEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.clone())
    }
}

/// Calendar source that always fails with the given error factory
pub struct FailingCalendar(pub fn() -> AppError);

#[async_trait]
impl CalendarSource for FailingCalendar {
    async fn fetch_upcoming_week(&self) -> AppResult<Vec<RawCalendarEvent>> {
        Err((self.0)())
    }
}

/// Two events in provider shape: one timed, one all-day
pub fn sample_raw_events() -> Vec<RawCalendarEvent> {
    serde_json::from_value(json!([
        {
            "id": "evt-1",
            "summary": "CS 101 Lecture",
            "status": "confirmed",
            "start": { "dateTime": "2025-03-03T10:00:00-05:00", "timeZone": "America/New_York" },
            "end": { "dateTime": "2025-03-03T11:15:00-05:00", "timeZone": "America/New_York" }
        },
        {
            "id": "evt-2",
            "summary": "Spring Break",
            "start": { "date": "2025-03-08" },
            "end": { "date": "2025-03-09" }
        }
    ]))
    .unwrap()
}

// ============================================================================
// Resources
// ============================================================================

pub fn test_config() -> ServerConfig {
    ServerConfig {
        max_tool_iterations: 3,
        ..ServerConfig::default()
    }
}

pub fn create_test_resources(
    llm: Arc<dyn LlmProvider>,
    calendar: Arc<dyn CalendarSource>,
) -> Arc<ServerResources> {
    init_test_logging();
    Arc::new(ServerResources::new(Arc::new(test_config()), llm, calendar))
}
