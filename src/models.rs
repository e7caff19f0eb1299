// ABOUTME: Conversation and calendar data models shared by the agent and HTTP layers
// ABOUTME: Defines Turn, capability request/result payloads, and calendar event shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! Core data models
//!
//! A conversation is an append-only `Vec<Turn>` owned by a single request.
//! Turns are never mutated after construction; the agent only pushes new ones.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// End user
    User,
    /// The model
    Assistant,
    /// Instructions injected by the server
    System,
    /// Output of an executed capability
    ToolResult,
}

impl TurnRole {
    /// Role name as used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::ToolResult => "tool_result",
        }
    }
}

/// A capability invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    /// Provider-assigned call identifier, echoed back in the result
    pub id: String,
    /// Capability name
    pub name: String,
    /// Decoded arguments (an empty object for argument-less capabilities)
    pub arguments: Value,
}

/// Structured output of an executed capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResult {
    /// Identifier of the request this result answers
    pub call_id: String,
    /// Capability name
    pub name: String,
    /// Result payload
    pub payload: Value,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    capability_requests: Vec<CapabilityRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capability_result: Option<CapabilityResult>,
}

impl Turn {
    /// User-authored turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(TurnRole::User, content)
    }

    /// Assistant-authored turn without capability requests
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(TurnRole::Assistant, content)
    }

    /// System instruction turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(TurnRole::System, content)
    }

    /// Assistant turn that may carry capability requests
    pub fn assistant_with_requests(
        content: impl Into<String>,
        capability_requests: Vec<CapabilityRequest>,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            capability_requests,
            capability_result: None,
        }
    }

    /// Tool-result turn; the content is the payload serialized as JSON text
    #[must_use]
    pub fn tool_result(result: CapabilityResult) -> Self {
        let content = result.payload.to_string();
        Self {
            role: TurnRole::ToolResult,
            content,
            capability_requests: Vec::new(),
            capability_result: Some(result),
        }
    }

    fn plain(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            capability_requests: Vec::new(),
            capability_result: None,
        }
    }

    /// Turn author
    #[must_use]
    pub const fn role(&self) -> TurnRole {
        self.role
    }

    /// Text content
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Capability requests attached by the model (empty for other roles)
    #[must_use]
    pub fn capability_requests(&self) -> &[CapabilityRequest] {
        &self.capability_requests
    }

    /// Whether the model asked for at least one capability
    #[must_use]
    pub fn has_capability_request(&self) -> bool {
        !self.capability_requests.is_empty()
    }

    /// Capability result payload (tool-result turns only)
    #[must_use]
    pub const fn capability_result(&self) -> Option<&CapabilityResult> {
        self.capability_result.as_ref()
    }
}

/// Start or end of an external calendar event
///
/// Timed events carry `dateTime`; all-day events carry `date`. Any other
/// fields (for example `timeZone`) are kept so the raw shape round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTime {
    /// RFC 3339 timestamp for timed events
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// `YYYY-MM-DD` for all-day events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventTime {
    /// Precise timestamp when present, otherwise the date-only value
    #[must_use]
    pub fn preferred(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// Event record as returned by the calendar provider
///
/// Only the fields the normalizer needs are typed; everything else is carried
/// in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCalendarEvent {
    /// Event title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Event start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    /// Event end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Calendar event reduced to the three fields handed to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event title (empty when the provider has none)
    pub summary: String,
    /// Start as ISO datetime or date-only string
    pub start_date_time: Option<String>,
    /// End as ISO datetime or date-only string
    pub end_date_time: Option<String>,
}

impl From<&RawCalendarEvent> for CalendarEvent {
    fn from(raw: &RawCalendarEvent) -> Self {
        Self {
            summary: raw.summary.clone().unwrap_or_default(),
            start_date_time: raw
                .start
                .as_ref()
                .and_then(EventTime::preferred)
                .map(str::to_owned),
            end_date_time: raw
                .end
                .as_ref()
                .and_then(EventTime::preferred)
                .map(str::to_owned),
        }
    }
}
