// ABOUTME: Integration tests for the HTTP route handlers
// ABOUTME: Exercises chat, study plan, events, health, CORS, and error bodies end to end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    calendar_request_reply, create_test_resources, sample_raw_events, test_config, text_reply,
    FailingCalendar, ScriptedLlm, StaticCalendar,
};
use helpers::axum_test::AxumTestRequest;
use pebble_server::errors::AppError;
use pebble_server::models::TurnRole;
use pebble_server::resources::ServerResources;
use pebble_server::routes::calendar::UpcomingEventsResponse;
use pebble_server::routes::chat::{ChatWithPebbleResponse, CreateStudyPlanResponse};
use pebble_server::routes::health::HealthResponse;
use pebble_server::server::build_router;
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

fn setup(llm: Arc<ScriptedLlm>, calendar: Arc<StaticCalendar>) -> axum::Router {
    build_router(&create_test_resources(llm, calendar))
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_plain_reply() {
    let llm = Arc::new(ScriptedLlm::new(vec![text_reply("Hi! How are you feeling today?")]));
    let calendar = Arc::new(StaticCalendar::new(Vec::new()));
    let router = setup(llm.clone(), calendar.clone());

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({ "messages": [{ "from": "user", "content": "Hi" }] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatWithPebbleResponse = response.json();
    assert_eq!(body.from, "ai");
    assert_eq!(body.content, "Hi! How are you feeling today?");
    assert_eq!(llm.call_count(), 1);
    assert_eq!(calendar.call_count(), 0);
}

#[tokio::test]
async fn test_chat_with_calendar_lookup() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        calendar_request_reply("call_1"),
        text_reply("You have CS 101 Lecture on Monday at 10 AM."),
    ]));
    let calendar = Arc::new(StaticCalendar::new(sample_raw_events()));
    let router = setup(llm.clone(), calendar.clone());

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({
            "messages": [
                { "from": "user", "content": "Hi" },
                { "from": "ai", "content": "Hello!" },
                { "from": "user", "content": "What's on my calendar this week?" }
            ]
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatWithPebbleResponse = response.json();
    assert_eq!(body.content, "You have CS 101 Lecture on Monday at 10 AM.");
    assert_eq!(calendar.call_count(), 1);

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    // system + 3 history turns on the first call
    assert_eq!(requests[0].messages.len(), 4);
    assert_eq!(requests[0].messages[2].role(), TurnRole::Assistant);
    let tool_turn = &requests[1].messages[5];
    assert_eq!(tool_turn.role(), TurnRole::ToolResult);
    let payload: Value = serde_json::from_str(tool_turn.content()).unwrap();
    assert_eq!(
        payload[0],
        json!({
            "summary": "CS 101 Lecture",
            "start_date_time": "2025-03-03T10:00:00-05:00",
            "end_date_time": "2025-03-03T11:15:00-05:00"
        })
    );
}

#[tokio::test]
async fn test_chat_accepts_trailing_slash() {
    let llm = Arc::new(ScriptedLlm::new(vec![text_reply("Hello")]));
    let router = setup(llm, Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/chat-with-pebble/")
        .json(&json!({ "messages": [{ "from": "user", "content": "Hi" }] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_treats_unrecognized_sender_as_assistant() {
    let llm = Arc::new(ScriptedLlm::new(vec![text_reply("Back to the story!")]));
    let router = setup(llm.clone(), Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({
            "messages": [
                { "from": "narrator", "content": "Meanwhile..." },
                { "from": "user", "content": "Go on" }
            ]
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ChatWithPebbleResponse = response.json();
    assert_eq!(body.content, "Back to the story!");

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    // system turn first, then the two history turns
    assert_eq!(requests[0].messages.len(), 3);
    assert_eq!(requests[0].messages[1].role(), TurnRole::Assistant);
    assert_eq!(requests[0].messages[1].content(), "Meanwhile...");
    assert_eq!(requests[0].messages[2].role(), TurnRole::User);
}

#[tokio::test]
async fn test_chat_rejects_record_without_sender() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let router = setup(llm.clone(), Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({ "messages": [{ "content": "Who said this?" }] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let router = setup(llm.clone(), Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .raw_body("application/json", "{ not json")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_chat_rejects_missing_messages_field() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let router = setup(llm, Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({ "history": [] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_provider_failure_is_opaque() {
    let llm = Arc::new(ScriptedLlm::failing(AppError::external_service(
        "OpenAI API",
        "Completion request failed with HTTP 401: invalid key sk-secret",
    )));
    let router = setup(llm, Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({ "messages": [{ "from": "user", "content": "Hi" }] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "EXTERNAL_SERVICE_ERROR");
    assert!(!response.text().contains("sk-secret"));
}

#[tokio::test]
async fn test_chat_tool_loop_exhaustion_is_bad_gateway() {
    let llm = Arc::new(ScriptedLlm::repeating(calendar_request_reply("call_x")));
    let calendar = Arc::new(StaticCalendar::new(Vec::new()));
    let router = setup(llm, calendar.clone());

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({ "messages": [{ "from": "user", "content": "Keep checking" }] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "TOOL_LOOP_EXHAUSTED");
    // test_config caps the loop at 3 rounds
    assert_eq!(calendar.call_count(), 3);
}

#[tokio::test]
async fn test_chat_with_uninitialized_calendar_fails() {
    let llm = Arc::new(ScriptedLlm::new(vec![calendar_request_reply("call_1")]));
    let calendar = Arc::new(FailingCalendar(|| {
        AppError::not_initialized("Google Calendar service")
    }));
    let router = build_router(&create_test_resources(llm, calendar));

    let response = AxumTestRequest::post("/api/chat-with-pebble")
        .json(&json!({ "messages": [{ "from": "user", "content": "Schedule?" }] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_INITIALIZED");
}

// ============================================================================
// Study plan
// ============================================================================

#[tokio::test]
async fn test_create_study_plan() {
    let plan = "### Monday, March 3\n- **3:30 PM – 4:20 PM:** Calculus (derivatives)";
    let llm = Arc::new(ScriptedLlm::new(vec![text_reply(plan)]));
    let router = setup(llm.clone(), Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/create-study-plan")
        .json(&json!({
            "tasks": [
                { "name": "Calculus homework", "estimatedHours": 3, "due": "2025-03-06" },
                { "name": "History essay", "estimatedHours": 5, "due": "2025-03-09" }
            ]
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: CreateStudyPlanResponse = response.json();
    assert_eq!(body.study_plan, plan);

    let raw: Value = response.json();
    assert!(raw.get("studyPlan").is_some());

    let requests = llm.requests();
    assert_eq!(requests[0].messages.len(), 2);
    assert_eq!(requests[0].messages[0].role(), TurnRole::System);
    assert_eq!(requests[0].messages[1].role(), TurnRole::System);
    assert!(requests[0].messages[1].content().contains("History essay"));
}

#[tokio::test]
async fn test_create_study_plan_with_empty_tasks() {
    let llm = Arc::new(ScriptedLlm::new(vec![text_reply("")]));
    let router = setup(llm, Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/create-study-plan")
        .json(&json!({ "tasks": [] }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: CreateStudyPlanResponse = response.json();
    assert_eq!(body.study_plan, "");
}

#[tokio::test]
async fn test_create_study_plan_requires_tasks() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let router = setup(llm.clone(), Arc::new(StaticCalendar::new(Vec::new())));

    let response = AxumTestRequest::post("/api/create-study-plan")
        .json(&json!({}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(llm.call_count(), 0);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_get_upcoming_week_events_returns_raw_shape() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let calendar = Arc::new(StaticCalendar::new(sample_raw_events()));
    let router = setup(llm.clone(), calendar.clone());

    let response = AxumTestRequest::get("/api/get-upcoming-week-events")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["id"], "evt-1");
    assert_eq!(events[0]["start"]["dateTime"], "2025-03-03T10:00:00-05:00");
    assert_eq!(events[1]["start"]["date"], "2025-03-08");

    let typed: UpcomingEventsResponse = response.json();
    assert_eq!(typed.events, sample_raw_events());
    assert_eq!(calendar.call_count(), 1);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_get_upcoming_week_events_empty() {
    let router = setup(
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(Vec::new())),
    );

    let response = AxumTestRequest::get("/api/get-upcoming-week-events/")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body, json!({ "events": [] }));
}

#[tokio::test]
async fn test_get_upcoming_week_events_provider_failure() {
    let calendar = Arc::new(FailingCalendar(|| {
        AppError::external_service("Google Calendar API", "Events request failed with HTTP 403")
    }));
    let router = build_router(&create_test_resources(
        Arc::new(ScriptedLlm::new(Vec::new())),
        calendar,
    ));

    let response = AxumTestRequest::get("/api/get-upcoming-week-events")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

// ============================================================================
// Health and middleware
// ============================================================================

#[tokio::test]
async fn test_health() {
    let router = setup(
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(Vec::new())),
    );

    let response = AxumTestRequest::get("/health").send(router).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "ok");
    assert_eq!(body.service, "pebble-server");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_allows_any_origin_with_credentials_by_default() {
    let router = setup(
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(Vec::new())),
    );

    let response = AxumTestRequest::options("/api/chat-with-pebble")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    // Wildcard origins are echoed back because `*` cannot carry credentials
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("http://localhost:3000")
    );
    assert_eq!(
        response.header("access-control-allow-credentials"),
        Some("true")
    );
    assert_eq!(response.header("access-control-allow-methods"), Some("POST"));
    assert_eq!(
        response.header("access-control-allow-headers"),
        Some("content-type")
    );
}

#[tokio::test]
async fn test_cors_credentials_on_simple_api_request() {
    let router = setup(
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(sample_raw_events())),
    );

    let response = AxumTestRequest::get("/api/get-upcoming-week-events")
        .header("origin", "https://pebble.example")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("access-control-allow-origin"),
        Some("https://pebble.example")
    );
    assert_eq!(
        response.header("access-control-allow-credentials"),
        Some("true")
    );
}

#[tokio::test]
async fn test_cors_not_applied_to_health() {
    let router = setup(
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(Vec::new())),
    );

    let response = AxumTestRequest::get("/health")
        .header("origin", "http://localhost:3000")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origins() {
    let mut config = test_config();
    config.cors_allowed_origins = vec!["http://localhost:3000".to_owned()];
    let resources = Arc::new(ServerResources::new(
        Arc::new(config),
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(Vec::new())),
    ));
    let router = build_router(&resources);

    let allowed = AxumTestRequest::options("/api/get-upcoming-week-events")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "GET")
        .send(router.clone())
        .await;
    assert_eq!(
        allowed.header("access-control-allow-origin"),
        Some("http://localhost:3000")
    );
    assert_eq!(
        allowed.header("access-control-allow-credentials"),
        Some("true")
    );

    let denied = AxumTestRequest::options("/api/get-upcoming-week-events")
        .header("origin", "http://evil.test")
        .header("access-control-request-method", "GET")
        .send(router)
        .await;
    assert!(denied.header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let router = setup(
        Arc::new(ScriptedLlm::new(Vec::new())),
        Arc::new(StaticCalendar::new(Vec::new())),
    );

    let response = AxumTestRequest::get("/api/does-not-exist").send(router).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
