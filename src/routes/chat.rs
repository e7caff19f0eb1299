// ABOUTME: Chat and study-plan route handlers backed by the agent loop
// ABOUTME: Adapts front-end payloads into turns and returns the final model reply
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! Chat routes
//!
//! Both endpoints are stateless: the conversation is rebuilt from the request
//! body every time and discarded once the reply is sent.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::agent::{adapt_messages, WireMessage};
use crate::errors::AppError;
use crate::llm::prompts::study_plan_prompt;
use crate::models::Turn;
use crate::resources::ServerResources;

/// Sender tag used on every assistant reply
pub const AI_SENDER: &str = "ai";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/chat-with-pebble`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatWithPebbleRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<WireMessage>,
}

/// Response body for `POST /api/chat-with-pebble`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatWithPebbleResponse {
    /// Always `"ai"`
    pub from: String,
    /// Pebble's reply
    pub content: String,
}

/// Request body for `POST /api/create-study-plan`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStudyPlanRequest {
    /// Caller-defined task list, passed to the model as text
    #[serde(default)]
    pub tasks: Value,
}

/// Response body for `POST /api/create-study-plan`
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStudyPlanResponse {
    /// Markdown study plan
    #[serde(rename = "studyPlan")]
    pub study_plan: String,
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::invalid_input(rejection.body_text()))
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat-with-pebble", post(Self::chat_with_pebble))
            .route("/api/chat-with-pebble/", post(Self::chat_with_pebble))
            .route("/api/create-study-plan", post(Self::create_study_plan))
            .route("/api/create-study-plan/", post(Self::create_study_plan))
            .with_state(resources)
    }

    /// Continue a conversation with Pebble
    async fn chat_with_pebble(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<ChatWithPebbleRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = decode(payload)?;
        let turns = adapt_messages(&request.messages);

        let start_time = Instant::now();
        let content = resources.agent.reply(turns).await?;
        info!(
            "Chat reply generated in {} ms ({} chars)",
            start_time.elapsed().as_millis(),
            content.len()
        );

        let response = ChatWithPebbleResponse {
            from: AI_SENDER.to_owned(),
            content,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Generate a Markdown study plan from a task list
    async fn create_study_plan(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<CreateStudyPlanRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = decode(payload)?;
        let turns = vec![Turn::system(study_plan_prompt(&request.tasks)?)];

        let start_time = Instant::now();
        let study_plan = resources.agent.reply(turns).await?;
        info!(
            "Study plan generated in {} ms ({} chars)",
            start_time.elapsed().as_millis(),
            study_plan.len()
        );

        Ok((StatusCode::OK, Json(CreateStudyPlanResponse { study_plan })).into_response())
    }
}
