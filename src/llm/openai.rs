// ABOUTME: OpenAI-compatible Chat Completions client with function calling
// ABOUTME: Maps conversation turns to the wire format and tool calls back to capability requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! OpenAI Chat Completions provider
//!
//! Works against any endpoint speaking the `/chat/completions` protocol.
//! Tool-result turns are sent as `tool` messages referencing the originating
//! `tool_call_id`, and assistant turns that requested capabilities replay their
//! `tool_calls` so the provider can pair them up.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ChatRequest, ChatResponse, FunctionDeclaration, LlmProvider, TokenUsage};
use crate::errors::{AppError, AppResult};
use crate::models::{CapabilityRequest, Turn, TurnRole};

const SERVICE_NAME: &str = "OpenAI API";

/// OpenAI client configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer API key
    pub api_key: String,
    /// API base URL (default: <https://api.openai.com/v1>)
    pub base_url: String,
    /// Model used when the request does not name one
    pub default_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_owned(),
            default_model: "gpt-4o".to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_owned()
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    config: OpenAiConfig,
    http_client: Client,
}

impl OpenAiProvider {
    /// Create a provider from configuration
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            http_client: Client::new(),
        }
    }

    fn to_wire_message(turn: &Turn) -> WireMessage {
        match turn.role() {
            TurnRole::ToolResult => WireMessage {
                role: "tool".to_owned(),
                content: Some(turn.content().to_owned()),
                tool_calls: None,
                tool_call_id: turn.capability_result().map(|r| r.call_id.clone()),
            },
            TurnRole::Assistant if turn.has_capability_request() => WireMessage {
                role: "assistant".to_owned(),
                content: Some(turn.content().to_owned()).filter(|c| !c.is_empty()),
                tool_calls: Some(
                    turn.capability_requests()
                        .iter()
                        .map(|request| WireToolCall {
                            id: request.id.clone(),
                            kind: function_kind(),
                            function: WireFunctionCall {
                                name: request.name.clone(),
                                arguments: request.arguments.to_string(),
                            },
                        })
                        .collect(),
                ),
                tool_call_id: None,
            },
            role => WireMessage {
                role: match role {
                    TurnRole::User => "user",
                    TurnRole::System => "system",
                    TurnRole::Assistant | TurnRole::ToolResult => "assistant",
                }
                .to_owned(),
                content: Some(turn.content().to_owned()),
                tool_calls: None,
                tool_call_id: None,
            },
        }
    }

    fn to_wire_tool(declaration: &FunctionDeclaration) -> WireTool<'_> {
        WireTool {
            kind: "function",
            function: WireFunction {
                name: &declaration.name,
                description: &declaration.description,
                parameters: declaration
                    .parameters
                    .clone()
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            },
        }
    }

    /// Decode tool-call arguments, treating blank or malformed JSON as no arguments
    fn parse_arguments(call: &WireFunctionCall) -> Value {
        if call.arguments.trim().is_empty() {
            return json!({});
        }
        serde_json::from_str(&call.arguments).unwrap_or_else(|e| {
            warn!("Discarding malformed arguments for tool {}: {e}", call.name);
            json!({})
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete_with_tools(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let body = WireRequest {
            model,
            messages: request.messages.iter().map(Self::to_wire_message).collect(),
            tools: request.tools.iter().map(Self::to_wire_tool).collect(),
        };

        debug!(
            "Sending {} messages with {} tools to {model}",
            body.messages.len(),
            body.tools.len()
        );

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("Completion request failed with HTTP {status}: {text}"),
            ));
        }

        let wire: WireResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        let choice = wire.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(SERVICE_NAME, "Response contained no choices")
        })?;

        let capability_requests = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| CapabilityRequest {
                arguments: Self::parse_arguments(&call.function),
                id: call.id,
                name: call.function.name,
            })
            .collect();

        Ok(ChatResponse {
            content: choice.message.content,
            capability_requests,
            usage: wire.usage,
            finish_reason: choice.finish_reason,
        })
    }
}
