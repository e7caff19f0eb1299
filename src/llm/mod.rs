// ABOUTME: LLM provider abstraction with tool-calling request and response types
// ABOUTME: Defines the LlmProvider trait implemented by the OpenAI-compatible client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! # LLM Provider Abstraction
//!
//! The agent talks to the model through [`LlmProvider`]. A request is the full
//! ordered turn list plus the capabilities the model may call; a response is
//! the reply text plus any capability requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppResult;
use crate::models::{CapabilityRequest, Turn};

/// OpenAI-compatible Chat Completions client
pub mod openai;
/// Fixed persona and study-plan prompts
pub mod prompts;

pub use openai::{OpenAiConfig, OpenAiProvider};

/// Capability the model is allowed to invoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Capability name
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: Option<Value>,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Sum of both
    pub total_tokens: u32,
}

/// A single completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Ordered conversation, system turn first
    pub messages: Vec<Turn>,
    /// Model override (provider default when `None`)
    pub model: Option<String>,
    /// Declared capabilities
    pub tools: Vec<FunctionDeclaration>,
}

impl ChatRequest {
    /// Create a request with no tools and the provider's default model
    #[must_use]
    pub fn new(messages: Vec<Turn>) -> Self {
        Self {
            messages,
            model: None,
            tools: Vec::new(),
        }
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Declare the capabilities the model may request
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<FunctionDeclaration>) -> Self {
        self.tools = tools;
        self
    }
}

/// Model reply
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Reply text (absent when the model only requested capabilities)
    pub content: Option<String>,
    /// Capabilities the model asked to run
    pub capability_requests: Vec<CapabilityRequest>,
    /// Token usage if reported
    pub usage: Option<TokenUsage>,
    /// Finish reason if reported
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Convert the reply into the assistant turn appended to the conversation
    #[must_use]
    pub fn into_turn(self) -> Turn {
        Turn::assistant_with_requests(self.content.unwrap_or_default(), self.capability_requests)
    }
}

/// Chat model with tool calling
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Model used when a request does not specify one
    fn default_model(&self) -> &str;

    /// Run one completion
    ///
    /// # Errors
    ///
    /// Returns an external-service error if the provider call fails or its
    /// response cannot be decoded.
    async fn complete_with_tools(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}
