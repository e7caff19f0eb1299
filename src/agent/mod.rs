// ABOUTME: Agent loop alternating model steps and calendar tool execution
// ABOUTME: Bounded finite-state loop over controller, router, and tool executor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

//! # Agent
//!
//! ```text
//! start -> Generating --(no capability request)--> Done
//!              |  ^
//!   (request)  v  | (always)
//!            Fetching
//! ```
//!
//! The conversation is an append-only `Vec<Turn>`: each controller step pushes
//! one assistant turn, each fetch pushes one tool-result turn per request.
//! Fetch rounds are capped; a model that keeps asking for data past the cap
//! fails the request.

use std::sync::Arc;

use tracing::info;

use crate::calendar::CalendarSource;
use crate::errors::{AppError, AppResult};
use crate::llm::LlmProvider;
use crate::models::Turn;

/// Front-end message adapter
pub mod adapter;
/// Single model step
pub mod controller;
/// Capability routing and loop states
pub mod router;
/// Capability execution
pub mod tools;

pub use adapter::{adapt_messages, Sender, WireMessage};
pub use controller::{ConversationController, UPCOMING_EVENTS_CAPABILITY};
pub use router::{route, AgentState, Route};
pub use tools::{normalize_events, ToolExecutor};

/// Default cap on fetch rounds per request
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Controller and tool executor wired into the bounded loop
pub struct AgentGraph {
    controller: ConversationController,
    tools: ToolExecutor,
    max_tool_iterations: usize,
}

impl AgentGraph {
    /// Wire the agent from its collaborators
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        calendar: Arc<dyn CalendarSource>,
        max_tool_iterations: usize,
    ) -> Self {
        Self {
            controller: ConversationController::new(provider, model),
            tools: ToolExecutor::new(calendar),
            max_tool_iterations,
        }
    }

    /// Run the loop to completion and return the full conversation
    ///
    /// # Errors
    ///
    /// Propagates provider and calendar errors, and fails with
    /// `ToolLoopExhausted` once the fetch-round cap is exceeded.
    pub async fn run(&self, mut turns: Vec<Turn>) -> AppResult<Vec<Turn>> {
        let mut state = AgentState::Generating;
        let mut tool_rounds = 0;

        while state != AgentState::Done {
            state = match state {
                AgentState::Generating => {
                    let reply = self.controller.step(&turns).await?;
                    turns.push(reply);
                    state.next(route(turns.last()))
                }
                AgentState::Fetching => {
                    if tool_rounds >= self.max_tool_iterations {
                        return Err(AppError::tool_loop_exhausted(self.max_tool_iterations));
                    }
                    tool_rounds += 1;
                    info!("Iteration {tool_rounds}: executing requested tools");

                    let results = match turns.last() {
                        Some(turn) => self.tools.execute(turn).await?,
                        None => Vec::new(),
                    };
                    turns.extend(results);
                    state.next(Route::InvokeCapability)
                }
                AgentState::Done => AgentState::Done,
            };
        }

        Ok(turns)
    }

    /// Run the loop and return the text of the final turn
    ///
    /// # Errors
    ///
    /// Same as [`AgentGraph::run`].
    pub async fn reply(&self, turns: Vec<Turn>) -> AppResult<String> {
        let conversation = self.run(turns).await?;
        Ok(conversation
            .last()
            .map(|turn| turn.content().to_owned())
            .unwrap_or_default())
    }
}
