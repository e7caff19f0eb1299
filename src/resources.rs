// ABOUTME: Shared server resources injected into every route handler
// ABOUTME: Holds configuration, the agent graph, and the process-wide calendar source
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use std::sync::Arc;

use crate::agent::AgentGraph;
use crate::calendar::CalendarSource;
use crate::config::ServerConfig;
use crate::llm::LlmProvider;

/// Dependencies shared by all requests
///
/// Built once at startup after the calendar gateway is initialized, then
/// handed to the routers behind an `Arc`.
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Agent loop
    pub agent: AgentGraph,
    /// Calendar source (the initialized gateway in production)
    pub calendar: Arc<dyn CalendarSource>,
}

impl ServerResources {
    /// Wire resources from configuration and external collaborators
    pub fn new(
        config: Arc<ServerConfig>,
        llm_provider: Arc<dyn LlmProvider>,
        calendar: Arc<dyn CalendarSource>,
    ) -> Self {
        let agent = AgentGraph::new(
            llm_provider,
            config.llm.default_model.as_str(),
            Arc::clone(&calendar),
            config.max_tool_iterations,
        );
        Self {
            config,
            agent,
            calendar,
        }
    }
}
