// ABOUTME: Capability router deciding whether the agent loop fetches data or finishes
// ABOUTME: Pure decision over the last conversation turn plus the loop state machine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use crate::models::Turn;

/// Decision taken after each controller step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// No capability requested; the exchange is complete
    Terminate,
    /// The model asked for at least one capability
    InvokeCapability,
}

/// Agent loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Waiting on the model
    Generating,
    /// Running requested capabilities
    Fetching,
    /// Finished
    Done,
}

impl AgentState {
    /// Next state given the route chosen for the last turn
    ///
    /// `Fetching` always returns to `Generating`; `Done` is terminal.
    #[must_use]
    pub const fn next(self, route: Route) -> Self {
        match (self, route) {
            (Self::Generating, Route::Terminate) | (Self::Done, _) => Self::Done,
            (Self::Generating, Route::InvokeCapability) => Self::Fetching,
            (Self::Fetching, _) => Self::Generating,
        }
    }
}

/// Route on the last turn; an empty conversation terminates
#[must_use]
pub fn route(last: Option<&Turn>) -> Route {
    match last {
        Some(turn) if turn.has_capability_request() => Route::InvokeCapability,
        _ => Route::Terminate,
    }
}
