// ABOUTME: Message adapter turning front-end chat records into conversation turns
// ABOUTME: Maps the `user` sender tag to user turns and every other tag to assistant turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors

use serde::{Deserialize, Serialize};

use crate::models::Turn;

/// Chat record as sent by the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Sender tag (`"user"` or `"ai"`)
    pub from: String,
    /// Message text
    pub content: String,
}

/// Who authored a wire record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The end user
    User,
    /// Pebble (the front end tags these `"ai"`)
    Assistant,
}

impl From<&str> for Sender {
    /// Only the exact tag `"user"` is the user; anything else came from Pebble
    fn from(tag: &str) -> Self {
        if tag == "user" {
            Self::User
        } else {
            Self::Assistant
        }
    }
}

impl WireMessage {
    /// Convert into a conversation turn
    #[must_use]
    pub fn to_turn(&self) -> Turn {
        match Sender::from(self.from.as_str()) {
            Sender::User => Turn::user(&self.content),
            Sender::Assistant => Turn::assistant(&self.content),
        }
    }
}

/// Convert an ordered list of wire records into turns of equal length and order
#[must_use]
pub fn adapt_messages(messages: &[WireMessage]) -> Vec<Turn> {
    messages.iter().map(WireMessage::to_turn).collect()
}
