//! Terminal chat session — runs [`orchestrator::answer`], the same pipeline
//! behind `POST /api/chat`, without the HTTP hop.
//!
//! History lives in memory only and is gone when the session ends.

use anyhow::Result;
use tracing::debug;

use chatrelay_core::types::Role;
use chatrelay_core::{ChatRequest, ChatTurn};
use chatrelay_proxy::orchestrator;
use chatrelay_proxy::SharedState;

/// One answered turn.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    /// Client id of the model that answered (may be a fallback).
    pub model: String,
}

pub struct ChatSession {
    state: SharedState,
    model: Option<String>,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(state: SharedState, model: Option<String>) -> Self {
        Self {
            state,
            model,
            history: Vec::new(),
        }
    }

    /// Model the session asks for first.
    pub fn model_id(&self) -> &str {
        &self.state.registry.lookup(self.model.as_deref()).client_id
    }

    pub fn turns(&self) -> usize {
        self.history.len()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Send `text` with the conversation so far. The exchange is recorded
    /// only if a model answered.
    pub async fn send(&mut self, text: &str) -> Result<Reply> {
        if text.trim().is_empty() {
            anyhow::bail!("message is empty");
        }

        let mut messages = self.history.clone();
        messages.push(ChatTurn {
            role: Role::User,
            content: text.to_string(),
        });

        let request = ChatRequest {
            message: None,
            messages: Some(messages),
            model: self.model.clone(),
        };
        let completion = orchestrator::answer(&self.state, request).await?;
        debug!(model = %completion.model, attempts = completion.attempts, "reply received");

        let reply = completion.text;
        self.history.push(ChatTurn {
            role: Role::User,
            content: text.to_string(),
        });
        self.history.push(ChatTurn {
            role: Role::Assistant,
            content: reply.clone(),
        });

        Ok(Reply {
            text: reply,
            model: completion.model,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
