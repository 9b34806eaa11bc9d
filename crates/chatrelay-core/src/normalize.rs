//! Request normalizer — validates an inbound chat request and builds the
//! canonical message list sent upstream.
//!
//! The canonical list is always `[system, ...prior turns, new user turn]`.
//! The system turn comes from server config; callers can neither supply nor
//! read it.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{Message, Role};

/// One turn of caller-supplied conversation history.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Inbound chat request body.
///
/// Accepts the legacy single-shot shape `{ "message": "..." }` as well as the
/// full-history shape `{ "messages": [...] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatTurn>>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A validated request, ready for the fallback orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalRequest {
    /// Requested model id, if the caller named one.
    pub model: Option<String>,
    pub messages: Vec<Message>,
}

/// The request was rejected before any upstream call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("message or messages required")]
    MissingMessage,
    #[error("last message must be from the user")]
    LastTurnNotUser,
}

/// Validate `request` and build the canonical message sequence.
///
/// `history_limit` keeps only the most recent N prior turns; `None` forwards
/// the whole history.
pub fn normalize(
    request: ChatRequest,
    system_prompt: &str,
    history_limit: Option<usize>,
) -> Result<CanonicalRequest, NormalizeError> {
    let ChatRequest {
        message,
        messages,
        model,
    } = request;

    let message = message.filter(|m| !m.trim().is_empty());

    let mut turns: Vec<Message> = match messages.filter(|m| !m.is_empty()) {
        Some(history) => history
            .into_iter()
            .filter(|turn| {
                if turn.role == Role::System {
                    debug!("dropping caller-supplied system turn");
                    return false;
                }
                true
            })
            .map(|turn| Message::from_role(turn.role, turn.content))
            .collect(),
        None => match message {
            Some(text) => {
                return Ok(build(model, system_prompt, Vec::new(), text));
            }
            None => return Err(NormalizeError::MissingMessage),
        },
    };

    // History mode: the trailing user turn is the new message, unless the
    // caller sent it separately in `message`.
    let new_turn = match turns.pop() {
        Some(Message::User { content }) => content,
        last => {
            let had_history = last.is_some();
            turns.extend(last);
            match message {
                Some(text) => text,
                None if had_history => return Err(NormalizeError::LastTurnNotUser),
                None => return Err(NormalizeError::MissingMessage),
            }
        }
    };

    if let Some(limit) = history_limit {
        if turns.len() > limit {
            let dropped = turns.len() - limit;
            debug!(dropped, limit, "truncating conversation history");
            turns.drain(..dropped);
        }
    }

    Ok(build(model, system_prompt, turns, new_turn))
}

fn build(
    model: Option<String>,
    system_prompt: &str,
    prior: Vec<Message>,
    new_turn: String,
) -> CanonicalRequest {
    let mut messages = Vec::with_capacity(prior.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(prior);
    messages.push(Message::user(new_turn));

    CanonicalRequest {
        model: model.filter(|m| !m.trim().is_empty()),
        messages,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
