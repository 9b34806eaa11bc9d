//! Chatrelay core — the provider-independent half of the completion proxy.
//!
//! - [`types`] — chat messages and OpenAI-compatible wire types
//! - [`config`] — JSON config schema, loader, and env var overrides
//! - [`normalize`] — turns an inbound chat request into the canonical message list
//! - [`postprocess`] — text cleanup applied to every model reply

pub mod config;
pub mod normalize;
pub mod postprocess;
pub mod types;
pub mod utils;

pub use normalize::{normalize, CanonicalRequest, ChatRequest, ChatTurn, NormalizeError};
pub use postprocess::clean;
pub use types::{Message, Role};
