//! Generative-text API integration.
//!
//! - [`AIProvider`] is the seam the reply drafter calls through
//! - [`AnthropicProvider`] implements it against the Claude Messages API

pub mod anthropic;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use provider::{AIMessage, AIProvider, AIResponse, GenerateOptions, TokenUsage};
