//! Concrete wire clients.
//!
//! [`a2a`] implements [`AgentTransport`](crate::remote_agent::AgentTransport)
//! for the debaters. The others implement
//! [`CompletionService`](crate::completion::CompletionService) for the judge
//! over OpenAI-compatible chat-completions endpoints.

pub mod a2a;
pub mod common;

pub mod gemini;
pub mod openai;
