//! The completion-service seam used by the judge.
//!
//! A [`CompletionService`] takes a system prompt, a user prompt and an
//! [`OutputSchema`] and returns the raw text the model produced under that
//! schema. It does not interpret the text; parsing and validation belong to
//! the caller.
//!
//! Concrete OpenAI-compatible implementations live in
//! [`clients::openai`](crate::clients::openai) and
//! [`clients::gemini`](crate::clients::gemini).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// A named JSON Schema the completion must conform to.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Failure to obtain a completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(String),
    #[error("completion request timed out")]
    Timeout,
    #[error("completion service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion service sent a malformed response: {0}")]
    Malformed(String),
    #[error("completion service returned no content")]
    Empty,
    #[error("could not build an HTTP client: {0}")]
    Client(String),
}

/// A language-model endpoint producing schema-constrained output.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate a completion constrained by `schema` and return its raw text.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, CompletionError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Hook to retrieve usage from the *last* generate() call.
    /// Default impl returns None so services without accounting need no code.
    fn get_last_usage(&self) -> Option<TokenUsage> {
        self.usage_slot()
            .and_then(|slot| slot.lock().ok().and_then(|usage| usage.clone()))
    }

    /// Services that track token usage return their slot here.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
