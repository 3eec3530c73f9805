//! The `OpenAIClient` struct implements `CompletionService` for OpenAI's Chat
//! Completions API, requesting strict `json_schema` output and capturing the
//! token usage of the last call.
//!
//! # Example
//!
//! ```rust,no_run
//! use debatejudge::clients::openai::{Model, OpenAIClient};
//! use debatejudge::completion::{CompletionService, OutputSchema};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key = std::env::var("OPEN_AI_SECRET").unwrap_or_default();
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT41Mini);
//!
//!     let schema = OutputSchema::new(
//!         "Answer",
//!         serde_json::json!({
//!             "type": "object",
//!             "properties": {"answer": {"type": "string"}},
//!             "required": ["answer"],
//!             "additionalProperties": false
//!         }),
//!     );
//!     match client.generate("You are terse.", "Say hi.", &schema).await {
//!         Ok(raw) => println!("{}", raw),
//!         Err(e) => eprintln!("{}", e),
//!     }
//!     if let Some(usage) = client.get_last_usage() {
//!         println!("tokens used: {}", usage.total_tokens);
//!     }
//! }
//! ```

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::debatejudge::clients::common::send_and_track;
use crate::debatejudge::completion::{CompletionError, CompletionService, OutputSchema, TokenUsage};
use crate::debatejudge::http_client_pool::get_or_create_client;

/// Default OpenAI REST base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";

/// Model identifiers that support structured outputs.
pub enum Model {
    /// `gpt-5`
    GPT5,
    /// `gpt-5-mini`
    GPT5Mini,
    /// `gpt-5-nano`
    GPT5Nano,
    /// `gpt-4o`
    GPT4o,
    /// `gpt-4o-mini`
    GPT4oMini,
    /// `gpt-4.1`
    GPT41,
    /// `gpt-4.1-mini`
    GPT41Mini,
    /// `gpt-4.1-nano`
    GPT41Nano,
    /// `o3`
    O3,
    /// `o4-mini`
    O4Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT5 => "gpt-5".to_string(),
        Model::GPT5Mini => "gpt-5-mini".to_string(),
        Model::GPT5Nano => "gpt-5-nano".to_string(),
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
        Model::O3 => "o3".to_string(),
        Model::O4Mini => "o4-mini".to_string(),
    }
}

/// Completion client for OpenAI's Chat Completions API or any compatible server.
pub struct OpenAIClient {
    base_url: String,
    secret_key: String,
    model: String,
    timeout: Duration,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Default per-request deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, OPENAI_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            base_url: base_url.to_string(),
            secret_key: secret_key.to_string(),
            model: model_name.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            token_usage: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionService for OpenAIClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, CompletionError> {
        let client = get_or_create_client(&self.base_url, self.timeout)
            .map_err(|e| CompletionError::Client(e.to_string()))?;
        send_and_track(
            &client,
            &self.base_url,
            &self.secret_key,
            &self.model,
            system_prompt,
            user_prompt,
            schema,
            &self.token_usage,
        )
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
