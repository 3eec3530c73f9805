use crate::debatejudge::clients::common::send_and_track;
use crate::debatejudge::completion::{CompletionError, CompletionService, OutputSchema, TokenUsage};
use crate::debatejudge::http_client_pool::get_or_create_client;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Gemini's OpenAI-compatible endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

pub struct GeminiClient {
    base_url: String,
    secret_key: String,
    pub model: String,
    timeout: Duration,
    token_usage: Mutex<Option<TokenUsage>>,
}

// Models with structured output support
pub enum Model {
    Gemini20Flash,
    Gemini20FlashLite,
    Gemini25Flash,
    Gemini25FlashLite,
    Gemini25Pro,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::Gemini20Flash => "gemini-2.0-flash".to_string(),
        Model::Gemini20FlashLite => "gemini-2.0-flash-lite".to_string(),
        Model::Gemini25Flash => "gemini-2.5-flash".to_string(),
        Model::Gemini25FlashLite => "gemini-2.5-flash-lite".to_string(),
        Model::Gemini25Pro => "gemini-2.5-pro".to_string(),
    }
}

impl GeminiClient {
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, GEMINI_BASE_URL)
    }

    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// This function is used to create a GeminiClient with a custom base URL
    /// The default base URL is "<https://generativelanguage.googleapis.com/v1beta/openai/>"
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GeminiClient {
            base_url: base_url.to_string(),
            secret_key: secret_key.to_string(),
            model: model_name.to_string(),
            timeout: Duration::from_secs(120),
            token_usage: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
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
