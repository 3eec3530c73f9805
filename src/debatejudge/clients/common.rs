//! Shared request path for OpenAI-compatible chat-completions endpoints.

use crate::debatejudge::completion::{CompletionError, OutputSchema, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

/// Full chat-completions URL for an OpenAI-compatible base URL.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// `response_format` value asking for strict `json_schema` output.
pub fn json_schema_response_format(schema: &OutputSchema) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": schema.name,
            "strict": true,
            "schema": schema.schema,
        }
    })
}

/// Send a schema-constrained chat request, record its usage, and return the assistant's content.
#[allow(clippy::too_many_arguments)]
pub async fn send_and_track(
    client: &reqwest::Client,
    base_url: &str,
    secret_key: &str,
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
    schema: &OutputSchema,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, CompletionError> {
    let request = ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system_prompt,
            },
            ChatMessage {
                role: "user",
                content: user_prompt,
            },
        ],
        response_format: json_schema_response_format(schema),
    };

    let response = client
        .post(chat_completions_url(base_url))
        .bearer_auth(secret_key)
        .json(&request)
        .send()
        .await
        .map_err(|err| {
            log::error!(
                "debatejudge::clients::common::send_and_track(...): request to {} failed: {}",
                base_url,
                err
            );
            if err.is_timeout() {
                CompletionError::Timeout
            } else {
                CompletionError::Request(err.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::error!(
            "debatejudge::clients::common::send_and_track(...): HTTP {} from {}: {}",
            status,
            base_url,
            body
        );
        return Err(CompletionError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body: ChatResponse = response
        .json()
        .await
        .map_err(|err| CompletionError::Malformed(err.to_string()))?;

    if let Some(usage) = body.usage {
        // Store it for get_last_usage()
        *usage_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        });
    }

    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::Empty)?;
    if content.trim().is_empty() {
        return Err(CompletionError::Empty);
    }
    Ok(content)
}
