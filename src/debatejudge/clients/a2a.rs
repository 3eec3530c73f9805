//! A2A (agent-to-agent) JSON-RPC transport for the remote debaters.
//!
//! Each turn is one `message/send` call carrying a single user text part. A
//! continuing turn also carries the `contextId` the agent returned before, so
//! the agent keeps the earlier turns on its side.
//!
//! An agent may answer with a `Message` or with a `Task`. For a task, the
//! status message parts come first, followed by the parts of every artifact,
//! and the task must be `completed`.

use crate::debatejudge::http_client_pool::get_or_create_client;
use crate::debatejudge::remote_agent::{AgentReply, AgentTransport, RemoteAgentError};
use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// One part of an A2A message or artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WirePart {
    Text { text: String },
    Data { data: Value },
    /// File parts and anything newer; ignored when merging.
    #[serde(other)]
    Other,
}

/// Join text parts and serialised data parts with newlines.
pub fn merge_parts<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a WirePart>,
{
    parts
        .into_iter()
        .filter_map(|part| match part {
            WirePart::Text { text } => Some(text.clone()),
            WirePart::Data { data } => Some(data.to_string()),
            WirePart::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundMessage<'a> {
    kind: &'static str,
    role: &'static str,
    parts: Vec<WirePart>,
    message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_id: Option<&'a str>,
}

#[derive(Serialize)]
struct SendParams<'a> {
    message: OutboundMessage<'a>,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: String,
    method: &'static str,
    params: SendParams<'a>,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(default)]
    parts: Vec<WirePart>,
    context_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTaskStatus {
    state: String,
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireArtifact {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    context_id: Option<String>,
    status: WireTaskStatus,
    #[serde(default)]
    artifacts: Vec<WireArtifact>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SendResult {
    Message(WireMessage),
    Task(WireTask),
}

/// [`AgentTransport`] speaking A2A JSON-RPC over HTTP.
#[derive(Debug, Clone)]
pub struct A2aTransport {
    timeout: Duration,
}

impl Default for A2aTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl A2aTransport {
    /// Agents may think for a long time before answering a turn.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn reply_from_result(endpoint: &Url, result: Value) -> Result<AgentReply, RemoteAgentError> {
        let malformed = |reason: String| RemoteAgentError::Malformed {
            endpoint: endpoint.to_string(),
            reason,
        };
        let result: SendResult =
            serde_json::from_value(result).map_err(|e| malformed(e.to_string()))?;

        match result {
            SendResult::Message(message) => {
                Ok(AgentReply::new(merge_parts(&message.parts), message.context_id))
            }
            SendResult::Task(task) => {
                if task.status.state != "completed" {
                    return Err(RemoteAgentError::TaskNotCompleted {
                        endpoint: endpoint.to_string(),
                        state: task.status.state,
                    });
                }
                let WireTask {
                    context_id,
                    status,
                    artifacts,
                } = task;
                let status_parts = status
                    .message
                    .as_ref()
                    .map(|message| message.parts.as_slice())
                    .unwrap_or(&[]);
                let artifact_parts = artifacts.iter().flat_map(|a| a.parts.iter());
                let text = merge_parts(status_parts.iter().chain(artifact_parts));
                let status_context = status.message.and_then(|message| message.context_id);
                Ok(AgentReply::new(text, context_id.or(status_context)))
            }
        }
    }
}

#[async_trait]
impl AgentTransport for A2aTransport {
    async fn send_message(
        &self,
        endpoint: &Url,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<AgentReply, RemoteAgentError> {
        let client = get_or_create_client(&endpoint.origin().ascii_serialization(), self.timeout)
            .map_err(|e| RemoteAgentError::Client {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method: "message/send",
            params: SendParams {
                message: OutboundMessage {
                    kind: "message",
                    role: "user",
                    parts: vec![WirePart::Text {
                        text: text.to_string(),
                    }],
                    message_id: Uuid::new_v4().to_string(),
                    context_id,
                },
            },
        };

        let response = client
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteAgentError::Timeout {
                        endpoint: endpoint.to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    RemoteAgentError::Unreachable {
                        endpoint: endpoint.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteAgentError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RemoteAgentError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                RemoteAgentError::Malformed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if let Some(error) = body.error {
            return Err(RemoteAgentError::Rpc {
                endpoint: endpoint.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        let result = body.result.ok_or_else(|| RemoteAgentError::Malformed {
            endpoint: endpoint.to_string(),
            reason: "response has neither result nor error".to_string(),
        })?;

        let reply = Self::reply_from_result(endpoint, result)?;
        debug!(
            "{} replied ({} chars, context {:?})",
            endpoint,
            reply.text.len(),
            reply.context_id
        );
        Ok(reply)
    }
}
