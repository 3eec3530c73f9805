//! Talking to the remotely hosted debaters.
//!
//! [`AgentTransport`] is the wire seam: it sends one text message to an
//! endpoint, optionally inside an existing remote context, and returns the
//! reply. [`RemoteAgentClient`] layers the per-role session logic on top of a
//! transport using the run's [`ConversationChannel`].
//!
//! The concrete HTTP transport lives in [`clients::a2a`](crate::clients::a2a).

use crate::debatejudge::conversation::{CleanupGuard, ConversationChannel, RunId, SessionStore};
use crate::debatejudge::request::DebaterRole;
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;

/// A reply from a remote agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    /// Context id to send with the next message to continue this conversation.
    pub context_id: Option<String>,
}

impl AgentReply {
    pub fn new(text: impl Into<String>, context_id: Option<String>) -> Self {
        Self {
            text: text.into(),
            context_id,
        }
    }
}

/// Failure to obtain a usable reply from a remote agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteAgentError {
    #[error("{endpoint} is unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },
    #[error("{endpoint} did not answer within {timeout_secs}s")]
    Timeout { endpoint: String, timeout_secs: u64 },
    #[error("{endpoint} answered with HTTP status {status}")]
    HttpStatus { endpoint: String, status: u16 },
    #[error("{endpoint} sent a malformed reply: {reason}")]
    Malformed { endpoint: String, reason: String },
    #[error("{endpoint} sent an empty reply")]
    EmptyResponse { endpoint: String },
    #[error("{endpoint} responded with task state {state}")]
    TaskNotCompleted { endpoint: String, state: String },
    #[error("{endpoint} rejected the message ({code}): {message}")]
    Rpc {
        endpoint: String,
        code: i64,
        message: String,
    },
    #[error("could not build an HTTP client for {endpoint}: {reason}")]
    Client { endpoint: String, reason: String },
}

impl RemoteAgentError {
    pub fn endpoint(&self) -> &str {
        match self {
            RemoteAgentError::Unreachable { endpoint, .. }
            | RemoteAgentError::Timeout { endpoint, .. }
            | RemoteAgentError::HttpStatus { endpoint, .. }
            | RemoteAgentError::Malformed { endpoint, .. }
            | RemoteAgentError::EmptyResponse { endpoint }
            | RemoteAgentError::TaskNotCompleted { endpoint, .. }
            | RemoteAgentError::Rpc { endpoint, .. }
            | RemoteAgentError::Client { endpoint, .. } => endpoint,
        }
    }
}

/// Sends a single message to a remote agent.
///
/// Implementations handle transport concerns only (framing, timeouts,
/// decoding). Retrying, if any, belongs here as well; callers above this
/// trait never retry.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Send `text` to `endpoint`. `context_id` is `None` to open a new
    /// conversation, or the id from a previous [`AgentReply`] to continue one.
    async fn send_message(
        &self,
        endpoint: &Url,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<AgentReply, RemoteAgentError>;
}

/// Run-scoped client for the two debaters.
///
/// Each run gets its own client; clients for concurrent runs may share one
/// [`SessionStore`] because sessions are keyed by run id.
pub struct RemoteAgentClient {
    transport: Arc<dyn AgentTransport>,
    channel: ConversationChannel,
}

impl RemoteAgentClient {
    pub fn new(transport: Arc<dyn AgentTransport>, channel: ConversationChannel) -> Self {
        Self { transport, channel }
    }

    pub fn for_run(
        transport: Arc<dyn AgentTransport>,
        run_id: RunId,
        store: Arc<SessionStore>,
    ) -> Self {
        Self::new(transport, ConversationChannel::new(run_id, store))
    }

    pub fn run_id(&self) -> RunId {
        self.channel.run_id()
    }

    pub fn channel(&self) -> &ConversationChannel {
        &self.channel
    }

    /// Send `prompt` to the agent playing `role`.
    ///
    /// With `new_conversation` a fresh remote session is opened and replaces
    /// any previous one for that role. Otherwise the role's existing session
    /// is continued and only the new prompt is sent. Continuing a role that
    /// has no session opens one.
    pub async fn send(
        &self,
        role: DebaterRole,
        endpoint: &Url,
        prompt: &str,
        new_conversation: bool,
    ) -> Result<String, RemoteAgentError> {
        let existing = if new_conversation {
            None
        } else {
            self.channel.state(role).filter(|state| state.started)
        };
        let fresh = existing.is_none();
        if !new_conversation && fresh {
            warn!(
                "run {}: no session for {} to continue, opening a new one",
                self.run_id(),
                role
            );
        }
        let context_id = existing.and_then(|state| state.context_id);

        debug!(
            "run {}: -> {} at {} (context {:?}): {}",
            self.run_id(),
            role,
            endpoint,
            context_id,
            prompt
        );

        let reply = self
            .transport
            .send_message(endpoint, prompt, context_id.as_deref())
            .await
            .map_err(|e| {
                error!("run {}: {} failed: {}", self.run_id(), role, e);
                e
            })?;

        if reply.text.trim().is_empty() {
            error!("run {}: {} sent an empty reply", self.run_id(), role);
            return Err(RemoteAgentError::EmptyResponse {
                endpoint: endpoint.to_string(),
            });
        }

        if fresh {
            self.channel.begin(role, reply.context_id);
        } else {
            self.channel.advance(role, reply.context_id);
        }
        Ok(reply.text)
    }

    /// Release all session state of this run. Idempotent.
    pub fn reset(&self) {
        self.channel.reset();
    }

    pub fn cleanup_guard(&self) -> CleanupGuard {
        self.channel.cleanup_guard()
    }
}
