//! Configuration for the debate judge.
//!
//! Provides the [`DebateJudgeConfig`] struct for choosing the judge model, the
//! completion endpoint and the network deadlines. Users construct this
//! manually or start from [`DebateJudgeConfig::from_env`]; no config-file
//! parsing dependencies are required. API keys are never part of it.
//!
//! # Example
//!
//! ```rust
//! use debatejudge::DebateJudgeConfig;
//! use std::time::Duration;
//!
//! // Gemini 2.5 Flash via Gemini's OpenAI-compatible endpoint
//! let config = DebateJudgeConfig::default();
//! assert_eq!(config.judge_model, "gemini-2.5-flash");
//!
//! // Or tune it
//! let config = DebateJudgeConfig {
//!     agent_timeout: Duration::from_secs(60),
//!     ..DebateJudgeConfig::default()
//! };
//! ```

use crate::debatejudge::clients::gemini::GEMINI_BASE_URL;
use log::warn;
use std::time::Duration;

pub const ENV_JUDGE_MODEL: &str = "DEBATE_JUDGE_MODEL";
pub const ENV_JUDGE_BASE_URL: &str = "DEBATE_JUDGE_BASE_URL";
pub const ENV_AGENT_TIMEOUT_SECS: &str = "DEBATE_AGENT_TIMEOUT_SECS";
pub const ENV_JUDGE_TIMEOUT_SECS: &str = "DEBATE_JUDGE_TIMEOUT_SECS";

/// Settings for a [`DebateEvaluator`](crate::evaluator::DebateEvaluator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateJudgeConfig {
    /// Model the judge asks for.
    pub judge_model: String,
    /// OpenAI-compatible base URL of the completion service.
    pub completion_base_url: String,
    /// Deadline for a single debater reply.
    pub agent_timeout: Duration,
    /// Deadline for the judge call.
    pub completion_timeout: Duration,
}

impl Default for DebateJudgeConfig {
    fn default() -> Self {
        Self {
            judge_model: "gemini-2.5-flash".to_string(),
            completion_base_url: GEMINI_BASE_URL.to_string(),
            agent_timeout: Duration::from_secs(300),
            completion_timeout: Duration::from_secs(120),
        }
    }
}

impl DebateJudgeConfig {
    /// Defaults overridden by the `DEBATE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Whether the judge talks to Gemini's OpenAI-compatible endpoint.
    pub fn uses_gemini_endpoint(&self) -> bool {
        self.completion_base_url.trim_end_matches('/') == GEMINI_BASE_URL.trim_end_matches('/')
    }

    /// Defaults overridden by whatever `lookup` returns for the `DEBATE_*`
    /// keys. Numeric values that do not parse are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(model) = value(ENV_JUDGE_MODEL) {
            config.judge_model = model;
        }
        if let Some(base_url) = value(ENV_JUDGE_BASE_URL) {
            config.completion_base_url = base_url;
        }
        if let Some(timeout) = value(ENV_AGENT_TIMEOUT_SECS)
            .and_then(|secs| parse_timeout_secs(ENV_AGENT_TIMEOUT_SECS, &secs))
        {
            config.agent_timeout = timeout;
        }
        if let Some(timeout) = value(ENV_JUDGE_TIMEOUT_SECS)
            .and_then(|secs| parse_timeout_secs(ENV_JUDGE_TIMEOUT_SECS, &secs))
        {
            config.completion_timeout = timeout;
        }
        config
    }
}

/// A positive whole number of seconds.
fn parse_timeout_secs(key: &str, raw: &str) -> Option<Duration> {
    match raw.parse::<u64>() {
        Ok(0) => {
            warn!("ignoring {}={:?}: timeout must be at least 1s", key, raw);
            None
        }
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!("ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
