//! The full debate pipeline for one run.
//!
//! [`DebateEvaluator`] owns the long-lived pieces (agent transport, judge,
//! shared session store) and builds a fresh [`RemoteAgentClient`] for every
//! run. Sessions are keyed by run id, so any number of runs may be in flight
//! on one evaluator at once.
//!
//! Every run ends with exactly one conversation reset, whether it succeeds,
//! fails, or its future is dropped before completing.
//!
//! ```rust,no_run
//! use debatejudge::event::LogReporter;
//! use debatejudge::request::{validate, EvalRequest};
//! use debatejudge::{DebateEvaluator, DebateJudgeConfig, RunId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     debatejudge::init_logger();
//!
//!     let evaluator = DebateEvaluator::from_config(
//!         &DebateJudgeConfig::from_env(),
//!         &std::env::var("GOOGLE_API_KEY")?,
//!     );
//!     let request = EvalRequest::new()
//!         .with_participant("pro_debater", "http://127.0.0.1:9019/")
//!         .with_participant("con_debater", "http://127.0.0.1:9020/")
//!         .with_config("topic", "Should AI be regulated?")
//!         .with_config("num_rounds", 3);
//!     let params = validate(&request)?;
//!
//!     let run_id = RunId::new();
//!     let result = evaluator
//!         .run_eval(run_id, &params, &LogReporter::new(run_id))
//!         .await?;
//!     println!("{} wins: {}", result.winner, result.reason());
//!     Ok(())
//! }
//! ```

use crate::debatejudge::clients::a2a::A2aTransport;
use crate::debatejudge::clients::gemini::GeminiClient;
use crate::debatejudge::clients::openai::OpenAIClient;
use crate::debatejudge::completion::CompletionService;
use crate::debatejudge::config::DebateJudgeConfig;
use crate::debatejudge::conversation::{RunId, SessionStore};
use crate::debatejudge::error::DebateError;
use crate::debatejudge::event::ProgressReporter;
use crate::debatejudge::judge::Judge;
use crate::debatejudge::orchestrator::DebateOrchestrator;
use crate::debatejudge::remote_agent::{AgentTransport, RemoteAgentClient};
use crate::debatejudge::request::DebateParams;
use crate::debatejudge::result::{EvalResult, RESULT_ARTIFACT_NAME};
use log::info;
use std::sync::Arc;

pub struct DebateEvaluator {
    transport: Arc<dyn AgentTransport>,
    judge: Judge,
    sessions: Arc<SessionStore>,
}

impl DebateEvaluator {
    pub fn new(transport: Arc<dyn AgentTransport>, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            transport,
            judge: Judge::new(completion),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// A2A debaters and an OpenAI-compatible judge, as described by `config`.
    /// The Gemini endpoint gets a [`GeminiClient`], anything else an [`OpenAIClient`].
    pub fn from_config(config: &DebateJudgeConfig, api_key: &str) -> Self {
        let transport = A2aTransport::with_timeout(config.agent_timeout);
        let completion: Arc<dyn CompletionService> = if config.uses_gemini_endpoint() {
            Arc::new(
                GeminiClient::new_with_base_url(
                    api_key,
                    &config.judge_model,
                    &config.completion_base_url,
                )
                .with_timeout(config.completion_timeout),
            )
        } else {
            Arc::new(
                OpenAIClient::new_with_base_url(
                    api_key,
                    &config.judge_model,
                    &config.completion_base_url,
                )
                .with_timeout(config.completion_timeout),
            )
        };
        Self::new(Arc::new(transport), completion)
    }

    /// Share a session store with other evaluators.
    pub fn with_session_store(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    /// A run-scoped client over the shared store.
    pub fn client_for_run(&self, run_id: RunId) -> RemoteAgentClient {
        RemoteAgentClient::for_run(self.transport.clone(), run_id, self.sessions.clone())
    }

    /// Debate, judge and publish the result for one validated request.
    pub async fn run_eval(
        &self,
        run_id: RunId,
        params: &DebateParams,
        reporter: &dyn ProgressReporter,
    ) -> Result<EvalResult, DebateError> {
        let client = self.client_for_run(run_id);
        self.run_eval_with(&client, params, reporter).await
    }

    /// [`run_eval`](Self::run_eval) with a caller-supplied client. The
    /// client's conversation is reset once when this returns or is dropped.
    pub async fn run_eval_with(
        &self,
        client: &RemoteAgentClient,
        params: &DebateParams,
        reporter: &dyn ProgressReporter,
    ) -> Result<EvalResult, DebateError> {
        let guard = client.cleanup_guard();
        let outcome = self.drive(client, params, reporter).await;
        guard.finish();
        outcome
    }

    async fn drive(
        &self,
        client: &RemoteAgentClient,
        params: &DebateParams,
        reporter: &dyn ProgressReporter,
    ) -> Result<EvalResult, DebateError> {
        let mut orchestrator = DebateOrchestrator::new(client, reporter, params);
        orchestrator.orchestrate().await?;
        let eval = orchestrator.evaluate(&self.judge).await?;

        let result = EvalResult::from_eval(eval);
        reporter
            .report_artifact(result.artifact_parts()?, RESULT_ARTIFACT_NAME)
            .await;
        info!("run {}: {} wins", client.run_id(), result.winner);
        Ok(result)
    }
}
