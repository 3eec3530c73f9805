//! # debatejudge
//!
//! debatejudge runs structured debates between two remotely hosted agents and
//! scores them with a language-model judge.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Request validation**: [`request::validate`] turns a loosely typed
//!   [`EvalRequest`] (participants plus a free-form config) into
//!   [`DebateParams`] before any network activity
//! * **Remote debaters**: [`RemoteAgentClient`] opens, continues and resets
//!   per-role conversations over any [`AgentTransport`]; [`clients::a2a`]
//!   speaks A2A JSON-RPC
//! * **Turn protocol**: [`DebateOrchestrator`] alternates pro and con through
//!   the [`state::DebatePhase`] machine and builds the [`Transcript`]
//! * **Judging**: [`Judge`] scores the transcript through any
//!   [`CompletionService`] using a fixed rubric and a strict output schema,
//!   yielding a validated [`DebateEval`]
//! * **Progress**: every turn, the judge hand-off, the verdict artifact and
//!   the final status flow through a [`ProgressReporter`]
//!
//! ## Running a debate
//!
//! ```rust,no_run
//! use debatejudge::event::ChannelReporter;
//! use debatejudge::{DebateEvaluator, DebateExecutor, DebateJudgeConfig, RunId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     debatejudge::init_logger();
//!
//!     let evaluator = DebateEvaluator::from_config(
//!         &DebateJudgeConfig::default(),
//!         &std::env::var("GOOGLE_API_KEY")?,
//!     );
//!     let executor = DebateExecutor::new(evaluator);
//!
//!     let run_id = RunId::new();
//!     let (reporter, mut events) = ChannelReporter::new(run_id);
//!     let printer = tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     let request = r#"{
//!         "participants": {"pro_debater": "http://127.0.0.1:9019/",
//!                          "con_debater": "http://127.0.0.1:9020/"},
//!         "config": {"topic": "Should AI be regulated?", "num_rounds": 3}
//!     }"#;
//!     let result = executor.execute(run_id, request, &reporter).await?;
//!     println!("{} wins: {}", result.winner, result.reason());
//!
//!     drop(reporter);
//!     printer.await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a network
//!
//! [`AgentTransport`], [`CompletionService`] and [`ProgressReporter`] are the
//! seams. Implement them with canned replies to drive a full run in memory;
//! the integration tests in `tests/` do exactly that.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding debatejudge can opt in to simple `RUST_LOG` driven
/// diagnostics without having to choose a specific logging backend upfront.
///
/// ```rust
/// debatejudge::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `debatejudge` module.
pub mod debatejudge;

// Re-exporting key items for easier external access.
pub use debatejudge::clients;
pub use debatejudge::completion;
pub use debatejudge::completion::{CompletionError, CompletionService, OutputSchema, TokenUsage};
pub use debatejudge::config;
pub use debatejudge::config::DebateJudgeConfig;
pub use debatejudge::conversation;
pub use debatejudge::conversation::{ConversationChannel, ConversationState, RunId, SessionStore};
pub use debatejudge::error::DebateError;
pub use debatejudge::evaluator;
pub use debatejudge::event;
pub use debatejudge::event::{Part, ProgressEvent, ProgressReporter, TaskState};
pub use debatejudge::executor;
pub use debatejudge::judge;
pub use debatejudge::judge::{DebateEval, DebaterScore, Judge, JudgingError};
pub use debatejudge::orchestrator;
pub use debatejudge::orchestrator::DebateOrchestrator;
pub use debatejudge::remote_agent;
pub use debatejudge::remote_agent::{AgentTransport, RemoteAgentClient, RemoteAgentError};
pub use debatejudge::request;
pub use debatejudge::request::{DebateParams, DebaterRole, EvalRequest, ValidationError};
pub use debatejudge::result;
pub use debatejudge::result::EvalResult;
pub use debatejudge::state;
pub use debatejudge::transcript;
pub use debatejudge::transcript::{Transcript, Turn};
pub use debatejudge::{DebateEvaluator, DebateExecutor};
