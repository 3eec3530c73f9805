//! Request-to-verdict lifecycle around a [`DebateEvaluator`].
//!
//! The hosting server hands over the raw request text and a reporter. The
//! executor validates the request up front; a request that cannot start a
//! debate produces no progress events at all. Accepted requests get a
//! `working` status, the run itself, and exactly one terminal status.

use crate::debatejudge::conversation::RunId;
use crate::debatejudge::error::DebateError;
use crate::debatejudge::evaluator::DebateEvaluator;
use crate::debatejudge::event::{ProgressReporter, TaskState};
use crate::debatejudge::request::{validate, DebateParams, EvalRequest, ValidationError};
use crate::debatejudge::result::EvalResult;
use log::{error, warn};

/// Prefix of the first status of an accepted request.
pub const ASSESSMENT_STARTED: &str = "Starting assessment.";

pub struct DebateExecutor {
    evaluator: DebateEvaluator,
}

impl DebateExecutor {
    pub fn new(evaluator: DebateEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &DebateEvaluator {
        &self.evaluator
    }

    /// Parse and validate request text.
    pub fn prepare(request_text: &str) -> Result<(EvalRequest, DebateParams), ValidationError> {
        let checked = EvalRequest::from_json(request_text)
            .and_then(|request| validate(&request).map(|params| (request, params)));
        if let Err(e) = &checked {
            warn!("rejecting request: {}", e);
        }
        checked
    }

    pub async fn execute(
        &self,
        run_id: RunId,
        request_text: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<EvalResult, DebateError> {
        let (request, params) = Self::prepare(request_text)?;

        reporter
            .report_status(
                TaskState::Working,
                &format!("{}\n{}", ASSESSMENT_STARTED, request.to_json()?),
            )
            .await;

        match self.evaluator.run_eval(run_id, &params, reporter).await {
            Ok(result) => {
                reporter.report_status(TaskState::Completed, "").await;
                Ok(result)
            }
            Err(e) => {
                error!("run {} failed ({}): {}", run_id, e.kind(), e);
                reporter
                    .report_status(TaskState::Failed, &format!("Agent error: {}", e))
                    .await;
                Err(e)
            }
        }
    }
}
