//! The turn-taking protocol of a single debate run.
//!
//! A [`DebateOrchestrator`] walks the [`DebatePhase`] machine: pro opens, con
//! opens in reply, then each further round has pro answer con's last argument
//! and con answer pro's. Every reply is appended to the [`Transcript`] and
//! reported before the next prompt is sent.
//!
//! The orchestrator never retries. The first [`RemoteAgentError`] moves the
//! run to `Failed` and is returned as is. Session cleanup is the caller's
//! concern (see [`DebateEvaluator`](crate::evaluator::DebateEvaluator)).

use crate::debatejudge::event::{ProgressReporter, TaskState};
use crate::debatejudge::judge::{DebateEval, Judge, JudgingError};
use crate::debatejudge::remote_agent::{RemoteAgentClient, RemoteAgentError};
use crate::debatejudge::request::DebateParams;
use crate::debatejudge::state::{DebatePhase, DebateRun};
use crate::debatejudge::transcript::Transcript;
use log::{error, info};

/// Status text emitted between the last turn and the judge call.
pub const EVALUATION_STARTED: &str = "Debate orchestration finished. Starting evaluation.";

/// Prompt for the debater speaking in `phase`.
///
/// `previous` is the opponent's last reply; it is ignored for pro's opening.
pub fn turn_prompt(phase: DebatePhase, topic: &str, previous: &str) -> String {
    match phase {
        DebatePhase::OpenPro => {
            format!("Debate Topic: {}. Present your opening argument.", topic)
        }
        DebatePhase::OpenCon => format!(
            "Debate Topic: {}. Present your opening argument. Your opponent opened with: {}",
            topic, previous
        ),
        _ => format!(
            "Your opponent said: {}. Present your next argument.",
            previous
        ),
    }
}

pub struct DebateOrchestrator<'a> {
    client: &'a RemoteAgentClient,
    reporter: &'a dyn ProgressReporter,
    params: &'a DebateParams,
    run: DebateRun,
    transcript: Transcript,
}

impl<'a> DebateOrchestrator<'a> {
    pub fn new(
        client: &'a RemoteAgentClient,
        reporter: &'a dyn ProgressReporter,
        params: &'a DebateParams,
    ) -> Self {
        Self {
            client,
            reporter,
            params,
            run: DebateRun::new(client.run_id(), params.num_rounds),
            transcript: Transcript::new(),
        }
    }

    pub fn run(&self) -> &DebateRun {
        &self.run
    }

    pub fn phase(&self) -> DebatePhase {
        self.run.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Take every turn of the debate.
    pub async fn orchestrate(&mut self) -> Result<&Transcript, RemoteAgentError> {
        info!(
            "run {}: debating {:?} over {} round(s)",
            self.run.run_id, self.params.topic, self.params.num_rounds
        );

        while let Some((phase, role, round)) = self.run.begin_next_turn() {
            let previous = self
                .transcript
                .last()
                .map(|turn| turn.text.as_str())
                .unwrap_or_default();
            let prompt = turn_prompt(phase, &self.params.topic, previous);

            let reply = match self
                .client
                .send(role, self.params.endpoint(role), &prompt, phase.is_opening())
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    error!("run {}: {} aborted the debate: {}", self.run.run_id, role, e);
                    self.run.fail(&e.to_string());
                    return Err(e);
                }
            };

            let turn = self.transcript.record(role, round, reply);
            info!(
                "run {}: {} round {} ({} chars)",
                self.run.run_id,
                role,
                round,
                turn.text.len()
            );
            self.reporter.report_turn(turn).await;
        }

        info!("{}", self.run.status_line());
        Ok(&self.transcript)
    }

    /// Hand the finished transcript to `judge`.
    ///
    /// Fails with [`JudgingError::NotReady`] unless every turn has been taken.
    pub async fn evaluate(&mut self, judge: &Judge) -> Result<DebateEval, JudgingError> {
        if self
            .run
            .transition(DebatePhase::Evaluating, "all turns taken")
            .is_err()
        {
            return Err(JudgingError::NotReady {
                phase: self.run.phase,
            });
        }
        info!(
            "run {}: {} turn(s) taken, judging with {}",
            self.run.run_id,
            self.transcript.len(),
            judge.model_name()
        );
        self.reporter
            .report_status(TaskState::Working, EVALUATION_STARTED)
            .await;

        let debate_text = self.transcript.format_for_judge();
        match judge.evaluate(&self.params.topic, &debate_text).await {
            Ok(eval) => {
                self.run
                    .transition(DebatePhase::Done, &format!("{} wins", eval.winner))
                    .map_err(|e| JudgingError::NotReady { phase: e.from })?;
                Ok(eval)
            }
            Err(e) => {
                self.run.fail(&e.to_string());
                Err(e)
            }
        }
    }
}
