use async_trait::async_trait;
use debatejudge::completion::{CompletionError, CompletionService, OutputSchema};
use debatejudge::event::{Part, ProgressReporter, TaskState};
use debatejudge::orchestrator::{DebateOrchestrator, EVALUATION_STARTED};
use debatejudge::remote_agent::{AgentReply, AgentTransport, RemoteAgentClient, RemoteAgentError};
use debatejudge::state::DebatePhase;
use debatejudge::{
    DebateError, DebateEvaluator, DebateParams, DebaterRole, Judge, JudgingError, RunId,
    SessionStore,
};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
struct Call {
    host: String,
    text: String,
    context_id: Option<String>,
}

/// Answers "<host> argument <n>" and fails the configured host on its n-th call.
#[derive(Default)]
struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    per_host: Mutex<HashMap<String, usize>>,
    fail_on: Option<(String, usize)>,
}

impl ScriptedTransport {
    fn failing(host: &str, call: usize) -> Self {
        Self {
            fail_on: Some((host.to_string(), call)),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn send_message(
        &self,
        endpoint: &Url,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<AgentReply, RemoteAgentError> {
        let host = endpoint.host_str().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(Call {
            host: host.clone(),
            text: text.to_string(),
            context_id: context_id.map(str::to_string),
        });
        let n = {
            let mut per_host = self.per_host.lock().unwrap();
            let count = per_host.entry(host.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some((fail_host, fail_call)) = &self.fail_on {
            if *fail_host == host && *fail_call == n {
                return Err(RemoteAgentError::Unreachable {
                    endpoint: endpoint.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
        }
        Ok(AgentReply::new(
            format!("{} argument {}", host, n),
            Some(format!("ctx-{}", host)),
        ))
    }
}

const VALID_EVAL: &str = r#"{
    "pro_debater": {"emotional_appeal": 0.7, "argument_clarity": 0.8,
                    "argument_arrangement": 0.9, "relevance_to_topic": 1.0, "total_score": 3.4},
    "con_debater": {"emotional_appeal": 0.6, "argument_clarity": 0.5,
                    "argument_arrangement": 0.4, "relevance_to_topic": 0.9, "total_score": 2.4},
    "winner": "pro_debater",
    "reason": "Pro built a clearer case."
}"#;

struct CannedCompletion {
    raw: String,
    calls: AtomicUsize,
    user_prompts: Mutex<Vec<String>>,
}

impl CannedCompletion {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            calls: AtomicUsize::new(0),
            user_prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionService for CannedCompletion {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _schema: &OutputSchema,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.user_prompts.lock().unwrap().push(user_prompt.to_string());
        Ok(self.raw.clone())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

#[derive(Default)]
struct RecordingReporter {
    statuses: Mutex<Vec<(TaskState, String)>>,
    artifacts: Mutex<Vec<(String, Vec<Part>)>>,
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report_status(&self, state: TaskState, text: &str) {
        self.statuses.lock().unwrap().push((state, text.to_string()));
    }

    async fn report_artifact(&self, parts: Vec<Part>, name: &str) {
        self.artifacts.lock().unwrap().push((name.to_string(), parts));
    }
}

fn params(topic: &str, num_rounds: u32) -> DebateParams {
    DebateParams {
        pro_endpoint: Url::parse("http://ep1.test/").unwrap(),
        con_endpoint: Url::parse("http://ep2.test/").unwrap(),
        topic: topic.to_string(),
        num_rounds,
    }
}

fn client(transport: Arc<ScriptedTransport>) -> RemoteAgentClient {
    RemoteAgentClient::for_run(transport, RunId::new(), Arc::new(SessionStore::new()))
}

#[tokio::test]
async fn test_transcript_has_two_alternating_turns_per_round() {
    for num_rounds in 1..=4u32 {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client(transport.clone());
        let reporter = RecordingReporter::default();
        let params = params("Cats vs Dogs", num_rounds);

        let mut orchestrator = DebateOrchestrator::new(&client, &reporter, &params);
        let transcript = orchestrator.orchestrate().await.unwrap();

        assert_eq!(transcript.len(), 2 * num_rounds as usize);
        for (i, turn) in transcript.turns().iter().enumerate() {
            let expected = if i % 2 == 0 {
                DebaterRole::Pro
            } else {
                DebaterRole::Con
            };
            assert_eq!(turn.role, expected);
            assert_eq!(turn.round, i as u32 / 2 + 1);
            assert_eq!(turn.index, i);
        }

        let statuses = reporter.statuses.lock().unwrap().clone();
        let expected: Vec<(TaskState, String)> = transcript
            .turns()
            .iter()
            .map(|turn| (TaskState::Working, turn.status_line()))
            .collect();
        assert_eq!(statuses, expected);
        assert_eq!(orchestrator.phase().successor(num_rounds), Some(DebatePhase::Evaluating));
    }
}

#[tokio::test]
async fn test_prompts_follow_the_turn_protocol() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = client(transport.clone());
    let reporter = RecordingReporter::default();
    let params = params("Cats vs Dogs", 2);

    DebateOrchestrator::new(&client, &reporter, &params)
        .orchestrate()
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(
        calls,
        vec![
            Call {
                host: "ep1.test".into(),
                text: "Debate Topic: Cats vs Dogs. Present your opening argument.".into(),
                context_id: None,
            },
            Call {
                host: "ep2.test".into(),
                text: "Debate Topic: Cats vs Dogs. Present your opening argument. \
                       Your opponent opened with: ep1.test argument 1"
                    .into(),
                context_id: None,
            },
            Call {
                host: "ep1.test".into(),
                text: "Your opponent said: ep2.test argument 1. Present your next argument.".into(),
                context_id: Some("ctx-ep1.test".into()),
            },
            Call {
                host: "ep2.test".into(),
                text: "Your opponent said: ep1.test argument 2. Present your next argument.".into(),
                context_id: Some("ctx-ep2.test".into()),
            },
        ]
    );
}

#[tokio::test]
async fn test_single_round_debate_is_judged_once() {
    let transport = Arc::new(ScriptedTransport::default());
    let completion = Arc::new(CannedCompletion::new(VALID_EVAL));
    let evaluator = DebateEvaluator::new(transport.clone(), completion.clone());
    let reporter = RecordingReporter::default();

    let result = evaluator
        .run_eval(RunId::new(), &params("Cats vs Dogs", 1), &reporter)
        .await
        .unwrap();

    assert_eq!(transport.calls().len(), 2);
    assert_eq!(completion.calls.load(Ordering::SeqCst), 1);

    let prompt = completion.user_prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("'Cats vs Dogs'"));
    assert_eq!(prompt.matches("Pro Argument 1:").count(), 1);
    assert_eq!(prompt.matches("Con Argument 1:").count(), 1);
    assert!(!prompt.contains("Argument 2:"));

    assert!(DebaterRole::ALL.contains(&result.winner));
    assert_eq!(result.winner, DebaterRole::Pro);

    let statuses = reporter.statuses.lock().unwrap().clone();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[2], (TaskState::Working, EVALUATION_STARTED.to_string()));
    assert!(evaluator.session_store().is_empty());
}

#[tokio::test]
async fn test_con_failure_aborts_without_judging() {
    let transport = Arc::new(ScriptedTransport::failing("ep2.test", 1));
    let completion = Arc::new(CannedCompletion::new(VALID_EVAL));
    let evaluator = DebateEvaluator::new(transport.clone(), completion.clone());
    let reporter = RecordingReporter::default();

    let client = evaluator.client_for_run(RunId::new());
    let outcome = evaluator
        .run_eval_with(&client, &params("Cats vs Dogs", 3), &reporter)
        .await;

    match outcome {
        Err(DebateError::RemoteAgent(RemoteAgentError::Unreachable { endpoint, .. })) => {
            assert_eq!(endpoint, "http://ep2.test/")
        }
        other => panic!("expected an unreachable con endpoint, got {:?}", other),
    }
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.channel().reset_count(), 1);
    assert!(evaluator.session_store().is_empty());
    assert_eq!(transport.calls().len(), 2);
    assert!(reporter.artifacts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_turn_moves_run_to_failed() {
    let transport = Arc::new(ScriptedTransport::failing("ep1.test", 2));
    let client = client(transport.clone());
    let reporter = RecordingReporter::default();
    let params = params("Cats vs Dogs", 2);

    let mut orchestrator = DebateOrchestrator::new(&client, &reporter, &params);
    assert!(orchestrator.orchestrate().await.is_err());

    assert_eq!(orchestrator.phase(), DebatePhase::Failed);
    assert_eq!(orchestrator.transcript().len(), 2);
    assert_eq!(reporter.statuses.lock().unwrap().len(), 2);

    let last = orchestrator.run().transitions.last().unwrap();
    assert_eq!(last.from, DebatePhase::RoundPro(2));
    assert!(last.reason.contains("connection refused"));
}

#[tokio::test]
async fn test_judging_before_the_debate_is_rejected() {
    let transport = Arc::new(ScriptedTransport::default());
    let completion = Arc::new(CannedCompletion::new(VALID_EVAL));
    let judge = Judge::new(completion.clone());
    let client = client(transport);
    let reporter = RecordingReporter::default();
    let params = params("Cats vs Dogs", 1);

    let mut orchestrator = DebateOrchestrator::new(&client, &reporter, &params);
    let err = orchestrator.evaluate(&judge).await.unwrap_err();

    assert_eq!(
        err,
        JudgingError::NotReady {
            phase: DebatePhase::Start
        }
    );
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_judged_run_ends_done() {
    let transport = Arc::new(ScriptedTransport::default());
    let judge = Judge::new(Arc::new(CannedCompletion::new(VALID_EVAL)));
    let client = client(transport);
    let reporter = RecordingReporter::default();
    let params = params("Cats vs Dogs", 2);

    let mut orchestrator = DebateOrchestrator::new(&client, &reporter, &params);
    orchestrator.orchestrate().await.unwrap();
    let eval = orchestrator.evaluate(&judge).await.unwrap();

    assert_eq!(eval.winner, DebaterRole::Pro);
    assert_eq!(orchestrator.phase(), DebatePhase::Done);
    assert_eq!(orchestrator.run().turns_taken(), 4);
}
