//! Progress reporting for debate runs.
//!
//! The core pushes two kinds of updates while a run is in flight:
//!
//! - **Status** updates, each with a [`TaskState`] and free text. Every
//!   completed turn produces one (`"pro_debater: ..."`), as do the hand-off to
//!   the judge and the final outcome.
//! - **Artifacts**: named lists of [`Part`]s. The verdict is published as a
//!   single artifact holding both the prose reason and the structured result.
//!
//! Implement [`ProgressReporter`] to route these wherever the host needs them.
//! Reporting never fails from the core's point of view and the core never
//! waits for acknowledgment.
//!
//! [`ChannelReporter`] turns the calls into run-tagged [`ProgressEvent`]s on an
//! unbounded channel; give each run its own reporter and the streams of
//! concurrent runs stay separate. [`LogReporter`] writes everything to the
//! `log` facade.
//!
//! # Example
//!
//! ```rust,no_run
//! use debatejudge::event::{Part, ProgressReporter, TaskState};
//! use async_trait::async_trait;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl ProgressReporter for Printer {
//!     async fn report_status(&self, state: TaskState, text: &str) {
//!         println!("[{}] {}", state, text);
//!     }
//!     async fn report_artifact(&self, parts: Vec<Part>, name: &str) {
//!         println!("artifact {} with {} part(s)", name, parts.len());
//!     }
//! }
//! ```

use crate::debatejudge::conversation::RunId;
use crate::debatejudge::request::DebaterRole;
use crate::debatejudge::transcript::Turn;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Lifecycle state attached to a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Working,
    Completed,
    Failed,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Working => "working",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Working)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of artifact content: free text or a structured JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Map<String, Value> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn data(data: Map<String, Value>) -> Self {
        Part::Data { data }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::Data { .. } => None,
        }
    }

    pub fn as_data(&self) -> Option<&Map<String, Value>> {
        match self {
            Part::Data { data } => Some(data),
            Part::Text { .. } => None,
        }
    }
}

/// A named bundle of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub parts: Vec<Part>,
}

/// Identifies the turn a status update reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMarker {
    pub index: usize,
    pub role: DebaterRole,
    pub round: u32,
}

impl From<&Turn> for TurnMarker {
    fn from(turn: &Turn) -> Self {
        TurnMarker {
            index: turn.index,
            role: turn.role,
            round: turn.round,
        }
    }
}

/// A progress update tagged with its run and a per-run sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Status {
        run_id: RunId,
        sequence: u64,
        timestamp: DateTime<Utc>,
        state: TaskState,
        text: String,
        /// Present when the status reports a debate turn.
        turn: Option<TurnMarker>,
    },
    Artifact {
        run_id: RunId,
        sequence: u64,
        timestamp: DateTime<Utc>,
        artifact: Artifact,
    },
}

impl ProgressEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            ProgressEvent::Status { run_id, .. } | ProgressEvent::Artifact { run_id, .. } => {
                *run_id
            }
        }
    }

    pub fn sequence(&self) -> u64 {
        match self {
            ProgressEvent::Status { sequence, .. } | ProgressEvent::Artifact { sequence, .. } => {
                *sequence
            }
        }
    }

    pub fn turn(&self) -> Option<&TurnMarker> {
        match self {
            ProgressEvent::Status { turn, .. } => turn.as_ref(),
            ProgressEvent::Artifact { .. } => None,
        }
    }

    pub fn state(&self) -> Option<TaskState> {
        match self {
            ProgressEvent::Status { state, .. } => Some(*state),
            ProgressEvent::Artifact { .. } => None,
        }
    }
}

/// Receives progress from a debate run.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report_status(&self, state: TaskState, text: &str);

    async fn report_artifact(&self, parts: Vec<Part>, name: &str);

    /// Called once per completed turn, in turn order. Defaults to a `working`
    /// status carrying [`Turn::status_line`].
    async fn report_turn(&self, turn: &Turn) {
        self.report_status(TaskState::Working, &turn.status_line())
            .await;
    }
}

/// Reporter that forwards run-tagged [`ProgressEvent`]s over a channel.
pub struct ChannelReporter {
    run_id: RunId,
    sender: UnboundedSender<ProgressEvent>,
    sequence: AtomicU64,
}

impl ChannelReporter {
    pub fn new(run_id: RunId) -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                run_id,
                sender,
                sequence: AtomicU64::new(0),
            },
            receiver,
        )
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn publish(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            debug!("run {}: progress receiver dropped", self.run_id);
        }
    }

    fn status(&self, state: TaskState, text: &str, turn: Option<TurnMarker>) {
        self.publish(ProgressEvent::Status {
            run_id: self.run_id,
            sequence: self.next_sequence(),
            timestamp: Utc::now(),
            state,
            text: text.to_string(),
            turn,
        });
    }
}

#[async_trait]
impl ProgressReporter for ChannelReporter {
    async fn report_status(&self, state: TaskState, text: &str) {
        self.status(state, text, None);
    }

    async fn report_artifact(&self, parts: Vec<Part>, name: &str) {
        self.publish(ProgressEvent::Artifact {
            run_id: self.run_id,
            sequence: self.next_sequence(),
            timestamp: Utc::now(),
            artifact: Artifact {
                name: name.to_string(),
                parts,
            },
        });
    }

    async fn report_turn(&self, turn: &Turn) {
        self.status(
            TaskState::Working,
            &turn.status_line(),
            Some(TurnMarker::from(turn)),
        );
    }
}

/// Reporter that writes progress to the log.
#[derive(Debug, Clone)]
pub struct LogReporter {
    run_id: RunId,
}

impl LogReporter {
    pub fn new(run_id: RunId) -> Self {
        Self { run_id }
    }
}

#[async_trait]
impl ProgressReporter for LogReporter {
    async fn report_status(&self, state: TaskState, text: &str) {
        match state {
            TaskState::Failed => error!("run {} [{}] {}", self.run_id, state, text),
            _ => info!("run {} [{}] {}", self.run_id, state, text),
        }
    }

    async fn report_artifact(&self, parts: Vec<Part>, name: &str) {
        info!(
            "run {} artifact {:?} ({} part(s))",
            self.run_id,
            name,
            parts.len()
        );
        for part in &parts {
            match part {
                Part::Text { text } => debug!("run {}   text: {}", self.run_id, text),
                Part::Data { data } => debug!(
                    "run {}   data: {}",
                    self.run_id,
                    Value::Object(data.clone())
                ),
            }
        }
    }
}
