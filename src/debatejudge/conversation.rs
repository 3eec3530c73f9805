//! Per-run conversation state for the two debaters.
//!
//! Remote agents retain their own context between turns; all the core keeps is
//! the opaque context id each agent handed back and whether a session was
//! started. That bookkeeping lives in a [`SessionStore`] keyed by
//! `(RunId, DebaterRole)`, so a single store can back any number of concurrent
//! runs without one run ever seeing another run's sessions.
//!
//! A [`ConversationChannel`] is the run-scoped view over the store. Its
//! [`reset`](ConversationChannel::reset) drops every session of that run and
//! nothing else.

use crate::debatejudge::request::DebaterRole;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Identifier of a single debate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        RunId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        RunId(id)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the core remembers about one debater's remote session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Context id returned by the remote agent, if it supplied one.
    pub context_id: Option<String>,
    pub started: bool,
    /// Replies received in this session.
    pub turns: usize,
}

/// Session bookkeeping shared by every run of a process.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<(RunId, DebaterRole), ConversationState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<(RunId, DebaterRole), ConversationState>> {
        // The map holds plain data; a panic elsewhere cannot leave it half-written.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, run_id: RunId, role: DebaterRole) -> Option<ConversationState> {
        self.sessions().get(&(run_id, role)).cloned()
    }

    /// Replace the role's session with a fresh one.
    pub fn start(&self, run_id: RunId, role: DebaterRole, context_id: Option<String>) {
        self.sessions().insert(
            (run_id, role),
            ConversationState {
                context_id,
                started: true,
                turns: 1,
            },
        );
    }

    /// Record another reply in an existing session.
    ///
    /// A reply without a context id keeps the one already on file.
    pub fn advance(&self, run_id: RunId, role: DebaterRole, context_id: Option<String>) {
        let mut sessions = self.sessions();
        let state = sessions.entry((run_id, role)).or_default();
        state.started = true;
        state.turns += 1;
        if context_id.is_some() {
            state.context_id = context_id;
        }
    }

    /// Remove every session belonging to `run_id`, returning how many were dropped.
    pub fn clear_run(&self, run_id: RunId) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|(run, _), _| *run != run_id);
        before - sessions.len()
    }

    pub fn sessions_for(&self, run_id: RunId) -> usize {
        self.sessions()
            .keys()
            .filter(|(run, _)| *run == run_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}

/// Run-scoped handle on the two debaters' sessions.
///
/// Cloning is cheap and clones share the same reset counter, which lets a
/// caller verify that cleanup ran.
#[derive(Debug, Clone)]
pub struct ConversationChannel {
    run_id: RunId,
    store: Arc<SessionStore>,
    resets: Arc<AtomicUsize>,
}

impl ConversationChannel {
    pub fn new(run_id: RunId, store: Arc<SessionStore>) -> Self {
        Self {
            run_id,
            store,
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A channel over a private store, for single-run use.
    pub fn standalone() -> Self {
        Self::new(RunId::new(), Arc::new(SessionStore::new()))
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self, role: DebaterRole) -> Option<ConversationState> {
        self.store.get(self.run_id, role)
    }

    pub fn begin(&self, role: DebaterRole, context_id: Option<String>) {
        self.store.start(self.run_id, role, context_id);
    }

    pub fn advance(&self, role: DebaterRole, context_id: Option<String>) {
        self.store.advance(self.run_id, role, context_id);
    }

    /// Release all session state of this run. Idempotent.
    pub fn reset(&self) {
        let dropped = self.store.clear_run(self.run_id);
        self.resets.fetch_add(1, Ordering::SeqCst);
        debug!(
            "run {}: conversation reset ({} session(s) released)",
            self.run_id, dropped
        );
    }

    /// Number of times [`reset`](Self::reset) has been called on this channel or its clones.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.store.sessions_for(self.run_id) == 0
    }

    /// Guard that resets the channel exactly once when the run scope ends.
    pub fn cleanup_guard(&self) -> CleanupGuard {
        CleanupGuard {
            channel: self.clone(),
            finished: false,
        }
    }
}

/// Resets its channel on [`finish`](CleanupGuard::finish), or on drop if the
/// run was abandoned before reaching it.
#[must_use = "dropping the guard immediately resets the conversation"]
pub struct CleanupGuard {
    channel: ConversationChannel,
    finished: bool,
}

impl CleanupGuard {
    pub fn finish(mut self) {
        self.finished = true;
        self.channel.reset();
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                "run {}: abandoned before completion, releasing sessions",
                self.channel.run_id()
            );
            self.channel.reset();
        }
    }
}
