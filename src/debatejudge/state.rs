//! Debate state machine: phases, transitions, and run tracking.
//!
//! ```text
//! Start -> OpenPro -> OpenCon -> RoundPro(2) -> RoundCon(2) -> ... -> RoundCon(N)
//!       -> Evaluating -> Done
//! ```
//!
//! `Failed` is reachable from every non-terminal phase. A one-round debate
//! goes straight from `OpenCon` to `Evaluating`.

use crate::debatejudge::conversation::RunId;
use crate::debatejudge::request::DebaterRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Phase of a debate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebatePhase {
    /// Validated, no turn taken yet.
    Start,
    /// Pro's opening argument.
    OpenPro,
    /// Con's opening argument, answering pro's.
    OpenCon,
    /// Pro's turn in round `k` (k ≥ 2).
    RoundPro(u32),
    /// Con's turn in round `k` (k ≥ 2).
    RoundCon(u32),
    /// All turns taken; the judge is scoring.
    Evaluating,
    /// Verdict produced.
    Done,
    /// Aborted by an agent or judging failure.
    Failed,
}

impl DebatePhase {
    /// Whether this is a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Debater who speaks in this phase, if any.
    pub fn speaker(self) -> Option<DebaterRole> {
        match self {
            Self::OpenPro | Self::RoundPro(_) => Some(DebaterRole::Pro),
            Self::OpenCon | Self::RoundCon(_) => Some(DebaterRole::Con),
            _ => None,
        }
    }

    /// 1-based round of a speaking phase.
    pub fn round(self) -> Option<u32> {
        match self {
            Self::OpenPro | Self::OpenCon => Some(1),
            Self::RoundPro(k) | Self::RoundCon(k) => Some(k),
            _ => None,
        }
    }

    /// Opening phases start a fresh remote conversation.
    pub fn is_opening(self) -> bool {
        matches!(self, Self::OpenPro | Self::OpenCon)
    }

    /// The phase that follows this one in a debate of `num_rounds` rounds.
    pub fn successor(self, num_rounds: u32) -> Option<DebatePhase> {
        match self {
            Self::Start => Some(Self::OpenPro),
            Self::OpenPro => Some(Self::OpenCon),
            Self::OpenCon if num_rounds >= 2 => Some(Self::RoundPro(2)),
            Self::OpenCon => Some(Self::Evaluating),
            Self::RoundPro(k) => Some(Self::RoundCon(k)),
            Self::RoundCon(k) if k < num_rounds => Some(Self::RoundPro(k + 1)),
            Self::RoundCon(_) => Some(Self::Evaluating),
            Self::Evaluating => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether `to` may follow this phase in a debate of `num_rounds` rounds.
    pub fn can_transition_to(self, to: DebatePhase, num_rounds: u32) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.successor(num_rounds) == Some(to)
    }
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::OpenPro => write!(f, "open_pro"),
            Self::OpenCon => write!(f, "open_con"),
            Self::RoundPro(k) => write!(f, "round_pro({})", k),
            Self::RoundCon(k) => write!(f, "round_con({})", k),
            Self::Evaluating => write!(f, "evaluating"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition {from} -> {to}: {reason}")]
pub struct TransitionError {
    pub from: DebatePhase,
    pub to: DebatePhase,
    pub reason: String,
}

/// Phase tracking for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRun {
    pub run_id: RunId,
    pub phase: DebatePhase,
    /// Always at least 1.
    pub num_rounds: u32,
    pub transitions: Vec<PhaseTransition>,
    pub started_at: DateTime<Utc>,
}

impl DebateRun {
    pub fn new(run_id: RunId, num_rounds: u32) -> Self {
        Self {
            run_id,
            phase: DebatePhase::Start,
            num_rounds: num_rounds.max(1),
            transitions: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn next_phase(&self) -> Option<DebatePhase> {
        self.phase.successor(self.num_rounds)
    }

    /// Transition to a new phase with a reason.
    pub fn transition(&mut self, to: DebatePhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.can_transition_to(to, self.num_rounds) {
            return Err(TransitionError {
                from: self.phase,
                to,
                reason: match self.next_phase() {
                    Some(next) => format!("expected {} or failed", next),
                    None => "run already finished".to_string(),
                },
            });
        }

        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Move to the next phase in sequence.
    pub fn advance(&mut self, reason: &str) -> Result<DebatePhase, TransitionError> {
        let next = self.next_phase().ok_or_else(|| TransitionError {
            from: self.phase,
            to: self.phase,
            reason: "run already finished".to_string(),
        })?;
        self.transition(next, reason)?;
        Ok(next)
    }

    /// Enter the next speaking phase, returning it with its speaker and round.
    /// `None` once every turn has been taken.
    pub fn begin_next_turn(&mut self) -> Option<(DebatePhase, DebaterRole, u32)> {
        let next = self.next_phase()?;
        let (role, round) = next.speaker().zip(next.round())?;
        self.transition(next, &format!("{} speaks in round {}", role, round))
            .ok()?;
        Some((next, role, round))
    }

    /// Mark the run failed. Returns `false` if it had already finished.
    pub fn fail(&mut self, reason: &str) -> bool {
        self.transition(DebatePhase::Failed, reason).is_ok()
    }

    /// Number of debater turns taken so far.
    pub fn turns_taken(&self) -> usize {
        self.transitions
            .iter()
            .filter(|t| t.from.speaker().is_some() && t.to != DebatePhase::Failed)
            .count()
    }

    /// One-line summary, e.g. `"run 1f..: round_con(2) (round 2/3, 3 turn(s) taken)"`.
    pub fn status_line(&self) -> String {
        match self.phase.round() {
            Some(round) => format!(
                "run {}: {} (round {}/{}, {} turn(s) taken)",
                self.run_id,
                self.phase,
                round,
                self.num_rounds,
                self.turns_taken()
            ),
            None => format!(
                "run {}: {} ({} turn(s) taken)",
                self.run_id,
                self.phase,
                self.turns_taken()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaking_phases(num_rounds: u32) -> Vec<DebatePhase> {
        let mut run = DebateRun::new(RunId::new(), num_rounds);
        let mut phases = Vec::new();
        while let Ok(phase) = run.advance("next") {
            if phase.speaker().is_some() {
                phases.push(phase);
            }
        }
        assert_eq!(run.phase, DebatePhase::Done);
        phases
    }

    #[test]
    fn single_round_goes_straight_to_evaluation() {
        assert_eq!(
            speaking_phases(1),
            vec![DebatePhase::OpenPro, DebatePhase::OpenCon]
        );
        assert_eq!(
            DebatePhase::OpenCon.successor(1),
            Some(DebatePhase::Evaluating)
        );
    }

    #[test]
    fn speakers_alternate_starting_with_pro() {
        let phases = speaking_phases(3);
        assert_eq!(phases.len(), 6);
        for (i, phase) in phases.iter().enumerate() {
            let expected = if i % 2 == 0 {
                DebaterRole::Pro
            } else {
                DebaterRole::Con
            };
            assert_eq!(phase.speaker(), Some(expected));
            assert_eq!(phase.round(), Some(i as u32 / 2 + 1));
        }
    }

    #[test]
    fn skipping_a_turn_is_rejected() {
        let mut run = DebateRun::new(RunId::new(), 2);
        run.advance("open").unwrap();
        let err = run.transition(DebatePhase::RoundPro(2), "skip").unwrap_err();
        assert_eq!(err.from, DebatePhase::OpenPro);
        assert_eq!(err.to, DebatePhase::RoundPro(2));
        assert_eq!(run.phase, DebatePhase::OpenPro);
    }

    #[test]
    fn failure_is_terminal_and_recorded() {
        let mut run = DebateRun::new(RunId::new(), 2);
        run.advance("open").unwrap();
        assert!(run.fail("agent down"));
        assert!(!run.fail("again"));
        assert!(run.advance("more").is_err());

        let last = run.transitions.last().unwrap();
        assert_eq!(last.to, DebatePhase::Failed);
        assert_eq!(last.reason, "agent down");
        assert_eq!(run.transitions.len(), 2);
    }

    #[test]
    fn status_line_reports_round_progress() {
        let mut run = DebateRun::new(RunId::new(), 3);
        for _ in 0..3 {
            run.advance("turn").unwrap();
        }
        assert_eq!(run.phase, DebatePhase::RoundPro(2));
        assert!(run
            .status_line()
            .ends_with("round_pro(2) (round 2/3, 2 turn(s) taken)"));
    }
}
