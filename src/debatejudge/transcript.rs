//! The ordered record of a debate.

use crate::debatejudge::request::DebaterRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One debater's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 0-based position in the transcript.
    pub index: usize,
    pub role: DebaterRole,
    /// 1-based round the turn belongs to.
    pub round: u32,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

impl Turn {
    /// Progress text for this turn, e.g. `"pro_debater: <reply>"`.
    pub fn status_line(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}

/// All turns of a run, in the order they were spoken.
///
/// Only the orchestrator appends, so the sequence is chronological and never
/// rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, role: DebaterRole, round: u32, text: String) -> &Turn {
        let index = self.turns.len();
        self.turns.push(Turn {
            index,
            role,
            round,
            text,
            recorded_at: Utc::now(),
        });
        &self.turns[index]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The texts spoken by `role`, in order.
    pub fn arguments(&self, role: DebaterRole) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(move |turn| turn.role == role)
            .map(|turn| turn.text.as_str())
    }

    /// Completed rounds, i.e. rounds in which both sides have spoken.
    pub fn rounds(&self) -> usize {
        self.arguments(DebaterRole::Pro)
            .count()
            .min(self.arguments(DebaterRole::Con).count())
    }

    /// Render the debate as the judge reads it.
    ///
    /// Pro and con arguments are paired by round, so only complete rounds
    /// appear:
    ///
    /// ```text
    /// Pro Argument 1: ...
    /// Con Argument 1: ...
    /// Pro Argument 2: ...
    /// ```
    pub fn format_for_judge(&self) -> String {
        let mut text = String::new();
        for (i, (pro, con)) in self
            .arguments(DebaterRole::Pro)
            .zip(self.arguments(DebaterRole::Con))
            .enumerate()
        {
            let round = i + 1;
            text.push_str(&format!(
                "{} Argument {}: {}\n{} Argument {}: {}\n",
                DebaterRole::Pro.label(),
                round,
                pro,
                DebaterRole::Con.label(),
                round,
                con
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rounds: u32) -> Transcript {
        let mut transcript = Transcript::new();
        for round in 1..=rounds {
            transcript.record(DebaterRole::Pro, round, format!("pro {}", round));
            transcript.record(DebaterRole::Con, round, format!("con {}", round));
        }
        transcript
    }

    #[test]
    fn judge_text_interleaves_rounds() {
        assert_eq!(
            sample(2).format_for_judge(),
            "Pro Argument 1: pro 1\nCon Argument 1: con 1\n\
             Pro Argument 2: pro 2\nCon Argument 2: con 2\n"
        );
    }

    #[test]
    fn unanswered_turn_is_not_judged() {
        let mut transcript = sample(1);
        transcript.record(DebaterRole::Pro, 2, "dangling".to_string());
        assert_eq!(transcript.rounds(), 1);
        assert!(!transcript.format_for_judge().contains("dangling"));
    }

    #[test]
    fn indices_follow_insertion_order() {
        let transcript = sample(3);
        let indices: Vec<usize> = transcript.turns().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(transcript.last().unwrap().status_line(), "con_debater: con 3");
    }
}
