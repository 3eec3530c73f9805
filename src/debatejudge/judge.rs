//! Scoring a finished debate.
//!
//! The [`Judge`] sends the transcript to a [`CompletionService`] together with
//! a fixed rubric and a JSON Schema describing [`DebateEval`]. The reply is
//! parsed strictly: an unknown or missing field, a score of the wrong type or
//! outside `[0, 1]`, or a winner other than `pro_debater`/`con_debater` is a
//! [`JudgingError`]. Nothing is repaired or retried.
//!
//! `total_score` is taken as the model reports it. It is not required to
//! equal the sum of the four sub-scores; [`DebaterScore::drift`] measures the
//! difference for anyone who cares.
//!
//! ```rust
//! use debatejudge::judge::DebateEval;
//! use debatejudge::request::DebaterRole;
//!
//! let raw = r#"{
//!   "pro_debater": {"emotional_appeal": 0.8, "argument_clarity": 0.9,
//!                   "argument_arrangement": 0.7, "relevance_to_topic": 1.0, "total_score": 3.4},
//!   "con_debater": {"emotional_appeal": 0.5, "argument_clarity": 0.6,
//!                   "argument_arrangement": 0.6, "relevance_to_topic": 0.9, "total_score": 2.6},
//!   "winner": "pro_debater",
//!   "reason": "Pro was clearer."
//! }"#;
//! let eval = DebateEval::parse(raw).unwrap();
//! assert_eq!(eval.winner, DebaterRole::Pro);
//! assert!(eval.pro_score.drift() < 1e-9);
//! ```

use crate::debatejudge::completion::{CompletionError, CompletionService, OutputSchema};
use crate::debatejudge::request::DebaterRole;
use crate::debatejudge::state::DebatePhase;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Name under which the verdict schema is sent to the completion service.
pub const DEBATE_EVAL_SCHEMA_NAME: &str = "DebateEval";

pub const JUDGE_SYSTEM_PROMPT: &str = r#"You are an experienced debate judge tasked with evaluating debates. For each debate, you will assess both sides based on four key criteria: Emotional Appeal, Clarity of Argument and Reasoning, Logical Arrangement of Arguments, and Relevance to Debate Topic.

For each of the four subdimensions, provide a score from 0 to 1 (with 0 being the lowest and 1 being the highest) for both the **Pro (Affirmative)** side and the **Con (Negative)** side. Additionally, provide a brief analysis for both sides for each subdimension.

Scoring Criteria:
    1. **Emotional Appeal**
        - How effectively does each side connect with the audience emotionally? Does the argument evoke empathy, passion, or values?
        - **0**: No emotional appeal. The argument feels cold or disconnected.
        - **1**: Highly engaging emotionally, strongly connects with the audience.

    2. **Clarity of Argument and Reasoning**
        - Are the arguments clearly presented? Is the reasoning sound and easy to follow?
        - **0**: The arguments are unclear or confusing.
        - **1**: The arguments are well-structured and easy to understand.

    3. **Logical Arrangement of Arguments**
        - Is the argument presented in a logical, coherent manner? Does each point flow into the next without confusion?
        - **0**: The arguments are disorganized and difficult to follow.
        - **1**: The arguments follow a clear and logical progression.

    4. **Relevance to Debate Topic**
        - Does each argument directly address the debate topic? Are there any irrelevant points or off-topic distractions?
        - **0**: Arguments that stray far from the topic.
        - **1**: Every argument is focused and relevant to the topic.

Please output the result in the following format:

1. **Pro (Affirmative Side) Score**:
    - Emotional Appeal: [score]
    - Argument Clarity: [score]
    - Argument Arrangement: [score]
    - Relevance to Debate Topic: [score]
    - **Total Score**: [total score]

2. **Con (Negative Side) Score**:
    - Emotional Appeal: [score]
    - Argument Clarity: [score]
    - Argument Arrangement: [score]
    - Relevance to Debate Topic: [score]
    - **Total Score**: [total score]

3. **Winner**: [Pro/Con]
4. **Reason**: [Provide detailed analysis based on the scores]
"#;

/// User prompt carrying the topic and the formatted transcript.
pub fn judge_user_prompt(topic: &str, debate_text: &str) -> String {
    format!(
        "Evaluate the debate on the topic: '{}'\n\
         Debate analysis process and arguments are as follows:\n\
         {}\n\
         Provide a JSON formatted response with scores and comments for each criterion for both debaters.",
        topic, debate_text
    )
}

fn debater_score_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "emotional_appeal": {"type": "number"},
            "argument_clarity": {"type": "number"},
            "argument_arrangement": {"type": "number"},
            "relevance_to_topic": {"type": "number"},
            "total_score": {"type": "number"}
        },
        "required": [
            "emotional_appeal",
            "argument_clarity",
            "argument_arrangement",
            "relevance_to_topic",
            "total_score"
        ],
        "additionalProperties": false
    })
}

/// JSON Schema for [`DebateEval`].
///
/// Score bounds are not expressed in the schema since strict structured
/// output modes reject `minimum`/`maximum`; [`DebateEval::parse`] enforces
/// them instead.
pub fn debate_eval_schema() -> OutputSchema {
    OutputSchema::new(
        DEBATE_EVAL_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "pro_debater": debater_score_schema(),
                "con_debater": debater_score_schema(),
                "winner": {
                    "type": "string",
                    "enum": [DebaterRole::Pro.as_str(), DebaterRole::Con.as_str()]
                },
                "reason": {"type": "string"}
            },
            "required": ["pro_debater", "con_debater", "winner", "reason"],
            "additionalProperties": false
        }),
    )
}

/// One side's scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebaterScore {
    pub emotional_appeal: f64,
    pub argument_clarity: f64,
    pub argument_arrangement: f64,
    pub relevance_to_topic: f64,
    /// As reported by the judge; not reconciled with the sub-scores.
    pub total_score: f64,
}

impl DebaterScore {
    /// The four rubric scores, in rubric order.
    pub fn sub_scores(&self) -> [(&'static str, f64); 4] {
        [
            ("emotional_appeal", self.emotional_appeal),
            ("argument_clarity", self.argument_clarity),
            ("argument_arrangement", self.argument_arrangement),
            ("relevance_to_topic", self.relevance_to_topic),
        ]
    }

    pub fn component_sum(&self) -> f64 {
        self.sub_scores().iter().map(|(_, score)| score).sum()
    }

    /// `|total_score - component_sum()|`.
    pub fn drift(&self) -> f64 {
        (self.total_score - self.component_sum()).abs()
    }

    fn check(&self, side: DebaterRole) -> Result<(), String> {
        for (name, score) in self.sub_scores().iter() {
            if !score.is_finite() || *score < 0.0 || *score > 1.0 {
                return Err(format!(
                    "{}.{} = {} is outside [0, 1]",
                    side, name, score
                ));
            }
        }
        if !self.total_score.is_finite() {
            return Err(format!("{}.total_score is not finite", side));
        }
        Ok(())
    }
}

/// The judge's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebateEval {
    #[serde(rename = "pro_debater")]
    pub pro_score: DebaterScore,
    #[serde(rename = "con_debater")]
    pub con_score: DebaterScore,
    pub winner: DebaterRole,
    pub reason: String,
}

impl DebateEval {
    /// Parse and validate raw completion output.
    pub fn parse(raw: &str) -> Result<Self, JudgingError> {
        let invalid = |reason: String| JudgingError::InvalidOutput {
            reason,
            raw: raw.to_string(),
        };
        let eval: DebateEval = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
        eval.pro_score.check(DebaterRole::Pro).map_err(invalid)?;
        eval.con_score.check(DebaterRole::Con).map_err(invalid)?;
        Ok(eval)
    }

    pub fn score_for(&self, role: DebaterRole) -> &DebaterScore {
        match role {
            DebaterRole::Pro => &self.pro_score,
            DebaterRole::Con => &self.con_score,
        }
    }
}

/// Failure to produce a verdict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JudgingError {
    #[error("completion service failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("judge output is not a valid verdict: {reason}")]
    InvalidOutput { reason: String, raw: String },
    #[error("debate cannot be judged in phase {phase}")]
    NotReady { phase: DebatePhase },
}

/// Scores transcripts through a completion service.
#[derive(Clone)]
pub struct Judge {
    service: Arc<dyn CompletionService>,
}

impl Judge {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    pub fn model_name(&self) -> &str {
        self.service.model_name()
    }

    pub fn service(&self) -> &Arc<dyn CompletionService> {
        &self.service
    }

    /// Score a debate on `topic` from its judge-formatted transcript.
    pub async fn evaluate(&self, topic: &str, debate_text: &str) -> Result<DebateEval, JudgingError> {
        let user_prompt = judge_user_prompt(topic, debate_text);
        debug!("judge prompt ({}):\n{}", self.model_name(), user_prompt);

        let raw = self
            .service
            .generate(JUDGE_SYSTEM_PROMPT, &user_prompt, &debate_eval_schema())
            .await
            .map_err(|e| {
                error!("judge {} failed: {}", self.model_name(), e);
                e
            })?;
        debug!("judge raw output: {}", raw);

        let eval = DebateEval::parse(&raw).map_err(|e| {
            error!("{}", e);
            e
        })?;
        debug!(
            "score drift: pro {:.3}, con {:.3}",
            eval.pro_score.drift(),
            eval.con_score.drift()
        );
        if let Some(usage) = self.service.get_last_usage() {
            debug!(
                "judge tokens: input {}, output {}, total {}",
                usage.input_tokens, usage.output_tokens, usage.total_tokens
            );
        }
        info!("verdict: {} wins", eval.winner);
        Ok(eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_both_roles_as_winners() {
        let schema = debate_eval_schema();
        assert_eq!(schema.name, "DebateEval");
        assert_eq!(
            schema.schema["properties"]["winner"]["enum"],
            json!(["pro_debater", "con_debater"])
        );
        assert_eq!(
            schema.schema["properties"]["pro_debater"]["required"]
                .as_array()
                .unwrap()
                .len(),
            5
        );
    }

    #[test]
    fn user_prompt_embeds_topic_and_transcript() {
        let prompt = judge_user_prompt("Cats vs Dogs", "Pro Argument 1: a\nCon Argument 1: b\n");
        assert!(prompt.starts_with("Evaluate the debate on the topic: 'Cats vs Dogs'\n"));
        assert!(prompt.contains("Pro Argument 1: a\nCon Argument 1: b\n"));
        assert!(prompt.ends_with("for both debaters."));
    }

    #[test]
    fn drift_measures_distance_from_component_sum() {
        let score = DebaterScore {
            emotional_appeal: 0.5,
            argument_clarity: 0.5,
            argument_arrangement: 0.5,
            relevance_to_topic: 0.5,
            total_score: 2.5,
        };
        assert!((score.component_sum() - 2.0).abs() < 1e-9);
        assert!((score.drift() - 0.5).abs() < 1e-9);
    }
}
