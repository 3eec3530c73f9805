//! The outcome of a judged debate and how it is published.

use crate::debatejudge::event::Part;
use crate::debatejudge::judge::DebateEval;
use crate::debatejudge::request::DebaterRole;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the artifact carrying the verdict.
pub const RESULT_ARTIFACT_NAME: &str = "Result";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub winner: DebaterRole,
    pub detail: DebateEval,
}

impl EvalResult {
    pub fn from_eval(eval: DebateEval) -> Self {
        Self {
            winner: eval.winner,
            detail: eval,
        }
    }

    pub fn reason(&self) -> &str {
        &self.detail.reason
    }

    /// The result as a JSON object.
    pub fn to_data(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    /// Artifact parts: the prose reason, then the structured result.
    pub fn artifact_parts(&self) -> Result<Vec<Part>, serde_json::Error> {
        Ok(vec![Part::text(self.reason()), Part::data(self.to_data()?)])
    }
}

impl From<DebateEval> for EvalResult {
    fn from(eval: DebateEval) -> Self {
        Self::from_eval(eval)
    }
}
