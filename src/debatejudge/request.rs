//! Evaluation requests and their validation.
//!
//! A request names the two debaters by role and carries a free-form `config`
//! mapping. Validation runs once, before any network activity, and turns the
//! loosely typed request into [`DebateParams`].
//!
//! ```rust
//! use debatejudge::request::{validate, EvalRequest};
//!
//! let request = EvalRequest::from_json(
//!     r#"{"participants": {"pro_debater": "https://a.example", "con_debater": "https://b.example"},
//!         "config": {"topic": "Should AI be regulated?", "num_rounds": 3}}"#,
//! ).unwrap();
//! let params = validate(&request).unwrap();
//! assert_eq!(params.num_rounds, 3);
//! assert_eq!(params.total_turns(), 6);
//! ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

/// Config keys every request must carry.
pub const REQUIRED_CONFIG_KEYS: [&str; 2] = ["topic", "num_rounds"];

/// One of the two fixed debate roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DebaterRole {
    /// Argues in favour of the topic statement.
    #[serde(rename = "pro_debater")]
    Pro,
    /// Argues against the topic statement.
    #[serde(rename = "con_debater")]
    Con,
}

impl DebaterRole {
    /// Both roles, in speaking order.
    pub const ALL: [DebaterRole; 2] = [DebaterRole::Pro, DebaterRole::Con];

    /// Wire name used in requests, verdicts and status messages.
    pub fn as_str(self) -> &'static str {
        match self {
            DebaterRole::Pro => "pro_debater",
            DebaterRole::Con => "con_debater",
        }
    }

    /// Short label used in the judge transcript ("Pro Argument 1: ...").
    pub fn label(self) -> &'static str {
        match self {
            DebaterRole::Pro => "Pro",
            DebaterRole::Con => "Con",
        }
    }

    pub fn opponent(self) -> DebaterRole {
        match self {
            DebaterRole::Pro => DebaterRole::Con,
            DebaterRole::Con => DebaterRole::Pro,
        }
    }
}

impl fmt::Display for DebaterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw evaluation request as produced by the hosting transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalRequest {
    /// Role name to endpoint URL.
    pub participants: BTreeMap<String, String>,
    /// Free-form settings; `topic` and `num_rounds` are required.
    pub config: Map<String, Value>,
}

impl EvalRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the request text received from a caller.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with_participant(mut self, role: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.participants.insert(role.into(), endpoint.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Validated, strongly typed debate settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DebateParams {
    pub pro_endpoint: Url,
    pub con_endpoint: Url,
    pub topic: String,
    /// Always at least 1.
    pub num_rounds: u32,
}

impl DebateParams {
    pub fn endpoint(&self, role: DebaterRole) -> &Url {
        match role {
            DebaterRole::Pro => &self.pro_endpoint,
            DebaterRole::Con => &self.con_endpoint,
        }
    }

    /// Two turns per round.
    pub fn total_turns(&self) -> usize {
        2 * self.num_rounds as usize
    }
}

/// A request that cannot start a debate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Missing roles: {}", .0.join(", "))]
    MissingRoles(Vec<String>),
    #[error("Missing config keys: {}", .0.join(", "))]
    MissingConfigKeys(Vec<String>),
    #[error("Can't parse num_rounds: {0}")]
    InvalidNumRounds(String),
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
    #[error("Invalid endpoint for {role}: {endpoint} ({reason})")]
    InvalidEndpoint {
        role: String,
        endpoint: String,
        reason: String,
    },
}

/// Check a request and extract the debate parameters.
///
/// Checks run in a fixed order: required roles, required config keys,
/// `num_rounds`, `topic`, then the endpoint URLs. Extra roles and config keys
/// are ignored.
pub fn validate(request: &EvalRequest) -> Result<DebateParams, ValidationError> {
    let missing_roles: Vec<String> = DebaterRole::ALL
        .iter()
        .filter(|role| !request.participants.contains_key(role.as_str()))
        .map(|role| role.as_str().to_string())
        .collect();
    if !missing_roles.is_empty() {
        return Err(ValidationError::MissingRoles(missing_roles));
    }

    let mut missing_keys: Vec<String> = REQUIRED_CONFIG_KEYS
        .iter()
        .filter(|key| !request.config.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing_keys.is_empty() {
        missing_keys.sort();
        return Err(ValidationError::MissingConfigKeys(missing_keys));
    }

    let num_rounds = parse_num_rounds(&request.config["num_rounds"])?;

    let topic = match &request.config["topic"] {
        Value::String(topic) => topic.clone(),
        other => {
            return Err(ValidationError::InvalidTopic(format!(
                "expected a string, got {}",
                json_type_name(other)
            )))
        }
    };

    Ok(DebateParams {
        pro_endpoint: parse_endpoint(request, DebaterRole::Pro)?,
        con_endpoint: parse_endpoint(request, DebaterRole::Con)?,
        topic,
        num_rounds,
    })
}

/// Coerce `num_rounds` to a positive integer.
///
/// Accepts JSON integers, whole-valued floats and strings holding an integer.
pub fn parse_num_rounds(value: &Value) -> Result<u32, ValidationError> {
    let rounds: i64 = match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int
            } else {
                match number.as_f64() {
                    Some(float) if float.is_finite() && float.fract() == 0.0 => {
                        if float > u32::MAX as f64 {
                            return Err(ValidationError::InvalidNumRounds(format!(
                                "{} is too large",
                                number
                            )));
                        } else {
                            float as i64
                        }
                    }
                    _ => {
                        return Err(ValidationError::InvalidNumRounds(format!(
                            "{} is not a whole number",
                            number
                        )))
                    }
                }
            }
        }
        Value::String(text) => text.trim().parse::<i64>().map_err(|e| {
            ValidationError::InvalidNumRounds(format!("invalid integer {:?}: {}", text, e))
        })?,
        other => {
            return Err(ValidationError::InvalidNumRounds(format!(
                "expected an integer, got {}",
                json_type_name(other)
            )))
        }
    };

    if rounds < 1 {
        return Err(ValidationError::InvalidNumRounds(format!(
            "must be at least 1, got {}",
            rounds
        )));
    }
    u32::try_from(rounds)
        .map_err(|_| ValidationError::InvalidNumRounds(format!("{} is too large", rounds)))
}

fn parse_endpoint(request: &EvalRequest, role: DebaterRole) -> Result<Url, ValidationError> {
    let raw = &request.participants[role.as_str()];
    let invalid = |reason: String| ValidationError::InvalidEndpoint {
        role: role.as_str().to_string(),
        endpoint: raw.clone(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {:?}", other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn num_rounds_accepts_integer_forms() {
        assert_eq!(parse_num_rounds(&json!(3)).unwrap(), 3);
        assert_eq!(parse_num_rounds(&json!(2.0)).unwrap(), 2);
        assert_eq!(parse_num_rounds(&json!(" 4 ")).unwrap(), 4);
    }

    #[test]
    fn num_rounds_rejects_non_integers() {
        for value in &[json!("three"), json!(2.5), json!(null), json!([1]), json!(true)] {
            match parse_num_rounds(value) {
                Err(ValidationError::InvalidNumRounds(_)) => {}
                other => panic!("expected InvalidNumRounds for {}, got {:?}", value, other),
            }
        }
    }

    #[test]
    fn num_rounds_must_be_positive() {
        assert!(parse_num_rounds(&json!(0)).is_err());
        assert!(parse_num_rounds(&json!(-2)).is_err());
        assert!(parse_num_rounds(&json!("0")).is_err());
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(DebaterRole::Pro.to_string(), "pro_debater");
        assert_eq!(DebaterRole::Con.label(), "Con");
        assert_eq!(DebaterRole::Pro.opponent(), DebaterRole::Con);
        assert_eq!(
            serde_json::to_value(DebaterRole::Con).unwrap(),
            json!("con_debater")
        );
    }
}
