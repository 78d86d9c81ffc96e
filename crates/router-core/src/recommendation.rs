use crate::error::{Result, RouterError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validate the shape of a command identifier (`/name`).
pub fn validate_command(command: &str) -> Result<()> {
    if !command.starts_with('/') {
        return Err(RouterError::InvalidRecommendation(format!(
            "command must start with '/', got '{command}'"
        )));
    }
    Ok(())
}

fn validate_confidence(confidence: f64) -> Result<()> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(RouterError::InvalidRecommendation(format!(
            "confidence must be between 0 and 1, got {confidence}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RoutingRecommendation
// ---------------------------------------------------------------------------

/// A recommended command with its confidence and supporting detail.
///
/// Fields are read-only from outside the crate; construction always goes
/// through [`RoutingRecommendation::new`] (or validated deserialization), so
/// every value in circulation satisfies the command, confidence, and
/// reasoning invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecommendation")]
pub struct RoutingRecommendation {
    command: String,
    confidence: f64,
    reasoning: String,
    context_factors: Vec<String>,
    alternative_commands: Vec<String>,
    parameters: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RawRecommendation {
    command: String,
    confidence: f64,
    reasoning: String,
    #[serde(default)]
    context_factors: Vec<String>,
    #[serde(default)]
    alternative_commands: Vec<String>,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

impl TryFrom<RawRecommendation> for RoutingRecommendation {
    type Error = RouterError;

    fn try_from(raw: RawRecommendation) -> Result<Self> {
        Ok(RoutingRecommendation::new(raw.command, raw.confidence, raw.reasoning)?
            .with_context_factors(raw.context_factors)
            .with_alternatives(raw.alternative_commands)
            .with_parameters(raw.parameters))
    }
}

impl RoutingRecommendation {
    pub fn new(
        command: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Result<Self> {
        let command = command.into();
        let reasoning = reasoning.into();
        validate_command(&command)?;
        validate_confidence(confidence)?;
        if reasoning.trim().is_empty() {
            return Err(RouterError::InvalidRecommendation(
                "reasoning cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            command,
            confidence,
            reasoning,
            context_factors: Vec::new(),
            alternative_commands: Vec::new(),
            parameters: BTreeMap::new(),
        })
    }

    /// `/auto` at 0.5, returned when no rule produced a recommendation.
    pub(crate) fn fallback(alternatives: Vec<String>) -> Self {
        Self {
            command: "/auto".to_string(),
            confidence: 0.5,
            reasoning: "No specific pattern detected - using auto command for intelligent routing"
                .to_string(),
            context_factors: vec!["fallback".to_string()],
            alternative_commands: Vec::new(),
            parameters: BTreeMap::new(),
        }
        .with_alternatives(alternatives)
    }

    pub fn with_context_factors(mut self, factors: Vec<String>) -> Self {
        self.context_factors = factors;
        self
    }

    /// Alternatives equal to the primary command, or repeated, are dropped.
    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        let mut kept: Vec<String> = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            if alt != self.command && !kept.contains(&alt) {
                kept.push(alt);
            }
        }
        self.alternative_commands = kept;
        self
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Same recommendation with a new confidence, clamped to `[0, 1]`.
    /// Used once by the learning layer before a result is handed out.
    pub(crate) fn adjusted_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            self.confidence
        };
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn context_factors(&self) -> &[String] {
        &self.context_factors
    }

    pub fn alternative_commands(&self) -> &[String] {
        &self.alternative_commands
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    pub fn parameter_u64(&self, key: &str) -> Option<u64> {
        self.parameters.get(key).and_then(Value::as_u64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
