use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A test scenario submitted for evaluation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    /// Display name of the scenario
    #[serde(default)]
    pub name: String,
    /// Message sent to the persona
    #[serde(default)]
    pub user_message: String,
    /// Provider identifier used to generate the response
    #[serde(default = "default_model")]
    pub model: String,
    /// Themes the response is expected to touch on
    #[serde(default)]
    pub expected_themes: Vec<String>,
}

fn default_model() -> String {
    "gemini".to_string()
}

impl Scenario {
    /// Reject scenarios with a missing or blank required field
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField { index, field: "name" });
        }
        if self.user_message.trim().is_empty() {
            return Err(ValidationError::MissingField {
                index,
                field: "user_message",
            });
        }
        Ok(())
    }
}

/// One turn of a prior conversation
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

/// Score of a response along one evaluation dimension
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct DimensionScore {
    /// Blend of theme and query similarity, in [0, 1]
    pub semantic: f64,
    /// Response-level polarity, in [-1, 1]
    pub sentiment: f64,
}

/// The four per-dimension scores of one evaluation
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct DimensionScores {
    pub consistency: DimensionScore,
    pub engagement: DimensionScore,
    pub brand_alignment: DimensionScore,
    pub authenticity: DimensionScore,
}

impl DimensionScores {
    pub fn semantic_values(&self) -> [f64; 4] {
        [
            self.consistency.semantic,
            self.engagement.semantic,
            self.brand_alignment.semantic,
            self.authenticity.semantic,
        ]
    }
}

/// Keyword heuristic scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct RuleScores {
    pub consistency: f64,
    pub engagement: f64,
    pub brand_alignment: f64,
    pub authenticity: f64,
}

/// Complete evaluation of a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scenario_name: String,
    pub user_message: String,
    /// Generated response, empty when the provider failed
    pub response_text: String,
    /// Provider failure message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub dimensions: DimensionScores,
    pub rules: RuleScores,
    /// Mean of the four semantic dimension scores
    pub cumulative_semantic: f64,
    /// Aggregate score in [50, 100]
    pub overall: f64,
    pub sentiment: f64,
    pub timestamp: DateTime<Utc>,
}

/// Statistics calculated across a batch of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    /// Mean scores for each metric
    pub mean: HashMap<String, f64>,
    /// Median scores for each metric
    pub median: HashMap<String, f64>,
    /// Mode scores for each metric (most frequent score)
    pub mode: HashMap<String, f64>,
}

/// Overall outcome of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every scenario got a response
    Success,
    /// At least one scenario's provider call failed
    Partial,
}

/// Results of one evaluation batch, in scenario order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    pub status: BatchStatus,
    pub statistics: Statistics,
    pub results: Vec<EvaluationResult>,
}
