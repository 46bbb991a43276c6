//! Curated reference phrases for each evaluation dimension.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phrases describing the persona herself
pub const PERSONA_PHRASES: &[&str] = &[
    "Maya",
    "influencer",
    "authentic",
    "engaging",
    "warm",
    "enthusiastic",
    "personal journey",
    "helping others",
];

/// Phrases describing the brand's domain
pub const BRAND_PHRASES: &[&str] = &[
    "sustainable living",
    "eco-friendly",
    "plant-based",
    "yoga",
    "mindful consumption",
    "minimalism",
    "environment",
    "conscious living",
];

const CONSISTENCY_PHRASES: &[&str] = &[
    "character consistency",
    "personal anecdotes",
    "conversational tone",
];

const ENGAGEMENT_PHRASES: &[&str] = &[
    "engagement",
    "follow-up questions",
    "personal experience",
    "ask questions",
    "keep conversation going",
];

const BRAND_ALIGNMENT_PHRASES: &[&str] = &[
    "brand alignment",
    "values",
    "brand voice",
    "on-brand",
    "mission",
    "goals",
];

const AUTHENTICITY_PHRASES: &[&str] = &[
    "authenticity",
    "honest",
    "humble",
    "relatable",
    "natural language",
    "genuine",
];

/// An axis along which a response is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Consistency,
    Engagement,
    BrandAlignment,
    Authenticity,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Consistency,
        Dimension::Engagement,
        Dimension::BrandAlignment,
        Dimension::Authenticity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Consistency => "consistency",
            Dimension::Engagement => "engagement",
            Dimension::BrandAlignment => "brand_alignment",
            Dimension::Authenticity => "authenticity",
        }
    }

    /// Curated phrase set for this dimension, without the user message
    pub fn phrases(&self) -> Vec<&'static str> {
        match self {
            Dimension::Consistency => [PERSONA_PHRASES, BRAND_PHRASES, CONSISTENCY_PHRASES].concat(),
            Dimension::Engagement => [ENGAGEMENT_PHRASES, PERSONA_PHRASES].concat(),
            Dimension::BrandAlignment => [BRAND_PHRASES, BRAND_ALIGNMENT_PHRASES].concat(),
            Dimension::Authenticity => [AUTHENTICITY_PHRASES, PERSONA_PHRASES].concat(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the reference text for a dimension: its phrases joined by spaces,
/// with the scenario's user message appended last.
pub fn reference_text(dimension: Dimension, user_message: &str) -> String {
    let mut parts = dimension.phrases();
    parts.push(user_message);
    parts.join(" ")
}
