//! Per-dimension blending and aggregation into the overall score.

use crate::config::ScoringConfig;
use crate::models::{DimensionScore, DimensionScores};
use crate::sentiment;
use crate::similarity::SimilarityScorer;
use crate::themes::{self, Dimension};

/// Similarities feeding one dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityInputs {
    pub theme: f64,
    pub query: f64,
}

/// `alpha * theme + beta * query`
pub fn blend(inputs: SimilarityInputs, config: &ScoringConfig) -> f64 {
    config.alpha * inputs.theme + config.beta * inputs.query
}

/// Mean of the four semantic dimension scores
pub fn cumulative_semantic(dimensions: &DimensionScores) -> f64 {
    let values = dimensions.semantic_values();
    values.iter().sum::<f64>() / values.len() as f64
}

/// `floor + cumulative * semantic_scale + ((sentiment + 1) / 2) * sentiment_scale`
pub fn overall(cumulative_semantic: f64, sentiment: f64, config: &ScoringConfig) -> f64 {
    let semantic = cumulative_semantic.clamp(0.0, 1.0);
    let sentiment = sentiment.clamp(-1.0, 1.0);
    config.floor + semantic * config.semantic_scale + ((sentiment + 1.0) / 2.0) * config.sentiment_scale
}

/// Scores of one response before aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredResponse {
    pub dimensions: DimensionScores,
    pub cumulative_semantic: f64,
    pub sentiment: f64,
    pub overall: f64,
}

/// Scores a response along every dimension
#[derive(Clone)]
pub struct DimensionScorer {
    similarity: SimilarityScorer,
    config: ScoringConfig,
}

impl DimensionScorer {
    pub fn new(similarity: SimilarityScorer, config: ScoringConfig) -> Self {
        Self { similarity, config }
    }

    /// Score `response_text` against the themes and the user message.
    ///
    /// Query similarity and sentiment are response-level and shared by all
    /// four dimensions. An empty response scores exactly the floor.
    pub async fn score(&self, user_message: &str, response_text: &str) -> ScoredResponse {
        if response_text.trim().is_empty() {
            return self.degenerate();
        }

        let query = self.similarity.similarity(user_message, response_text).await;
        let sentiment = sentiment::polarity(response_text);

        let mut semantic = [0.0; 4];
        for (slot, dimension) in semantic.iter_mut().zip(Dimension::ALL) {
            let reference = themes::reference_text(dimension, user_message);
            let theme = self.similarity.similarity(response_text, &reference).await;
            *slot = blend(SimilarityInputs { theme, query }, &self.config);
        }

        let dimension = |semantic| DimensionScore { semantic, sentiment };
        let dimensions = DimensionScores {
            consistency: dimension(semantic[0]),
            engagement: dimension(semantic[1]),
            brand_alignment: dimension(semantic[2]),
            authenticity: dimension(semantic[3]),
        };

        let cumulative_semantic = cumulative_semantic(&dimensions);
        ScoredResponse {
            dimensions,
            cumulative_semantic,
            sentiment,
            overall: overall(cumulative_semantic, sentiment, &self.config),
        }
    }

    fn degenerate(&self) -> ScoredResponse {
        let zero = DimensionScore {
            semantic: 0.0,
            sentiment: 0.0,
        };
        ScoredResponse {
            dimensions: DimensionScores {
                consistency: zero,
                engagement: zero,
                brand_alignment: zero,
                authenticity: zero,
            },
            cumulative_semantic: 0.0,
            sentiment: 0.0,
            overall: self.config.floor,
        }
    }
}
