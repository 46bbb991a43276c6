use crate::heuristics;
use crate::models::{EvaluationResult, Scenario, Statistics};
use crate::scoring::DimensionScorer;
use chrono::Utc;
use std::collections::HashMap;

/// Metrics summarized across a batch
pub const STATISTIC_METRICS: [&str; 5] = [
    "consistency",
    "engagement",
    "brand_alignment",
    "authenticity",
    "overall",
];

/// Evaluator turning a generated response into an [`EvaluationResult`]
#[derive(Clone)]
pub struct Evaluator {
    scorer: DimensionScorer,
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new(scorer: DimensionScorer) -> Self {
        Self { scorer }
    }

    /// Score a response to `scenario`. `error` records why a response is
    /// missing; the empty text is scored like any other degenerate response.
    pub async fn evaluate_response(
        &self,
        scenario: &Scenario,
        response_text: &str,
        error: Option<String>,
    ) -> EvaluationResult {
        let scored = self.scorer.score(&scenario.user_message, response_text).await;
        let rules = heuristics::score_all(response_text, &scenario.expected_themes);

        EvaluationResult {
            scenario_name: scenario.name.clone(),
            user_message: scenario.user_message.clone(),
            response_text: response_text.to_string(),
            error,
            dimensions: scored.dimensions,
            rules,
            cumulative_semantic: scored.cumulative_semantic,
            overall: scored.overall,
            sentiment: scored.sentiment,
            timestamp: Utc::now(),
        }
    }

    /// Calculate statistics across multiple evaluation results
    pub fn calculate_statistics(&self, results: &[EvaluationResult]) -> Statistics {
        let mut mean = HashMap::new();
        let mut median = HashMap::new();
        let mut mode = HashMap::new();

        for metric in STATISTIC_METRICS {
            let scores = collect_metric_scores(results, metric);

            if scores.is_empty() {
                insert_zero_stats(metric, &mut mean, &mut median, &mut mode);
                continue;
            }

            mean.insert(metric.to_string(), calculate_mean(&scores));
            median.insert(metric.to_string(), calculate_median(&scores));
            mode.insert(metric.to_string(), calculate_mode(&scores));
        }

        Statistics { mean, median, mode }
    }
}

fn metric_value(result: &EvaluationResult, metric: &str) -> Option<f64> {
    match metric {
        "consistency" => Some(result.dimensions.consistency.semantic),
        "engagement" => Some(result.dimensions.engagement.semantic),
        "brand_alignment" => Some(result.dimensions.brand_alignment.semantic),
        "authenticity" => Some(result.dimensions.authenticity.semantic),
        "overall" => Some(result.overall),
        _ => None,
    }
}

/// Collect scores for a specific metric
fn collect_metric_scores(results: &[EvaluationResult], metric: &str) -> Vec<f64> {
    results.iter().filter_map(|r| metric_value(r, metric)).collect()
}

/// Insert zero values for all statistics
fn insert_zero_stats(
    metric: &str,
    mean: &mut HashMap<String, f64>,
    median: &mut HashMap<String, f64>,
    mode: &mut HashMap<String, f64>,
) {
    mean.insert(metric.to_string(), 0.0);
    median.insert(metric.to_string(), 0.0);
    mode.insert(metric.to_string(), 0.0);
}

fn calculate_mean(scores: &[f64]) -> f64 {
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn calculate_median(scores: &[f64]) -> f64 {
    let mut sorted_scores = scores.to_vec();
    sorted_scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted_scores.len() / 2;
    if sorted_scores.len() % 2 == 0 {
        (sorted_scores[mid - 1] + sorted_scores[mid]) / 2.0
    } else {
        sorted_scores[mid]
    }
}

/// Most frequent value after rounding to one decimal place. Ties go to the
/// smallest value so the result does not depend on hash order.
fn calculate_mode(scores: &[f64]) -> f64 {
    let mut frequency: HashMap<i64, usize> = HashMap::new();

    for &score in scores {
        *frequency.entry((score * 10.0).round() as i64).or_insert(0) += 1;
    }

    frequency
        .into_iter()
        .max_by(|(a_value, a_count), (b_value, b_count)| {
            a_count.cmp(b_count).then(b_value.cmp(a_value))
        })
        .map(|(value, _)| value as f64 / 10.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::embedding::testing::HashingEmbedder;
    use crate::models::{DimensionScore, DimensionScores, RuleScores};
    use crate::similarity::SimilarityScorer;
    use std::sync::Arc;

    fn evaluator() -> Evaluator {
        Evaluator::new(DimensionScorer::new(
            SimilarityScorer::new(Arc::new(HashingEmbedder::default())),
            ScoringConfig::default(),
        ))
    }

    fn scenario() -> Scenario {
        Scenario {
            name: "Morning Routine".to_string(),
            user_message: "Can you tell me about your morning routine?".to_string(),
            model: "gemini".to_string(),
            expected_themes: vec!["yoga".to_string()],
        }
    }

    fn result_with(semantic: f64, overall: f64) -> EvaluationResult {
        let d = DimensionScore {
            semantic,
            sentiment: 0.0,
        };
        EvaluationResult {
            scenario_name: "s".to_string(),
            user_message: "m".to_string(),
            response_text: "r".to_string(),
            error: None,
            dimensions: DimensionScores {
                consistency: d,
                engagement: d,
                brand_alignment: d,
                authenticity: d,
            },
            rules: RuleScores {
                consistency: 70.0,
                engagement: 60.0,
                brand_alignment: 70.0,
                authenticity: 75.0,
            },
            cumulative_semantic: semantic,
            overall,
            sentiment: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_evaluate_response_populates_result() {
        let response = "I've been doing yoga every morning for three years! It's so calming. What does your morning look like?";
        let result = evaluator().evaluate_response(&scenario(), response, None).await;

        assert_eq!(result.scenario_name, "Morning Routine");
        assert_eq!(result.response_text, response);
        assert!(result.error.is_none());
        assert!((0.0..=1.0).contains(&result.cumulative_semantic));
        assert!((50.0..=100.0).contains(&result.overall));
        assert!(result.rules.consistency > 70.0);
    }

    #[tokio::test]
    async fn test_evaluate_empty_response_is_floor() {
        let result = evaluator()
            .evaluate_response(&scenario(), "", Some("provider down".to_string()))
            .await;

        assert_eq!(result.overall, 50.0);
        assert_eq!(result.sentiment, 0.0);
        assert_eq!(result.dimensions.engagement.semantic, 0.0);
        assert_eq!(result.error.as_deref(), Some("provider down"));
    }

    #[test]
    fn test_calculate_statistics_normal_case() {
        let results = vec![
            result_with(0.8, 90.0),
            result_with(0.6, 70.0),
            result_with(0.8, 80.0),
        ];

        let stats = evaluator().calculate_statistics(&results);

        assert!((stats.mean["consistency"] - 0.7333333333333333).abs() < 1e-4);
        assert_eq!(stats.median["consistency"], 0.8);
        assert_eq!(stats.mode["consistency"], 0.8);
        assert!((stats.mean["overall"] - 80.0).abs() < 1e-9);
        assert_eq!(stats.median["overall"], 80.0);
    }

    #[test]
    fn test_calculate_statistics_empty_results() {
        let stats = evaluator().calculate_statistics(&[]);
        for metric in STATISTIC_METRICS {
            assert_eq!(stats.mean[metric], 0.0);
            assert_eq!(stats.median[metric], 0.0);
            assert_eq!(stats.mode[metric], 0.0);
        }
    }

    #[test]
    fn test_calculate_statistics_even_number_results() {
        let results: Vec<_> = [0.6, 0.7, 0.8, 0.9]
            .iter()
            .map(|s| result_with(*s, 75.0))
            .collect();

        let stats = evaluator().calculate_statistics(&results);

        assert!((stats.mean["authenticity"] - 0.75).abs() < 1e-6);
        assert!((stats.median["authenticity"] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_mode_rounds_and_breaks_ties_low() {
        assert_eq!(calculate_mode(&[0.75, 0.8, 0.8, 0.8, 0.9]), 0.8);
        assert_eq!(calculate_mode(&[0.3, 0.1]), 0.1);
        assert_eq!(calculate_mode(&[]), 0.0);
    }
}
