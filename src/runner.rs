use crate::error::ValidationError;
use crate::evaluation::Evaluator;
use crate::models::{BatchResults, BatchStatus, EvaluationResult, Scenario};
use crate::providers::{ProviderRegistry, build_prompt_with_context};
use crate::tracker::PromptQualityTracker;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prompt wiring shared by every scenario of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchOptions<'a> {
    pub system_prompt: &'a str,
    /// Rendered conversation lines placed before each scenario's message
    pub conversation_context: &'a [String],
    /// Record each overall score under this prompt id
    pub prompt_id: Option<&'a str>,
}

/// Main runner that orchestrates batch evaluation
pub struct Runner {
    providers: ProviderRegistry,
    evaluator: Evaluator,
    tracker: Arc<PromptQualityTracker>,
}

impl Runner {
    pub fn new(
        providers: ProviderRegistry,
        evaluator: Evaluator,
        tracker: Arc<PromptQualityTracker>,
    ) -> Self {
        Self {
            providers,
            evaluator,
            tracker,
        }
    }

    /// Evaluate every scenario in order.
    ///
    /// Input is validated up front; a rejected batch makes no provider calls
    /// and records nothing. A provider failure only affects its own scenario,
    /// which is scored with an empty response.
    pub async fn run_batch(
        &self,
        scenarios: &[Scenario],
        options: &BatchOptions<'_>,
    ) -> Result<BatchResults, ValidationError> {
        for (index, scenario) in scenarios.iter().enumerate() {
            scenario.validate(index)?;
        }
        if let Some(prompt_id) = options.prompt_id {
            if prompt_id.trim().is_empty() {
                return Err(ValidationError::EmptyPromptId);
            }
        }

        let total = scenarios.len();
        let mut results = Vec::with_capacity(total);

        for (index, scenario) in scenarios.iter().enumerate() {
            info!("Evaluating scenario {}/{}: {}", index + 1, total, scenario.name);
            let result = self.evaluate_scenario(scenario, options).await;

            if let Some(prompt_id) = options.prompt_id {
                if let Err(e) = self.tracker.record_score(prompt_id, result.overall) {
                    warn!("Could not record score for {}: {}", prompt_id, e);
                }
            }

            results.push(result);
        }

        let status = if results.iter().any(|r| r.error.is_some()) {
            BatchStatus::Partial
        } else {
            BatchStatus::Success
        };
        let statistics = self.evaluator.calculate_statistics(&results);

        Ok(BatchResults {
            status,
            statistics,
            results,
        })
    }

    async fn evaluate_scenario(
        &self,
        scenario: &Scenario,
        options: &BatchOptions<'_>,
    ) -> EvaluationResult {
        let prompt = build_prompt_with_context(
            options.system_prompt,
            options.conversation_context,
            &scenario.user_message,
        );

        debug!("  → Generating response with {}", scenario.model);
        let (response_text, error) = match self.providers.dispatch(&scenario.model, &prompt).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("Scenario {} got no response: {}", scenario.name, e);
                (String::new(), Some(e.to_string()))
            }
        };

        debug!("  → Scoring response ({} chars)", response_text.len());
        let result = self
            .evaluator
            .evaluate_response(scenario, &response_text, error)
            .await;
        debug!("  → Overall score {:.2}", result.overall);
        result
    }
}

/// Store batch results to a JSON file
pub fn store_results(results: &BatchResults, path: &str) -> Result<()> {
    let json_content =
        serde_json::to_string_pretty(results).context("Failed to serialize results to JSON")?;

    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, json_content)
        .with_context(|| format!("Failed to write results to: {}", path))?;
    info!("Results stored to: {}", path);

    Ok(())
}
