use crate::error::ValidationError;
use crate::store::{PromptStore, PromptVersion};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Append-only prompt version history
#[derive(Clone)]
pub struct PromptHistory {
    store: Arc<dyn PromptStore>,
}

impl PromptHistory {
    pub fn new(store: Arc<dyn PromptStore>) -> Self {
        Self { store }
    }

    pub fn record_version(
        &self,
        prompt_id: &str,
        prompt_text: &str,
        reason: &str,
        improved_from: Option<String>,
    ) -> Result<PromptVersion, ValidationError> {
        if prompt_id.trim().is_empty() {
            return Err(ValidationError::EmptyPromptId);
        }
        if prompt_text.trim().is_empty() {
            return Err(ValidationError::InvalidConfig(
                "prompt text must not be empty".to_string(),
            ));
        }

        let version = PromptVersion {
            prompt_text: prompt_text.to_string(),
            reason: reason.to_string(),
            improved_from,
            timestamp: Utc::now(),
        };
        self.store.append_version(prompt_id, version.clone());
        info!("Recorded new version of prompt {} ({})", prompt_id, reason);

        Ok(version)
    }

    pub fn history(&self, prompt_id: &str) -> Vec<PromptVersion> {
        self.store.versions(prompt_id)
    }

    /// Text of the newest version, if any
    pub fn current(&self, prompt_id: &str) -> Option<String> {
        self.store
            .versions(prompt_id)
            .pop()
            .map(|version| version.prompt_text)
    }
}
