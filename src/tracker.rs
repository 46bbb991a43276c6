//! Rolling-window quality tracking per prompt identifier.
//!
//! Each prompt keeps its last `window_size` overall scores. Once the window
//! is full the prompt reports an average and whether it fell below the
//! threshold; before that it reports `insufficient_data`.

use crate::config::TrackerConfig;
use crate::error::ValidationError;
use crate::store::PromptStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    InsufficientData,
    Ok,
}

/// Answer to a quality query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityReport {
    pub prompt_id: String,
    pub status: QualityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
    pub threshold: f64,
    pub scores: Vec<f64>,
}

/// Acknowledgement of a recorded score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreAck {
    pub prompt_id: String,
    pub scores: Vec<f64>,
}

pub struct PromptQualityTracker {
    store: Arc<dyn PromptStore>,
    window_size: usize,
    threshold: f64,
    // serializes read-modify-write of score windows
    write_lock: Mutex<()>,
}

impl PromptQualityTracker {
    pub fn new(store: Arc<dyn PromptStore>, config: &TrackerConfig) -> Self {
        Self {
            store,
            window_size: config.window_size.max(1),
            threshold: config.threshold,
            write_lock: Mutex::new(()),
        }
    }

    /// Append `score` to the prompt's window, evicting the oldest entries
    /// beyond `window_size`.
    pub fn record_score(&self, prompt_id: &str, score: f64) -> Result<ScoreAck, ValidationError> {
        if prompt_id.trim().is_empty() {
            return Err(ValidationError::EmptyPromptId);
        }
        if !score.is_finite() {
            return Err(ValidationError::InvalidScore(score));
        }

        let _guard = self.write_lock.lock();
        let mut scores = self.store.get_scores(prompt_id);
        scores.push(score);
        if scores.len() > self.window_size {
            let excess = scores.len() - self.window_size;
            scores.drain(..excess);
        }
        self.store.put_scores(prompt_id, scores.clone());

        debug!("Recorded score {:.2} for prompt {} (window {:?})", score, prompt_id, scores);

        Ok(ScoreAck {
            prompt_id: prompt_id.to_string(),
            scores,
        })
    }

    /// Current quality of a prompt. Unknown prompts report `insufficient_data`.
    pub fn quality(&self, prompt_id: &str) -> QualityReport {
        let mut scores = {
            let _guard = self.write_lock.lock();
            self.store.get_scores(prompt_id)
        };
        // a stored window may predate a smaller window_size
        if scores.len() > self.window_size {
            let excess = scores.len() - self.window_size;
            scores.drain(..excess);
        }

        if scores.len() < self.window_size {
            return QualityReport {
                prompt_id: prompt_id.to_string(),
                status: QualityStatus::InsufficientData,
                average: None,
                degraded: None,
                threshold: self.threshold,
                scores,
            };
        }

        let average = scores.iter().sum::<f64>() / scores.len() as f64;
        let degraded = average < self.threshold;
        if degraded {
            warn!(
                "Prompt {} degraded: average {:.2} below threshold {:.2}",
                prompt_id, average, self.threshold
            );
        }

        QualityReport {
            prompt_id: prompt_id.to_string(),
            status: QualityStatus::Ok,
            average: Some(average),
            degraded: Some(degraded),
            threshold: self.threshold,
            scores,
        }
    }
}
