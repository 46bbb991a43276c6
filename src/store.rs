//! State owned on behalf of prompts: rolling score windows and version history.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One entry of a prompt's append-only history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptVersion {
    pub prompt_text: String,
    pub reason: String,
    /// Prompt this version was derived from, if any
    pub improved_from: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Storage for per-prompt state
pub trait PromptStore: Send + Sync {
    /// Score window of a prompt, empty when unknown
    fn get_scores(&self, prompt_id: &str) -> Vec<f64>;

    /// Replace the score window of a prompt
    fn put_scores(&self, prompt_id: &str, scores: Vec<f64>);

    fn append_version(&self, prompt_id: &str, version: PromptVersion);

    /// Version history of a prompt, oldest first
    fn versions(&self, prompt_id: &str) -> Vec<PromptVersion>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    scores: HashMap<String, Vec<f64>>,
    #[serde(default)]
    versions: HashMap<String, Vec<PromptVersion>>,
}

/// In-process store, optionally snapshotted to a JSON file
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot, or start empty when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No state file at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: StoreState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Write a snapshot of the whole store
    pub fn save(&self, path: &Path) -> Result<()> {
        let json_content = serde_json::to_string_pretty(&*self.state.read())
            .context("Failed to serialize prompt state")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, json_content)
            .with_context(|| format!("Failed to write state to: {}", path.display()))
    }
}

impl PromptStore for MemoryStore {
    fn get_scores(&self, prompt_id: &str) -> Vec<f64> {
        self.state
            .read()
            .scores
            .get(prompt_id)
            .cloned()
            .unwrap_or_default()
    }

    fn put_scores(&self, prompt_id: &str, scores: Vec<f64>) {
        self.state.write().scores.insert(prompt_id.to_string(), scores);
    }

    fn append_version(&self, prompt_id: &str, version: PromptVersion) {
        self.state
            .write()
            .versions
            .entry(prompt_id.to_string())
            .or_default()
            .push(version);
    }

    fn versions(&self, prompt_id: &str) -> Vec<PromptVersion> {
        self.state
            .read()
            .versions
            .get(prompt_id)
            .cloned()
            .unwrap_or_default()
    }
}
