use crate::error::ValidationError;
use crate::models::Scenario;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Persona prompt used when neither the run file nor the prompt history supplies one
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Maya, a 25-year-old lifestyle influencer who creates authentic, engaging content about sustainable living, yoga, and plant-based cooking. You have a warm, enthusiastic personality with genuine expertise in your niche areas.

PERSONALITY TRAITS:
- Warm, approachable, and genuinely excited about helping others
- Uses emojis naturally but not excessively (1-2 per message)
- Speaks in a conversational, friendly tone like talking to a close friend
- Passionate about environmental impact and conscious living
- Humble about your journey - you're still learning too

EXPERTISE AREAS:
- Sustainable living practices and eco-friendly alternatives
- Yoga (3 years of practice, focus on beginner-friendly approaches)
- Plant-based cooking (specializing in simple, accessible recipes)
- Mindful consumption and minimalism
- Mental health awareness through lifestyle choices

CONVERSATION STYLE:
- Ask follow-up questions to keep engagement high
- Share personal anecdotes and experiences when relevant
- Provide practical, actionable advice
- Admit when something is outside your expertise
- Stay positive while acknowledging real challenges

BOUNDARIES:
- Redirect political discussions back to personal lifestyle choices
- Don't give medical advice, suggest consulting professionals
- Keep focus on your core topics unless user specifically asks about other areas
- Maintain authenticity - you're an influencer, not a certified expert in everything

BRAND VOICE:
- "Let's figure this out together!"
- "I've been experimenting with..."
- "What I've learned on my journey is..."
- Focus on progress over perfection"#;

/// Weights of the dimension blend and the aggregate formula
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct ScoringConfig {
    /// Weight of theme similarity in a dimension score
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Weight of query similarity in a dimension score
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Minimum overall score
    #[serde(default = "default_floor")]
    pub floor: f64,
    /// Points contributed by the cumulative semantic score
    #[serde(default = "default_semantic_scale")]
    pub semantic_scale: f64,
    /// Points contributed by sentiment
    #[serde(default = "default_sentiment_scale")]
    pub sentiment_scale: f64,
}

fn default_alpha() -> f64 {
    0.85
}

fn default_beta() -> f64 {
    0.15
}

fn default_floor() -> f64 {
    50.0
}

fn default_semantic_scale() -> f64 {
    35.0
}

fn default_sentiment_scale() -> f64 {
    15.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            beta: default_beta(),
            floor: default_floor(),
            semantic_scale: default_semantic_scale(),
            sentiment_scale: default_sentiment_scale(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.alpha < 0.0 || self.beta < 0.0 || ((self.alpha + self.beta) - 1.0).abs() > 1e-9 {
            return Err(ValidationError::InvalidConfig(format!(
                "alpha ({}) and beta ({}) must be non-negative and sum to 1.0",
                self.alpha, self.beta
            )));
        }
        if self.semantic_scale < 0.0 || self.sentiment_scale < 0.0 {
            return Err(ValidationError::InvalidConfig(
                "aggregate scales must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rolling-window quality tracking settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrackerConfig {
    /// Number of most recent scores kept per prompt
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Average below which a prompt counts as degraded
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Optional JSON file persisting windows and prompt versions between runs
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

fn default_window_size() -> usize {
    1
}

fn default_threshold() -> f64 {
    80.0
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold: default_threshold(),
            state_path: None,
        }
    }
}

/// Local embedding model settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub show_download_progress: bool,
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

/// Connection settings for one LLM provider
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderConfig {
    /// API base URL
    pub api_endpoint: String,
    /// Environment variable name containing the API key
    pub env_var_api_key: String,
    /// Model to use for generating responses
    pub model: String,
    /// Temperature for response generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens for response generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Rate limit for API requests per second
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rps: f64,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_rate_limit() -> f64 {
    10.0
}

impl ProviderConfig {
    pub fn openai() -> Self {
        Self {
            api_endpoint: "https://api.openai.com/v1".to_string(),
            env_var_api_key: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            rate_limit_rps: default_rate_limit(),
        }
    }

    pub fn gemini() -> Self {
        Self {
            api_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            env_var_api_key: "GEMINI_API_KEY".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            rate_limit_rps: default_rate_limit(),
        }
    }
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    HashMap::from([
        ("openai".to_string(), ProviderConfig::openai()),
        ("gemini".to_string(), ProviderConfig::gemini()),
    ])
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// Root configuration of a run file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Persona prompt prepended to every message
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Provider settings keyed by identifier (`openai`, `gemini`)
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,
    /// Scenarios evaluated by the `evaluate` command
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    /// Context lines shared by every scenario of the batch
    #[serde(default)]
    pub conversation_context: Vec<String>,
    /// Optional local path to store the evaluated batch as JSON
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Check tunables. Scenarios are validated separately, per batch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.scoring.validate()?;
        if self.tracker.window_size == 0 {
            return Err(ValidationError::InvalidConfig(
                "tracker.window_size must be at least 1".to_string(),
            ));
        }
        for (id, provider) in &self.providers {
            if provider.max_tokens > u32::from(u16::MAX) {
                return Err(ValidationError::InvalidConfig(format!(
                    "providers.{}.max_tokens ({}) must not exceed {}",
                    id,
                    provider.max_tokens,
                    u16::MAX
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_config_parsing() {
        let toml_content = r#"
system_prompt = "You are Maya."
conversation_context = ["User: hi", "Maya: hello!"]
storage_path = "/tmp/results.json"

[scoring]
alpha = 0.7
beta = 0.3

[tracker]
window_size = 5
threshold = 75.0
state_path = "/tmp/maya-state.json"

[providers.openai]
api_endpoint = "https://api.openai.com/v1"
env_var_api_key = "OPENAI_API_KEY"
model = "gpt-4.1-nano"
temperature = 0.5
rate_limit_rps = 2.0

[[scenarios]]
name = "Morning Routine"
user_message = "Can you tell me about your morning routine?"
model = "openai"
expected_themes = ["yoga", "mindfulness"]

[[scenarios]]
name = "Vegan Recipe"
user_message = "Share a simple vegan dinner recipe"
"#;

        let temp_file = write_config(toml_content);
        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.system_prompt, "You are Maya.");
        assert_eq!(config.scoring.alpha, 0.7);
        assert_eq!(config.scoring.floor, 50.0);
        assert_eq!(config.tracker.window_size, 5);
        assert_eq!(config.tracker.threshold, 75.0);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers["openai"].model, "gpt-4.1-nano");
        assert_eq!(config.providers["openai"].max_tokens, 1000);
        assert_eq!(config.scenarios.len(), 2);
        assert_eq!(config.scenarios[0].expected_themes.len(), 2);
        assert_eq!(config.scenarios[1].model, "gemini");
        assert_eq!(config.conversation_context.len(), 2);
    }

    #[test]
    fn test_config_defaults() {
        let temp_file = write_config("");
        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.scoring.alpha, 0.85);
        assert_eq!(config.scoring.beta, 0.15);
        assert_eq!(config.tracker.window_size, 1);
        assert_eq!(config.tracker.threshold, 80.0);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.providers["gemini"].model, "gemini-2.5-flash");
        assert_eq!(config.providers["openai"].model, "gpt-4o-mini");
        assert!(config.scenarios.is_empty());
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_config_rejects_unbalanced_weights() {
        let temp_file = write_config("[scoring]\nalpha = 0.9\nbeta = 0.3\n");
        let err = Config::from_file(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("sum to 1.0"));
    }

    #[test]
    fn test_config_rejects_zero_window() {
        let temp_file = write_config("[tracker]\nwindow_size = 0\n");
        assert!(Config::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_config_rejects_oversized_max_tokens() {
        let temp_file = write_config(
            r#"
[providers.openai]
api_endpoint = "https://api.openai.com/v1"
env_var_api_key = "OPENAI_API_KEY"
model = "gpt-4o-mini"
max_tokens = 70000
"#,
        );
        let err = Config::from_file(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("providers.openai.max_tokens (70000)"));
    }

    #[test]
    fn test_config_accepts_max_tokens_limit() {
        let temp_file = write_config(
            r#"
[providers.gemini]
api_endpoint = "https://generativelanguage.googleapis.com/v1beta"
env_var_api_key = "GEMINI_API_KEY"
model = "gemini-2.5-flash"
max_tokens = 65535
"#,
        );
        assert!(Config::from_file(temp_file.path()).is_ok());
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/maya.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
