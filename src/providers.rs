//! Model-dispatch collaborators.
//!
//! Every LLM backend implements [`ChatProvider`]; a [`ProviderRegistry`] maps
//! provider identifiers (`openai`, `gemini`) to implementations.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::ConversationTurn;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

/// Number of prior turns carried into a chat prompt
pub const HISTORY_TURNS: usize = 5;

/// A backend able to complete a prompt
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Complete `prompt`, returning trimmed, non-empty text
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Assemble the persona prompt: system prompt, optional prior conversation,
/// then the user's message and the persona's turn marker.
pub fn build_prompt(system_prompt: &str, history: &[ConversationTurn], message: &str) -> String {
    let start = history.len().saturating_sub(HISTORY_TURNS);
    let context: Vec<String> = history[start..]
        .iter()
        .map(|turn| {
            let role = if turn.role == "user" { "User" } else { "Maya" };
            format!("{}: {}", role, turn.content)
        })
        .collect();
    build_prompt_with_context(system_prompt, &context, message)
}

/// Same as [`build_prompt`] with context lines already rendered
pub fn build_prompt_with_context(system_prompt: &str, context: &[String], message: &str) -> String {
    if context.is_empty() {
        format!("{}\n\nUser: {}\n\nMaya:", system_prompt, message)
    } else {
        format!(
            "{}\n\nPrevious conversation:\n{}\n\nUser: {}\n\nMaya:",
            system_prompt,
            context.join("\n"),
            message
        )
    }
}

fn api_key(config: &ProviderConfig) -> Result<String, ProviderError> {
    std::env::var(&config.env_var_api_key)
        .map_err(|_| ProviderError::MissingApiKey(config.env_var_api_key.clone()))
}

fn non_empty(provider: &str, text: &str) -> Result<String, ProviderError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse(provider.to_string()));
    }
    Ok(text.to_string())
}

/// Enforce rate limiting for API requests
async fn enforce_rate_limit(last_request: &Mutex<Option<Instant>>, rate_limit_rps: f64) {
    if rate_limit_rps <= 0.0 {
        return;
    }

    let min_interval = Duration::from_secs_f64(1.0 / rate_limit_rps);
    let mut last_request = last_request.lock().await;

    if let Some(last_time) = *last_request {
        let elapsed = last_time.elapsed();
        if elapsed < min_interval {
            sleep(min_interval - elapsed).await;
        }
    }

    *last_request = Some(Instant::now());
}

/// OpenAI-compatible chat completions backend
pub struct OpenAiProvider {
    config: ProviderConfig,
    last_request: Mutex<Option<Instant>>,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            last_request: Mutex::new(None),
        }
    }

    fn create_client(&self) -> Result<Client<OpenAIConfig>, ProviderError> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key(&self.config)?)
            .with_api_base(&self.config.api_endpoint);

        Ok(Client::with_config(openai_config))
    }

    fn request_error(&self, message: impl ToString) -> ProviderError {
        ProviderError::Request {
            provider: self.id().to_string(),
            message: message.to_string(),
        }
    }

    fn build_request(
        &self,
        prompt: &str,
    ) -> Result<CreateChatCompletionRequest, ProviderError> {
        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(|e| self.request_error(e))?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages([user_message])
            .temperature(self.config.temperature as f32)
            .max_tokens(u16::try_from(self.config.max_tokens).unwrap_or(u16::MAX))
            .build()
            .map_err(|e| self.request_error(e))
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let client = self.create_client()?;
        let request = self.build_request(prompt)?;

        enforce_rate_limit(&self.last_request, self.config.rate_limit_rps).await;
        debug!("Sending chat completion to {} ({})", self.id(), self.config.model);

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| self.request_error(e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        non_empty(self.id(), &content)
    }
}

/// Google Gemini `generateContent` backend
pub struct GeminiProvider {
    config: ProviderConfig,
    http: reqwest::Client,
    last_request: Mutex<Option<Instant>>,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            last_request: Mutex::new(None),
        }
    }

    fn request_error(&self, message: impl ToString) -> ProviderError {
        ProviderError::Request {
            provider: self.id().to_string(),
            message: message.to_string(),
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
            }
        })
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(body: &Value) -> String {
        body.pointer("/candidates/0/content/parts")
            .and_then(|parts| parts.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = api_key(&self.config)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_endpoint.trim_end_matches('/'),
            self.config.model
        );

        enforce_rate_limit(&self.last_request, self.config.rate_limit_rps).await;
        debug!("Sending generateContent to {} ({})", self.id(), self.config.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.request_error(format!("HTTP {}: {}", status, body)));
        }

        let body: Value = response.json().await.map_err(|e| self.request_error(e))?;
        non_empty(self.id(), &Self::extract_text(&body))
    }
}

/// Provider implementations keyed by identifier
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configured providers. Unknown keys are skipped.
    pub fn from_config(configs: &HashMap<String, ProviderConfig>) -> Self {
        let mut registry = Self::new();
        for (id, config) in configs {
            match id.as_str() {
                "openai" => registry.register(Arc::new(OpenAiProvider::new(config.clone()))),
                "gemini" => registry.register(Arc::new(GeminiProvider::new(config.clone()))),
                other => tracing::warn!("Ignoring configuration for unknown provider {}", other),
            }
        }
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn ChatProvider>, ProviderError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::UnsupportedProvider(id.to_string()))
    }

    /// Send `prompt` to the provider registered as `model`
    pub async fn dispatch(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        self.get(model)?.generate(prompt).await
    }

    /// Registered provider ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn provider_config(endpoint: &str, env_var: &str) -> ProviderConfig {
        ProviderConfig {
            api_endpoint: endpoint.to_string(),
            env_var_api_key: env_var.to_string(),
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 100,
            rate_limit_rps: 0.0,
        }
    }

    fn turn(role: &str, content: &str) -> ConversationTurn {
        ConversationTurn {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_build_prompt_without_history() {
        let prompt = build_prompt("You are Maya.", &[], "Hi!");
        assert_eq!(prompt, "You are Maya.\n\nUser: Hi!\n\nMaya:");
    }

    #[test]
    fn test_build_prompt_keeps_last_five_turns() {
        let history: Vec<ConversationTurn> = (0..7)
            .map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("m{}", i)))
            .collect();

        let prompt = build_prompt("P", &history, "now");

        assert!(!prompt.contains("m0"));
        assert!(!prompt.contains("m1"));
        assert!(prompt.contains("Previous conversation:\nUser: m2\nMaya: m3\nUser: m4\nMaya: m5\nUser: m6"));
        assert!(prompt.ends_with("User: now\n\nMaya:"));
    }

    #[tokio::test]
    async fn test_enforce_rate_limit_no_limit() {
        let last_request = Mutex::new(None);
        let start = Instant::now();

        enforce_rate_limit(&last_request, 0.0).await;

        assert!(start.elapsed() < Duration::from_millis(10));
        assert!(last_request.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_enforce_rate_limit_with_sleep() {
        let last_request = Mutex::new(Some(Instant::now()));
        let start = Instant::now();

        enforce_rate_limit(&last_request, 100.0).await;

        assert!(start.elapsed() >= Duration::from_millis(8));
    }

    #[tokio::test]
    async fn test_registry_unknown_provider() {
        let registry = ProviderRegistry::new();
        let err = registry.dispatch("claude", "hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedProvider(ref id) if id == "claude"));
    }

    #[test]
    fn test_registry_from_config_skips_unknown() {
        let mut configs = HashMap::new();
        configs.insert("openai".to_string(), ProviderConfig::openai());
        configs.insert("gemini".to_string(), ProviderConfig::gemini());
        configs.insert("claude".to_string(), ProviderConfig::openai());

        let registry = ProviderRegistry::from_config(&configs);
        assert_eq!(registry.ids(), vec!["gemini".to_string(), "openai".to_string()]);
    }

    #[tokio::test]
    async fn test_openai_missing_env_var() {
        let provider = OpenAiProvider::new(provider_config("http://localhost:1", "MAYA_TEST_OPENAI_UNSET"));
        unsafe {
            std::env::remove_var("MAYA_TEST_OPENAI_UNSET");
        }

        let err = provider.generate("hello").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_openai_generate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "created": 1700000000,
                    "model": "test-model",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "  Let's figure this out together! 🌱  "},
                        "finish_reason": "stop"
                    }]
                }"#,
            )
            .create_async()
            .await;

        unsafe {
            std::env::set_var("MAYA_TEST_OPENAI_KEY", "sk-test");
        }
        let provider = OpenAiProvider::new(provider_config(&server.url(), "MAYA_TEST_OPENAI_KEY"));

        let text = provider.generate("Hi Maya").await.unwrap();
        assert_eq!(text, "Let's figure this out together! 🌱");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "bad request", "type": "invalid_request_error", "param": null, "code": null}}"#)
            .create_async()
            .await;

        unsafe {
            std::env::set_var("MAYA_TEST_OPENAI_KEY_ERR", "sk-test");
        }
        let provider = OpenAiProvider::new(provider_config(&server.url(), "MAYA_TEST_OPENAI_KEY_ERR"));

        let err = provider.generate("Hi Maya").await.unwrap_err();
        assert!(matches!(err, ProviderError::Request { .. }));
    }

    #[tokio::test]
    async fn test_gemini_generate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/test-model:generateContent")
            .match_header("x-goog-api-key", "gm-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [{"content": {"role": "model", "parts": [
                    {"text": "I've been experimenting "},
                    {"text": "with oat milk! "}
                ]}}]}"#,
            )
            .create_async()
            .await;

        unsafe {
            std::env::set_var("MAYA_TEST_GEMINI_KEY", "gm-test");
        }
        let provider = GeminiProvider::new(provider_config(&server.url(), "MAYA_TEST_GEMINI_KEY"));

        let text = provider.generate("Hi Maya").await.unwrap();
        assert_eq!(text, "I've been experimenting with oat milk!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_empty_candidates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/test-model:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        unsafe {
            std::env::set_var("MAYA_TEST_GEMINI_KEY_EMPTY", "gm-test");
        }
        let provider = GeminiProvider::new(provider_config(&server.url(), "MAYA_TEST_GEMINI_KEY_EMPTY"));

        let err = provider.generate("Hi Maya").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_gemini_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/test-model:generateContent")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        unsafe {
            std::env::set_var("MAYA_TEST_GEMINI_KEY_503", "gm-test");
        }
        let provider = GeminiProvider::new(provider_config(&server.url(), "MAYA_TEST_GEMINI_KEY_503"));

        let err = provider.generate("Hi Maya").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
