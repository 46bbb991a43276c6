use thiserror::Error;

/// Failure of a model-dispatch collaborator
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No provider is registered under the requested identifier
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The environment variable holding the API key is not set
    #[error("Environment variable {0} not found")]
    MissingApiKey(String),

    /// The provider API call failed
    #[error("Provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// The provider answered but generated no text
    #[error("Provider {0} returned an empty response")]
    EmptyResponse(String),
}

/// Failure of the embedding collaborator
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Cannot embed empty text")]
    EmptyText,

    #[error("Unsupported embedding model: {0}")]
    UnsupportedModel(String),

    #[error("Embedding model failed: {0}")]
    Model(String),
}

/// Rejected caller input. Raised before any tracker state is touched.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Scenario #{index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Score must be a finite number, got {0}")]
    InvalidScore(f64),

    #[error("Prompt id must not be empty")]
    EmptyPromptId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_messages() {
        let err = ProviderError::UnsupportedProvider("claude".to_string());
        assert_eq!(err.to_string(), "Unsupported provider: claude");

        let err = ProviderError::MissingApiKey("OPENAI_API_KEY".to_string());
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::MissingField {
            index: 2,
            field: "user_message",
        };
        assert_eq!(
            err.to_string(),
            "Scenario #2 is missing required field `user_message`"
        );
    }
}
