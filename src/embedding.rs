//! Sentence embedding collaborators.
//!
//! `LocalEmbedder` runs a fastembed model on the local machine. The model is
//! downloaded into the cache directory on first use. `CachedEmbedder` keeps
//! every vector it has produced so repeated texts (theme references in
//! particular) embed once per process.

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info};

/// Maps text to a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Embedder backed by a locally-run fastembed model
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    /// Load the configured model, downloading it if not cached yet
    pub async fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let model_name = Self::model_name_to_enum(&config.model)?;

        info!(
            "Loading embedding model {} (cache: {:?})",
            config.model, config.cache_dir
        );

        let mut init_options = InitOptions::default();
        init_options.model_name = model_name;
        init_options.show_download_progress = config.show_download_progress;
        if let Some(cache_dir) = &config.cache_dir {
            init_options.cache_dir = cache_dir.clone();
        }

        let model = task::spawn_blocking(move || TextEmbedding::try_new(init_options))
            .await
            .map_err(|e| EmbeddingError::Model(format!("Task join error: {}", e)))?
            .map_err(|e| EmbeddingError::Model(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }

    fn model_name_to_enum(model_name: &str) -> Result<EmbeddingModel, EmbeddingError> {
        match model_name {
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
            "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            other => Err(EmbeddingError::UnsupportedModel(other.to_string())),
        }
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let model = Arc::clone(&self.model);
        let texts = vec![text.to_string()];

        // fastembed is synchronous
        let mut embeddings = task::spawn_blocking(move || {
            let mut guard = model.lock();
            guard.embed(texts, None)
        })
        .await
        .map_err(|e| EmbeddingError::Model(format!("Task join error: {}", e)))?
        .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::Model("No embedding returned".to_string()))
    }
}

/// Memoizing wrapper around another embedder
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<HashMap<String, Arc<Vec<f32>>>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let hit = self.cache.lock().get(text).cloned();
        if let Some(hit) = hit {
            return Ok(hit.as_ref().clone());
        }

        let vector = self.inner.embed(text).await?;
        debug!("Cached embedding for {} chars of text", text.len());
        self.cache
            .lock()
            .insert(text.to_string(), Arc::new(vector.clone()));
        Ok(vector)
    }
}

/// Stand-in used when the model could not be loaded; every call fails, so
/// similarity degrades to 0.0 instead of stopping the process.
pub struct OfflineEmbedder {
    reason: String,
}

impl OfflineEmbedder {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Embedder for OfflineEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Model(format!("model offline: {}", self.reason)))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::HashingEmbedder;
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_offline_embedder_reports_reason() {
        let err = OfflineEmbedder::new("no network").embed("hi").await.unwrap_err();
        assert!(err.to_string().contains("no network"));
    }

    #[test]
    fn test_unsupported_model_name() {
        let err = LocalEmbedder::model_name_to_enum("word2vec").unwrap_err();
        assert!(matches!(err, EmbeddingError::UnsupportedModel(_)));
    }

    #[test]
    fn test_default_model_name_supported() {
        assert!(LocalEmbedder::model_name_to_enum("all-MiniLM-L6-v2").is_ok());
    }

    #[tokio::test]
    async fn test_cached_embedder_reuses_vectors() {
        let cached = CachedEmbedder::new(HashingEmbedder::default());

        let first = cached.embed("plant-based dinner").await.unwrap();
        let second = cached.embed("plant-based dinner").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_cached_embedder_does_not_cache_errors() {
        let cached = CachedEmbedder::new(HashingEmbedder::default());

        assert!(cached.embed("").await.is_err());
        assert!(cached.embed("").await.is_err());
        assert_eq!(cached.cached_len(), 0);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }
}
