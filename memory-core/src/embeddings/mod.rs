//! Embedding & Concept Services (spec.md §4.C1).
//!
//! Two small traits — [`EmbeddingProvider`] and [`ConceptExtractor`] — are the
//! only seam the rest of the engine depends on. [`CachedEmbeddingService`]
//! wraps a pair of providers with an LRU+TTL cache so repeated `tell`/`ask`
//! calls on the same text skip the network round trip.

pub mod cache;
pub mod mock;
pub mod provider;
pub mod similarity;

#[cfg(feature = "http-providers")]
pub mod http;

pub use cache::ContentCache;
pub use provider::{ConceptExtractor, EmbeddingProvider, EmbeddingResult};
pub use similarity::cosine_similarity;

use std::sync::Arc;

use crate::error::Result;

/// Combines an [`EmbeddingProvider`] and a [`ConceptExtractor`] behind a
/// shared cache, so `embed` and `extract_concepts` calls for text already
/// seen in this process don't re-hit the provider (spec.md §5 ambient cache).
pub struct CachedEmbeddingService {
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn ConceptExtractor>,
    embedding_cache: ContentCache<Vec<f32>>,
    concept_cache: ContentCache<Vec<String>>,
}

impl CachedEmbeddingService {
    #[must_use]
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn ConceptExtractor>,
        cache_max_size: usize,
        cache_ttl: std::time::Duration,
    ) -> Self {
        Self {
            embedder,
            extractor,
            embedding_cache: ContentCache::new(cache_max_size, cache_ttl),
            concept_cache: ContentCache::new(cache_max_size, cache_ttl),
        }
    }

    /// Embed `text`, serving from cache when possible.
    ///
    /// # Errors
    /// Propagates [`crate::Error::ProviderUnavailable`] from the underlying
    /// provider on a cache miss.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = cache::content_hash(&[self.embedder.model_name(), text]);
        if let Some(cached) = self.embedding_cache.get(&key) {
            return Ok(cached);
        }
        let embedding = self.embedder.embed_text(text).await?;
        self.embedding_cache.put(key, embedding.clone());
        Ok(embedding)
    }

    /// Extract concepts from `text`, serving from cache when possible.
    ///
    /// # Errors
    /// Propagates [`crate::Error::ProviderUnavailable`] from the underlying
    /// extractor on a cache miss.
    pub async fn extract_concepts(&self, text: &str) -> Result<Vec<String>> {
        let key = cache::content_hash(&[self.extractor.provider_name(), text]);
        if let Some(cached) = self.concept_cache.get(&key) {
            return Ok(cached);
        }
        let concepts = self.extractor.extract_concepts(text).await?;
        self.concept_cache.put(key, concepts.clone());
        Ok(concepts)
    }

    #[must_use]
    pub fn embedding_dimension(&self) -> usize {
        self.embedder.embedding_dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockConceptExtractor, MockEmbeddingProvider};
    use super::*;

    fn service() -> CachedEmbeddingService {
        CachedEmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(16)),
            Arc::new(MockConceptExtractor),
            100,
            std::time::Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn embed_is_cached_across_calls() {
        let service = service();
        let a = service.embed("florglings are turquoise").await.unwrap();
        let b = service.embed("florglings are turquoise").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(
            service
                .embedding_cache
                .metrics
                .hits
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn extract_concepts_is_cached_across_calls() {
        let service = service();
        let a = service
            .extract_concepts("Florglings are turquoise creatures")
            .await
            .unwrap();
        let b = service
            .extract_concepts("Florglings are turquoise creatures")
            .await
            .unwrap();
        assert_eq!(a, b);
    }
}
