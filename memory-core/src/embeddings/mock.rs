//! Deterministic embedding/concept providers for tests and `storage.type =
//! memory` deployments that never wired a real model.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use super::provider::{ConceptExtractor, EmbeddingProvider};
use crate::error::Result;

/// Hash-derived pseudo-embedding. Not semantically meaningful, but stable:
/// identical input text always yields the identical vector, which is enough
/// for exercising retrieval, eviction, and ZPT logic in tests.
pub struct MockEmbeddingProvider {
    dimension: usize,
    model_name: String,
}

impl MockEmbeddingProvider {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: "mock-embedding".to_string(),
        }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(crate::constants::defaults::DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut vector = Vec::with_capacity(self.dimension);
        let mut state = seed;
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let bit = ((state >> 33) & 0xFFFF) as f32 / f32::from(u16::MAX);
            vector.push(bit * 2.0 - 1.0);
        }
        Ok(super::provider::utils::normalize_vector(vector))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Whitespace/punctuation tokenizer that keeps capitalized words and words
/// longer than 5 characters as "concepts" — enough to exercise the concept
/// inverted index and retrieval boost without a real NLP model.
pub struct MockConceptExtractor;

#[async_trait]
impl ConceptExtractor for MockConceptExtractor {
    async fn extract_concepts(&self, text: &str) -> Result<Vec<String>> {
        let mut concepts: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .filter(|w| w.len() > 5 || w.chars().next().is_some_and(char::is_uppercase))
            .map(str::to_lowercase)
            .collect();
        concepts.sort();
        concepts.dedup();
        Ok(concepts)
    }

    fn provider_name(&self) -> &str {
        "mock-concept-extractor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_yields_identical_embedding() {
        let provider = MockEmbeddingProvider::new(16);
        let a = provider.embed_text("florglings are turquoise").await.unwrap();
        let b = provider.embed_text("florglings are turquoise").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn different_text_yields_different_embedding() {
        let provider = MockEmbeddingProvider::new(16);
        let a = provider.embed_text("florglings are turquoise").await.unwrap();
        let b = provider.embed_text("zorblax are crimson").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn extract_concepts_keeps_long_and_capitalized_words() {
        let extractor = MockConceptExtractor;
        let concepts = extractor
            .extract_concepts("Florglings are turquoise creatures")
            .await
            .unwrap();
        assert!(concepts.contains(&"florglings".to_string()));
        assert!(concepts.contains(&"turquoise".to_string()));
        assert!(concepts.contains(&"creatures".to_string()));
        assert!(!concepts.contains(&"are".to_string()));
    }
}
