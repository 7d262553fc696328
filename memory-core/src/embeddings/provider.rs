//! Embedding and concept-extraction provider traits (spec.md §4.C1).

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Result from embedding generation, with optional provider diagnostics.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub embedding: Vec<f32>,
    pub token_count: Option<usize>,
    pub model: String,
    pub generation_time_ms: Option<u64>,
}

impl EmbeddingResult {
    #[must_use]
    pub fn new(embedding: Vec<f32>, model: String) -> Self {
        Self {
            embedding,
            token_count: None,
            model,
            generation_time_ms: None,
        }
    }

    #[must_use]
    pub fn detailed(
        embedding: Vec<f32>,
        model: String,
        token_count: usize,
        generation_time_ms: u64,
    ) -> Self {
        Self {
            embedding,
            token_count: Some(token_count),
            model,
            generation_time_ms: Some(generation_time_ms),
        }
    }
}

/// Converts text to a fixed-length vector (spec.md §4.C1 `embed`).
///
/// Implementations wrap transport or model failures as
/// [`Error::ProviderUnavailable`]; a malformed response (wrong length, NaN
/// components) is also reported as `ProviderUnavailable` since the caller has
/// no action to take beyond retrying or falling back.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts. Default implementation calls
    /// `embed_text` sequentially; providers with a native batch endpoint
    /// should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_text(text).await?);
        }
        Ok(embeddings)
    }

    /// Semantic similarity between two texts, in `[0, 1]`.
    async fn similarity(&self, text1: &str, text2: &str) -> Result<f32> {
        let embedding1 = self.embed_text(text1).await?;
        let embedding2 = self.embed_text(text2).await?;
        let cos = super::similarity::cosine_similarity(&embedding1, &embedding2);
        Ok((cos + 1.0) / 2.0)
    }

    /// Embedding vector length this provider produces.
    fn embedding_dimension(&self) -> usize;

    fn model_name(&self) -> &str;

    async fn is_available(&self) -> bool {
        self.embed_text("ping").await.is_ok()
    }

    async fn warmup(&self) -> Result<()> {
        self.embed_text("warmup").await?;
        Ok(())
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "model": self.model_name(),
            "dimension": self.embedding_dimension()
        })
    }
}

/// Extracts the salient concept labels from a piece of text (spec.md §4.C1
/// `extractConcepts`). Concepts feed the inverted index ([`crate::store`])
/// and the retrieval concept boost ([`crate::retrieval`]).
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    async fn extract_concepts(&self, text: &str) -> Result<Vec<String>>;

    fn provider_name(&self) -> &str;

    async fn is_available(&self) -> bool {
        self.extract_concepts("ping").await.is_ok()
    }
}

/// Utility functions shared by embedding providers.
pub mod utils {
    use super::{Error, Result};

    #[must_use]
    pub fn normalize_vector(mut vector: Vec<f32>) -> Vec<f32> {
        let magnitude = (vector.iter().map(|x| x * x).sum::<f32>()).sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }
        vector
    }

    /// Checks an embedding has the expected length.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] on a length mismatch.
    pub fn validate_dimension(embedding: &[f32], expected: usize) -> Result<()> {
        if embedding.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "embedding dimension mismatch: got {}, expected {expected}",
                embedding.len()
            )));
        }
        Ok(())
    }

    /// Split `text` on whitespace boundaries into chunks no longer than
    /// `max_chars`, used to embed inputs that exceed a provider's token limit.
    #[must_use]
    pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
        if text.len() <= max_chars {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current_chunk = String::new();

        for word in text.split_whitespace() {
            if current_chunk.len() + word.len() + 1 > max_chars && !current_chunk.is_empty() {
                chunks.push(current_chunk.trim().to_string());
                current_chunk = word.to_string();
            } else {
                if !current_chunk.is_empty() {
                    current_chunk.push(' ');
                }
                current_chunk.push_str(word);
            }
        }

        if !current_chunk.is_empty() {
            chunks.push(current_chunk.trim().to_string());
        }

        chunks
    }

    /// Average multiple embeddings (e.g. from chunked text) into one unit vector.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the slice is empty or the
    /// embeddings have inconsistent lengths.
    pub fn average_embeddings(embeddings: &[Vec<f32>]) -> Result<Vec<f32>> {
        let Some(first) = embeddings.first() else {
            return Err(Error::InvalidArgument(
                "cannot average an empty embedding list".into(),
            ));
        };
        let dimension = first.len();
        let mut result = vec![0.0; dimension];

        for embedding in embeddings {
            if embedding.len() != dimension {
                return Err(Error::InvalidArgument(
                    "inconsistent embedding dimensions in average_embeddings".into(),
                ));
            }
            for (i, &value) in embedding.iter().enumerate() {
                result[i] += value;
            }
        }

        let count = embeddings.len() as f32;
        for value in &mut result {
            *value /= count;
        }

        Ok(normalize_vector(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_vector_produces_unit_length() {
        let normalized = utils::normalize_vector(vec![3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 0.001);
        assert!((normalized[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn chunk_text_respects_max_chars_and_preserves_words() {
        let text = "This is a long text that needs to be chunked into smaller pieces";
        let chunks = utils::chunk_text(text, 25);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 25);
        }
        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn average_embeddings_returns_normalized_mean_direction() {
        let embeddings = vec![vec![1.0, 2.0, 3.0], vec![3.0, 6.0, 9.0]];
        let averaged = utils::average_embeddings(&embeddings).unwrap();
        let magnitude = averaged.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.001);
    }

    #[test]
    fn average_embeddings_rejects_empty_input() {
        assert!(utils::average_embeddings(&[]).is_err());
    }

    #[test]
    fn validate_dimension_rejects_mismatch() {
        let embedding = vec![1.0, 2.0, 3.0];
        assert!(utils::validate_dimension(&embedding, 3).is_ok());
        assert!(utils::validate_dimension(&embedding, 4).is_err());
    }
}
