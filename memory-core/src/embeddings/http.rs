//! HTTP-backed embedding and concept providers (feature `http-providers`).
//!
//! Targets an OpenAI-compatible `/embeddings` endpoint and a chat-completion
//! endpoint prompted to return a JSON array of concept strings. Any transport
//! failure, non-2xx response, or malformed body becomes
//! [`Error::ProviderUnavailable`] — callers retry or fall back, they never
//! need to distinguish the cause (spec.md §4.C1, §7).

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{ConceptExtractor, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::retry::retry_provider_call;

pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    #[must_use]
    pub fn new(endpoint: String, api_key: Option<String>, model: String, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            dimension,
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        retry_provider_call(|| async {
            let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
                "model": self.model,
                "input": text,
            }));
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::ProviderUnavailable(format!("embedding request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::ProviderUnavailable(format!(
                    "embedding endpoint returned {}",
                    response.status()
                )));
            }

            let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
                Error::ProviderUnavailable(format!("invalid embedding response: {e}"))
            })?;

            let embedding = parsed
                .data
                .into_iter()
                .next()
                .ok_or_else(|| Error::ProviderUnavailable("embedding response had no data".into()))?
                .embedding;

            if embedding.len() != self.dimension {
                return Err(Error::ProviderUnavailable(format!(
                    "embedding dimension mismatch: got {}, expected {}",
                    embedding.len(),
                    self.dimension
                )));
            }

            Ok(embedding)
        })
        .await
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub struct HttpConceptExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpConceptExtractor {
    #[must_use]
    pub fn new(endpoint: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl ConceptExtractor for HttpConceptExtractor {
    async fn extract_concepts(&self, text: &str) -> Result<Vec<String>> {
        retry_provider_call(|| async {
            let prompt = format!(
                "Extract the key concepts from the following text. Respond with only a \
                 JSON array of short lowercase strings, nothing else.\n\nText: {text}"
            );

            let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
            }));
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::ProviderUnavailable(format!("concept request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::ProviderUnavailable(format!(
                    "concept endpoint returned {}",
                    response.status()
                )));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::ProviderUnavailable(format!("invalid concept response: {e}")))?;

            let content = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| Error::ProviderUnavailable("concept response had no choices".into()))?
                .message
                .content;

            serde_json::from_str::<Vec<String>>(content.trim()).map_err(|e| {
                Error::ProviderUnavailable(format!("concept response was not a JSON array: {e}"))
            })
        })
        .await
    }

    fn provider_name(&self) -> &str {
        &self.model
    }
}
