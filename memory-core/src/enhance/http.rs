//! HTTP-backed enhancement pipelines (feature `http-providers`).
//!
//! `HydeEnhancer` asks the chat model to write a hypothetical answer
//! document (the HyDE technique) via [`crate::llm::ChatProvider`].
//! `HttpSearchEnhancer` is a generic wrapper around a search-style GET
//! endpoint (Wikipedia/Wikidata/web search all fit this shape: a query
//! parameter in, a JSON array of snippets out), rate-limited per spec.md §5.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::ratelimit::RateLimiter;
use super::{EnhancementResult, Enhancer};
use crate::error::{Error, Result};
use crate::llm::ChatProvider;
use crate::retry::retry_provider_call;

pub struct HydeEnhancer {
    chat: Arc<dyn ChatProvider>,
}

impl HydeEnhancer {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatProvider>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Enhancer for HydeEnhancer {
    async fn enhance(&self, query: &str) -> Result<EnhancementResult> {
        let prompt = format!(
            "Write a short hypothetical passage that would answer this question, \
             as if it were an excerpt from a reference document. Question: {query}"
        );
        let text = self.chat.generate(&prompt).await?;
        Ok(EnhancementResult {
            text: text.clone(),
            structured: serde_json::json!({ "pipeline": "hyde", "hypothetical_document": text }),
        })
    }

    fn name(&self) -> &str {
        "hyde"
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchSnippet>,
}

#[derive(Deserialize)]
struct SearchSnippet {
    snippet: String,
}

pub struct HttpSearchEnhancer {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    rate_limiter: RateLimiter,
}

impl HttpSearchEnhancer {
    #[must_use]
    pub fn new(name: &str, endpoint: String) -> Self {
        Self {
            name: name.to_string(),
            client: reqwest::Client::new(),
            endpoint,
            rate_limiter: RateLimiter::new(Duration::from_millis(200)),
        }
    }
}

#[async_trait]
impl Enhancer for HttpSearchEnhancer {
    async fn enhance(&self, query: &str) -> Result<EnhancementResult> {
        self.rate_limiter.wait().await;

        let text = retry_provider_call(|| async {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("q", query)])
                .send()
                .await
                .map_err(|e| {
                    Error::ProviderUnavailable(format!("{} request failed: {e}", self.name))
                })?;

            if !response.status().is_success() {
                return Err(Error::ProviderUnavailable(format!(
                    "{} endpoint returned {}",
                    self.name,
                    response.status()
                )));
            }

            let parsed: SearchResponse = response.json().await.map_err(|e| {
                Error::ProviderUnavailable(format!("invalid {} response: {e}", self.name))
            })?;

            Ok(parsed
                .results
                .into_iter()
                .map(|s| s.snippet)
                .collect::<Vec<_>>()
                .join(" "))
        })
        .await?;

        Ok(EnhancementResult {
            text: text.clone(),
            structured: serde_json::json!({ "pipeline": self.name, "snippets": text }),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
