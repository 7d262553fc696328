//! HTTP-backed [`super::ChatProvider`] (feature `http-providers`), targeting
//! an OpenAI-compatible chat-completions endpoint. Mirrors
//! [`crate::embeddings::http::HttpEmbeddingProvider`]'s error handling: any
//! transport failure, non-2xx response, or malformed body becomes
//! [`Error::ProviderUnavailable`].

use async_trait::async_trait;
use serde::Deserialize;

use super::ChatProvider;
use crate::error::{Error, Result};
use crate::retry::retry_provider_call;

pub struct HttpChatProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpChatProvider {
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
impl ChatProvider for HttpChatProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        retry_provider_call(|| async {
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
                .map_err(|e| Error::ProviderUnavailable(format!("chat request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::ProviderUnavailable(format!(
                    "chat endpoint returned {}",
                    response.status()
                )));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::ProviderUnavailable(format!("invalid chat response: {e}")))?;

            parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| Error::ProviderUnavailable("chat response had no choices".into()))
        })
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
