//! Deterministic [`super::Enhancer`] implementations for tests: one that
//! always succeeds with canned text, one that always fails with
//! `ProviderUnavailable` (used to exercise spec.md §8 scenario 4).

use async_trait::async_trait;

use super::{EnhancementResult, Enhancer};
use crate::error::{Error, Result};

pub struct MockEnhancer {
    name: String,
    text: String,
}

impl MockEnhancer {
    #[must_use]
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl Enhancer for MockEnhancer {
    async fn enhance(&self, _query: &str) -> Result<EnhancementResult> {
        Ok(EnhancementResult {
            text: self.text.clone(),
            structured: serde_json::json!({ "pipeline": self.name }),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct FailingEnhancer {
    name: String,
}

impl FailingEnhancer {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl Enhancer for FailingEnhancer {
    async fn enhance(&self, _query: &str) -> Result<EnhancementResult> {
        Err(Error::ProviderUnavailable(format!("{} endpoint unreachable", self.name)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
