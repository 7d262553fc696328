//! Enhancement Coordinator (spec.md §4.C8): runs 1..3 optional external
//! context pipelines (HyDE / Wikipedia / Wikidata / web search) concurrently
//! by default, merges their text under a weighted length budget, and falls
//! back gracefully when some or all pipelines fail.

pub mod mock;
pub mod ratelimit;

#[cfg(feature = "http-providers")]
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::config::EnhancementsConfig;
use crate::error::{Error, Result};

/// One enhancement pipeline's contribution: free text plus a structured
/// context object (spec.md §4.C8: "each pipeline returns a text blob and a
/// structured context object").
#[derive(Debug, Clone)]
pub struct EnhancementResult {
    pub text: String,
    pub structured: serde_json::Value,
}

/// An optional external context source that contributes text to `ask`
/// (spec.md glossary: "Enhancement pipeline").
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, query: &str) -> Result<EnhancementResult>;

    fn name(&self) -> &str;
}

struct WeightedPipeline {
    enhancer: Arc<dyn Enhancer>,
    weight: f32,
}

/// Orchestrates the configured pipelines and merges their output (spec.md
/// §4.C8, §5 rate-limiting, §7 `ProviderUnavailable` fallback rules).
pub struct EnhancementCoordinator {
    pipelines: Vec<WeightedPipeline>,
    config: EnhancementsConfig,
}

impl EnhancementCoordinator {
    #[must_use]
    pub fn new(config: EnhancementsConfig) -> Self {
        Self {
            pipelines: Vec::new(),
            config,
        }
    }

    pub fn add_pipeline(&mut self, enhancer: Arc<dyn Enhancer>, weight: f32) {
        self.pipelines.push(WeightedPipeline { enhancer, weight });
    }

    /// Run every configured pipeline (concurrently unless `concurrent =
    /// false`), merge successful outputs under the combined-length cap, and
    /// apply the fallback rule on failure (spec.md §4.C8):
    ///
    /// - `fallback_on_error = true` (default): proceed with whichever
    ///   pipelines succeeded; if none did, fall back to `query` itself.
    /// - `fallback_on_error = false`: surface the first failure.
    ///
    /// # Errors
    /// Returns the first pipeline's error when `fallback_on_error = false`
    /// and at least one pipeline failed.
    pub async fn enhance(&self, query: &str) -> Result<String> {
        if self.pipelines.is_empty() {
            return Ok(query.to_string());
        }

        let results: Vec<Result<EnhancementResult>> = if self.config.concurrent {
            join_all(self.pipelines.iter().map(|p| p.enhancer.enhance(query))).await
        } else {
            let mut out = Vec::with_capacity(self.pipelines.len());
            for pipeline in &self.pipelines {
                out.push(pipeline.enhancer.enhance(query).await);
            }
            out
        };

        if !self.config.fallback_on_error {
            for result in &results {
                if let Err(err) = result {
                    return Err(Error::ProviderUnavailable(format!("enhancement pipeline failed: {err}")));
                }
            }
        }

        let mut contributions: Vec<(f32, &str)> = Vec::new();
        for (pipeline, result) in self.pipelines.iter().zip(results.iter()) {
            match result {
                Ok(enhancement) => contributions.push((pipeline.weight, enhancement.text.as_str())),
                Err(err) => tracing::warn!(pipeline = pipeline.enhancer.name(), error = %err, "enhancement pipeline failed, skipping"),
            }
        }

        if contributions.is_empty() {
            // Scenario 4 (spec.md §8): all pipelines failed, fallback_on_error
            // = true ⇒ proceed with the original unmodified query.
            return Ok(query.to_string());
        }

        Ok(merge_weighted(query, &contributions, self.config.max_combined_context_length))
    }
}

/// Merge weighted pipeline text under a total length cap, highest-weight
/// first, truncating whichever contribution is added last if it would
/// overflow the cap.
fn merge_weighted(query: &str, contributions: &[(f32, &str)], max_len: usize) -> String {
    let mut ordered = contributions.to_vec();
    ordered.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged = format!("Query: {query}\n\n");
    for (_, text) in ordered {
        if merged.len() >= max_len {
            break;
        }
        let remaining = max_len - merged.len();
        let chunk: String = text.chars().take(remaining).collect();
        merged.push_str(&chunk);
        merged.push('\n');
    }
    merged
}
