//! Recognised configuration options (spec.md §6) and their defaults.
//!
//! Loaded from TOML via [`toml`]; every field has a default so a bare `{}`
//! document (or an absent config file) yields a fully valid in-memory
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::{Error, Result};

/// Top-level configuration object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub storage: StorageConfig,
    pub models: ModelsConfig,
    pub memory: MemoryConfig,
    #[serde(rename = "sparqlEndpoints")]
    pub sparql_endpoints: Vec<SparqlEndpoint>,
    pub enhancements: EnhancementsConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            models: ModelsConfig::default(),
            memory: MemoryConfig::default(),
            sparql_endpoints: Vec::new(),
            enhancements: EnhancementsConfig::default(),
        }
    }
}

impl Configuration {
    /// Parse a TOML document into a `Configuration`, filling in defaults for
    /// anything left unspecified.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] when the document doesn't parse,
    /// or fails [`Self::validate`].
    pub fn from_toml(document: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(document).map_err(|e| Error::InvalidArgument(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks that `serde`'s per-field defaults can't express:
    /// a `sparql` storage backend needs at least one endpoint, and the
    /// enhancement weights should be non-negative.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if a check fails.
    pub fn validate(&self) -> Result<()> {
        if self.storage.kind == StorageKind::Sparql && self.sparql_endpoints.is_empty() {
            return Err(Error::InvalidArgument(
                "storage.type = \"sparql\" requires at least one entry in sparqlEndpoints".into(),
            ));
        }
        let weights = &self.enhancements.weights;
        if weights.hyde < 0.0 || weights.wikipedia < 0.0 || weights.wikidata < 0.0 {
            return Err(Error::InvalidArgument(
                "enhancement weights must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Json,
    Sparql,
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub kind: StorageKind,
    /// Path to the snapshot file when `kind == Json`.
    pub path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRef {
    pub provider: String,
    pub model: String,
}

impl Default for ProviderRef {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "mock".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub chat: ProviderRef,
    pub embedding: ProviderRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub dimension: usize,
    #[serde(rename = "similarityThreshold")]
    pub similarity_threshold: f32,
    #[serde(rename = "contextWindow")]
    pub context_window: usize,
    #[serde(rename = "decayRate")]
    pub decay_rate: f32,
    #[serde(rename = "shortTermCap")]
    pub short_term_cap: usize,
    #[serde(rename = "promotionThreshold")]
    pub promotion_threshold: u64,
    #[serde(rename = "promotionAge", with = "duration_secs")]
    pub promotion_age: Duration,
    #[serde(rename = "conceptWeight")]
    pub concept_weight: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dimension: defaults::DIMENSION,
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            context_window: defaults::MAX_CONTEXT_TOKENS,
            decay_rate: defaults::DECAY_RATE_PER_HOUR,
            short_term_cap: defaults::SHORT_TERM_CAP,
            promotion_threshold: defaults::PROMOTION_THRESHOLD,
            promotion_age: defaults::PROMOTION_AGE,
            concept_weight: defaults::CONCEPT_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlEndpoint {
    pub name: Option<String>,
    #[serde(rename = "queryUrl")]
    pub query_url: String,
    #[serde(rename = "updateUrl")]
    pub update_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementWeights {
    pub hyde: f32,
    pub wikipedia: f32,
    pub wikidata: f32,
}

impl Default for EnhancementWeights {
    fn default() -> Self {
        Self {
            hyde: defaults::ENHANCEMENT_WEIGHT_HYDE,
            wikipedia: defaults::ENHANCEMENT_WEIGHT_WIKIPEDIA,
            wikidata: defaults::ENHANCEMENT_WEIGHT_WIKIDATA,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementsConfig {
    #[serde(rename = "maxCombinedContextLength")]
    pub max_combined_context_length: usize,
    pub concurrent: bool,
    pub weights: EnhancementWeights,
    #[serde(rename = "fallbackOnError")]
    pub fallback_on_error: bool,
}

impl Default for EnhancementsConfig {
    fn default() -> Self {
        Self {
            max_combined_context_length: defaults::ENHANCEMENT_MAX_COMBINED_LENGTH,
            concurrent: true,
            weights: EnhancementWeights::default(),
            fallback_on_error: true,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_full_defaults() {
        let config = Configuration::from_toml("").unwrap();
        assert_eq!(config.storage.kind, StorageKind::Memory);
        assert_eq!(config.memory.dimension, defaults::DIMENSION);
        assert_eq!(config.memory.short_term_cap, defaults::SHORT_TERM_CAP);
        assert!(config.enhancements.fallback_on_error);
    }

    #[test]
    fn sparql_storage_without_endpoints_is_rejected() {
        let toml = r#"
            [storage]
            type = "sparql"
        "#;
        let err = Configuration::from_toml(toml).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn sparql_storage_with_endpoint_is_accepted() {
        let toml = r#"
            [storage]
            type = "sparql"

            [[sparqlEndpoints]]
            queryUrl = "http://localhost:3030/ds/query"
            updateUrl = "http://localhost:3030/ds/update"
        "#;
        let config = Configuration::from_toml(toml).unwrap();
        assert_eq!(config.sparql_endpoints.len(), 1);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let toml = r#"
            [memory]
            shortTermCap = 50
        "#;
        let config = Configuration::from_toml(toml).unwrap();
        assert_eq!(config.memory.short_term_cap, 50);
        assert_eq!(config.memory.dimension, defaults::DIMENSION);
    }
}
