//! Global constants for memory-core
//!
//! This module centralizes the default configuration values and fixed
//! strings used throughout the memory system, matching the recognised
//! options and defaults enumerated for `Configuration` (see [`crate::config`]).

/// Default configuration values (spec.md §4, §5, §6).
pub mod defaults {
    use std::time::Duration;

    /// Default embedding vector length.
    pub const DIMENSION: usize = 1536;

    /// Retrieval: minimum combined score to keep a candidate (§4.C4).
    pub const SIMILARITY_THRESHOLD: f32 = 40.0;
    /// Retrieval: weight applied to the concept-overlap boost (§4.C4).
    pub const CONCEPT_WEIGHT: f32 = 10.0;
    /// Retrieval: default result limit (§4.C4).
    pub const RETRIEVAL_LIMIT: usize = 10;

    /// Interaction store: short-term tier capacity (§4.C3).
    pub const SHORT_TERM_CAP: usize = 200;
    /// Interaction store: per-hour decay rate used in the recency boost (§4.C3).
    pub const DECAY_RATE_PER_HOUR: f32 = 1e-4;
    /// Interaction store: access count that makes an interaction eligible for
    /// promotion (§4.C3).
    pub const PROMOTION_THRESHOLD: u64 = 5;
    /// Interaction store: minimum age before promotion fires (§4.C3).
    pub const PROMOTION_AGE: Duration = Duration::from_secs(24 * 3600);

    /// Memory manager: token budget for assembled `ask` context (§4.C5).
    pub const MAX_CONTEXT_TOKENS: usize = 4000;

    /// Concurrency: overall deadline for an `ask` request (§5).
    pub const ASK_TIMEOUT: Duration = Duration::from_secs(30);
    /// Concurrency: overall deadline for a `tell` request (§5).
    pub const TELL_TIMEOUT: Duration = Duration::from_secs(15);

    /// Embedding/concept cache: max resident entries (§5).
    pub const CACHE_MAX_SIZE: usize = 1000;
    /// Embedding/concept cache: entry time-to-live (§5).
    pub const CACHE_TTL: Duration = Duration::from_secs(3600);

    /// Rate limiting: minimum inter-call delay per external provider (§5).
    pub const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(200);

    /// RDF gateway: default request timeout (§4.C2).
    pub const SPARQL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Retry: attempts and backoff schedule for `ProviderUnavailable` (§7).
    pub const RETRY_MAX_ATTEMPTS: u32 = 1;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(1);

    /// ZPT: bounded cursor-history length (§3).
    pub const ZPT_HISTORY_CAP: usize = 20;

    /// Enhancement coordinator defaults (§4.C8).
    pub const ENHANCEMENT_MAX_COMBINED_LENGTH: usize = 8000;
    pub const ENHANCEMENT_WEIGHT_HYDE: f32 = 0.3;
    pub const ENHANCEMENT_WEIGHT_WIKIPEDIA: f32 = 0.4;
    pub const ENHANCEMENT_WEIGHT_WIKIDATA: f32 = 0.3;
}

/// Fixed strings used in synthesised answers and the `inspect` verb.
pub mod strings {
    /// Returned by `answer` when the store held no usable context and
    /// synthesis itself could not proceed either (spec.md §8 scenario 6).
    pub const NO_CONTEXT_ANSWER: &str =
        "I don't have enough information in memory to answer that yet.";
    /// Returned by `answer` when the LLM step itself fails (spec.md §7).
    pub const SYNTHESIS_FAILED_ANSWER: &str = "I cannot answer that right now.";
}

/// Log-field names kept consistent across verb invocations (spec.md §3 ambient stack).
pub mod logging {
    pub const FIELD_VERB: &str = "verb";
    pub const FIELD_SESSION: &str = "session_id";
    pub const FIELD_ZPT_DIGEST: &str = "zpt_digest";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_threshold_within_score_bounds() {
        // Similarity bounds invariant (spec.md §8): scores live in [0, 110].
        assert!(defaults::SIMILARITY_THRESHOLD >= 0.0);
        assert!(defaults::SIMILARITY_THRESHOLD <= 110.0);
    }

    #[test]
    fn promotion_threshold_is_positive() {
        assert!(defaults::PROMOTION_THRESHOLD >= 1);
    }

    #[test]
    fn short_term_cap_is_positive() {
        assert!(defaults::SHORT_TERM_CAP > 0);
    }
}
