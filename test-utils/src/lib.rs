//! Shared fixtures for building a fully mock-backed verb stack, reused by
//! the end-to-end scenario tests and any crate's own integration suite that
//! needs a real [`VerbsService`] without a live provider or SPARQL store.

use std::sync::Arc;

use memory_core::embeddings::mock::{MockConceptExtractor, MockEmbeddingProvider};
use memory_core::embeddings::CachedEmbeddingService;
use memory_core::llm::mock::MockChatProvider;
use memory_core::rdf::fake::InMemoryRdfGateway;
use memory_core::store::InteractionStore;
use memory_core::{MemoryManager, VerbsService, ZptStateManager};

pub const TEST_DIMENSION: usize = 32;
pub const TEST_GRAPH_IRI: &str = "http://example.org/test-memory";

/// Default knobs for the mock-backed stack, chosen to keep scenario tests
/// deterministic and fast: a small short-term cap so promotion/eviction
/// paths are reachable without hundreds of `tell` calls, and a similarity
/// threshold loose enough that the mock embedding provider's deterministic
/// hash vectors still produce retrievable matches.
pub struct Fixture {
    pub short_term_cap: usize,
    pub decay_rate: f32,
    pub promotion_threshold: u64,
    pub promotion_age: std::time::Duration,
    pub similarity_threshold: f32,
    pub concept_weight: f32,
    pub retrieval_limit: usize,
    pub context_window: usize,
    pub zpt_history_cap: usize,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            short_term_cap: 5,
            decay_rate: 1e-4,
            promotion_threshold: 3,
            promotion_age: std::time::Duration::from_secs(60),
            similarity_threshold: 10.0,
            concept_weight: 10.0,
            retrieval_limit: 10,
            context_window: 2000,
            zpt_history_cap: 50,
        }
    }
}

/// Build a [`VerbsService`] wired entirely to mocks (in-memory RDF gateway,
/// deterministic embedding/concept/chat providers, no enhancement
/// coordinator). Mirrors `memory-mcp`/`memory-cli`'s own `bootstrap`
/// modules, trimmed to the mock-only path.
#[must_use]
pub fn mock_verbs_service(fixture: &Fixture) -> VerbsService {
    let rdf = Arc::new(InMemoryRdfGateway::new());

    let store = Arc::new(InteractionStore::new(
        fixture.short_term_cap,
        fixture.decay_rate,
        fixture.promotion_threshold,
        fixture.promotion_age,
    ));

    let embeddings = Arc::new(CachedEmbeddingService::new(
        Arc::new(MockEmbeddingProvider::new(TEST_DIMENSION)),
        Arc::new(MockConceptExtractor),
        1000,
        std::time::Duration::from_secs(3600),
    ));

    let chat = Arc::new(MockChatProvider);

    let manager = Arc::new(MemoryManager::new(
        store,
        embeddings,
        chat,
        rdf.clone(),
        TEST_GRAPH_IRI.to_string(),
        fixture.similarity_threshold,
        fixture.concept_weight,
        fixture.retrieval_limit,
        fixture.context_window,
    ));

    let zpt = Arc::new(ZptStateManager::new(
        uuid::Uuid::new_v4().to_string(),
        fixture.zpt_history_cap,
        rdf,
        TEST_GRAPH_IRI.to_string(),
    ));

    VerbsService::new(manager, zpt, None)
}

/// Current wall-clock time in milliseconds, the `now_ms` every verb call
/// takes explicitly (spec.md §4.C6: decay/promotion are driven by caller
/// time, never `SystemTime::now()` inside the engine).
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_stack_answers_tell_and_recall() {
        let verbs = mock_verbs_service(&Fixture::default());
        let now = now_ms();

        let tell = verbs.tell("the capybara is the largest living rodent", memory_core::TellContentType::Interaction, false, now).await;
        assert!(tell.success);

        let recall = verbs.recall("capybara", now).await;
        assert!(recall.success);
    }
}
