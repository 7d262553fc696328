//! Wires a [`Configuration`] into a runnable [`VerbsService`], same shape
//! as `memory-mcp`'s bootstrap module (both front-ends build their own
//! provider/gateway stack because `memory-storage-sparql` depends on
//! `memory-core`, not the other way around).

use std::sync::Arc;

use memory_core::config::{ProviderRef, StorageKind};
use memory_core::constants::defaults;
use memory_core::embeddings::http::{HttpConceptExtractor, HttpEmbeddingProvider};
use memory_core::embeddings::mock::{MockConceptExtractor, MockEmbeddingProvider};
use memory_core::embeddings::{CachedEmbeddingService, ConceptExtractor, EmbeddingProvider};
use memory_core::enhance::http::{HttpSearchEnhancer, HydeEnhancer};
use memory_core::enhance::EnhancementCoordinator;
use memory_core::llm::http::HttpChatProvider;
use memory_core::llm::mock::MockChatProvider;
use memory_core::llm::ChatProvider;
use memory_core::rdf::fake::InMemoryRdfGateway;
use memory_core::rdf::RdfGateway;
use memory_core::store::InteractionStore;
use memory_core::{Configuration, Error, MemoryManager, Result, VerbsService, ZptStateManager};
use memory_storage_sparql::SparqlHttpGateway;

const GRAPH_IRI: &str = "http://example.org/memory";

/// A wired verb service plus the interaction store backing it, so the CLI
/// can snapshot the store to disk after a single invocation.
pub struct Wired {
    pub verbs: VerbsService,
    pub store: Arc<InteractionStore>,
}

/// Build a fully wired [`VerbsService`] from a loaded configuration.
///
/// # Errors
/// Returns an error if `storage.type = "sparql"` with no configured
/// endpoint, or if the SPARQL HTTP client fails to build.
pub fn build_verbs_service(config: &Configuration) -> Result<Wired> {
    let rdf = build_rdf_gateway(config)?;

    let store = Arc::new(InteractionStore::new(
        config.memory.short_term_cap,
        config.memory.decay_rate,
        config.memory.promotion_threshold,
        config.memory.promotion_age,
    ));
    restore_json_snapshot(config, &store);

    let embedder = build_embedding_provider(&config.models.embedding, config.memory.dimension);
    let extractor = build_concept_extractor(&config.models.embedding);
    let embeddings = Arc::new(CachedEmbeddingService::new(
        embedder,
        extractor,
        defaults::CACHE_MAX_SIZE,
        defaults::CACHE_TTL,
    ));

    let chat = build_chat_provider(&config.models.chat);

    let manager = Arc::new(MemoryManager::new(
        store.clone(),
        embeddings,
        chat.clone(),
        rdf.clone(),
        GRAPH_IRI.to_string(),
        config.memory.similarity_threshold,
        config.memory.concept_weight,
        defaults::RETRIEVAL_LIMIT,
        config.memory.context_window,
    ));

    let session_id = uuid::Uuid::new_v4().to_string();
    let zpt = Arc::new(ZptStateManager::new(
        session_id,
        defaults::ZPT_HISTORY_CAP,
        rdf,
        GRAPH_IRI.to_string(),
    ));

    let enhancer = build_enhancer(config, chat);

    Ok(Wired {
        verbs: VerbsService::new(manager, zpt, enhancer),
        store,
    })
}

fn build_rdf_gateway(config: &Configuration) -> Result<Arc<dyn RdfGateway>> {
    match config.storage.kind {
        StorageKind::Sparql => {
            let endpoint = config.sparql_endpoints.first().ok_or_else(|| {
                Error::InvalidArgument("storage.type = \"sparql\" requires a sparqlEndpoints entry".into())
            })?;
            Ok(Arc::new(SparqlHttpGateway::new(endpoint)?))
        }
        StorageKind::Memory | StorageKind::Json => Ok(Arc::new(InMemoryRdfGateway::new())),
    }
}

fn restore_json_snapshot(config: &Configuration, store: &InteractionStore) {
    if config.storage.kind != StorageKind::Json {
        return;
    }
    let Some(path) = &config.storage.path else {
        return;
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(interactions) => store.load_history(interactions),
            Err(err) => tracing::warn!(%path, error = %err, "ignoring unreadable json snapshot"),
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(%path, error = %err, "failed to read json snapshot"),
    }
}

/// Persist the store's current contents back to `storage.path`. The CLI
/// calls this after every invocation, since (unlike the long-lived
/// `memory-mcp-server`) each CLI run is its own process.
///
/// # Errors
/// Returns an error if the snapshot can't be serialised or written.
pub fn save_json_snapshot(config: &Configuration, store: &InteractionStore) -> anyhow::Result<()> {
    if config.storage.kind != StorageKind::Json {
        return Ok(());
    }
    if let Some(path) = &config.storage.path {
        let snapshot = store.save_history();
        std::fs::write(path, serde_json::to_vec_pretty(&snapshot)?)?;
    }
    Ok(())
}

fn build_embedding_provider(reference: &ProviderRef, dimension: usize) -> Arc<dyn EmbeddingProvider> {
    if reference.provider == "mock" {
        return Arc::new(MockEmbeddingProvider::new(dimension));
    }
    let endpoint = std::env::var("EMBEDDING_ENDPOINT")
        .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string());
    let api_key = std::env::var("EMBEDDING_API_KEY").ok();
    Arc::new(HttpEmbeddingProvider::new(endpoint, api_key, reference.model.clone(), dimension))
}

fn build_concept_extractor(reference: &ProviderRef) -> Arc<dyn ConceptExtractor> {
    if reference.provider == "mock" {
        return Arc::new(MockConceptExtractor);
    }
    let endpoint =
        std::env::var("CONCEPT_ENDPOINT").unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
    let api_key = std::env::var("EMBEDDING_API_KEY").ok();
    Arc::new(HttpConceptExtractor::new(endpoint, api_key, reference.model.clone()))
}

fn build_chat_provider(reference: &ProviderRef) -> Arc<dyn ChatProvider> {
    if reference.provider == "mock" {
        return Arc::new(MockChatProvider);
    }
    let endpoint =
        std::env::var("CHAT_ENDPOINT").unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
    let api_key = std::env::var("CHAT_API_KEY").ok();
    Arc::new(HttpChatProvider::new(endpoint, api_key, reference.model.clone()))
}

fn build_enhancer(config: &Configuration, chat: Arc<dyn ChatProvider>) -> Option<Arc<EnhancementCoordinator>> {
    let mut coordinator = EnhancementCoordinator::new(config.enhancements.clone());
    let mut wired_any = false;

    if config.models.chat.provider != "mock" {
        coordinator.add_pipeline(Arc::new(HydeEnhancer::new(chat)), config.enhancements.weights.hyde);
        wired_any = true;
    }
    if let Ok(endpoint) = std::env::var("WIKIPEDIA_ENDPOINT") {
        coordinator.add_pipeline(
            Arc::new(HttpSearchEnhancer::new("wikipedia", endpoint)),
            config.enhancements.weights.wikipedia,
        );
        wired_any = true;
    }
    if let Ok(endpoint) = std::env::var("WIKIDATA_ENDPOINT") {
        coordinator.add_pipeline(
            Arc::new(HttpSearchEnhancer::new("wikidata", endpoint)),
            config.enhancements.weights.wikidata,
        );
        wired_any = true;
    }

    wired_any.then_some(Arc::new(coordinator))
}
