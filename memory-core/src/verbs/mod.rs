//! Simple Verbs Service (spec.md §4.C7): validates input, consults C5/C6,
//! optionally routes through C8, and returns a uniform [`VerbResult`]
//! envelope carrying the current ZPT state. This is the only component that
//! is allowed to let the user-facing shape of a request diverge from C5/C6's
//! internal method signatures — everything downstream of here deals in
//! plain Rust types.

pub mod validation;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::constants::defaults;
use crate::embeddings::cosine_similarity;
use crate::enhance::EnhancementCoordinator;
use crate::manager::{MemoryManager, RetrievedSource};
use crate::types::{AskMode, AugmentOperation, PanParams, TellContentType, Tilt, VerbResult, Zoom};
use crate::zpt::ZptStateManager;

/// Watermark (as a fraction of the configured short-term cap) above which
/// `inspect`'s recommendations suggest pruning the short-term tier.
const SHORT_TERM_WATERMARK_NUM: usize = 3;
const SHORT_TERM_WATERMARK_DEN: usize = 4;

/// Dispatches the eight verbs over C5 ([`MemoryManager`]) and C6
/// ([`ZptStateManager`]), with an optional C8 ([`EnhancementCoordinator`]).
pub struct VerbsService {
    manager: Arc<MemoryManager>,
    zpt: Arc<ZptStateManager>,
    enhancer: Option<Arc<EnhancementCoordinator>>,
}

impl VerbsService {
    #[must_use]
    pub fn new(
        manager: Arc<MemoryManager>,
        zpt: Arc<ZptStateManager>,
        enhancer: Option<Arc<EnhancementCoordinator>>,
    ) -> Self {
        Self { manager, zpt, enhancer }
    }

    /// `tell{content, type?, metadata?, lazy?}` → `ingest` (spec.md §6).
    /// Never mutates the ZPT cursor (spec.md §4.C6, §8 ZPT invariance).
    pub async fn tell(&self, content: &str, content_type: TellContentType, lazy: bool, now_ms: i64) -> VerbResult {
        if let Err(message) = validation::require_non_empty("content", content) {
            return VerbResult::err("tell", message, self.zpt.peek());
        }

        match self.manager.ingest(content, "", lazy, now_ms).await {
            Ok(outcome) => VerbResult::ok(
                "tell",
                json!({
                    "stored": true,
                    "persisted": outcome.persisted,
                    "contentLength": content.chars().count(),
                    "type": content_type,
                    "id": outcome.id,
                }),
                self.zpt.peek(),
            ),
            Err(err) => VerbResult::err("tell", err.to_string(), self.zpt.peek()),
        }
    }

    /// `ask{question, mode?, useHyDE?, useWikipedia?, useWikidata?,
    /// useWebSearch?}` (spec.md §6). `basic` skips retrieval; `comprehensive`
    /// and any `use*` flag route the question through C8 first. Always
    /// mutates `lastQuery` (spec.md §4.C6), regardless of mode.
    #[allow(clippy::too_many_arguments)]
    pub async fn ask(
        &self,
        question: &str,
        mode: AskMode,
        use_hyde: bool,
        use_wikipedia: bool,
        use_wikidata: bool,
        use_web_search: bool,
        now_ms: i64,
    ) -> VerbResult {
        if let Err(message) = validation::require_non_empty("question", question) {
            return VerbResult::err("ask", message, self.zpt.peek());
        }

        let wants_enhancement =
            mode == AskMode::Comprehensive || use_hyde || use_wikipedia || use_wikidata || use_web_search;

        let (answer, used_context, memories) = match mode {
            AskMode::Basic => (self.manager.basic_answer(question).await, false, 0),
            _ => {
                let effective_question = if wants_enhancement {
                    match &self.enhancer {
                        Some(enhancer) => match enhancer.enhance(question).await {
                            Ok(enhanced) => enhanced,
                            Err(err) => {
                                tracing::warn!(error = %err, "enhancement failed, answering from the bare question");
                                question.to_string()
                            }
                        },
                        None => question.to_string(),
                    }
                } else {
                    question.to_string()
                };

                let outcome = self.manager.answer(&effective_question, now_ms).await;
                (outcome.answer, outcome.used_context, outcome.sources.len())
            }
        };

        let snapshot = self.zpt.ask(question, now_ms).await;
        self.zpt.attach_answer_digest(&hex_digest(&answer, 8));

        VerbResult::ok(
            "ask",
            json!({ "answer": answer, "memories": memories, "usedContext": used_context }),
            snapshot,
        )
    }

    /// `augment{target, operation}` (spec.md §4.C7, §9). Never mutates the
    /// ZPT cursor — augment is a C5/C3 operation, not a C6 one.
    pub async fn augment(&self, target: &str, operation: AugmentOperation, now_ms: i64) -> VerbResult {
        if let Err(message) = validation::require_non_empty("target", target) {
            return VerbResult::err("augment", message, self.zpt.peek());
        }

        let result = match operation {
            AugmentOperation::Concepts => self.augment_concepts(target).await,
            AugmentOperation::Embedding => self.augment_embedding(target).await,
            AugmentOperation::Auto => self.augment_auto(target, now_ms).await,
            AugmentOperation::Relationships => self.augment_relationships(now_ms).await,
            AugmentOperation::Remember => self.augment_remember(target, now_ms).await,
            AugmentOperation::Forget => self.augment_forget(target),
            AugmentOperation::EnhanceConcepts => self.augment_enhance_concepts(target).await,
            AugmentOperation::FullProcessing => self.augment_full_processing(target, now_ms).await,
            AugmentOperation::BatchExtractConcepts => self.augment_batch_extract_concepts(target).await,
            AugmentOperation::AnalyzeRelationships => self.augment_analyze_relationships(),
        };

        VerbResult::ok("augment", json!({ "operation": operation, "result": result }), self.zpt.peek())
    }

    async fn augment_concepts(&self, target: &str) -> Value {
        match self.manager.embeddings().extract_concepts(target).await {
            Ok(concepts) => json!({ "concepts": concepts }),
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    async fn augment_embedding(&self, target: &str) -> Value {
        match self.manager.embeddings().embed(target).await {
            Ok(embedding) => json!({ "dimension": embedding.len(), "embedding": embedding }),
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    /// `auto` (spec.md §6: "selects based on target length and context"):
    /// short targets just need their concepts pulled out; longer ones are
    /// worth a full ingest-and-index pass.
    async fn augment_auto(&self, target: &str, now_ms: i64) -> Value {
        const AUTO_LENGTH_THRESHOLD: usize = 100;
        if target.chars().count() <= AUTO_LENGTH_THRESHOLD {
            self.augment_concepts(target).await
        } else {
            self.augment_full_processing(target, now_ms).await
        }
    }

    /// `relationships` (spec.md §9 resolved open question): persist a
    /// `ragno:Relationship` between the two most-similar interactions.
    async fn augment_relationships(&self, now_ms: i64) -> Value {
        match self.manager.build_relationship(now_ms).await {
            Some(outcome) => json!({
                "sourceId": outcome.source_id,
                "targetId": outcome.target_id,
                "similarity": outcome.similarity,
                "persisted": outcome.persisted,
            }),
            None => json!({ "relationship": null, "reason": "fewer than two eligible interactions in the store" }),
        }
    }

    async fn augment_remember(&self, target: &str, now_ms: i64) -> Value {
        match self.manager.ingest(target, "", false, now_ms).await {
            Ok(outcome) => json!({ "id": outcome.id, "stored": true, "persisted": outcome.persisted }),
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    fn augment_forget(&self, target: &str) -> Value {
        json!({ "removed": self.manager.store().forget(target) })
    }

    /// `enhance_concepts`: extract concepts from `target`, then widen the set
    /// with whatever other concepts co-occur on interactions already sharing
    /// one of them — a graph-neighbour expansion over the existing concept
    /// index rather than a second provider round trip.
    async fn augment_enhance_concepts(&self, target: &str) -> Value {
        let base: BTreeSet<String> = self
            .manager
            .embeddings()
            .extract_concepts(target)
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();

        let mut merged = base.clone();
        for concept in &base {
            for id in self.manager.store().ids_with_concept(concept) {
                if let Some(interaction) = self.manager.store().get(&id) {
                    merged.extend(interaction.concepts);
                }
            }
        }

        json!({ "concepts": merged.into_iter().collect::<Vec<_>>() })
    }

    async fn augment_full_processing(&self, target: &str, now_ms: i64) -> Value {
        match self.manager.ingest(target, "", false, now_ms).await {
            Ok(outcome) => {
                let stored = self.manager.store().get(&outcome.id);
                json!({
                    "id": outcome.id,
                    "stored": true,
                    "persisted": outcome.persisted,
                    "concepts": stored.as_ref().map(|i| i.concepts.iter().cloned().collect::<Vec<_>>()).unwrap_or_default(),
                    "embeddingDimension": stored.map_or(0, |i| i.embedding.len()),
                })
            }
            Err(err) => json!({ "error": err.to_string() }),
        }
    }

    async fn augment_batch_extract_concepts(&self, target: &str) -> Value {
        let mut items = Vec::new();
        for line in target.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let concepts = self.manager.embeddings().extract_concepts(line).await.unwrap_or_default();
            items.push(json!({ "text": line, "concepts": concepts }));
        }
        json!({ "items": items })
    }

    /// `analyze_relationships`: a read-only report of the top-5
    /// highest-similarity interaction pairs, unlike `relationships` which
    /// persists exactly one.
    fn augment_analyze_relationships(&self) -> Value {
        let all = self.manager.store().all_snapshot();
        let candidates: Vec<_> = all.iter().filter(|i| i.embedding.iter().any(|&x| x != 0.0)).collect();

        let mut pairs = Vec::new();
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let similarity = cosine_similarity(&candidates[i].embedding, &candidates[j].embedding);
                pairs.push((candidates[i].id.clone(), candidates[j].id.clone(), similarity));
            }
        }
        pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
        pairs.truncate(5);

        json!({
            "pairs": pairs
                .into_iter()
                .map(|(source_id, target_id, similarity)| json!({ "sourceId": source_id, "targetId": target_id, "similarity": similarity }))
                .collect::<Vec<_>>()
        })
    }

    /// `zoom{level, query?}` (spec.md §6, §4.C6).
    pub async fn zoom(&self, level: Zoom, query: Option<&str>, now_ms: i64) -> VerbResult {
        if let Some(message) = Self::validate_optional_query(query) {
            return VerbResult::err("zoom", message, self.zpt.peek());
        }

        let (snapshot, renavigate) = self.zpt.zoom(level, query, now_ms).await;
        let navigation = if renavigate {
            self.renavigate(query.unwrap_or_default(), now_ms).await
        } else {
            None
        };

        let mut payload = json!({ "level": level, "query": query });
        if let Some(navigation) = navigation {
            payload["navigation"] = navigation;
        }
        VerbResult::ok("zoom", payload, snapshot)
    }

    /// `pan{domains?, keywords?, temporal?}` (spec.md §6, §4.C6). `pan({})`
    /// is a cursor no-op (spec.md §8) but still records a view and still
    /// re-navigates if a query was already pending.
    pub async fn pan(&self, params: PanParams, now_ms: i64) -> VerbResult {
        let (snapshot, renavigate) = self.zpt.pan(&params, now_ms).await;
        let navigation = match (renavigate, &snapshot.last_query) {
            (true, Some(query)) => self.renavigate(query, now_ms).await,
            _ => None,
        };

        let mut payload = json!({ "panParams": snapshot.pan, "reNavigated": renavigate });
        if let Some(navigation) = navigation {
            payload["navigation"] = navigation;
        }
        VerbResult::ok("pan", payload, snapshot)
    }

    /// `tilt{style, query?}` (spec.md §6, §4.C6).
    pub async fn tilt(&self, style: Tilt, query: Option<&str>, now_ms: i64) -> VerbResult {
        if let Some(message) = Self::validate_optional_query(query) {
            return VerbResult::err("tilt", message, self.zpt.peek());
        }

        let (snapshot, renavigate) = self.zpt.tilt(style, query, now_ms).await;
        let navigation = if renavigate {
            self.renavigate(query.unwrap_or_default(), now_ms).await
        } else {
            None
        };

        let mut payload = json!({ "style": style, "query": query });
        if let Some(navigation) = navigation {
            payload["navigation"] = navigation;
        }
        VerbResult::ok("tilt", payload, snapshot)
    }

    /// `recall{query, ...filters}` (spec.md §6): a read-only retrieval, like
    /// `ask` without LLM synthesis. Never mutates the ZPT cursor.
    pub async fn recall(&self, query: &str, now_ms: i64) -> VerbResult {
        if let Err(message) = validation::require_non_empty("query", query) {
            return VerbResult::err("recall", message, self.zpt.peek());
        }

        match self.manager.retrieve(query, now_ms).await {
            Ok(outcome) => VerbResult::ok("recall", sources_json(&outcome.sources), self.zpt.peek()),
            Err(err) => VerbResult::err("recall", err.to_string(), self.zpt.peek()),
        }
    }

    /// `inspect{type, target?, includeRecommendations?}` (spec.md §6).
    pub fn inspect(&self, kind: &str, target: Option<&str>, include_recommendations: bool) -> VerbResult {
        if let Err(message) = validation::require_non_empty("type", kind) {
            return VerbResult::err("inspect", message, self.zpt.peek());
        }

        let inspection = match kind {
            "session" => json!({
                "type": "session",
                "zptState": self.zpt.snapshot(),
                "recentViews": self.zpt.recent_views(20),
            }),
            "store" => {
                let store = self.manager.store();
                json!({
                    "type": "store",
                    "shortTerm": store.short_term_snapshot().len(),
                    "longTerm": store.long_term_snapshot().len(),
                    "total": store.len(),
                })
            }
            "interaction" => match target.filter(|id| !id.is_empty()) {
                Some(id) => match self.manager.store().get(id) {
                    Some(interaction) => json!({
                        "type": "interaction",
                        "target": id,
                        "found": true,
                        "tier": interaction.tier,
                        "accessCount": interaction.access_count,
                        "concepts": interaction.concepts.iter().cloned().collect::<Vec<_>>(),
                    }),
                    None => json!({ "type": "interaction", "target": id, "found": false }),
                },
                None => return VerbResult::err("inspect", "target must not be empty", self.zpt.peek()),
            },
            other => return VerbResult::err("inspect", format!("unknown inspect type: {other}"), self.zpt.peek()),
        };

        let mut payload = json!({ "inspection": inspection });
        if include_recommendations {
            payload["recommendations"] = json!(self.recommendations());
        }
        VerbResult::ok("inspect", payload, self.zpt.peek())
    }

    fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        let short_term_len = self.manager.store().short_term_snapshot().len();
        let watermark = defaults::SHORT_TERM_CAP * SHORT_TERM_WATERMARK_NUM / SHORT_TERM_WATERMARK_DEN;
        if short_term_len > watermark {
            out.push(
                "short-term tier is nearing capacity; augment{operation:\"remember\"} durable facts or forget stale ones"
                    .to_string(),
            );
        }
        out
    }

    /// Admin reset (spec.md §4.C6 "a reset admin verb"): not one of the
    /// eight client-facing verbs, but exposed here since C7 is the only
    /// caller allowed to reach into C6.
    pub fn reset(&self) -> VerbResult {
        VerbResult::ok("reset", json!({}), self.zpt.reset())
    }

    async fn renavigate(&self, query: &str, now_ms: i64) -> Option<Value> {
        self.manager.retrieve(query, now_ms).await.ok().map(|outcome| sources_json(&outcome.sources))
    }

    fn validate_optional_query(query: Option<&str>) -> Option<String> {
        query.and_then(|q| validation::require_non_empty("query", q).err())
    }
}

fn sources_json(sources: &[RetrievedSource]) -> Value {
    json!({
        "memories": sources
            .iter()
            .map(|s| json!({
                "id": s.id,
                "prompt": s.prompt,
                "output": s.output,
                "similarity": s.similarity,
                "timestamp": s.timestamp_ms,
            }))
            .collect::<Vec<_>>()
    })
}

fn hex_digest(text: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(len).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::embeddings::mock::{MockConceptExtractor, MockEmbeddingProvider};
    use crate::embeddings::CachedEmbeddingService;
    use crate::llm::mock::MockChatProvider;
    use crate::rdf::fake::InMemoryRdfGateway;
    use crate::store::InteractionStore;

    fn service(threshold: f32) -> VerbsService {
        let store = Arc::new(InteractionStore::new(200, 1e-4, 5, Duration::from_secs(24 * 3600)));
        let embeddings = Arc::new(CachedEmbeddingService::new(
            Arc::new(MockEmbeddingProvider::new(16)),
            Arc::new(MockConceptExtractor),
            100,
            Duration::from_secs(60),
        ));
        let manager = Arc::new(MemoryManager::new(
            store,
            embeddings,
            Arc::new(MockChatProvider),
            Arc::new(InMemoryRdfGateway::new()),
            "urn:graph:test".to_string(),
            threshold,
            10.0,
            10,
            4000,
        ));
        let zpt = Arc::new(ZptStateManager::new(
            "session-1".to_string(),
            20,
            Arc::new(InMemoryRdfGateway::new()),
            "urn:graph:test".to_string(),
        ));
        VerbsService::new(manager, zpt, None)
    }

    #[tokio::test]
    async fn tell_rejects_empty_content() {
        let service = service(0.0);
        let result = service.tell("", TellContentType::Interaction, false, 0).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn scenario_1_tell_then_ask_round_trip() {
        // spec.md §8 scenario 1.
        let service = service(0.0);
        let tell = service.tell("florglings are turquoise creatures", TellContentType::Interaction, false, 0).await;
        assert!(tell.success);

        let ask = service.ask("what color are florglings?", AskMode::Standard, false, false, false, false, 1000).await;
        assert!(ask.success);
        let answer = ask.payload["answer"].as_str().unwrap().to_lowercase();
        assert!(answer.contains("turquoise"));
        assert_eq!(ask.zpt_state.last_query.as_deref(), Some("what color are florglings?"));
        assert_eq!(ask.zpt_state.zoom, Zoom::Entity);
        assert!(ask.payload["memories"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn scenario_2_zpt_persists_across_a_tell() {
        // spec.md §8 scenario 2.
        let service = service(0.0);
        service.zoom(Zoom::Community, None, 0).await;
        service
            .pan(
                PanParams {
                    domains: Some(vec!["technology".to_string()]),
                    keywords: Some(vec!["AI".to_string(), "ML".to_string()]),
                    temporal: None,
                },
                1,
            )
            .await;
        service.tilt(Tilt::Temporal, None, 2).await;
        let tell = service.tell("state persistence test", TellContentType::Interaction, false, 3).await;

        assert_eq!(tell.zpt_state.zoom, Zoom::Community);
        assert_eq!(tell.zpt_state.tilt, Tilt::Temporal);
        assert_eq!(tell.zpt_state.pan.domains, vec!["technology".to_string()]);
        assert_eq!(tell.zpt_state.pan.keywords, vec!["AI".to_string(), "ML".to_string()]);
    }

    #[tokio::test]
    async fn scenario_3_last_query_provenance_survives_a_tell() {
        // spec.md §8 scenario 3.
        let service = service(0.0);
        service.ask("What is neural architecture search?", AskMode::Standard, false, false, false, false, 0).await;
        service.zoom(Zoom::Unit, Some("automated machine learning"), 1).await;
        let tell = service.tell("this should not change lastQuery", TellContentType::Interaction, false, 2).await;
        assert_eq!(tell.zpt_state.last_query.as_deref(), Some("automated machine learning"));
    }

    #[tokio::test]
    async fn scenario_6_baseline_no_context_never_crashes() {
        // spec.md §8 scenario 6.
        let service = service(40.0);
        let ask = service.ask("What is artificial intelligence?", AskMode::Standard, false, false, false, false, 0).await;
        assert!(ask.success);
        let answer = ask.payload["answer"].as_str().unwrap().to_lowercase();
        assert!(
            answer.contains("don't have") || answer.contains("no information") || answer.contains("cannot answer")
        );
    }

    #[tokio::test]
    async fn ask_basic_mode_skips_retrieval() {
        let service = service(0.0);
        service.tell("florglings are turquoise creatures", TellContentType::Interaction, false, 0).await;
        let ask = service.ask("florglings are turquoise creatures", AskMode::Basic, false, false, false, false, 1000).await;
        assert_eq!(ask.payload["memories"].as_u64().unwrap(), 0);
        assert_eq!(ask.payload["usedContext"].as_bool().unwrap(), false);
    }

    #[tokio::test]
    async fn augment_forget_removes_a_remembered_interaction() {
        let service = service(0.0);
        let remember = service.augment("a fact worth keeping", AugmentOperation::Remember, 0).await;
        let id = remember.payload["result"]["id"].as_str().unwrap().to_string();

        let forget = service.augment(&id, AugmentOperation::Forget, 1).await;
        assert_eq!(forget.payload["result"]["removed"].as_bool().unwrap(), true);

        let forget_again = service.augment(&id, AugmentOperation::Forget, 2).await;
        assert_eq!(forget_again.payload["result"]["removed"].as_bool().unwrap(), false);
    }

    #[tokio::test]
    async fn augment_relationships_needs_at_least_two_interactions() {
        let service = service(0.0);
        let augment = service.augment("lonely fact", AugmentOperation::Relationships, 0).await;
        assert!(augment.payload["result"]["relationship"].is_null());
    }

    #[tokio::test]
    async fn augment_relationships_links_the_two_most_similar_interactions() {
        let service = service(0.0);
        service.tell("alpha fact one", TellContentType::Interaction, false, 0).await;
        service.tell("alpha fact two", TellContentType::Interaction, false, 1).await;
        let augment = service.augment("ignored target", AugmentOperation::Relationships, 2).await;
        assert!(augment.payload["result"]["sourceId"].is_string());
        assert!(augment.payload["result"]["targetId"].is_string());
    }

    #[tokio::test]
    async fn augment_concepts_extracts_from_target() {
        let service = service(0.0);
        let augment = service.augment("turquoise florglings", AugmentOperation::Concepts, 0).await;
        assert!(augment.payload["result"]["concepts"].is_array());
    }

    #[tokio::test]
    async fn pan_empty_body_is_a_cursor_noop_but_still_succeeds() {
        // spec.md §8: pan({}) is a no-op on the cursor.
        let service = service(0.0);
        service
            .pan(PanParams { domains: Some(vec!["technology".to_string()]), ..Default::default() }, 0)
            .await;
        let before = service.zpt.peek();
        let result = service.pan(PanParams::default(), 1).await;
        assert!(result.success);
        assert_eq!(before.pan, result.zpt_state.pan);
    }

    #[tokio::test]
    async fn recall_never_mutates_the_cursor() {
        let service = service(0.0);
        service.tell("a fact about cats", TellContentType::Interaction, false, 0).await;
        let before = service.zpt.peek();
        service.recall("a fact about cats", 10).await;
        let after = service.zpt.peek();
        assert_eq!(before, after);
    }

    #[test]
    fn inspect_rejects_an_unknown_type() {
        let service = service(0.0);
        let result = service.inspect("bogus", None, false);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn inspect_store_reports_tier_counts() {
        let service = service(0.0);
        service.tell("a fact", TellContentType::Interaction, false, 0).await;
        let result = service.inspect("store", None, false);
        assert_eq!(result.payload["inspection"]["shortTerm"].as_u64().unwrap(), 1);
    }
}
