//! Memory Manager (spec.md §4.C5): orchestrates `tell` (ingest) and `ask`
//! (retrieve + answer), the only component that talks to C1 (embeddings), C3
//! (the interaction store) and C4 (retrieval) in the same call.

pub mod context;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::constants::strings;
use crate::embeddings::CachedEmbeddingService;
use crate::error::Result;
use crate::llm::{synthesis_prompt, ChatProvider};
use crate::rdf::{escape, templates, RdfGateway, TemplateValue};
use crate::retrieval::{self, RankedCandidate};
use crate::store::InteractionStore;
use crate::types::{Interaction, Tier};

pub use context::ContextBudget;

/// Outcome of `ingest` (spec.md §4.C5 / §7's `persisted: false` fallback).
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub id: String,
    pub persisted: bool,
}

/// One retrieved source, the shape surfaced in `recall`'s memory list and
/// `retrieve`'s formatted context (spec.md §4.C5, §6 `recall`).
#[derive(Debug, Clone)]
pub struct RetrievedSource {
    pub id: String,
    pub prompt: String,
    pub output: String,
    pub similarity: f32,
    pub timestamp_ms: i64,
}

/// Outcome of `retrieve`: the deterministic context string plus its sources,
/// ordered by score descending (spec.md §4.C5 step 5).
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub context: String,
    pub sources: Vec<RetrievedSource>,
}

/// Outcome of `answer`: `retrieve` followed by LLM synthesis (spec.md §4.C5).
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub used_context: bool,
    pub sources: Vec<RetrievedSource>,
}

/// Outcome of `augment{operation:"relationships"}` (spec.md §4.C7/§9).
#[derive(Debug, Clone)]
pub struct RelationshipOutcome {
    pub source_id: String,
    pub target_id: String,
    pub similarity: f32,
    pub persisted: bool,
}

/// Orchestrates C1/C3/C4 for `tell` and `ask` (spec.md §4.C5).
pub struct MemoryManager {
    store: Arc<InteractionStore>,
    embeddings: Arc<CachedEmbeddingService>,
    chat: Arc<dyn ChatProvider>,
    rdf: Arc<dyn RdfGateway>,
    graph_iri: String,
    similarity_threshold: f32,
    concept_weight: f32,
    retrieval_limit: usize,
    max_context_tokens: usize,
}

impl MemoryManager {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<InteractionStore>,
        embeddings: Arc<CachedEmbeddingService>,
        chat: Arc<dyn ChatProvider>,
        rdf: Arc<dyn RdfGateway>,
        graph_iri: String,
        similarity_threshold: f32,
        concept_weight: f32,
        retrieval_limit: usize,
        max_context_tokens: usize,
    ) -> Self {
        Self {
            store,
            embeddings,
            chat,
            rdf,
            graph_iri,
            similarity_threshold,
            concept_weight,
            retrieval_limit,
            max_context_tokens,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<InteractionStore> {
        &self.store
    }

    #[must_use]
    pub fn embeddings(&self) -> &Arc<CachedEmbeddingService> {
        &self.embeddings
    }

    /// `augment{operation:"relationships"}` (spec.md §4.C7, §9 resolved open
    /// question): find the two most-similar interactions currently in the
    /// store (by cosine over their embeddings, ties broken by insertion
    /// order, zero-vector/lazy interactions excluded) and persist a
    /// `ragno:Relationship` triple between them.
    ///
    /// Returns `None` when fewer than two non-zero-vector interactions
    /// exist. Persistence failure is reported via the returned `persisted`
    /// flag rather than failing the call (spec.md §7's `StoreUnavailable`
    /// degrade-but-succeed path).
    pub async fn build_relationship(&self, now_ms: i64) -> Option<RelationshipOutcome> {
        let all = self.store.all_snapshot();
        let candidates: Vec<&Interaction> = all.iter().filter(|i| i.embedding.iter().any(|&x| x != 0.0)).collect();

        let mut best: Option<(usize, usize, f32)> = None;
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let sim = crate::embeddings::cosine_similarity(&candidates[i].embedding, &candidates[j].embedding);
                if best.is_none_or(|(_, _, best_sim)| sim > best_sim) {
                    best = Some((i, j, sim));
                }
            }
        }

        let (i, j, similarity) = best?;
        let (a, b) = (candidates[i], candidates[j]);
        let persisted = self.persist_relationship(a, b, similarity, now_ms).await;

        Some(RelationshipOutcome {
            source_id: a.id.clone(),
            target_id: b.id.clone(),
            similarity,
            persisted,
        })
    }

    async fn persist_relationship(&self, a: &Interaction, b: &Interaction, similarity: f32, now_ms: i64) -> bool {
        let Ok(graph_iri) = escape::format_iri(&self.graph_iri) else {
            return false;
        };
        let Ok(subject_iri) = escape::format_iri(&format!("urn:relationship:{}:{}:{now_ms}", a.id, b.id)) else {
            return false;
        };
        let Ok(source_iri) = escape::format_iri(&format!("urn:interaction:{}", a.id)) else {
            return false;
        };
        let Ok(target_iri) = escape::format_iri(&format!("urn:interaction:{}", b.id)) else {
            return false;
        };

        let query = format!(
            "PREFIX ragno: <http://purl.org/stuff/ragno/> INSERT DATA {{ GRAPH {graph_iri} {{ \
             {subject_iri} a ragno:Relationship ; ragno:source {source_iri} ; ragno:target {target_iri} ; \
             ragno:weight {similarity} }} }}"
        );

        if let Err(err) = self.rdf.execute_update(&query).await {
            tracing::warn!(error = %err, "relationship not persisted");
            return false;
        }
        true
    }

    /// Derive a stable id from `prompt || \0 || timestamp` (spec.md §4.C5
    /// step 1), truncated to the SHA-256 prefix the spec calls for.
    #[must_use]
    pub fn derive_id(prompt: &str, now_ms: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(now_ms.to_be_bytes());
        let digest = hasher.finalize();
        hex_prefix(&digest, 16)
    }

    /// `tell` → `ingest` (spec.md §4.C5): embed, extract concepts, build an
    /// `Interaction`, hand to C3 under its write lock (which runs eviction
    /// atomically), then best-effort persist to the RDF store.
    ///
    /// `lazy = true` skips embedding and concept extraction entirely (spec.md
    /// §9's resolved open question: the interaction still lands in
    /// short-term, with a zero vector and no concepts — excluded from cosine
    /// ranking, per spec.md §4.C4's zero-vector edge case, but left in place
    /// for a keyword fallback over `prompt`/`output`).
    ///
    /// # Errors
    /// Returns [`crate::Error::ProviderUnavailable`] if embedding fails for a
    /// non-lazy `tell`; concept-extraction failure is downgraded to an empty
    /// set rather than aborting the ingest (spec.md §4.C1).
    pub async fn ingest(&self, prompt: &str, output: &str, lazy: bool, now_ms: i64) -> Result<IngestOutcome> {
        let id = Self::derive_id(prompt, now_ms);

        let (embedding, concepts): (Vec<f32>, BTreeSet<String>) = if lazy {
            (vec![0.0; self.embeddings.embedding_dimension()], BTreeSet::new())
        } else {
            let embedding = self.embeddings.embed(prompt).await?;
            let combined = format!("{prompt} {output}");
            let concepts = self.embeddings.extract_concepts(&combined).await.unwrap_or_default();
            (embedding, concepts.into_iter().collect())
        };

        let interaction = Interaction::new(id.clone(), prompt.to_string(), output.to_string(), embedding, concepts, now_ms);
        let persisted = self.persist_interaction(&interaction).await;
        self.store.insert_short_term(interaction, now_ms);

        Ok(IngestOutcome { id, persisted })
    }

    async fn persist_interaction(&self, interaction: &Interaction) -> bool {
        let subject = format!("urn:interaction:{}", interaction.id);
        let tier = match interaction.tier {
            Tier::ShortTerm => "\"short-term\"",
            Tier::LongTerm => "\"long-term\"",
        };

        let mut vars: HashMap<&str, TemplateValue> = HashMap::new();
        vars.insert("graph", TemplateValue::Iri(self.graph_iri.clone()));
        vars.insert("subject", TemplateValue::Iri(subject.clone()));
        vars.insert("prompt", TemplateValue::Literal(interaction.prompt.clone()));
        vars.insert("output", TemplateValue::Literal(interaction.output.clone()));
        vars.insert("tier", TemplateValue::Raw(tier.to_string()));
        vars.insert("created", TemplateValue::Raw(interaction.timestamp_ms.to_string()));

        let Ok(query) = templates::insert_interaction().render(&vars) else {
            tracing::warn!(id = %interaction.id, "failed to render interaction insert template");
            return false;
        };

        if let Err(err) = self.rdf.execute_update(&query).await {
            tracing::warn!(id = %interaction.id, error = %err, "interaction kept in memory only, rdf sink unavailable");
            return false;
        }

        let Ok(graph_iri) = escape::format_iri(&self.graph_iri) else {
            return true;
        };
        for concept in &interaction.concepts {
            let Ok(subject_iri) = escape::format_iri(&subject) else { continue };
            let concept_query = format!(
                "PREFIX ragno: <http://purl.org/stuff/ragno/> INSERT DATA {{ GRAPH {graph_iri} {{ {subject_iri} ragno:concept {} }} }}",
                escape::escape_literal(concept)
            );
            if let Err(err) = self.rdf.execute_update(&concept_query).await {
                tracing::warn!(id = %interaction.id, concept, error = %err, "concept triple not persisted");
            }
        }

        true
    }

    /// `ask`'s retrieval step (spec.md §4.C5 `retrieve`): embed the question,
    /// extract its concepts, rank short-term then long-term candidates,
    /// merge/re-sort, cap by the token budget, touch every returned
    /// interaction, then format the deterministic context string.
    ///
    /// # Errors
    /// Returns [`crate::Error::ProviderUnavailable`] if embedding the
    /// question fails.
    pub async fn retrieve(&self, question: &str, now_ms: i64) -> Result<RetrievalOutcome> {
        let query_embedding = self.embeddings.embed(question).await?;
        let query_concepts = self.embeddings.extract_concepts(question).await.unwrap_or_default();

        let mut ranked: Vec<RankedCandidate> = retrieval::retrieve(
            &query_embedding,
            &query_concepts,
            &self.store.short_term_snapshot(),
            self.similarity_threshold,
            self.retrieval_limit,
            self.concept_weight,
        );
        ranked.extend(retrieval::retrieve(
            &query_embedding,
            &query_concepts,
            &self.store.long_term_snapshot(),
            self.similarity_threshold,
            self.retrieval_limit,
            self.concept_weight,
        ));
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.retrieval_limit);

        let mut budget = ContextBudget::new(self.max_context_tokens);
        let mut sources = Vec::new();
        let mut included_ids: HashSet<String> = HashSet::new();
        for candidate in ranked {
            let cost = ContextBudget::estimate_tokens(&candidate.interaction.prompt)
                + ContextBudget::estimate_tokens(&candidate.interaction.output);
            if !budget.try_spend(cost) && !sources.is_empty() {
                break;
            }

            let _ = self.store.touch(&candidate.interaction.id, now_ms);
            included_ids.insert(candidate.interaction.id.clone());
            sources.push(RetrievedSource {
                id: candidate.interaction.id,
                prompt: candidate.interaction.prompt,
                output: candidate.interaction.output,
                similarity: candidate.score,
                timestamp_ms: candidate.interaction.timestamp_ms,
            });
        }

        self.keyword_fallback(question, &mut sources, &mut included_ids, &mut budget, now_ms);

        let context = format_context(question, &sources);
        Ok(RetrievalOutcome { context, sources })
    }

    /// Reaches `lazy`-told interactions (stored with a zero vector, excluded
    /// from cosine ranking per spec.md §4.C4) via a plain substring match
    /// over `prompt`/`output` (spec.md §9's unnamed "keyword fallback").
    fn keyword_fallback(
        &self,
        question: &str,
        sources: &mut Vec<RetrievedSource>,
        included_ids: &mut HashSet<String>,
        budget: &mut ContextBudget,
        now_ms: i64,
    ) {
        let needle = question.trim().to_lowercase();
        if needle.is_empty() {
            return;
        }

        let mut matches: Vec<Interaction> = self
            .store
            .all_snapshot()
            .into_iter()
            .filter(|i| !included_ids.contains(&i.id))
            .filter(|i| i.embedding.iter().all(|&x| x == 0.0))
            .filter(|i| {
                i.prompt.to_lowercase().contains(&needle) || i.output.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by_key(|i| i.timestamp_ms);

        for interaction in matches {
            let cost = ContextBudget::estimate_tokens(&interaction.prompt)
                + ContextBudget::estimate_tokens(&interaction.output);
            if !budget.try_spend(cost) && !sources.is_empty() {
                break;
            }

            let _ = self.store.touch(&interaction.id, now_ms);
            included_ids.insert(interaction.id.clone());
            sources.push(RetrievedSource {
                id: interaction.id,
                prompt: interaction.prompt,
                output: interaction.output,
                similarity: 0.0,
                timestamp_ms: interaction.timestamp_ms,
            });
        }
    }

    /// `ask{mode:"basic"}` (spec.md §4.C7: "basic (no retrieval)"): send the
    /// bare question straight to the LLM, skipping C3/C4 entirely.
    pub async fn basic_answer(&self, question: &str) -> String {
        let prompt = synthesis_prompt(question, None);
        match self.chat.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => strings::NO_CONTEXT_ANSWER.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "chat synthesis failed for basic ask");
                strings::SYNTHESIS_FAILED_ANSWER.to_string()
            }
        }
    }

    /// `answer` = `retrieve` → LLM generate with the stable synthesis prompt
    /// (spec.md §4.C5). Falls back to a "no-context" answer if retrieval
    /// itself failed but the LLM is reachable, and to the stock "cannot
    /// answer" string if the LLM step fails (spec.md §7).
    pub async fn answer(&self, question: &str, now_ms: i64) -> AnswerOutcome {
        let retrieval = self.retrieve(question, now_ms).await;
        let (context, sources, used_context) = match retrieval {
            Ok(outcome) if !outcome.sources.is_empty() => {
                let ctx = outcome.context.clone();
                (Some(ctx), outcome.sources, true)
            }
            Ok(outcome) => (None, outcome.sources, false),
            Err(err) => {
                tracing::warn!(error = %err, "retrieval failed for ask, falling back to no-context answer");
                (None, Vec::new(), false)
            }
        };

        let prompt = synthesis_prompt(question, context.as_deref());
        let answer = match self.chat.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => strings::NO_CONTEXT_ANSWER.to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "chat synthesis failed");
                strings::SYNTHESIS_FAILED_ANSWER.to_string()
            }
        };

        AnswerOutcome {
            answer,
            used_context,
            sources,
        }
    }
}

/// Format the deterministic context string (spec.md §4.C5 step 5): a fixed
/// header followed by one `- <prompt>: <output[:200]>…` line per source, in
/// score-descending order.
#[must_use]
pub fn format_context(question: &str, sources: &[RetrievedSource]) -> String {
    let mut out = format!("Question: {question}\nRelevant context:\n");
    for source in sources {
        let truncated: String = source.output.chars().take(200).collect();
        out.push_str(&format!("- {}: {}…\n", source.prompt, truncated));
    }
    out
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes.iter().take(len).map(|b| format!("{b:02x}")).collect()
}
