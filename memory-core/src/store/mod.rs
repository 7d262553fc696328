//! Interaction Store (spec.md §4.C3): short/long-term tiers, the concept
//! inverted index, and the retention-based eviction/promotion rules.
//!
//! Owns the process-wide interaction set and concept index (spec.md §3's
//! ownership rules say C5 owns these; in practice C5's [`crate::manager`]
//! holds an `Arc<InteractionStore>` and this type is where the structural
//! mutation actually happens). `parking_lot::RwLock` guards the map — these
//! are short, non-async critical sections, never held across an `.await`.

pub mod eviction;
pub mod retention;

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::{Interaction, Tier};

struct StoreInner {
    interactions: HashMap<String, Interaction>,
    concept_index: HashMap<String, BTreeSet<String>>,
}

impl StoreInner {
    fn index_concepts(&mut self, interaction: &Interaction) {
        for concept in &interaction.concepts {
            self.concept_index
                .entry(concept.clone())
                .or_default()
                .insert(interaction.id.clone());
        }
    }

    fn unindex_concepts(&mut self, interaction: &Interaction) {
        for concept in &interaction.concepts {
            if let Some(ids) = self.concept_index.get_mut(concept) {
                ids.remove(&interaction.id);
                if ids.is_empty() {
                    self.concept_index.remove(concept);
                }
            }
        }
    }
}

pub struct InteractionStore {
    inner: RwLock<StoreInner>,
    short_term_cap: usize,
    decay_rate_per_hour: f32,
    promotion_threshold: u64,
    promotion_age: Duration,
}

impl InteractionStore {
    #[must_use]
    pub fn new(
        short_term_cap: usize,
        decay_rate_per_hour: f32,
        promotion_threshold: u64,
        promotion_age: Duration,
    ) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                interactions: HashMap::new(),
                concept_index: HashMap::new(),
            }),
            short_term_cap,
            decay_rate_per_hour,
            promotion_threshold,
            promotion_age,
        }
    }

    /// Insert a freshly-ingested interaction into the short-term tier, then
    /// atomically evict the lowest-scoring short-term entry if the cap was
    /// exceeded. Returns the id of whatever was evicted, if anything.
    pub fn insert_short_term(&self, interaction: Interaction, now_ms: i64) -> Option<String> {
        let mut inner = self.inner.write();
        inner.index_concepts(&interaction);
        inner.interactions.insert(interaction.id.clone(), interaction);
        self.evict_if_needed(&mut inner, now_ms)
    }

    fn evict_if_needed(&self, inner: &mut StoreInner, now_ms: i64) -> Option<String> {
        let short_term_count = inner
            .interactions
            .values()
            .filter(|i| i.tier == Tier::ShortTerm)
            .count();
        if short_term_count <= self.short_term_cap {
            return None;
        }

        let candidate = {
            let entries = inner
                .interactions
                .iter()
                .filter(|(_, i)| i.tier == Tier::ShortTerm);
            eviction::select_eviction_candidate(entries, now_ms, self.decay_rate_per_hour)
        }?;

        if let Some(removed) = inner.interactions.remove(&candidate) {
            inner.unindex_concepts(&removed);
        }
        Some(candidate)
    }

    /// Record an access: increments `access_count`, then promotes the
    /// interaction to `long-term` if it now meets the promotion predicate.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `id` is not in the store.
    pub fn touch(&self, id: &str, now_ms: i64) -> Result<()> {
        let mut inner = self.inner.write();
        let age_hours = {
            let interaction = inner
                .interactions
                .get_mut(id)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown interaction id: {id}")))?;
            interaction.access_count += 1;
            interaction.age_hours(now_ms)
        };

        let promotion_age_hours = self.promotion_age.as_secs_f32() / 3600.0;
        let (access_count, tier) = {
            let interaction = &inner.interactions[id];
            (interaction.access_count, interaction.tier)
        };

        if tier == Tier::ShortTerm
            && retention::is_promotion_eligible(access_count, age_hours, self.promotion_threshold, promotion_age_hours)
        {
            if let Some(interaction) = inner.interactions.get_mut(id) {
                interaction.tier = Tier::LongTerm;
            }
        }
        Ok(())
    }

    /// Explicit promotion check, independent of `touch` (used by
    /// maintenance sweeps that age entries into long-term without a fresh
    /// access). Returns whether a promotion happened.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `id` is not in the store.
    pub fn promote(&self, id: &str, now_ms: i64) -> Result<bool> {
        let mut inner = self.inner.write();
        let interaction = inner
            .interactions
            .get(id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown interaction id: {id}")))?;

        if interaction.tier == Tier::LongTerm {
            return Ok(false);
        }
        let age_hours = interaction.age_hours(now_ms);
        let promotion_age_hours = self.promotion_age.as_secs_f32() / 3600.0;
        let eligible = retention::is_promotion_eligible(
            interaction.access_count,
            age_hours,
            self.promotion_threshold,
            promotion_age_hours,
        );
        if eligible {
            inner.interactions.get_mut(id).unwrap().tier = Tier::LongTerm;
        }
        Ok(eligible)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Interaction> {
        self.inner.read().interactions.get(id).cloned()
    }

    /// Remove an interaction from whichever tier holds it, for
    /// `augment{operation:"forget"}` (spec.md §4.C7). Returns whether
    /// anything was actually removed.
    pub fn forget(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        if let Some(removed) = inner.interactions.remove(id) {
            inner.unindex_concepts(&removed);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn short_term_snapshot(&self) -> Vec<Interaction> {
        self.inner
            .read()
            .interactions
            .values()
            .filter(|i| i.tier == Tier::ShortTerm)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn long_term_snapshot(&self) -> Vec<Interaction> {
        self.inner
            .read()
            .interactions
            .values()
            .filter(|i| i.tier == Tier::LongTerm)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn all_snapshot(&self) -> Vec<Interaction> {
        self.inner.read().interactions.values().cloned().collect()
    }

    /// Ids carrying a given concept, used by retrieval's concept-boost step.
    #[must_use]
    pub fn ids_with_concept(&self, concept: &str) -> BTreeSet<String> {
        self.inner
            .read()
            .concept_index
            .get(concept)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the whole store with a previously-saved snapshot (used when
    /// `storage.type = json` loads its persisted file at startup).
    pub fn load_history(&self, interactions: Vec<Interaction>) {
        let mut inner = self.inner.write();
        inner.interactions.clear();
        inner.concept_index.clear();
        for interaction in interactions {
            inner.index_concepts(&interaction);
            inner.interactions.insert(interaction.id.clone(), interaction);
        }
    }

    /// Snapshot the whole store for persistence (used by `storage.type =
    /// json`'s save path).
    #[must_use]
    pub fn save_history(&self) -> Vec<Interaction> {
        self.all_snapshot()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().interactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(id: &str, timestamp_ms: i64, concepts: &[&str]) -> Interaction {
        Interaction::new(
            id.to_string(),
            format!("prompt-{id}"),
            format!("output-{id}"),
            vec![0.1, 0.2],
            concepts.iter().map(|s| (*s).to_string()).collect(),
            timestamp_ms,
        )
    }

    #[test]
    fn insert_and_get_round_trips() {
        let store = InteractionStore::new(200, 1e-4, 5, Duration::from_secs(24 * 3600));
        store.insert_short_term(interaction("a", 0, &["color"]), 0);
        let fetched = store.get("a").unwrap();
        assert_eq!(fetched.tier, Tier::ShortTerm);
        assert_eq!(fetched.access_count, 1);
    }

    #[test]
    fn eviction_fires_when_short_term_cap_exceeded() {
        // Scenario 5 (spec.md §8): cap 3, tell A,B,C,D, touch A, expect B evicted.
        // B and C get distinct timestamps (as eviction.rs's sibling test does)
        // so their tied retention score breaks deterministically on the
        // oldest timestamp, rather than on HashMap iteration order.
        let store = InteractionStore::new(3, 1e-4, 5, Duration::from_secs(24 * 3600));
        store.insert_short_term(interaction("A", 0, &[]), 0);
        store.insert_short_term(interaction("B", 0, &[]), 1);
        store.insert_short_term(interaction("C", 1, &[]), 2);
        store.touch("A", 4).unwrap();
        let evicted = store.insert_short_term(interaction("D", 2, &[]), 4);
        assert_eq!(evicted, Some("B".to_string()));
        assert!(store.get("A").is_some());
        assert!(store.get("B").is_none());
        assert!(store.get("C").is_some());
        assert!(store.get("D").is_some());
    }

    #[test]
    fn touch_promotes_once_threshold_and_age_are_both_met() {
        let store = InteractionStore::new(200, 1e-4, 2, Duration::from_secs(3600));
        let two_hours_ms = 2 * 3_600_000;
        store.insert_short_term(interaction("a", 0, &[]), 0);
        store.touch("a", two_hours_ms).unwrap();
        assert_eq!(store.get("a").unwrap().tier, Tier::LongTerm);
    }

    #[test]
    fn touch_does_not_promote_before_threshold() {
        let store = InteractionStore::new(200, 1e-4, 5, Duration::from_secs(24 * 3600));
        store.insert_short_term(interaction("a", 0, &[]), 0);
        store.touch("a", 1000).unwrap();
        assert_eq!(store.get("a").unwrap().tier, Tier::ShortTerm);
    }

    #[test]
    fn touch_on_unknown_id_is_invalid_argument() {
        let store = InteractionStore::new(200, 1e-4, 5, Duration::from_secs(24 * 3600));
        let err = store.touch("missing", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn concept_index_supports_lookup_and_is_cleared_on_eviction() {
        let store = InteractionStore::new(1, 1e-4, 5, Duration::from_secs(24 * 3600));
        store.insert_short_term(interaction("a", 0, &["turquoise"]), 0);
        assert_eq!(store.ids_with_concept("turquoise").len(), 1);
        store.insert_short_term(interaction("b", 1, &["crimson"]), 1);
        assert!(store.ids_with_concept("turquoise").is_empty());
    }

    #[test]
    fn forget_removes_the_interaction_and_its_concept_index_entries() {
        let store = InteractionStore::new(200, 1e-4, 5, Duration::from_secs(24 * 3600));
        store.insert_short_term(interaction("a", 0, &["turquoise"]), 0);
        assert!(store.forget("a"));
        assert!(store.get("a").is_none());
        assert!(store.ids_with_concept("turquoise").is_empty());
        assert!(!store.forget("a"));
    }

    #[test]
    fn load_history_replaces_store_contents() {
        let store = InteractionStore::new(200, 1e-4, 5, Duration::from_secs(24 * 3600));
        store.insert_short_term(interaction("a", 0, &[]), 0);
        store.load_history(vec![interaction("b", 0, &["new"])]);
        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
        assert_eq!(store.ids_with_concept("new").len(), 1);
    }
}
