//! Eviction candidate selection, separated from [`super::InteractionStore`]
//! so the "lowest retention score wins" rule is independently testable
//! (spec.md §4.C3, §8 scenario 5).

use super::retention::retention_score;
use crate::types::Interaction;

/// Pick the id of the short-term interaction with the lowest retention
/// score. Ties break on the oldest `timestamp_ms` (furthest-back first),
/// which keeps eviction deterministic for equally-scored candidates.
#[must_use]
pub fn select_eviction_candidate<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Interaction)>,
    now_ms: i64,
    decay_rate_per_hour: f32,
) -> Option<String> {
    entries
        .map(|(id, interaction)| {
            let age_hours = interaction.age_hours(now_ms);
            let score = retention_score(
                interaction.access_count,
                interaction.decay_factor,
                age_hours,
                decay_rate_per_hour,
            );
            (id, score, interaction.timestamp_ms)
        })
        .min_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        })
        .map(|(id, _, _)| id.clone())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn interaction(id: &str, access_count: u64, timestamp_ms: i64) -> Interaction {
        let mut i = Interaction::new(
            id.to_string(),
            "p".into(),
            "o".into(),
            vec![],
            BTreeSet::new(),
            timestamp_ms,
        );
        i.access_count = access_count;
        i
    }

    #[test]
    fn lowest_scoring_candidate_is_selected() {
        let a = interaction("a", 10, 0);
        let b = interaction("b", 1, 0);
        let c = interaction("c", 5, 0);
        let entries = vec![("a".to_string(), a), ("b".to_string(), b), ("c".to_string(), c)];
        let refs: Vec<(&String, &Interaction)> = entries.iter().map(|(k, v)| (k, v)).collect();
        let selected = select_eviction_candidate(refs.into_iter(), 0, 1e-4);
        assert_eq!(selected, Some("b".to_string()));
    }

    #[test]
    fn touched_entry_is_not_selected_over_untouched_peers() {
        // Scenario 5 (spec.md §8): tell A,B,C,D with cap 3, touch A, expect B evicted.
        let a = interaction("A", 5, 0);
        let b = interaction("B", 1, 0);
        let c = interaction("C", 1, 1);
        let d = interaction("D", 1, 2);
        let entries = vec![
            ("A".to_string(), a),
            ("B".to_string(), b),
            ("C".to_string(), c),
            ("D".to_string(), d),
        ];
        let refs: Vec<(&String, &Interaction)> = entries.iter().map(|(k, v)| (k, v)).collect();
        let selected = select_eviction_candidate(refs.into_iter(), 2, 1e-4);
        assert_eq!(selected, Some("B".to_string()));
    }

    #[test]
    fn empty_store_has_no_candidate() {
        let entries: Vec<(&String, &Interaction)> = Vec::new();
        assert_eq!(select_eviction_candidate(entries.into_iter(), 0, 1e-4), None);
    }
}
