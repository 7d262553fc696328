//! Pure retention-scoring function, kept independent of the store's locking
//! and indexing so it can be unit-tested in isolation (spec.md §4.C3).

/// `accessCount × decayFactor × recencyBoost`, where
/// `recencyBoost = exp(-age_hours × decayRate)`.
///
/// Higher is "keep", lower is "evict first".
#[must_use]
pub fn retention_score(access_count: u64, decay_factor: f32, age_hours: f32, decay_rate_per_hour: f32) -> f32 {
    let recency_boost = (-age_hours * decay_rate_per_hour).exp();
    access_count as f32 * decay_factor * recency_boost
}

/// Whether an interaction meets the promotion predicate: accessed at least
/// `promotion_threshold` times AND at least `promotion_age` old.
#[must_use]
pub fn is_promotion_eligible(access_count: u64, age_hours: f32, promotion_threshold: u64, promotion_age_hours: f32) -> bool {
    access_count >= promotion_threshold && age_hours >= promotion_age_hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_interaction_has_recency_boost_near_one() {
        let score = retention_score(1, 1.0, 0.0, 1e-4);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn older_interaction_scores_lower_than_fresher_one_with_same_access_count() {
        let fresh = retention_score(3, 1.0, 1.0, 1e-4);
        let old = retention_score(3, 1.0, 1000.0, 1e-4);
        assert!(fresh > old);
    }

    #[test]
    fn more_accesses_score_higher_all_else_equal() {
        let once = retention_score(1, 1.0, 10.0, 1e-4);
        let often = retention_score(10, 1.0, 10.0, 1e-4);
        assert!(often > once);
    }

    #[test]
    fn promotion_requires_both_access_count_and_age() {
        assert!(!is_promotion_eligible(5, 10.0, 5, 24.0));
        assert!(!is_promotion_eligible(2, 48.0, 5, 24.0));
        assert!(is_promotion_eligible(5, 24.0, 5, 24.0));
        assert!(is_promotion_eligible(9, 100.0, 5, 24.0));
    }
}
