//! Whitespace-token budget helper for `retrieve`'s `maxContextTokens` cap
//! (spec.md §4.C5). Documented as a heuristic: a real tokenizer is an
//! external-model concern (spec.md §1), so this counts whitespace-delimited
//! words as a stand-in "token" — good enough to bound context size without
//! pulling in a tokenizer dependency the rest of the engine doesn't need.

pub struct ContextBudget {
    remaining: usize,
}

impl ContextBudget {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self { remaining: total }
    }

    #[must_use]
    pub fn estimate_tokens(text: &str) -> usize {
        text.split_whitespace().count().max(1)
    }

    /// Deduct `cost` from the remaining budget, returning whether it fit.
    /// Still deducts (saturating at zero) even when it doesn't fit, so a
    /// caller choosing to keep the item anyway converges on empty budget.
    pub fn try_spend(&mut self, cost: usize) -> bool {
        let fits = cost <= self.remaining;
        self.remaining = self.remaining.saturating_sub(cost);
        fits
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}
