/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds for the semantic-memory engine.
///
/// Variants map to the error kinds a verb invocation can surface: a missing
/// or malformed argument, an unreachable provider/store, a lost race between
/// promotion and eviction, a rejected-but-non-fatal policy outcome, or a
/// condition severe enough to end the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing/empty required field, invalid enum value, or wrong-length vector.
    /// Never retried; surfaced as an HTTP-400-equivalent envelope.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Embedding, chat/LLM, RDF, or enhancement-pipeline transport error or
    /// timeout. Retried once with exponential backoff before surfacing.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The RDF store gateway (or a persistence-backed verb) failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A promotion raced with an eviction on the same interaction.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Non-fatal policy outcome: retention-score tie, empty candidate set, etc.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// Process-ending condition: memory budget exhausted, wrong embedding
    /// dimension at startup.
    #[error("fatal: {0}")]
    Fatal(String),

    /// JSON (de)serialization failure, e.g. loading/saving `storage.type = json`.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure reading configuration, templates, or a JSON snapshot file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller should retry this error with backoff (spec.md §7).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::ProviderUnavailable(_) | Error::StoreUnavailable(_) => true,
            Error::ConcurrencyConflict(_) => true,
            Error::InvalidArgument(_) | Error::PolicyViolation(_) | Error::Fatal(_) => false,
            Error::Serialization(_) | Error::Io(_) => false,
        }
    }

    /// Whether this error is the soft-failure shape the caller may downgrade
    /// to an empty/default result rather than abort (e.g. concept extraction
    /// failure during `tell`).
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::ProviderUnavailable(_) | Error::PolicyViolation(_))
    }
}
