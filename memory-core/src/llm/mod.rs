//! Chat/LLM provider seam used by [`crate::manager`]'s `answer` step
//! (spec.md §4.C5 "LLM generate with a stable prompt template").
//!
//! The LLM itself is an external collaborator (spec.md §1); this module only
//! specifies the interface the rest of the engine depends on, plus a
//! deterministic mock and an HTTP-backed implementation behind the
//! `http-providers` feature, mirroring [`crate::embeddings`].

pub mod mock;

#[cfg(feature = "http-providers")]
pub mod http;

use async_trait::async_trait;

use crate::error::Result;

/// Converts a synthesis prompt into a generated answer (spec.md §4.C5,
/// §1 "synthesising answers with an external language model").
///
/// Implementations wrap transport/model failures as
/// [`crate::Error::ProviderUnavailable`] — the caller (C5/C7) decides
/// whether to retry, fall back to a no-context answer, or surface a stock
/// "cannot answer" string (spec.md §7).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Build the stable synthesis prompt used by `ask` (spec.md §4.C5 scenario 2):
/// the question followed by the deterministic context string produced by
/// [`crate::manager::MemoryManager::retrieve`], or just the bare question
/// when there is no usable context.
#[must_use]
pub fn synthesis_prompt(question: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => format!(
            "You are a helpful assistant with access to prior conversation memory.\n\n\
             {context}\n\n\
             Using the relevant context above if it helps, answer the question:\n{question}"
        ),
        _ => format!(
            "Answer the following question as best you can. If you lack the information \
             to answer confidently, say so plainly.\n\nQuestion: {question}"
        ),
    }
}
