//! Deterministic [`super::ChatProvider`] for tests and `storage.type = memory`
//! deployments that never wired a real model.
//!
//! Echoes back whatever fact it can find in the prompt's context section, so
//! scenario tests like "florglings are turquoise" (spec.md §8 scenario 1)
//! exercise the full `ask` pipeline without a network call.

use async_trait::async_trait;

use super::ChatProvider;
use crate::constants::strings;
use crate::error::Result;

pub struct MockChatProvider;

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(context_start) = prompt.find("Relevant context:") {
            let context = &prompt[context_start..];
            let facts: Vec<&str> = context
                .lines()
                .skip(1)
                .filter(|line| line.starts_with("- "))
                .collect();
            if let Some(first) = facts.first() {
                let body = first.trim_start_matches("- ");
                return Ok(format!("Based on what I remember: {body}"));
            }
        }
        Ok(strings::NO_CONTEXT_ANSWER.to_string())
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::synthesis_prompt;

    #[tokio::test]
    async fn echoes_the_first_context_fact() {
        let provider = MockChatProvider;
        let prompt = synthesis_prompt(
            "what color are florglings?",
            Some("Question: what color are florglings?\nRelevant context:\n- florglings are turquoise creatures: turquoise…"),
        );
        let answer = provider.generate(&prompt).await.unwrap();
        assert!(answer.to_lowercase().contains("turquoise"));
    }

    #[tokio::test]
    async fn falls_back_to_no_context_answer_when_context_is_empty() {
        let provider = MockChatProvider;
        let prompt = synthesis_prompt("what is artificial intelligence?", None);
        let answer = provider.generate(&prompt).await.unwrap();
        assert_eq!(answer, strings::NO_CONTEXT_ANSWER);
    }
}
