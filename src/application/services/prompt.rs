//! Prompt assembly under a fixed grounding template and a token budget.
//!
//! The budget counts whitespace-delimited tokens. When the retrieved context
//! does not fit, the lowest-ranked segments are dropped first and the rest
//! keep their rank order.

use serde::Serialize;
use tracing::debug;

use crate::domain::{DomainError, RetrievalResult, RuleSet};

const SEGMENT_DELIMITER: &str = "\n\n---\n\n";
const EMPTY_CONTEXT: &str = "(no context available)";

#[derive(Debug, Clone, Serialize)]
pub struct ComposedPrompt {
    pub text: String,
    /// Number of leading retrieved segments included in the context.
    pub included: usize,
    pub dropped: usize,
    pub tokens: usize,
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    rules: RuleSet,
    max_tokens: usize,
}

pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

impl PromptComposer {
    pub fn new(rules: RuleSet, max_tokens: usize) -> Result<Self, DomainError> {
        if max_tokens == 0 {
            return Err(DomainError::invalid_config(
                "max prompt tokens must be greater than zero",
            ));
        }
        Ok(Self { rules, max_tokens })
    }

    pub fn compose(
        &self,
        retrieved: &RetrievalResult,
        question: &str,
    ) -> Result<ComposedPrompt, DomainError> {
        // The context sits between blank lines, so its tokens add linearly.
        let fixed = count_tokens(&self.render("", question));
        let floor = fixed + count_tokens(EMPTY_CONTEXT);
        if floor > self.max_tokens {
            return Err(DomainError::validation(format!(
                "question does not fit the prompt budget ({floor} > {} tokens)",
                self.max_tokens
            )));
        }

        let delimiter_cost = count_tokens(SEGMENT_DELIMITER);
        let mut used = fixed;
        let mut included = Vec::new();
        for segment in retrieved.segments() {
            let mut cost = count_tokens(&segment.content);
            if !included.is_empty() {
                cost += delimiter_cost;
            }
            if used + cost > self.max_tokens {
                break;
            }
            used += cost;
            included.push(segment.content.as_str());
        }

        let context = if included.is_empty() {
            EMPTY_CONTEXT.to_string()
        } else {
            included.join(SEGMENT_DELIMITER)
        };
        let text = self.render(&context, question);
        let tokens = count_tokens(&text);

        let dropped = retrieved.len() - included.len();
        if dropped > 0 {
            debug!(
                included = included.len(),
                dropped,
                budget = self.max_tokens,
                "context truncated to prompt budget"
            );
        }

        Ok(ComposedPrompt {
            text,
            included: included.len(),
            dropped,
            tokens,
        })
    }

    fn render(&self, context: &str, question: &str) -> String {
        let rules = &self.rules;
        let mut lines = vec!["Answer ONLY based on the provided context below.".to_string()];
        lines.push(format!(
            "If the context is empty or unrelated to the question, reply exactly: \"{}\"",
            rules.out_of_scope_refusal
        ));
        if let Some(domain) = &rules.domain {
            lines.push(format!(
                "Only answer questions about {domain}. For any other subject, reply exactly: \"{}\"",
                rules.out_of_scope_refusal
            ));
        }
        lines.push(format!(
            "If you cannot find the answer in the context, reply exactly: \"{}\"",
            rules.not_found_refusal
        ));
        lines.extend(rules.extra_rules.iter().cloned());
        if let Some(cta) = &rules.call_to_action {
            lines.push(format!(
                "End every answer with this line, verbatim: \"{cta}\""
            ));
        }

        let numbered = lines
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {rule}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{role}\n\nIMPORTANT RULES:\n{numbered}\n\nContext from uploaded documents:\n\n{context}\n\nQuestion:\n{question}\n\nAnswer:\n",
            role = rules.role,
        )
    }
}
