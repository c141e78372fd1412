#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docqa_agent::application::{
    GenerationStage, IndexService, PromptComposer, QaPipeline, RagService, RetrievalStage,
};
use docqa_agent::domain::ports::{EmbeddingService, IndexStore, LlmService};
use docqa_agent::domain::{ChunkParams, DomainError, Embedding, GenerationError, RuleSet};

/// Letter-frequency embedding over `a..=z`.
pub struct LetterEmbedding;

impl LetterEmbedding {
    pub fn vector(text: &str) -> Embedding {
        let mut counts = vec![0.0f32; 26];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Embedding::new(counts).normalized()
    }
}

#[async_trait]
impl EmbeddingService for LetterEmbedding {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        26
    }

    fn model_id(&self) -> &str {
        "letters"
    }
}

/// Follows the grounding rules found in the prompt: answers with the first
/// context line sharing a word with the question, otherwise replies with the
/// refusal sentence the prompt names for the situation.
pub struct ContextLlm;

const OUT_OF_SCOPE_RULE: &str = "For any other subject, reply exactly: \"";
const NOT_FOUND_RULE: &str = "If you cannot find the answer in the context, reply exactly: \"";

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let to = text[from..].find(end)? + from;
    Some(&text[from..to])
}

fn keywords(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 4)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl LlmService for ContextLlm {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let context =
            between(prompt, "Context from uploaded documents:\n\n", "\n\nQuestion:\n").unwrap_or("");
        let question = between(prompt, "\n\nQuestion:\n", "\n\nAnswer:\n").unwrap_or("");
        let words = keywords(question);

        let hit = context.lines().find(|line| {
            let line = line.to_lowercase();
            words.iter().any(|w| line.contains(w.as_str()))
        });
        if let Some(line) = hit {
            return Ok(line.trim().to_string());
        }

        let in_domain = between(prompt, "Only answer questions about ", ". For any other subject")
            .map(|domain| {
                let domain = domain.to_lowercase();
                words.iter().any(|w| domain.contains(w.as_str()))
            });
        let rule = match in_domain {
            Some(false) => OUT_OF_SCOPE_RULE,
            _ => NOT_FOUND_RULE,
        };
        let refusal = between(prompt, rule, "\"").unwrap_or_default();
        Ok(refusal.to_string())
    }
}

pub fn pipeline(
    store: Arc<dyn IndexStore>,
    params: ChunkParams,
    rules: RuleSet,
) -> (QaPipeline, Arc<IndexService>) {
    let embedding = Arc::new(LetterEmbedding);
    let index = Arc::new(IndexService::new(embedding.clone(), store, params));
    let rag = Arc::new(RagService::new(embedding, 4).unwrap());
    let llm = Arc::new(ContextLlm);
    let composer = PromptComposer::new(rules, 3000).unwrap();

    let qa = QaPipeline::new(
        RetrievalStage::new(index.clone(), rag),
        GenerationStage::new(composer, llm, Duration::from_secs(5)),
    );
    (qa, index)
}
