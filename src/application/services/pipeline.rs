//! Question answering as a fixed, strictly sequential list of stages.
//!
//! `ask` starts in [`AskState::AwaitingRetrieval`]; each stage consumes the
//! state it expects and produces the next one, ending in
//! [`AskState::Complete`]. There is no branching, looping or retrying.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{IndexService, PromptComposer, RagService};
use crate::domain::{ports::LlmService, DomainError, GenerationErrorKind, RetrievalResult};

/// Final product of `ask`: the generated text, verbatim, and what it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub retrieved: RetrievalResult,
}

#[derive(Debug, Clone)]
pub enum AskState {
    AwaitingRetrieval {
        question: String,
    },
    AwaitingGeneration {
        question: String,
        retrieved: RetrievalResult,
    },
    Complete(Answer),
}

impl AskState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingRetrieval { .. } => "awaiting_retrieval",
            Self::AwaitingGeneration { .. } => "awaiting_generation",
            Self::Complete(_) => "complete",
        }
    }
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn advance(&self, state: AskState) -> Result<AskState, DomainError>;
}

fn unexpected(stage: &str, state: &AskState) -> DomainError {
    DomainError::internal(format!(
        "stage '{stage}' cannot run from state '{}'",
        state.name()
    ))
}

/// Looks up the active index and retrieves the top-k segments.
pub struct RetrievalStage {
    index: Arc<IndexService>,
    rag: Arc<RagService>,
}

impl RetrievalStage {
    pub fn new(index: Arc<IndexService>, rag: Arc<RagService>) -> Self {
        Self { index, rag }
    }
}

#[async_trait]
impl Stage for RetrievalStage {
    fn name(&self) -> &'static str {
        "retrieval"
    }

    async fn advance(&self, state: AskState) -> Result<AskState, DomainError> {
        let question = match state {
            AskState::AwaitingRetrieval { question } => question,
            other => return Err(unexpected(self.name(), &other)),
        };

        let index = self.index.active().await?;
        let retrieved = self.rag.retrieve(&index, &question).await?;
        Ok(AskState::AwaitingGeneration {
            question,
            retrieved,
        })
    }
}

/// Composes the grounded prompt and calls the language model.
pub struct GenerationStage {
    composer: PromptComposer,
    llm: Arc<dyn LlmService>,
    timeout: Duration,
}

impl GenerationStage {
    pub fn new(composer: PromptComposer, llm: Arc<dyn LlmService>, timeout: Duration) -> Self {
        Self {
            composer,
            llm,
            timeout,
        }
    }
}

#[async_trait]
impl Stage for GenerationStage {
    fn name(&self) -> &'static str {
        "generation"
    }

    async fn advance(&self, state: AskState) -> Result<AskState, DomainError> {
        let (question, retrieved) = match state {
            AskState::AwaitingGeneration {
                question,
                retrieved,
            } => (question, retrieved),
            other => return Err(unexpected(self.name(), &other)),
        };

        let prompt = self.composer.compose(&retrieved, &question)?;

        let answer = match tokio::time::timeout(self.timeout, self.llm.complete(&prompt.text)).await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(kind = %e.kind, error = %e.message, "generation failed");
                return Err(DomainError::GenerationUnavailable(e.kind));
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "generation timed out");
                return Err(DomainError::GenerationUnavailable(
                    GenerationErrorKind::Network,
                ));
            }
        };

        Ok(AskState::Complete(Answer { answer, retrieved }))
    }
}

/// Sequential retrieve-then-generate orchestrator.
pub struct QaPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl QaPipeline {
    pub fn new(retrieval: RetrievalStage, generation: GenerationStage) -> Self {
        Self {
            stages: vec![Box::new(retrieval), Box::new(generation)],
        }
    }

    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn ask(&self, question: &str) -> Result<Answer, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("Please enter a question."));
        }

        let mut state = AskState::AwaitingRetrieval {
            question: question.to_string(),
        };
        for stage in &self.stages {
            state = stage.advance(state).await.inspect_err(|e| {
                warn!(stage = stage.name(), error = %e, "ask failed");
            })?;
        }

        match state {
            AskState::Complete(answer) => {
                info!(
                    retrieved = answer.retrieved.len(),
                    answer_len = answer.answer.len(),
                    "answer generated"
                );
                Ok(answer)
            }
            other => Err(DomainError::internal(format!(
                "pipeline ended in state '{}'",
                other.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChunkParams, Document, FileKind, GenerationError, RuleSet};
    use crate::infrastructure::vector_store::InMemoryIndexStore;
    use crate::test_support::{LetterEmbedding, ScriptedLlm};

    async fn pipeline(llm: ScriptedLlm, ingest: bool) -> QaPipeline {
        let embedding = Arc::new(LetterEmbedding);
        let index = Arc::new(IndexService::new(
            embedding.clone(),
            Arc::new(InMemoryIndexStore::new()),
            ChunkParams::new(1000, 200).unwrap(),
        ));
        if ingest {
            index
                .ingest_documents(vec![Document::new(
                    "heart.txt",
                    FileKind::Text,
                    "The heart pumps blood through the body.",
                )])
                .await
                .unwrap();
        }
        let rag = Arc::new(RagService::new(embedding, 4).unwrap());
        let composer = PromptComposer::new(RuleSet::default(), 3000).unwrap();
        QaPipeline::new(
            RetrievalStage::new(index, rag),
            GenerationStage::new(composer, Arc::new(llm), Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_answer_is_returned_verbatim() {
        let llm = ScriptedLlm::reply("  It pumps blood.\n");
        let qa = pipeline(llm, true).await;

        let answer = qa.ask("What does the heart do?").await.unwrap();
        assert_eq!(answer.answer, "  It pumps blood.\n");
        assert_eq!(answer.retrieved.len(), 1);
    }

    #[tokio::test]
    async fn test_no_index_loaded() {
        let qa = pipeline(ScriptedLlm::reply("unused"), false).await;
        assert!(matches!(
            qa.ask("anything?").await,
            Err(DomainError::NoIndexLoaded)
        ));
    }

    #[tokio::test]
    async fn test_generation_errors_are_classified() {
        let llm = ScriptedLlm::fail(GenerationError::new(
            GenerationErrorKind::RateLimit,
            "429 Too Many Requests",
        ));
        let qa = pipeline(llm, true).await;
        assert!(matches!(
            qa.ask("What does the heart do?").await,
            Err(DomainError::GenerationUnavailable(GenerationErrorKind::RateLimit))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_is_network() {
        let qa = pipeline(ScriptedLlm::hang(), true).await;
        assert!(matches!(
            qa.ask("What does the heart do?").await,
            Err(DomainError::GenerationUnavailable(GenerationErrorKind::Network))
        ));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let qa = pipeline(ScriptedLlm::reply("unused"), true).await;
        assert!(matches!(qa.ask("   ").await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_stage_rejects_wrong_state() {
        let composer = PromptComposer::new(RuleSet::default(), 3000).unwrap();
        let stage = GenerationStage::new(
            composer,
            Arc::new(ScriptedLlm::reply("x")),
            Duration::from_secs(1),
        );
        let result = stage
            .advance(AskState::AwaitingRetrieval {
                question: "q".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Internal(_))));
    }
}
