use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::{ports::EmbeddingService, DomainError, RetrievalResult, VectorIndex};

/// Embeds a query and selects the most similar segments of an index.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    default_top_k: usize,
    timeout: Duration,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        default_top_k: usize,
    ) -> Result<Self, DomainError> {
        if default_top_k == 0 {
            return Err(DomainError::invalid_config("top_k must be at least 1"));
        }
        Ok(Self {
            embedding,
            default_top_k,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    #[instrument(skip(self, index))]
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
    ) -> Result<RetrievalResult, DomainError> {
        self.retrieve_top_k(index, query, self.default_top_k).await
    }

    #[instrument(skip(self, index), fields(segments = index.len()))]
    pub async fn retrieve_top_k(
        &self,
        index: &VectorIndex,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalResult, DomainError> {
        if top_k == 0 {
            return Err(DomainError::validation("top_k must be at least 1"));
        }
        if index.is_empty() {
            return Err(DomainError::EmptyIndex);
        }

        let embedding = tokio::time::timeout(self.timeout, self.embedding.embed(query))
            .await
            .map_err(|_| DomainError::timeout("query embedding timed out"))??;

        if embedding.dimension() != index.dimension() {
            return Err(DomainError::EmbeddingMismatch {
                expected: index.dimension(),
                actual: embedding.dimension(),
            });
        }

        let hits = index.search(&embedding.normalized(), top_k)?;
        debug!(hits = hits.len(), top_score = hits.first().map(|h| h.score), "retrieved");
        Ok(RetrievalResult::new(query, hits))
    }
}
