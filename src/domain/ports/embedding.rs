use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// Maps text to fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds every text in one batch, preserving input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;

    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("No embedding returned"))
    }

    fn dimension(&self) -> usize;

    /// Identifier persisted with an index to detect model drift.
    fn model_id(&self) -> &str;
}
