use async_trait::async_trait;

use crate::domain::{errors::DomainError, VectorIndex};

/// Durable home of the active index.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Fails with `IndexNotFound` when nothing was persisted yet and
    /// `IndexCorrupt` when the stored state cannot be read back.
    async fn load(&self) -> Result<VectorIndex, DomainError>;

    /// Writes the whole index, replacing any previous state.
    async fn persist(&self, index: &VectorIndex) -> Result<(), DomainError>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
