use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{ports::IndexStore, DomainError, VectorIndex};

/// Keeps the persisted index in process memory. Used when no index directory
/// is wanted, and in tests.
pub struct InMemoryIndexStore {
    index: RwLock<Option<VectorIndex>>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(None),
        }
    }
}

impl Default for InMemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn load(&self) -> Result<VectorIndex, DomainError> {
        let stored = self
            .index
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        stored
            .clone()
            .ok_or_else(|| DomainError::IndexNotFound(self.location()))
    }

    async fn persist(&self, index: &VectorIndex) -> Result<(), DomainError> {
        let mut stored = self
            .index
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        *stored = Some(index.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
