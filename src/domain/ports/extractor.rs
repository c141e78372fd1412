use std::path::Path;

use async_trait::async_trait;

use crate::domain::{errors::DomainError, FileKind};

/// Turns an uploaded file into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path, kind: FileKind) -> Result<String, DomainError>;
}
