use crate::domain::errors::GenerationError;
use async_trait::async_trait;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}
