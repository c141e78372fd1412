//! Deterministic adapters for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{EmbeddingService, LlmService, TextExtractor};
use crate::domain::{DomainError, Embedding, FileKind, GenerationError};

/// Letter-frequency embedding over `a..=z`, case-insensitive.
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

/// Returns the same vector for every input.
pub struct FixedEmbedding(pub Embedding);

#[async_trait]
impl EmbeddingService for FixedEmbedding {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.0.dimension()
    }

    fn model_id(&self) -> &str {
        "fixed"
    }
}

pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Err(DomainError::embedding("service unavailable"))
    }

    fn dimension(&self) -> usize {
        26
    }

    fn model_id(&self) -> &str {
        "letters"
    }
}

enum Script {
    Reply(String),
    Fail(GenerationError),
    Hang,
}

/// Language model stub that records prompts and plays back a fixed outcome.
pub struct ScriptedLlm {
    script: Script,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn with(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self::with(Script::Reply(text.into()))
    }

    pub fn fail(error: GenerationError) -> Self {
        Self::with(Script::Fail(error))
    }

    pub fn hang() -> Self {
        Self::with(Script::Hang)
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(error) => Err(error.clone()),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Extractor serving text from an in-memory path map.
#[derive(Default)]
pub struct MapExtractor {
    files: HashMap<PathBuf, String>,
}

impl MapExtractor {
    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.files.insert(PathBuf::from(path), text.to_string());
        self
    }
}

#[async_trait]
impl TextExtractor for MapExtractor {
    async fn extract(&self, path: &Path, _kind: FileKind) -> Result<String, DomainError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| DomainError::Extraction(format!("missing {}", path.display())))
    }
}
