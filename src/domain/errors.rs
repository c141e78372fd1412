use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failed call to the language model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Auth,
    RateLimit,
    Network,
    Unknown,
}

impl GenerationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Auth => {
                "The language model service rejected our credentials. Please contact the administrator."
            }
            Self::RateLimit => {
                "The language model service is receiving too many requests. Please try again in a moment."
            }
            Self::Network => {
                "The language model service could not be reached in time. Please try again later."
            }
            Self::Unknown => "The language model service failed to produce an answer. Please try again.",
        }
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure returned by [`LlmService`](crate::domain::ports::LlmService) adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} generation failure: {message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Index not found at {0}")]
    IndexNotFound(String),

    #[error("Index corrupt: {0}")]
    IndexCorrupt(String),

    #[error("Index holds no segments")]
    EmptyIndex,

    #[error("No index loaded")]
    NoIndexLoaded,

    #[error("Embedding dimension mismatch: index expects {expected}, embedder produced {actual}")]
    EmbeddingMismatch { expected: usize, actual: usize },

    #[error("Generation unavailable ({0})")]
    GenerationUnavailable(GenerationErrorKind),

    #[error("Unsupported file kind: {0}")]
    UnsupportedFileKind(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::IndexCorrupt(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Text safe to show to an end user; never includes raw service output.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyIndex | Self::NoIndexLoaded | Self::IndexNotFound(_) => {
                "No document has been uploaded yet. Please upload a document first.".to_string()
            }
            Self::IndexCorrupt(_) => {
                "The document index could not be read. Please upload your documents again."
                    .to_string()
            }
            Self::EmbeddingMismatch { .. } => {
                "The document index was built with a different embedding model. Please upload your documents again."
                    .to_string()
            }
            Self::GenerationUnavailable(kind) => kind.user_message().to_string(),
            Self::UnsupportedFileKind(kind) => {
                format!("Unsupported file format '{kind}'. Upload a PDF, TXT or MD file.")
            }
            Self::Extraction(msg) | Self::Validation(msg) => msg.clone(),
            Self::InvalidConfiguration(_)
            | Self::Embedding(_)
            | Self::Io(_)
            | Self::Timeout(_)
            | Self::Internal(_) => {
                "Something went wrong while processing your request. Please try again.".to_string()
            }
        }
    }

    /// Load-time failures that are recovered by starting from an empty index.
    pub fn is_recoverable_load_failure(&self) -> bool {
        matches!(self, Self::IndexNotFound(_) | Self::IndexCorrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_kinds_have_distinct_messages() {
        let kinds = [
            GenerationErrorKind::Auth,
            GenerationErrorKind::RateLimit,
            GenerationErrorKind::Network,
            GenerationErrorKind::Unknown,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }

    #[test]
    fn test_user_message_hides_internal_detail() {
        let err = DomainError::io("permission denied on /var/lib/index/vectors.bin");
        assert!(!err.user_message().contains("/var/lib"));

        let err = DomainError::GenerationUnavailable(GenerationErrorKind::RateLimit);
        assert_eq!(err.user_message(), GenerationErrorKind::RateLimit.user_message());
    }

    #[test]
    fn test_recoverable_load_failures() {
        assert!(DomainError::IndexNotFound("x".into()).is_recoverable_load_failure());
        assert!(DomainError::corrupt("bad").is_recoverable_load_failure());
        assert!(!DomainError::EmptyIndex.is_recoverable_load_failure());
    }
}
