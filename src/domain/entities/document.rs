use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Text,
    Markdown,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }

    /// Detects the kind from a filename extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Text),
            "md" | "markdown" => Ok(Self::Markdown),
            "" => Err(DomainError::UnsupportedFileKind("<none>".to_string())),
            other => Err(DomainError::UnsupportedFileKind(format!(".{other}"))),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted text of one uploaded file. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub text: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(name: impl Into<String>, kind: FileKind, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            content_hash: content_hash(&text),
            text,
            created_at: Utc::now(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Hex SHA-256 of the extracted text, used as the re-ingestion cache key.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Record of a document whose segments live in an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: Uuid,
    pub name: String,
    pub kind: FileKind,
    pub content_hash: String,
    pub segment_count: usize,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedDocument {
    pub fn from_document(doc: &Document, segment_count: usize) -> Self {
        Self {
            id: doc.id,
            name: doc.name.clone(),
            kind: doc.kind,
            content_hash: doc.content_hash.clone(),
            segment_count,
            indexed_at: Utc::now(),
        }
    }
}
