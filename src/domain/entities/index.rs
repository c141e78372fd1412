use serde::{Deserialize, Serialize};

use super::{Embedding, IndexedDocument, SearchResult, Segment};
use crate::domain::errors::DomainError;

/// Compatibility data persisted alongside the vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub model_id: String,
    pub dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// Flat inner-product index owning its (segment, vector) pairs.
///
/// Rows are append-only: nothing is updated or removed after insertion, so a
/// row's position doubles as its insertion order for tie-breaking. Vectors are
/// stored row-major in a single buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    metadata: IndexMetadata,
    segments: Vec<Segment>,
    vectors: Vec<f32>,
    documents: Vec<IndexedDocument>,
}

impl VectorIndex {
    pub fn new(metadata: IndexMetadata) -> Self {
        Self {
            metadata,
            segments: Vec::new(),
            vectors: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Rebuilds an index from persisted parts, rejecting inconsistent shapes.
    pub fn from_parts(
        metadata: IndexMetadata,
        segments: Vec<Segment>,
        vectors: Vec<f32>,
        documents: Vec<IndexedDocument>,
    ) -> Result<Self, DomainError> {
        if metadata.dimension == 0 {
            return Err(DomainError::corrupt("index dimension is zero"));
        }
        let expected = segments.len() * metadata.dimension;
        if vectors.len() != expected {
            return Err(DomainError::corrupt(format!(
                "expected {expected} vector components for {} segments, found {}",
                segments.len(),
                vectors.len()
            )));
        }
        let recorded: usize = documents.iter().map(|d| d.segment_count).sum();
        if recorded != segments.len() {
            return Err(DomainError::corrupt(format!(
                "documents account for {recorded} segments, index holds {}",
                segments.len()
            )));
        }

        Ok(Self {
            metadata,
            segments,
            vectors,
            documents,
        })
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    pub fn vector(&self, row: usize) -> &[f32] {
        let dim = self.dimension();
        &self.vectors[row * dim..(row + 1) * dim]
    }

    pub fn contains_document(&self, content_hash: &str) -> bool {
        self.documents.iter().any(|d| d.content_hash == content_hash)
    }

    /// Appends all pairs or none. Vectors are normalized on the way in.
    pub fn append(
        &mut self,
        segments: Vec<Segment>,
        embeddings: Vec<Embedding>,
    ) -> Result<(), DomainError> {
        if segments.len() != embeddings.len() {
            return Err(DomainError::embedding(format!(
                "received {} embeddings for {} segments",
                embeddings.len(),
                segments.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.dimension() != self.dimension()) {
            return Err(DomainError::EmbeddingMismatch {
                expected: self.dimension(),
                actual: bad.dimension(),
            });
        }

        self.vectors.reserve(embeddings.len() * self.dimension());
        for embedding in embeddings {
            self.vectors.extend(embedding.normalized().into_inner());
        }
        self.segments.extend(segments);
        Ok(())
    }

    pub fn record_document(&mut self, document: IndexedDocument) {
        self.documents.push(document);
    }

    /// Returns the `k` rows with the highest inner product against `query`.
    ///
    /// Equal scores keep insertion order, earlier rows first.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if self.is_empty() {
            return Err(DomainError::EmptyIndex);
        }
        if query.dimension() != self.dimension() {
            return Err(DomainError::EmbeddingMismatch {
                expected: self.dimension(),
                actual: query.dimension(),
            });
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|row| (row, query.inner_product(self.vector(row))))
            .collect();

        // Stable sort: ties stay in row order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(row, score)| SearchResult {
                segment: self.segments[row].clone(),
                score,
            })
            .collect())
    }
}
