mod document;
mod embedding;
mod index;
mod retrieval;
mod rules;
mod segment;

pub use document::{content_hash, Document, FileKind, IndexedDocument};
pub use embedding::Embedding;
pub use index::{IndexMetadata, VectorIndex};
pub use retrieval::{RetrievalResult, SearchResult};
pub use rules::RuleSet;
pub use segment::{split_document, split_text, ChunkParams, Segment};
