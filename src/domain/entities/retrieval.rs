use serde::{Deserialize, Serialize};

use super::Segment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub segment: Segment,
    pub score: f32,
}

/// Segments selected for a query, most similar first. Order is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query: String,
    pub hits: Vec<SearchResult>,
}

impl RetrievalResult {
    pub fn new(query: impl Into<String>, hits: Vec<SearchResult>) -> Self {
        Self {
            query: query.into(),
            hits,
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.hits.iter().map(|h| &h.segment)
    }
}
