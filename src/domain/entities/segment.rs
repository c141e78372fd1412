use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{errors::DomainError, Document};

/// A bounded, contiguous slice of a document's text. Never re-split once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub document_id: Uuid,
    pub source: String,
    pub position: usize,
    pub content: String,
}

impl Segment {
    pub fn new(
        document_id: Uuid,
        source: impl Into<String>,
        position: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            document_id,
            source: source.into(),
            position,
            content: content.into(),
        }
    }
}

/// Validated chunking parameters, measured in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkParams {
    max_chunk_size: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(max_chunk_size: usize, overlap: usize) -> Result<Self, DomainError> {
        if max_chunk_size == 0 {
            return Err(DomainError::invalid_config(
                "max chunk size must be greater than zero",
            ));
        }
        if overlap >= max_chunk_size {
            return Err(DomainError::invalid_config(format!(
                "chunk overlap ({overlap}) must be less than max chunk size ({max_chunk_size})"
            )));
        }
        Ok(Self {
            max_chunk_size,
            overlap,
        })
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.max_chunk_size - self.overlap
    }
}

/// Splits `text` into windows of at most `max_chunk_size` chars.
///
/// Each window after the first starts `overlap` chars before the end of the
/// previous one, so the windows cover the text with no gaps. Empty text yields
/// no windows; text no longer than `max_chunk_size` yields exactly one.
pub fn split_text(text: &str, params: ChunkParams) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, including the end of the text.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + params.max_chunk_size).min(char_len);
        windows.push(&text[boundaries[start]..boundaries[end]]);
        if end == char_len {
            break;
        }
        start += params.step();
    }

    windows
}

/// Splits a document into positioned segments.
pub fn split_document(doc: &Document, params: ChunkParams) -> Vec<Segment> {
    split_text(&doc.text, params)
        .into_iter()
        .enumerate()
        .map(|(position, window)| Segment::new(doc.id, &doc.name, position, window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileKind;

    fn params(max: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(max, overlap).unwrap()
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert!(matches!(
            ChunkParams::new(0, 0),
            Err(DomainError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            ChunkParams::new(100, 100),
            Err(DomainError::InvalidConfiguration(_))
        ));
        assert!(ChunkParams::new(100, 99).is_ok());
    }

    #[test]
    fn test_short_text_is_single_segment() {
        let windows = split_text("Hello world.", params(100, 20));
        assert_eq!(windows, vec!["Hello world."]);

        let exact = "x".repeat(100);
        assert_eq!(split_text(&exact, params(100, 20)).len(), 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_text("", params(10, 2)).is_empty());
    }

    #[test]
    fn test_a_then_b_boundaries() {
        let text = format!("{}{}", "A".repeat(1000), "B".repeat(1000));
        let windows = split_text(&text, params(1000, 200));

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], "A".repeat(1000));
        assert_eq!(windows[1], format!("{}{}", "A".repeat(200), "B".repeat(800)));
        assert_eq!(windows[2], "B".repeat(400));
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld ✓ ".repeat(20);
        let windows = split_text(&text, params(16, 4));

        assert!(windows.iter().all(|w| w.chars().count() <= 16));
        for pair in windows.windows(2) {
            let tail: String = pair[0].chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_split_document_positions() {
        let doc = Document::new("notes.txt", FileKind::Text, "abcdefghij");
        let segments = split_document(&doc, params(4, 1));

        let contents: Vec<&str> = segments.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["abcd", "defg", "ghij"]);
        assert!(segments.iter().enumerate().all(|(i, s)| s.position == i));
        assert!(segments.iter().all(|s| s.document_id == doc.id && s.source == "notes.txt"));
    }
}
