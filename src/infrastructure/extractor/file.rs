use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{ports::TextExtractor, DomainError, FileKind};

/// Reads uploaded files from disk: PDFs through `pdf-extract`, text and
/// markdown as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path, kind: FileKind) -> Result<String, DomainError> {
        let text = match kind {
            FileKind::Pdf => {
                let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
                let name = path.display().to_string();
                let raw = tokio::task::spawn_blocking(move || {
                    pdf_extract::extract_text_from_mem(&bytes)
                })
                .await
                .map_err(|e| DomainError::Extraction(format!("{}: {e}", path.display())))?
                .map_err(|e| {
                    warn!(file = %name, error = %e, "failed to extract PDF text");
                    DomainError::Extraction(format!("{name}: {e}"))
                })?;
                collapse_whitespace(&raw)
            }
            FileKind::Text => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| read_error(path, e))?,
            FileKind::Markdown => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| read_error(path, e))?;
                strip_markdown(&raw)
            }
        };

        debug!(file = %path.display(), %kind, chars = text.len(), "extracted text");
        Ok(text)
    }
}

fn read_error(path: &Path, e: std::io::Error) -> DomainError {
    DomainError::Extraction(format!("{}: {e}", path.display()))
}

/// Collapses runs of spaces and blank lines left behind by PDF layout.
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_whitespace = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                result.push(if c == '\n' { '\n' } else { ' ' });
            }
            last_was_whitespace = true;
        } else {
            result.push(c);
            last_was_whitespace = false;
        }
    }

    result.trim().to_string()
}

/// Drops heading markers, emphasis markers and code fences.
fn strip_markdown(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .map(|line| {
            let trimmed = line.trim_start();
            let line = if trimmed.starts_with('#') {
                trimmed.trim_start_matches('#').trim_start()
            } else {
                line
            };
            line.replace(['*', '`'], "")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
