use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument};

use super::{IndexService, IngestReport};
use crate::domain::{ports::TextExtractor, Document, DomainError, FileKind};

/// Upload boundary: extraction, chunking, embedding and ingestion of files.
pub struct DocumentService {
    extractor: Arc<dyn TextExtractor>,
    index: Arc<IndexService>,
}

impl DocumentService {
    pub fn new(extractor: Arc<dyn TextExtractor>, index: Arc<IndexService>) -> Self {
        Self { extractor, index }
    }

    /// Extracts every file, then ingests all of them as one batch and
    /// persists the index. Any extraction failure aborts the whole batch.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn load_documents(
        &self,
        files: &[(PathBuf, FileKind)],
    ) -> Result<IngestReport, DomainError> {
        if files.is_empty() {
            return Err(DomainError::validation("No files were provided."));
        }

        let documents = try_join_all(
            files
                .iter()
                .map(|(path, kind)| self.extract(path, display_name(path), *kind)),
        )
        .await?;

        self.index.ingest_documents(documents).await
    }

    /// Same as [`load_documents`](Self::load_documents) with caller-supplied
    /// display names, for uploads stored under generated paths.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn load_named_documents(
        &self,
        files: &[(String, PathBuf, FileKind)],
    ) -> Result<IngestReport, DomainError> {
        if files.is_empty() {
            return Err(DomainError::validation("No files were provided."));
        }

        let documents = try_join_all(
            files
                .iter()
                .map(|(name, path, kind)| self.extract(path, name.clone(), *kind)),
        )
        .await?;

        self.index.ingest_documents(documents).await
    }

    async fn extract(
        &self,
        path: &Path,
        name: String,
        kind: FileKind,
    ) -> Result<Document, DomainError> {
        let text = self.extractor.extract(path, kind).await?;
        if text.trim().is_empty() {
            return Err(DomainError::Extraction(format!(
                "No text could be extracted from '{name}'."
            )));
        }

        info!(document = %name, %kind, chars = text.chars().count(), "extracted document");
        Ok(Document::new(name, kind, text))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChunkParams;
    use crate::infrastructure::vector_store::InMemoryIndexStore;
    use crate::test_support::{LetterEmbedding, MapExtractor};

    fn service(extractor: MapExtractor) -> (DocumentService, Arc<IndexService>) {
        let index = Arc::new(IndexService::new(
            Arc::new(LetterEmbedding),
            Arc::new(InMemoryIndexStore::new()),
            ChunkParams::new(10, 2).unwrap(),
        ));
        (
            DocumentService::new(Arc::new(extractor), index.clone()),
            index,
        )
    }

    #[tokio::test]
    async fn test_load_documents_into_one_shared_index() {
        let extractor = MapExtractor::default()
            .with("/up/a.pdf", "pdf text body")
            .with("/up/b.md", "markdown body");
        let (svc, index) = service(extractor);

        let report = svc
            .load_documents(&[
                (PathBuf::from("/up/a.pdf"), FileKind::Pdf),
                (PathBuf::from("/up/b.md"), FileKind::Markdown),
            ])
            .await
            .unwrap();

        assert_eq!(report.documents_ingested, 2);
        let active = index.active().await.unwrap();
        let names: Vec<&str> = active.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.md"]);
    }

    #[tokio::test]
    async fn test_empty_extraction_aborts_batch() {
        let extractor = MapExtractor::default()
            .with("/up/a.txt", "real text")
            .with("/up/blank.txt", "   \n ");
        let (svc, index) = service(extractor);

        let result = svc
            .load_documents(&[
                (PathBuf::from("/up/a.txt"), FileKind::Text),
                (PathBuf::from("/up/blank.txt"), FileKind::Text),
            ])
            .await;

        assert!(matches!(result, Err(DomainError::Extraction(_))));
        assert!(!index.status().await.loaded);
    }

    #[tokio::test]
    async fn test_no_files() {
        let (svc, _) = service(MapExtractor::default());
        assert!(matches!(
            svc.load_documents(&[]).await,
            Err(DomainError::Validation(_))
        ));
    }
}
