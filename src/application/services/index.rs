use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::domain::{
    ports::{EmbeddingService, IndexStore},
    split_document, ChunkParams, Document, DomainError, IndexMetadata, IndexedDocument, Segment,
    VectorIndex,
};

/// Outcome of one bulk ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents_ingested: usize,
    pub documents_skipped: usize,
    pub segments_added: usize,
    pub total_segments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub loaded: bool,
    pub segments: usize,
    pub documents: usize,
}

/// What `active()` knows about the persisted index.
enum Slot {
    /// Not looked at yet, or the last attempt failed transiently.
    Unloaded,
    /// Missing or unreadable; stays so until the next ingest.
    Unavailable,
    Active(Arc<VectorIndex>),
}

/// Owns the active index and its create/load/ingest/persist lifecycle.
///
/// Ingestions are serialized by `ingest_lock` and work on a private copy that
/// is swapped in only after it has been persisted, so readers holding a
/// snapshot never observe a partially ingested index.
pub struct IndexService {
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn IndexStore>,
    params: ChunkParams,
    embed_timeout: Duration,
    io_timeout: Duration,
    active: RwLock<Slot>,
    ingest_lock: Mutex<()>,
}

impl IndexService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn IndexStore>,
        params: ChunkParams,
    ) -> Self {
        Self {
            embedding,
            store,
            params,
            embed_timeout: Duration::from_secs(60),
            io_timeout: Duration::from_secs(30),
            active: RwLock::new(Slot::Unloaded),
            ingest_lock: Mutex::new(()),
        }
    }

    pub fn with_timeouts(mut self, embed_timeout: Duration, io_timeout: Duration) -> Self {
        self.embed_timeout = embed_timeout;
        self.io_timeout = io_timeout;
        self
    }

    /// An empty index matching the current embedder and chunk parameters.
    pub fn create(&self) -> VectorIndex {
        VectorIndex::new(IndexMetadata {
            model_id: self.embedding.model_id().to_string(),
            dimension: self.embedding.dimension(),
            chunk_size: self.params.max_chunk_size(),
            chunk_overlap: self.params.overlap(),
        })
    }

    /// Reads the persisted index and checks it against the current embedder.
    #[instrument(skip(self), fields(location = %self.store.location()))]
    pub async fn load(&self) -> Result<VectorIndex, DomainError> {
        let index = with_timeout(self.io_timeout, "index load", self.store.load()).await?;

        let dimension = self.embedding.dimension();
        if index.dimension() != dimension {
            return Err(DomainError::corrupt(format!(
                "persisted dimension {} disagrees with embedder dimension {dimension}",
                index.dimension()
            )));
        }
        if index.metadata().model_id != self.embedding.model_id() {
            return Err(DomainError::corrupt(format!(
                "persisted with embedding model '{}', current model is '{}'",
                index.metadata().model_id,
                self.embedding.model_id()
            )));
        }

        info!(
            segments = index.len(),
            documents = index.documents().len(),
            "index loaded"
        );
        Ok(index)
    }

    /// Embeds `segments` in one batch and returns `index` with them appended.
    ///
    /// `index` itself is never touched, so a failed batch leaves it unchanged.
    #[instrument(skip(self, index, segments), fields(count = segments.len()))]
    pub async fn ingest(
        &self,
        index: &VectorIndex,
        segments: Vec<Segment>,
    ) -> Result<VectorIndex, DomainError> {
        let mut next = index.clone();
        if segments.is_empty() {
            return Ok(next);
        }

        let texts: Vec<&str> = segments.iter().map(|s| s.content.as_str()).collect();
        let embeddings = with_timeout(
            self.embed_timeout,
            "embedding batch",
            self.embedding.embed_batch(&texts),
        )
        .await?;

        next.append(segments, embeddings)?;
        Ok(next)
    }

    #[instrument(skip(self, index), fields(segments = index.len()))]
    pub async fn persist(&self, index: &VectorIndex) -> Result<(), DomainError> {
        with_timeout(self.io_timeout, "index persist", self.store.persist(index)).await?;
        info!(location = %self.store.location(), "index persisted");
        Ok(())
    }

    /// Snapshot of the active index, loading it from the store on first use.
    ///
    /// A missing or corrupt artifact is reported as `NoIndexLoaded` and is not
    /// read again until an ingest replaces it.
    pub async fn active(&self) -> Result<Arc<VectorIndex>, DomainError> {
        match &*self.active.read().await {
            Slot::Active(index) => return Ok(index.clone()),
            Slot::Unavailable => return Err(DomainError::NoIndexLoaded),
            Slot::Unloaded => {}
        }

        let mut slot = self.active.write().await;
        match &*slot {
            Slot::Active(index) => return Ok(index.clone()),
            Slot::Unavailable => return Err(DomainError::NoIndexLoaded),
            Slot::Unloaded => {}
        }

        match self.load().await {
            Ok(index) => {
                let index = Arc::new(index);
                *slot = Slot::Active(index.clone());
                Ok(index)
            }
            Err(e) if e.is_recoverable_load_failure() => {
                match &e {
                    DomainError::IndexNotFound(location) => info!(%location, "no persisted index"),
                    _ => warn!(error = %e, "persisted index unusable until the next upload"),
                }
                *slot = Slot::Unavailable;
                Err(DomainError::NoIndexLoaded)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn status(&self) -> IndexStatus {
        match &*self.active.read().await {
            Slot::Active(index) => IndexStatus {
                loaded: true,
                segments: index.len(),
                documents: index.documents().len(),
            },
            Slot::Unloaded | Slot::Unavailable => IndexStatus {
                loaded: false,
                segments: 0,
                documents: 0,
            },
        }
    }

    /// Chunks, embeds and appends `documents`, persists, then swaps the
    /// result in as the active index.
    ///
    /// Documents whose content hash is already indexed (or repeated within
    /// the batch) are skipped without re-embedding.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn ingest_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<IngestReport, DomainError> {
        let _guard = self.ingest_lock.lock().await;

        let base = self.base_for_ingest().await?;
        let mut report = IngestReport::default();
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut segments = Vec::new();

        for doc in &documents {
            if base.contains_document(&doc.content_hash) || !seen.insert(doc.content_hash.clone())
            {
                info!(document = %doc.name, hash = %doc.content_hash, "document already indexed, skipping");
                report.documents_skipped += 1;
                continue;
            }
            let doc_segments = split_document(doc, self.params);
            records.push(IndexedDocument::from_document(doc, doc_segments.len()));
            segments.extend(doc_segments);
        }

        if records.is_empty() {
            report.total_segments = base.len();
            return Ok(report);
        }

        report.documents_ingested = records.len();
        report.segments_added = segments.len();

        let mut next = self.ingest(&base, segments).await?;
        for record in records {
            next.record_document(record);
        }
        self.persist(&next).await?;

        report.total_segments = next.len();
        *self.active.write().await = Slot::Active(Arc::new(next));

        info!(
            ingested = report.documents_ingested,
            skipped = report.documents_skipped,
            segments_added = report.segments_added,
            total_segments = report.total_segments,
            "ingestion completed"
        );
        Ok(report)
    }

    async fn base_for_ingest(&self) -> Result<Arc<VectorIndex>, DomainError> {
        match &*self.active.read().await {
            Slot::Active(index) => return Ok(index.clone()),
            Slot::Unavailable => return Ok(Arc::new(self.create())),
            Slot::Unloaded => {}
        }

        match self.load().await {
            Ok(index) => Ok(Arc::new(index)),
            Err(e) if e.is_recoverable_load_failure() => {
                if matches!(e, DomainError::IndexCorrupt(_)) {
                    warn!(error = %e, "discarding unreadable index, starting fresh");
                }
                Ok(Arc::new(self.create()))
            }
            Err(e) => Err(e),
        }
    }
}

async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DomainError::timeout(format!("{what} exceeded {}s", limit.as_secs_f32())))?
}
