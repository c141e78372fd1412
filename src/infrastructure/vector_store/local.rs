//! Directory-backed index persistence.
//!
//! Layout under the index directory:
//! - `manifest.json`: format version, metadata, document records, and the
//!   names of the data files of the current generation
//! - `segments-<generation>.json`: segment texts in row order
//! - `vectors-<generation>.bin`: row-major little-endian `f32` components
//!
//! Each persist writes a fresh generation of data files, then renames a new
//! manifest into place. That rename is the only commit point: until it
//! happens the old manifest still names the old, untouched data files.
//! Superseded generations are removed after the commit.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    ports::IndexStore, DomainError, IndexMetadata, IndexedDocument, Segment, VectorIndex,
};

const FORMAT_VERSION: u32 = 1;
const MANIFEST: &str = "manifest.json";
const SEGMENTS_PREFIX: &str = "segments-";
const VECTORS_PREFIX: &str = "vectors-";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    metadata: IndexMetadata,
    segment_count: usize,
    segments_file: String,
    vectors_file: String,
    documents: Vec<IndexedDocument>,
    updated_at: DateTime<Utc>,
}

pub struct LocalIndexStore {
    dir: PathBuf,
}

impl LocalIndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| DomainError::io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| DomainError::io(format!("{}: {e}", target.display())))
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.dir.join(name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| DomainError::corrupt(format!("{}: {e}", path.display())))
    }

    /// Best-effort removal of data files no manifest refers to any more.
    async fn remove_stale(&self, keep: &[&str]) {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(location = %self.location(), error = %e, "cannot list index directory");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_data = (name.starts_with(SEGMENTS_PREFIX) || name.starts_with(VECTORS_PREFIX))
                && !name.ends_with(".tmp");
            if !is_data || keep.contains(&name.as_str()) {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                warn!(file = %name, error = %e, "failed to remove stale index file");
            }
        }
    }
}

fn encode_vectors(vectors: &[f32]) -> Vec<u8> {
    vectors.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vectors(bytes: &[u8]) -> Result<Vec<f32>, DomainError> {
    if bytes.len() % 4 != 0 {
        return Err(DomainError::corrupt(format!(
            "vector file has {} bytes, not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[async_trait]
impl IndexStore for LocalIndexStore {
    async fn load(&self) -> Result<VectorIndex, DomainError> {
        let manifest_path = self.dir.join(MANIFEST);
        let manifest = match tokio::fs::read(&manifest_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DomainError::IndexNotFound(self.location()));
            }
            Err(e) => {
                return Err(DomainError::corrupt(format!(
                    "{}: {e}",
                    manifest_path.display()
                )))
            }
        };

        let manifest: Manifest = serde_json::from_slice(&manifest)
            .map_err(|e| DomainError::corrupt(format!("{MANIFEST}: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(DomainError::corrupt(format!(
                "unsupported index format version {}",
                manifest.format_version
            )));
        }

        let segments: Vec<Segment> =
            serde_json::from_slice(&self.read(&manifest.segments_file).await?)
                .map_err(|e| DomainError::corrupt(format!("{}: {e}", manifest.segments_file)))?;
        if segments.len() != manifest.segment_count {
            return Err(DomainError::corrupt(format!(
                "manifest lists {} segments, {} holds {}",
                manifest.segment_count,
                manifest.segments_file,
                segments.len()
            )));
        }
        let vectors = decode_vectors(&self.read(&manifest.vectors_file).await?)?;

        let index =
            VectorIndex::from_parts(manifest.metadata, segments, vectors, manifest.documents)?;
        info!(
            location = %self.location(),
            segments = index.len(),
            documents = index.documents().len(),
            "index loaded"
        );
        Ok(index)
    }

    async fn persist(&self, index: &VectorIndex) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::io(format!("{}: {e}", self.dir.display())))?;

        let generation = Uuid::new_v4().simple().to_string();
        let segments_file = format!("{SEGMENTS_PREFIX}{generation}.json");
        let vectors_file = format!("{VECTORS_PREFIX}{generation}.bin");

        let segments = serde_json::to_vec(index.segments())
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            metadata: index.metadata().clone(),
            segment_count: index.len(),
            segments_file: segments_file.clone(),
            vectors_file: vectors_file.clone(),
            documents: index.documents().to_vec(),
            updated_at: Utc::now(),
        };
        let manifest =
            serde_json::to_vec_pretty(&manifest).map_err(|e| DomainError::internal(e.to_string()))?;

        self.write_atomic(&vectors_file, &encode_vectors(index.vectors()))
            .await?;
        self.write_atomic(&segments_file, &segments).await?;
        self.write_atomic(MANIFEST, &manifest).await?;

        self.remove_stale(&[segments_file.as_str(), vectors_file.as_str()])
            .await;

        debug!(location = %self.location(), %generation, segments = index.len(), "index persisted");
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
