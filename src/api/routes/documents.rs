use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::chat::{sources, SourceResponse};
use crate::api::{error::ApiError, state::AppState};
use crate::application::IngestReport;
use crate::domain::{DomainError, FileKind, IndexedDocument};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SourceResponse>,
}

/// Accepts one or more files, ingests them into the shared index and
/// removes the uploaded bytes afterwards whatever the outcome.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    let dir = state.config.config.upload.dir.clone();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DomainError::io(format!("{}: {e}", dir.display())))?;

    let mut saved = Vec::new();
    let result = match receive_files(&mut multipart, &dir, &mut saved).await {
        Ok(()) => state.documents.load_named_documents(&saved).await,
        Err(e) => Err(e),
    };

    for (_, path, _) in &saved {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove uploaded file");
        }
    }

    Ok(Json(result?))
}

async fn receive_files(
    multipart: &mut Multipart,
    dir: &Path,
    saved: &mut Vec<(String, PathBuf, FileKind)>,
) -> Result<(), DomainError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::validation(e.body_text()))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let kind = FileKind::from_path(&name)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::validation(e.body_text()))?;

        let ext = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(kind.as_str());
        let path = dir.join(format!("{}.{ext}", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| DomainError::io(format!("{}: {e}", path.display())))?;
        saved.push((name, path, kind));
    }
    Ok(())
}

pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<IndexedDocument>>, ApiError> {
    match state.index.active().await {
        Ok(index) => Ok(Json(index.documents().to_vec())),
        Err(DomainError::NoIndexLoaded) => Ok(Json(Vec::new())),
        Err(e) => Err(e.into()),
    }
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let index = state.index.active().await?;
    let top_k = request.top_k.unwrap_or(state.rag.default_top_k());
    let retrieved = state
        .rag
        .retrieve_top_k(&index, &request.query, top_k)
        .await?;

    Ok(Json(SearchResponse {
        query: retrieved.query.clone(),
        results: sources(retrieved),
    }))
}
