use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::{RetrievalResult, SearchResult};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceResponse>,
}

/// One retrieved segment, as shown to the caller.
#[derive(Debug, Serialize)]
pub struct SourceResponse {
    pub document_id: Uuid,
    pub source: String,
    pub position: usize,
    pub score: f32,
    pub content: String,
}

impl From<SearchResult> for SourceResponse {
    fn from(hit: SearchResult) -> Self {
        Self {
            document_id: hit.segment.document_id,
            source: hit.segment.source,
            position: hit.segment.position,
            score: hit.score,
            content: hit.segment.content,
        }
    }
}

pub fn sources(retrieved: RetrievalResult) -> Vec<SourceResponse> {
    retrieved.hits.into_iter().map(SourceResponse::from).collect()
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let answer = state.pipeline.ask(&request.question).await?;

    Ok(Json(ChatResponse {
        answer: answer.answer,
        sources: sources(answer.retrieved),
    }))
}
