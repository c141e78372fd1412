use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;
use tracing::debug;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// OpenAI embeddings through rig. Reads `OPENAI_API_KEY` from the environment.
pub struct TextEmbedding {
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }
}

/// Embeds `texts` in sub-batches of at most `M::MAX_DOCUMENTS`, returning one
/// normalized vector per input in input order.
pub(crate) async fn embed_in_order<M: EmbeddingModel>(
    model: &M,
    texts: &[&str],
) -> Result<Vec<Embedding>, DomainError> {
    let mut embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(M::MAX_DOCUMENTS.max(1)) {
        let owned: Vec<String> = batch.iter().map(|t| t.to_string()).collect();
        let vectors = model
            .embed_texts(owned)
            .await
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        if vectors.len() != batch.len() {
            return Err(DomainError::embedding(format!(
                "requested {} embeddings, received {}",
                batch.len(),
                vectors.len()
            )));
        }
        embeddings.extend(vectors.into_iter().map(|emb| {
            let vec_f32: Vec<f32> = emb.vec.into_iter().map(|x| x as f32).collect();
            Embedding::new(vec_f32).normalized()
        }));
    }

    Ok(embeddings)
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, batch_size = texts.len(), "embedding batch");

        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);
        embed_in_order(&model, texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
