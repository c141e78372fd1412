use std::sync::Arc;

use crate::application::{DocumentService, IndexService, QaPipeline, RagService};
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QaPipeline>,
    pub documents: Arc<DocumentService>,
    pub index: Arc<IndexService>,
    pub rag: Arc<RagService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<QaPipeline>,
        documents: Arc<DocumentService>,
        index: Arc<IndexService>,
        rag: Arc<RagService>,
        config: AppConfig,
    ) -> Self {
        Self {
            pipeline,
            documents,
            index,
            rag,
            config: Arc::new(config),
        }
    }
}
