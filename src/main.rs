use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use docqa_agent::api::{create_router, AppState};
use docqa_agent::application::{
    DocumentService, GenerationStage, IndexService, PromptComposer, QaPipeline, RagService,
    RetrievalStage,
};
use docqa_agent::domain::DomainError;
use docqa_agent::infrastructure::{
    AppConfig, ChatCompletionsLlm, FileTextExtractor, LocalIndexStore, TextEmbedding,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api=debug,docqa_agent=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let app_config = AppConfig::load()?;
    let config = &app_config.config;
    info!(
        model = %config.llm.model,
        embedding_model = %config.embedding.model,
        index = %config.index.path.display(),
        "configuration loaded"
    );

    let embedding = Arc::new(TextEmbedding::from_config(&config.embedding));
    let store = Arc::new(LocalIndexStore::new(&config.index.path));
    let index = Arc::new(
        IndexService::new(embedding.clone(), store, config.rag.chunk_params()?).with_timeouts(
            Duration::from_secs(config.embedding.timeout_seconds),
            Duration::from_secs(config.index.io_timeout_seconds),
        ),
    );
    let rag = Arc::new(
        RagService::new(embedding, config.rag.top_k)?
            .with_timeout(Duration::from_secs(config.embedding.timeout_seconds)),
    );
    let composer = PromptComposer::new(
        app_config.prompts.assistant.clone(),
        config.rag.max_prompt_tokens,
    )?;
    let llm = Arc::new(ChatCompletionsLlm::from_config(&config.llm));
    let pipeline = Arc::new(QaPipeline::new(
        RetrievalStage::new(index.clone(), rag.clone()),
        GenerationStage::new(
            composer,
            llm,
            Duration::from_secs(config.llm.timeout_seconds),
        ),
    ));
    let documents = Arc::new(DocumentService::new(
        Arc::new(FileTextExtractor::new()),
        index.clone(),
    ));

    match index.active().await {
        Ok(active) => info!(
            segments = active.len(),
            documents = active.documents().len(),
            "persisted index activated"
        ),
        Err(DomainError::NoIndexLoaded) => info!("no persisted index yet, waiting for uploads"),
        Err(e) => warn!(error = %e, "persisted index unusable, next upload will rebuild it"),
    }

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = AppState::new(pipeline, documents, index, rag, app_config);
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
