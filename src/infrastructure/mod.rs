pub mod config;
pub mod embedding;
pub mod extractor;
pub mod llm;
pub mod vector_store;

pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::TextEmbedding;
pub use extractor::FileTextExtractor;
pub use llm::ChatCompletionsLlm;
pub use vector_store::{InMemoryIndexStore, LocalIndexStore};
