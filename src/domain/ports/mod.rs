mod embedding;
mod extractor;
mod index_store;
mod llm;

pub use embedding::EmbeddingService;
pub use extractor::TextExtractor;
pub use index_store::IndexStore;
pub use llm::LlmService;
