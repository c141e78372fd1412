mod document;
mod index;
mod pipeline;
mod prompt;
mod rag;

pub use document::DocumentService;
pub use index::{IndexService, IndexStatus, IngestReport};
pub use pipeline::{Answer, AskState, GenerationStage, QaPipeline, RetrievalStage, Stage};
pub use prompt::{count_tokens, ComposedPrompt, PromptComposer};
pub use rag::RagService;
