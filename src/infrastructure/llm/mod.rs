mod chat_completions;

pub use chat_completions::{classify_status, ChatCompletionsLlm};
