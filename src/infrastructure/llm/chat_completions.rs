//! Generator backed by an OpenAI-compatible `/chat/completions` endpoint
//! (OpenRouter by default).
//!
//! Failures are classified from the HTTP status and the transport error kind,
//! never from message text.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ports::LlmService, GenerationError, GenerationErrorKind};
use crate::infrastructure::config::LlmConfig;

pub struct ChatCompletionsLlm {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsLlm {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Reads the API key from the variable named by `api_key_env`. A missing
    /// key is not fatal here: the service will answer with an auth failure.
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_else(|_| {
            warn!(var = %config.api_key_env, "LLM API key not set");
            String::new()
        });
        Self::new(&config.base_url, &config.model, api_key)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn classify_status(status: StatusCode) -> GenerationErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::PAYMENT_REQUIRED => {
            GenerationErrorKind::Auth
        }
        StatusCode::TOO_MANY_REQUESTS => GenerationErrorKind::RateLimit,
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => GenerationErrorKind::Network,
        _ => GenerationErrorKind::Unknown,
    }
}

fn classify_transport(err: &reqwest::Error) -> GenerationErrorKind {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        GenerationErrorKind::Network
    } else if let Some(status) = err.status() {
        classify_status(status)
    } else {
        GenerationErrorKind::Unknown
    }
}

#[async_trait]
impl LlmService for ChatCompletionsLlm {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::new(classify_transport(&e), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::new(
                classify_status(status),
                format!("{status}: {detail}"),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::new(classify_transport(&e), e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::new(GenerationErrorKind::Unknown, "response had no content")
            })
    }
}
