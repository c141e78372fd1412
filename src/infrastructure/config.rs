use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::domain::{ChunkParams, DomainError, RuleSet};

const DEFAULT_CONFIG_DIR: &str = "config";

/// Everything the service reads at startup.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub index: IndexConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "meta-llama/llama-3.2-3b-instruct:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub max_prompt_tokens: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            max_prompt_tokens: 3000,
        }
    }
}

impl RagConfig {
    pub fn chunk_params(&self) -> Result<ChunkParams, DomainError> {
        ChunkParams::new(self.chunk_size, self.chunk_overlap)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
    pub io_timeout_seconds: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/index"),
            io_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("docqa-uploads"),
            max_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub assistant: RuleSet,
}

impl AppConfig {
    /// Loads `config.yaml` and `prompts.yaml` from `CONFIG_DIR` (default
    /// `config/`), applies environment overrides and validates the result.
    /// Missing files fall back to defaults.
    pub fn load() -> Result<Self, DomainError> {
        let dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.into());
        let dir = Path::new(&dir);

        let config_yaml = read_optional(&dir.join("config.yaml"))?;
        let prompts_yaml = read_optional(&dir.join("prompts.yaml"))?;

        let mut app = Self::from_yaml(config_yaml.as_deref(), prompts_yaml.as_deref())?;
        app.apply_env_overrides()?;
        app.validate()?;
        Ok(app)
    }

    pub fn from_yaml(config: Option<&str>, prompts: Option<&str>) -> Result<Self, DomainError> {
        let config = match config {
            Some(yaml) => serde_yaml::from_str(yaml)
                .map_err(|e| DomainError::invalid_config(format!("config.yaml: {e}")))?,
            None => Config::default(),
        };
        let prompts = match prompts {
            Some(yaml) => serde_yaml::from_str(yaml)
                .map_err(|e| DomainError::invalid_config(format!("prompts.yaml: {e}")))?,
            None => PromptsConfig::default(),
        };
        Ok(Self { config, prompts })
    }

    fn apply_env_overrides(&mut self) -> Result<(), DomainError> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.config.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.config.server.port = port
                .parse()
                .map_err(|_| DomainError::invalid_config(format!("SERVER_PORT '{port}'")))?;
        }
        if let Ok(path) = std::env::var("INDEX_PATH") {
            self.config.index.path = PathBuf::from(path);
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.config.llm.model = model;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            self.config.llm.base_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let c = &self.config;
        c.rag.chunk_params()?;
        if c.rag.top_k == 0 {
            return Err(DomainError::invalid_config("rag.top_k must be at least 1"));
        }
        if c.rag.max_prompt_tokens == 0 {
            return Err(DomainError::invalid_config(
                "rag.max_prompt_tokens must be greater than zero",
            ));
        }
        if c.embedding.dimension == 0 {
            return Err(DomainError::invalid_config(
                "embedding.dimension must be greater than zero",
            ));
        }
        for (name, secs) in [
            ("llm.timeout_seconds", c.llm.timeout_seconds),
            ("embedding.timeout_seconds", c.embedding.timeout_seconds),
            ("index.io_timeout_seconds", c.index.io_timeout_seconds),
        ] {
            if secs == 0 {
                return Err(DomainError::invalid_config(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        let rules = &self.prompts.assistant;
        if rules.not_found_refusal.trim().is_empty() || rules.out_of_scope_refusal.trim().is_empty()
        {
            return Err(DomainError::invalid_config(
                "both refusal sentences must be configured",
            ));
        }
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, DomainError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!(path = %path.display(), "loaded configuration file");
            Ok(Some(text))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DomainError::invalid_config(format!(
            "{}: {e}",
            path.display()
        ))),
    }
}
