pub mod prompt;
pub mod providers;

use crate::config::AiConfig;
use crate::db::schema::SchemaDescription;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM connection error: {0}")]
    ConnectionError(String),
    #[error("LLM response error: {0}")]
    ResponseError(String),
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
    #[error("LLM prompt error: {0}")]
    PromptError(String),
}

/// A text-generation backend. Returns the model's raw answer to the SQL
/// prompt built from `question` and the rendered `schema`.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate_sql(&self, question: &str, schema: &str) -> Result<String, LlmError>;
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| LlmError::ConnectionError(e.to_string()))
}

pub struct LlmManager {
    backend: String,
    generator: Box<dyn SqlGenerator + Send + Sync>,
}

impl LlmManager {
    /// `Ok(None)` when the AI path is switched off.
    pub fn new(config: &AiConfig) -> Result<Option<Self>, LlmError> {
        let generator: Box<dyn SqlGenerator + Send + Sync> = match config.backend.as_str() {
            "none" | "" => return Ok(None),
            "gemini" => Box::new(providers::gemini::GeminiProvider::new(config)?),
            "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Some(Self::from_generator(&config.backend, generator)))
    }

    pub fn from_generator(backend: &str, generator: Box<dyn SqlGenerator + Send + Sync>) -> Self {
        Self {
            backend: backend.to_string(),
            generator,
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Asks the model for a query and cleans its answer down to one line.
    /// The result is not validated yet.
    pub async fn generate_sql(&self, question: &str, schema: &SchemaDescription) -> Result<String, LlmError> {
        let schema_text = prompt::render_schema(schema)?;
        let raw = self.generator.generate_sql(question, &schema_text).await?;
        debug!("Raw response from {}: {}", self.backend, raw);

        prompt::extract_candidate(&raw)
            .ok_or_else(|| LlmError::ResponseError("Model returned no SQL".to_string()))
    }
}
