/// The AI suggestion service seam: prompt in, text out.
///
/// Implementations are expected to report "I can't do that" style answers as
/// plain text rather than errors, but transport failures still surface as
/// `AiError`. Callers in the pipeline never propagate these; they fall back.
use async_trait::async_trait;
use tracing::debug;

use crate::error::CommonError;
use crate::openai::{ChatCompletionRequest, Message, OpenAiClient, OpenAiClientConfig, OpenAiClientError};

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("suggestion service request failed: {0}")]
    Request(String),

    #[error("suggestion service returned no text")]
    Empty,
}

impl From<OpenAiClientError> for AiError {
    fn from(e: OpenAiClientError) -> Self {
        AiError::Request(e.to_string())
    }
}

#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, AiError>;
}

/// `SuggestionService` backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiSuggestionService {
    client: OpenAiClient,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiSuggestionService {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            temperature: 0.2,
            max_tokens: 1_200,
        }
    }

    pub fn from_env() -> Result<Self, CommonError> {
        let client = OpenAiClient::new(OpenAiClientConfig::from_env())?;
        Ok(Self::new(client))
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl SuggestionService for OpenAiSuggestionService {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, AiError> {
        let request = ChatCompletionRequest {
            model: self.client.config().model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(prompt)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };
        let response = self.client.chat_completions(request, None).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "suggestion service usage"
            );
        }
        let text = response.first_text().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(AiError::Empty);
        }
        Ok(text.to_string())
    }
}
