use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::error::EngineError;

/// Structured response mode requested from the completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    JsonObject,
}

/// One completion call.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub response_format: Option<ResponseFormat>,
}

/// The external LLM capability consumed by the engine: chat completions and
/// text embeddings. Implementations surface rate limiting through their
/// retry policy; everything else propagates immediately.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Issue a single chat completion and return the reply text.
    async fn complete(&self, params: CompletionParams) -> Result<String, EngineError>;

    /// Embed `text`. Fails on empty/whitespace-only input; callers guard.
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, EngineError>;
}

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Exponential backoff delay for retry `attempt` (0-based): 1s, 2s, 4s, ...
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

/// Gateway speaking the OpenAI-compatible wire format over HTTP.
///
/// Works against OpenAI itself or any compatible server. HTTP 429 responses
/// are retried with exponential backoff up to the configured ceiling; all
/// other failures propagate without retry.
#[derive(Clone)]
pub struct OpenAiGateway {
    api_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiGateway {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self::with_max_retries(api_url, api_key, DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(api_url: String, api_key: String, max_retries: u32) -> Self {
        Self {
            api_url,
            api_key,
            max_retries: max_retries.max(1),
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, url: &str, body: &impl Serialize) -> reqwest::RequestBuilder {
        let mut req = self.client.post(url).json(body);
        // No auth header for local models served without a key.
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }
        req
    }

    /// POST `body` to `url`, retrying on HTTP 429, and return the response
    /// body text of the first success.
    async fn post_with_retry(
        &self,
        url: &str,
        body: &impl Serialize,
        what: &str,
    ) -> Result<String, EngineError> {
        for attempt in 0..self.max_retries {
            let response = self
                .request(url, body)
                .send()
                .await
                .map_err(|e| EngineError::gateway_with(format!("failed to send {what} request"), e))?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt + 1 < self.max_retries {
                    let wait = backoff_delay(attempt);
                    tracing::warn!(
                        "{} rate limited, retrying in {}s (attempt {}/{})",
                        what,
                        wait.as_secs(),
                        attempt + 1,
                        self.max_retries
                    );
                    sleep(wait).await;
                    continue;
                }
                return Err(EngineError::gateway(format!(
                    "{what} rate limited: retries exhausted"
                )));
            }

            if !status.is_success() {
                let detail = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read body".to_string());
                return Err(EngineError::gateway(format!(
                    "{what} returned {status}: {detail}"
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| EngineError::gateway_with(format!("failed to read {what} response"), e));
        }

        Err(EngineError::gateway(format!(
            "{what} rate limited: retries exhausted"
        )))
    }
}

#[async_trait]
impl Gateway for OpenAiGateway {
    async fn complete(&self, params: CompletionParams) -> Result<String, EngineError> {
        let url = format!("{}/chat/completions", self.api_url);
        let request = ChatCompletionRequest {
            model: params.model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: params.system_prompt,
                },
                Message {
                    role: "user".to_string(),
                    content: params.user_prompt,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            response_format: params.response_format.map(|f| match f {
                ResponseFormat::JsonObject => ResponseFormatBody {
                    format_type: "json_object",
                },
            }),
        };

        let body = self.post_with_retry(&url, &request, "completion").await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| EngineError::gateway_with("failed to parse completion response", e))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EngineError::gateway("completion response contained no choices"))
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::Validation(
                "cannot embed empty text".to_string(),
            ));
        }

        let url = format!("{}/embeddings", self.api_url);
        let request = EmbeddingRequest {
            model: model.to_string(),
            input: text.to_string(),
        };

        let body = self.post_with_retry(&url, &request, "embedding").await?;
        let parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| EngineError::gateway_with("failed to parse embedding response", e))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EngineError::gateway("embedding response contained no data"))
    }
}
