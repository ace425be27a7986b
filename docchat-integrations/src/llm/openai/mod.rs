//! Client for OpenAI-compatible chat completion APIs.

mod stream;
mod wire;

use async_trait::async_trait;
use docchat_core::{
    ChatLlm, ChatMessage, DocchatError, LlmStream, Result, ToolDefinition, config::LlmConfig,
};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use self::wire::{
    ApiErrorEnvelope, ChatCompletionRequest, ChatCompletionResponse, WireMessage, WireTool,
};

/// Streaming chat client for OpenAI-compatible endpoints.
///
/// Works against the OpenAI API and any server exposing the same
/// `/chat/completions` contract (local gateways, proxies).
///
/// # Examples
///
/// ```rust,no_run
/// use docchat_core::{ChatLlm, config::LlmConfig};
/// use docchat_integrations::llm::OpenAiChatClient;
///
/// # async fn example() -> docchat_core::Result<()> {
/// let client = OpenAiChatClient::new(LlmConfig::new("gpt-4o-mini").with_api_key("sk-..."))?;
/// let answer = client.generate_text("Say hello").await?;
/// println!("{answer}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiChatClient {
    /// Create a client from a validated configuration
    pub fn new(config: LlmConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DocchatError::configuration(format!("Failed to build HTTP client: {e}")))?;

        info!(
            model = %config.model,
            base_url = %config.base_url,
            "Created OpenAI-compatible chat client"
        );
        Ok(Self { http, config })
    }

    /// Client configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request<'a>(
        &'a self,
        messages: &[ChatMessage],
        tools: &'a [ToolDefinition],
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.iter().map(WireTool::from).collect(),
            stream,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn send(
        &self,
        body: &ChatCompletionRequest<'_>,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint();
        let mut request = self.http.post(&url).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to reach chat completions endpoint");
            DocchatError::llm(format!("Network error: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = %status, url = %url, "Chat completions endpoint returned an error");
        Err(Self::status_error(status, &body))
    }

    fn status_error(status: StatusCode, body: &str) -> DocchatError {
        let detail = serde_json::from_str::<ApiErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DocchatError::llm(format!("Authentication failed ({status}): {detail}"))
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
                DocchatError::llm(format!("Quota exceeded ({status}): {detail}"))
            }
            _ if status.is_server_error() => {
                DocchatError::llm(format!("Server error ({status}): {detail}"))
            }
            _ => DocchatError::llm(format!("API error ({status}): {detail}")),
        }
    }
}

#[async_trait]
impl ChatLlm for OpenAiChatClient {
    #[instrument(skip_all, fields(model = %self.config.model, messages = messages.len(), tools = tools.len()))]
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LlmStream> {
        let body = self.request(messages, tools, true);
        let response = self.send(&body, None).await?;
        debug!("Streaming chat completion started");
        Ok(stream::decode_chunks(response.bytes_stream()))
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = self.request(&[ChatMessage::user(prompt)], &[], false);
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let response = self.send(&body, Some(timeout)).await?;
        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DocchatError::llm(format!("Invalid completion response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DocchatError::llm("Completion response contained no text"))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
