//! Configuration for the chat language model.

use serde::{Deserialize, Serialize};

use crate::{DocchatError, Result};

/// Default endpoint of the OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the chat language model.
///
/// # Examples
///
/// ```rust
/// use docchat_core::config::LlmConfig;
///
/// let config = LlmConfig::new("gpt-4o-mini")
///     .with_api_key("sk-test")
///     .with_temperature(0.2)
///     .with_max_tokens(1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Model name or identifier.
    pub model: String,

    /// API key for authentication.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,

    /// Temperature for generation (0.0 to 2.0).
    pub temperature: Option<f32>,

    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl LlmConfig {
    /// Create a new LLM configuration for `model`.
    pub fn new<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: 120,
        }
    }

    /// Set the API key.
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(DocchatError::configuration("Model cannot be empty"));
        }

        if let Some(temp) = self.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(DocchatError::configuration(
                    "Temperature must be between 0.0 and 2.0",
                ));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(DocchatError::configuration(
                "Max tokens must be greater than 0",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(DocchatError::configuration(
                "Timeout must be greater than 0",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(DocchatError::configuration(
                "Base URL must start with http:// or https://",
            ));
        }

        Ok(())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
