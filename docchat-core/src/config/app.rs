//! Process configuration loaded from environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::llm::{DEFAULT_BASE_URL, LlmConfig};
use crate::{DocchatError, Result};

/// Default agent loop ceiling.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Agent workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    /// Maximum number of LLM calls in one run.
    pub max_iterations: usize,
    /// Whether follow-up questions are generated after each answer.
    pub suggest_next_questions: bool,
    /// Override for the follow-up question prompt template.
    pub next_question_prompt: Option<String>,
    /// System prompt prepended to every LLM call.
    pub system_prompt: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            suggest_next_questions: false,
            next_question_prompt: None,
            system_prompt: None,
        }
    }
}

/// Built-in retriever settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Directory holding the documents to search.
    pub data_dir: PathBuf,
    /// Number of fragments returned per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            top_k: crate::types::DEFAULT_TOP_K,
        }
    }
}

/// Complete process configuration.
///
/// # Examples
///
/// ```rust
/// use docchat_core::config::AppConfig;
/// use std::collections::HashMap;
///
/// let env: HashMap<&str, &str> = [("MODEL", "gpt-4o"), ("OPENAI_API_KEY", "sk-test")].into();
/// let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
/// assert_eq!(config.llm.model, "gpt-4o");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Language model settings.
    pub llm: LlmConfig,
    /// Agent workflow settings.
    pub workflow: WorkflowConfig,
    /// Retriever settings.
    pub retrieval: RetrievalConfig,
    /// Tracing filter directive.
    pub log_filter: String,
}

impl AppConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| ServerConfig::default().host),
            port: parse_or(&get, "PORT", ServerConfig::default().port)?,
        };

        let mut llm = LlmConfig::new(get("MODEL").unwrap_or_else(|| LlmConfig::default().model))
            .with_base_url(get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
            .with_timeout(parse_or(&get, "LLM_TIMEOUT_SECONDS", 120)?);
        llm.api_key = get("OPENAI_API_KEY");
        llm.max_tokens = parse_opt(&get, "LLM_MAX_TOKENS")?;
        llm.temperature = parse_opt(&get, "LLM_TEMPERATURE")?;

        let workflow = WorkflowConfig {
            max_iterations: parse_or(&get, "MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?,
            suggest_next_questions: get("SUGGEST_NEXT_QUESTIONS").as_deref() == Some("true"),
            next_question_prompt: get("NEXT_QUESTION_PROMPT"),
            system_prompt: get("SYSTEM_PROMPT"),
        };

        let retrieval = RetrievalConfig {
            data_dir: get("DATA_DIR").map_or_else(|| RetrievalConfig::default().data_dir, PathBuf::from),
            top_k: parse_or(&get, "TOP_K", crate::types::DEFAULT_TOP_K)?,
        };

        Ok(Self {
            server,
            llm,
            workflow,
            retrieval,
            log_filter: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.llm.validate()?;

        if self.llm.base_url == DEFAULT_BASE_URL && self.llm.api_key.is_none() {
            return Err(DocchatError::configuration(
                "OPENAI_API_KEY is required when using the default OpenAI endpoint",
            ));
        }

        if self.workflow.max_iterations == 0 {
            return Err(DocchatError::configuration(
                "MAX_ITERATIONS must be greater than 0",
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(DocchatError::configuration("TOP_K must be greater than 0"));
        }

        if let Some(prompt) = &self.workflow.next_question_prompt {
            if !prompt.contains("{conversation}") {
                tracing::warn!("NEXT_QUESTION_PROMPT has no {{conversation}} placeholder");
            }
        }

        Ok(())
    }
}

fn parse_opt<T, F>(get: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                DocchatError::configuration(format!("Invalid value for {key} ({raw}): {e}"))
            })
        })
        .transpose()
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}
