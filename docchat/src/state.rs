//! Shared application state.

use docchat_agents::{
    agent::{AgentConfig, ChatAgent},
    tool::QueryDocumentTool,
};
use docchat_core::{ChatLlm, Node, Retriever, config::AppConfig};
use docchat_integrations::{DirectoryLoader, KeywordRetriever, OpenAiChatClient};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

/// State shared by every request.
///
/// The agent and retriever are built once at startup; each chat request
/// starts its own isolated run.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The chat agent
    pub agent: ChatAgent,
    /// Retriever backing the `query_document` tool, checked before each run
    pub retriever: Arc<dyn Retriever>,
    /// Directory the source files are served from
    pub data_dir: PathBuf,
}

impl AppState {
    /// Assemble state from prebuilt parts.
    pub fn new(agent: ChatAgent, retriever: Arc<dyn Retriever>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            agent,
            retriever,
            data_dir: data_dir.into(),
        }
    }

    /// Build the agent around an LLM and retriever using the configured workflow settings.
    pub fn with_capabilities(
        config: &AppConfig,
        llm: Arc<dyn ChatLlm>,
        retriever: Arc<dyn Retriever>,
    ) -> docchat_agents::Result<Self> {
        let tool = QueryDocumentTool::new(Arc::clone(&retriever)).with_top_k(config.retrieval.top_k);
        let agent = ChatAgent::builder(llm)
            .config(AgentConfig::from(&config.workflow))
            .tool(Arc::new(tool))
            .build()?;

        info!(
            model = %config.llm.model,
            tools = ?agent.tool_names(),
            max_iterations = config.workflow.max_iterations,
            "Chat agent ready"
        );
        Ok(Self::new(agent, retriever, &config.retrieval.data_dir))
    }

    /// Load the documents and connect the LLM client described by `config`.
    ///
    /// A missing or unreadable data directory is not fatal: the server starts
    /// with an empty index and chat requests report the missing index.
    pub async fn from_config(config: &AppConfig) -> docchat_agents::Result<Self> {
        let nodes = load_nodes(&config.retrieval.data_dir).await;
        let retriever: Arc<dyn Retriever> = Arc::new(KeywordRetriever::from_nodes(nodes));
        let llm: Arc<dyn ChatLlm> = Arc::new(OpenAiChatClient::new(config.llm.clone())?);
        Self::with_capabilities(config, llm, retriever)
    }
}

async fn load_nodes(data_dir: &Path) -> Vec<Node> {
    let loaded = match DirectoryLoader::new(data_dir) {
        Ok(loader) => loader.load().await,
        Err(e) => Err(e),
    };
    loaded.unwrap_or_else(|e| {
        warn!(
            data_dir = %data_dir.display(),
            error = %e,
            "No documents loaded"
        );
        Vec::new()
    })
}
