//! Retrieval-augmented chat agent.

use crate::{
    agent::{
        events::{AgentEvent, AgentEventKind, StartEvent},
        handlers::{AgentCore, LlmCallHandler, StartHandler, ToolCallHandler, ToolResultHandler},
        state::AgentRunState,
    },
    error::{AgentError, Result},
    suggestion::SuggestionGenerator,
    tool::Tool,
    workflow::{Workflow, WorkflowRun},
};
use docchat_core::{
    ChatLlm,
    config::{DEFAULT_MAX_ITERATIONS, WorkflowConfig},
};
use std::{collections::HashSet, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Agent behaviour settings
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Maximum number of model calls per run
    pub max_iterations: usize,
    /// System prompt prepended to every model call
    pub system_prompt: Option<String>,
    /// Generate follow-up questions after a normal completion
    pub suggest_next_questions: bool,
    /// Custom follow-up prompt template
    pub next_question_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: None,
            suggest_next_questions: false,
            next_question_prompt: None,
        }
    }
}

impl From<&WorkflowConfig> for AgentConfig {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            system_prompt: config.system_prompt.clone(),
            suggest_next_questions: config.suggest_next_questions,
            next_question_prompt: config.next_question_prompt.clone(),
        }
    }
}

/// Builder for [`ChatAgent`]
#[derive(Debug)]
pub struct ChatAgentBuilder {
    llm: Arc<dyn ChatLlm>,
    tools: Vec<Arc<dyn Tool>>,
    config: AgentConfig,
}

impl ChatAgentBuilder {
    /// Register a tool
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set the agent configuration
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<ChatAgent> {
        if self.config.max_iterations == 0 {
            return Err(AgentError::validation(
                "max_iterations",
                "must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            let name = tool.name();
            if !seen.insert(name.clone()) {
                return Err(AgentError::validation(
                    "tools",
                    format!("duplicate tool name '{name}'"),
                ));
            }
        }

        let suggestions = self.config.suggest_next_questions.then(|| {
            SuggestionGenerator::new(Arc::clone(&self.llm))
                .with_prompt_template(self.config.next_question_prompt.clone())
        });
        let core = Arc::new(AgentCore {
            tool_definitions: self.tools.iter().map(|tool| tool.definition()).collect(),
            llm: self.llm,
            tools: self.tools,
            config: self.config,
            suggestions,
        });

        let workflow = Workflow::<AgentEvent, AgentRunState>::builder("chat_agent")
            .handler(&[AgentEventKind::Start], Arc::new(StartHandler))
            .handler(
                &[AgentEventKind::Continue],
                Arc::new(LlmCallHandler {
                    core: Arc::clone(&core),
                }),
            )
            .handler(
                &[AgentEventKind::ToolCallRequested],
                Arc::new(ToolCallHandler {
                    core: Arc::clone(&core),
                }),
            )
            .handler(&[AgentEventKind::ToolCallCompleted], Arc::new(ToolResultHandler))
            .build();

        info!(
            tools = core.tools.len(),
            max_iterations = core.config.max_iterations,
            suggestions = core.suggestions.is_some(),
            "Chat agent ready"
        );

        Ok(ChatAgent {
            workflow: Arc::new(workflow),
            core,
        })
    }
}

/// Chat agent that answers from retrieved documents.
///
/// One agent is shared by all requests; every call to [`ChatAgent::run`] gets
/// its own isolated state.
#[derive(Debug, Clone)]
pub struct ChatAgent {
    workflow: Arc<Workflow<AgentEvent, AgentRunState>>,
    core: Arc<AgentCore>,
}

impl ChatAgent {
    /// Start building an agent around a language model
    pub fn builder(llm: Arc<dyn ChatLlm>) -> ChatAgentBuilder {
        ChatAgentBuilder {
            llm,
            tools: Vec::new(),
            config: AgentConfig::default(),
        }
    }

    /// Agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.core.config
    }

    /// Names of the registered tools
    pub fn tool_names(&self) -> Vec<String> {
        self.core.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Start a run
    pub fn run(&self, input: StartEvent) -> WorkflowRun<AgentEvent> {
        self.run_with_cancellation(input, CancellationToken::new())
    }

    /// Start a run bound to a cancellation token
    pub fn run_with_cancellation(
        &self,
        input: StartEvent,
        cancel: CancellationToken,
    ) -> WorkflowRun<AgentEvent> {
        self.workflow.run_with_cancellation(
            AgentRunState::default(),
            AgentEvent::Start(input),
            cancel,
        )
    }
}
