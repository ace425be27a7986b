//! Handlers that make up the chat agent workflow.
//!
//! `Start` seeds the run, `Continue` calls the model, `ToolCallRequested`
//! executes one tool, and `ToolCallCompleted` gathers a batch of tool results
//! before re-entering the model loop.

use crate::{
    agent::{
        chat_agent::AgentConfig,
        events::{AgentEvent, ToolCallOutcome},
        state::{AgentRunState, ToolBatch},
    },
    error::{AgentError, Result},
    parts::{RunStatus, RunStatusEvent, SourceEvent, TextPart},
    suggestion::SuggestionGenerator,
    tool::Tool,
    workflow::{EventHandler, RunContext, WorkflowEvent},
};
use async_trait::async_trait;
use docchat_core::{ChatLlm, ChatMessage, LlmStreamUnit, ToolCall, ToolDefinition};
use futures::StreamExt;
use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

type AgentContext = RunContext<AgentEvent, AgentRunState>;

/// Capabilities and settings shared by every run of one agent
#[derive(Debug)]
pub(crate) struct AgentCore {
    pub llm: Arc<dyn ChatLlm>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub tool_definitions: Vec<ToolDefinition>,
    pub config: AgentConfig,
    pub suggestions: Option<SuggestionGenerator>,
}

impl AgentCore {
    fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    fn request_messages(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend(history.iter().cloned());
        messages
    }
}

fn unexpected(handler: &str, event: &AgentEvent) -> AgentError {
    AgentError::handler_failed(handler, format!("unexpected event {:?}", event.kind()))
}

/// Emit `text-end` if the run's text block is open
fn close_text_block(ctx: &mut AgentContext) {
    let state = ctx.state_mut();
    if state.text_started && !state.text_ended {
        state.text_ended = true;
        let id = state.text_block_id.clone();
        ctx.emit(AgentEvent::Text(TextPart::TextEnd { id }));
    }
}

/// Seeds run state from the start event
pub(crate) struct StartHandler;

#[async_trait]
impl EventHandler<AgentEvent, AgentRunState> for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    async fn handle(&self, event: AgentEvent, ctx: &mut AgentContext) -> Result<()> {
        let AgentEvent::Start(start) = event else {
            return Err(unexpected(self.name(), &event));
        };

        info!(history = start.chat_history.len(), "Starting chat run");
        *ctx.state_mut() = AgentRunState::new(
            start.chat_history,
            start.user_input,
            Uuid::new_v4().to_string(),
        );
        ctx.emit(AgentEvent::Continue);
        Ok(())
    }
}

/// Calls the language model and routes its output
pub(crate) struct LlmCallHandler {
    pub core: Arc<AgentCore>,
}

impl LlmCallHandler {
    async fn finish(&self, ctx: &mut AgentContext) {
        close_text_block(ctx);

        if let Some(generator) = &self.core.suggestions {
            let conversation = ctx.state().suggestion_conversation();
            let questions = generator.generate(&conversation).await;
            if !questions.is_empty() {
                ctx.emit(AgentEvent::Suggestion(questions));
            }
        }

        ctx.emit(AgentEvent::Stop);
    }
}

#[async_trait]
impl EventHandler<AgentEvent, AgentRunState> for LlmCallHandler {
    fn name(&self) -> &str {
        "call_llm"
    }

    async fn handle(&self, event: AgentEvent, ctx: &mut AgentContext) -> Result<()> {
        if !matches!(event, AgentEvent::Continue) {
            return Err(unexpected(self.name(), &event));
        }

        let iteration = {
            let state = ctx.state_mut();
            state.iterations += 1;
            state.iterations
        };
        if iteration > self.core.config.max_iterations {
            warn!(
                max_iterations = self.core.config.max_iterations,
                "Iteration limit reached, stopping run"
            );
            close_text_block(ctx);
            ctx.emit(AgentEvent::Stop);
            return Ok(());
        }

        let block_id = ctx.state().text_block_id.clone();
        if !ctx.state().text_started {
            ctx.state_mut().text_started = true;
            ctx.emit(AgentEvent::Text(TextPart::TextStart {
                id: block_id.clone(),
            }));
        }

        let messages = self.core.request_messages(&ctx.state().messages);
        debug!(iteration, messages = messages.len(), model = self.core.llm.model_name(), "Calling language model");
        let mut stream = self
            .core
            .llm
            .chat_stream(&messages, &self.core.tool_definitions)
            .await?;

        let mut turn_text = String::new();
        let mut tool_calls: IndexMap<String, ToolCall> = IndexMap::new();
        while let Some(unit) = stream.next().await {
            match unit? {
                LlmStreamUnit::TextDelta(delta) => {
                    if delta.is_empty() {
                        continue;
                    }
                    turn_text.push_str(&delta);
                    ctx.state_mut().response_text.push_str(&delta);
                    ctx.emit(AgentEvent::Text(TextPart::TextDelta {
                        id: block_id.clone(),
                        delta,
                    }));
                }
                LlmStreamUnit::ToolCall(call) => {
                    if let Some(previous) = tool_calls.insert(call.id.clone(), call) {
                        debug!(tool_call_id = %previous.id, "Replacing duplicate tool call");
                    }
                }
            }
        }

        if tool_calls.is_empty() {
            ctx.state_mut()
                .messages
                .push(ChatMessage::assistant(turn_text));
            self.finish(ctx).await;
            return Ok(());
        }

        let calls: Vec<ToolCall> = tool_calls.into_values().collect();
        info!(count = calls.len(), "Model requested tool calls");
        let state = ctx.state_mut();
        state
            .messages
            .push(ChatMessage::assistant_with_tool_calls(turn_text, calls.clone()));
        state.expect_tool_calls(calls.len());
        for call in calls {
            ctx.emit(AgentEvent::ToolCallRequested(call));
        }
        Ok(())
    }
}

/// Executes one requested tool call
pub(crate) struct ToolCallHandler {
    pub core: Arc<AgentCore>,
}

impl ToolCallHandler {
    fn describe(call: &ToolCall) -> String {
        match call.input.get("query").and_then(|query| query.as_str()) {
            Some(query) => format!("Querying documents for: {query}"),
            None => format!("Input: {}", call.input),
        }
    }
}

#[async_trait]
impl EventHandler<AgentEvent, AgentRunState> for ToolCallHandler {
    fn name(&self) -> &str {
        "call_tool"
    }

    async fn handle(&self, event: AgentEvent, ctx: &mut AgentContext) -> Result<()> {
        let AgentEvent::ToolCallRequested(call) = event else {
            return Err(unexpected(self.name(), &event));
        };

        let title = format!("Calling tool {}", call.name);
        ctx.emit(AgentEvent::RunStatus(RunStatusEvent::new(
            call.id.clone(),
            title.clone(),
            Self::describe(&call),
            RunStatus::Pending,
        )));

        let result = match self.core.find_tool(&call.name) {
            Some(tool) => tool.execute(&call.input).await,
            None => Err(AgentError::tool(&call.name, "Tool not found")),
        };

        let outcome = match result {
            Ok(output) => {
                let count = output.source_nodes.len();
                debug!(tool = %call.name, sources = count, "Tool call succeeded");
                ctx.emit(AgentEvent::RunStatus(
                    RunStatusEvent::new(
                        call.id.clone(),
                        title,
                        format!("Found {count} relevant source(s)"),
                        RunStatus::Success,
                    )
                    .with_data(json!({ "sourceCount": count })),
                ));
                ctx.emit(AgentEvent::SourceAttribution(SourceEvent {
                    nodes: output.source_nodes,
                }));
                ToolCallOutcome::success(&call, output.response_text)
            }
            Err(err) => {
                warn!(tool = %call.name, category = err.category(), "Tool call failed: {err}");
                ctx.emit(AgentEvent::RunStatus(RunStatusEvent::new(
                    call.id.clone(),
                    title,
                    err.to_string(),
                    RunStatus::Error,
                )));
                ToolCallOutcome::failure(&call, err.to_string())
            }
        };

        ctx.emit(AgentEvent::ToolCallCompleted(outcome));
        Ok(())
    }
}

/// Gathers tool outcomes and decides whether the loop continues
pub(crate) struct ToolResultHandler;

#[async_trait]
impl EventHandler<AgentEvent, AgentRunState> for ToolResultHandler {
    fn name(&self) -> &str {
        "collect_tool_results"
    }

    async fn handle(&self, event: AgentEvent, ctx: &mut AgentContext) -> Result<()> {
        let AgentEvent::ToolCallCompleted(outcome) = event else {
            return Err(unexpected(self.name(), &event));
        };

        match ctx.state_mut().record_tool_response(outcome) {
            ToolBatch::Pending => return Ok(()),
            ToolBatch::Unexpected(outcome) => {
                warn!(tool_call_id = %outcome.tool_call_id, "Ignoring unexpected tool result");
                return Ok(());
            }
            ToolBatch::Complete => {}
        }

        let responses = ctx.state_mut().take_tool_responses();
        if responses.iter().any(|response| response.is_error) {
            warn!("Tool call failed, stopping run");
            close_text_block(ctx);
            ctx.emit(AgentEvent::Stop);
            return Ok(());
        }

        let state = ctx.state_mut();
        for response in responses {
            state
                .messages
                .push(ChatMessage::tool_result(response.tool_call_id, response.result));
        }
        ctx.emit(AgentEvent::Continue);
        Ok(())
    }
}
