//! Mutable state of one chat run.

use crate::agent::events::ToolCallOutcome;
use docchat_core::{ChatMessage, MessageRole};

/// Effect of recording a tool outcome
#[derive(Debug, Clone, PartialEq)]
pub enum ToolBatch {
    /// More outcomes are expected
    Pending,
    /// Every expected outcome has arrived
    Complete,
    /// No outcome was expected; the value is returned untouched
    Unexpected(ToolCallOutcome),
}

/// Per-run agent state
#[derive(Debug, Clone, Default)]
pub struct AgentRunState {
    /// Conversation sent to the model, without the system prompt
    pub messages: Vec<ChatMessage>,
    /// Index of the current user message in `messages`
    pub turn_start: usize,
    /// Tool calls issued by the last model turn
    pub expected_tool_count: usize,
    /// Outcomes received for the last model turn
    pub tool_responses: Vec<ToolCallOutcome>,
    /// Id of this run's text block
    pub text_block_id: String,
    /// Whether `text-start` was emitted
    pub text_started: bool,
    /// Whether `text-end` was emitted
    pub text_ended: bool,
    /// All assistant text streamed in this run
    pub response_text: String,
    /// Model calls made so far
    pub iterations: usize,
}

impl AgentRunState {
    /// Start a new run from prior history and the user's input
    pub fn new(chat_history: Vec<ChatMessage>, user_input: String, text_block_id: String) -> Self {
        let mut messages = chat_history;
        let turn_start = messages.len();
        messages.push(ChatMessage::user(user_input));
        Self {
            messages,
            turn_start,
            text_block_id,
            ..Self::default()
        }
    }

    /// Expect `count` outcomes from a new batch of tool calls
    pub fn expect_tool_calls(&mut self, count: usize) {
        self.expected_tool_count = count;
        self.tool_responses.clear();
    }

    /// Record one tool outcome.
    ///
    /// The number of stored outcomes never exceeds the number expected.
    pub fn record_tool_response(&mut self, outcome: ToolCallOutcome) -> ToolBatch {
        if self.tool_responses.len() >= self.expected_tool_count {
            return ToolBatch::Unexpected(outcome);
        }
        self.tool_responses.push(outcome);
        if self.tool_responses.len() == self.expected_tool_count {
            ToolBatch::Complete
        } else {
            ToolBatch::Pending
        }
    }

    /// Take the completed batch and reset the bookkeeping
    pub fn take_tool_responses(&mut self) -> Vec<ToolCallOutcome> {
        self.expected_tool_count = 0;
        std::mem::take(&mut self.tool_responses)
    }

    /// Conversation used to suggest follow-up questions.
    ///
    /// Prior user and assistant messages, the current user message, and one
    /// assistant message holding everything streamed in this run.
    pub fn suggestion_conversation(&self) -> Vec<ChatMessage> {
        let end = (self.turn_start + 1).min(self.messages.len());
        let mut conversation: Vec<ChatMessage> = self.messages[..end]
            .iter()
            .filter(|message| {
                matches!(message.role, MessageRole::User | MessageRole::Assistant)
                    && !message.has_tool_calls()
            })
            .cloned()
            .collect();
        conversation.push(ChatMessage::assistant(self.response_text.clone()));
        conversation
    }
}
