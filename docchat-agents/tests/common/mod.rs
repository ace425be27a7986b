//! Shared mocks for agent integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docchat_core::{
    ChatLlm, ChatMessage, DocchatError, LlmStream, LlmStreamUnit, Node, Query, Retriever,
    ScoredNode, ToolCall, ToolDefinition, types::FILE_NAME_KEY,
};
use futures::{StreamExt, stream};
use serde_json::json;
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// LLM that replays scripted turns, then repeats a fallback turn.
#[derive(Debug)]
pub struct ScriptedLlm {
    turns: Mutex<VecDeque<Vec<LlmStreamUnit>>>,
    fallback: Vec<LlmStreamUnit>,
    suggestion: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(turns: Vec<Vec<LlmStreamUnit>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            fallback: vec![text("Done.")],
            suggestion: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fallback(mut self, fallback: Vec<LlmStreamUnit>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_suggestion(mut self, answer: impl Into<String>) -> Self {
        self.suggestion = Some(answer.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatLlm for ScriptedLlm {
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> docchat_core::Result<LlmStream> {
        assert!(!tools.is_empty(), "agent should advertise its tools");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());
        let units = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(Box::pin(stream::iter(units.into_iter().map(Ok))))
    }

    async fn generate_text(&self, _prompt: &str) -> docchat_core::Result<String> {
        self.suggestion
            .clone()
            .ok_or_else(|| DocchatError::llm("no suggestion scripted"))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// LLM that emits one delta and then never finishes.
#[derive(Debug, Default)]
pub struct StallingLlm;

#[async_trait]
impl ChatLlm for StallingLlm {
    async fn chat_stream(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> docchat_core::Result<LlmStream> {
        Ok(Box::pin(
            stream::iter(vec![Ok(text("Thinking"))]).chain(stream::pending()),
        ))
    }

    async fn generate_text(&self, _prompt: &str) -> docchat_core::Result<String> {
        Ok(String::new())
    }
}

/// Retriever returning fixed fragments, or failing.
#[derive(Debug)]
pub struct MockRetriever {
    nodes: Vec<ScoredNode>,
    fail: bool,
}

impl MockRetriever {
    pub fn with_fragments(fragments: &[(&str, &str)]) -> Self {
        let nodes = fragments
            .iter()
            .enumerate()
            .map(|(i, (file, text))| {
                ScoredNode::new(
                    Node::new(*text).with_metadata(FILE_NAME_KEY, *file),
                    1.0 / (i as f32 + 1.0),
                )
            })
            .collect();
        Self { nodes, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            nodes: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &Query) -> docchat_core::Result<Vec<ScoredNode>> {
        if self.fail {
            return Err(DocchatError::retrieval("index offline"));
        }
        Ok(self.nodes.iter().take(query.top_k).cloned().collect())
    }
}

pub fn text(delta: &str) -> LlmStreamUnit {
    LlmStreamUnit::TextDelta(delta.to_string())
}

pub fn tool_call(id: &str, name: &str, query: &str) -> LlmStreamUnit {
    LlmStreamUnit::ToolCall(ToolCall::new(id, name, json!({ "query": query })))
}
