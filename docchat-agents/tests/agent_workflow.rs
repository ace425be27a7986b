//! End-to-end tests of the chat agent workflow with mocked capabilities.

mod common;

use common::{MockRetriever, ScriptedLlm, StallingLlm, text, tool_call};
use docchat_agents::{
    agent::{AgentConfig, AgentEvent, ChatAgent, StartEvent},
    parts::{RunStatus, TextPart},
    stream::{into_sse_frames, to_ui_part},
    tool::QueryDocumentTool,
};
use docchat_core::{ChatLlm, ChatMessage, MessageRole, Retriever};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use std::{sync::Arc, time::Duration};

const QUESTION: &str = "What are the physical standards for letters?";

fn agent(llm: Arc<ScriptedLlm>, retriever: MockRetriever, config: AgentConfig) -> ChatAgent {
    let retriever: Arc<dyn Retriever> = Arc::new(retriever);
    let llm: Arc<dyn ChatLlm> = llm;
    ChatAgent::builder(llm)
        .tool(Arc::new(QueryDocumentTool::new(retriever)))
        .config(config)
        .build()
        .unwrap()
}

fn label(event: &AgentEvent) -> String {
    match event {
        AgentEvent::Start(_) => "start".into(),
        AgentEvent::Continue => "continue".into(),
        AgentEvent::ToolCallRequested(call) => format!("tool-call:{}", call.name),
        AgentEvent::ToolCallCompleted(outcome) => format!("tool-done:error={}", outcome.is_error),
        AgentEvent::Text(TextPart::TextStart { .. }) => "text-start".into(),
        AgentEvent::Text(TextPart::TextDelta { .. }) => "text-delta".into(),
        AgentEvent::Text(TextPart::TextEnd { .. }) => "text-end".into(),
        AgentEvent::RunStatus(status) => format!("status:{:?}", status.status).to_lowercase(),
        AgentEvent::SourceAttribution(sources) => format!("sources:{}", sources.nodes.len()),
        AgentEvent::Suggestion(questions) => format!("suggestion:{}", questions.len()),
        AgentEvent::Data(part) => part.part_type.clone(),
        AgentEvent::Stop => "stop".into(),
    }
}

fn labels(events: &[AgentEvent]) -> Vec<String> {
    events.iter().map(label).collect()
}

#[tokio::test]
async fn test_end_to_end_event_order() {
    let llm = Arc::new(
        ScriptedLlm::new(vec![
            vec![tool_call("call_1", "query_document", "letter physical standards")],
            vec![text("Letters must be "), text("rectangular.")],
        ])
        .with_suggestion("Here you go:\n```\nWhat about envelopes?\nWhat is the max weight?\nCan letters be square?\n```"),
    );
    let agent = agent(
        Arc::clone(&llm),
        MockRetriever::with_fragments(&[("standards.md", "Letters must be rectangular.")]),
        AgentConfig {
            suggest_next_questions: true,
            ..AgentConfig::default()
        },
    );

    let events = agent
        .run(StartEvent::new(QUESTION, Vec::new()))
        .collect()
        .await
        .unwrap();

    assert_eq!(
        labels(&events),
        vec![
            "start",
            "continue",
            "text-start",
            "tool-call:query_document",
            "status:pending",
            "status:success",
            "sources:1",
            "tool-done:error=false",
            "continue",
            "text-delta",
            "text-delta",
            "text-end",
            "suggestion:3",
            "stop",
        ]
    );

    let ids: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::Text(part) => Some(part.id()),
            _ => None,
        })
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));

    let requests = llm.requests();
    let second_request = &requests[1];
    let roles: Vec<MessageRole> = second_request.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool]
    );
    assert_eq!(second_request[1].tool_calls.len(), 1);
    assert_eq!(second_request[2].tool_call_id.as_deref(), Some("call_1"));
    assert!(second_request[2].content.contains("Letters must be rectangular."));
}

#[tokio::test]
async fn test_run_status_events_share_tool_call_id() {
    let llm = Arc::new(ScriptedLlm::new(vec![vec![tool_call(
        "call_7",
        "query_document",
        "size",
    )]]));
    let agent = agent(
        llm,
        MockRetriever::with_fragments(&[("a.md", "A4")]),
        AgentConfig::default(),
    );

    let events = agent
        .run(StartEvent::new("size?", Vec::new()))
        .collect()
        .await
        .unwrap();

    let statuses: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::RunStatus(status) => Some((status.id.as_str(), status.status)),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![("call_7", RunStatus::Pending), ("call_7", RunStatus::Success)]
    );
}

#[tokio::test]
async fn test_unknown_tool_is_contained() {
    let llm = Arc::new(ScriptedLlm::new(vec![vec![tool_call(
        "call_x",
        "not_a_real_tool",
        "anything",
    )]]));
    let agent = agent(
        Arc::clone(&llm),
        MockRetriever::with_fragments(&[]),
        AgentConfig::default(),
    );

    let events = agent
        .run(StartEvent::new(QUESTION, Vec::new()))
        .collect()
        .await
        .unwrap();

    assert_eq!(
        labels(&events),
        vec![
            "start",
            "continue",
            "text-start",
            "tool-call:not_a_real_tool",
            "status:pending",
            "status:error",
            "tool-done:error=true",
            "text-end",
            "stop",
        ]
    );
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_tool_error_stops_without_continue() {
    let llm = Arc::new(ScriptedLlm::new(vec![vec![
        tool_call("a", "query_document", "one"),
        tool_call("b", "query_document", "two"),
    ]]));
    let agent = agent(
        Arc::clone(&llm),
        MockRetriever::failing(),
        AgentConfig::default(),
    );

    let events = agent
        .run(StartEvent::new(QUESTION, Vec::new()))
        .collect()
        .await
        .unwrap();

    let continues = events
        .iter()
        .filter(|event| matches!(event, AgentEvent::Continue))
        .count();
    assert_eq!(continues, 1);
    assert_eq!(llm.calls(), 1);
    assert!(matches!(events.last(), Some(AgentEvent::Stop)));

    let errors = events
        .iter()
        .filter(|event| matches!(event, AgentEvent::ToolCallCompleted(outcome) if outcome.is_error))
        .count();
    assert_eq!(errors, 2);
}

#[tokio::test]
async fn test_iteration_ceiling_forces_stop() {
    let llm = Arc::new(
        ScriptedLlm::new(Vec::new())
            .with_fallback(vec![tool_call("loop", "query_document", "again")]),
    );
    let agent = agent(
        Arc::clone(&llm),
        MockRetriever::with_fragments(&[("a.md", "text")]),
        AgentConfig {
            max_iterations: 3,
            ..AgentConfig::default()
        },
    );

    let events = agent
        .run(StartEvent::new(QUESTION, Vec::new()))
        .collect()
        .await
        .unwrap();

    assert_eq!(llm.calls(), 3);
    let tail: Vec<String> = labels(&events).into_iter().rev().take(3).collect();
    assert_eq!(tail, vec!["stop", "text-end", "continue"]);

    let text_ends = events
        .iter()
        .filter(|event| matches!(event, AgentEvent::Text(TextPart::TextEnd { .. })))
        .count();
    assert_eq!(text_ends, 1);
}

#[tokio::test]
async fn test_duplicate_tool_call_ids_keep_last() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        vec![
            tool_call("a", "query_document", "first"),
            tool_call("b", "query_document", "other"),
            tool_call("a", "query_document", "second"),
        ],
        vec![text("ok")],
    ]));
    let agent = agent(
        Arc::clone(&llm),
        MockRetriever::with_fragments(&[("a.md", "text")]),
        AgentConfig::default(),
    );

    let events = agent
        .run(StartEvent::new(QUESTION, Vec::new()))
        .collect()
        .await
        .unwrap();

    let requested: Vec<(String, String)> = events
        .iter()
        .filter_map(|event| match event {
            AgentEvent::ToolCallRequested(call) => Some((
                call.id.clone(),
                call.input["query"].as_str().unwrap_or_default().to_string(),
            )),
            _ => None,
        })
        .collect();
    assert_eq!(
        requested,
        vec![
            ("a".to_string(), "second".to_string()),
            ("b".to_string(), "other".to_string()),
        ]
    );

    let continues = events
        .iter()
        .filter(|event| matches!(event, AgentEvent::Continue))
        .count();
    assert_eq!(continues, 2);

    let tool_messages = llm.requests()[1]
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .count();
    assert_eq!(tool_messages, 2);
}

#[tokio::test]
async fn test_malformed_suggestion_emits_nothing() {
    let llm = Arc::new(ScriptedLlm::new(vec![vec![text("Hello")]]).with_suggestion("no block"));
    let agent = agent(
        llm,
        MockRetriever::with_fragments(&[]),
        AgentConfig {
            suggest_next_questions: true,
            ..AgentConfig::default()
        },
    );

    let events = agent
        .run(StartEvent::new("hi", Vec::new()))
        .collect()
        .await
        .unwrap();
    assert_eq!(
        labels(&events),
        vec!["start", "continue", "text-start", "text-delta", "text-end", "stop"]
    );
}

#[tokio::test]
async fn test_history_and_system_prompt_reach_llm() {
    let llm = Arc::new(ScriptedLlm::new(vec![vec![text("Sure.")]]));
    let agent = agent(
        Arc::clone(&llm),
        MockRetriever::with_fragments(&[]),
        AgentConfig {
            system_prompt: Some("Answer from the documents.".into()),
            ..AgentConfig::default()
        },
    );

    let history = vec![ChatMessage::user("hello"), ChatMessage::assistant("hi there")];
    agent
        .run(StartEvent::new("and now?", history))
        .collect()
        .await
        .unwrap();

    let requests = llm.requests();
    let request = &requests[0];
    let rendered: Vec<String> = request
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect();
    assert_eq!(
        rendered,
        vec![
            "system: Answer from the documents.",
            "user: hello",
            "assistant: hi there",
            "user: and now?",
        ]
    );
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()).with_fallback(vec![text("same answer")]));
    let agent = agent(llm, MockRetriever::with_fragments(&[]), AgentConfig::default());

    let first = agent.run(StartEvent::new("one", Vec::new()));
    let second = agent.run(StartEvent::new("two", Vec::new()));
    assert_ne!(first.run_id(), second.run_id());

    let (a, b) = tokio::join!(first.collect(), second.collect());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(labels(&a), labels(&b));

    let block = |events: &[AgentEvent]| {
        events.iter().find_map(|event| match event {
            AgentEvent::Text(part) => Some(part.id().to_string()),
            _ => None,
        })
    };
    assert_ne!(block(&a), block(&b));
}

#[tokio::test]
async fn test_cancellation_ends_stream() {
    let agent = ChatAgent::builder(Arc::new(StallingLlm))
        .tool(Arc::new(QueryDocumentTool::new(Arc::new(
            MockRetriever::with_fragments(&[]),
        ))))
        .build()
        .unwrap();

    let mut run = agent.run(StartEvent::new(QUESTION, Vec::new()));
    let token = run.cancellation_token();
    let mut frames = Box::pin(into_sse_frames(run.stream()));

    let mut seen = Vec::new();
    while let Some(frame) = frames.next().await {
        let frame = frame.unwrap();
        let is_delta = frame.contains("text-delta");
        seen.push(frame);
        if is_delta {
            token.cancel();
        }
    }

    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("text-start"));

    tokio::time::timeout(Duration::from_secs(1), async {
        while !run.is_finished() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_ui_parts_of_full_run() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        vec![tool_call("c", "query_document", "x")],
        vec![text("done")],
    ]));
    let agent = agent(
        llm,
        MockRetriever::with_fragments(&[("a.md", "A"), ("b.md", "B")]),
        AgentConfig::default(),
    );

    let events = agent
        .run(StartEvent::new("x", Vec::new()))
        .collect()
        .await
        .unwrap();
    let visible = events
        .iter()
        .filter_map(|event| to_ui_part(event).unwrap())
        .count();
    // text-start, pending, success, sources, delta, text-end
    assert_eq!(visible, 6);
}
