//! Maps agent events onto the client SSE contract.
//!
//! Text block parts and `data-*` parts are written as `data: <json>\n\n`
//! frames. Control events never reach the client.

use crate::{
    agent::AgentEvent,
    error::{AgentError, Result},
    parts::{DataPart, SUGGESTED_QUESTIONS_PART, UiPart},
};
use futures::{Stream, StreamExt, future};
use serde_json::Value;

const FRAME_PREFIX: &str = "data: ";
const FRAME_TERMINATOR: &str = "\n\n";

/// Client part for an event, or `None` if the event is internal
pub fn to_ui_part(event: &AgentEvent) -> Result<Option<UiPart>> {
    let part = match event {
        AgentEvent::Text(part) => UiPart::Text(part.clone()),
        AgentEvent::RunStatus(status) => UiPart::Data(status.to_part()?),
        AgentEvent::SourceAttribution(sources) => UiPart::Data(sources.to_part()?),
        AgentEvent::Suggestion(questions) => UiPart::Data(DataPart::new(
            SUGGESTED_QUESTIONS_PART,
            Value::from(questions.clone()),
        )),
        AgentEvent::Data(part) if part.is_ui_data() => UiPart::Data(part.clone()),
        AgentEvent::Data(_)
        | AgentEvent::Start(_)
        | AgentEvent::Continue
        | AgentEvent::ToolCallRequested(_)
        | AgentEvent::ToolCallCompleted(_)
        | AgentEvent::Stop => return Ok(None),
    };
    Ok(Some(part))
}

/// Serialize a part as one SSE frame
pub fn encode_frame(part: &UiPart) -> Result<String> {
    let json = serde_json::to_string(part)?;
    Ok(format!("{FRAME_PREFIX}{json}{FRAME_TERMINATOR}"))
}

/// Parse one SSE frame back into a part
pub fn decode_frame(frame: &str) -> Result<UiPart> {
    let body = frame
        .strip_prefix(FRAME_PREFIX)
        .ok_or_else(|| AgentError::validation("frame", "missing `data: ` prefix"))?;
    let body = body.strip_suffix(FRAME_TERMINATOR).unwrap_or(body);
    Ok(serde_json::from_str(body)?)
}

/// Turn a run's event stream into SSE frames.
///
/// The output ends where the input ends; an error item is passed through and
/// is the last item.
pub fn into_sse_frames<S>(events: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = Result<AgentEvent>> + Send,
{
    events.filter_map(|item| {
        future::ready(match item {
            Ok(event) => to_ui_part(&event)
                .transpose()
                .map(|part| part.and_then(|part| encode_frame(&part))),
            Err(err) => Some(Err(err)),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::{StartEvent, ToolCallOutcome},
        parts::{RunStatus, RunStatusEvent, SourceEvent, TextPart},
    };
    use docchat_core::ToolCall;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_control_events_are_dropped() {
        let call = ToolCall::new("1", "query_document", json!({"query": "x"}));
        for event in [
            AgentEvent::Start(StartEvent::new("hi", Vec::new())),
            AgentEvent::Continue,
            AgentEvent::ToolCallCompleted(ToolCallOutcome::success(&call, "ok")),
            AgentEvent::ToolCallRequested(call),
            AgentEvent::Stop,
            AgentEvent::Data(DataPart::new("internal", json!({}))),
        ] {
            assert_eq!(to_ui_part(&event).unwrap(), None, "{event:?}");
        }
    }

    #[test]
    fn test_frame_format() {
        let frame = encode_frame(&UiPart::Text(TextPart::TextStart { id: "b".into() })).unwrap();
        assert_eq!(frame, "data: {\"type\":\"text-start\",\"id\":\"b\"}\n\n");
    }

    #[test]
    fn test_frames_parse_back_to_payload() {
        let events = [
            AgentEvent::Text(TextPart::TextDelta {
                id: "b".into(),
                delta: "Hello \"world\"\n".into(),
            }),
            AgentEvent::RunStatus(
                RunStatusEvent::new("c1", "Calling tool", "searching", RunStatus::Success)
                    .with_data(json!({"sourceCount": 1})),
            ),
            AgentEvent::SourceAttribution(SourceEvent::default()),
            AgentEvent::Suggestion(vec!["Why?".into()]),
            AgentEvent::Data(DataPart::new("data-custom", json!({"k": [1, 2]})).with_id("x")),
        ];

        for event in events {
            let part = to_ui_part(&event).unwrap().unwrap();
            let frame = encode_frame(&part).unwrap();
            let body: Value = serde_json::from_str(
                frame.trim_start_matches(FRAME_PREFIX).trim_end(),
            )
            .unwrap();
            assert_eq!(body, serde_json::to_value(&part).unwrap());
            assert_eq!(decode_frame(&frame).unwrap(), part);
        }
    }

    #[test]
    fn test_suggestion_payload_shape() {
        let part = to_ui_part(&AgentEvent::Suggestion(vec!["a?".into(), "b?".into()]))
            .unwrap()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"type": "data-suggested_questions", "data": ["a?", "b?"]})
        );
    }

    #[tokio::test]
    async fn test_sse_stream_stops_after_error() {
        let events = stream::iter(vec![
            Ok(AgentEvent::Continue),
            Ok(AgentEvent::Text(TextPart::TextStart { id: "b".into() })),
            Err(AgentError::generic("llm failed")),
        ]);
        let frames: Vec<_> = into_sse_frames(events).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].as_ref().unwrap().contains("text-start"));
        assert!(frames[1].is_err());
    }

    #[test]
    fn test_decode_rejects_bare_json() {
        assert!(decode_frame("{\"type\":\"text-end\",\"id\":\"b\"}").is_err());
    }
}
