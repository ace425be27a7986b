//! Decoding of streamed chat completion chunks.
//!
//! The response body is a server-sent event stream of `data: <json>` lines
//! terminated by `data: [DONE]`. Tool call fragments are keyed by their index
//! and assembled until the stream ends.

use super::wire::{ChatCompletionChunk, ToolCallDelta};
use docchat_core::{DocchatError, LlmStream, LlmStreamUnit, Result, ToolCall};
use futures::{Stream, StreamExt, stream};
use serde_json::{Value, json};
use std::{
    collections::{BTreeMap, VecDeque},
    fmt::Display,
};
use tracing::{debug, warn};

const DONE_MARKER: &str = "[DONE]";

/// Splits a byte stream into SSE `data` payloads
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed bytes and return every complete `data` payload
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = Self::parse_line(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a final unterminated line
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line)
    }

    fn parse_line(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data);
        (!data.is_empty()).then(|| data.to_string())
    }
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Assembles tool calls from streamed fragments
#[derive(Debug, Default)]
pub(crate) struct ToolCallAccumulator {
    calls: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn apply(&mut self, delta: &ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_default();
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            call.id = id.to_string();
        }
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                call.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                call.arguments.push_str(arguments);
            }
        }
    }

    /// Take the assembled calls in index order.
    ///
    /// Arguments that are not valid JSON are passed on as `{"rawInput": ...}`.
    pub fn finish(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.calls)
            .into_iter()
            .filter(|(_, call)| !call.name.is_empty())
            .map(|(index, call)| {
                let input = if call.arguments.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str::<Value>(&call.arguments).unwrap_or_else(|e| {
                        warn!(tool = %call.name, "Tool call arguments are not valid JSON: {e}");
                        json!({ "rawInput": call.arguments })
                    })
                };
                let id = if call.id.is_empty() {
                    format!("call_{index}")
                } else {
                    call.id
                };
                ToolCall::new(id, call.name, input)
            })
            .collect()
    }
}

struct ChunkDecoder<B> {
    bytes: B,
    sse: SseDecoder,
    tool_calls: ToolCallAccumulator,
    pending: VecDeque<LlmStreamUnit>,
    finished: bool,
}

impl<B> ChunkDecoder<B> {
    fn flush_tool_calls(&mut self) {
        self.pending
            .extend(self.tool_calls.finish().into_iter().map(LlmStreamUnit::ToolCall));
    }

    fn handle_payload(&mut self, payload: &str) -> Result<()> {
        if payload.trim() == DONE_MARKER {
            self.flush_tool_calls();
            self.finished = true;
            return Ok(());
        }

        let chunk: ChatCompletionChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!("Skipping malformed stream chunk: {e}");
                return Ok(());
            }
        };

        if let Some(error) = chunk.error {
            return Err(DocchatError::llm(format!("Stream error: {}", error.message)));
        }

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                self.pending.push_back(LlmStreamUnit::TextDelta(content));
            }
            for delta in choice.delta.tool_calls.iter().flatten() {
                self.tool_calls.apply(delta);
            }
        }
        Ok(())
    }
}

/// Turn a streamed response body into LLM output units
pub(crate) fn decode_chunks<B, T, E>(bytes: B) -> LlmStream
where
    B: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    T: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let decoder = ChunkDecoder {
        bytes: Box::pin(bytes),
        sse: SseDecoder::default(),
        tool_calls: ToolCallAccumulator::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(unit) = decoder.pending.pop_front() {
                return Some((Ok(unit), decoder));
            }
            if decoder.finished {
                return None;
            }

            match decoder.bytes.next().await {
                Some(Ok(chunk)) => {
                    for payload in decoder.sse.push(chunk.as_ref()) {
                        if let Err(e) = decoder.handle_payload(&payload) {
                            decoder.finished = true;
                            return Some((Err(e), decoder));
                        }
                        if decoder.finished {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    decoder.finished = true;
                    return Some((Err(DocchatError::llm(format!("Stream error: {e}"))), decoder));
                }
                None => {
                    if let Some(payload) = decoder.sse.finish() {
                        if let Err(e) = decoder.handle_payload(&payload) {
                            decoder.finished = true;
                            return Some((Err(e), decoder));
                        }
                    }
                    decoder.flush_tool_calls();
                    decoder.finished = true;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    type ByteChunks = stream::Iter<std::vec::IntoIter<std::result::Result<Vec<u8>, String>>>;

    fn chunks(parts: &[&str]) -> ByteChunks {
        let owned: Vec<_> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    async fn collect(parts: &[&str]) -> Vec<Result<LlmStreamUnit>> {
        decode_chunks(chunks(parts)).collect().await
    }

    #[test]
    fn test_sse_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\r\n\r\n: keep-alive\ndata:[DONE]\n"), vec![
            "{\"a\":1}".to_string(),
            "[DONE]".to_string(),
        ]);
        assert!(decoder.finish().is_none());
    }

    #[tokio::test]
    async fn test_text_deltas() {
        let units = collect(&[
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n",
        ])
        .await;
        let units: Vec<_> = units.into_iter().map(|u| u.unwrap()).collect();
        assert_eq!(units, vec![
            LlmStreamUnit::TextDelta("Hel".into()),
            LlmStreamUnit::TextDelta("lo".into()),
        ]);
    }

    #[tokio::test]
    async fn test_tool_call_fragments_are_assembled() {
        let units = collect(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_a\",\"function\":{\"name\":\"query_document\",\"arguments\":\"\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"query\\\":\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"size\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"call_b\",\"function\":{\"name\":\"query_document\",\"arguments\":\"{bad\"}}]}}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;
        let units: Vec<_> = units.into_iter().map(|u| u.unwrap()).collect();
        assert_eq!(units, vec![
            LlmStreamUnit::ToolCall(ToolCall::new("call_a", "query_document", json!({"query": "size"}))),
            LlmStreamUnit::ToolCall(ToolCall::new("call_b", "query_document", json!({"rawInput": "{bad"}))),
        ]);
    }

    #[tokio::test]
    async fn test_tool_calls_flushed_without_done_marker() {
        let units = collect(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"c\",\"function\":{\"name\":\"query_document\",\"arguments\":\"{}\"}}]}}]}",
        ])
        .await;
        assert_eq!(units.len(), 1);
        assert!(matches!(units[0], Ok(LlmStreamUnit::ToolCall(ref call)) if call.id == "c"));
    }

    #[tokio::test]
    async fn test_error_chunk_ends_stream() {
        let units = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"overloaded\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
        ])
        .await;
        assert_eq!(units.len(), 2);
        assert!(units[0].is_ok());
        assert!(units[1].as_ref().unwrap_err().to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_skipped() {
        let units = collect(&[
            "data: not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        ])
        .await;
        assert_eq!(units.len(), 1);
    }
}
