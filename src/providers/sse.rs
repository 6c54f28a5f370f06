//! Server-sent events decoding for streaming chat APIs

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;

use crate::core::engine::TextStream;
use crate::core::errors::EngineError;

/// Payload that marks the end of an OpenAI-style event stream
pub const DONE_MARKER: &str = "[DONE]";

/// Pulls the text delta out of one decoded event
pub type DeltaExtractor = fn(&Value) -> Option<String>;

/// Incremental decoder that turns raw bytes into `data:` payloads.
///
/// Lines may be split across network chunks, and across UTF-8 sequences, so
/// bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the payloads of every complete `data:` line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a last line that had no terminating newline
    pub fn finish(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line).into_iter().collect()
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    (!payload.is_empty()).then(|| payload.to_string())
}

struct EventState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
    extract: DeltaExtractor,
}

/// Text fragments of a streaming HTTP response.
///
/// Ends at `[DONE]`, at end of body, or right after the first error.
pub fn text_stream(response: reqwest::Response, extract: DeltaExtractor) -> TextStream {
    events_to_text(response.bytes_stream().boxed(), extract)
}

fn events_to_text(body: BoxStream<'static, reqwest::Result<Bytes>>, extract: DeltaExtractor) -> TextStream {
    let state = EventState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
        extract,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.pending.pop_front() {
                if payload == DONE_MARKER {
                    return None;
                }
                match serde_json::from_str::<Value>(&payload) {
                    Ok(event) => match (state.extract)(&event) {
                        Some(text) if !text.is_empty() => return Some((Ok(text), state)),
                        _ => continue,
                    },
                    Err(e) => {
                        state.finished = true;
                        state.pending.clear();
                        let err = EngineError::InvalidResponseError {
                            message: format!("Malformed stream event: {}", e),
                        };
                        return Some((Err(err), state));
                    }
                }
            }

            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(&chunk);
                    state.pending.extend(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(EngineError::from(e)), state));
                }
                None => {
                    state.finished = true;
                    let payloads = state.decoder.finish();
                    state.pending.extend(payloads);
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn openai_delta(event: &Value) -> Option<String> {
        event["choices"][0]["delta"]["content"].as_str().map(str::to_string)
    }

    fn body(chunks: &[&'static str]) -> BoxStream<'static, reqwest::Result<Bytes>> {
        let chunks: Vec<reqwest::Result<Bytes>> =
            chunks.iter().copied().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        stream::iter(chunks).boxed()
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\n\ndata: [DONE]\n"), vec!["{\"a\":1}", "[DONE]"]);
    }

    #[test]
    fn test_decoder_ignores_other_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"id: 1\r\nevent: message\r\ndata: {}\r\n\r\n: comment\n");

        assert_eq!(payloads, vec!["{}"]);
    }

    #[test]
    fn test_decoder_finish_flushes_last_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
    }

    #[tokio::test]
    async fn test_events_to_text() {
        let stream = events_to_text(
            body(&[
                "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hol\"}}]}\n\ndata: {\"choi",
                "ces\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
                "data: [DONE]\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
            ]),
            openai_delta,
        );

        let fragments: Vec<String> = stream.try_collect().await.unwrap();

        assert_eq!(fragments, vec!["Hol", "a"]);
    }

    #[tokio::test]
    async fn test_malformed_event_ends_stream() {
        let stream = events_to_text(
            body(&[
                "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
                "data: not json\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
            ]),
            openai_delta,
        );

        let items: Vec<Result<String, EngineError>> = stream.collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "ok");
        assert!(matches!(items[1], Err(EngineError::InvalidResponseError { .. })));
    }
}
