//! Server-sent events decoding for streaming chat completions.

use crate::ChatCompletionChunk;
use futures_util::{Stream, StreamExt};
use scrivener_error::{ModelError, ModelErrorKind, ScrivenerError};
use scrivener_interface::TextStream;

const DONE: &str = "[DONE]";

/// Incremental SSE decoder.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence or a
/// `\r\n` pair. Each completed event yields its `data` payload, with
/// multi-line data joined by `\n`.
///
/// # Examples
///
/// ```
/// use scrivener_models::SseDecoder;
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.push(b"data: {\"a\"").is_empty());
/// assert_eq!(decoder.push(b":1}\n\ndata: [DONE]\n\n"), vec!["{\"a\":1}", "[DONE]"]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed bytes, returning the data of every event they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(line.as_ref());
            if let Some(event) = self.line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush an event left open when the stream ended without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
            if let Some(event) = self.line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(data)
    }
}

enum Payload {
    Done,
    Text(Option<String>),
}

fn parse_payload(data: &str) -> Result<Payload, ModelError> {
    if data.trim() == DONE {
        return Ok(Payload::Done);
    }
    let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| {
        ModelError::new(ModelErrorKind::Deserialization(format!(
            "Failed to parse chunk: {}",
            e
        )))
    })?;
    if let Some(error) = chunk.error {
        return Err(ModelError::new(ModelErrorKind::Stream(error.message)));
    }
    Ok(Payload::Text(chunk.delta_text()))
}

/// Turn an SSE byte stream into a stream of content deltas.
///
/// Ends at `[DONE]` or when the bytes run out. The first error ends the
/// stream after being yielded.
pub fn text_deltas<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut decoder = SseDecoder::default();
        let mut bytes = Box::pin(bytes);
        let mut finished = false;

        while let Some(next) = bytes.next().await {
            let events = match next {
                Ok(chunk) => decoder.push(chunk.as_ref()),
                Err(e) => {
                    tracing::error!(error = %e, "Stream transport failed");
                    yield Err(ScrivenerError::from(ModelError::new(ModelErrorKind::Stream(e.to_string()))));
                    finished = true;
                    break;
                }
            };
            for data in events {
                match parse_payload(&data) {
                    Ok(Payload::Done) => {
                        finished = true;
                        break;
                    }
                    Ok(Payload::Text(Some(text))) => yield Ok(text),
                    Ok(Payload::Text(None)) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Bad stream event");
                        yield Err(ScrivenerError::from(e));
                        finished = true;
                        break;
                    }
                }
            }
            if finished {
                break;
            }
        }

        if !finished {
            if let Some(data) = decoder.finish() {
                match parse_payload(&data) {
                    Ok(Payload::Text(Some(text))) => yield Ok(text),
                    Ok(_) => {}
                    Err(e) => yield Err(ScrivenerError::from(e)),
                }
            }
        }
    })
}
