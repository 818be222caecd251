/*!
 * Provider-agnostic decoder for incremental translation streams.
 *
 * LLM-style backends push server-sent events shaped as repeated
 * `field: value` blocks separated by blank lines. [`SseChunkParser`]
 * decodes that protocol into plain content deltas so the orchestrator and
 * callers never see a provider's framing:
 *
 * - blank lines, comments, and `event`/`id`/`retry` fields are ignored
 * - only the nested incremental-content field of a `data:` payload is kept
 * - the `[DONE]` sentinel terminates the stream silently; later lines are
 *   discarded even when well formed
 * - a malformed payload skips that chunk, it never aborts the stream
 */

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use log::debug;
use serde_json::Value;

use crate::errors::TranslationError;
use crate::providers::FragmentStream;

/// Termination sentinel payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for `event-field: value` chunk streams.
#[derive(Debug, Default)]
pub struct SseChunkParser {
    buffer: String,
    done: bool,
}

impl SseChunkParser {
    /// Create a fresh parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the termination sentinel has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a raw chunk, returning the content deltas decoded from the
    /// complete lines it closed off.
    ///
    /// Partial trailing lines stay buffered until the next chunk (or
    /// [`finish`]). After the sentinel, everything is discarded.
    ///
    /// [`finish`]: SseChunkParser::finish
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut fragments = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if self.done {
                continue;
            }
            if let Some(fragment) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                fragments.push(fragment);
            }
        }
        fragments
    }

    /// Decode whatever is still buffered as a final, unterminated line
    pub fn finish(&mut self) -> Vec<String> {
        if self.done || self.buffer.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.buffer);
        self.process_line(line.trim_end_matches(['\n', '\r']))
            .into_iter()
            .collect()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        // Blank line: block separator, carries no payload
        if line.is_empty() {
            return None;
        }
        // Leading colon: comment / keep-alive
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = line.split_once(':')?;
        let value = value.strip_prefix(' ').unwrap_or(value);
        if field != "data" {
            // event / id / retry lines carry no content
            return None;
        }
        if value == DONE_SENTINEL {
            self.done = true;
            return None;
        }
        Self::extract_content(value)
    }

    /// Pull the nested incremental-content field out of a data payload.
    ///
    /// Malformed JSON or a payload without the field skips the chunk.
    fn extract_content(payload: &str) -> Option<String> {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                debug!("skipping malformed stream chunk: {}", err);
                return None;
            }
        };
        let content = value
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()?;
        if content.is_empty() {
            None
        } else {
            Some(content.to_string())
        }
    }
}

/// Adapt a raw byte-chunk stream into a content-fragment stream.
///
/// Fragments are yielded one at a time, so dropping the returned stream
/// cancels between chunks rather than only at stream start. Upstream errors
/// terminate the stream after being surfaced once.
pub fn content_stream<S>(upstream: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, TranslationError>> + Send + 'static,
{
    struct DecodeState {
        upstream: Pin<Box<dyn Stream<Item = Result<Bytes, TranslationError>> + Send>>,
        parser: SseChunkParser,
        pending: VecDeque<String>,
        finished: bool,
    }

    let state = DecodeState {
        upstream: Box::pin(upstream),
        parser: SseChunkParser::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((Ok(fragment), state));
            }
            if state.finished || state.parser.is_done() {
                return None;
            }
            match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    state.pending.extend(state.parser.feed(&chunk));
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.pending.extend(state.parser.finish());
                    state.finished = true;
                }
            }
        }
    }))
}
