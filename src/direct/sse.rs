//! Server-sent-events consumption for streamed completions.
//!
//! The stream is a lazy sequence of incremental content deltas: frames are
//! split on the blank-line delimiter, the `data:` prefix is stripped, and
//! partial or malformed events are skipped without aborting the stream.
//! Termination is an explicit completion signal (`finish_reason` or a
//! `completed` marker) or end of stream. Dropping the stream cancels it.

use crate::{Error, Result};
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;

const FRAME_DELIMITER: &str = "\n\n";
const DATA_PREFIX: &str = "data:";

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'static>>;

/// Extract the incremental content delta from one decoded frame.
fn frame_delta(frame: &Value) -> Option<String> {
    let content = frame
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

/// Whether this frame (or its raw text) signals completion.
fn frame_is_final(frame: Option<&Value>, raw: &str) -> bool {
    if raw.contains("completed") {
        return true;
    }
    match frame {
        Some(v) => !v
            .get("finish_reason")
            .map_or(true, |r| r.is_null()),
        None => false,
    }
}

/// Turn a raw byte stream into a lazy stream of content deltas.
pub fn delta_stream<S>(bytes: S) -> DeltaStream
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let stream = stream::unfold(
        (Box::pin(bytes), String::new(), false),
        |(mut input, mut buf, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some(idx) = buf.find(FRAME_DELIMITER) {
                    let frame = buf[..idx].trim().to_string();
                    buf = buf[idx + FRAME_DELIMITER.len()..].to_string();

                    match parse_frame(&frame) {
                        FrameOutcome::Delta(text, last) => {
                            return Some((Ok(text), (input, buf, last)));
                        }
                        FrameOutcome::Done => return None,
                        FrameOutcome::Skip => continue,
                    }
                }

                match input.next().await {
                    Some(Ok(chunk)) => {
                        buf.push_str(&String::from_utf8_lossy(&chunk));
                    }
                    Some(Err(e)) => {
                        return Some((Err(Error::Transport(e)), (input, buf, true)));
                    }
                    None => {
                        // EOF: one last attempt on whatever is buffered.
                        let frame = buf.trim().to_string();
                        buf.clear();
                        return match parse_frame(&frame) {
                            FrameOutcome::Delta(text, _) => Some((Ok(text), (input, buf, true))),
                            _ => None,
                        };
                    }
                }
            }
        },
    );

    Box::pin(stream)
}

enum FrameOutcome {
    /// A content delta; the flag marks it as the final one.
    Delta(String, bool),
    Done,
    Skip,
}

fn parse_frame(frame: &str) -> FrameOutcome {
    let trimmed = frame.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return FrameOutcome::Skip;
    }

    let payload = trimmed
        .strip_prefix(DATA_PREFIX)
        .map(str::trim_start)
        .unwrap_or(trimmed);

    let parsed: Option<Value> = serde_json::from_str(payload).ok();

    match parsed.as_ref().and_then(frame_delta) {
        Some(text) => {
            let last = frame_is_final(parsed.as_ref(), payload);
            FrameOutcome::Delta(text, last)
        }
        None if frame_is_final(parsed.as_ref(), payload) => FrameOutcome::Done,
        // Malformed or contentless frame: skip and continue.
        None => FrameOutcome::Skip,
    }
}

/// Drain a delta stream into the full response text.
pub async fn collect_text(mut deltas: DeltaStream) -> Result<String> {
    let mut full = String::new();
    while let Some(delta) = deltas.next().await {
        full.push_str(&delta?);
    }
    Ok(full)
}
