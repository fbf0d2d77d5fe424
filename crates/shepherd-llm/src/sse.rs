//! Frame decoding for the provider's streaming completion transport.
//!
//! The upstream delivers newline-delimited `data: ` frames. Each frame is
//! decoded independently: a frame that fails to parse is skipped rather
//! than aborting the stream.

use serde::Deserialize;
use tracing::debug;

/// A decoded upstream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A content delta to forward as one output fragment.
    Delta(String),

    /// The explicit end-of-stream sentinel (`data: [DONE]`).
    Done,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one transport line into a frame.
///
/// Returns `None` for blank lines, non-data lines, malformed JSON, and
/// deltas without content — none of those are fatal.
pub fn decode_frame(line: &str) -> Option<SseFrame> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "data: [DONE]" {
        return Some(SseFrame::Done);
    }
    let payload = trimmed.strip_prefix("data: ")?;

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|s| !s.is_empty())
            .map(SseFrame::Delta),
        Err(e) => {
            debug!("Skipping malformed stream frame: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_delta() {
        let frame = decode_frame(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#);
        assert_eq!(frame, Some(SseFrame::Delta("Hel".to_string())));
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(decode_frame("data: [DONE]"), Some(SseFrame::Done));
        // Sentinel survives surrounding whitespace
        assert_eq!(decode_frame("  data: [DONE]  "), Some(SseFrame::Done));
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        assert_eq!(decode_frame("data: {malformed"), None);
    }

    #[test]
    fn test_blank_and_non_data_lines() {
        assert_eq!(decode_frame(""), None);
        assert_eq!(decode_frame("   "), None);
        assert_eq!(decode_frame(": keep-alive comment"), None);
        assert_eq!(decode_frame("event: ping"), None);
    }

    #[test]
    fn test_delta_without_content() {
        // Role-announcement and finish frames carry no content delta
        assert_eq!(
            decode_frame(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
        assert_eq!(
            decode_frame(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#),
            None
        );
    }

    #[test]
    fn test_empty_content_is_skipped() {
        assert_eq!(
            decode_frame(r#"data: {"choices":[{"delta":{"content":""}}]}"#),
            None
        );
    }
}
