//! Wire events emitted by the chat pipeline.
//!
//! The stream carries three JSON-encoded event kinds plus a terminal
//! sentinel. Serialized as SSE frames, a session looks like:
//!
//! ```text
//! data: {"type":"metadata","articles":[...]}
//!
//! data: {"type":"content","content":"NVIDIA released"}
//!
//! data: [DONE]
//! ```

use serde::{Deserialize, Serialize};
use shepherd_core::Article;

/// A source citation sent in the metadata event, stripped down to what a
/// client needs to render a source list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleRef {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl From<&Article> for ArticleRef {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
        }
    }
}

/// One event in a chat session stream.
///
/// Ordering is a contract: exactly one `Metadata` first, then zero or
/// more `Content` events, then either `Done` or a single terminal
/// `Error`. Nothing follows an `Error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Metadata { articles: Vec<ArticleRef> },
    Content { content: String },
    Error { error: String },
    Done,
}

impl ChatEvent {
    pub fn metadata(articles: &[Article]) -> Self {
        Self::Metadata {
            articles: articles.iter().map(ArticleRef::from).collect(),
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self::Content {
            content: text.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Render as a complete SSE frame, trailing blank line included.
    ///
    /// `Done` is the literal `[DONE]` sentinel rather than a JSON body,
    /// matching the OpenAI streaming convention clients already parse.
    pub fn to_sse_frame(&self) -> String {
        match self {
            Self::Done => "data: [DONE]\n\n".to_string(),
            event => {
                // Serializing these variants cannot fail: every field is a
                // plain string or a vec of them.
                let body = serde_json::to_string(event).unwrap_or_default();
                format!("data: {}\n\n", body)
            }
        }
    }

    /// The payload for the `data:` field, without SSE framing. `Done`
    /// maps to the bare `[DONE]` sentinel.
    pub fn sse_data(&self) -> String {
        match self {
            Self::Done => "[DONE]".to_string(),
            event => serde_json::to_string(event).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, title: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            short_summary: "summary".to_string(),
            long_summary: None,
            categories: vec![],
            priority: "Medium".to_string(),
            regions: vec![],
            technologies: vec![],
            url: "https://example.com/a".to_string(),
            similarity: None,
        }
    }

    #[test]
    fn test_metadata_frame_shape() {
        let event = ChatEvent::metadata(&[article("a1", "Patch Tuesday roundup")]);
        let frame = event.to_sse_frame();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("\n\n"));
        assert!(frame.contains("\"type\":\"metadata\""));
        assert!(frame.contains("\"id\":\"a1\""));
        assert!(frame.contains("\"title\":\"Patch Tuesday roundup\""));
        assert!(frame.contains("\"url\":\"https://example.com/a\""));
    }

    #[test]
    fn test_content_frame() {
        let frame = ChatEvent::content("hello").to_sse_frame();
        assert_eq!(frame, "data: {\"type\":\"content\",\"content\":\"hello\"}\n\n");
    }

    #[test]
    fn test_error_frame() {
        let frame = ChatEvent::error("upstream unavailable").to_sse_frame();
        assert!(frame.contains("\"type\":\"error\""));
        assert!(frame.contains("\"error\":\"upstream unavailable\""));
    }

    #[test]
    fn test_done_is_literal_sentinel() {
        assert_eq!(ChatEvent::Done.to_sse_frame(), "data: [DONE]\n\n");
        assert_eq!(ChatEvent::Done.sse_data(), "[DONE]");
    }

    #[test]
    fn test_events_round_trip_json() {
        let event = ChatEvent::content("fragment");
        let json = serde_json::to_string(&event).unwrap();
        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
