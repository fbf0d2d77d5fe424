//! Core domain types for the shepherd pipeline.

use serde::{Deserialize, Serialize};

/// A geographic region affected by an article, with its display flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region name (e.g. "Europe").
    pub region: String,

    /// Display flag emoji.
    #[serde(default)]
    pub flag: String,
}

impl Region {
    /// Render the region with its display label.
    pub fn display(&self) -> String {
        if self.flag.is_empty() {
            self.region.clone()
        } else {
            format!("{} {}", self.flag, self.region)
        }
    }
}

/// Read-only projection of an analyzed article as returned by the store.
///
/// Field names map onto the store's column names; the pipeline only ever
/// holds transient copies for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier (opaque to the pipeline).
    pub id: String,

    /// Article title.
    #[serde(rename = "article_title")]
    pub title: String,

    /// Short summary.
    #[serde(default)]
    pub short_summary: String,

    /// Long summary (may be absent).
    #[serde(default)]
    pub long_summary: Option<String>,

    /// Category labels.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Priority tier as stored (critical / high / medium / low).
    #[serde(default)]
    pub priority: String,

    /// Affected regions with display flags.
    #[serde(default)]
    pub regions: Vec<Region>,

    /// Technologies mentioned in the article.
    #[serde(rename = "mentioned_technologies", default)]
    pub technologies: Vec<String>,

    /// Canonical source URL.
    #[serde(rename = "article_url")]
    pub url: String,

    /// Similarity score; present only for semantically retrieved articles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// Optional filters applied to the similarity search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,

    /// Tag/topic labels, standalone search only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Lower date bound (ISO 8601), standalone search only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,

    /// Upper date bound (ISO 8601), standalone search only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
}

/// One conversational request: raw query, filters, prior turns.
///
/// Created at request arrival, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Raw user query text.
    pub query: String,

    /// Optional filter set.
    #[serde(default)]
    pub filters: SearchFilters,

    /// Prior conversation turns, most-recent-last.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// A standalone search request.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    /// Search query text.
    pub query: String,

    /// Optional filter set.
    #[serde(default, flatten)]
    pub filters: SearchFilters,

    /// Similarity threshold override (default 0.3 for standalone search).
    #[serde(default)]
    pub match_threshold: Option<f32>,

    /// Result cap override (default 10).
    #[serde(default)]
    pub match_count: Option<u32>,
}

/// Standalone search response.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// The original query.
    pub query: String,

    /// Filters that were applied.
    pub filters_applied: SearchFilters,

    /// Similarity threshold used.
    pub match_threshold: f32,

    /// Number of results returned.
    pub result_count: usize,

    /// Matched articles, lexical hits first, then by similarity.
    pub results: Vec<Article>,
}
