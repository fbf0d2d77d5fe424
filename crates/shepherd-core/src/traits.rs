//! Core traits defining the interfaces between components.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;
use crate::types::{Article, ChatMessage, SearchFilters};

/// A live stream of completion text fragments, one per upstream delta.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Narrow query contract against the article store.
///
/// The store's internal implementation (schema, index engine) is out of
/// scope; only the inputs, outputs, and ordering of these calls are
/// binding.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Nearest-neighbor lookup over article embeddings.
    ///
    /// Returns articles with similarity scores, highest similarity first,
    /// restricted by the filter set and threshold, capped at `count`.
    async fn similarity_search(
        &self,
        embedding: &[f32],
        filters: &SearchFilters,
        threshold: f32,
        count: u32,
    ) -> Result<Vec<Article>>;

    /// Substring match of a single term over title and short-summary fields.
    ///
    /// Returns articles most-recently-analyzed first, capped at `limit`.
    /// Results carry no similarity score.
    async fn recent_matching(&self, term: &str, limit: u32) -> Result<Vec<Article>>;

    /// Write an article's embedding back to the store (fire-and-forget path
    /// outside the per-request pipeline).
    async fn update_embedding(&self, id: &str, embedding: &[f32]) -> Result<()>;
}

/// Text embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-dimension vector.
    ///
    /// Fails with `Validation` for empty or whitespace-only text (no
    /// network call is made) and `Upstream` for provider failures. No
    /// retry is performed internally.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Completion model with both one-shot and streaming calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Single-turn, non-streaming completion (used by query enrichment).
    async fn complete(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;

    /// Streaming completion over an ordered message list.
    ///
    /// The returned stream yields one fragment per upstream content delta,
    /// in delta order, and ends when the provider signals end-of-stream.
    /// Dropping the stream aborts the upstream request.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<TokenStream>;
}
