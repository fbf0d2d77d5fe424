//! The chat pipeline: query enrichment, hybrid retrieval, and streaming
//! answer generation, glued together behind a single entry point.
//!
//! [`ChatPipeline::chat`] validates and retrieves synchronously, then
//! hands off to a background task that emits [`ChatEvent`]s over a
//! bounded channel. [`ChatPipeline::search`] is the non-streaming
//! retrieval-only path.

pub mod events;
pub mod pipeline;

pub use events::{ArticleRef, ChatEvent};
pub use pipeline::{ChatPipeline, ChatStream, EmbeddingOutcome};
