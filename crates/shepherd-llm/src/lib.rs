//! shepherd-llm - OpenAI-compatible model client
//!
//! This crate talks to the model provider over HTTP for the three
//! capability calls the pipeline needs:
//!
//! - text embedding (one vector per query)
//! - non-streaming completion (query enrichment)
//! - streaming completion (the answering call), decoded frame-by-frame
//!   from the provider's newline-delimited event stream
//!
//! Deterministic mock implementations are exported for tests.

mod mock;
mod openai;
mod sse;

pub use mock::{MockChatModel, MockEmbedder};
pub use openai::OpenAiClient;
pub use sse::{decode_frame, SseFrame};

// Re-export the trait seams for convenience
pub use shepherd_core::{ChatModel, Embedder, TokenStream};
