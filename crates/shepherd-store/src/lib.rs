//! shepherd-store - Article store clients
//!
//! The pipeline consumes the article store through the narrow
//! [`ArticleStore`] contract: a similarity-search call, a substring-match
//! call, and the embedding write-back. Two implementations are provided:
//!
//! - [`RestStore`] - a PostgREST-style remote store (the production path)
//! - [`MemoryStore`] - an in-memory store with brute-force cosine
//!   similarity, for tests and offline use

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

// Re-export the store trait for convenience
pub use shepherd_core::ArticleStore;
