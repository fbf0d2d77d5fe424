//! shepherd-query - Retrieval engine
//!
//! This crate turns a user query into a bounded, deduplicated ranked list
//! of articles and a grounded context block:
//!
//! - Lexical prefilter: substring scan over a small vocabulary of
//!   high-salience vendor/product terms, guaranteeing exact-entity recall
//!   that embeddings blur away
//! - Query enrichment: a low-temperature rewrite that adds synonyms and
//!   expansions while never dropping original terms
//! - Hybrid retriever: concurrent lexical + semantic halves merged
//!   lexical-first under a deterministic policy
//! - Context builder: renders retrieved articles into the answering
//!   model's system instruction

mod context;
mod enrich;
mod prefilter;
mod retriever;

pub use context::build_system_prompt;
pub use enrich::QueryEnricher;
pub use prefilter::{extract_salient_terms, SALIENT_TERMS};
pub use retriever::HybridRetriever;
