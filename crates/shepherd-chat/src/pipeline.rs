//! The end-to-end chat pipeline and the standalone search path.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use shepherd_core::{
    ChatMessage, ChatModel, ChatRequest, Embedder, Result, SearchConfig, SearchRequest,
    SearchResponse, ShepherdError,
};
use shepherd_core::ArticleStore;
use shepherd_query::{build_system_prompt, HybridRetriever, QueryEnricher};

use crate::events::ChatEvent;

/// Event channel depth. Small on purpose so a slow consumer exerts
/// backpressure on the upstream token stream instead of buffering an
/// unbounded answer in memory.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// The stream handed to transports. Dropping it closes the channel,
/// which stops the producer task and aborts the upstream request.
pub type ChatStream = ReceiverStream<ChatEvent>;

/// Orchestrates a chat session: enrich the query, embed it, retrieve
/// context, then stream the grounded answer.
///
/// Validation, embedding, and retrieval failures surface as `Err` before
/// any stream exists. Once streaming starts, failures travel in-band as
/// a terminal [`ChatEvent::Error`].
pub struct ChatPipeline<S, E, M> {
    store: Arc<S>,
    embedder: Arc<E>,
    model: Arc<M>,
    enricher: QueryEnricher<M>,
    retriever: HybridRetriever<S>,
    config: SearchConfig,
}

/// Result of an embedding write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingOutcome {
    /// The record carries no text to embed; nothing was written.
    Skipped,
    /// The embedding was computed and written back.
    Written { dimensions: usize },
}

impl<S, E, M> ChatPipeline<S, E, M>
where
    S: ArticleStore + 'static,
    E: Embedder,
    M: ChatModel + 'static,
{
    pub fn new(store: Arc<S>, embedder: Arc<E>, model: Arc<M>, config: SearchConfig) -> Self {
        Self {
            store: Arc::clone(&store),
            embedder,
            model: Arc::clone(&model),
            enricher: QueryEnricher::new(model, &config),
            retriever: HybridRetriever::new(store, &config),
            config,
        }
    }

    /// Run a chat session. Returns the event stream once retrieval has
    /// succeeded; the answer itself arrives asynchronously.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatStream> {
        let query = request.query.trim().to_string();
        if query.is_empty() {
            return Err(ShepherdError::validation("Query is required"));
        }

        // Enrichment feeds the embedding only. The answer prompt and the
        // lexical prefilter both see the user's original words.
        let enriched = self.enricher.enrich(&query, &request.history).await;
        debug!("Enriched query: {}", enriched);

        let embedding = self.embedder.embed(&enriched).await?;
        let articles = self
            .retriever
            .retrieve(
                &embedding,
                &request.filters,
                &query,
                self.config.chat_match_threshold,
                self.config.match_count,
            )
            .await?;
        info!("Answering with {} context articles", articles.len());

        let system_prompt = build_system_prompt(&articles);
        let mut messages = vec![ChatMessage::system(system_prompt)];
        let skip = request
            .history
            .len()
            .saturating_sub(self.config.answer_history_turns);
        messages.extend(request.history.into_iter().skip(skip));
        messages.push(ChatMessage::user(query));

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let model = Arc::clone(&self.model);
        let temperature = self.config.answer_temperature;
        let max_tokens = self.config.answer_max_tokens;

        tokio::spawn(async move {
            if tx.send(ChatEvent::metadata(&articles)).await.is_err() {
                return;
            }

            let mut tokens = match model.stream(&messages, temperature, max_tokens).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Completion stream failed to open: {}", e);
                    let _ = tx.send(ChatEvent::error(e.to_string())).await;
                    return;
                }
            };

            while let Some(item) = tokens.next().await {
                match item {
                    Ok(fragment) => {
                        // A closed channel means the client went away;
                        // dropping the token stream aborts the upstream
                        // request.
                        if tx.send(ChatEvent::content(fragment)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Completion stream broke mid-answer: {}", e);
                        let _ = tx.send(ChatEvent::error(e.to_string())).await;
                        return;
                    }
                }
            }

            let _ = tx.send(ChatEvent::Done).await;
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Standalone semantic search. No enrichment and no answer: the raw
    /// query is embedded as-is and the merged result set is returned in
    /// one response.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let query = request.query.trim().to_string();
        if query.is_empty() {
            return Err(ShepherdError::validation("Query is required"));
        }

        let threshold = request
            .match_threshold
            .unwrap_or(self.config.search_match_threshold);
        let count = request.match_count.unwrap_or(self.config.match_count);

        let embedding = self.embedder.embed(&query).await?;
        let results = self
            .retriever
            .retrieve(&embedding, &request.filters, &query, threshold, count)
            .await?;
        info!("Search returned {} results", results.len());

        Ok(SearchResponse {
            query,
            filters_applied: request.filters,
            match_threshold: threshold,
            result_count: results.len(),
            results,
        })
    }

    /// Compute an article's embedding from its long summary and write it
    /// back to the store.
    ///
    /// A record without long-summary text is skipped, not an error: the
    /// write path is driven by ingest webhooks and many records legitimately
    /// have no embeddable text yet.
    pub async fn compute_embedding(
        &self,
        id: &str,
        long_summary: Option<&str>,
    ) -> Result<EmbeddingOutcome> {
        if id.trim().is_empty() {
            return Err(ShepherdError::validation("Missing record ID"));
        }

        let text = match long_summary {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                info!("No long summary for record {}, skipping embedding", id);
                return Ok(EmbeddingOutcome::Skipped);
            }
        };

        let embedding = self.embedder.embed(text).await?;
        self.store.update_embedding(id, &embedding).await?;

        info!(
            "Stored embedding for record {} ({} dimensions)",
            id,
            embedding.len()
        );
        Ok(EmbeddingOutcome::Written {
            dimensions: embedding.len(),
        })
    }
}
