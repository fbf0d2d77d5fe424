//! Router construction and request handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use shepherd_chat::{ChatEvent, ChatPipeline, EmbeddingOutcome};
use shepherd_core::{ArticleStore, ChatModel, ChatRequest, Embedder, SearchRequest, SearchResponse};

use crate::error::ApiResult;

/// Shared handler state. Cloning is cheap, everything behind it is an Arc.
pub struct AppState<S, E, M> {
    pub pipeline: Arc<ChatPipeline<S, E, M>>,
}

impl<S, E, M> Clone for AppState<S, E, M> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<S, E, M> AppState<S, E, M> {
    pub fn new(pipeline: ChatPipeline<S, E, M>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the application router with CORS and request tracing applied.
pub fn create_router<S, E, M>(state: AppState<S, E, M>) -> Router
where
    S: ArticleStore + 'static,
    E: Embedder + 'static,
    M: ChatModel + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat::<S, E, M>))
        .route("/v1/search", post(search::<S, E, M>))
        .route(
            "/v1/articles/:id/embedding",
            post(compute_embedding::<S, E, M>),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// POST /v1/chat - stream a grounded answer as server-sent events.
///
/// Pre-stream failures (bad request, embedding, retrieval) become plain
/// HTTP error responses. Once the stream is open, failures arrive as an
/// in-band error event followed by end of stream.
async fn chat<S, E, M>(
    State(state): State<AppState<S, E, M>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>>
where
    S: ArticleStore + 'static,
    E: Embedder + 'static,
    M: ChatModel + 'static,
{
    info!("Chat request: {}", request.query);
    let events = state.pipeline.chat(request).await?;
    let sse = events.map(|event| Ok(to_sse_event(&event)));
    Ok(Sse::new(sse).keep_alive(KeepAlive::default()))
}

/// POST /v1/search - retrieval without answer generation.
async fn search<S, E, M>(
    State(state): State<AppState<S, E, M>>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>>
where
    S: ArticleStore + 'static,
    E: Embedder + 'static,
    M: ChatModel + 'static,
{
    info!("Search request: {}", request.query);
    let response = state.pipeline.search(request).await?;
    Ok(Json(response))
}

/// Body for the embedding write request (webhook-shaped: the caller hands
/// over the record's text rather than having the server re-read it).
#[derive(Debug, Deserialize)]
struct EmbeddingBody {
    #[serde(default)]
    long_summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingWritten {
    record_id: String,
    skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding_dimensions: Option<usize>,
}

/// POST /v1/articles/:id/embedding - compute and store an article's
/// embedding from its long summary. Records without one are skipped.
async fn compute_embedding<S, E, M>(
    State(state): State<AppState<S, E, M>>,
    Path(id): Path<String>,
    Json(body): Json<EmbeddingBody>,
) -> ApiResult<Json<EmbeddingWritten>>
where
    S: ArticleStore + 'static,
    E: Embedder + 'static,
    M: ChatModel + 'static,
{
    info!("Embedding write request for record {}", id);
    let outcome = state
        .pipeline
        .compute_embedding(&id, body.long_summary.as_deref())
        .await?;

    let response = match outcome {
        EmbeddingOutcome::Skipped => EmbeddingWritten {
            record_id: id,
            skipped: true,
            embedding_dimensions: None,
        },
        EmbeddingOutcome::Written { dimensions } => EmbeddingWritten {
            record_id: id,
            skipped: false,
            embedding_dimensions: Some(dimensions),
        },
    };
    Ok(Json(response))
}

fn to_sse_event(event: &ChatEvent) -> Event {
    Event::default().data(event.sse_data())
}
