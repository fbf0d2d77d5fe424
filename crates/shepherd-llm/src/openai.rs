//! HTTP client for an OpenAI-compatible model provider.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use shepherd_core::{
    ChatMessage, ChatModel, Embedder, LlmConfig, Result, ShepherdError, TokenStream,
};

use crate::sse::{decode_frame, SseFrame};

/// Buffered-but-bounded fragment channel; backpressure from the consumer
/// stalls the decode loop rather than queueing unbounded output.
const STREAM_CHANNEL_CAPACITY: usize = 32;

/// Client for an OpenAI-compatible provider.
///
/// Lookup calls (embedding, enrichment completion) and the long-lived
/// streaming completion use separate HTTP clients so their deadlines are
/// sized independently.
pub struct OpenAiClient {
    /// Client for the embedding call.
    embed_http: reqwest::Client,

    /// Client for the non-streaming completion call.
    complete_http: reqwest::Client,

    /// Client for the streaming completion call: connect timeout only,
    /// no overall deadline.
    stream_http: reqwest::Client,

    api_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client from configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let embed_http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.embed_timeout_secs))
            .build()
            .map_err(|e| ShepherdError::config(format!("Failed to build HTTP client: {}", e)))?;

        let complete_http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.completion_timeout_secs))
            .build()
            .map_err(|e| ShepherdError::config(format!("Failed to build HTTP client: {}", e)))?;

        let stream_http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.stream_connect_timeout_secs))
            .build()
            .map_err(|e| ShepherdError::config(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "Model client initialized: chat={}, embedding={} (dim {})",
            config.chat_model, config.embedding_model, config.embedding_dimension
        );

        Ok(Self {
            embed_http,
            complete_http,
            stream_http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
        })
    }

    fn request_error(e: reqwest::Error) -> ShepherdError {
        let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
        ShepherdError::upstream(status, e.to_string())
    }

    async fn error_from_response(resp: reqwest::Response) -> ShepherdError {
        let status = resp.status().as_u16();
        let detail = resp.text().await.unwrap_or_default();
        ShepherdError::upstream(status, detail)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(ShepherdError::validation(
                "Empty text provided for embedding",
            ));
        }

        let resp = self
            .embed_http
            .post(format!("{}/embeddings", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "input": text,
                "model": self.embedding_model,
            }))
            .send()
            .await
            .map_err(Self::request_error)?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let body: EmbeddingResponse = resp.json().await.map_err(Self::request_error)?;
        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ShepherdError::upstream(200, "No embedding in provider response"))?;

        if embedding.len() != self.dimension {
            return Err(ShepherdError::upstream(
                200,
                format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.dimension,
                    embedding.len()
                ),
            ));
        }

        debug!("Computed embedding ({} dimensions)", embedding.len());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let resp = self
            .complete_http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.chat_model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": temperature,
                "max_tokens": max_tokens,
            }))
            .send()
            .await
            .map_err(Self::request_error)?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let body: CompletionResponse = resp.json().await.map_err(Self::request_error)?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<TokenStream> {
        let resp = self
            .stream_http
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.chat_model,
                "messages": messages,
                "stream": true,
                "temperature": temperature,
                "max_tokens": max_tokens,
            }))
            .send()
            .await
            .map_err(Self::request_error)?;

        // Non-success initial status fails before any content is emitted.
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let (tx, rx) = mpsc::channel::<Result<String>>(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut bytes = resp.bytes_stream();
            // Byte buffer: lines are only converted to text once complete,
            // so multi-byte characters split across transport chunks survive.
            let mut buf: Vec<u8> = Vec::new();

            'transport: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Streaming completion transport failed: {}", e);
                        let _ = tx
                            .send(Err(ShepherdError::stream_transport(e.to_string())))
                            .await;
                        return;
                    }
                };

                buf.extend_from_slice(&chunk);

                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);

                    match decode_frame(&line) {
                        Some(SseFrame::Delta(text)) => {
                            // A closed receiver means the client is gone;
                            // dropping the response aborts the upstream call.
                            if tx.send(Ok(text)).await.is_err() {
                                debug!("Stream consumer dropped, aborting upstream call");
                                return;
                            }
                        }
                        Some(SseFrame::Done) => break 'transport,
                        None => {}
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = LlmConfig {
            api_url: server.base_url(),
            api_key: "test-key".to_string(),
            ..LlmConfig::default()
        };
        OpenAiClient::from_config(&config).unwrap()
    }

    fn embedding_json(dim: usize) -> String {
        let values: Vec<String> = (0..dim).map(|i| format!("{}", i as f32 * 0.001)).collect();
        format!(r#"{{"data":[{{"embedding":[{}]}}]}}"#, values.join(","))
    }

    #[tokio::test]
    async fn test_embed_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "text-embedding-3-small"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(embedding_json(1536));
        });

        let client = client_for(&server);
        let embedding = client.embed("NVIDIA Triton RCE").await.unwrap();

        mock.assert();
        assert_eq!(embedding.len(), 1536);
    }

    #[tokio::test]
    async fn test_embed_provider_failure_is_upstream() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(500).body("model overloaded");
        });

        let client = client_for(&server);
        let err = client.embed("query").await.unwrap_err();

        match err {
            ShepherdError::Upstream { status, detail } => {
                assert_eq!(status, 500);
                assert!(detail.contains("overloaded"));
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_empty_text_makes_no_network_call() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).body(embedding_json(1536));
        });

        let client = client_for(&server);
        let err = client.embed("   ").await.unwrap_err();

        assert!(matches!(err, ShepherdError::Validation { .. }));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200)
                .header("content-type", "application/json")
                .body(embedding_json(8));
        });

        let client = client_for(&server);
        let err = client.embed("query").await.unwrap_err();
        assert!(matches!(err, ShepherdError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_complete_returns_trimmed_content() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"model": "gpt-4o-mini", "max_tokens": 150}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[{"message":{"content":"  expanded query text  "}}]}"#);
        });

        let client = client_for(&server);
        let out = client.complete("rewrite this", 0.3, 150).await.unwrap();
        assert_eq!(out, "expanded query text");
    }

    #[tokio::test]
    async fn test_complete_failure_is_upstream() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limited");
        });

        let client = client_for(&server);
        let err = client.complete("prompt", 0.3, 150).await.unwrap_err();
        assert!(matches!(err, ShepherdError::Upstream { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_stream_emits_fragments_in_order() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"stream": true}"#);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(concat!(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
                    "data: [DONE]\n\n",
                ));
        });

        let client = client_for(&server);
        let messages = [ChatMessage::user("hi")];
        let mut stream = client.stream(&messages, 0.7, 1000).await.unwrap();

        let mut fragments = Vec::new();
        while let Some(item) = stream.next().await {
            fragments.push(item.unwrap());
        }
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_stream_skips_malformed_frame() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(concat!(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
                    "data: {malformed\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
                    "data: [DONE]\n\n",
                ));
        });

        let client = client_for(&server);
        let messages = [ChatMessage::user("hi")];
        let mut stream = client.stream(&messages, 0.7, 1000).await.unwrap();

        let mut fragments = Vec::new();
        while let Some(item) = stream.next().await {
            fragments.push(item.unwrap());
        }
        assert_eq!(fragments, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stream_initial_failure_before_any_content() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("service unavailable");
        });

        let client = client_for(&server);
        let messages = [ChatMessage::user("hi")];
        let err = client.stream(&messages, 0.7, 1000).await.err().unwrap();
        assert!(matches!(err, ShepherdError::Upstream { status: 503, .. }));
    }
}
