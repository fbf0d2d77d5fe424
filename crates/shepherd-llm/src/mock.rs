//! Deterministic mock models for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use shepherd_core::{ChatMessage, ChatModel, Embedder, Result, ShepherdError, TokenStream};

/// A mock embedder that derives vectors from a text hash.
pub struct MockEmbedder {
    dimension: usize,
    fail_status: Option<u16>,
}

impl MockEmbedder {
    /// Create a new mock embedder with the reference dimension.
    pub fn new() -> Self {
        Self {
            dimension: 1536,
            fail_status: None,
        }
    }

    /// Create a mock embedder with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            fail_status: None,
        }
    }

    /// Create a mock embedder whose calls fail with the given status.
    pub fn failing(status: u16) -> Self {
        Self {
            dimension: 1536,
            fail_status: Some(status),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(ShepherdError::validation(
                "Empty text provided for embedding",
            ));
        }
        if let Some(status) = self.fail_status {
            return Err(ShepherdError::upstream(status, "mock embedder failure"));
        }

        // Deterministic vector from a text hash, L2 normalized
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimension];
        for (i, v) in embedding.iter_mut().enumerate() {
            *v = ((hash.wrapping_mul(i as u64 + 1)) as f32 % 1000.0) / 1000.0 - 0.5;
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Failure mode for [`MockChatModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockFailure {
    None,
    /// Every call fails with an upstream error.
    OnCall,
    /// The streaming call succeeds but the stream errors after the first
    /// fragment.
    MidStream,
}

/// A mock completion model that records prompts and replays canned output.
pub struct MockChatModel {
    fragments: Vec<String>,
    failure: MockFailure,
    prompts: Mutex<Vec<String>>,
}

impl MockChatModel {
    /// Replay `reply` as a single completion / single stream fragment.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            fragments: vec![reply.into()],
            failure: MockFailure::None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Replay the given fragments in order.
    pub fn with_fragments(fragments: Vec<&str>) -> Self {
        Self {
            fragments: fragments.into_iter().map(String::from).collect(),
            failure: MockFailure::None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with an upstream error.
    pub fn failing() -> Self {
        Self {
            fragments: Vec::new(),
            failure: MockFailure::OnCall,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Stream the given fragments, then fail with a transport error.
    pub fn failing_mid_stream(fragments: Vec<&str>) -> Self {
        Self {
            fragments: fragments.into_iter().map(String::from).collect(),
            failure: MockFailure::MidStream,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// The most recent prompt or serialized message list.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    fn record(&self, prompt: String) {
        self.prompts.lock().unwrap().push(prompt);
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, prompt: &str, _temperature: f32, _max_tokens: u32) -> Result<String> {
        self.record(prompt.to_string());
        if self.failure == MockFailure::OnCall {
            return Err(ShepherdError::upstream(500, "mock completion failure"));
        }
        Ok(self.fragments.join(""))
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<TokenStream> {
        self.record(serde_json::to_string(messages)?);

        if self.failure == MockFailure::OnCall {
            return Err(ShepherdError::upstream(500, "mock stream failure"));
        }

        let mut items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        if self.failure == MockFailure::MidStream {
            items.push(Err(ShepherdError::stream_transport("mock connection lost")));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed("consistent input").await.unwrap();
        let b = embedder.embed("consistent input").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1536);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_mock_embedder_failing() {
        let embedder = MockEmbedder::failing(500);
        let err = embedder.embed("query").await.unwrap_err();
        assert!(matches!(err, ShepherdError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_mock_chat_model_records_prompts() {
        let model = MockChatModel::new("enriched");
        let out = model.complete("rewrite me", 0.3, 150).await.unwrap();
        assert_eq!(out, "enriched");
        assert_eq!(model.last_prompt().unwrap(), "rewrite me");
    }

    #[tokio::test]
    async fn test_mock_stream_fragments() {
        let model = MockChatModel::with_fragments(vec!["Hel", "lo"]);
        let mut stream = model.stream(&[ChatMessage::user("hi")], 0.7, 1000).await.unwrap();

        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(item.unwrap());
        }
        assert_eq!(out, vec!["Hel", "lo"]);
    }
}
