//! PostgREST-style remote article store.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use shepherd_core::{Article, ArticleStore, Result, SearchFilters, ShepherdError, StoreConfig};

/// Columns of the article projection the pipeline reads.
const ARTICLE_COLUMNS: &str = "id,article_title,short_summary,long_summary,categories,priority,regions,mentioned_technologies,article_url";

/// Remote article store accessed through a PostgREST-compatible API.
///
/// Similarity search goes through the `search_articles` stored procedure;
/// the substring match and the embedding write-back go straight to the
/// `article_analyses` relation.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl RestStore {
    /// Create a store client from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(ShepherdError::config("Article store base_url is not set"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ShepherdError::config(format!("Failed to build HTTP client: {}", e)))?;

        info!("Article store client initialized: {}", config.base_url);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp.text().await.unwrap_or_default();
        Err(ShepherdError::retrieval(format!(
            "Store request failed ({}): {}",
            status.as_u16(),
            detail
        )))
    }
}

/// Serialize an embedding as the store's bracketed comma-separated literal.
fn vector_literal(embedding: &[f32]) -> String {
    let parts: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[async_trait]
impl ArticleStore for RestStore {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        filters: &SearchFilters,
        threshold: f32,
        count: u32,
    ) -> Result<Vec<Article>> {
        let body = json!({
            "query_embedding": vector_literal(embedding),
            "filter_categories": filters.categories,
            "filter_technologies": filters.technologies,
            "filter_from_date": filters.from_date,
            "filter_to_date": filters.to_date,
            "filter_tags": filters.tags,
            "filter_priority": filters.priority,
            "filter_regions": filters.regions,
            "match_threshold": threshold,
            "match_count": count,
        });

        let resp = self
            .authed(
                self.http
                    .post(format!("{}/rest/v1/rpc/search_articles", self.base_url)),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ShepherdError::retrieval(format!("Similarity search failed: {}", e)))?;

        let resp = Self::check(resp).await?;
        let articles: Vec<Article> = resp
            .json()
            .await
            .map_err(|e| ShepherdError::retrieval(format!("Malformed search response: {}", e)))?;

        debug!("Similarity search returned {} articles", articles.len());
        Ok(articles)
    }

    async fn recent_matching(&self, term: &str, limit: u32) -> Result<Vec<Article>> {
        // The term comes from the fixed prefilter vocabulary, but encode it
        // anyway so the or= expression stays well-formed.
        let pattern = format!("*{}*", urlencoding::encode(term));
        let or_expr = format!(
            "(article_title.ilike.{},short_summary.ilike.{})",
            pattern, pattern
        );

        let resp = self
            .authed(
                self.http
                    .get(format!("{}/rest/v1/article_analyses", self.base_url))
                    .query(&[
                        ("select", ARTICLE_COLUMNS),
                        ("or", or_expr.as_str()),
                        ("order", "analyzed_at.desc"),
                        ("limit", &limit.to_string()),
                    ]),
            )
            .send()
            .await
            .map_err(|e| ShepherdError::retrieval(format!("Substring match failed: {}", e)))?;

        let resp = Self::check(resp).await?;
        let articles: Vec<Article> = resp
            .json()
            .await
            .map_err(|e| ShepherdError::retrieval(format!("Malformed match response: {}", e)))?;

        debug!(
            "Substring match for {:?} returned {} articles",
            term,
            articles.len()
        );
        Ok(articles)
    }

    async fn update_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        let resp = self
            .authed(
                self.http
                    .patch(format!("{}/rest/v1/article_analyses", self.base_url))
                    .query(&[("id", format!("eq.{}", id))]),
            )
            .json(&json!({ "embedding": vector_literal(embedding) }))
            .send()
            .await
            .map_err(|e| ShepherdError::retrieval(format!("Embedding update failed: {}", e)))?;

        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store_for(server: &MockServer) -> RestStore {
        RestStore::from_config(&StoreConfig {
            base_url: server.base_url(),
            service_key: "service-key".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    const ARTICLE_JSON: &str = r#"[{
        "id": "a1",
        "article_title": "NVIDIA Triton flaw",
        "short_summary": "RCE in Triton Inference Server",
        "long_summary": null,
        "categories": ["vulnerability"],
        "priority": "critical",
        "regions": [],
        "mentioned_technologies": ["Triton"],
        "article_url": "https://example.com/a1",
        "similarity": 0.91
    }]"#;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[tokio::test]
    async fn test_similarity_search_rpc() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/rpc/search_articles")
                .header("apikey", "service-key")
                .json_body_partial(r#"{"match_count": 10, "filter_tags": null}"#);
            then.status(200)
                .header("content-type", "application/json")
                .body(ARTICLE_JSON);
        });

        let store = store_for(&server);
        let results = store
            .similarity_search(&[0.1, 0.2], &SearchFilters::default(), 0.05, 10)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity, Some(0.91));
    }

    #[tokio::test]
    async fn test_similarity_search_failure_is_retrieval() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rest/v1/rpc/search_articles");
            then.status(500).body("index unavailable");
        });

        let store = store_for(&server);
        let err = store
            .similarity_search(&[0.1], &SearchFilters::default(), 0.05, 10)
            .await
            .unwrap_err();

        assert!(matches!(err, ShepherdError::Retrieval { .. }));
        assert!(err.to_string().contains("index unavailable"));
    }

    #[tokio::test]
    async fn test_recent_matching_query_shape() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/article_analyses")
                .query_param("order", "analyzed_at.desc")
                .query_param("limit", "5")
                .query_param(
                    "or",
                    "(article_title.ilike.*nvidia*,short_summary.ilike.*nvidia*)",
                );
            then.status(200)
                .header("content-type", "application/json")
                .body(ARTICLE_JSON);
        });

        let store = store_for(&server);
        let results = store.recent_matching("nvidia", 5).await.unwrap();

        mock.assert();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a1");
    }

    #[tokio::test]
    async fn test_update_embedding() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("PATCH")
                .path("/rest/v1/article_analyses")
                .query_param("id", "eq.a1");
            then.status(204);
        });

        let store = store_for(&server);
        store.update_embedding("a1", &[0.25, 0.5]).await.unwrap();
        mock.assert();
    }
}
