//! In-memory article store with brute-force similarity.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use shepherd_core::{Article, ArticleStore, Result, SearchFilters, ShepherdError};

struct StoredArticle {
    article: Article,
    embedding: Option<Vec<f32>>,
    /// Analysis timestamp (Unix millis), drives recency ordering.
    analyzed_at: u64,
}

/// In-memory [`ArticleStore`] for tests and offline use.
///
/// Similarity search is brute-force cosine over the stored embeddings,
/// which is plenty at this scale. Date-range bounds are not modeled.
#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<Vec<StoredArticle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an article with an optional embedding and analysis timestamp.
    pub fn insert(&self, article: Article, embedding: Option<Vec<f32>>, analyzed_at: u64) {
        self.articles.write().unwrap().push(StoredArticle {
            article,
            embedding,
            analyzed_at,
        });
    }

    pub fn len(&self) -> usize {
        self.articles.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn intersects(filter: &Option<Vec<String>>, values: &[String]) -> bool {
    match filter {
        None => true,
        Some(wanted) => values.iter().any(|v| wanted.iter().any(|w| w == v)),
    }
}

fn matches_filters(article: &Article, filters: &SearchFilters) -> bool {
    if !intersects(&filters.categories, &article.categories) {
        return false;
    }
    if !intersects(&filters.technologies, &article.technologies) {
        return false;
    }
    if let Some(priorities) = &filters.priority {
        if !priorities.iter().any(|p| p == &article.priority) {
            return false;
        }
    }
    if let Some(regions) = &filters.regions {
        if !article
            .regions
            .iter()
            .any(|r| regions.iter().any(|w| w == &r.region))
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        filters: &SearchFilters,
        threshold: f32,
        count: u32,
    ) -> Result<Vec<Article>> {
        let articles = self.articles.read().unwrap();

        let mut scored: Vec<(f32, Article)> = articles
            .iter()
            .filter(|s| matches_filters(&s.article, filters))
            .filter_map(|s| {
                let stored = s.embedding.as_ref()?;
                let score = cosine_similarity(embedding, stored);
                (score > threshold).then(|| {
                    let mut article = s.article.clone();
                    article.similarity = Some(score);
                    (score, article)
                })
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(count as usize);

        debug!("Memory similarity search returned {} articles", scored.len());
        Ok(scored.into_iter().map(|(_, a)| a).collect())
    }

    async fn recent_matching(&self, term: &str, limit: u32) -> Result<Vec<Article>> {
        let needle = term.to_lowercase();
        let articles = self.articles.read().unwrap();

        let mut matched: Vec<(u64, Article)> = articles
            .iter()
            .filter(|s| {
                s.article.title.to_lowercase().contains(&needle)
                    || s.article.short_summary.to_lowercase().contains(&needle)
            })
            .map(|s| {
                let mut article = s.article.clone();
                article.similarity = None;
                (s.analyzed_at, article)
            })
            .collect();

        matched.sort_by(|a, b| b.0.cmp(&a.0));
        matched.truncate(limit as usize);

        Ok(matched.into_iter().map(|(_, a)| a).collect())
    }

    async fn update_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        let mut articles = self.articles.write().unwrap();
        let stored = articles
            .iter_mut()
            .find(|s| s.article.id == id)
            .ok_or_else(|| ShepherdError::retrieval(format!("Unknown article id: {}", id)))?;
        stored.embedding = Some(embedding.to_vec());
        Ok(())
    }
}
