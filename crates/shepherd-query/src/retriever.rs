//! Hybrid retriever: lexical prefilter + similarity search, merged
//! lexical-first.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use shepherd_core::{Article, ArticleStore, Result, SearchConfig, SearchFilters};

use crate::prefilter::extract_salient_terms;

/// Orchestrates the two retrieval halves and the merge policy.
///
/// Lexical and semantic lookups run concurrently; the merge is the
/// synchronization barrier. Lexical hits always precede semantic hits,
/// each group keeping its own source ordering (recency vs. similarity) -
/// no cross-phase score comparison is performed.
pub struct HybridRetriever<S> {
    store: Arc<S>,
    keyword_limit: u32,
}

impl<S> HybridRetriever<S>
where
    S: ArticleStore,
{
    pub fn new(store: Arc<S>, config: &SearchConfig) -> Self {
        Self {
            store,
            keyword_limit: config.keyword_limit,
        }
    }

    /// Retrieve a merged, deduplicated, bounded result set.
    ///
    /// `original_query` drives the lexical prefilter and must be the raw
    /// user text, not the enriched query. A similarity-search failure
    /// fails the whole retrieval; lexical-only degraded results are never
    /// returned silently.
    pub async fn retrieve(
        &self,
        embedding: &[f32],
        filters: &SearchFilters,
        original_query: &str,
        threshold: f32,
        count: u32,
    ) -> Result<Vec<Article>> {
        let terms = extract_salient_terms(original_query);
        debug!("Salient terms found: {:?}", terms);

        let (lexical, semantic) = tokio::join!(
            self.lexical_search(&terms),
            self.store
                .similarity_search(embedding, filters, threshold, count),
        );

        // The semantic half is the retrieval's backbone: its failure is
        // surfaced, never masked by partial lexical results.
        let semantic = semantic?;

        let lexical = match lexical {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Lexical prefilter failed, continuing without it: {}", e);
                Vec::new()
            }
        };

        let merged = merge(lexical, semantic, count as usize);
        info!("Retrieved {} articles", merged.len());
        Ok(merged)
    }

    /// The substring-match half. Restricted to the first found term only:
    /// this bounds worst-case latency and avoids combinatorial OR-query
    /// blowup when a query mentions several vendors.
    async fn lexical_search(&self, terms: &[&'static str]) -> Result<Vec<Article>> {
        let Some(term) = terms.first() else {
            // No vocabulary hits: the path is skipped entirely, not run
            // with an empty filter.
            return Ok(Vec::new());
        };

        let articles = self.store.recent_matching(term, self.keyword_limit).await?;
        debug!(
            "Substring search for {:?} found {} articles",
            term,
            articles.len()
        );
        Ok(articles)
    }
}

/// Merge policy: lexical ids form the seen-set, semantic hits already seen
/// are dropped, lexical precedes semantic, truncate to `cap`.
fn merge(lexical: Vec<Article>, semantic: Vec<Article>, cap: usize) -> Vec<Article> {
    let seen: HashSet<String> = lexical.iter().map(|a| a.id.clone()).collect();

    let mut merged = lexical;
    merged.extend(semantic.into_iter().filter(|a| !seen.contains(&a.id)));
    merged.truncate(cap);
    merged
}
