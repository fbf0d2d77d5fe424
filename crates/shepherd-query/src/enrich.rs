//! Query enrichment for better semantic recall.

use std::sync::Arc;

use tracing::{debug, warn};

use shepherd_core::{ChatMessage, ChatModel, SearchConfig};

/// Rewrites a raw user query into a semantically richer search string.
///
/// Enrichment is an optimization, never a hard dependency: any failure of
/// the rewrite call falls back to the original query unmodified. The final
/// enriched query is `"{original} {expansion}"`, so original terms are
/// never dropped even if the rewrite model ignores its instructions.
pub struct QueryEnricher<M> {
    model: Arc<M>,
    history_turns: usize,
    temperature: f32,
    max_tokens: u32,
}

impl<M> QueryEnricher<M>
where
    M: ChatModel,
{
    pub fn new(model: Arc<M>, config: &SearchConfig) -> Self {
        Self {
            model,
            history_turns: config.enrich_history_turns,
            temperature: config.enrich_temperature,
            max_tokens: config.enrich_max_tokens,
        }
    }

    /// Enrich a query using up to the last few history turns as grounding.
    pub async fn enrich(&self, query: &str, history: &[ChatMessage]) -> String {
        let prompt = self.build_prompt(query, history);

        match self
            .model
            .complete(&prompt, self.temperature, self.max_tokens)
            .await
        {
            Ok(expansion) if !expansion.is_empty() => {
                let enriched = format!("{} {}", query, expansion).trim().to_string();
                debug!("Enriched query: {:?} -> {:?}", query, enriched);
                enriched
            }
            Ok(_) => query.to_string(),
            Err(e) => {
                warn!("Query enrichment failed, using original query: {}", e);
                query.to_string()
            }
        }
    }

    fn build_prompt(&self, query: &str, history: &[ChatMessage]) -> String {
        let start = history.len().saturating_sub(self.history_turns);
        let recent_context: Vec<String> = history[start..]
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect();

        let history_block = if recent_context.is_empty() {
            String::new()
        } else {
            format!("Recent conversation:\n{}\n\n", recent_context.join("\n"))
        };

        format!(
            r#"You are a query enrichment system for cybersecurity news search. Your task is to expand user queries for optimal semantic search.

{history_block}User query: "{query}"

Create an enriched search query that:
1. ALWAYS PRESERVE specific vendor/product names (NVIDIA, Microsoft, Cisco, etc.) - these are critical!
2. Expands abbreviations (e.g., "APT" -> "Advanced Persistent Threat APT", "RCE" -> "Remote Code Execution RCE")
3. Adds relevant technical synonyms (e.g., "bugs" -> "bugs vulnerabilities flaws CVE")
4. Incorporates context from the conversation if relevant
5. Keeps it concise (max 80 words)

IMPORTANT: Never remove or replace specific company/product names from the original query!

Output ONLY the enriched query, nothing else."#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_llm::MockChatModel;

    fn enricher(model: MockChatModel) -> QueryEnricher<MockChatModel> {
        QueryEnricher::new(Arc::new(model), &SearchConfig::default())
    }

    #[tokio::test]
    async fn test_original_query_is_prefix_of_enriched() {
        let e = enricher(MockChatModel::new(
            "NVIDIA Triton Remote Code Execution RCE vulnerability",
        ));
        let enriched = e.enrich("NVIDIA Triton RCE", &[]).await;

        assert!(enriched.starts_with("NVIDIA Triton RCE"));
        assert!(enriched.contains("Remote Code Execution"));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let e = enricher(MockChatModel::failing());
        let enriched = e.enrich("cisco firewall bug", &[]).await;
        assert_eq!(enriched, "cisco firewall bug");
    }

    #[tokio::test]
    async fn test_empty_expansion_falls_back() {
        let e = enricher(MockChatModel::new(""));
        let enriched = e.enrich("linux kernel", &[]).await;
        assert_eq!(enriched, "linux kernel");
    }

    #[tokio::test]
    async fn test_history_capped_at_last_three_turns() {
        let model = MockChatModel::new("expanded");
        let e = enricher(model);

        let history = vec![
            ChatMessage::user("turn one"),
            ChatMessage::assistant("turn two"),
            ChatMessage::user("turn three"),
            ChatMessage::assistant("turn four"),
            ChatMessage::user("turn five"),
        ];
        e.enrich("follow-up", &history).await;

        let prompt = e.model.last_prompt().unwrap();
        assert!(!prompt.contains("turn one"));
        assert!(!prompt.contains("turn two"));
        assert!(prompt.contains("turn three"));
        assert!(prompt.contains("turn four"));
        assert!(prompt.contains("user: turn five"));
    }

    #[tokio::test]
    async fn test_prompt_carries_query_and_instructions() {
        let model = MockChatModel::new("expanded");
        let e = enricher(model);
        e.enrich("APT activity", &[]).await;

        let prompt = e.model.last_prompt().unwrap();
        assert!(prompt.contains(r#"User query: "APT activity""#));
        assert!(prompt.contains("max 80 words"));
        assert!(!prompt.contains("Recent conversation"));
    }
}
