//! Context block rendering for the answering model.

use shepherd_core::Article;

/// Delimiter between article context blocks.
const BLOCK_DELIMITER: &str = "\n---\n";

/// Render the retrieved articles into the answering model's system
/// instruction.
///
/// One block per article, in result order. No per-field truncation: the
/// retriever's result cap bounds total context size.
pub fn build_system_prompt(articles: &[Article]) -> String {
    let blocks: Vec<String> = articles
        .iter()
        .enumerate()
        .map(|(i, a)| render_article(i + 1, a))
        .collect();

    format!(
        r#"You are Shepherd, a helpful cybersecurity and tech news assistant. You help users understand recent security threats, vulnerabilities, and technology news.

Your knowledge is based on the following recent articles:

{}

Guidelines:
- Answer questions based on the provided articles
- Be concise but informative
- If asked about something not covered in the articles, say so
- Always cite the relevant article when possible
- Use markdown formatting for better readability
- For security issues, emphasize actionable advice when relevant
- If multiple articles are relevant, synthesize the information
- Be conversational and helpful"#,
        blocks.join(BLOCK_DELIMITER)
    )
}

fn render_article(index: usize, a: &Article) -> String {
    let mut block = format!(
        "[Article {}]\nTitle: {}\nSummary: {}\n",
        index, a.title, a.short_summary
    );

    if let Some(details) = a.long_summary.as_deref().filter(|s| !s.is_empty()) {
        block.push_str(&format!("Details: {}\n", details));
    }

    block.push_str(&format!("Categories: {}\n", join_or_na(&a.categories)));
    block.push_str(&format!(
        "Priority: {}\n",
        if a.priority.is_empty() {
            "N/A"
        } else {
            &a.priority
        }
    ));

    let regions = if a.regions.is_empty() {
        "Global".to_string()
    } else {
        a.regions
            .iter()
            .map(|r| r.display())
            .collect::<Vec<_>>()
            .join(", ")
    };
    block.push_str(&format!("Regions: {}\n", regions));

    block.push_str(&format!("Technologies: {}\n", join_or_na(&a.technologies)));
    block.push_str(&format!("URL: {}", a.url));

    block
}

fn join_or_na(values: &[String]) -> String {
    if values.is_empty() {
        "N/A".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_core::Region;

    fn article(id: &str, title: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            short_summary: format!("Summary of {}", title),
            long_summary: None,
            categories: Vec::new(),
            priority: String::new(),
            regions: Vec::new(),
            technologies: Vec::new(),
            url: format!("https://example.com/{}", id),
            similarity: None,
        }
    }

    #[test]
    fn test_blocks_in_result_order_with_delimiter() {
        let articles = vec![article("a", "First"), article("b", "Second")];
        let prompt = build_system_prompt(&articles);

        let first = prompt.find("[Article 1]\nTitle: First").unwrap();
        let second = prompt.find("[Article 2]\nTitle: Second").unwrap();
        assert!(first < second);
        assert_eq!(prompt.matches(BLOCK_DELIMITER).count(), 1);
    }

    #[test]
    fn test_full_article_rendering() {
        let mut a = article("a1", "Triton RCE");
        a.long_summary = Some("Deep dive into the flaw.".to_string());
        a.categories = vec!["vulnerability".to_string(), "ai".to_string()];
        a.priority = "critical".to_string();
        a.regions = vec![Region {
            region: "Europe".to_string(),
            flag: "\u{1F1EA}\u{1F1FA}".to_string(),
        }];
        a.technologies = vec!["Triton".to_string()];

        let prompt = build_system_prompt(&[a]);
        assert!(prompt.contains("Details: Deep dive into the flaw."));
        assert!(prompt.contains("Categories: vulnerability, ai"));
        assert!(prompt.contains("Priority: critical"));
        assert!(prompt.contains("Europe"));
        assert!(prompt.contains("Technologies: Triton"));
        assert!(prompt.contains("URL: https://example.com/a1"));
    }

    #[test]
    fn test_defaults_for_sparse_article() {
        let prompt = build_system_prompt(&[article("a1", "Sparse")]);
        assert!(!prompt.contains("Details:"));
        assert!(prompt.contains("Categories: N/A"));
        assert!(prompt.contains("Priority: N/A"));
        assert!(prompt.contains("Regions: Global"));
        assert!(prompt.contains("Technologies: N/A"));
    }

    #[test]
    fn test_persona_and_guidelines_present() {
        let prompt = build_system_prompt(&[]);
        assert!(prompt.starts_with("You are Shepherd"));
        assert!(prompt.contains("cite the relevant article"));
        assert!(prompt.contains("markdown formatting"));
    }
}
