//! Lexical prefilter over a fixed vocabulary of high-salience terms.
//!
//! Embedding similarity blurs specific entity names into general topic
//! space; a cheap substring check over known vendor/platform/OS names
//! recovers exact-entity recall at negligible cost.

/// Vendor, platform, and OS names that trigger the lexical path.
/// Order matters: matches are reported in vocabulary order.
pub const SALIENT_TERMS: &[&str] = &[
    "nvidia",
    "microsoft",
    "google",
    "apple",
    "amazon",
    "cisco",
    "intel",
    "amd",
    "oracle",
    "ibm",
    "vmware",
    "adobe",
    "citrix",
    "fortinet",
    "paloalto",
    "triton",
    "kubernetes",
    "docker",
    "windows",
    "linux",
    "android",
    "ios",
];

/// Scan a query for vocabulary terms, case-insensitively as substrings.
///
/// Returns matched terms in vocabulary-declared order. The scan always
/// runs against the original query, never the enriched one: enrichment
/// may dilute exact vendor terms with synonyms.
pub fn extract_salient_terms(query: &str) -> Vec<&'static str> {
    let query_lower = query.to_lowercase();
    SALIENT_TERMS
        .iter()
        .filter(|term| query_lower.contains(*term))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_order_preserved() {
        // "triton" precedes "nvidia" in the query, but vocabulary order wins
        let terms = extract_salient_terms("Triton bug at NVIDIA");
        assert_eq!(terms, vec!["nvidia", "triton"]);
    }

    #[test]
    fn test_nvidia_triton_scenario() {
        let terms = extract_salient_terms("NVIDIA Triton RCE");
        assert_eq!(terms, vec!["nvidia", "triton"]);
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert_eq!(extract_salient_terms("WINDOWS patch"), vec!["windows"]);
        // Substring semantics: "kubernetes" inside a longer token still hits
        assert_eq!(
            extract_salient_terms("my kubernetes-cluster is down"),
            vec!["kubernetes"]
        );
    }

    #[test]
    fn test_no_terms() {
        assert!(extract_salient_terms("latest ransomware trends").is_empty());
    }
}
