//! Topic/service scoping for imported keywords.
//!
//! Classifies a keyword as in-scope or a discard candidate by matching it
//! against two fixed vocabularies: the site's own navigable topics first,
//! then the business's service offerings. The filter only proposes discards;
//! committing one is a separate store operation so a human can review.

use serde::Serialize;

use crate::text::{normalize, tokens};

/// Topics derived from the site's navigable sections.
const DEFAULT_TOPIC_TERMS: &[&str] = &[
    "seo",
    "posicionamiento web",
    "marketing digital",
    "diseño web",
    "google",
    "palabras clave",
    "contenidos",
    "analitica web",
];

/// Business service offerings.
const DEFAULT_SERVICE_TERMS: &[&str] = &[
    "auditoria seo",
    "seo local",
    "seo tecnico",
    "link building",
    "consultoria seo",
    "optimizacion web",
    "redaccion de contenidos",
];

const NO_MATCH_REASON: &str = "no topical match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    Topics,
    Services,
}

/// Filter verdict for one keyword. `Discard` is advisory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ScopeDecision {
    InScope {
        term: String,
        vocabulary: Vocabulary,
    },
    Discard {
        reason: String,
    },
}

pub struct TopicFilter {
    topics: Vec<String>,
    services: Vec<String>,
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_TOPIC_TERMS.iter().map(|t| t.to_string()).collect(),
            DEFAULT_SERVICE_TERMS.iter().map(|t| t.to_string()).collect(),
        )
    }
}

impl TopicFilter {
    pub fn new(topics: Vec<String>, services: Vec<String>) -> Self {
        Self { topics, services }
    }

    /// Classify one keyword. Topics are checked before services; within a
    /// vocabulary the first matching term wins.
    pub fn classify(&self, keyword: &str) -> ScopeDecision {
        let norm_keyword = normalize(keyword);
        let keyword_tokens = tokens(keyword);

        for (vocabulary, terms) in [
            (Vocabulary::Topics, &self.topics),
            (Vocabulary::Services, &self.services),
        ] {
            for term in terms {
                if term_matches(&norm_keyword, &keyword_tokens, term) {
                    return ScopeDecision::InScope {
                        term: term.clone(),
                        vocabulary,
                    };
                }
            }
        }

        ScopeDecision::Discard {
            reason: NO_MATCH_REASON.to_string(),
        }
    }
}

/// A term matches when the normalized keyword contains it as a substring,
/// or when every token of the term appears somewhere in the keyword.
fn term_matches(norm_keyword: &str, keyword_tokens: &[String], term: &str) -> bool {
    let norm_term = normalize(term);
    if norm_term.is_empty() {
        return false;
    }
    if norm_keyword.contains(&norm_term) {
        return true;
    }
    norm_term
        .split_whitespace()
        .all(|t| keyword_tokens.iter().any(|kt| kt == t))
}
