//! Raw keyword batch cleanup: trim, drop empties, dedup first-seen-wins.

use serde::Serialize;
use tracing::info;

/// Rough per-duplicate token cost avoided downstream (prompt + embedding).
const TOKENS_PER_DUPLICATE: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    /// Deduplicated keywords, original casing of the first occurrence,
    /// input order preserved.
    pub cleaned: Vec<String>,
    /// The dropped repeats, as they appeared in the input.
    pub duplicates: Vec<String>,
    pub original_count: usize,
    pub cleaned_count: usize,
    pub duplicates_removed: usize,
    pub estimated_token_savings: usize,
}

/// Deduplicate and normalize a raw keyword batch.
///
/// Comparison is case-insensitive with whitespace collapsed; the first
/// occurrence keeps its original casing. Idempotent: cleaning a cleaned
/// batch removes nothing.
pub fn clean_keywords(raw: &[String]) -> CleanReport {
    let original_count = raw.len();

    let mut seen: Vec<String> = Vec::new();
    let mut cleaned = Vec::new();
    let mut duplicates = Vec::new();

    for entry in raw {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }

        let key = trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if seen.contains(&key) {
            duplicates.push(entry.clone());
        } else {
            seen.push(key);
            cleaned.push(trimmed.to_string());
        }
    }

    let report = CleanReport {
        cleaned_count: cleaned.len(),
        duplicates_removed: duplicates.len(),
        estimated_token_savings: duplicates.len() * TOKENS_PER_DUPLICATE,
        cleaned,
        duplicates,
        original_count,
    };

    info!(
        original = report.original_count,
        cleaned = report.cleaned_count,
        duplicates = report.duplicates_removed,
        "keyword batch cleaned"
    );

    report
}
