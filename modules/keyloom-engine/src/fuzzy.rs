//! Approximate string matching over normalized keyword text.
//!
//! Used wherever the pipeline needs to decide whether two keyword spellings
//! are "the same", e.g. validating an AI-suggested keyword against the
//! original corpus.

use keyloom_common::KeyloomError;

use crate::text::normalize;

/// Fraction of the longest normalized length tolerated as edit distance.
const DISTANCE_RATIO: f32 = 0.25;

/// Outcome of matching a query against a candidate set. `best` is surfaced
/// even when `matched` is false, for diagnostics.
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    pub matched: bool,
    pub best: String,
    pub distance: usize,
}

/// Classic dynamic-programming Levenshtein distance. Insertion, deletion
/// and substitution each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row DP over the (a.len+1) x (b.len+1) matrix.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Fuzzy-match `query` against `candidates` over normalized forms.
///
/// The tolerance is proportional to the longest normalized length among the
/// query and all candidates: `max(1, floor(max_len * 0.25))`. A distance of
/// exactly 0 returns immediately. Ties keep the first-seen minimum, so the
/// result is independent of candidate ordering up to that tie-break.
pub fn fuzzy_match(query: &str, candidates: &[String]) -> Result<FuzzyMatch, KeyloomError> {
    if candidates.is_empty() {
        return Err(KeyloomError::Validation(
            "fuzzy match requires at least one candidate".to_string(),
        ));
    }

    let norm_query = normalize(query);
    let mut max_len = norm_query.chars().count();
    let mut best_distance = usize::MAX;
    let mut best = &candidates[0];

    for candidate in candidates {
        let norm_candidate = normalize(candidate);
        max_len = max_len.max(norm_candidate.chars().count());

        let distance = levenshtein(&norm_query, &norm_candidate);
        if distance == 0 {
            return Ok(FuzzyMatch {
                matched: true,
                best: candidate.clone(),
                distance: 0,
            });
        }
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }

    let threshold = ((max_len as f32 * DISTANCE_RATIO).floor() as usize).max(1);

    Ok(FuzzyMatch {
        matched: best_distance <= threshold,
        best: best.clone(),
        distance: best_distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kitten_sitting_is_three() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn identical_strings_are_zero() {
        for s in ["", "seo", "zapatos de seguridad"] {
            assert_eq!(levenshtein(s, s), 0);
        }
    }

    #[test]
    fn empty_against_word() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn close_variant_matches() {
        let candidates = vec!["zapatos de seguridad".to_string()];
        let result = fuzzy_match("zapato seguridad", &candidates).unwrap();
        assert!(result.matched);
        assert_eq!(result.best, "zapatos de seguridad");
    }

    #[test]
    fn unrelated_query_misses_but_surfaces_best() {
        let candidates = vec!["zapatos de seguridad".to_string()];
        let result = fuzzy_match("marketing digital", &candidates).unwrap();
        assert!(!result.matched);
        assert_eq!(result.best, "zapatos de seguridad");
    }

    #[test]
    fn exact_match_short_circuits() {
        let candidates = vec![
            "botas de trabajo".to_string(),
            "Zapatos de Seguridad!".to_string(),
        ];
        // Normalized forms are equal, so distance 0 against the second.
        let result = fuzzy_match("zapatos de seguridad", &candidates).unwrap();
        assert!(result.matched);
        assert_eq!(result.distance, 0);
        assert_eq!(result.best, "Zapatos de Seguridad!");
    }

    #[test]
    fn first_seen_minimum_wins_ties() {
        let candidates = vec!["sea".to_string(), "seu".to_string()];
        let result = fuzzy_match("seo", &candidates).unwrap();
        assert_eq!(result.best, "sea");
    }

    #[test]
    fn empty_candidates_rejected() {
        assert!(fuzzy_match("seo", &[]).is_err());
    }
}
