//! Similarity measures feeding the hybrid match score.
//!
//! Three complementary views of the same pair of names:
//! - token overlap, tolerant of missing or extra name parts;
//! - Levenshtein similarity, tolerant of typos;
//! - Ratcliff/Obershelp sequence ratio, capturing overall shape.

use std::collections::HashSet;

/// Levenshtein edit distance (two-row iterative form).
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, c1) in a.iter().enumerate() {
        let mut current = vec![i + 1];
        for (j, c2) in b.iter().enumerate() {
            let insertions = prev[j + 1] + 1;
            let deletions = current[j] + 1;
            let substitutions = prev[j] + usize::from(c1 != c2);
            current.push(insertions.min(deletions).min(substitutions));
        }
        prev = current;
    }
    prev[b.len()]
}

/// Similarity in [0, 1] derived from Levenshtein distance:
/// `1 - distance / max_len`.
pub fn levenshtein_similarity(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let distance = levenshtein_distance(s1, s2);
    let max_len = s1.chars().count().max(s2.chars().count());
    1.0 - (distance as f64 / max_len as f64)
}

/// Ratcliff/Obershelp ratio: `2·M / (len1 + len2)` where M is the total
/// length of recursively matched longest common blocks. Equivalent to
/// difflib's `SequenceMatcher::ratio` without the junk heuristic.
pub fn sequence_ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total characters covered by recursively taking the longest common
/// block and recursing on both remainders.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Longest common substring via suffix-length DP.
    let mut best_len = 0;
    let mut best_a = 0;
    let mut best_b = 0;
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let run = prev[j] + 1;
                current[j + 1] = run;
                if run > best_len {
                    best_len = run;
                    best_a = i + 1 - run;
                    best_b = j + 1 - run;
                }
            }
        }
        prev = current;
    }

    if best_len == 0 {
        return 0;
    }

    best_len
        + matching_chars(&a[..best_a], &b[..best_b])
        + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

/// Token-overlap similarity over tokenized names.
///
/// Single-token picks get special treatment: a bare surname matching the
/// last token of a full name is strong evidence (0.95), a bare first name
/// only moderate (0.75). For multi-token pairs the base is intersection
/// over the smaller set, blended with a size penalty, plus a surname
/// bonus. The bonus is suppressed when both names carry differing full
/// first tokens — that is what keeps two distinct players sharing a
/// surname out of the auto-accept band.
pub fn token_similarity(tokens1: &[String], tokens2: &[String]) -> f64 {
    if tokens1.is_empty() || tokens2.is_empty() {
        return 0.0;
    }

    // Single name against a full name.
    if tokens1.len() == 1 && tokens2.len() > 1 {
        if tokens1[0] == tokens2[tokens2.len() - 1] {
            return 0.95;
        }
        if tokens1[0] == tokens2[0] {
            return 0.75;
        }
    } else if tokens2.len() == 1 && tokens1.len() > 1 {
        if tokens2[0] == tokens1[tokens1.len() - 1] {
            return 0.95;
        }
        if tokens2[0] == tokens1[0] {
            return 0.75;
        }
    }

    let set1: HashSet<&str> = tokens1.iter().map(String::as_str).collect();
    let set2: HashSet<&str> = tokens2.iter().map(String::as_str).collect();
    let intersection = set1.intersection(&set2).count();
    if intersection == 0 {
        return 0.0;
    }

    let min_tokens = set1.len().min(set2.len());
    let max_tokens = tokens1.len().max(tokens2.len());
    let base = intersection as f64 / min_tokens as f64;
    let size_penalty =
        1.0 - (tokens1.len() as f64 - tokens2.len() as f64).abs() / max_tokens as f64;

    let mut score = base * 0.80 + size_penalty * 0.20;

    let last_name_match = tokens1.last() == tokens2.last();
    if last_name_match && !conflicting_first_tokens(tokens1, tokens2) {
        score = (score * 1.15).min(1.0);
    }

    score
}

/// Both names have multiple tokens and lead with differing full
/// (non-abbreviated) first tokens — e.g. "travis kelce" / "jason kelce".
fn conflicting_first_tokens(tokens1: &[String], tokens2: &[String]) -> bool {
    tokens1.len() > 1
        && tokens2.len() > 1
        && tokens1[0] != tokens2[0]
        && tokens1[0].chars().count() >= 3
        && tokens2[0].chars().count() >= 3
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    // -- Levenshtein --

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein_distance("josh allen", "josh allen"), 0);
        assert!((levenshtein_similarity("josh allen", "josh allen") - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_levenshtein_single_typo() {
        assert_eq!(levenshtein_distance("josh allen", "josh allan"), 1);
        let sim = levenshtein_similarity("josh allen", "josh allan");
        assert!((sim - 0.9).abs() < 1e-10);
    }

    #[test]
    fn test_levenshtein_known_distance() {
        assert_eq!(levenshtein_distance("travis", "jason"), 5);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_similarity("", "abc"), 0.0);
    }

    // -- Sequence ratio --

    #[test]
    fn test_sequence_ratio_identical() {
        assert!((sequence_ratio("josh allen", "josh allen") - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_sequence_ratio_disjoint() {
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_sequence_ratio_partial() {
        // Blocks: " kelce" plus scattered single chars from the first names.
        let ratio = sequence_ratio("travis kelce", "jason kelce");
        assert!(ratio > 0.5 && ratio < 0.85, "got {ratio}");
    }

    #[test]
    fn test_sequence_ratio_empty_pair() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("a", ""), 0.0);
    }

    // -- Token similarity --

    #[test]
    fn test_token_similarity_identical() {
        let sim = token_similarity(&toks("josh allen"), &toks("josh allen"));
        assert!((sim - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_token_similarity_surname_only() {
        assert!((token_similarity(&toks("lamb"), &toks("ceedee lamb")) - 0.95).abs() < 1e-10);
        assert!((token_similarity(&toks("ceedee lamb"), &toks("lamb")) - 0.95).abs() < 1e-10);
    }

    #[test]
    fn test_token_similarity_first_name_only() {
        assert!((token_similarity(&toks("josh"), &toks("josh allen")) - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_token_similarity_no_overlap() {
        assert_eq!(token_similarity(&toks("josh allen"), &toks("patrick mahomes")), 0.0);
    }

    #[test]
    fn test_token_similarity_shared_surname_stays_moderate() {
        // Differing full first names suppress the surname bonus.
        let sim = token_similarity(&toks("travis kelce"), &toks("jason kelce"));
        assert!((sim - 0.6).abs() < 1e-10, "got {sim}");
    }

    #[test]
    fn test_token_similarity_abbreviated_first_keeps_bonus() {
        // "cj" is not a full first token, so the surname bonus applies.
        let sim = token_similarity(&toks("cj mccaffrey"), &toks("christian mccaffrey"));
        assert!((sim - 0.69).abs() < 1e-10, "got {sim}");
    }

    #[test]
    fn test_token_similarity_empty() {
        assert_eq!(token_similarity(&[], &toks("josh allen")), 0.0);
    }
}
