//! Matching strategies, evaluated in priority order.
//!
//! Each strategy is a small object implementing [`MatchStrategy`]; the
//! matcher walks the ordered collection and the first decisive hit wins
//! for a given canonical candidate. Anything the strategies cannot decide
//! falls through to the hybrid scorer in `matcher::mod`.

use crate::matcher::normalize::NameForm;
use crate::types::ConfidenceTier;

/// A decisive result from a single strategy.
#[derive(Debug, Clone)]
pub struct StrategyHit {
    pub score: f64,
    pub tier: ConfidenceTier,
    pub reason: String,
}

/// Common capability of all matching strategies: attempt a match between
/// a raw pick name and one canonical scorer name.
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn attempt(&self, pick: &NameForm, canonical: &NameForm) -> Option<StrategyHit>;
}

/// The strategies in priority order. Hybrid scoring is not a
/// strategy; it is the fallback combinator owned by the matcher.
pub fn default_strategies() -> Vec<Box<dyn MatchStrategy>> {
    vec![
        Box::new(ExactEquality),
        Box::new(NormalizedEquality),
        Box::new(NicknameExpansion),
        Box::new(TokenOrderSwap),
        Box::new(InitialExpansion),
    ]
}

// ---------------------------------------------------------------------------
// Exact equality
// ---------------------------------------------------------------------------

/// Byte-for-byte equality of the raw strings.
pub struct ExactEquality;

impl MatchStrategy for ExactEquality {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn attempt(&self, pick: &NameForm, canonical: &NameForm) -> Option<StrategyHit> {
        if pick.raw == canonical.raw {
            Some(StrategyHit {
                score: 1.0,
                tier: ConfidenceTier::Exact,
                reason: "Exact match".to_string(),
            })
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized equality
// ---------------------------------------------------------------------------

/// Case-, whitespace-, and punctuation-insensitive equality.
pub struct NormalizedEquality;

impl MatchStrategy for NormalizedEquality {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn attempt(&self, pick: &NameForm, canonical: &NameForm) -> Option<StrategyHit> {
        if !pick.normalized.is_empty() && pick.normalized == canonical.normalized {
            Some(StrategyHit {
                score: 0.95,
                tier: ConfidenceTier::High,
                reason: "Case-insensitive exact match".to_string(),
            })
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Nickname expansion
// ---------------------------------------------------------------------------

/// Table-driven nickname/alias equality: any expanded variation of one
/// side equal to a variation of the other, or an expanded single token
/// landing on the other name's first or last token.
pub struct NicknameExpansion;

impl MatchStrategy for NicknameExpansion {
    fn name(&self) -> &'static str {
        "nickname"
    }

    fn attempt(&self, pick: &NameForm, canonical: &NameForm) -> Option<StrategyHit> {
        for (pi, pv) in pick.variations.iter().enumerate() {
            for (ci, cv) in canonical.variations.iter().enumerate() {
                // variations[0] is the unexpanded base form on both sides;
                // that pair belongs to the normalized/hybrid paths.
                if pi == 0 && ci == 0 {
                    continue;
                }
                if pv == cv {
                    return Some(StrategyHit {
                        score: 0.90,
                        tier: ConfidenceTier::High,
                        reason: format!(
                            "Nickname match: '{}' → '{}'",
                            pick.raw, canonical.raw
                        ),
                    });
                }
                if single_token_hits(pv, cv) || single_token_hits(cv, pv) {
                    return Some(StrategyHit {
                        score: 0.90,
                        tier: ConfidenceTier::High,
                        reason: format!(
                            "Nickname expansion match: '{}' → '{}'",
                            pick.raw, canonical.raw
                        ),
                    });
                }
            }
        }
        None
    }
}

/// A single-token variation equal to the first or last token of a
/// multi-token variation.
fn single_token_hits(single: &str, full: &str) -> bool {
    if single.contains(' ') || single.is_empty() {
        return false;
    }
    let mut tokens = full.split_whitespace();
    let first = match tokens.next() {
        Some(t) => t,
        None => return false,
    };
    let last = tokens.last();
    match last {
        // `full` has at least two tokens.
        Some(last) => single == first || single == last,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Token order swap
// ---------------------------------------------------------------------------

/// "Last, First" submitted against a canonical "First Last" (commas are
/// already stripped by normalization, so this is a pure order check).
pub struct TokenOrderSwap;

impl MatchStrategy for TokenOrderSwap {
    fn name(&self) -> &'static str {
        "token-swap"
    }

    fn attempt(&self, pick: &NameForm, canonical: &NameForm) -> Option<StrategyHit> {
        if pick.tokens.len() == 2 && canonical.tokens.len() == 2 {
            let reversed = [pick.tokens[1].as_str(), pick.tokens[0].as_str()];
            if reversed[0] == canonical.tokens[0] && reversed[1] == canonical.tokens[1] {
                return Some(StrategyHit {
                    score: 0.92,
                    tier: ConfidenceTier::High,
                    reason: "Name order variation (Last, First)".to_string(),
                });
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Initial expansion
// ---------------------------------------------------------------------------

/// An abbreviated first name plus matching surname: "J. Allen" against
/// "Josh Allen". Only single-letter tokens expand; a multi-letter short
/// token ("cj") must match verbatim, so "CJ McCaffrey" never expands
/// into "Christian McCaffrey".
pub struct InitialExpansion;

impl MatchStrategy for InitialExpansion {
    fn name(&self) -> &'static str {
        "initials"
    }

    fn attempt(&self, pick: &NameForm, canonical: &NameForm) -> Option<StrategyHit> {
        if pick.tokens.len() != canonical.tokens.len() || pick.tokens.len() < 2 {
            return None;
        }
        if !pick.has_initial() && !canonical.has_initial() {
            return None;
        }

        let all_match = pick
            .tokens
            .iter()
            .zip(canonical.tokens.iter())
            .all(|(p, c)| initial_compatible(p, c));

        if all_match {
            Some(StrategyHit {
                score: 0.88,
                tier: ConfidenceTier::High,
                reason: format!("Initial expansion: '{}' → '{}'", pick.raw, canonical.raw),
            })
        } else {
            None
        }
    }
}

/// Pairwise token rule: a single-letter token matches a full token
/// starting with that letter; everything else must be equal.
fn initial_compatible(p: &str, c: &str) -> bool {
    let p_len = p.chars().count();
    let c_len = c.chars().count();
    if p_len == 1 {
        c.starts_with(p)
    } else if c_len == 1 {
        p.starts_with(c)
    } else {
        p == c
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
