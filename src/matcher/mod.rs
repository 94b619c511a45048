//! Fuzzy player-name matching with confidence scoring.
//!
//! Stateless and pure: given a raw candidate name and a set of canonical
//! scorer names, produce the best (score, name, tier, reason) or an
//! explicit no-match when nothing clears the floor. The grading
//! orchestrator owns everything else (state, ledger, payouts).

pub mod normalize;
pub mod similarity;
pub mod strategies;

use tracing::debug;

use crate::types::ConfidenceTier;
use self::normalize::NameForm;
use self::similarity::{levenshtein_similarity, sequence_ratio, token_similarity};
use self::strategies::{default_strategies, MatchStrategy};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Minimum score for auto-accept (and the High tier).
pub const AUTO_ACCEPT_THRESHOLD: f64 = 0.85;
/// Minimum score for the Medium tier; Medium and Low are always routed
/// to human review.
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.70;
/// Absolute floor: below this no match is returned at all, and a final
/// game grades straight to Loss.
pub const MATCH_FLOOR: f64 = 0.50;

/// Hybrid combination weights: token overlap / edit distance / sequence.
const TOKEN_WEIGHT: f64 = 0.55;
const LEVENSHTEIN_WEIGHT: f64 = 0.25;
const SEQUENCE_WEIGHT: f64 = 0.20;

/// Matcher thresholds (defaults above — overridden by config.toml at
/// runtime).
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub auto_accept_threshold: f64,
    pub medium_threshold: f64,
    pub match_floor: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            auto_accept_threshold: AUTO_ACCEPT_THRESHOLD,
            medium_threshold: MEDIUM_CONFIDENCE_THRESHOLD,
            match_floor: MATCH_FLOOR,
        }
    }
}

// ---------------------------------------------------------------------------
// Match outcome
// ---------------------------------------------------------------------------

/// Best match for a raw name against a canonical set.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matched_name: String,
    /// Score in [0, 1].
    pub score: f64,
    pub confidence: ConfidenceTier,
    pub reason: String,
    pub auto_accept: bool,
    /// Which strategy resolved it ("hybrid" for the fallback combinator).
    pub strategy: &'static str,
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// Multi-strategy fuzzy name matcher.
pub struct NameMatcher {
    config: MatcherConfig,
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

impl NameMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            strategies: default_strategies(),
        }
    }

    /// Access the matcher configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Confidence tier for a score under this matcher's thresholds.
    pub fn tier_for(&self, score: f64) -> ConfidenceTier {
        if score >= 1.0 {
            ConfidenceTier::Exact
        } else if score >= self.config.auto_accept_threshold {
            ConfidenceTier::High
        } else if score >= self.config.medium_threshold {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// Find the best canonical match for a raw pick name.
    ///
    /// Returns None for empty inputs or when the best score is below
    /// the floor — the explicit no-match case.
    pub fn find_best(&self, pick_name: &str, candidates: &[&str]) -> Option<MatchOutcome> {
        self.best_candidate(pick_name, candidates)
            .filter(|outcome| outcome.score >= self.config.match_floor)
    }

    /// Score every candidate and keep the maximum, floor not applied —
    /// the grading layer uses this to record the best rejected candidate
    /// in its audit trail. Exact score ties prefer the candidate resolved
    /// by a higher-priority strategy.
    pub fn best_candidate(&self, pick_name: &str, candidates: &[&str]) -> Option<MatchOutcome> {
        if pick_name.trim().is_empty() || candidates.is_empty() {
            return None;
        }

        let pick = NameForm::new(pick_name);
        let mut best: Option<(f64, usize, String, String, &'static str)> = None;

        for candidate in candidates {
            let canonical = NameForm::new(candidate);
            let (score, reason, priority, strategy) = self.score_pair(&pick, &canonical);

            debug!(
                pick = %pick.normalized,
                candidate = %canonical.normalized,
                score = format!("{score:.3}"),
                strategy,
                "Candidate scored"
            );

            let better = match &best {
                None => true,
                Some((best_score, best_priority, ..)) => {
                    score > *best_score
                        || ((score - best_score).abs() < f64::EPSILON
                            && priority < *best_priority)
                }
            };
            if better {
                best = Some((score, priority, candidate.to_string(), reason, strategy));
            }
        }

        let (score, _, matched_name, reason, strategy) = best?;

        Some(MatchOutcome {
            matched_name,
            score,
            confidence: self.tier_for(score),
            reason,
            auto_accept: score >= self.config.auto_accept_threshold,
            strategy,
        })
    }

    /// Score one raw/canonical pair: first decisive strategy wins, hybrid
    /// similarity otherwise. Returns (score, reason, priority, strategy).
    fn score_pair(
        &self,
        pick: &NameForm,
        canonical: &NameForm,
    ) -> (f64, String, usize, &'static str) {
        for (priority, strategy) in self.strategies.iter().enumerate() {
            if let Some(hit) = strategy.attempt(pick, canonical) {
                return (hit.score, hit.reason, priority, strategy.name());
            }
        }

        let (score, reason) = self.hybrid_score(pick, canonical);
        (score, reason, self.strategies.len(), "hybrid")
    }

    /// Weighted blend of token overlap, Levenshtein similarity, and
    /// sequence similarity, with a bonus when the edit distance points
    /// at a one/two-character typo that token matching alone would miss.
    fn hybrid_score(&self, pick: &NameForm, canonical: &NameForm) -> (f64, String) {
        let token_sim = token_similarity(&pick.tokens, &canonical.tokens);
        let lev_sim = levenshtein_similarity(&pick.normalized, &canonical.normalized);
        let seq_sim = sequence_ratio(&pick.normalized, &canonical.normalized);

        let mut score =
            token_sim * TOKEN_WEIGHT + lev_sim * LEVENSHTEIN_WEIGHT + seq_sim * SEQUENCE_WEIGHT;

        // Very high edit similarity is a likely typo.
        if lev_sim >= 0.90 {
            score = score.max(lev_sim * 0.85);
        }

        let band = match self.tier_for(score) {
            ConfidenceTier::Exact | ConfidenceTier::High => "High",
            ConfidenceTier::Medium => "Medium",
            ConfidenceTier::Low => "Low",
        };
        let reason = format!(
            "{band} similarity (token {token_sim:.2}, edit {lev_sim:.2}, seq {seq_sim:.2})"
        );

        (score, reason)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> NameMatcher {
        NameMatcher::default()
    }

    // -- strategy resolution --

    #[test]
    fn test_exact_match_scores_one() {
        let outcome = matcher().find_best("Josh Allen", &["Josh Allen"]).unwrap();
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.confidence, ConfidenceTier::Exact);
        assert!(outcome.auto_accept);
        assert_eq!(outcome.strategy, "exact");
    }

    #[test]
    fn test_exact_match_any_case_scores_one() {
        // Byte-equal strings score 1.0 regardless of the case they are in.
        let outcome = matcher().find_best("JOSH ALLEN", &["JOSH ALLEN"]).unwrap();
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn test_case_difference_scores_high() {
        let outcome = matcher()
            .find_best("Christian Mccaffrey", &["Christian McCaffrey"])
            .unwrap();
        assert_eq!(outcome.score, 0.95);
        assert_eq!(outcome.confidence, ConfidenceTier::High);
        assert!(outcome.auto_accept);
        assert_eq!(outcome.strategy, "normalized");
    }

    #[test]
    fn test_last_first_order() {
        let outcome = matcher()
            .find_best("Allen, Josh", &["Josh Allen"])
            .unwrap();
        assert_eq!(outcome.score, 0.92);
        assert!(outcome.auto_accept);
        assert_eq!(outcome.strategy, "token-swap");
    }

    #[test]
    fn test_nickname_match() {
        let outcome = matcher()
            .find_best("Mike Evans", &["Michael Evans"])
            .unwrap();
        assert_eq!(outcome.score, 0.90);
        assert_eq!(outcome.strategy, "nickname");
    }

    #[test]
    fn test_initial_expansion_auto_accepts() {
        let outcome = matcher().find_best("J. Allen", &["Josh Allen"]).unwrap();
        assert!(outcome.score >= 0.85);
        assert!(outcome.auto_accept);
        assert_eq!(outcome.strategy, "initials");
    }

    // -- hybrid fallback --

    #[test]
    fn test_typo_lands_in_review_band() {
        let outcome = matcher().find_best("Josh Allan", &["Josh Allen"]).unwrap();
        assert!(outcome.score < AUTO_ACCEPT_THRESHOLD, "got {}", outcome.score);
        assert!(outcome.score >= MEDIUM_CONFIDENCE_THRESHOLD, "got {}", outcome.score);
        assert_eq!(outcome.confidence, ConfidenceTier::Medium);
        assert!(!outcome.auto_accept);
        assert_eq!(outcome.strategy, "hybrid");
    }

    #[test]
    fn test_surname_only_requires_review() {
        let outcome = matcher()
            .find_best("Lamb", &["CeeDee Lamb"])
            .unwrap();
        assert!(outcome.score < AUTO_ACCEPT_THRESHOLD);
        assert!(outcome.score >= MATCH_FLOOR);
        assert!(!outcome.auto_accept);
    }

    #[test]
    fn test_unrelated_name_below_floor() {
        assert!(matcher()
            .find_best("Patrick Mahomes", &["Saquon Barkley"])
            .is_none());
    }

    #[test]
    fn test_best_candidate_still_reports_below_floor() {
        let outcome = matcher()
            .best_candidate("Patrick Mahomes", &["Saquon Barkley"])
            .unwrap();
        assert!(outcome.score < MATCH_FLOOR);
        assert_eq!(outcome.confidence, ConfidenceTier::Low);
    }

    // -- adversarial same-surname pairs --

    #[test]
    fn test_shared_surname_never_auto_accepts() {
        let pairs = [
            ("Travis Kelce", "Jason Kelce"),
            ("Josh Allen", "Keenan Allen"),
            ("Marquise Brown", "A.J. Brown"),
            ("Justin Jefferson", "Van Jefferson"),
        ];
        for (a, b) in pairs {
            if let Some(outcome) = matcher().find_best(a, &[b]) {
                assert!(
                    outcome.score < AUTO_ACCEPT_THRESHOLD,
                    "'{a}' vs '{b}' scored {} — would auto-accept",
                    outcome.score
                );
            }
        }
    }

    #[test]
    fn test_kelce_pair_stays_below_medium() {
        let outcome = matcher()
            .find_best("Travis Kelce", &["Jason Kelce"])
            .unwrap();
        assert!(outcome.score < MEDIUM_CONFIDENCE_THRESHOLD, "got {}", outcome.score);
        assert_eq!(outcome.confidence, ConfidenceTier::Low);
        assert!(!outcome.auto_accept);
    }

    #[test]
    fn test_cj_mccaffrey_never_auto_accepts() {
        let outcome = matcher()
            .find_best("CJ McCaffrey", &["Christian McCaffrey"])
            .unwrap();
        assert!(outcome.score < AUTO_ACCEPT_THRESHOLD, "got {}", outcome.score);
        assert!(!outcome.auto_accept);
    }

    // -- multi-candidate resolution --

    #[test]
    fn test_best_candidate_wins() {
        let candidates = ["Jason Kelce", "Travis Kelce", "Patrick Mahomes"];
        let outcome = matcher().find_best("Travis Kelce", &candidates).unwrap();
        assert_eq!(outcome.matched_name, "Travis Kelce");
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn test_ambiguous_roster_prefers_real_player() {
        // Both Allens in the game; the raw text names one of them exactly.
        let candidates = ["Keenan Allen", "Josh Allen"];
        let outcome = matcher().find_best("josh allen", &candidates).unwrap();
        assert_eq!(outcome.matched_name, "Josh Allen");
        assert!(outcome.auto_accept);
    }

    #[test]
    fn test_tie_prefers_higher_priority_strategy() {
        // Identical scores can only tie through the same strategy on
        // different candidates; the first-seen candidate is kept.
        let candidates = ["Josh Allen", "Josh Allen"];
        let outcome = matcher().find_best("Josh Allen", &candidates).unwrap();
        assert_eq!(outcome.matched_name, "Josh Allen");
    }

    // -- degenerate inputs --

    #[test]
    fn test_empty_pick_name() {
        assert!(matcher().find_best("", &["Josh Allen"]).is_none());
        assert!(matcher().find_best("   ", &["Josh Allen"]).is_none());
    }

    #[test]
    fn test_empty_candidate_set() {
        assert!(matcher().find_best("Josh Allen", &[]).is_none());
    }

    // -- tiers --

    #[test]
    fn test_tier_boundaries() {
        let m = matcher();
        assert_eq!(m.tier_for(1.0), ConfidenceTier::Exact);
        assert_eq!(m.tier_for(0.95), ConfidenceTier::High);
        assert_eq!(m.tier_for(0.85), ConfidenceTier::High);
        assert_eq!(m.tier_for(0.84), ConfidenceTier::Medium);
        assert_eq!(m.tier_for(0.70), ConfidenceTier::Medium);
        assert_eq!(m.tier_for(0.69), ConfidenceTier::Low);
    }

    #[test]
    fn test_default_thresholds() {
        let config = MatcherConfig::default();
        assert_eq!(config.auto_accept_threshold, 0.85);
        assert_eq!(config.medium_threshold, 0.70);
        assert_eq!(config.match_floor, 0.50);
    }
}
