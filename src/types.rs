//! Shared types for the VERDICT settlement engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that matcher, grading, store,
//! and review modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for a game, owned by the external statistics collaborator.
/// Format follows the upstream convention, e.g. `2025_01_DAL_PHI`.
pub type GameId = String;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The kind of wager a pick represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickType {
    /// The named player scores the first touchdown of the game.
    FirstTd,
    /// The named player scores a touchdown at any point in the game.
    AnytimeTd,
}

impl fmt::Display for PickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickType::FirstTd => write!(f, "FTD"),
            PickType::AnytimeTd => write!(f, "ATTS"),
        }
    }
}

impl std::str::FromStr for PickType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FTD" | "FIRST_TD" | "FIRSTTD" => Ok(PickType::FirstTd),
            "ATTS" | "ANYTIME_TD" | "ANYTIMETD" => Ok(PickType::AnytimeTd),
            _ => Err(anyhow::anyhow!("Unknown pick type: {s}")),
        }
    }
}

/// Lifecycle state of a pick. Transitions only move forward:
/// Pending → {Graded, NeedsReview}; NeedsReview → Graded.
/// Graded → Pending happens only through an explicit forced re-grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickState {
    Pending,
    NeedsReview,
    Graded,
}

impl fmt::Display for PickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickState::Pending => write!(f, "Pending"),
            PickState::NeedsReview => write!(f, "NeedsReview"),
            PickState::Graded => write!(f, "Graded"),
        }
    }
}

/// Settled outcome of a pick. `Unset` until graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickResult {
    Unset,
    Win,
    Loss,
    Push,
}

impl fmt::Display for PickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickResult::Unset => write!(f, "Unset"),
            PickResult::Win => write!(f, "W"),
            PickResult::Loss => write!(f, "L"),
            PickResult::Push => write!(f, "Push"),
        }
    }
}

/// Bucketed classification of a match score, governing auto-accept
/// versus human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Exact,
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// All tiers, highest confidence first.
    pub const ALL: &'static [ConfidenceTier] = &[
        ConfidenceTier::Exact,
        ConfidenceTier::High,
        ConfidenceTier::Medium,
        ConfidenceTier::Low,
    ];

    /// Ordering rank for sort keys (higher = more confident).
    pub fn rank(&self) -> u8 {
        match self {
            ConfidenceTier::Exact => 4,
            ConfidenceTier::High => 3,
            ConfidenceTier::Medium => 2,
            ConfidenceTier::Low => 1,
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Exact => write!(f, "exact"),
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

/// An admin's verdict on a decision that could not be auto-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualDecision {
    Approved,
    Rejected,
}

impl fmt::Display for ManualDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualDecision::Approved => write!(f, "approved"),
            ManualDecision::Rejected => write!(f, "rejected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// A bettor's wager against a game, created by the surrounding CRUD layer
/// in `Pending`/`Unset` and settled here.
///
/// `season` and `week` are denormalized from the owning game so the pick
/// store is indexable for batch grading without consulting the external
/// game collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    pub id: Uuid,
    pub game_id: GameId,
    pub season: u16,
    pub week: u8,
    pub pick_type: PickType,
    /// Raw player-name text exactly as submitted.
    pub player_name: String,
    /// American odds: positive = profit per 100 staked, negative = stake
    /// required to profit 100.
    pub odds: i32,
    /// Stake in betting units.
    pub stake: Decimal,
    pub state: PickState,
    pub result: PickResult,
    /// Net effect on the bankroll, currency scale (2 dp).
    pub payout: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let odds_sign = if self.odds > 0 { "+" } else { "" };
        write!(
            f,
            "[{}] {} {}{} x{} — {} ({})",
            self.pick_type,
            self.player_name,
            odds_sign,
            self.odds,
            self.stake,
            self.state,
            self.result,
        )
    }
}

impl Pick {
    /// Build a fresh pick in the initial Pending/Unset state.
    pub fn new(
        game_id: impl Into<GameId>,
        season: u16,
        week: u8,
        pick_type: PickType,
        player_name: impl Into<String>,
        odds: i32,
        stake: Decimal,
    ) -> Self {
        Pick {
            id: Uuid::new_v4(),
            game_id: game_id.into(),
            season,
            week,
            pick_type,
            player_name: player_name.into(),
            odds,
            stake,
            state: PickState::Pending,
            result: PickResult::Unset,
            payout: Decimal::ZERO,
            submitted_at: Utc::now(),
            graded_at: None,
        }
    }

    /// Whether this pick has reached a terminal graded state.
    pub fn is_graded(&self) -> bool {
        self.state == PickState::Graded
    }

    /// Validate stake and odds. Malformed picks reaching this core are
    /// skipped and reported, never silently defaulted.
    pub fn validate(&self) -> Result<(), VerdictError> {
        if self.stake <= Decimal::ZERO {
            return Err(VerdictError::InvalidPick {
                pick_id: self.id,
                reason: format!("stake must be positive, got {}", self.stake),
            });
        }
        if self.odds.abs() < 100 {
            return Err(VerdictError::InvalidPick {
                pick_id: self.id,
                reason: format!("American odds must satisfy |odds| >= 100, got {}", self.odds),
            });
        }
        Ok(())
    }

    /// Helper to build a test pick with sensible defaults.
    #[cfg(test)]
    pub fn sample(pick_type: PickType, player_name: &str, odds: i32) -> Self {
        use rust_decimal_macros::dec;
        Pick::new("2025_01_BUF_NYJ", 2025, 1, pick_type, player_name, odds, dec!(1.00))
    }
}

// ---------------------------------------------------------------------------
// GameFacts
// ---------------------------------------------------------------------------

/// Read-only view of a game as reported by the external statistics
/// collaborator: finality plus the canonical touchdown scorers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFacts {
    pub game_id: GameId,
    pub season: u16,
    pub week: u8,
    pub is_final: bool,
    /// Canonical first-touchdown scorer, absent when the game produced
    /// no offensive touchdown (or is not final yet).
    pub first_td_scorer: Option<String>,
    /// Canonical set of every touchdown scorer in the game.
    pub td_scorers: Vec<String>,
}

impl fmt::Display for GameFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} W{} {} (first TD: {}, scorers: {})",
            self.game_id,
            self.week,
            if self.is_final { "final" } else { "in progress" },
            self.first_td_scorer.as_deref().unwrap_or("-"),
            self.td_scorers.len(),
        )
    }
}

impl GameFacts {
    /// Candidate names for a given pick type. FirstTd grades against the
    /// single canonical scorer; AnytimeTd against every scorer in the game.
    pub fn candidates(&self, pick_type: PickType) -> Vec<&str> {
        match pick_type {
            PickType::FirstTd => self
                .first_td_scorer
                .as_deref()
                .map(|s| vec![s])
                .unwrap_or_default(),
            PickType::AnytimeTd => self.td_scorers.iter().map(String::as_str).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchDecision
// ---------------------------------------------------------------------------

/// One audit record per grading attempt, appended to the decision ledger.
/// Re-grading appends a new row rather than mutating the old one; the
/// "current" decision for a pick is the most recent row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDecision {
    pub id: Uuid,
    pub pick_id: Uuid,
    /// Raw input name from the pick.
    pub pick_name: String,
    /// Matched canonical name, or None when nothing cleared the floor.
    pub matched_name: Option<String>,
    /// Match score in [0, 1].
    pub score: f64,
    pub confidence: ConfidenceTier,
    /// Human-readable explanation of how the score was produced.
    pub reason: String,
    pub auto_accepted: bool,
    pub needs_review: bool,
    pub manual_decision: Option<ManualDecision>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for MatchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' → {} ({:.2}, {}) {}",
            self.pick_name,
            self.matched_name.as_deref().unwrap_or("<no match>"),
            self.score,
            self.confidence,
            if self.auto_accepted {
                "auto-accepted"
            } else if self.needs_review {
                "needs review"
            } else {
                "resolved"
            },
        )
    }
}

impl MatchDecision {
    /// Whether this decision still awaits an admin verdict.
    pub fn is_pending_review(&self) -> bool {
        self.needs_review && self.manual_decision.is_none()
    }

    /// Whether an admin has already ruled on this decision.
    pub fn is_decided(&self) -> bool {
        self.manual_decision.is_some()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for VERDICT.
#[derive(Debug, thiserror::Error)]
pub enum VerdictError {
    /// Canonical scorer data is not available yet (game not final, or the
    /// statistics collaborator failed). Non-fatal; retried next run.
    #[error("Scorer data unavailable for week {week} of {season}: {reason}")]
    DataUnavailable { season: u16, week: u8, reason: String },

    /// Another grading invocation currently owns this week.
    #[error("Grading already in progress for week {week} of {season}")]
    WeekInProgress { season: u16, week: u8 },

    /// Malformed stake or odds reached this core despite upstream validation.
    #[error("Invalid pick {pick_id}: {reason}")]
    InvalidPick { pick_id: Uuid, reason: String },

    /// Malformed payout input outside the context of a specific pick.
    #[error("Invalid payout input: {0}")]
    InvalidInput(String),

    #[error("Pick not found: {0}")]
    PickNotFound(Uuid),

    #[error("Match decision not found: {0}")]
    DecisionNotFound(Uuid),

    /// The decision was auto-resolved and never entered the review queue.
    #[error("Decision {0} is not awaiting review")]
    NotReviewable(Uuid),

    #[error("Source error ({source_name}): {message}")]
    Source { source_name: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
