//! Review workflow — admin resolution of uncertain matches.
//!
//! A thin layer over the decision ledger: the pending queue is a query
//! (needs-review, no verdict yet), and approve/reject transition the
//! associated pick with the payout computed at resolution time.
//! Already-decided records reject further mutation, so applying the same
//! verdict twice is a no-op the second time.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::grading::payout::PayoutCalculator;
use crate::store::SettlementStore;
use crate::types::{
    ConfidenceTier, ManualDecision, MatchDecision, Pick, PickResult, PickState, VerdictError,
};

// ---------------------------------------------------------------------------
// Review types
// ---------------------------------------------------------------------------

/// Admin verdict on a pending decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::Approve => write!(f, "approve"),
            ReviewAction::Reject => write!(f, "reject"),
        }
    }
}

/// Result of submitting a review. `applied` is false when the decision
/// had already been ruled on (the no-op case).
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub pick: Pick,
    pub applied: bool,
}

/// Outcome of a bulk review pass.
#[derive(Debug, Clone, Default)]
pub struct BulkReviewReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Ledger-wide review statistics.
#[derive(Debug, Clone)]
pub struct ReviewStats {
    pub total: usize,
    pub pending: usize,
    pub auto_accepted: usize,
    pub approved: usize,
    pub rejected: usize,
    pub exact: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ReviewStats {
    /// Fraction of all decisions resolved without a human.
    pub fn auto_accept_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.auto_accepted as f64 / self.total as f64
        }
    }
}

impl fmt::Display for ReviewStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} decisions: {} pending, {} auto ({:.0}%), {} approved, {} rejected",
            self.total,
            self.pending,
            self.auto_accepted,
            self.auto_accept_rate() * 100.0,
            self.approved,
            self.rejected,
        )
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct ReviewWorkflow {
    store: Arc<SettlementStore>,
}

impl ReviewWorkflow {
    pub fn new(store: Arc<SettlementStore>) -> Self {
        Self { store }
    }

    /// All decisions awaiting an admin verdict, highest confidence and
    /// score first.
    pub fn list_pending(&self) -> Vec<MatchDecision> {
        self.store.pending_reviews()
    }

    /// Approve a proposed match: the pick settles as a win.
    pub fn approve(&self, decision_id: Uuid, reviewer: &str) -> Result<ReviewOutcome, VerdictError> {
        self.submit(decision_id, ReviewAction::Approve, reviewer)
    }

    /// Reject a proposed match: the pick settles as a loss of stake.
    pub fn reject(&self, decision_id: Uuid, reviewer: &str) -> Result<ReviewOutcome, VerdictError> {
        self.submit(decision_id, ReviewAction::Reject, reviewer)
    }

    /// Apply an admin verdict to a pending decision and transition its
    /// pick, atomically.
    pub fn submit(
        &self,
        decision_id: Uuid,
        action: ReviewAction,
        reviewer: &str,
    ) -> Result<ReviewOutcome, VerdictError> {
        let reviewer = reviewer.to_string();
        let outcome = self.store.resolve_review(decision_id, move |decision, pick| {
            if decision.is_decided() {
                return Ok(ReviewOutcome {
                    pick: pick.clone(),
                    applied: false,
                });
            }
            if !decision.needs_review {
                return Err(VerdictError::NotReviewable(decision.id));
            }

            let (result, verdict) = match action {
                ReviewAction::Approve => (PickResult::Win, ManualDecision::Approved),
                ReviewAction::Reject => (PickResult::Loss, ManualDecision::Rejected),
            };

            // Validate the payout before any field is touched so a failure
            // leaves both records unchanged.
            let payout = PayoutCalculator::payout(result, pick.odds, pick.stake)?;

            let now = Utc::now();
            decision.manual_decision = Some(verdict);
            decision.reviewed_by = Some(reviewer);
            decision.reviewed_at = Some(now);
            decision.needs_review = false;

            pick.state = PickState::Graded;
            pick.result = result;
            pick.payout = payout;
            pick.graded_at = Some(now);

            Ok(ReviewOutcome {
                pick: pick.clone(),
                applied: true,
            })
        })?;

        if outcome.applied {
            info!(
                %decision_id,
                %action,
                pick_id = %outcome.pick.id,
                result = %outcome.pick.result,
                payout = %outcome.pick.payout,
                "Review applied"
            );
        } else {
            info!(%decision_id, %action, "Review ignored: decision already ruled on");
        }

        Ok(outcome)
    }

    /// Approve every pending decision.
    pub fn bulk_approve(&self, reviewer: &str) -> Result<BulkReviewReport, VerdictError> {
        self.bulk(ReviewAction::Approve, reviewer)
    }

    /// Reject every pending decision.
    pub fn bulk_reject(&self, reviewer: &str) -> Result<BulkReviewReport, VerdictError> {
        self.bulk(ReviewAction::Reject, reviewer)
    }

    fn bulk(&self, action: ReviewAction, reviewer: &str) -> Result<BulkReviewReport, VerdictError> {
        let mut report = BulkReviewReport::default();
        for decision in self.list_pending() {
            let outcome = self.submit(decision.id, action, reviewer)?;
            if outcome.applied {
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }
        info!(%action, applied = report.applied, skipped = report.skipped, "Bulk review complete");
        Ok(report)
    }

    /// Confidence distribution and resolution counts across the ledger.
    pub fn stats(&self) -> ReviewStats {
        let decisions = self.store.decisions();
        ReviewStats {
            total: decisions.len(),
            pending: decisions.iter().filter(|d| d.is_pending_review()).count(),
            auto_accepted: decisions.iter().filter(|d| d.auto_accepted).count(),
            approved: decisions
                .iter()
                .filter(|d| d.manual_decision == Some(ManualDecision::Approved))
                .count(),
            rejected: decisions
                .iter()
                .filter(|d| d.manual_decision == Some(ManualDecision::Rejected))
                .count(),
            exact: decisions
                .iter()
                .filter(|d| d.confidence == ConfidenceTier::Exact)
                .count(),
            high: decisions
                .iter()
                .filter(|d| d.confidence == ConfidenceTier::High)
                .count(),
            medium: decisions
                .iter()
                .filter(|d| d.confidence == ConfidenceTier::Medium)
                .count(),
            low: decisions
                .iter()
                .filter(|d| d.confidence == ConfidenceTier::Low)
                .count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
