//! Grading orchestrator — drives the pick state machine.
//!
//! Pulls canonical scorer facts from the statistics collaborator, runs
//! the name matcher, applies the auto-accept policy, writes the decision
//! ledger, transitions picks, and computes payouts. Each week is the
//! atomic unit of work: its pick updates and ledger appends land in one
//! store commit or not at all.

pub mod payout;

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::matcher::NameMatcher;
use crate::stats::ScorerSource;
use crate::store::{PickUpdate, SettlementStore, WeekCommit};
use crate::types::{
    GameFacts, MatchDecision, Pick, PickResult, PickState, PickType, VerdictError,
};
use self::payout::PayoutCalculator;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Why a pick could not be settled this run. Distinct from a confirmed
/// no-match Loss: these picks stay Pending and are retried next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The game is not final yet.
    GameNotFinal,
    /// The collaborator reported nothing for this game.
    NoScorerData,
    /// Malformed stake or odds reached this core.
    InvalidInput,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::GameNotFinal => write!(f, "game not final"),
            SkipReason::NoScorerData => write!(f, "no scorer data"),
            SkipReason::InvalidInput => write!(f, "invalid input"),
        }
    }
}

/// One pick this run could not settle.
#[derive(Debug, Clone)]
pub struct SkippedPick {
    pub pick_id: Uuid,
    pub player_name: String,
    pub reason: SkipReason,
    pub detail: String,
}

/// Aggregate outcome of grading one week. Counts reflect the settled
/// state of the week's picks after the run, so repeating a run without
/// force yields identical numbers.
#[derive(Debug, Clone)]
pub struct WeekReport {
    pub season: u16,
    pub week: u8,
    /// Final games with scorer facts available this run.
    pub games_final: usize,
    pub total_graded: usize,
    pub won: usize,
    pub lost: usize,
    pub needs_review: usize,
    /// Picks settled by this run (as opposed to previously).
    pub newly_graded: usize,
    pub skipped: Vec<SkippedPick>,
}

impl fmt::Display for WeekReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Week {} of {}: graded={} (W{}/L{}) review={} new={} skipped={}",
            self.week,
            self.season,
            self.total_graded,
            self.won,
            self.lost,
            self.needs_review,
            self.newly_graded,
            self.skipped.len(),
        )
    }
}

/// Aggregate outcome of a multi-week grading run.
#[derive(Debug, Clone)]
pub struct SeasonReport {
    pub season: u16,
    pub weeks: Vec<WeekReport>,
    /// True when the run stopped early on the cancellation flag. Every
    /// completed week is still fully applied.
    pub cancelled: bool,
}

impl SeasonReport {
    pub fn total_graded(&self) -> usize {
        self.weeks.iter().map(|w| w.total_graded).sum()
    }

    pub fn won(&self) -> usize {
        self.weeks.iter().map(|w| w.won).sum()
    }

    pub fn lost(&self) -> usize {
        self.weeks.iter().map(|w| w.lost).sum()
    }

    pub fn needs_review(&self) -> usize {
        self.weeks.iter().map(|w| w.needs_review).sum()
    }
}

impl fmt::Display for SeasonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Season {}: {} weeks, graded={} (W{}/L{}) review={}{}",
            self.season,
            self.weeks.len(),
            self.total_graded(),
            self.won(),
            self.lost(),
            self.needs_review(),
            if self.cancelled { " [cancelled]" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Pick evaluation
// ---------------------------------------------------------------------------

/// Outcome of evaluating a single pick against game facts.
enum Evaluation {
    /// Not settleable this run; retried next time.
    Skip(SkippedPick),
    /// Settled (or routed to review): one pick update plus exactly one
    /// ledger row.
    Settle {
        update: PickUpdate,
        decision: MatchDecision,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives grading runs for weeks and seasons.
///
/// Instantiate once per process; operations are triggered by discrete
/// operator actions, not a background loop.
pub struct GradingOrchestrator {
    source: Arc<dyn ScorerSource>,
    store: Arc<SettlementStore>,
    matcher: NameMatcher,
    cancel: Arc<AtomicBool>,
}

impl GradingOrchestrator {
    pub fn new(
        source: Arc<dyn ScorerSource>,
        store: Arc<SettlementStore>,
        matcher: NameMatcher,
    ) -> Self {
        Self {
            source,
            store,
            matcher,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for cancelling a season-wide run between weeks.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Grade all picks for one week. `force` re-grades already settled
    /// picks (appending fresh ledger rows); without it the run is
    /// idempotent.
    pub async fn grade_week(
        &self,
        season: u16,
        week: u8,
        force: bool,
    ) -> Result<WeekReport, VerdictError> {
        let guard = self.store.begin_week(season, week)?;

        let games = self
            .source
            .week_games(season, week)
            .await
            .map_err(|e| VerdictError::DataUnavailable {
                season,
                week,
                reason: e.to_string(),
            })?;

        let report = self.grade_with_facts(season, week, &games, None, force)?;
        drop(guard);
        Ok(report)
    }

    /// Grade every week of a season that has picks of the given type.
    pub async fn grade_by_pick_type(
        &self,
        pick_type: PickType,
        season: u16,
        force: bool,
    ) -> Result<SeasonReport, VerdictError> {
        self.season_run(season, Some(pick_type), force).await
    }

    /// Grade (or re-grade, with force) every week of a season.
    pub async fn grade_season(
        &self,
        season: u16,
        force: bool,
    ) -> Result<SeasonReport, VerdictError> {
        self.season_run(season, None, force).await
    }

    async fn season_run(
        &self,
        season: u16,
        filter: Option<PickType>,
        force: bool,
    ) -> Result<SeasonReport, VerdictError> {
        let games = self
            .source
            .season_games(season)
            .await
            .map_err(|e| VerdictError::Source {
                source_name: self.source.name().to_string(),
                message: e.to_string(),
            })?;

        let mut by_week: HashMap<u8, Vec<GameFacts>> = HashMap::new();
        for game in games {
            by_week.entry(game.week).or_default().push(game);
        }

        let weeks = match filter {
            Some(pick_type) => {
                let mut weeks: Vec<u8> = self
                    .store
                    .picks_by_type(season, pick_type)
                    .iter()
                    .map(|p| p.week)
                    .collect();
                weeks.sort_unstable();
                weeks.dedup();
                weeks
            }
            None => self.store.weeks_with_picks(season),
        };

        info!(season, weeks = weeks.len(), ?filter, force, "Season grading run starting");

        let mut report = SeasonReport {
            season,
            weeks: Vec::new(),
            cancelled: false,
        };

        for week in weeks {
            // Cancellation is honored only between weeks, so no week is
            // ever left half-graded.
            if self.cancel.load(Ordering::SeqCst) {
                warn!(season, week, "Season run cancelled before week");
                report.cancelled = true;
                break;
            }

            let guard = self.store.begin_week(season, week)?;
            let facts = by_week.get(&week).map(Vec::as_slice).unwrap_or(&[]);
            let week_report = self.grade_with_facts(season, week, facts, filter, force)?;
            drop(guard);
            report.weeks.push(week_report);
        }

        info!(season, "{report}");
        Ok(report)
    }

    /// Grade one week against pre-fetched game facts and commit the
    /// result atomically. Caller holds the week guard.
    fn grade_with_facts(
        &self,
        season: u16,
        week: u8,
        games: &[GameFacts],
        filter: Option<PickType>,
        force: bool,
    ) -> Result<WeekReport, VerdictError> {
        let facts_by_game: HashMap<&str, &GameFacts> = games
            .iter()
            .filter(|g| g.season == season && g.week == week)
            .map(|g| (g.game_id.as_str(), g))
            .collect();
        let games_final = facts_by_game.values().filter(|g| g.is_final).count();

        let picks: Vec<Pick> = self
            .store
            .picks_for_week(season, week)
            .into_iter()
            .filter(|p| filter.map_or(true, |t| p.pick_type == t))
            .collect();

        let mut commit = WeekCommit::default();
        let mut skipped = Vec::new();
        let mut newly_graded = 0usize;

        for pick in &picks {
            if pick.state != PickState::Pending && !force {
                debug!(pick_id = %pick.id, state = %pick.state, "Pick already settled, skipping");
                continue;
            }

            match self.evaluate_pick(pick, facts_by_game.get(pick.game_id.as_str()).copied()) {
                Evaluation::Skip(skip) => {
                    debug!(
                        pick_id = %skip.pick_id,
                        reason = %skip.reason,
                        detail = %skip.detail,
                        "Pick not gradable this run"
                    );
                    skipped.push(skip);
                }
                Evaluation::Settle { update, decision } => {
                    if update.state == PickState::Graded {
                        newly_graded += 1;
                    }
                    commit.pick_updates.push(update);
                    commit.decisions.push(decision);
                }
            }
        }

        // All-or-nothing: every transition and ledger row for the week
        // in one commit.
        if !commit.is_empty() {
            self.store.commit_week(commit)?;
        }

        let report = self.week_totals(season, week, filter, games_final, newly_graded, skipped);
        info!(season, week, "{report}");
        Ok(report)
    }

    /// Evaluate a single pick against its game's facts. Pure except for
    /// matcher logging; all store writes happen in the caller's commit.
    fn evaluate_pick(&self, pick: &Pick, facts: Option<&GameFacts>) -> Evaluation {
        let facts = match facts {
            Some(f) => f,
            None => {
                return Evaluation::Skip(SkippedPick {
                    pick_id: pick.id,
                    player_name: pick.player_name.clone(),
                    reason: SkipReason::NoScorerData,
                    detail: format!("no facts reported for game {}", pick.game_id),
                })
            }
        };

        if !facts.is_final {
            return Evaluation::Skip(SkippedPick {
                pick_id: pick.id,
                player_name: pick.player_name.clone(),
                reason: SkipReason::GameNotFinal,
                detail: format!("game {} not final", pick.game_id),
            });
        }

        if let Err(e) = pick.validate() {
            return Evaluation::Skip(SkippedPick {
                pick_id: pick.id,
                player_name: pick.player_name.clone(),
                reason: SkipReason::InvalidInput,
                detail: e.to_string(),
            });
        }

        let candidates = facts.candidates(pick.pick_type);

        // Final game with genuinely nothing to match against (e.g. the
        // only score was defensive): deterministic loss, not a review item.
        if candidates.is_empty() {
            let reason = format!("No touchdown scorer recorded for game {}", facts.game_id);
            return self.settle_loss(pick, None, 0.0, reason);
        }

        match self.matcher.best_candidate(&pick.player_name, &candidates) {
            Some(outcome) if outcome.auto_accept => self.settle_win(pick, outcome),
            Some(outcome) if outcome.score >= self.matcher.config().match_floor => {
                // Review band: plausible but uncertain, never silently
                // resolved in either direction.
                self.route_to_review(pick, outcome)
            }
            Some(outcome) => {
                let reason = format!(
                    "Best candidate '{}' scored {:.2}, below match floor",
                    outcome.matched_name, outcome.score,
                );
                self.settle_loss(pick, None, outcome.score, reason)
            }
            None => {
                let reason = "No candidate produced a usable score".to_string();
                self.settle_loss(pick, None, 0.0, reason)
            }
        }
    }

    fn settle_win(&self, pick: &Pick, outcome: crate::matcher::MatchOutcome) -> Evaluation {
        let payout = match PayoutCalculator::payout(PickResult::Win, pick.odds, pick.stake) {
            Ok(p) => p,
            Err(e) => {
                // validate() passed, so this cannot happen; treat it as
                // an input problem rather than guessing a payout.
                return Evaluation::Skip(SkippedPick {
                    pick_id: pick.id,
                    player_name: pick.player_name.clone(),
                    reason: SkipReason::InvalidInput,
                    detail: e.to_string(),
                });
            }
        };

        info!(
            pick_id = %pick.id,
            player = %pick.player_name,
            matched = %outcome.matched_name,
            score = format!("{:.2}", outcome.score),
            payout = %payout,
            "Pick auto-graded as win"
        );

        Evaluation::Settle {
            update: PickUpdate {
                pick_id: pick.id,
                state: PickState::Graded,
                result: PickResult::Win,
                payout,
                graded_at: Some(Utc::now()),
            },
            decision: self.decision_row(
                pick,
                Some(outcome.matched_name),
                outcome.score,
                outcome.reason,
                true,
                false,
            ),
        }
    }

    fn settle_loss(
        &self,
        pick: &Pick,
        matched_name: Option<String>,
        score: f64,
        reason: String,
    ) -> Evaluation {
        let payout = match PayoutCalculator::payout(PickResult::Loss, pick.odds, pick.stake) {
            Ok(p) => p,
            Err(e) => {
                return Evaluation::Skip(SkippedPick {
                    pick_id: pick.id,
                    player_name: pick.player_name.clone(),
                    reason: SkipReason::InvalidInput,
                    detail: e.to_string(),
                });
            }
        };

        Evaluation::Settle {
            update: PickUpdate {
                pick_id: pick.id,
                state: PickState::Graded,
                result: PickResult::Loss,
                payout,
                graded_at: Some(Utc::now()),
            },
            decision: self.decision_row(pick, matched_name, score, reason, false, false),
        }
    }

    fn route_to_review(&self, pick: &Pick, outcome: crate::matcher::MatchOutcome) -> Evaluation {
        info!(
            pick_id = %pick.id,
            player = %pick.player_name,
            candidate = %outcome.matched_name,
            score = format!("{:.2}", outcome.score),
            "Pick routed to review"
        );

        Evaluation::Settle {
            update: PickUpdate {
                pick_id: pick.id,
                state: PickState::NeedsReview,
                result: PickResult::Unset,
                payout: Decimal::ZERO,
                graded_at: None,
            },
            decision: self.decision_row(
                pick,
                Some(outcome.matched_name),
                outcome.score,
                outcome.reason,
                false,
                true,
            ),
        }
    }

    fn decision_row(
        &self,
        pick: &Pick,
        matched_name: Option<String>,
        score: f64,
        reason: String,
        auto_accepted: bool,
        needs_review: bool,
    ) -> MatchDecision {
        MatchDecision {
            id: Uuid::new_v4(),
            pick_id: pick.id,
            pick_name: pick.player_name.clone(),
            matched_name,
            score,
            confidence: self.matcher.tier_for(score),
            reason,
            auto_accepted,
            needs_review,
            manual_decision: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Settled-state totals for the week after a run.
    fn week_totals(
        &self,
        season: u16,
        week: u8,
        filter: Option<PickType>,
        games_final: usize,
        newly_graded: usize,
        skipped: Vec<SkippedPick>,
    ) -> WeekReport {
        let picks: Vec<Pick> = self
            .store
            .picks_for_week(season, week)
            .into_iter()
            .filter(|p| filter.map_or(true, |t| p.pick_type == t))
            .collect();

        let won = picks.iter().filter(|p| p.result == PickResult::Win).count();
        let lost = picks.iter().filter(|p| p.result == PickResult::Loss).count();
        let needs_review = picks
            .iter()
            .filter(|p| p.state == PickState::NeedsReview)
            .count();
        let total_graded = picks.iter().filter(|p| p.is_graded()).count();

        WeekReport {
            season,
            week,
            games_final,
            total_graded,
            won,
            lost,
            needs_review,
            newly_graded,
            skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MockScorerSource;
    use rust_decimal_macros::dec;

    fn make_facts(game_id: &str, week: u8, first: Option<&str>, all: &[&str]) -> GameFacts {
        GameFacts {
            game_id: game_id.to_string(),
            season: 2025,
            week,
            is_final: true,
            first_td_scorer: first.map(String::from),
            td_scorers: all.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn make_pick(game_id: &str, week: u8, pick_type: PickType, name: &str, odds: i32) -> Pick {
        Pick::new(game_id, 2025, week, pick_type, name, odds, dec!(1.00))
    }

    fn orchestrator_with(
        games: Vec<GameFacts>,
        store: Arc<SettlementStore>,
    ) -> GradingOrchestrator {
        let mut source = MockScorerSource::new();
        let week_games = games.clone();
        source
            .expect_week_games()
            .returning(move |_, week| {
                Ok(week_games.iter().filter(|g| g.week == week).cloned().collect())
            });
        source
            .expect_season_games()
            .returning(move |_| Ok(games.clone()));
        source.expect_name().return_const("mock".to_string());

        GradingOrchestrator::new(Arc::new(source), store, NameMatcher::default())
    }

    #[tokio::test]
    async fn test_exact_first_td_pick_wins() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.won, 1);
        assert_eq!(report.total_graded, 1);
        assert_eq!(report.newly_graded, 1);

        let graded = store.pick(pick_id).unwrap();
        assert_eq!(graded.result, PickResult::Win);
        assert_eq!(graded.payout, dec!(5.00));
        assert!(graded.graded_at.is_some());

        let decision = store.current_decision(pick_id).unwrap();
        assert!(decision.auto_accepted);
        assert_eq!(decision.score, 1.0);
    }

    #[tokio::test]
    async fn test_anytime_pick_matches_any_scorer() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::AnytimeTd, "George Kittle", -110);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts(
                "g1",
                1,
                Some("Christian McCaffrey"),
                &["Christian McCaffrey", "George Kittle"],
            )],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.won, 1);
        assert_eq!(store.pick(pick_id).unwrap().payout, dec!(0.91));
    }

    #[tokio::test]
    async fn test_unrelated_name_grades_loss() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::FirstTd, "Patrick Mahomes", 900);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Saquon Barkley"), &["Saquon Barkley"])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.lost, 1);

        let graded = store.pick(pick_id).unwrap();
        assert_eq!(graded.result, PickResult::Loss);
        assert_eq!(graded.payout, dec!(-1.00));

        // The loss still leaves an audit row naming the rejected candidate.
        let decision = store.current_decision(pick_id).unwrap();
        assert!(decision.matched_name.is_none());
        assert!(decision.reason.contains("Saquon Barkley"));
    }

    #[tokio::test]
    async fn test_review_band_routes_to_review() {
        let store = Arc::new(SettlementStore::new());
        // One-character typo lands in the Medium band.
        let pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allan", 500);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.needs_review, 1);
        assert_eq!(report.total_graded, 0);

        let pick = store.pick(pick_id).unwrap();
        assert_eq!(pick.state, PickState::NeedsReview);
        assert_eq!(pick.result, PickResult::Unset);
        assert_eq!(pick.payout, Decimal::ZERO);
        assert!(store.current_decision(pick_id).unwrap().needs_review);
    }

    #[tokio::test]
    async fn test_no_first_td_scorer_is_deterministic_loss() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        store.insert_pick(pick).unwrap();

        // Final game, no offensive touchdown.
        let orch = orchestrator_with(
            vec![make_facts("g1", 1, None, &[])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.lost, 1);
        assert_eq!(report.needs_review, 0);
    }

    #[tokio::test]
    async fn test_not_final_game_skipped() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let mut facts = make_facts("g1", 1, None, &[]);
        facts.is_final = false;
        let orch = orchestrator_with(vec![facts], Arc::clone(&store));

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.total_graded, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::GameNotFinal);

        // Still pending, no ledger row written.
        assert_eq!(store.pick(pick_id).unwrap().state, PickState::Pending);
        assert_eq!(store.decision_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_game_facts_skipped() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g9", 1, PickType::FirstTd, "Josh Allen", 500);
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::NoScorerData);
    }

    #[tokio::test]
    async fn test_invalid_pick_skipped_not_defaulted() {
        let store = Arc::new(SettlementStore::new());
        let mut pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        pick.odds = 50; // malformed
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.total_graded, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::InvalidInput);
        assert_eq!(store.pick(pick_id).unwrap().state, PickState::Pending);
    }

    #[tokio::test]
    async fn test_one_bad_pick_does_not_abort_batch() {
        let store = Arc::new(SettlementStore::new());
        let mut bad = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        bad.stake = Decimal::ZERO;
        let good = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        let good_id = good.id;
        store.insert_pick(bad).unwrap();
        store.insert_pick(good).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let report = orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(report.won, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(store.pick(good_id).unwrap().result, PickResult::Win);
    }

    #[tokio::test]
    async fn test_grade_week_idempotent() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let first = orch.grade_week(2025, 1, false).await.unwrap();
        let ledger_rows = store.decision_count();
        let second = orch.grade_week(2025, 1, false).await.unwrap();

        // Identical aggregates, no duplicate ledger rows, no new payout.
        assert_eq!(first.won, second.won);
        assert_eq!(first.lost, second.lost);
        assert_eq!(first.total_graded, second.total_graded);
        assert_eq!(second.newly_graded, 0);
        assert_eq!(store.decision_count(), ledger_rows);
    }

    #[tokio::test]
    async fn test_forced_regrade_appends_history() {
        let store = Arc::new(SettlementStore::new());
        let pick = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        orch.grade_week(2025, 1, false).await.unwrap();
        assert_eq!(store.decisions_for_pick(pick_id).len(), 1);

        let report = orch.grade_week(2025, 1, true).await.unwrap();
        assert_eq!(report.newly_graded, 1);
        // History preserved: a fresh row, not an overwrite.
        assert_eq!(store.decisions_for_pick(pick_id).len(), 2);
        assert_eq!(store.pick(pick_id).unwrap().result, PickResult::Win);
    }

    #[tokio::test]
    async fn test_source_failure_is_data_unavailable() {
        let store = Arc::new(SettlementStore::new());
        let mut source = MockScorerSource::new();
        source
            .expect_week_games()
            .returning(|_, _| Err(anyhow::anyhow!("upstream timeout")));
        source.expect_name().return_const("mock".to_string());

        let orch =
            GradingOrchestrator::new(Arc::new(source), Arc::clone(&store), NameMatcher::default());

        let err = orch.grade_week(2025, 1, false).await.unwrap_err();
        assert!(matches!(err, VerdictError::DataUnavailable { week: 1, .. }));
    }

    #[tokio::test]
    async fn test_grade_by_pick_type_filters() {
        let store = Arc::new(SettlementStore::new());
        let ftd = make_pick("g1", 1, PickType::FirstTd, "Josh Allen", 500);
        let atts = make_pick("g1", 1, PickType::AnytimeTd, "Josh Allen", 120);
        let ftd_id = ftd.id;
        let atts_id = atts.id;
        store.insert_pick(ftd).unwrap();
        store.insert_pick(atts).unwrap();

        let orch = orchestrator_with(
            vec![make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"])],
            Arc::clone(&store),
        );

        let report = orch
            .grade_by_pick_type(PickType::FirstTd, 2025, false)
            .await
            .unwrap();
        assert_eq!(report.total_graded(), 1);
        assert!(store.pick(ftd_id).unwrap().is_graded());
        assert_eq!(store.pick(atts_id).unwrap().state, PickState::Pending);
    }

    #[tokio::test]
    async fn test_season_run_cancel_between_weeks() {
        let store = Arc::new(SettlementStore::new());
        for week in [1u8, 2] {
            let pick = make_pick(&format!("g{week}"), week, PickType::FirstTd, "Josh Allen", 500);
            store.insert_pick(pick).unwrap();
        }

        let orch = orchestrator_with(
            vec![
                make_facts("g1", 1, Some("Josh Allen"), &["Josh Allen"]),
                make_facts("g2", 2, Some("Josh Allen"), &["Josh Allen"]),
            ],
            Arc::clone(&store),
        );

        orch.cancel_flag().store(true, Ordering::SeqCst);
        let report = orch.grade_season(2025, false).await.unwrap();
        assert!(report.cancelled);
        assert!(report.weeks.is_empty());
        // No week was half-graded: nothing was touched at all.
        assert_eq!(store.decision_count(), 0);
    }

    #[tokio::test]
    async fn test_week_guard_blocks_concurrent_grade() {
        let store = Arc::new(SettlementStore::new());
        let orch = orchestrator_with(vec![], Arc::clone(&store));

        let _guard = store.begin_week(2025, 1).unwrap();
        let err = orch.grade_week(2025, 1, false).await.unwrap_err();
        assert!(matches!(err, VerdictError::WeekInProgress { .. }));
    }
}
