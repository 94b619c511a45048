//! Settlement store: the pick table and the append-only match-decision
//! ledger, held behind a single write boundary.
//!
//! All grading writes for a week (pick transitions + ledger appends) are
//! applied in one atomic commit; review resolutions mutate one decision
//! and its pick in the same critical section. The review queue is a query
//! over the ledger, never a separate in-memory list.

pub mod snapshot;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::types::{MatchDecision, Pick, PickResult, PickState, PickType, VerdictError};

// ---------------------------------------------------------------------------
// Commit types
// ---------------------------------------------------------------------------

/// Graded fields applied to one pick inside a week commit.
#[derive(Debug, Clone)]
pub struct PickUpdate {
    pub pick_id: Uuid,
    pub state: PickState,
    pub result: PickResult,
    pub payout: Decimal,
    pub graded_at: Option<DateTime<Utc>>,
}

/// One week's worth of grading output, applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WeekCommit {
    pub pick_updates: Vec<PickUpdate>,
    pub decisions: Vec<MatchDecision>,
}

impl WeekCommit {
    pub fn is_empty(&self) -> bool {
        self.pick_updates.is_empty() && self.decisions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    picks: HashMap<Uuid, Pick>,
    /// Append-only; the current decision for a pick is its last row.
    decisions: Vec<MatchDecision>,
}

/// In-process settlement store.
pub struct SettlementStore {
    tables: RwLock<Tables>,
    /// Weeks currently owned by a grading run.
    weeks_in_flight: Mutex<HashSet<(u16, u8)>>,
}

impl Default for SettlementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettlementStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            weeks_in_flight: Mutex::new(HashSet::new()),
        }
    }

    // -- pick table -------------------------------------------------------

    /// Insert a new pick. The surrounding CRUD layer owns creation; this
    /// core only ever transitions existing picks.
    pub fn insert_pick(&self, pick: Pick) -> Result<(), VerdictError> {
        let mut tables = self.write();
        if tables.picks.contains_key(&pick.id) {
            return Err(VerdictError::Storage(format!(
                "duplicate pick id {}",
                pick.id
            )));
        }
        tables.picks.insert(pick.id, pick);
        Ok(())
    }

    pub fn pick(&self, id: Uuid) -> Option<Pick> {
        self.read().picks.get(&id).cloned()
    }

    pub fn pick_count(&self) -> usize {
        self.read().picks.len()
    }

    /// Picks for one week, ordered by submission time for deterministic
    /// grading output.
    pub fn picks_for_week(&self, season: u16, week: u8) -> Vec<Pick> {
        let mut picks: Vec<Pick> = self
            .read()
            .picks
            .values()
            .filter(|p| p.season == season && p.week == week)
            .cloned()
            .collect();
        picks.sort_by(|a, b| (a.submitted_at, a.id).cmp(&(b.submitted_at, b.id)));
        picks
    }

    pub fn picks_by_type(&self, season: u16, pick_type: PickType) -> Vec<Pick> {
        let mut picks: Vec<Pick> = self
            .read()
            .picks
            .values()
            .filter(|p| p.season == season && p.pick_type == pick_type)
            .cloned()
            .collect();
        picks.sort_by(|a, b| (a.week, a.submitted_at, a.id).cmp(&(b.week, b.submitted_at, b.id)));
        picks
    }

    /// Distinct weeks of a season that have at least one pick, ascending.
    pub fn weeks_with_picks(&self, season: u16) -> Vec<u8> {
        let mut weeks: Vec<u8> = self
            .read()
            .picks
            .values()
            .filter(|p| p.season == season)
            .map(|p| p.week)
            .collect();
        weeks.sort_unstable();
        weeks.dedup();
        weeks
    }

    // -- decision ledger --------------------------------------------------

    pub fn decision(&self, id: Uuid) -> Option<MatchDecision> {
        self.read().decisions.iter().find(|d| d.id == id).cloned()
    }

    pub fn decision_count(&self) -> usize {
        self.read().decisions.len()
    }

    /// Every ledger row, oldest first.
    pub fn decisions(&self) -> Vec<MatchDecision> {
        self.read().decisions.clone()
    }

    /// Full decision history for a pick, oldest first.
    pub fn decisions_for_pick(&self, pick_id: Uuid) -> Vec<MatchDecision> {
        self.read()
            .decisions
            .iter()
            .filter(|d| d.pick_id == pick_id)
            .cloned()
            .collect()
    }

    /// The active decision for a pick: its most recent ledger row.
    pub fn current_decision(&self, pick_id: Uuid) -> Option<MatchDecision> {
        self.read()
            .decisions
            .iter()
            .rev()
            .find(|d| d.pick_id == pick_id)
            .cloned()
    }

    /// All decisions awaiting an admin verdict, highest confidence and
    /// score first. Only a pick's current (most recent) row qualifies:
    /// rows superseded by a forced re-grade never resurface here.
    pub fn pending_reviews(&self) -> Vec<MatchDecision> {
        let tables = self.read();
        let mut latest: HashMap<Uuid, usize> = HashMap::new();
        for (index, decision) in tables.decisions.iter().enumerate() {
            latest.insert(decision.pick_id, index);
        }
        let mut pending: Vec<MatchDecision> = tables
            .decisions
            .iter()
            .enumerate()
            .filter(|(index, d)| d.is_pending_review() && latest[&d.pick_id] == *index)
            .map(|(_, d)| d.clone())
            .collect();
        pending.sort_by(|a, b| {
            (b.confidence.rank(), b.score)
                .partial_cmp(&(a.confidence.rank(), a.score))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pending
    }

    // -- atomic mutations -------------------------------------------------

    /// Apply one week's grading output atomically. Either every pick
    /// update and ledger append lands, or (on any unknown pick id)
    /// nothing does.
    pub fn commit_week(&self, commit: WeekCommit) -> Result<(), VerdictError> {
        let mut tables = self.write();

        for update in &commit.pick_updates {
            if !tables.picks.contains_key(&update.pick_id) {
                return Err(VerdictError::PickNotFound(update.pick_id));
            }
        }

        debug!(
            picks = commit.pick_updates.len(),
            decisions = commit.decisions.len(),
            "Committing week grading output"
        );

        for update in commit.pick_updates {
            if let Some(pick) = tables.picks.get_mut(&update.pick_id) {
                pick.state = update.state;
                pick.result = update.result;
                pick.payout = update.payout;
                pick.graded_at = update.graded_at;
            }
        }
        tables.decisions.extend(commit.decisions);

        Ok(())
    }

    /// Run a review resolution against a decision and its pick in one
    /// critical section. The closure sees both records mutably; its error
    /// leaves the store untouched only if it mutates nothing before
    /// failing (resolutions validate before writing).
    pub fn resolve_review<T>(
        &self,
        decision_id: Uuid,
        f: impl FnOnce(&mut MatchDecision, &mut Pick) -> Result<T, VerdictError>,
    ) -> Result<T, VerdictError> {
        let mut tables = self.write();
        let Tables { picks, decisions } = &mut *tables;

        let decision = decisions
            .iter_mut()
            .find(|d| d.id == decision_id)
            .ok_or(VerdictError::DecisionNotFound(decision_id))?;
        let pick = picks
            .get_mut(&decision.pick_id)
            .ok_or(VerdictError::PickNotFound(decision.pick_id))?;

        f(decision, pick)
    }

    // -- week ownership ---------------------------------------------------

    /// Claim a week for grading. Fails fast when another invocation
    /// already owns it; the guard releases on drop.
    pub fn begin_week(&self, season: u16, week: u8) -> Result<WeekGuard<'_>, VerdictError> {
        let mut in_flight = self.weeks_in_flight.lock().expect("week set poisoned");
        if !in_flight.insert((season, week)) {
            return Err(VerdictError::WeekInProgress { season, week });
        }
        Ok(WeekGuard {
            store: self,
            season,
            week,
        })
    }

    // -- snapshot ---------------------------------------------------------

    pub fn to_snapshot(&self) -> StoreSnapshot {
        let tables = self.read();
        let mut picks: Vec<Pick> = tables.picks.values().cloned().collect();
        picks.sort_by(|a, b| (a.submitted_at, a.id).cmp(&(b.submitted_at, b.id)));
        StoreSnapshot {
            picks,
            decisions: tables.decisions.clone(),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        {
            let mut tables = store.write();
            tables.picks = snapshot.picks.into_iter().map(|p| (p.id, p)).collect();
            tables.decisions = snapshot.decisions;
        }
        store
    }

    // -- lock helpers -----------------------------------------------------

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().expect("store lock poisoned")
    }
}

/// RAII ownership of one week's grading run.
pub struct WeekGuard<'a> {
    store: &'a SettlementStore,
    season: u16,
    week: u8,
}

impl std::fmt::Debug for WeekGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeekGuard")
            .field("season", &self.season)
            .field("week", &self.week)
            .finish()
    }
}

impl Drop for WeekGuard<'_> {
    fn drop(&mut self) {
        self.store
            .weeks_in_flight
            .lock()
            .expect("week set poisoned")
            .remove(&(self.season, self.week));
    }
}

/// Serializable image of the full store (both tables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub picks: Vec<Pick>,
    pub decisions: Vec<MatchDecision>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
