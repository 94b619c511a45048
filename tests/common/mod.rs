//! Mock statistics source for integration testing.
//!
//! Provides a deterministic `ScorerSource` implementation that returns
//! known game facts — all in-memory with no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use verdict::stats::ScorerSource;
use verdict::types::GameFacts;

/// A mock scorer source for deterministic testing.
///
/// All state is in-memory. Game facts are fully controllable from test
/// code, and any operation can be forced to fail.
pub struct MockScorerSource {
    games: Vec<GameFacts>,
    /// If set, all operations will return this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockScorerSource {
    pub fn new(games: Vec<GameFacts>) -> Self {
        Self {
            games,
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }
}

#[async_trait]
impl ScorerSource for MockScorerSource {
    async fn week_games(&self, season: u16, week: u8) -> Result<Vec<GameFacts>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self
            .games
            .iter()
            .filter(|g| g.season == season && g.week == week)
            .cloned()
            .collect())
    }

    async fn season_games(&self, season: u16) -> Result<Vec<GameFacts>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self
            .games
            .iter()
            .filter(|g| g.season == season)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "mock-stats"
    }
}

/// A finalized game with known scorers.
pub fn final_game(
    game_id: &str,
    season: u16,
    week: u8,
    first_td: Option<&str>,
    scorers: &[&str],
) -> GameFacts {
    GameFacts {
        game_id: game_id.to_string(),
        season,
        week,
        is_final: true,
        first_td_scorer: first_td.map(String::from),
        td_scorers: scorers.iter().map(|s| s.to_string()).collect(),
    }
}

/// A game still in progress (nothing gradable).
pub fn open_game(game_id: &str, season: u16, week: u8) -> GameFacts {
    GameFacts {
        game_id: game_id.to_string(),
        season,
        week,
        is_final: false,
        first_td_scorer: None,
        td_scorers: Vec::new(),
    }
}
