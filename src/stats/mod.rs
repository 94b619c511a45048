//! Statistics collaborator integrations.
//!
//! Defines the `ScorerSource` trait — the seam to the external system
//! that derives canonical touchdown scorers from play-by-play data —
//! and provides the HTTP box-score client implementation.

pub mod boxscore;

use anyhow::Result;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::types::GameFacts;

/// Abstraction over the external statistics collaborator.
///
/// Implementors report, per game, finality plus the canonical first
/// touchdown scorer and the set of all touchdown scorers. This core
/// never derives those facts itself.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScorerSource: Send + Sync {
    /// Facts for every game of one week. Games that have not been played
    /// are returned with `is_final = false` and empty scorer data.
    async fn week_games(&self, season: u16, week: u8) -> Result<Vec<GameFacts>>;

    /// Facts for every game of a season.
    async fn season_games(&self, season: u16) -> Result<Vec<GameFacts>>;

    /// Source name for logging and error reporting.
    fn name(&self) -> &str;
}
