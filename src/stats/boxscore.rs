//! Box-score HTTP client.
//!
//! Pulls finalized-game scorer facts from the league's statistics
//! service. One endpoint per week; a season fetch fans out across all
//! weeks concurrently. The service owns the play-by-play derivation —
//! this client only transports its conclusions.
//!
//! Auth: optional `x-api-key` header. Weeks with no published box score
//! yet return their games with `final = false`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::ScorerSource;
use crate::types::GameFacts;

/// Weeks queried for a full-season fetch (regular season + postseason).
const SEASON_WEEKS: std::ops::RangeInclusive<u8> = 1..=22;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WeekResponse {
    #[serde(default)]
    games: Vec<GameRow>,
}

#[derive(Debug, Deserialize)]
struct GameRow {
    game_id: String,
    season: u16,
    week: u8,
    #[serde(default, rename = "final")]
    is_final: bool,
    #[serde(default)]
    first_td_scorer: Option<String>,
    #[serde(default)]
    td_scorers: Vec<String>,
}

impl From<GameRow> for GameFacts {
    fn from(row: GameRow) -> Self {
        GameFacts {
            game_id: row.game_id,
            season: row.season,
            week: row.week,
            is_final: row.is_final,
            first_td_scorer: row.first_td_scorer.filter(|s| !s.trim().is_empty()),
            td_scorers: row
                .td_scorers
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct BoxScoreClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl BoxScoreClient {
    pub fn new(base_url: &str, api_key: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("verdict/0.1.0")
            .build()
            .context("Failed to build box-score HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn week_url(&self, season: u16, week: u8) -> String {
        format!(
            "{}/seasons/{}/weeks/{}/games",
            self.base_url,
            urlencoding::encode(&season.to_string()),
            urlencoding::encode(&week.to_string()),
        )
    }

    async fn fetch_week(&self, season: u16, week: u8) -> Result<Vec<GameFacts>> {
        let url = self.week_url(season, week);
        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key.expose_secret().as_str());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Box-score request failed: {url}"))?;

        // Unpublished weeks are not an error; there is simply nothing to
        // grade yet.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(season, week, "No box score published for week");
            return Ok(Vec::new());
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("Box-score service rejected request: {url}"))?;

        let body: WeekResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse box-score response: {url}"))?;

        debug!(season, week, games = body.games.len(), "Week box score fetched");
        Ok(body.games.into_iter().map(GameFacts::from).collect())
    }
}

#[async_trait]
impl ScorerSource for BoxScoreClient {
    async fn week_games(&self, season: u16, week: u8) -> Result<Vec<GameFacts>> {
        self.fetch_week(season, week).await
    }

    async fn season_games(&self, season: u16) -> Result<Vec<GameFacts>> {
        let fetches = SEASON_WEEKS.map(|week| self.fetch_week(season, week));
        let results = join_all(fetches).await;

        let mut games = Vec::new();
        for (week, result) in SEASON_WEEKS.zip(results) {
            match result {
                Ok(mut week_games) => games.append(&mut week_games),
                Err(e) => {
                    // One bad week must not sink the whole season fetch;
                    // its picks surface as not-yet-gradable.
                    warn!(season, week, error = %e, "Week fetch failed during season sweep");
                }
            }
        }
        Ok(games)
    }

    fn name(&self) -> &str {
        "boxscore"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
