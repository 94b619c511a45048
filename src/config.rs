//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the stats API key) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::matcher::{
    MatcherConfig, AUTO_ACCEPT_THRESHOLD, MATCH_FLOOR, MEDIUM_CONFIDENCE_THRESHOLD,
};
use crate::types::VerdictError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub league: LeagueConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    pub stats: StatsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeagueConfig {
    pub name: String,
    pub season: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_auto_accept")]
    pub auto_accept_threshold: f64,
    #[serde(default = "default_medium")]
    pub medium_threshold: f64,
    #[serde(default = "default_floor")]
    pub match_floor: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            auto_accept_threshold: AUTO_ACCEPT_THRESHOLD,
            medium_threshold: MEDIUM_CONFIDENCE_THRESHOLD,
            match_floor: MATCH_FLOOR,
        }
    }
}

impl MatchingConfig {
    pub fn to_matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            auto_accept_threshold: self.auto_accept_threshold,
            medium_threshold: self.medium_threshold,
            match_floor: self.match_floor,
        }
    }
}

fn default_auto_accept() -> f64 {
    AUTO_ACCEPT_THRESHOLD
}

fn default_medium() -> f64 {
    MEDIUM_CONFIDENCE_THRESHOLD
}

fn default_floor() -> f64 {
    MATCH_FLOOR
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    /// Base URL of the box-score service.
    pub base_url: String,
    /// Env var holding the API key, if the service requires one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Snapshot file path; the store default applies when absent.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Threshold sanity: 0 < floor ≤ medium ≤ auto-accept ≤ 1.
    pub fn validate(&self) -> Result<(), VerdictError> {
        let m = &self.matching;
        let ordered = 0.0 < m.match_floor
            && m.match_floor <= m.medium_threshold
            && m.medium_threshold <= m.auto_accept_threshold
            && m.auto_accept_threshold <= 1.0;
        if !ordered {
            return Err(VerdictError::Config(format!(
                "matching thresholds must satisfy 0 < floor <= medium <= auto_accept <= 1 \
                 (floor={}, medium={}, auto_accept={})",
                m.match_floor, m.medium_threshold, m.auto_accept_threshold,
            )));
        }
        if self.stats.base_url.trim().is_empty() {
            return Err(VerdictError::Config("stats.base_url must be set".to_string()));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [league]
        name = "firsttd"
        season = 2025

        [stats]
        base_url = "https://stats.example.com/v1"
        api_key_env = "STATS_API_KEY"

        [storage]
        snapshot_path = "verdict_store.json"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.league.name, "firsttd");
        assert_eq!(config.league.season, 2025);
        assert_eq!(config.stats.base_url, "https://stats.example.com/v1");
        assert_eq!(config.stats.api_key_env.as_deref(), Some("STATS_API_KEY"));
        assert_eq!(
            config.storage.snapshot_path.as_deref(),
            Some("verdict_store.json")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_matching_defaults_applied() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.matching.auto_accept_threshold, 0.85);
        assert_eq!(config.matching.medium_threshold, 0.70);
        assert_eq!(config.matching.match_floor, 0.50);
    }

    #[test]
    fn test_matching_overrides() {
        let doc = r#"
            [league]
            name = "firsttd"
            season = 2025

            [matching]
            auto_accept_threshold = 0.90

            [stats]
            base_url = "https://stats.example.com/v1"
        "#;
        let config: AppConfig = toml::from_str(doc).unwrap();
        assert_eq!(config.matching.auto_accept_threshold, 0.90);
        assert_eq!(config.matching.medium_threshold, 0.70);
    }

    #[test]
    fn test_threshold_ordering_enforced() {
        let doc = r#"
            [league]
            name = "firsttd"
            season = 2025

            [matching]
            auto_accept_threshold = 0.60
            medium_threshold = 0.70

            [stats]
            base_url = "https://stats.example.com/v1"
        "#;
        let config: AppConfig = toml::from_str(doc).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, VerdictError::Config(_)));
    }

    #[test]
    fn test_blank_base_url_rejected() {
        let doc = r#"
            [league]
            name = "firsttd"
            season = 2025

            [stats]
            base_url = "  "
        "#;
        let config: AppConfig = toml::from_str(doc).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_matcher_config() {
        let matching = MatchingConfig::default();
        let mc = matching.to_matcher_config();
        assert_eq!(mc.auto_accept_threshold, 0.85);
        assert_eq!(mc.match_floor, 0.50);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(AppConfig::load("/tmp/verdict_no_such_config_819.toml").is_err());
    }
}
