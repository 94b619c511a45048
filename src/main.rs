//! VERDICT — Wager Grading & Settlement Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the settlement store from disk (or starts fresh), runs a
//! grading pass over the configured season, and reports the review
//! queue. Ctrl+C between weeks cancels cleanly — no week is ever left
//! half-graded.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

use verdict::config::AppConfig;
use verdict::grading::GradingOrchestrator;
use verdict::matcher::NameMatcher;
use verdict::review::ReviewWorkflow;
use verdict::stats::boxscore::BoxScoreClient;
use verdict::store::{snapshot, SettlementStore};

const BANNER: &str = r#"
__     _____ ____  ____ ___ ____ _____
\ \   / / _ \  _ \|  _ \_ _/ ___|_   _|
 \ \ / /|  __/ |_) | | | | | |     | |
  \ V / |  __/|  _ <| |_| | | |___  | |
   \_/   \___||_| \_\____/___\____| |_|

  Wager Grading & Settlement Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    println!("{BANNER}");
    info!(
        league = %cfg.league.name,
        season = cfg.league.season,
        stats_url = %cfg.stats.base_url,
        "VERDICT starting up"
    );

    // -- Restore or create the store --------------------------------------

    let snapshot_path = cfg.storage.snapshot_path.clone();
    let store = match snapshot::load_store(snapshot_path.as_deref())? {
        Some(store) => {
            info!(
                picks = store.pick_count(),
                decisions = store.decision_count(),
                "Resumed from saved store"
            );
            Arc::new(store)
        }
        None => {
            info!("Fresh store");
            Arc::new(SettlementStore::new())
        }
    };

    // -- Initialise components --------------------------------------------

    let api_key = cfg
        .stats
        .api_key_env
        .as_deref()
        .and_then(|env| AppConfig::resolve_env(env).ok())
        .map(SecretString::new);
    if api_key.is_none() {
        warn!("No stats API key configured — relying on unauthenticated access");
    }
    let source = Arc::new(BoxScoreClient::new(&cfg.stats.base_url, api_key)?);

    let orchestrator = GradingOrchestrator::new(
        source,
        Arc::clone(&store),
        NameMatcher::new(cfg.matching.to_matcher_config()),
    );
    let review = ReviewWorkflow::new(Arc::clone(&store));

    // Ctrl+C flips the cancellation flag; the season run stops at the
    // next week boundary.
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received — cancelling after current week");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    // -- Grading run -------------------------------------------------------

    let season = cfg.league.season;
    match orchestrator.grade_season(season, false).await {
        Ok(report) => {
            info!("{report}");
            for week in &report.weeks {
                for skip in &week.skipped {
                    info!(
                        pick_id = %skip.pick_id,
                        player = %skip.player_name,
                        reason = %skip.reason,
                        "Pick not yet gradable"
                    );
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Grading run failed — nothing was applied for the failed week");
        }
    }

    let pending = review.list_pending();
    if !pending.is_empty() {
        info!(count = pending.len(), "Decisions awaiting review");
        for decision in &pending {
            info!(decision_id = %decision.id, "{decision}");
        }
    }
    info!("{}", review.stats());

    // Save final store image
    snapshot::save_store(&store, snapshot_path.as_deref())?;
    info!(
        picks = store.pick_count(),
        decisions = store.decision_count(),
        "VERDICT shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("verdict=info"));

    let json_logging = std::env::var("VERDICT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
