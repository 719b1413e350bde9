use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use scraper::Selector;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::fixture::{Fixture, LeagueResults};
use crate::leagues::{League, BASE_URL};
use crate::parser;
use crate::parser::html::ROW_SELECTOR;
use crate::render::{RenderError, Renderer, SnapshotRenderer, DEFAULT_USER_AGENT};

pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;
pub const ROW_WAIT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub navigation_timeout: Duration,
    pub row_wait_timeout: Duration,
    pub row_selector: String,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            navigation_timeout: Duration::from_millis(NAVIGATION_TIMEOUT_MS),
            row_wait_timeout: Duration::from_millis(ROW_WAIT_TIMEOUT_MS),
            row_selector: ROW_SELECTOR.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Why a single league produced no fixtures. Never escapes `scrape_all`.
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("parse failed: {0}")]
    Parse(String),
}

/// Counts returned by [`capture_snapshots`].
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Scrape every league in order through one shared renderer session.
///
/// A league that times out waiting for rows, fails to render, or fails to
/// parse gets an empty list; the run always continues.
pub async fn scrape_all(
    leagues: &[League],
    renderer: &mut dyn Renderer,
    config: &ScrapeConfig,
) -> LeagueResults {
    let pb = progress_bar(leagues.len());
    let mut results = LeagueResults::new();

    for league in leagues {
        pb.set_message(league.name);
        let fixtures = match scrape_league(league, renderer, config).await {
            Ok(fixtures) => {
                info!("Found {} fixtures for {}", fixtures.len(), league.name);
                fixtures
            }
            Err(LeagueError::Render(RenderError::RowWaitTimeout { waited, .. })) => {
                info!(
                    "No fixtures found for {} (no table rows after {:.1}s)",
                    league.name,
                    waited.as_secs_f64()
                );
                Vec::new()
            }
            Err(e) => {
                error!("Error scraping {}: {}", league.name, e);
                Vec::new()
            }
        };
        results.insert(league.name, fixtures);
        pb.inc(1);
    }

    pb.finish_and_clear();
    results
}

/// Render one league's listing and parse it host-side.
pub async fn scrape_league(
    league: &League,
    renderer: &mut dyn Renderer,
    config: &ScrapeConfig,
) -> Result<Vec<Fixture>, LeagueError> {
    let url = league.listing_url(&config.base_url);
    info!("Navigating to: {}", url);

    renderer.navigate(&url, config.navigation_timeout).await?;
    renderer
        .wait_for_rows(&config.row_selector, config.row_wait_timeout)
        .await?;
    let html = renderer.content().await?;

    // Parsing runs off the async thread; a panic there surfaces as a JoinError.
    let selector = config.row_selector.clone();
    tokio::task::spawn_blocking(move || parse_snapshot(&html, &selector))
        .await
        .map_err(|e| LeagueError::Parse(e.to_string()))?
}

fn parse_snapshot(html: &str, row_selector: &str) -> Result<Vec<Fixture>, LeagueError> {
    let selector = Selector::parse(row_selector)
        .map_err(|e| LeagueError::Parse(format!("bad row selector `{}`: {}", row_selector, e)))?;
    Ok(parser::parse_html_with(html, &selector))
}

/// Render each league and save the raw HTML under `dir` for offline
/// reprocessing. Pages without rows are saved too.
pub async fn capture_snapshots(
    leagues: &[League],
    renderer: &mut dyn Renderer,
    config: &ScrapeConfig,
    dir: &Path,
) -> anyhow::Result<ScrapeStats> {
    tokio::fs::create_dir_all(dir).await?;
    let pb = progress_bar(leagues.len());
    let mut ok = 0usize;
    let mut errors = 0usize;

    for league in leagues {
        pb.set_message(league.name);
        let url = league.listing_url(&config.base_url);
        match capture_one(&url, renderer, config).await {
            Ok(html) => {
                let path = SnapshotRenderer::snapshot_path(dir, &url);
                tokio::fs::write(&path, html).await?;
                info!("Saved {} to {}", league.name, path.display());
                ok += 1;
            }
            Err(e) => {
                error!("Error capturing {}: {}", league.name, e);
                errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(ScrapeStats {
        total: leagues.len(),
        ok,
        errors,
    })
}

async fn capture_one(
    url: &str,
    renderer: &mut dyn Renderer,
    config: &ScrapeConfig,
) -> Result<String, RenderError> {
    renderer.navigate(url, config.navigation_timeout).await?;
    match renderer
        .wait_for_rows(&config.row_selector, config.row_wait_timeout)
        .await
    {
        Ok(()) => {}
        Err(RenderError::RowWaitTimeout { .. }) => warn!("{} has no rows, saving anyway", url),
        Err(e) => return Err(e),
    }
    renderer.content().await
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
