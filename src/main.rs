mod fixture;
mod leagues;
mod output;
mod parser;
mod render;
mod scrape;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use parser::html::ROW_SELECTOR;
use render::{Renderer, SnapshotRenderer, SpiderRenderer};
use scrape::ScrapeConfig;

#[derive(Parser)]
#[command(name = "odds_scraper", about = "Football fixtures and 1X2 odds scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScrapeArgs {
    /// Site root the league listing paths are appended to
    #[arg(long, env = "ODDS_BASE_URL", default_value = leagues::BASE_URL)]
    base_url: String,
    /// Page load budget per league
    #[arg(long, env = "ODDS_NAV_TIMEOUT_MS", default_value_t = scrape::NAVIGATION_TIMEOUT_MS)]
    nav_timeout_ms: u64,
    /// How long to wait for fixture rows before treating a league as empty
    #[arg(long, env = "ODDS_ROW_TIMEOUT_MS", default_value_t = scrape::ROW_WAIT_TIMEOUT_MS)]
    row_timeout_ms: u64,
    /// CSS selector for table rows
    #[arg(long, env = "ODDS_ROW_SELECTOR", default_value = ROW_SELECTOR)]
    row_selector: String,
    /// User-Agent sent with live renders
    #[arg(long, env = "ODDS_USER_AGENT", default_value = render::DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Restrict to these leagues (name or slug, repeatable or comma-separated)
    #[arg(short, long = "league", env = "ODDS_LEAGUES", value_delimiter = ',')]
    leagues: Vec<String>,
}

impl ScrapeArgs {
    fn config(&self) -> ScrapeConfig {
        ScrapeConfig {
            base_url: self.base_url.clone(),
            navigation_timeout: Duration::from_millis(self.nav_timeout_ms),
            row_wait_timeout: Duration::from_millis(self.row_timeout_ms),
            row_selector: self.row_selector.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape all leagues, save JSON and print the fixtures
    Run {
        #[command(flatten)]
        args: ScrapeArgs,
        /// Output JSON file
        #[arg(short, long, env = "ODDS_OUTPUT", default_value = output::DEFAULT_OUTPUT)]
        output: PathBuf,
        /// Read saved snapshots from this directory instead of rendering live
        #[arg(long, env = "ODDS_SNAPSHOTS")]
        snapshots: Option<PathBuf>,
        /// Skip the per-league listing
        #[arg(short, long)]
        quiet: bool,
    },
    /// Parse fixtures from a saved HTML file
    Parse {
        file: PathBuf,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render every league and save its HTML for offline reprocessing
    Snapshot {
        #[command(flatten)]
        args: ScrapeArgs,
        #[arg(short, long, default_value = "snapshots")]
        dir: PathBuf,
    },
    /// List the league catalog
    Leagues,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            args,
            output: out_path,
            snapshots,
            quiet,
        } => {
            let selected = leagues::select(&args.leagues)?;
            let config = args.config();

            let mut renderer: Box<dyn Renderer> = match snapshots {
                Some(dir) => Box::new(SnapshotRenderer::open(dir)?),
                None => Box::new(SpiderRenderer::connect(&config.user_agent)?),
            };
            println!("Scraping {} leagues...", selected.len());
            let results = scrape::scrape_all(&selected, &mut *renderer, &config).await;
            renderer.close().await?;

            output::save_json(&results, &out_path)?;
            if !quiet {
                for entry in results.iter() {
                    output::print_league(&entry.league, &entry.fixtures);
                }
            }
            output::print_summary(&results);
            Ok(())
        }
        Commands::Parse {
            file,
            output: out_path,
        } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let fixtures = parser::parse_html(&html);
            match out_path {
                Some(path) => {
                    output::save_json(&fixtures, &path)?;
                    println!("Parsed {} fixtures into {}", fixtures.len(), path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&fixtures)?),
            }
            Ok(())
        }
        Commands::Snapshot { args, dir } => {
            let selected = leagues::select(&args.leagues)?;
            let config = args.config();

            let mut renderer = SpiderRenderer::connect(&config.user_agent)?;
            println!("Capturing {} leagues into {}...", selected.len(), dir.display());
            let stats = scrape::capture_snapshots(&selected, &mut renderer, &config, &dir).await;
            renderer.close().await?;
            let stats = stats?;
            println!(
                "Done: {} leagues ({} saved, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Leagues => {
            println!("{:<18} | {:<26} | {}", "League", "Slug", "Listing");
            println!("{}", "-".repeat(100));
            for league in leagues::LEAGUES {
                println!(
                    "{:<18} | {:<26} | {}",
                    league.name,
                    league.slug(),
                    league.listing_url(leagues::BASE_URL)
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
