use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::fixture::{Fixture, LeagueResults, Odds};

pub const DEFAULT_OUTPUT: &str = "fixtures.json";

/// Write `data` as pretty-printed UTF-8 JSON (2-space indent).
pub fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Data saved to {}", path.display());
    Ok(())
}

/// One-line odds summary, "N/A" for absent fields.
pub fn format_odds(odds: &Odds) -> String {
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "N/A".into());
    format!(
        "{:>5} / {:>5} / {:>5}",
        fmt(odds.home_win),
        fmt(odds.draw),
        fmt(odds.away_win)
    )
}

pub fn print_league(league: &str, fixtures: &[Fixture]) {
    println!("\n=== {} ===", league.to_uppercase());
    if fixtures.is_empty() {
        println!("No fixtures listed.");
        return;
    }

    println!(
        "{:<14} | {:<22} | {:<22} | {:^21}",
        "Date", "Home", "Away", "1 / X / 2"
    );
    println!("{}", "-".repeat(88));
    for f in fixtures {
        println!(
            "{:<14} | {:<22} | {:<22} | {}",
            truncate(f.datetime.as_deref().unwrap_or("TBD"), 14),
            truncate(&f.home_team, 22),
            truncate(&f.away_team, 22),
            format_odds(&f.odds)
        );
    }
}

pub fn print_summary(results: &LeagueResults) {
    let empty: Vec<_> = results
        .iter()
        .filter(|e| e.fixtures.is_empty())
        .map(|e| e.league.as_str())
        .collect();
    let without_odds = results
        .iter()
        .flat_map(|e| e.fixtures.iter())
        .filter(|f| f.odds.is_empty())
        .count();
    println!(
        "\n{} fixtures across {} leagues ({} empty, {} without odds) | {}",
        results.total_fixtures(),
        results.len(),
        empty.len(),
        without_odds,
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    );
    if !empty.is_empty() {
        println!("Empty: {}", empty.join(", "));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
