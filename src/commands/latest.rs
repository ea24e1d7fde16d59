use anyhow::{Context, Result};
use colored::Colorize;

use crate::commands::build_watcher;
use crate::core::config::WatchConfig;
use crate::core::stop::StopSignal;

/// Single-shot mode: fetch the newest entry and exit
pub fn execute(config: &WatchConfig, playlist_url: &str) -> Result<()> {
    println!("{}", "🎵 Mode: download the latest entry only".cyan());
    println!();

    let mut watcher = build_watcher(config, playlist_url, StopSignal::new())?;

    match watcher.run_latest() {
        Ok(entry) => {
            println!(
                "{} {}",
                "✅ Download complete:".green().bold(),
                entry.display_title()
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "❌ Download failed".red().bold());
            Err(e).context("Latest entry could not be downloaded")
        }
    }
}
