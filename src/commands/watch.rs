use anyhow::{anyhow, Result};
use colored::Colorize;

use crate::commands::build_watcher;
use crate::core::config::WatchConfig;
use crate::core::stop::StopSignal;

/// Continuous mode: poll until Ctrl+C
pub fn execute(config: &WatchConfig, playlist_url: &str) -> Result<()> {
    let stop = StopSignal::new();
    let handler_stop = stop.clone();

    ctrlc::set_handler(move || {
        println!();
        println!("{}", "Stop requested...".yellow().bold());
        println!(
            "{}",
            "Finishing the current entry before exiting".dimmed()
        );
        handler_stop.stop();
    })
    .map_err(|e| anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let mut watcher = build_watcher(config, playlist_url, stop)?;

    println!("{}", "🔄 Mode: continuous playlist watch".cyan());
    println!("{}", "Press Ctrl+C at any time to stop".dimmed());
    println!();

    watcher.log_startup();
    watcher.run();

    let stats = watcher.stats();
    println!();
    println!(
        "{} {}",
        "✓ Watcher stopped.".green(),
        format!("{} entries downloaded in total", stats.downloaded_count).dimmed()
    );
    Ok(())
}
