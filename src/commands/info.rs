use anyhow::Result;
use colored::Colorize;

use crate::commands::yt_dlp_manager;
use crate::core::config::WatchConfig;
use crate::core::lister::YtDlpLister;

/// Print the playlist summary
pub fn execute(config: &WatchConfig, playlist_url: &str) -> Result<()> {
    let manager = yt_dlp_manager(config)?;

    let summary = YtDlpLister::new(manager).playlist_summary(playlist_url);

    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".cyan());
    println!("{}", "  Playlist".cyan().bold());
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".cyan());
    println!("{} {}", "Title:".dimmed(), summary.title);
    println!("{} {}", "Owner:".dimmed(), summary.owner);
    println!("{} {}", "Entries:".dimmed(), summary.entry_count);
    if !summary.upload_date.is_empty() {
        println!("{} {}", "Updated:".dimmed(), summary.upload_date);
    }
    if !summary.description.is_empty() {
        println!();
        println!("{}", summary.description);
    }

    Ok(())
}
