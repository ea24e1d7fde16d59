use anyhow::Result;
use colored::Colorize;

use flacwatch::cli::build_cli;
use flacwatch::commands;
use flacwatch::core::config::WatchConfig;

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    flacwatch::init_logging();

    println!(
        "{}",
        "flacwatch - playlist watcher with automatic FLAC download".cyan().bold()
    );
    println!(
        "{}",
        "Requires yt-dlp and ffmpeg on PATH (or --yt-dlp / --ffmpeg)".dimmed()
    );
    println!();

    let config = WatchConfig::from_matches(&matches);
    let playlist_url = match config.validate() {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if config.info_only {
        commands::info::execute(&config, &playlist_url)
    } else if config.latest_only {
        commands::latest::execute(&config, &playlist_url)
    } else {
        commands::watch::execute(&config, &playlist_url)
    }
}
