// Command-line definition
use clap::{Arg, ArgAction, Command};

use crate::core::config::DEFAULT_DOWNLOAD_PATH;

pub fn build_cli() -> Command {
    Command::new("flacwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches a YouTube playlist and saves new entries as tagged FLAC files")
        .arg(
            Arg::new("playlist-url")
                .long("playlist-url")
                .value_name("URL")
                .env("PLAYLIST_URL")
                .help("Playlist to watch (YouTube or YouTube Music)"),
        )
        .arg(
            Arg::new("download-path")
                .long("download-path")
                .value_name("DIR")
                .env("DOWNLOAD_PATH")
                .default_value(DEFAULT_DOWNLOAD_PATH)
                .help("Directory where FLAC files and download state are stored"),
        )
        .arg(
            Arg::new("interval-ms")
                .long("interval-ms")
                .value_name("MS")
                .env("OBSERVER_INTERVAL_MS")
                .value_parser(clap::value_parser!(u64))
                .default_value("60000")
                .help("Time between playlist checks in milliseconds (minimum 1000)"),
        )
        .arg(
            Arg::new("latest-only")
                .long("latest-only")
                .help("Download only the most recent entry and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .help("Print playlist information and exit")
                .action(ArgAction::SetTrue)
                .conflicts_with("latest-only"),
        )
        .arg(
            Arg::new("cookies")
                .long("cookies")
                .value_name("FILE")
                .env("YT_COOKIES")
                .help("Netscape cookie file passed to yt-dlp"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .env("YT_DLP_CACHE_DIR")
                .help("Cache directory for yt-dlp"),
        )
        .arg(
            Arg::new("yt-dlp")
                .long("yt-dlp")
                .value_name("PATH")
                .env("YT_DLP_PATH")
                .help("Path to the yt-dlp executable (default: search PATH)"),
        )
        .arg(
            Arg::new("ffmpeg")
                .long("ffmpeg")
                .value_name("PATH")
                .env("FFMPEG_PATH")
                .help("Path to the ffmpeg executable (default: search PATH)"),
        )
}
