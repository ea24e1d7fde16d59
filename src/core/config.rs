use clap::ArgMatches;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::validation::{ensure_writable_dir, validate_playlist_url};
use crate::core::watcher::base_interval;
use crate::error::{Result, WatchError};

pub const DEFAULT_DOWNLOAD_PATH: &str = "./downloads";
pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

/// Runtime configuration assembled from flags and environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub playlist_url: Option<String>,
    pub download_dir: PathBuf,
    pub interval_ms: u64,
    pub latest_only: bool,
    pub info_only: bool,
    /// Cookie file handed to yt-dlp
    pub cookies: Option<PathBuf>,
    /// yt-dlp's own cache directory
    pub cache_dir: PathBuf,
    pub yt_dlp_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            playlist_url: None,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_PATH),
            interval_ms: DEFAULT_INTERVAL_MS,
            latest_only: false,
            info_only: false,
            cookies: None,
            cache_dir: default_cache_dir(),
            yt_dlp_path: None,
            ffmpeg_path: None,
        }
    }
}

impl WatchConfig {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let defaults = Self::default();
        let path = |name: &str| matches.get_one::<String>(name).map(PathBuf::from);

        Self {
            playlist_url: matches.get_one::<String>("playlist-url").cloned(),
            download_dir: path("download-path").unwrap_or(defaults.download_dir),
            interval_ms: matches
                .get_one::<u64>("interval-ms")
                .copied()
                .unwrap_or(defaults.interval_ms),
            latest_only: matches.get_flag("latest-only"),
            info_only: matches.get_flag("info"),
            cookies: path("cookies"),
            cache_dir: path("cache-dir").unwrap_or(defaults.cache_dir),
            yt_dlp_path: path("yt-dlp"),
            ffmpeg_path: path("ffmpeg"),
        }
    }

    /// Poll interval with the one-second floor applied
    pub fn interval(&self) -> Duration {
        base_interval(self.interval_ms)
    }

    /// Checks everything that must hold before any mode runs.
    ///
    /// Creates the download directory when missing and returns the validated
    /// playlist URL.
    pub fn validate(&self) -> Result<&str> {
        let url = self
            .playlist_url
            .as_deref()
            .ok_or_else(|| WatchError::config("PLAYLIST_URL is not set"))?;
        validate_playlist_url(url)?;

        ensure_writable_dir(&self.download_dir)?;

        if let Some(cookies) = &self.cookies {
            if !cookies.is_file() {
                return Err(WatchError::config(format!(
                    "cookie file not found: {}",
                    cookies.display()
                )));
            }
        }

        Ok(url.trim())
    }
}

/// `<user cache dir>/flacwatch/yt-dlp`, or `/tmp/yt-dlp-cache` without one
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("flacwatch").join("yt-dlp"))
        .unwrap_or_else(|| PathBuf::from("/tmp/yt-dlp-cache"))
}
