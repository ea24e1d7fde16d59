// Validation for startup inputs: the playlist URL and the download directory

use std::fs;
use std::path::Path;
use url::Url;

use crate::error::{Result, WatchError};

/// Maximum URL length accepted for the playlist reference
const MAX_URL_LENGTH: usize = 2048;

/// Playlist URLs must start with one of these
pub const ACCEPTED_URL_PREFIXES: [&str; 4] = [
    "https://www.youtube.com/",
    "https://music.youtube.com/",
    "https://youtu.be/",
    "https://www.youtube-nocookie.com/",
];

/// Name of the file written and removed to probe the download directory
pub const WRITE_PROBE_NAME: &str = ".write_test";

/// Validates the playlist reference.
///
/// The URL ends up as a process argument, so besides the prefix check it must
/// parse cleanly and carry no control characters.
pub fn validate_playlist_url(url_str: &str) -> Result<()> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(WatchError::config("playlist URL is not set"));
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(WatchError::config(format!(
            "playlist URL is too long ({} characters, max {})",
            trimmed.len(),
            MAX_URL_LENGTH
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(WatchError::config("playlist URL contains control characters"));
    }
    if !ACCEPTED_URL_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return Err(WatchError::config(format!(
            "playlist URL must be a YouTube or YouTube Music URL (one of: {})",
            ACCEPTED_URL_PREFIXES.join(", ")
        )));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| WatchError::config(format!("invalid playlist URL: {}", e)))?;
    if url.host_str().is_none() {
        return Err(WatchError::config("playlist URL has no hostname"));
    }

    Ok(())
}

/// Create the download directory if needed and prove it is writable
pub fn ensure_writable_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(WatchError::config("download directory is empty"));
    }
    if path.is_file() {
        return Err(WatchError::config(format!(
            "download path points to a file: {}",
            path.display()
        )));
    }

    fs::create_dir_all(path).map_err(|e| {
        WatchError::config(format!("cannot create {}: {}", path.display(), e))
    })?;

    let probe = path.join(WRITE_PROBE_NAME);
    fs::write(&probe, "ok")
        .and_then(|_| fs::remove_file(&probe))
        .map_err(|e| {
            WatchError::config(format!("no write permission in {}: {}", path.display(), e))
        })
}
