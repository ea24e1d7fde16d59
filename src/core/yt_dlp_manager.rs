// YtDlpManager - listing and audio extraction through the yt-dlp executable
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{Result, WatchError};
use crate::platform::find_executable;

/// Extensions yt-dlp may leave behind when extracting opus audio
pub const RAW_AUDIO_EXTENSIONS: [&str; 2] = ["opus", "webm"];

/// Thin wrapper around the yt-dlp executable.
///
/// Holds the resolved binary plus the options shared by every invocation
/// (cache directory and optional cookie file).
#[derive(Debug, Clone)]
pub struct YtDlpManager {
    binary: PathBuf,
    cache_dir: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlpManager {
    pub fn new(binary: PathBuf, cache_dir: PathBuf, cookies: Option<PathBuf>) -> Self {
        Self {
            binary,
            cache_dir,
            cookies,
        }
    }

    /// Resolve yt-dlp from an explicit path or from PATH
    pub fn ensure_yt_dlp(
        explicit: Option<&Path>,
        cache_dir: PathBuf,
        cookies: Option<PathBuf>,
    ) -> Result<Self> {
        let binary = find_executable("yt-dlp", explicit)?;
        log::debug!("Using yt-dlp at {}", binary.display());
        Ok(Self::new(binary, cache_dir, cookies))
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary
    }

    pub fn cookies_path(&self) -> Option<&Path> {
        self.cookies.as_deref()
    }

    /// Dump playlist JSON without downloading media.
    ///
    /// `flat` lists entries without resolving each one, which is what the
    /// watcher needs; the summary call drops it to get playlist-level fields.
    pub fn dump_playlist_json(&self, playlist_url: &str, flat: bool) -> Result<Output> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-J");
        if flat {
            cmd.arg("--flat-playlist");
        }
        cmd.arg("--ignore-errors")
            .arg("--cache-dir")
            .arg(&self.cache_dir);
        self.push_cookies(&mut cmd);
        cmd.arg(playlist_url);

        log::debug!("Running {:?}", cmd);
        cmd.output().map_err(|e| {
            WatchError::listing(format!(
                "failed to execute {}: {}",
                self.binary.display(),
                e
            ))
        })
    }

    /// Extract best-quality opus audio to `<work_dir>/<base_name>.<ext>`.
    ///
    /// Returns the path of the file yt-dlp produced.
    pub fn download_audio(
        &self,
        entry_id: &str,
        page_url: &str,
        work_dir: &Path,
        base_name: &str,
    ) -> Result<PathBuf> {
        let template = work_dir.join(format!("{}.%(ext)s", base_name));

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--extract-audio")
            .arg("--audio-format")
            .arg("opus")
            .arg("--audio-quality")
            .arg("0")
            .arg("--cache-dir")
            .arg(&self.cache_dir)
            .arg("-o")
            .arg(&template);
        self.push_cookies(&mut cmd);
        cmd.arg(page_url);

        log::debug!("Running {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| WatchError::fetch(entry_id, format!("failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(WatchError::fetch(entry_id, describe_output(&output)));
        }

        raw_audio_candidates(work_dir, base_name)
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| {
                WatchError::fetch(
                    entry_id,
                    format!(
                        "yt-dlp exited successfully but no {}.{{opus,webm}} was written",
                        base_name
                    ),
                )
            })
    }

    fn push_cookies(&self, cmd: &mut Command) {
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
    }
}

/// Suffixes yt-dlp appends to in-progress downloads
pub const PARTIAL_SUFFIXES: [&str; 2] = ["part", "ytdl"];

/// Finished raw audio files yt-dlp may produce for `base_name`, in priority order
pub fn raw_audio_candidates(work_dir: &Path, base_name: &str) -> Vec<PathBuf> {
    RAW_AUDIO_EXTENSIONS
        .iter()
        .map(|ext| work_dir.join(format!("{}.{}", base_name, ext)))
        .collect()
}

/// Everything a fetch for `base_name` can leave behind: finished raw audio plus
/// interrupted `.part` downloads and `.ytdl` resume sidecars
pub fn fetch_leftovers(work_dir: &Path, base_name: &str) -> Vec<PathBuf> {
    let mut paths = raw_audio_candidates(work_dir, base_name);
    for ext in RAW_AUDIO_EXTENSIONS {
        for suffix in PARTIAL_SUFFIXES {
            paths.push(work_dir.join(format!("{}.{}.{}", base_name, ext, suffix)));
        }
    }
    paths
}

/// Render captured process output for logs and error payloads
pub fn describe_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut text = format!("exit status {}", output.status);
    if !stderr.trim().is_empty() {
        text.push_str("\nstderr: ");
        text.push_str(stderr.trim());
    }
    if !stdout.trim().is_empty() {
        text.push_str("\nstdout: ");
        text.push_str(stdout.trim());
    }
    text
}
