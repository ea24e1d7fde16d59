// FFmpegManager - converts fetched audio into the target FLAC file
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::yt_dlp_manager::describe_output;
use crate::error::{Result, WatchError};
use crate::platform::find_executable;

#[derive(Debug, Clone)]
pub struct FFmpegManager {
    binary: PathBuf,
}

impl FFmpegManager {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Resolve ffmpeg from an explicit path or from PATH
    pub fn ensure_ffmpeg(explicit: Option<&Path>) -> Result<Self> {
        let binary = find_executable("ffmpeg", explicit)?;
        log::debug!("Using ffmpeg at {}", binary.display());
        Ok(Self::new(binary))
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary
    }

    /// Convert `input` into 16-bit FLAC at `output`.
    ///
    /// ffmpeg writes to a sibling `.part` file that is renamed over `output` only
    /// after a clean exit, so a failed run never leaves a half-written target.
    pub fn transcode_to_flac(&self, entry_id: &str, input: &Path, output: &Path) -> Result<()> {
        let partial = partial_path(output);

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-hide_banner")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("flac")
            .arg("-compression_level")
            .arg("8")
            .arg("-sample_fmt")
            .arg("s16")
            .arg("-f")
            .arg("flac")
            .arg("-y")
            .arg(&partial);

        log::debug!("Running {:?}", cmd);
        let result = cmd.output();

        let output_result = match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(WatchError::transcode(entry_id, describe_output(&out))),
            Err(e) => Err(WatchError::transcode(
                entry_id,
                format!("failed to execute ffmpeg: {}", e),
            )),
        };

        if let Err(e) = output_result {
            remove_if_exists(&partial);
            return Err(e);
        }

        fs::rename(&partial, output).map_err(|e| {
            remove_if_exists(&partial);
            WatchError::transcode(
                entry_id,
                format!("could not move {} into place: {}", partial.display(), e),
            )
        })
    }
}

/// Sibling path ffmpeg writes to before the final rename
pub fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

/// Best-effort delete; a missing file is not an error
pub fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
    }
}
