// Command handlers module
pub mod info;
pub mod latest;
pub mod watch;

use anyhow::{Context, Result};

use crate::core::config::WatchConfig;
use crate::core::cover::HttpCoverSource;
use crate::core::dedup::DedupStore;
use crate::core::ffmpeg_manager::FFmpegManager;
use crate::core::lister::YtDlpLister;
use crate::core::pipeline::{ExternalTools, Pipeline};
use crate::core::stop::StopSignal;
use crate::core::watcher::Watcher;
use crate::core::yt_dlp_manager::YtDlpManager;

/// Watcher wired to the real external tools
pub type LiveWatcher = Watcher<YtDlpLister, Pipeline<ExternalTools, HttpCoverSource>>;

pub(crate) fn yt_dlp_manager(config: &WatchConfig) -> Result<YtDlpManager> {
    YtDlpManager::ensure_yt_dlp(
        config.yt_dlp_path.as_deref(),
        config.cache_dir.clone(),
        config.cookies.clone(),
    )
    .context("yt-dlp is required")
}

/// Resolve tools, load state and assemble the watcher
pub fn build_watcher(
    config: &WatchConfig,
    playlist_url: &str,
    stop: StopSignal,
) -> Result<LiveWatcher> {
    let yt_dlp = yt_dlp_manager(config)?;
    let ffmpeg = FFmpegManager::ensure_ffmpeg(config.ffmpeg_path.as_deref())
        .context("ffmpeg is required")?;
    let covers = HttpCoverSource::new().context("Failed to build HTTP client")?;

    let lister = YtDlpLister::new(yt_dlp.clone());
    let pipeline = Pipeline::new(
        config.download_dir.clone(),
        ExternalTools { yt_dlp, ffmpeg },
        covers,
    );
    let store = DedupStore::load_from_dir(&config.download_dir);

    Ok(Watcher::new(
        playlist_url.to_string(),
        config.download_dir.clone(),
        config.interval(),
        lister,
        pipeline,
        store,
        stop,
    ))
}
