//! Per-entry fetch → transcode → tag pipeline.
//!
//! Fetch and transcode failures abort the entry and surface as [`WatchError`].
//! Tagging and cover embedding are best effort: their [`SideStepError`]s are
//! logged here and never reach the caller, so a finished FLAC file always counts
//! as success.

use humansize::{format_size, DECIMAL};
use lofty::flac::FlacFile;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::cover::{prepare_cover, CoverSource};
use crate::core::entry::EntryDescriptor;
use crate::core::ffmpeg_manager::{remove_if_exists, FFmpegManager};
use crate::core::naming::output_file_name;
use crate::core::tagger::{self, TrackTags};
use crate::core::yt_dlp_manager::{fetch_leftovers, YtDlpManager};
use crate::error::{Result, SideStepError, WatchError};

/// The external fetch and transcode tools
pub trait AudioTools {
    /// Download raw audio for `entry_id` into `work_dir` as `<base_name>.<ext>`
    fn fetch_audio(
        &self,
        entry_id: &str,
        page_url: &str,
        work_dir: &Path,
        base_name: &str,
    ) -> Result<PathBuf>;

    /// Convert `input` to FLAC at `output`; `output` must only appear on success
    fn transcode(&self, entry_id: &str, input: &Path, output: &Path) -> Result<()>;
}

/// yt-dlp + ffmpeg
pub struct ExternalTools {
    pub yt_dlp: YtDlpManager,
    pub ffmpeg: FFmpegManager,
}

impl AudioTools for ExternalTools {
    fn fetch_audio(
        &self,
        entry_id: &str,
        page_url: &str,
        work_dir: &Path,
        base_name: &str,
    ) -> Result<PathBuf> {
        self.yt_dlp.download_audio(entry_id, page_url, work_dir, base_name)
    }

    fn transcode(&self, entry_id: &str, input: &Path, output: &Path) -> Result<()> {
        self.ffmpeg.transcode_to_flac(entry_id, input, output)
    }
}

/// Anything that can turn one entry into an output file
pub trait EntryPipeline {
    fn run(&self, entry: &EntryDescriptor) -> Result<PathBuf>;
}

/// Working state for one entry, discarded when the run ends
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub entry_id: String,
    pub page_url: String,
    pub temp_base: String,
    pub target: PathBuf,
    pub tags: TrackTags,
    pub cover_url: Option<String>,
}

impl PipelineRun {
    pub fn new(entry: &EntryDescriptor, download_dir: &Path) -> Result<Self> {
        let (Some(entry_id), Some(page_url)) = (entry.id.clone(), entry.watch_url()) else {
            return Err(WatchError::MissingIdentifier {
                title: entry.display_title().to_string(),
            });
        };

        Ok(Self {
            temp_base: format!("temp_{}", entry_id),
            target: download_dir.join(output_file_name(entry)),
            tags: TrackTags::from_entry(entry),
            cover_url: entry.thumbnail.clone(),
            entry_id,
            page_url,
        })
    }
}

pub struct Pipeline<T: AudioTools, C: CoverSource> {
    download_dir: PathBuf,
    tools: T,
    covers: C,
}

impl<T: AudioTools, C: CoverSource> Pipeline<T, C> {
    pub fn new(download_dir: PathBuf, tools: T, covers: C) -> Self {
        Self {
            download_dir,
            tools,
            covers,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn cleanup_temporaries(&self, run: &PipelineRun) {
        for candidate in fetch_leftovers(&self.download_dir, &run.temp_base) {
            remove_if_exists(&candidate);
        }
    }

    fn fetch_and_transcode(&self, run: &PipelineRun) -> Result<()> {
        log::info!("Downloading '{}' as opus...", run.tags.title);
        let raw = match self.tools.fetch_audio(
            &run.entry_id,
            &run.page_url,
            &self.download_dir,
            &run.temp_base,
        ) {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Download failed for '{}': {}", run.tags.title, e);
                return Err(e);
            }
        };

        log::info!(
            "Converting to FLAC: {}",
            run.target.file_name().unwrap_or_default().to_string_lossy()
        );
        if let Err(e) = self.tools.transcode(&run.entry_id, &raw, &run.target) {
            log::error!("FLAC conversion failed for '{}': {}", run.tags.title, e);
            return Err(e);
        }

        remove_if_exists(&raw);
        Ok(())
    }

    fn embed_cover(
        &self,
        flac: &mut FlacFile,
        url: &str,
    ) -> std::result::Result<(), SideStepError> {
        log::info!("Downloading cover...");
        let raw = self.covers.fetch_cover(url)?;
        let jpeg = prepare_cover(&raw)?;
        tagger::set_front_cover(flac, jpeg)
    }

    /// Tags and cover; every failure in here is logged and swallowed
    fn tag_output(&self, run: &PipelineRun) {
        let mut flac = match tagger::open_flac(&run.target) {
            Ok(flac) => flac,
            Err(e) => {
                log::warn!("Skipping tags for '{}': {}", run.tags.title, e);
                return;
            }
        };

        tagger::write_text_tags(&mut flac, &run.tags);

        match &run.cover_url {
            Some(url) => {
                tagger::clear_pictures(&mut flac);
                match self.embed_cover(&mut flac, url) {
                    Ok(()) => log::info!("Cover added for '{}'", run.tags.title),
                    Err(e) => log::warn!("No cover for '{}': {}", run.tags.title, e),
                }
            }
            None => log::debug!("No thumbnail for '{}'; skipping cover", run.tags.title),
        }

        match tagger::save_flac(&flac, &run.target) {
            Ok(()) => log::info!("Metadata saved for '{}'", run.tags.title),
            Err(e) => log::warn!("{} (keeping untagged file)", e),
        }
    }
}

impl<T: AudioTools, C: CoverSource> EntryPipeline for Pipeline<T, C> {
    fn run(&self, entry: &EntryDescriptor) -> Result<PathBuf> {
        let run = PipelineRun::new(entry, &self.download_dir)?;

        if run.target.exists() {
            log::info!(
                "File already exists, skipping download: {}",
                run.target.display()
            );
            return Ok(run.target);
        }

        let fetched = self.fetch_and_transcode(&run);
        self.cleanup_temporaries(&run);
        fetched?;

        self.tag_output(&run);

        let size = fs::metadata(&run.target).map(|m| m.len()).unwrap_or(0);
        log::info!(
            "FLAC ready: {} ({})",
            run.target.display(),
            format_size(size, DECIMAL)
        );
        Ok(run.target)
    }
}
