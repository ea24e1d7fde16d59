//! Poll loop tying the lister, dedup store and pipeline together.
//!
//! Continuous mode is a small state machine:
//!
//! ```text
//! Polling --ok--> Sleeping(base) --> Polling
//! Polling --err-> Backoff(delay) --> Polling
//! any state --stop--> Stopped
//! ```
//!
//! The stop signal is checked before every transition, between entries and
//! during every sleep. An entry already in the pipeline is allowed to finish.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::dedup::DedupStore;
use crate::core::entry::{select_latest, EntryDescriptor};
use crate::core::lister::EntrySource;
use crate::core::pipeline::EntryPipeline;
use crate::core::stop::StopSignal;
use crate::error::{Result, WatchError};

/// Upper bound for the wait after failed polls
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Backoff stops doubling after this many consecutive failures
pub const MAX_BACKOFF_EXPONENT: u32 = 8;

pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Poll interval from milliseconds, never shorter than one second
pub fn base_interval(interval_ms: u64) -> Duration {
    Duration::from_millis(interval_ms).max(MIN_INTERVAL)
}

/// `min(MAX_BACKOFF, base * 2^min(errors, 8))`
pub fn backoff_delay(base: Duration, consecutive_errors: u32) -> Duration {
    let factor = 1u32 << consecutive_errors.min(MAX_BACKOFF_EXPONENT);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Polling,
    Sleeping(Duration),
    Backoff(Duration),
    Stopped,
}

/// What happened to one entry during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Downloaded(PathBuf),
    AlreadyDownloaded,
    MissingIdentifier,
    Failed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub listed: usize,
    pub downloaded: usize,
    pub already_downloaded: usize,
    pub missing_id: usize,
    pub failed: usize,
    pub interrupted: bool,
}

impl CycleReport {
    fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Downloaded(_) => self.downloaded += 1,
            EntryOutcome::AlreadyDownloaded => self.already_downloaded += 1,
            EntryOutcome::MissingIdentifier => self.missing_id += 1,
            EntryOutcome::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchStats {
    pub playlist_url: String,
    pub download_dir: PathBuf,
    pub interval_ms: u128,
    pub downloaded_count: usize,
    pub downloaded_ids: Vec<String>,
    pub consecutive_errors: u32,
    pub last_cycle_at: Option<DateTime<Local>>,
}

pub struct Watcher<S: EntrySource, P: EntryPipeline> {
    playlist_url: String,
    download_dir: PathBuf,
    interval: Duration,
    source: S,
    pipeline: P,
    store: DedupStore,
    stop: StopSignal,
    consecutive_errors: u32,
    last_cycle_at: Option<DateTime<Local>>,
}

impl<S: EntrySource, P: EntryPipeline> Watcher<S, P> {
    pub fn new(
        playlist_url: String,
        download_dir: PathBuf,
        interval: Duration,
        source: S,
        pipeline: P,
        store: DedupStore,
        stop: StopSignal,
    ) -> Self {
        Self {
            playlist_url,
            download_dir,
            interval: interval.max(MIN_INTERVAL),
            source,
            pipeline,
            store,
            stop,
            consecutive_errors: 0,
            last_cycle_at: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DedupStore {
        &mut self.store
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn stats(&self) -> WatchStats {
        WatchStats {
            playlist_url: self.playlist_url.clone(),
            download_dir: self.download_dir.clone(),
            interval_ms: self.interval.as_millis(),
            downloaded_count: self.store.len(),
            downloaded_ids: self.store.ids(),
            consecutive_errors: self.consecutive_errors,
            last_cycle_at: self.last_cycle_at,
        }
    }

    /// Stats as one JSON line at debug level
    pub fn stats_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.stats())?)
    }

    fn log_stats(&self) {
        match self.stats_json() {
            Ok(json) => log::debug!("Watcher stats: {}", json),
            Err(e) => log::debug!("Could not serialize watcher stats: {}", e),
        }
    }

    pub fn log_startup(&self) {
        log::info!("Watching playlist: {}", self.playlist_url);
        log::info!("Download directory: {}", self.download_dir.display());
        log::info!("Poll interval: {}ms", self.interval.as_millis());
        log::info!("{} entries already downloaded", self.store.len());
        self.log_stats();
    }

    /// Run continuous mode until the stop signal fires
    pub fn run(&mut self) {
        log::info!("Starting playlist watch...");
        let mut state = WatchState::Polling;
        while state != WatchState::Stopped {
            state = self.step(state);
        }
        log::info!("Watcher stopped");
    }

    /// Perform one state transition
    pub fn step(&mut self, state: WatchState) -> WatchState {
        if self.stop.is_stopped() {
            return WatchState::Stopped;
        }

        match state {
            WatchState::Polling => match self.poll_cycle() {
                Ok(report) => {
                    self.consecutive_errors = 0;
                    log::debug!("Cycle finished: {:?}", report);
                    self.log_stats();
                    WatchState::Sleeping(self.interval)
                }
                Err(e) => {
                    self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                    let delay = backoff_delay(self.interval, self.consecutive_errors);
                    log::error!(
                        "Poll failed ({} in a row): {}. Retrying in {:.1}s",
                        self.consecutive_errors,
                        e,
                        delay.as_secs_f64()
                    );
                    WatchState::Backoff(delay)
                }
            },
            WatchState::Sleeping(wait) | WatchState::Backoff(wait) => {
                if self.stop.sleep(wait) {
                    WatchState::Stopped
                } else {
                    WatchState::Polling
                }
            }
            WatchState::Stopped => WatchState::Stopped,
        }
    }

    /// List the playlist once and run every new entry through the pipeline.
    ///
    /// Only a listing failure is an `Err`; entry failures are counted in the
    /// report and retried on the next cycle.
    pub fn poll_cycle(&mut self) -> Result<CycleReport> {
        log::info!("Checking playlist for new entries...");
        let entries = self.source.list_entries(&self.playlist_url)?;

        let mut report = CycleReport {
            listed: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            if self.stop.is_stopped() {
                log::info!("Stop requested; leaving the rest of this cycle");
                report.interrupted = true;
                break;
            }
            let outcome = self.process_entry(entry);
            report.record(&outcome);
        }

        self.last_cycle_at = Some(Local::now());
        Ok(report)
    }

    pub fn process_entry(&mut self, entry: &EntryDescriptor) -> EntryOutcome {
        let Some(id) = entry.id.as_deref() else {
            log::warn!("No id found for {}; skipping", entry.label());
            return EntryOutcome::MissingIdentifier;
        };

        if self.store.contains(id) {
            return EntryOutcome::AlreadyDownloaded;
        }

        log::info!("New entry detected: {}", entry.label());
        match self.pipeline.run(entry) {
            Ok(path) => {
                self.store.record(id);
                log::info!("Download complete: {}", entry.label());
                EntryOutcome::Downloaded(path)
            }
            Err(e) => {
                log::error!("Could not download {}: {}", entry.label(), e);
                EntryOutcome::Failed
            }
        }
    }

    /// Single-shot mode: download only the most recent entry
    pub fn run_latest(&mut self) -> Result<EntryDescriptor> {
        log::info!("Looking up the latest playlist entry...");
        let entries = self.source.list_entries(&self.playlist_url)?;

        let Some(latest) = select_latest(&entries) else {
            log::warn!("No entries found in the playlist");
            return Err(WatchError::EmptyPlaylist);
        };
        let Some(id) = latest.id.as_deref() else {
            log::warn!("No id found for {}", latest.label());
            return Err(WatchError::MissingIdentifier {
                title: latest.display_title().to_string(),
            });
        };

        log::info!("Downloading latest entry: {}", latest.label());
        match self.pipeline.run(latest) {
            Ok(_) => {
                self.store.record(id);
                log::info!("Download complete: {}", latest.label());
                Ok(latest.clone())
            }
            Err(e) => {
                log::error!("Could not download {}: {}", latest.label(), e);
                Err(e)
            }
        }
    }
}
