// Integration tests for the poll loop: dedup across cycles, entry failure
// isolation, backoff on listing failure and cooperative stop

use flacwatch::core::dedup::DedupStore;
use flacwatch::core::entry::EntryDescriptor;
use flacwatch::core::lister::EntrySource;
use flacwatch::core::pipeline::EntryPipeline;
use flacwatch::core::stop::StopSignal;
use flacwatch::core::watcher::{backoff_delay, EntryOutcome, WatchState, Watcher};
use flacwatch::{Result, WatchError};
use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const PLAYLIST: &str = "https://music.youtube.com/playlist?list=PLtest";

struct ScriptedSource {
    responses: RefCell<VecDeque<Result<Vec<EntryDescriptor>>>>,
    fallback: Vec<EntryDescriptor>,
    calls: Cell<usize>,
}

impl ScriptedSource {
    fn always(entries: Vec<EntryDescriptor>) -> Self {
        Self {
            responses: RefCell::new(VecDeque::new()),
            fallback: entries,
            calls: Cell::new(0),
        }
    }

    fn scripted(
        responses: Vec<Result<Vec<EntryDescriptor>>>,
        fallback: Vec<EntryDescriptor>,
    ) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().collect()),
            fallback,
            calls: Cell::new(0),
        }
    }
}

impl EntrySource for ScriptedSource {
    fn list_entries(&self, _playlist_url: &str) -> Result<Vec<EntryDescriptor>> {
        self.calls.set(self.calls.get() + 1);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

struct RecordingPipeline {
    dir: PathBuf,
    runs: RefCell<Vec<String>>,
    failing: HashSet<String>,
    stop_after_run: Option<StopSignal>,
}

impl RecordingPipeline {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            runs: RefCell::new(Vec::new()),
            failing: HashSet::new(),
            stop_after_run: None,
        }
    }

    fn failing(dir: &Path, ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::new(dir)
        }
    }

    fn runs(&self) -> Vec<String> {
        self.runs.borrow().clone()
    }
}

impl EntryPipeline for RecordingPipeline {
    fn run(&self, entry: &EntryDescriptor) -> Result<PathBuf> {
        let id = entry.id.clone().unwrap_or_default();
        self.runs.borrow_mut().push(id.clone());
        if let Some(stop) = &self.stop_after_run {
            stop.stop();
        }
        if self.failing.contains(&id) {
            return Err(WatchError::fetch(id, "ERROR: Video unavailable"));
        }
        Ok(self.dir.join(format!("{}.flac", id)))
    }
}

fn entry(id: &str) -> EntryDescriptor {
    EntryDescriptor {
        id: Some(id.to_string()),
        title: Some(format!("Song {}", id)),
        ..Default::default()
    }
}

fn watcher<S: EntrySource, P: EntryPipeline>(
    dir: &Path,
    source: S,
    pipeline: P,
    stop: StopSignal,
) -> Watcher<S, P> {
    Watcher::new(
        PLAYLIST.to_string(),
        dir.to_path_buf(),
        Duration::from_secs(1),
        source,
        pipeline,
        DedupStore::load_from_dir(dir),
        stop,
    )
}

#[test]
fn test_each_id_runs_once_across_cycles() {
    let temp_dir = TempDir::new().unwrap();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a"), entry("b")]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );

    for _ in 0..3 {
        watcher.poll_cycle().unwrap();
    }

    assert_eq!(watcher.pipeline().runs(), vec!["a", "b"]);
    assert_eq!(watcher.store().ids(), vec!["a", "b"]);

    let reloaded = DedupStore::load_from_dir(temp_dir.path());
    assert!(reloaded.contains("a") && reloaded.contains("b"));
}

#[test]
fn test_entries_run_in_listing_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("z"), entry("m"), entry("a")]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );

    watcher.poll_cycle().unwrap();

    assert_eq!(watcher.pipeline().runs(), vec!["z", "m", "a"]);
}

#[test]
fn test_failed_entry_does_not_abort_cycle_and_is_retried() {
    let temp_dir = TempDir::new().unwrap();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a"), entry("b")]),
        RecordingPipeline::failing(temp_dir.path(), &["a"]),
        StopSignal::new(),
    );

    let first = watcher.poll_cycle().unwrap();
    assert_eq!(first.failed, 1);
    assert_eq!(first.downloaded, 1);

    let second = watcher.poll_cycle().unwrap();
    assert_eq!(second.failed, 1);
    assert_eq!(second.already_downloaded, 1);

    assert_eq!(watcher.pipeline().runs(), vec!["a", "b", "a"]);
    assert!(!watcher.store().contains("a"));
    assert!(watcher.store().contains("b"));
}

#[test]
fn test_entry_without_id_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let nameless = EntryDescriptor {
        title: Some("Private video".to_string()),
        ..Default::default()
    };
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![nameless.clone(), entry("c")]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );

    assert_eq!(watcher.process_entry(&nameless), EntryOutcome::MissingIdentifier);
    let report = watcher.poll_cycle().unwrap();

    assert_eq!(report.missing_id, 1);
    assert_eq!(watcher.pipeline().runs(), vec!["c"]);
    assert_eq!(watcher.store().ids(), vec!["c"]);
}

#[test]
fn test_listing_failures_back_off_then_reset() {
    let temp_dir = TempDir::new().unwrap();
    let source = ScriptedSource::scripted(
        vec![
            Err(WatchError::listing("network down")),
            Err(WatchError::listing("network down")),
            Err(WatchError::listing("network down")),
        ],
        vec![entry("a")],
    );
    let mut watcher = watcher(
        temp_dir.path(),
        source,
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );
    let base = Duration::from_secs(1);

    assert_eq!(watcher.step(WatchState::Polling), WatchState::Backoff(Duration::from_secs(2)));
    assert_eq!(watcher.step(WatchState::Polling), WatchState::Backoff(Duration::from_secs(4)));
    assert_eq!(watcher.step(WatchState::Polling), WatchState::Backoff(Duration::from_secs(8)));
    assert_eq!(watcher.consecutive_errors(), 3);
    assert_eq!(backoff_delay(base, 3), Duration::from_secs(8));

    assert_eq!(watcher.step(WatchState::Polling), WatchState::Sleeping(base));
    assert_eq!(watcher.consecutive_errors(), 0);
    assert_eq!(watcher.pipeline().runs(), vec!["a"]);
}

#[test]
fn test_backoff_for_minute_interval_hits_cap() {
    let base = Duration::from_secs(60);
    assert_eq!(backoff_delay(base, 1), Duration::from_secs(120));
    assert_eq!(backoff_delay(base, 2), Duration::from_secs(240));
    assert_eq!(backoff_delay(base, 3), Duration::from_secs(300));
    assert_eq!(backoff_delay(base, 12), Duration::from_secs(300));
}

#[test]
fn test_stop_interrupts_sleep() {
    let temp_dir = TempDir::new().unwrap();
    let stop = StopSignal::new();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![]),
        RecordingPipeline::new(temp_dir.path()),
        stop.clone(),
    );

    let remote = stop.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        remote.stop();
    });

    let start = Instant::now();
    let next = watcher.step(WatchState::Sleeping(Duration::from_secs(120)));

    assert_eq!(next, WatchState::Stopped);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_run_returns_immediately_when_already_stopped() {
    let temp_dir = TempDir::new().unwrap();
    let stop = StopSignal::new();
    stop.stop();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a")]),
        RecordingPipeline::new(temp_dir.path()),
        stop,
    );

    watcher.run();

    assert_eq!(watcher.source().calls.get(), 0);
    assert!(watcher.pipeline().runs().is_empty());
}

#[test]
fn test_stop_finishes_current_entry_then_leaves_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let stop = StopSignal::new();
    let pipeline = RecordingPipeline {
        stop_after_run: Some(stop.clone()),
        ..RecordingPipeline::new(temp_dir.path())
    };
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a"), entry("b")]),
        pipeline,
        stop,
    );

    let report = watcher.poll_cycle().unwrap();

    assert!(report.interrupted);
    assert_eq!(watcher.pipeline().runs(), vec!["a"]);
    assert!(watcher.store().contains("a"));
    assert_eq!(watcher.step(WatchState::Sleeping(Duration::from_secs(60))), WatchState::Stopped);
}

#[test]
fn test_persisted_state_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut first = watcher(
            temp_dir.path(),
            ScriptedSource::always(vec![entry("a")]),
            RecordingPipeline::new(temp_dir.path()),
            StopSignal::new(),
        );
        first.poll_cycle().unwrap();
    }

    let mut second = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a"), entry("b")]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );
    second.poll_cycle().unwrap();

    assert_eq!(second.pipeline().runs(), vec!["b"]);
    assert_eq!(second.stats().downloaded_count, 2);
}

#[test]
fn test_run_latest_selects_newest_upload() {
    let temp_dir = TempDir::new().unwrap();
    let dated = |id: &str, date: Option<&str>| EntryDescriptor {
        upload_date: date.map(str::to_string),
        ..entry(id)
    };
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![
            dated("a", Some("20230101")),
            dated("b", Some("20230315")),
            dated("c", None),
        ]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );

    let latest = watcher.run_latest().unwrap();

    assert_eq!(latest.id.as_deref(), Some("b"));
    assert_eq!(watcher.pipeline().runs(), vec!["b"]);
    assert!(watcher.store().contains("b"));
}

#[test]
fn test_run_latest_on_empty_playlist() {
    let temp_dir = TempDir::new().unwrap();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );

    assert!(matches!(watcher.run_latest(), Err(WatchError::EmptyPlaylist)));
}

#[test]
fn test_run_latest_failure_is_not_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a")]),
        RecordingPipeline::failing(temp_dir.path(), &["a"]),
        StopSignal::new(),
    );

    assert!(matches!(watcher.run_latest(), Err(WatchError::FetchFailed { .. })));
    assert!(watcher.store().is_empty());
}

#[test]
fn test_stats_serialize_after_a_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let mut watcher = watcher(
        temp_dir.path(),
        ScriptedSource::always(vec![entry("a"), entry("b")]),
        RecordingPipeline::new(temp_dir.path()),
        StopSignal::new(),
    );
    let stats = |w: &Watcher<ScriptedSource, RecordingPipeline>| -> serde_json::Value {
        serde_json::from_str(&w.stats_json().unwrap()).unwrap()
    };
    let before = stats(&watcher);
    assert!(before["last_cycle_at"].is_null());

    watcher.poll_cycle().unwrap();

    let after = stats(&watcher);
    assert_eq!(after["downloaded_count"], 2);
    assert_eq!(after["downloaded_ids"], serde_json::json!(["a", "b"]));
    assert_eq!(after["playlist_url"], PLAYLIST);
    assert!(after["last_cycle_at"].is_string());
}
