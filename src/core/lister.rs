//! Playlist listing
//!
//! Turns the JSON printed by the listing tool into [`EntryDescriptor`]s. The
//! tool answers in one of three shapes and each is tried in a fixed order:
//!
//! 1. one aggregate object with an `entries` array,
//! 2. newline-delimited objects, one entry per line,
//! 3. a single object describing one item.
//!
//! Output that matches none of them yields zero entries.

use serde_json::{Map, Value};

use crate::core::entry::{EntryDescriptor, PlaylistSummary};
use crate::core::yt_dlp_manager::YtDlpManager;
use crate::error::Result;

/// Source of playlist entries polled by the watcher.
///
/// An `Err` means the poll itself failed and is counted towards backoff.
pub trait EntrySource {
    fn list_entries(&self, playlist_url: &str) -> Result<Vec<EntryDescriptor>>;
}

/// Recognised shapes of listing output
#[derive(Debug, PartialEq)]
pub enum ListingShape {
    Aggregate(Vec<Value>),
    LineDelimited(Vec<Value>),
    SingleItem(Value),
}

impl ListingShape {
    pub fn parse(stdout: &str) -> Option<Self> {
        Self::aggregate(stdout)
            .or_else(|| Self::line_delimited(stdout))
            .or_else(|| Self::single_item(stdout))
    }

    fn aggregate(stdout: &str) -> Option<Self> {
        let mut obj: Map<String, Value> = serde_json::from_str(stdout.trim()).ok()?;
        match obj.remove("entries") {
            Some(Value::Array(entries)) => Some(ListingShape::Aggregate(entries)),
            _ => None,
        }
    }

    fn line_delimited(stdout: &str) -> Option<Self> {
        let mut items = Vec::new();
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let value: Value = serde_json::from_str(line).ok()?;
            if !value.is_object() {
                return None;
            }
            items.push(value);
        }
        // At least one line must describe an item; a lone `{"error": ..}` is not a listing
        if items.iter().any(|item| item.get("id").is_some()) {
            Some(ListingShape::LineDelimited(items))
        } else {
            None
        }
    }

    fn single_item(stdout: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(stdout.trim()).ok()?;
        if value.get("id").is_some() {
            Some(ListingShape::SingleItem(value))
        } else {
            None
        }
    }

    pub fn into_entries(self) -> Vec<EntryDescriptor> {
        let values = match self {
            ListingShape::Aggregate(values) | ListingShape::LineDelimited(values) => values,
            ListingShape::SingleItem(value) => vec![value],
        };
        values.iter().filter_map(EntryDescriptor::from_value).collect()
    }
}

/// Normalise raw listing output; unparseable input is an empty listing
pub fn parse_listing_output(stdout: &str) -> Vec<EntryDescriptor> {
    ListingShape::parse(stdout)
        .map(ListingShape::into_entries)
        .unwrap_or_default()
}

/// Entry lister backed by yt-dlp.
///
/// Never fails: any problem running the tool is logged and produces an empty
/// listing, matching yt-dlp's own `--ignore-errors` behaviour for single entries.
pub struct YtDlpLister {
    manager: YtDlpManager,
}

impl YtDlpLister {
    pub fn new(manager: YtDlpManager) -> Self {
        Self { manager }
    }

    pub fn list(&self, playlist_url: &str) -> Vec<EntryDescriptor> {
        let output = match self.manager.dump_playlist_json(playlist_url, true) {
            Ok(output) => output,
            Err(e) => {
                log::error!("Could not list playlist {}: {}", playlist_url, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            // Non-zero is normal when some entries are unavailable; stdout
            // still carries the rest.
            log::warn!(
                "yt-dlp reported errors while listing ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let entries = parse_listing_output(&String::from_utf8_lossy(&output.stdout));
        log::info!("Fetched {} entries from the playlist", entries.len());
        entries
    }

    /// Playlist-level metadata; empty summary on any error
    pub fn playlist_summary(&self, playlist_url: &str) -> PlaylistSummary {
        let output = match self.manager.dump_playlist_json(playlist_url, false) {
            Ok(output) => output,
            Err(e) => {
                log::error!("Could not read playlist info: {}", e);
                return PlaylistSummary::default();
            }
        };

        let parsed: std::result::Result<Value, _> = serde_json::from_slice(&output.stdout);
        match parsed {
            Ok(value) => PlaylistSummary::from_value(&value).unwrap_or_default(),
            Err(e) => {
                log::error!("Could not parse playlist info: {}", e);
                PlaylistSummary::default()
            }
        }
    }
}

impl EntrySource for YtDlpLister {
    fn list_entries(&self, playlist_url: &str) -> Result<Vec<EntryDescriptor>> {
        Ok(self.list(playlist_url))
    }
}
