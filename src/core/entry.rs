// Playlist entry descriptors as reported by the listing tool
use serde_json::Value;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Prefix used when an entry carries no album of its own
const ALBUM_SOURCE: &str = "YouTube";

/// One playlist item.
///
/// Every field is optional because flat listings routinely omit most of them.
/// Accessors apply the fallbacks used for naming and tagging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub channel: Option<String>,
    pub uploader: Option<String>,
    pub album: Option<String>,
    pub upload_date: Option<String>,
    pub thumbnail: Option<String>,
}

impl EntryDescriptor {
    /// Build a descriptor from one JSON object of the listing output.
    ///
    /// Returns `None` for anything that is not an object (yt-dlp emits `null`
    /// for entries it could not resolve with `--ignore-errors`).
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        // Flat listings carry a `thumbnails` array instead of `thumbnail`;
        // the last one is the largest.
        let thumbnail = text("thumbnail").or_else(|| {
            obj.get("thumbnails")
                .and_then(Value::as_array)
                .and_then(|thumbs| {
                    thumbs
                        .iter()
                        .rev()
                        .find_map(|t| t.get("url").and_then(Value::as_str))
                })
                .map(str::to_string)
        });

        Some(Self {
            id: text("id"),
            title: text("title"),
            artist: text("artist"),
            channel: text("channel"),
            uploader: text("uploader"),
            album: text("album"),
            upload_date: text("upload_date"),
            thumbnail,
        })
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }

    /// First non-empty of artist, channel, uploader
    pub fn effective_artist(&self) -> &str {
        self.artist
            .as_deref()
            .or(self.channel.as_deref())
            .or(self.uploader.as_deref())
            .unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn effective_album(&self) -> String {
        match &self.album {
            Some(album) => album.clone(),
            None => format!("{} - {}", ALBUM_SOURCE, self.effective_artist()),
        }
    }

    /// Four-digit year taken from the start of `upload_date` (YYYYMMDD)
    pub fn year(&self) -> Option<String> {
        let date = self.upload_date.as_deref()?;
        let year: String = date.chars().take(4).collect();
        if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
            Some(year)
        } else {
            None
        }
    }

    /// Page URL handed to the fetch tool
    pub fn watch_url(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(|id| format!("https://www.youtube.com/watch?v={}", id))
    }

    /// Label for log lines: title plus id when known
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("'{}' [{}]", self.display_title(), id),
            None => format!("'{}'", self.display_title()),
        }
    }
}

/// Pick the most recent entry for single-shot mode.
///
/// The greatest `upload_date` wins; the first entry in listing order wins ties.
/// With no dated entries at all, the first entry is returned.
pub fn select_latest(entries: &[EntryDescriptor]) -> Option<&EntryDescriptor> {
    let mut latest: Option<&EntryDescriptor> = None;
    for entry in entries {
        let Some(date) = entry.upload_date.as_deref() else {
            continue;
        };
        match latest.and_then(|l| l.upload_date.as_deref()) {
            Some(best) if date <= best => {}
            _ => latest = Some(entry),
        }
    }
    latest.or_else(|| entries.first())
}

/// Informational summary of a playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub title: String,
    pub owner: String,
    pub entry_count: usize,
    pub description: String,
    pub upload_date: String,
}

impl PlaylistSummary {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str, default: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        Some(Self {
            title: text("title", "Unknown Playlist"),
            owner: text("uploader", "Unknown"),
            entry_count: obj
                .get("entries")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
            description: text("description", ""),
            upload_date: text("upload_date", ""),
        })
    }
}
