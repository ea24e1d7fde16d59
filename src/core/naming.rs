// Output file naming
use crate::core::entry::{EntryDescriptor, UNKNOWN_ARTIST, UNKNOWN_TITLE};

/// Maximum length of an output file name, in characters
pub const MAX_FILENAME_LEN: usize = 200;

pub const OUTPUT_EXTENSION: &str = "flac";

/// Make a display string safe for use as a file name component.
///
/// Path separators become `_`, anything other than alphanumerics, space, `.`,
/// `-` and `_` is dropped, one trailing dot is removed and runs of whitespace
/// collapse to a single space.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_'))
        .collect();

    let trimmed = kept.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten `filename` to at most `max_len` characters, cutting the stem only
pub fn trim_filename(filename: &str, max_len: usize) -> String {
    if filename.chars().count() <= max_len {
        return filename.to_string();
    }

    match filename.rsplit_once('.') {
        Some((stem, ext)) => {
            let keep = max_len.saturating_sub(ext.chars().count() + 1);
            let stem: String = stem.chars().take(keep).collect();
            format!("{}.{}", stem, ext)
        }
        None => filename.chars().take(max_len).collect(),
    }
}

/// `"<artist> - <title>.flac"`, sanitized and length-limited
pub fn output_file_name(entry: &EntryDescriptor) -> String {
    let artist = non_empty_or(sanitize_filename(entry.effective_artist()), UNKNOWN_ARTIST);
    let title = non_empty_or(sanitize_filename(entry.display_title()), UNKNOWN_TITLE);

    trim_filename(
        &format!("{} - {}.{}", artist, title, OUTPUT_EXTENSION),
        MAX_FILENAME_LEN,
    )
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
