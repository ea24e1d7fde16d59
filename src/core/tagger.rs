//! FLAC tag writing.
//!
//! Works on lofty's `FlacFile` directly so Vorbis comment keys are written
//! verbatim (`DATE`, `ORIGINALYEAR`) instead of going through the generic
//! item-key mapping.

use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::flac::FlacFile;
use lofty::ogg::{OggPictureStorage, VorbisComments};
use lofty::picture::{Picture, PictureType};
use std::fs::File;
use std::path::Path;

use crate::core::entry::EntryDescriptor;
use crate::error::SideStepError;

/// Text tags derived from an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: Option<String>,
}

impl TrackTags {
    pub fn from_entry(entry: &EntryDescriptor) -> Self {
        Self {
            title: entry.display_title().to_string(),
            artist: entry.effective_artist().to_string(),
            album: entry.effective_album(),
            year: entry.year(),
        }
    }
}

pub fn open_flac(path: &Path) -> Result<FlacFile, SideStepError> {
    let mut file = File::open(path)
        .map_err(|e| SideStepError::tag(format!("could not open {}: {}", path.display(), e)))?;
    // Audio properties are not needed for tagging
    FlacFile::read_from(&mut file, ParseOptions::new().read_properties(false))
        .map_err(|e| SideStepError::tag(format!("could not read {}: {}", path.display(), e)))
}

/// Set title, artist, album and, when known, the year as both date and original year
pub fn write_text_tags(flac: &mut FlacFile, tags: &TrackTags) {
    if flac.vorbis_comments().is_none() {
        flac.set_vorbis_comments(VorbisComments::default());
    }
    let Some(comments) = flac.vorbis_comments_mut() else {
        return;
    };

    comments.insert("TITLE".to_string(), tags.title.clone());
    comments.insert("ARTIST".to_string(), tags.artist.clone());
    comments.insert("ALBUM".to_string(), tags.album.clone());
    if let Some(year) = &tags.year {
        comments.insert("DATE".to_string(), year.clone());
        comments.insert("ORIGINALYEAR".to_string(), year.clone());
    }
}

/// Drop every embedded picture so re-tagging never stacks covers
pub fn clear_pictures(flac: &mut FlacFile) {
    let mut types: Vec<PictureType> = flac.pictures().iter().map(|(p, _)| p.pic_type()).collect();
    types.dedup();
    for picture_type in types {
        flac.remove_picture_type(picture_type);
    }
}

/// Embed already-encoded JPEG bytes as the front cover
pub fn set_front_cover(flac: &mut FlacFile, jpeg: Vec<u8>) -> Result<(), SideStepError> {
    let mut picture = Picture::from_reader(&mut jpeg.as_slice())
        .map_err(|e| SideStepError::cover(format!("invalid picture data: {}", e)))?;
    picture.set_pic_type(PictureType::CoverFront);

    flac.remove_picture_type(PictureType::CoverFront);
    flac.insert_picture(picture, None)
        .map(|_| ())
        .map_err(|e| SideStepError::cover(format!("could not embed picture: {}", e)))
}

pub fn save_flac(flac: &FlacFile, path: &Path) -> Result<(), SideStepError> {
    flac.save_to_path(path, WriteOptions::default()).map_err(|e| {
        SideStepError::tag(format!("could not save tags to {}: {}", path.display(), e))
    })
}

/// Minimal FLAC stream (STREAMINFO only, no frames) for tests
#[cfg(test)]
pub(crate) fn empty_flac_bytes() -> Vec<u8> {
    let mut bytes = b"fLaC".to_vec();
    // last-block flag + STREAMINFO, length 34
    bytes.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    // min/max block size 4096
    bytes.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]);
    // min/max frame size unknown
    bytes.extend_from_slice(&[0x00; 6]);
    // 44100 Hz, 2 channels, 16 bits, 0 samples
    bytes.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x00, 0x00, 0x00]);
    // MD5
    bytes.extend_from_slice(&[0x00; 16]);
    bytes
}
