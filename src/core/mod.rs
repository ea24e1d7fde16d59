// Core business logic module

pub mod config;
pub mod cover;
pub mod dedup;
pub mod entry;
pub mod ffmpeg_manager;
pub mod lister;
pub mod naming;
pub mod pipeline;
pub mod stop;
pub mod tagger;
pub mod validation;
pub mod watcher;
pub mod yt_dlp_manager;

// Re-export commonly used items
pub use config::WatchConfig;
pub use dedup::DedupStore;
pub use entry::{EntryDescriptor, PlaylistSummary};
pub use lister::{EntrySource, YtDlpLister};
pub use pipeline::{AudioTools, EntryPipeline, ExternalTools, Pipeline};
pub use stop::StopSignal;
pub use watcher::{Watcher, WatchState};
