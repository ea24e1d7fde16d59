// flacwatch library - public API

pub mod error;
pub use error::{Result, SideStepError, WatchError};

pub mod cli;
pub mod commands;
pub mod core;
pub mod platform;

pub use core::config::WatchConfig;

/// Initialize logging at Info, overridable through RUST_LOG
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
