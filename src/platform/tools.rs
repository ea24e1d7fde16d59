// External tool lookup
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchError};

/// Locate an executable.
///
/// An explicitly configured path must exist; otherwise the tool is searched on
/// PATH. Missing tools are reported before any work starts.
pub fn find_executable(name: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(WatchError::tool_not_found(format!(
            "{} not found at configured path {}",
            name,
            path.display()
        )));
    }

    which::which(name)
        .map_err(|e| WatchError::tool_not_found(format!("{} is not on PATH ({})", name, e)))
}
