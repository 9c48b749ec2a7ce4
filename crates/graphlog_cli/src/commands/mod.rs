//! CLI command implementations.

pub mod backup;
pub mod dump_log;
pub mod replay;
pub mod verify;

use crate::error::{CliError, CliResult};
use graphlog_core::{LogConfig, LogManager};
use std::path::Path;

/// Opens an existing log for reading.
///
/// [`LogManager::open`] creates missing files, so existence is checked first.
pub(crate) fn open_log(path: &Path) -> CliResult<LogManager> {
    if !path.is_file() {
        return Err(CliError::LogNotFound(path.to_path_buf()));
    }
    Ok(LogManager::open(path, LogConfig::new().sync_on_append(false))?)
}
