use std::fs::OpenOptions;
use std::sync::Mutex;

use crate::config::Config;
use crate::core::error::JobDeckError;

/// Installs a file-backed subscriber when a log file is configured.
///
/// The UI owns stdout/stderr, so without `--log-file` events are discarded.
pub fn init(config: &Config) -> Result<(), JobDeckError> {
    let path = match &config.log_file {
        Some(path) => path,
        None => return Ok(()),
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| JobDeckError::InvalidConfig {
            message: format!("cannot open log file {}: {e}", path.display()),
        })?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| JobDeckError::InvalidConfig {
            message: format!("cannot install logger: {e}"),
        })
}
