use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobDeckError {
    #[error("failed to read job snapshot {path}: {message}")]
    SnapshotRead { path: PathBuf, message: String },
    #[error("failed to parse job snapshot {path}: {message}")]
    SnapshotParse { path: PathBuf, message: String },
    #[error("failed to write job snapshot {path}: {message}")]
    SnapshotWrite { path: PathBuf, message: String },
    #[error("job not found: {id}")]
    JobNotFound { id: String },
    #[error("invalid days to keep: {days} (use -1, 0 or a positive number)")]
    InvalidRetention { days: i64 },
    #[error("job store unavailable: {message}")]
    StoreUnavailable { message: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("invalid command: {message}")]
    InvalidCommand { message: String },
    #[error("terminal error: {message}")]
    Terminal { message: String },
}
