use nvml_wrapper::error::NvmlError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write snapshot: {0}")]
    Write(#[source] std::io::Error),
    #[error("NVML error occurred: {0}")]
    Nvml(#[from] NvmlError),
    #[error("Failed to read fixture {path}: {source}")]
    FixtureRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
