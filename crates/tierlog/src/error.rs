use std::path::PathBuf;
use thiserror::Error;

use crate::queue::QueueError;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Invalid logger configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn writer thread: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write log file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to enqueue log event: {0}")]
    Enqueue(#[from] QueueError),

    #[error("Writer thread panicked before finishing")]
    WorkerPanicked,
}
