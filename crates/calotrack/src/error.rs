//! Error types for task composition, wiring and flag loading.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort adding a task.
///
/// Everything else (unknown calorimeter, data kind, trigger class) resolves to
/// a documented default and only logs a warning.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("No analysis manager to connect to")]
    NoManager,

    #[error("This task requires an input event handler")]
    NoInputHandler,

    #[error("Wiring failed: {0}")]
    Wiring(#[from] WiringError),
}

/// Connection errors raised by an execution manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WiringError {
    #[error("Unknown task id {0}")]
    UnknownTask(usize),

    #[error("Unknown container id {0}")]
    UnknownContainer(usize),

    #[error("{direction} slot {slot} of task '{task}' is already connected")]
    SlotTaken {
        task: String,
        slot: usize,
        direction: &'static str,
    },
}

/// Errors reading a flags file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read flags file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid flags file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
