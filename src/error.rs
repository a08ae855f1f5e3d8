//! Error types
//!
//! Nothing in the core is fatal: persistence errors are recovered by the
//! `load_*_or_default` wrappers and timer errors just report a transition
//! that was not allowed.

use std::path::PathBuf;

use crate::sim::BodyId;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized snapshot header {found:?}, expected {expected:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("snapshot version {found} is not supported (current is {current})")]
    UnsupportedVersion { found: u16, current: u16 },

    #[error("snapshot truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(String),

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("a session is already active")]
    AlreadyActive,

    #[error("session duration must be greater than zero")]
    ZeroDuration,

    #[error("no session is running")]
    NotRunning,

    #[error("session is not paused")]
    NotPaused,

    #[error("body {0} cannot be cleaned")]
    NoSuchBody(BodyId),
}
