use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur in the audio system.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to initialize audio backend: {0}")]
    InitFailed(String),

    #[error("I/O error reading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("sound '{0}' not found in archive")]
    NotInArchive(String),

    #[error("sound '{0}' has zero length")]
    EmptySound(String),

    #[error("archive ordinal {0} is out of range")]
    OrdinalOutOfRange(usize),

    #[error("failed to decompress '{name}': {reason}")]
    Decompress { name: String, reason: String },

    #[error("sound table holds {declared} records but only {available} fit in its data")]
    TruncatedTable { declared: usize, available: usize },

    #[error("sound catalog has no entries")]
    EmptyCatalog,

    #[error("sound table revision is not supported ({0} records present)")]
    UnsupportedCatalogFormat(usize),

    #[error("failed to decode audio data: {0}")]
    DecodeFailed(String),

    #[error("music track '{0}' not found")]
    TrackNotFound(PathBuf),

    #[error("sounds still playing after {0:?}")]
    DrainTimeout(Duration),
}
