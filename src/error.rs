use std::path::PathBuf;

use crate::strategy::KeyKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on file {}: {source}", .path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid key '{value}' on line {line}: {reason}")]
    InvalidKey {
        line: usize,
        value: String,
        reason: String,
    },

    #[error("Batch holds {expected} keys, got a {found} key")]
    KeyKindMismatch { expected: KeyKind, found: KeyKind },

    #[error("The batch size must be positive")]
    InvalidBatchSize,

    #[error("Unable to setup tracing: {0}")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Unable to forward log records: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { source, path }
    }
}
