use marketpulse_core::{SourceError, SourceErrorKind, StoreError, ValidationError, WatchlistError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<WatchlistError> for CliError {
    fn from(error: WatchlistError) -> Self {
        match error {
            WatchlistError::Source(error) => Self::Source(error),
            WatchlistError::Store(error) => Self::Store(error),
            WatchlistError::Validation(error) => Self::Validation(error),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Source(error) => match error.kind() {
                SourceErrorKind::InvalidRequest => 2,
                SourceErrorKind::MissingApiKey => 7,
                _ => 3,
            },
            Self::Serialization(_) => 4,
            Self::Store(_) | Self::Io(_) => 10,
        }
    }
}
