//! Error types shared by every component

use std::path::PathBuf;
use thiserror::Error;

use crate::host::Severity;

/// Credential problems reported by the channel API check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No Credentials")]
    MissingCredentials,

    #[error("Wrong Credentials")]
    WrongCredentials,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid channel list: {0}")]
    Parse(String),

    #[error("Invalid EPG archive: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("PVR backend {0} is not available")]
    BackendUnavailable(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Cannot start refresh thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Severity used when the error is surfaced as a notification
    pub fn severity(&self) -> Severity {
        match self {
            Error::Network(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
