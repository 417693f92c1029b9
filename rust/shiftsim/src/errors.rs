use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShiftSimError {
    /// Invalid configuration, always fatal for the whole run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A shift table row that could not be interpreted.
    #[error("Malformed shift record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Malformed peak list record on line {line}: {reason}")]
    MalformedPeakList { line: u64, reason: String },

    #[error("Invalid UCSF spectrum file: {0}")]
    InvalidSpectrumFile(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
}

impl ShiftSimError {
    pub fn config(msg: impl std::fmt::Display) -> Self {
        Self::Configuration(msg.to_string())
    }

    pub(crate) fn io_at(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for ShiftSimError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, path: None }
    }
}

pub type Result<T> = std::result::Result<T, ShiftSimError>;
