use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no writable location for the crash report")]
    NoStorage,

    #[error("string is not valid for the native boundary: {0}")]
    InvalidString(String),

    #[error("transport refused the crash report: {0}")]
    Transport(String),

    #[error("first-run setup failed in {}", .0.display())]
    FirstRun(PathBuf),
}

impl BridgeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BridgeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
