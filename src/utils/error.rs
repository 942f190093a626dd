//! Error handling for omled

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Editor core error
#[derive(Error, Debug)]
pub enum Error {
    // ==================== Interpreter Errors ====================

    #[error("OML interpreter not found: {0}")]
    InterpreterNotFound(String),

    #[error("Could not extract OML interpreter: {0}")]
    Extraction(#[source] std::io::Error),

    #[error("Error starting process: {0}")]
    Spawn(#[source] std::io::Error),

    // ==================== Session Errors ====================

    #[error("A program is already running")]
    AlreadyRunning,

    #[error("No program is running")]
    NotRunning,

    #[error("The buffer has no file path yet")]
    NoFilePath,

    // ==================== File Errors ====================

    #[error("Error reading file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error saving file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Settings / Config Errors ====================

    #[error("Invalid settings file: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Whether the error happened before the interpreter process existed
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            Self::InterpreterNotFound(_) | Self::Extraction(_) | Self::Spawn(_)
        )
    }
}
