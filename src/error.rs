//! Butler Error Types
//!
//! One enum per failure family, plus a central error that wraps them all.

use std::path::PathBuf;
use thiserror::Error;

/// Unreadable or invalid configuration. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Malformed command payload. The message is dropped.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("payload is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("script list must be a JSON array of strings: {0}")]
    Scripts(#[source] serde_json::Error),

    #[error("volume must be an integer between 0 and 100, got {0:?}")]
    Volume(String),

    #[error("favorite slot must be an integer, got {0:?}")]
    Slot(String),

    #[error("sound name {0:?} is not a plain file name")]
    SoundName(String),

    #[error("nothing to say")]
    EmptySpeech,
}

/// Bus connectivity problem. Triggers a reconnect, never fatal.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("bus connection failed: {0}")]
    Connection(String),

    #[error("bus request rejected: {0}")]
    Request(String),

    #[error("not connected to the bus")]
    NotConnected,
}

/// Speech synthesis failure.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("voice model not found: {0:?}")]
    ModelMissing(PathBuf),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("speech cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Playback or mixer failure.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Central error type for Butler
#[derive(Error, Debug)]
pub enum ButlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error("task '{0}' stopped: {1}")]
    Task(&'static str, String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Butler operations
pub type ButlerResult<T> = Result<T, ButlerError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for ButlerError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        ButlerError::Lock(err.to_string())
    }
}
