//! Error types for the clock components.
//!
//! None of these end the process: each is handled where it occurs and turned
//! into a log line, an indicator state or a console message.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Loading or saving the persisted clock configuration failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A time-service refresh did not produce a usable time.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("time service request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("time service answered with status {0}")]
    Status(u16),

    #[error("time service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("malformed time service response: {0}")]
    Parse(String),
}

/// The step driver could not complete a pulse sequence.
#[derive(Error, Debug)]
pub enum DriverFault {
    #[error("{line} line failed: {reason}")]
    Line { line: &'static str, reason: String },
}

/// Operator input that could not be turned into a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid time '{0}', use HH:MM or HH:MM:SS")]
    InvalidTime(String),

    #[error("invalid minute count '{0}', use a positive number")]
    InvalidCount(String),

    #[error("invalid URL '{0}', it must start with http:// or https://")]
    InvalidUrl(String),
}
