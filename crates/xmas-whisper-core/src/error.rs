//! Core error types for xmas-whisper-core.
//!
//! Every failure in the calendar has a degraded-but-functional outcome, so
//! most of these errors are logged and recovered close to where they occur.
//! The ones that reach callers are locked days, configuration mistakes and
//! offline fetches with nothing cached to fall back on.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for xmas-whisper-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Postcard generation errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Offline cache and fetch errors
    #[error("Offline error: {0}")]
    Offline(#[from] OfflineError),

    /// Calendar gating errors
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures of the external postcard generator.
///
/// None of these reach the calendar view: the content cache substitutes the
/// fallback postcard for every variant.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No API key in the environment or keyring
    #[error("Gemini API key not configured")]
    MissingApiKey,

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("Gemini API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Response had no usable candidate text
    #[error("Empty response from model '{model}'")]
    EmptyResponse { model: String },

    /// Response text was not the expected JSON
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required postcard field was absent or blank
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// Generation task ended without delivering a result
    #[error("Generation task for day {day} was aborted")]
    Aborted { day: u32 },
}

/// Offline interceptor errors.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// Live fetch failed and nothing was cached for the request
    #[error("Network unavailable and no cached response for {url}")]
    NetworkUnavailable { url: String },

    /// Live fetch failed
    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    /// Shell entry could not be resolved against the origin
    #[error("Invalid shell URL '{0}'")]
    InvalidUrl(String),

    /// Backing cache storage failed
    #[error("Cache storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Day gating errors. Returned before any side effect happens.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalendarError {
    /// Day is outside 1..=25
    #[error("Day {0} is not an advent day (1-25)")]
    InvalidDay(i64),

    /// Day has not been unlocked yet
    #[error("Day {day} is locked (unlocked through day {unlocked})")]
    Locked { day: u32, unlocked: i64 },

    /// Onboarding has not been completed
    #[error("No profile description set; complete onboarding first")]
    MissingProfile,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
