//! Error Types
//!
//! This module defines the error types used throughout the editor core.
//!
//! # Overview
//!
//! Media loading failures are modelled separately from the crate-wide
//! [`Error`] because they never escape a property setter:
//!
//! - [`ResolutionError`]: a source reference could not be resolved
//! - [`FetchError`]: the resolved resource could not be transported or decoded
//! - [`LoadFailure`]: what ended a single load attempt (including timeouts)
//! - [`MediaLoadError`]: the user-facing wrapper handed to error callbacks
//!
//! [`Error`] covers everything that *is* returned to callers, most notably
//! [`Error::Configuration`] when a node is constructed before the shared
//! models it depends on have been loaded.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_editor::errors::Result;
//!
//! fn build() -> Result<()> {
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Media Errors
// ============================================================================

/// A source reference could not be turned into an accessible location.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to resolve media '{source_ref}': {reason}")]
pub struct ResolutionError {
    /// The reference that was being resolved.
    pub source_ref: String,
    /// Human readable cause.
    pub reason: String,
}

impl ResolutionError {
    pub fn new(source_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            reason: reason.into(),
        }
    }
}

/// Transport or decode failure for a resolved resource.
///
/// `Clone` so that a single in-flight fetch can hand the same failure to
/// every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Nothing exists at the requested location.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Local I/O failure.
    #[error("IO error: {0}")]
    Io(String),

    /// Bytes were received but could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The cache cannot produce this kind of media.
    #[error("Unsupported media: {0}")]
    Unsupported(String),

    /// Network or host-side transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FetchError::NotFound(err.to_string())
        } else {
            FetchError::Io(err.to_string())
        }
    }
}

impl From<image::ImageError> for FetchError {
    fn from(err: image::ImageError) -> Self {
        FetchError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(err: tokio::task::JoinError) -> Self {
        FetchError::Transport(format!("decode task failed: {err}"))
    }
}

/// What ended one load attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Load timed out after {0:?}")]
    Timeout(Duration),
}

/// Wrapped load failure reported to error callbacks and the log.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct MediaLoadError {
    pub message: String,
    #[source]
    pub cause: LoadFailure,
}

impl MediaLoadError {
    pub fn new(message: impl Into<String>, cause: LoadFailure) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }
}

// ============================================================================
// Crate Errors
// ============================================================================

/// The main error type for the editor core.
#[derive(Error, Debug)]
pub enum Error {
    /// A node was used before the shared assets it needs finished loading.
    #[error("{0}")]
    Configuration(String),

    /// A shared asset failed to load.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A persisted record is missing a component this node needs.
    #[error("Record is missing component '{0}'")]
    MissingComponent(String),

    /// An export component with this name was already added to the node.
    #[error("Duplicate export component '{0}'")]
    DuplicateComponent(String),

    /// No node type owns any of the record's components.
    #[error("Unknown node type for record '{0}'")]
    UnknownNodeType(String),

    /// No tokio runtime was available to schedule background loads.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
