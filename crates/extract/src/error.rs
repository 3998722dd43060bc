use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Roster file missing or unreadable.
    #[error("cannot read roster {path}: {message}")]
    RosterRead { path: PathBuf, message: String },

    /// Roster header lacks a required column.
    #[error("roster {path}: missing column '{column}'")]
    RosterColumn { path: PathBuf, column: String },

    /// Statement directory does not exist.
    #[error("statement directory not found: {0}")]
    MissingDir(PathBuf),

    #[error("invalid glob pattern: {0}")]
    Pattern(String),

    /// `pdftotext` binary not on PATH.
    #[error("pdftotext not installed (poppler-utils)")]
    PdftotextMissing,

    /// `pdftotext` ran but failed or produced nothing.
    #[error("pdftotext failed for {path}: {message}")]
    Pdftotext { path: PathBuf, message: String },

    #[error("correction store {path}: {message}")]
    Corrections { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from the generic fallback extractor. The orchestrator logs these
/// and continues with zero entries.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("statement text is empty")]
    EmptyText,

    #[error("fallback request failed: {0}")]
    Request(String),

    #[error("fallback response is not valid JSON: {0}")]
    MalformedJson(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    /// The event does not apply to the session's current state.
    #[error("event '{event}' not valid in state '{state}'")]
    InvalidTransition { state: String, event: String },

    #[error("state code must be two letters, got '{0}'")]
    InvalidState(String),
}
