//! Structured error types for taskrc parsing, attribute codecs and filters.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    FileRead,
    IncludeResolution,
    IncludeCycle,
    MalformedLine,
    ImmutableMutation,

    // Record and filter errors
    Validation,
    UnknownCommand,
    InvalidFilter,
    Json,
}

/// Library-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read taskrc at {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot find included file {include:?}; searched {searched:?} (set TASK_RCDIR if you know where it lives)")]
    IncludeResolution {
        include: String,
        searched: Vec<PathBuf>,
    },

    #[error("include cycle: {}", display_chain(.chain))]
    IncludeCycle { chain: Vec<PathBuf> },

    #[error("malformed setting at {}:{line_number}: {line:?}", .path.display())]
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        line: String,
    },

    #[error("taskrc trees are immutable ({operation} {key:?})")]
    ImmutableMutation {
        operation: &'static str,
        key: String,
    },

    #[error("invalid value {value:?} for attribute '{attribute}': {reason}")]
    Validation {
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("unknown load command: {0} (expected all, pending or completed)")]
    UnknownCommand(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::FileRead { .. } => ErrorCode::FileRead,
            Error::IncludeResolution { .. } => ErrorCode::IncludeResolution,
            Error::IncludeCycle { .. } => ErrorCode::IncludeCycle,
            Error::MalformedLine { .. } => ErrorCode::MalformedLine,
            Error::ImmutableMutation { .. } => ErrorCode::ImmutableMutation,
            Error::Validation { .. } => ErrorCode::Validation,
            Error::UnknownCommand(_) => ErrorCode::UnknownCommand,
            Error::InvalidFilter(_) => ErrorCode::InvalidFilter,
            Error::Json(_) => ErrorCode::Json,
        }
    }

    /// Per-line parse problems are skipped rather than failing the whole file.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::IncludeResolution { .. } | Error::MalformedLine { .. }
        )
    }

    // Convenience constructors

    pub fn validation(
        attribute: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Validation {
            attribute: attribute.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn immutable(operation: &'static str, key: impl Into<String>) -> Self {
        Error::ImmutableMutation {
            operation,
            key: key.into(),
        }
    }

    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Error::InvalidFilter(reason.into())
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
