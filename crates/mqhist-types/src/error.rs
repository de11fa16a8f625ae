//! Error types for mqhist.

use thiserror::Error;

/// Result type alias for mqhist operations.
pub type Result<T> = std::result::Result<T, MqhistError>;

/// Errors that can occur while fetching or decoding history archives.
///
/// `Integrity` and `Format` are fatal to a single archive: no bars are
/// produced for it. Batch callers are expected to continue with the rest.
#[derive(Error, Debug)]
pub enum MqhistError {
    /// Archive contents do not match the digest embedded in its file name.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Archive container is malformed (size, trailer or compressed payload).
    #[error("Format error: {0}")]
    Format(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid archive month.
    #[error(transparent)]
    Month(#[from] MonthError),

    /// Invalid time offset.
    #[error(transparent)]
    TimeOffset(#[from] TimeOffsetError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error for invalid archive months.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthError {
    /// Month number outside 1..=12 or year out of range.
    #[error("Invalid month: {year}-{month:02}")]
    OutOfRange {
        /// The requested year.
        year: i32,
        /// The requested month.
        month: u32,
    },

    /// String is not in `YYYY-MM` form.
    #[error("Invalid month string: {0:?} (expected YYYY-MM)")]
    Malformed(String),
}

/// Error for time offsets not in `±HHMM` form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid time offset: {0:?} (expected +HHMM or -HHMM)")]
pub struct TimeOffsetError(pub String);
