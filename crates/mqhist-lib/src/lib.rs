//! Decode encrypted monthly history archives into one-minute OHLCV bars.
//!
//! This is a facade crate that re-exports functionality from the mqhist
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use mqhist_lib::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let path = "EURUSD/2020/09/900150983cd24fb0d6963f7d28e17f72.dat";
//!     let month = month_from_path(path.as_ref()).ok_or("no month in path")?;
//!     let decoded = decode_archive_file(path, &DecodeOptions::new().with_month(month))?;
//!
//!     CsvFormatter::new().write_bars(decoded.bars(), std::io::stdout().lock())?;
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mqhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use mqhist_types::*;

// Re-export the decoding pipeline
pub use mqhist_codec::{
    AbsoluteRecord, Anomaly, ArchiveBuilder, ArchiveContents, BlockWriter, BuiltArchive,
    ChecksumError, ContainerError, DecodeContext, DecodeOptions, DecodeOutput, DecodeStats,
    DecodedArchive, DecryptedArchive, IncrementalRecord, OhlcField, RepeaterRecord, check_bars,
    decode_archive, decode_archive_file, decode_bars, decrypt_archive, digest_from_path,
};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use mqhist_fetch::{
    ClientConfig, DEFAULT_PAIRS, DownloadClient, DownloadError, DownloadOutcome,
    find_history_file, history_path, is_known_pair,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use mqhist_format::{
    CsvFormatter, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat, format_price,
};

/// Prelude module for convenient imports.
///
/// ```
/// use mqhist_lib::prelude::*;
/// ```
pub mod prelude {
    pub use mqhist_types::{
        ArchiveMonth, Bar, BlockType, MqhistError, Result, TimeOffset, month_from_path,
    };

    pub use mqhist_codec::{
        Anomaly, ArchiveContents, DecodeOptions, DecodeStats, DecodedArchive, decode_archive,
        decode_archive_file,
    };

    #[cfg(feature = "fetch")]
    pub use mqhist_fetch::{
        ClientConfig, DEFAULT_PAIRS, DownloadClient, DownloadOutcome, find_history_file,
        history_path,
    };

    #[cfg(feature = "format")]
    pub use mqhist_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
