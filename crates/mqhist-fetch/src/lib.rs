//! History archive downloads for mqhist.
//!
//! This crate provides the download side of the pipeline:
//!
//! - [`url`] - History server URL construction
//! - [`find_history_file`] - Archive lookup in a symbol's list file
//! - [`history_path`] - Local storage layout
//! - [`DownloadClient`] - HTTP client with retries
//! - [`DEFAULT_PAIRS`] - Symbols the history server publishes

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mqhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod list;
mod pairs;
pub mod url;

pub use client::{ClientConfig, DownloadClient, DownloadError, DownloadOutcome};
pub use list::{find_history_file, history_path, parse_list};
pub use pairs::{DEFAULT_PAIRS, is_known_pair};
