//! Core types for the mqhist history archive decoder.
//!
//! This crate provides the fundamental data structures used throughout mqhist:
//!
//! - [`Bar`] - A decoded one-minute OHLCV bar in fixed-point price units
//! - [`BlockType`] - The record kind a bar was decoded from
//! - [`ArchiveMonth`] - The calendar month an archive covers, and its validity window
//! - [`TimeOffset`] - Signed `±HHMM` offset applied when rendering timestamps

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mqhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
mod error;
mod month;
mod offset;

pub use bar::{Bar, BlockType, PRICE_SCALE};
pub use error::{MonthError, MqhistError, Result, TimeOffsetError};
pub use month::{ArchiveMonth, month_from_path};
pub use offset::TimeOffset;
