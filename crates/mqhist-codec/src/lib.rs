//! Archive decoding pipeline for mqhist.
//!
//! This crate turns a monthly `<md5>.dat` history archive into bars:
//!
//! - [`checksum`] - MD5 integrity check against the file name
//! - [`derive_keystream`] - Keystream derivation from embedded key material
//! - [`xor_with_keystream`] - Body decryption
//! - [`container`] - Size prefix, trailer and LZO1X payload
//! - [`decode_bars`] - Block stream decoding with a validity window
//! - [`check_bars`] - OHLC consistency reporting
//! - [`decode_archive_file`] - The whole pipeline for one file
//! - [`ArchiveBuilder`] - Encoder used for fixtures

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mqhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod anomaly;
mod archive;
mod builder;
pub mod checksum;
mod cipher;
pub mod container;
mod decode;
mod key;
mod record;

pub use anomaly::{Anomaly, OhlcField, check_bar, check_bars};
pub use archive::{
    ArchiveContents, BODY_OFFSET, DecodeOptions, DecodedArchive, DecryptedArchive, HEADER_LEN,
    decode_archive, decode_archive_file, decrypt_archive,
};
pub use builder::{ArchiveBuilder, BlockWriter, BuiltArchive, MAX_STREAK};
pub use checksum::{ChecksumError, digest_from_path, md5_hex};
pub use cipher::{xor_in_place, xor_with_keystream};
pub use container::{ContainerError, ContainerHeader};
pub use decode::{BlockKind, DecodeContext, DecodeOutput, DecodeStats, decode_bars};
pub use key::{KEY_LEN, KEY_OFFSET, Keystream, derive_keystream};
pub use record::{AbsoluteRecord, IncrementalRecord, RepeaterRecord};
