//! Archive integrity check against the digest embedded in the file name.

use md5::{Digest, Md5};
use mqhist_types::MqhistError;
use std::path::Path;
use thiserror::Error;

/// Length of the hex digest embedded in archive file names.
pub const DIGEST_HEX_LEN: usize = 32;

/// Errors that can occur while checking archive integrity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChecksumError {
    /// File name does not carry a 32-character hex digest.
    #[error("File name {0:?} does not contain an MD5 digest")]
    BadFileName(String),

    /// Archive contents do not hash to the expected digest.
    #[error("Checksum does not match: expected {expected}, got {actual}")]
    Mismatch {
        /// Digest taken from the file name.
        expected: String,
        /// Digest of the archive bytes.
        actual: String,
    },
}

impl From<ChecksumError> for MqhistError {
    fn from(err: ChecksumError) -> Self {
        Self::Integrity(err.to_string())
    }
}

/// Returns the lowercase hex MD5 digest of `data`.
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Extracts the expected digest from an archive path.
///
/// The digest is the run of ASCII alphanumerics immediately before `.dat`,
/// so both `<md5>.dat` and list-style names such as
/// `EURUSD_2020_09_<md5>.dat` are accepted. The digest is returned lowercased.
///
/// # Errors
///
/// Returns [`ChecksumError::BadFileName`] if the file name does not end in
/// `.dat` or that run is not exactly 32 hex characters.
pub fn digest_from_path(path: &Path) -> Result<String, ChecksumError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let bad_name = || ChecksumError::BadFileName(name.to_string());

    let stem = name.strip_suffix(".dat").ok_or_else(bad_name)?;
    let digest = stem
        .rsplit(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .unwrap_or_default();
    if digest.len() != DIGEST_HEX_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad_name());
    }

    Ok(digest.to_ascii_lowercase())
}

/// Verifies that `data` hashes to `expected` (case-insensitive hex).
///
/// # Errors
///
/// Returns [`ChecksumError::Mismatch`] if the digests differ.
pub fn verify(data: &[u8], expected: &str) -> Result<(), ChecksumError> {
    let actual = md5_hex(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ChecksumError::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
