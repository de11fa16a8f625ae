//! End-to-end archive decoding.
//!
//! Archive layout:
//! - `[0x000, 0x088)`: opaque header
//! - `[0x088, 0x108)`: key material
//! - `[0x108, EOF)`: encrypted body

use mqhist_types::{ArchiveMonth, Bar, MqhistError, Result};
use std::path::Path;
use tracing::debug;

use crate::anomaly::{Anomaly, check_bars};
use crate::checksum::{digest_from_path, verify};
use crate::cipher::xor_with_keystream;
use crate::container::{self, ContainerHeader};
use crate::decode::{DecodeContext, DecodeStats, decode_bars};
use crate::key::{KEY_LEN, KEY_OFFSET, derive_keystream};

/// Length of the opaque header region.
pub const HEADER_LEN: usize = 0x88;

/// Offset of the encrypted body.
pub const BODY_OFFSET: usize = KEY_OFFSET + KEY_LEN;

/// Options controlling how an archive is decoded.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Month the archive covers; Type-1 records outside it are suppressed.
    pub month: Option<ArchiveMonth>,
    /// Decompress and decode the body (`false` returns the decrypted body).
    pub decompress: bool,
    /// Run the OHLC consistency check on decoded bars.
    pub report_anomalies: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeOptions {
    /// Creates options that decode bars without a month window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            month: None,
            decompress: true,
            report_anomalies: false,
        }
    }

    /// Sets the validity window month.
    #[must_use]
    pub const fn with_month(mut self, month: ArchiveMonth) -> Self {
        self.month = Some(month);
        self
    }

    /// Sets whether to decompress and decode the body.
    #[must_use]
    pub const fn with_decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    /// Sets whether to check decoded bars for OHLC anomalies.
    #[must_use]
    pub const fn with_anomalies(mut self, report: bool) -> Self {
        self.report_anomalies = report;
        self
    }
}

/// Archive after integrity check and decryption.
#[derive(Debug, Clone)]
pub struct DecryptedArchive {
    /// Opaque header region.
    pub header: Vec<u8>,
    /// Size prefix of the body.
    pub container: ContainerHeader,
    /// Decrypted body, size prefix and trailer included.
    pub body: Vec<u8>,
}

impl DecryptedArchive {
    /// Decompresses the body into the raw block stream.
    ///
    /// # Errors
    ///
    /// Returns [`MqhistError::Format`] if decompression fails.
    pub fn block_stream(&self) -> Result<Vec<u8>> {
        let framed = container::frame(
            self.container.unpacked_size,
            &self.body[container::SIZE_PREFIX_LEN..],
        );
        Ok(container::decompress_frame(&framed)?)
    }
}

/// Decoded contents of an archive.
#[derive(Debug, Clone)]
pub enum ArchiveContents {
    /// Decoded bars.
    Bars {
        /// Bars in stream order.
        bars: Vec<Bar>,
        /// OHLC anomalies, empty unless requested.
        anomalies: Vec<Anomaly>,
        /// Decode counters.
        stats: DecodeStats,
    },
    /// Decrypted but still compressed body.
    Raw(Vec<u8>),
}

/// Result of decoding one archive.
#[derive(Debug, Clone)]
pub struct DecodedArchive {
    /// Opaque header region.
    pub header: Vec<u8>,
    /// Decoded contents.
    pub contents: ArchiveContents,
}

impl DecodedArchive {
    /// Returns the decoded bars (empty in raw mode).
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        match &self.contents {
            ArchiveContents::Bars { bars, .. } => bars,
            ArchiveContents::Raw(_) => &[],
        }
    }

    /// Returns the reported anomalies (empty in raw mode).
    #[must_use]
    pub fn anomalies(&self) -> &[Anomaly] {
        match &self.contents {
            ArchiveContents::Bars { anomalies, .. } => anomalies,
            ArchiveContents::Raw(_) => &[],
        }
    }

    /// Consumes the archive, returning its bars (empty in raw mode).
    #[must_use]
    pub fn into_bars(self) -> Vec<Bar> {
        match self.contents {
            ArchiveContents::Bars { bars, .. } => bars,
            ArchiveContents::Raw(_) => Vec::new(),
        }
    }
}

/// Verifies the checksum, decrypts the body and validates its container.
///
/// # Errors
///
/// Returns [`MqhistError::Integrity`] on checksum mismatch and
/// [`MqhistError::Format`] if the archive is truncated or its size prefix or
/// trailer is wrong.
pub fn decrypt_archive(data: &[u8], expected_digest: &str) -> Result<DecryptedArchive> {
    verify(data, expected_digest)?;

    if data.len() < BODY_OFFSET {
        return Err(MqhistError::Format(format!(
            "Archive too short: {} bytes",
            data.len()
        )));
    }

    let mut key_material = [0u8; KEY_LEN];
    key_material.copy_from_slice(&data[KEY_OFFSET..BODY_OFFSET]);
    let keystream = derive_keystream(&key_material);
    let body = xor_with_keystream(&keystream, &data[BODY_OFFSET..]);

    let container = container::validate(&body, data.len())?;
    debug!(
        packed = container.packed_size,
        unpacked = container.unpacked_size,
        "decrypted archive body"
    );

    Ok(DecryptedArchive {
        header: data[..HEADER_LEN].to_vec(),
        container,
        body,
    })
}

/// Decodes archive bytes whose expected digest is already known.
///
/// # Errors
///
/// See [`decrypt_archive`] and [`DecryptedArchive::block_stream`].
pub fn decode_archive(
    data: &[u8],
    expected_digest: &str,
    options: &DecodeOptions,
) -> Result<DecodedArchive> {
    let decrypted = decrypt_archive(data, expected_digest)?;

    if !options.decompress {
        return Ok(DecodedArchive {
            header: decrypted.header,
            contents: ArchiveContents::Raw(decrypted.body),
        });
    }

    let stream = decrypted.block_stream()?;
    let output = decode_bars(&stream, options.month.as_ref(), DecodeContext::default());
    let anomalies = if options.report_anomalies {
        check_bars(&output.bars)
    } else {
        Vec::new()
    };

    Ok(DecodedArchive {
        header: decrypted.header,
        contents: ArchiveContents::Bars {
            bars: output.bars,
            anomalies,
            stats: output.stats,
        },
    })
}

/// Reads and decodes an archive file named `<md5>.dat`.
///
/// # Errors
///
/// Returns [`MqhistError::Integrity`] if the file name carries no digest,
/// [`MqhistError::Io`] if the file cannot be read, and any error of
/// [`decode_archive`].
pub fn decode_archive_file(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<DecodedArchive> {
    let path = path.as_ref();
    let digest = digest_from_path(path)?;
    let data = std::fs::read(path)?;
    debug!(path = %path.display(), bytes = data.len(), "read archive");
    decode_archive(&data, &digest, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ArchiveBuilder, BlockWriter};
    use crate::checksum::md5_hex;
    use crate::record::AbsoluteRecord;

    fn sample_stream() -> Vec<u8> {
        BlockWriter::new()
            .absolute(&[AbsoluteRecord {
                timestamp: 1_600_000_000,
                open: 100_000,
                high_offset: 50,
                low_offset: 30,
                close_offset: -10,
                volume: 7,
            }])
            .finish()
    }

    #[test]
    fn test_decode_roundtrip() {
        let archive = ArchiveBuilder::new(sample_stream()).build().unwrap();
        let decoded = decode_archive(&archive.bytes, &archive.digest, &DecodeOptions::new()).unwrap();
        assert_eq!(decoded.bars().len(), 1);
        assert_eq!(decoded.bars()[0].close, 99_990);
        assert_eq!(decoded.header.len(), HEADER_LEN);
    }

    #[test]
    fn test_checksum_runs_first() {
        let archive = ArchiveBuilder::new(sample_stream()).build().unwrap();
        let err = decode_archive(&archive.bytes, &md5_hex(b"other"), &DecodeOptions::new())
            .unwrap_err();
        assert!(matches!(err, MqhistError::Integrity(_)));
    }

    #[test]
    fn test_truncated_archive() {
        let data = vec![0u8; 0x100];
        let err = decode_archive(&data, &md5_hex(&data), &DecodeOptions::new()).unwrap_err();
        assert!(matches!(err, MqhistError::Format(_)));
    }

    #[test]
    fn test_raw_mode_returns_decrypted_body() {
        let archive = ArchiveBuilder::new(sample_stream()).build().unwrap();
        let options = DecodeOptions::new().with_decompress(false);
        let decoded = decode_archive(&archive.bytes, &archive.digest, &options).unwrap();

        let ArchiveContents::Raw(body) = &decoded.contents else {
            panic!("expected raw contents");
        };
        assert_eq!(body.len(), archive.bytes.len() - BODY_OFFSET);
        assert_eq!(&body[body.len() - 3..], &container::TRAILER);
        assert!(decoded.bars().is_empty());
    }
}
