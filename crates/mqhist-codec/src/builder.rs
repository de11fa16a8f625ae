//! Encoder side of the archive format.
//!
//! Produces block streams and complete archives that [`decode_archive`]
//! accepts. Used for fixtures in tests and benchmarks.
//!
//! [`decode_archive`]: crate::decode_archive

use std::path::{Path, PathBuf};

use crate::archive::{BODY_OFFSET, HEADER_LEN};
use crate::checksum::md5_hex;
use crate::cipher::xor_in_place;
use crate::container::{self, ContainerError, ContainerHeader, SIZE_PREFIX_LEN};
use crate::key::{KEY_LEN, derive_keystream};
use crate::record::{AbsoluteRecord, IncrementalRecord, RepeaterRecord};

/// Maximum number of records one flag byte can announce.
pub const MAX_STREAK: usize = 64;

/// Writes a block stream one block at a time.
#[derive(Debug, Clone, Default)]
pub struct BlockWriter {
    buf: Vec<u8>,
}

impl BlockWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends Type-1 blocks, splitting into runs of at most 64 records.
    #[must_use]
    pub fn absolute(mut self, records: &[AbsoluteRecord]) -> Self {
        for run in records.chunks(MAX_STREAK) {
            self.buf.push(0x3F + run.len() as u8);
            for record in run {
                self.buf.extend_from_slice(&record.to_bytes());
            }
        }
        self
    }

    /// Appends one Type-2 block of `streak` records.
    ///
    /// Only `first` carries data; the remaining records are zero filled.
    /// `streak` is clamped to `1..=64`.
    #[must_use]
    pub fn repeater(mut self, first: RepeaterRecord, streak: usize) -> Self {
        let streak = streak.clamp(1, MAX_STREAK);
        self.buf.push(0x7F + streak as u8);
        self.buf.extend_from_slice(&first.to_bytes());
        self.buf
            .resize(self.buf.len() + (streak - 1) * RepeaterRecord::SIZE, 0);
        self
    }

    /// Appends Type-3 blocks, splitting into runs of at most 64 records.
    #[must_use]
    pub fn incremental(mut self, records: &[IncrementalRecord]) -> Self {
        for run in records.chunks(MAX_STREAK) {
            self.buf.push(0xBF + run.len() as u8);
            for record in run {
                self.buf.extend_from_slice(&record.to_bytes());
            }
        }
        self
    }

    /// Appends a padding byte (masked into `0x00..=0x3F`).
    #[must_use]
    pub fn padding(mut self, byte: u8) -> Self {
        self.buf.push(byte & 0x3F);
        self
    }

    /// Appends raw bytes verbatim.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the block stream.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Builds a complete encrypted archive around a block stream.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    stream: Vec<u8>,
    header: [u8; HEADER_LEN],
    key_material: [u8; KEY_LEN],
}

impl ArchiveBuilder {
    /// Creates a builder with a zero header and fixed key material.
    #[must_use]
    pub fn new(stream: Vec<u8>) -> Self {
        let mut key_material = [0u8; KEY_LEN];
        for (i, byte) in key_material.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        Self {
            stream,
            header: [0u8; HEADER_LEN],
            key_material,
        }
    }

    /// Sets the key material.
    #[must_use]
    pub const fn with_key_material(mut self, key_material: [u8; KEY_LEN]) -> Self {
        self.key_material = key_material;
        self
    }

    /// Sets the opaque header region.
    #[must_use]
    pub const fn with_header(mut self, header: [u8; HEADER_LEN]) -> Self {
        self.header = header;
        self
    }

    /// Compresses, encrypts and digests the archive.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::Compress`] if compression fails.
    pub fn build(self) -> Result<BuiltArchive, ContainerError> {
        let payload = container::compress(&self.stream)?;
        let prefix = ContainerHeader {
            packed_size: payload.len() as u32,
            unpacked_size: self.stream.len() as u32,
        };

        let mut body = Vec::with_capacity(SIZE_PREFIX_LEN + payload.len());
        body.extend_from_slice(&prefix.to_bytes());
        body.extend_from_slice(&payload);
        xor_in_place(&derive_keystream(&self.key_material), &mut body);

        let mut bytes = Vec::with_capacity(BODY_OFFSET + body.len());
        bytes.extend_from_slice(&self.header);
        bytes.extend_from_slice(&self.key_material);
        bytes.extend_from_slice(&body);

        let digest = md5_hex(&bytes);
        Ok(BuiltArchive { bytes, digest })
    }
}

/// An encoded archive and its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArchive {
    /// Archive bytes.
    pub bytes: Vec<u8>,
    /// Lowercase hex MD5 of `bytes`.
    pub digest: String,
}

impl BuiltArchive {
    /// Returns the canonical file name, `<digest>.dat`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.dat", self.digest)
    }

    /// Writes the archive into `dir` under its canonical file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incremental(n: usize) -> Vec<IncrementalRecord> {
        (0..n)
            .map(|i| IncrementalRecord {
                open_delta: 0,
                high_offset: 2,
                low_offset: 1,
                close_offset: 1,
                volume: i as u8,
            })
            .collect()
    }

    #[test]
    fn test_runs_split_at_64() {
        let stream = BlockWriter::new().incremental(&incremental(70)).finish();
        assert_eq!(stream[0], 0xFF);
        assert_eq!(stream[1 + 64 * IncrementalRecord::SIZE], 0xC5);
        assert_eq!(stream.len(), 2 + 70 * IncrementalRecord::SIZE);
    }

    #[test]
    fn test_repeater_block_length() {
        let first = RepeaterRecord {
            open_delta: 1,
            high_offset: 1,
            low_offset: 1,
            close_offset: 1,
        };
        let writer = BlockWriter::new().repeater(first, 3);
        assert_eq!(writer.len(), 1 + 3 * RepeaterRecord::SIZE);
        assert_eq!(writer.finish()[0], 0x82);
    }

    #[test]
    fn test_padding_masked() {
        let stream = BlockWriter::new().padding(0xFF).padding(0x05).finish();
        assert_eq!(stream, vec![0x3F, 0x05]);
    }

    #[test]
    fn test_archive_layout() {
        let stream = BlockWriter::new().incremental(&incremental(3)).finish();
        let header = [0xA5u8; HEADER_LEN];
        let archive = ArchiveBuilder::new(stream).with_header(header).build().unwrap();

        assert_eq!(&archive.bytes[..HEADER_LEN], &header);
        assert_eq!(archive.digest, md5_hex(&archive.bytes));
        assert_eq!(archive.file_name().len(), 36);
        assert!(archive.bytes.len() > BODY_OFFSET + SIZE_PREFIX_LEN);
    }

    #[test]
    fn test_key_material_changes_ciphertext() {
        let stream = BlockWriter::new().incremental(&incremental(3)).finish();
        let a = ArchiveBuilder::new(stream.clone()).build().unwrap();
        let b = ArchiveBuilder::new(stream)
            .with_key_material([7u8; KEY_LEN])
            .build()
            .unwrap();
        assert_ne!(a.bytes[BODY_OFFSET..], b.bytes[BODY_OFFSET..]);
    }
}
