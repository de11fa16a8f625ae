//! Decrypted body container: size prefix, LZO1X payload and trailer.
//!
//! Layout of the decrypted body:
//! - `u32` LE: packed size (always `archive length - 0x110`)
//! - `u32` LE: unpacked size
//! - LZO1X compressed payload, ending with the 3-byte trailer `11 00 00`
//!
//! The trailer is the LZO1X end-of-stream marker, so it stays part of the
//! payload handed to the decompressor.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use mqhist_types::MqhistError;
use rust_lzo::{LZOContext, LZOError};
use thiserror::Error;

/// Length of the `packed_size` / `unpacked_size` prefix.
pub const SIZE_PREFIX_LEN: usize = 8;

/// Marker every valid body ends with.
pub const TRAILER: [u8; 3] = [0x11, 0x00, 0x00];

/// Format tag of a framed payload: LZO1X with a big-endian length prefix.
pub const FRAME_TAG: u8 = 0xF0;

/// Difference between the archive length and the packed size.
const PACKED_SIZE_ADJUST: usize = 0x110;

/// Errors that can occur while unpacking a decrypted body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// Body is too short to hold the size prefix and trailer.
    #[error("Body too short: {0} bytes")]
    TooShort(usize),

    /// Packed size does not match the archive length.
    #[error("Wrong packed size: expected {expected}, got {actual}")]
    WrongPackedSize {
        /// Packed size implied by the archive length.
        expected: usize,
        /// Packed size stored in the body.
        actual: u32,
    },

    /// Body does not end with the trailer marker.
    #[error("Bad trailer: {0:02x?}")]
    BadTrailer([u8; 3]),

    /// Framed payload has an unknown format tag or is truncated.
    #[error("Bad frame header")]
    BadFrame,

    /// LZO decompression failed.
    #[error("LZO decompression failed after {0} bytes")]
    Decompress(usize),

    /// Decompressed length differs from the unpacked size.
    #[error("Unpacked size mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Unpacked size stored in the body.
        expected: usize,
        /// Bytes actually produced.
        actual: usize,
    },

    /// LZO compression failed.
    #[error("LZO compression failed")]
    Compress,
}

impl From<ContainerError> for MqhistError {
    fn from(err: ContainerError) -> Self {
        Self::Format(err.to_string())
    }
}

/// Size prefix of a decrypted body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Compressed payload size, trailer included.
    pub packed_size: u32,
    /// Size of the decompressed block stream.
    pub unpacked_size: u32,
}

impl ContainerHeader {
    /// Reads the size prefix from the start of a body.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::TooShort`] if fewer than 8 bytes are given.
    pub fn read(body: &[u8]) -> Result<Self, ContainerError> {
        if body.len() < SIZE_PREFIX_LEN {
            return Err(ContainerError::TooShort(body.len()));
        }
        Ok(Self {
            packed_size: LittleEndian::read_u32(&body[0..4]),
            unpacked_size: LittleEndian::read_u32(&body[4..8]),
        })
    }

    /// Writes the size prefix.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIZE_PREFIX_LEN] {
        let mut bytes = [0u8; SIZE_PREFIX_LEN];
        LittleEndian::write_u32(&mut bytes[0..4], self.packed_size);
        LittleEndian::write_u32(&mut bytes[4..8], self.unpacked_size);
        bytes
    }
}

/// Validates the size prefix and trailer of a decrypted body.
///
/// # Errors
///
/// Returns an error if the body is too short, the packed size does not equal
/// `archive_len - 0x110`, or the trailer marker is missing.
pub fn validate(body: &[u8], archive_len: usize) -> Result<ContainerHeader, ContainerError> {
    if body.len() < SIZE_PREFIX_LEN + TRAILER.len() {
        return Err(ContainerError::TooShort(body.len()));
    }

    let header = ContainerHeader::read(body)?;
    let expected = archive_len
        .checked_sub(PACKED_SIZE_ADJUST)
        .ok_or(ContainerError::TooShort(body.len()))?;
    if header.packed_size as usize != expected {
        return Err(ContainerError::WrongPackedSize {
            expected,
            actual: header.packed_size,
        });
    }

    let mut tail = [0u8; 3];
    tail.copy_from_slice(&body[body.len() - TRAILER.len()..]);
    if tail != TRAILER {
        return Err(ContainerError::BadTrailer(tail));
    }

    Ok(header)
}

/// Prepends the frame header the decompressor expects: the format tag
/// followed by the big-endian unpacked size.
#[must_use]
pub fn frame(unpacked_size: u32, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 5);
    framed.push(FRAME_TAG);
    let mut size = [0u8; 4];
    BigEndian::write_u32(&mut size, unpacked_size);
    framed.extend_from_slice(&size);
    framed.extend_from_slice(payload);
    framed
}

/// Decompresses a framed LZO1X payload.
///
/// # Errors
///
/// Returns an error if the frame header is invalid, the stream is corrupt,
/// or the output length differs from the framed size.
pub fn decompress_frame(framed: &[u8]) -> Result<Vec<u8>, ContainerError> {
    if framed.len() < 5 || framed[0] != FRAME_TAG {
        return Err(ContainerError::BadFrame);
    }
    let expected = BigEndian::read_u32(&framed[1..5]) as usize;

    let mut out = vec![0u8; expected];
    let produced = {
        let (decompressed, err) = LZOContext::decompress_to_slice(&framed[5..], &mut out);
        let produced = decompressed.len();
        if !matches!(err, LZOError::OK) {
            return Err(ContainerError::Decompress(produced));
        }
        produced
    };

    if produced != expected {
        return Err(ContainerError::LengthMismatch {
            expected,
            actual: produced,
        });
    }
    Ok(out)
}

/// Validates a decrypted body and decompresses its payload.
///
/// # Errors
///
/// See [`validate`] and [`decompress_frame`].
pub fn unpack(body: &[u8], archive_len: usize) -> Result<Vec<u8>, ContainerError> {
    let header = validate(body, archive_len)?;
    let framed = frame(header.unpacked_size, &body[SIZE_PREFIX_LEN..]);
    decompress_frame(&framed)
}

/// Compresses a block stream into an LZO1X payload (trailer included).
///
/// # Errors
///
/// Returns [`ContainerError::Compress`] if the compressor reports an error.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let mut ctx = LZOContext::new();
    let mut out = vec![0u8; rust_lzo::worst_compress(data.len())];
    let len = {
        let (compressed, err) = ctx.compress_to_slice(data, &mut out);
        if !matches!(err, LZOError::OK) {
            return Err(ContainerError::Compress);
        }
        compressed.len()
    };
    out.truncate(len);
    Ok(out)
}
