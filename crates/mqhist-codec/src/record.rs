//! Fixed-size records of the three block kinds.
//!
//! All multi-byte fields are little-endian. Offsets are relative to the
//! record's open price; open itself is absolute (Type-1) or a delta from the
//! previous bar's close (Type-2, Type-3).

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, TimeDelta, Utc};
use mqhist_types::{Bar, BlockType};

/// Type-1 record: absolute timestamp and prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteRecord {
    /// Unix seconds.
    pub timestamp: u32,
    /// Open price.
    pub open: u32,
    /// `high = open + high_offset`.
    pub high_offset: u16,
    /// `low = open - low_offset`.
    pub low_offset: u16,
    /// `close = open + close_offset`.
    pub close_offset: i16,
    /// Volume.
    pub volume: u16,
}

impl AbsoluteRecord {
    /// Encoded size in bytes.
    pub const SIZE: usize = 16;

    /// Parses a record from a 16-byte slice.
    #[must_use]
    pub fn parse(data: &[u8]) -> Self {
        Self {
            timestamp: LittleEndian::read_u32(&data[0..4]),
            open: LittleEndian::read_u32(&data[4..8]),
            high_offset: LittleEndian::read_u16(&data[8..10]),
            low_offset: LittleEndian::read_u16(&data[10..12]),
            close_offset: LittleEndian::read_i16(&data[12..14]),
            volume: LittleEndian::read_u16(&data[14..16]),
        }
    }

    /// Encodes the record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut bytes[0..4], self.timestamp);
        LittleEndian::write_u32(&mut bytes[4..8], self.open);
        LittleEndian::write_u16(&mut bytes[8..10], self.high_offset);
        LittleEndian::write_u16(&mut bytes[10..12], self.low_offset);
        LittleEndian::write_i16(&mut bytes[12..14], self.close_offset);
        LittleEndian::write_u16(&mut bytes[14..16], self.volume);
        bytes
    }

    /// Returns the record's timestamp as an instant.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.timestamp), 0).unwrap_or_default()
    }

    /// Materializes the bar this record describes.
    #[must_use]
    pub fn to_bar(&self, byte_offset: usize) -> Bar {
        let open = i64::from(self.open);
        Bar::new(
            self.instant(),
            open,
            open + i64::from(self.high_offset),
            open - i64::from(self.low_offset),
            open + i64::from(self.close_offset),
            u32::from(self.volume),
            BlockType::Absolute,
            byte_offset,
        )
    }
}

/// Type-2 record: compact repeater relative to the previous bar.
///
/// The format carries no volume for this kind; materialized bars have
/// volume zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeaterRecord {
    /// `open = previous.close + open_delta`.
    pub open_delta: i8,
    /// `high = open + high_offset`.
    pub high_offset: u8,
    /// `low = open - low_offset`.
    pub low_offset: u16,
    /// `close = open + close_offset`.
    pub close_offset: i16,
}

impl RepeaterRecord {
    /// Encoded size in bytes.
    pub const SIZE: usize = 6;

    /// Parses a record from a 6-byte slice.
    #[must_use]
    pub fn parse(data: &[u8]) -> Self {
        Self {
            open_delta: data[0] as i8,
            high_offset: data[1],
            low_offset: LittleEndian::read_u16(&data[2..4]),
            close_offset: LittleEndian::read_i16(&data[4..6]),
        }
    }

    /// Encodes the record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.open_delta as u8;
        bytes[1] = self.high_offset;
        LittleEndian::write_u16(&mut bytes[2..4], self.low_offset);
        LittleEndian::write_i16(&mut bytes[4..6], self.close_offset);
        bytes
    }

    /// Materializes the bar following `previous`.
    #[must_use]
    pub fn to_bar(&self, previous: &Bar, byte_offset: usize) -> Bar {
        let open = previous.close + i64::from(self.open_delta);
        Bar::new(
            previous.timestamp + TimeDelta::minutes(1),
            open,
            open + i64::from(self.high_offset),
            open - i64::from(self.low_offset),
            open + i64::from(self.close_offset),
            0,
            BlockType::Repeater,
            byte_offset,
        )
    }
}

/// Type-3 record: incremental bar relative to the previous bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementalRecord {
    /// `open = previous.close + open_delta`.
    pub open_delta: i8,
    /// `high = open + high_offset`.
    pub high_offset: u8,
    /// `low = open - low_offset`.
    pub low_offset: u8,
    /// `close = open + close_offset`.
    pub close_offset: i8,
    /// Literal volume.
    pub volume: u8,
}

impl IncrementalRecord {
    /// Encoded size in bytes.
    pub const SIZE: usize = 5;

    /// Parses a record from a 5-byte slice.
    #[must_use]
    pub const fn parse(data: &[u8]) -> Self {
        Self {
            open_delta: data[0] as i8,
            high_offset: data[1],
            low_offset: data[2],
            close_offset: data[3] as i8,
            volume: data[4],
        }
    }

    /// Encodes the record.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.open_delta as u8,
            self.high_offset,
            self.low_offset,
            self.close_offset as u8,
            self.volume,
        ]
    }

    /// Materializes the bar following `previous`.
    #[must_use]
    pub fn to_bar(&self, previous: &Bar, byte_offset: usize) -> Bar {
        let open = previous.close + i64::from(self.open_delta);
        Bar::new(
            previous.timestamp + TimeDelta::minutes(1),
            open,
            open + i64::from(self.high_offset),
            open - i64::from(self.low_offset),
            open + i64::from(self.close_offset),
            u32::from(self.volume),
            BlockType::Incremental,
            byte_offset,
        )
    }
}
