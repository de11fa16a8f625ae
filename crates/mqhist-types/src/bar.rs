//! Decoded bar representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed-point scale of bar prices: a raw price of `112345` is `1.12345`.
pub const PRICE_SCALE: i64 = 100_000;

/// The record kind a bar was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Type-1: absolute record carrying its own timestamp and open price.
    Absolute,
    /// Type-2: compact repeater relative to the previous bar.
    Repeater,
    /// Type-3: incremental record relative to the previous bar.
    Incremental,
}

impl BlockType {
    /// Returns the numeric block type (1, 2 or 3) used in diagnostics.
    #[must_use]
    pub const fn number(&self) -> u8 {
        match self {
            Self::Absolute => 1,
            Self::Repeater => 2,
            Self::Incremental => 3,
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type-{}", self.number())
    }
}

/// One-minute OHLCV bar decoded from a history archive.
///
/// Prices are integers in units of `1 / PRICE_SCALE`. Bars are not validated
/// on construction; OHLC consistency is reported separately, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time (UTC, minute resolution).
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: i64,
    /// Highest price during the minute.
    pub high: i64,
    /// Lowest price during the minute.
    pub low: i64,
    /// Closing price.
    pub close: i64,
    /// Traded volume.
    pub volume: u32,
    /// Record kind this bar came from.
    pub block_type: BlockType,
    /// Offset of the record in the decompressed stream.
    pub byte_offset: usize,
}

impl Bar {
    /// Creates a new bar.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        open: i64,
        high: i64,
        low: i64,
        close: i64,
        volume: u32,
        block_type: BlockType,
        byte_offset: usize,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            block_type,
            byte_offset,
        }
    }
}
