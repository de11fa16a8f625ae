//! Block stream decoding into bars.
//!
//! The decompressed stream is a sequence of blocks. Each block starts with a
//! flag byte whose range selects the block kind and whose offset within that
//! range gives the streak (number of records):
//!
//! | Flag          | Kind        | Streak        | Record |
//! |---------------|-------------|---------------|--------|
//! | `0x00..=0x3F` | padding     | -             | -      |
//! | `0x40..=0x7F` | Type-1      | `flag - 0x3F` | 16     |
//! | `0x80..=0xBF` | Type-2      | `flag - 0x7F` | 6      |
//! | `0xC0..=0xFF` | Type-3      | `flag - 0xBF` | 5      |
//!
//! Type-2 and Type-3 records are relative to the previous bar, which is
//! carried across blocks (and across calls) in a [`DecodeContext`].

use mqhist_types::{ArchiveMonth, Bar};
use serde::Serialize;
use tracing::{debug, trace};

use crate::record::{AbsoluteRecord, IncrementalRecord, RepeaterRecord};

/// Block kind selected by a flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Unknown or padding byte; skipped.
    Padding,
    /// Type-1 absolute records.
    Absolute {
        /// Number of records in the block.
        streak: usize,
    },
    /// Type-2 compact repeater.
    Repeater {
        /// Number of records in the block.
        streak: usize,
    },
    /// Type-3 incremental records.
    Incremental {
        /// Number of records in the block.
        streak: usize,
    },
}

impl BlockKind {
    /// Classifies a flag byte.
    #[must_use]
    pub const fn from_flag(flag: u8) -> Self {
        match flag {
            0x40..=0x7F => Self::Absolute {
                streak: (flag - 0x3F) as usize,
            },
            0x80..=0xBF => Self::Repeater {
                streak: (flag - 0x7F) as usize,
            },
            0xC0..=0xFF => Self::Incremental {
                streak: (flag - 0xBF) as usize,
            },
            _ => Self::Padding,
        }
    }

    /// Returns the number of bytes the block occupies after its flag byte.
    #[must_use]
    pub const fn body_len(&self) -> usize {
        match self {
            Self::Padding => 0,
            Self::Absolute { streak } => *streak * AbsoluteRecord::SIZE,
            Self::Repeater { streak } => *streak * RepeaterRecord::SIZE,
            Self::Incremental { streak } => *streak * IncrementalRecord::SIZE,
        }
    }
}

/// Relative-decoding context threaded through the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeContext {
    /// Most recently decoded bar, emitted or not.
    pub last_bar: Option<Bar>,
}

impl DecodeContext {
    /// Creates a context seeded with a previous bar.
    #[must_use]
    pub const fn with_last_bar(bar: Bar) -> Self {
        Self {
            last_bar: Some(bar),
        }
    }
}

/// Counters collected while decoding a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Type-1 records decoded.
    pub absolute: usize,
    /// Type-2 blocks decoded.
    pub repeater: usize,
    /// Type-3 records decoded.
    pub incremental: usize,
    /// Padding bytes skipped.
    pub padding: usize,
    /// Type-1 records outside the validity window (decoded, not emitted).
    pub suppressed: usize,
    /// Relative records skipped because no previous bar was known.
    pub orphaned: usize,
    /// Whether the stream ended inside a block.
    pub truncated_tail: bool,
}

/// Result of decoding a stream.
#[derive(Debug, Clone, Default)]
pub struct DecodeOutput {
    /// Emitted bars, in stream order.
    pub bars: Vec<Bar>,
    /// Context after the last decoded record.
    pub context: DecodeContext,
    /// Decode counters.
    pub stats: DecodeStats,
}

/// Outcome of decoding one block.
enum Step {
    Continue(usize),
    Halt,
}

/// Decodes a block stream into bars.
///
/// When `window` is given, Type-1 records outside it still update the
/// context but are not emitted. Decoding stops without error at the first
/// block whose records run past the end of `data`.
#[must_use]
pub fn decode_bars(
    data: &[u8],
    window: Option<&ArchiveMonth>,
    context: DecodeContext,
) -> DecodeOutput {
    let mut bars = Vec::with_capacity(data.len() / IncrementalRecord::SIZE);
    let mut last_bar = context.last_bar;
    let mut stats = DecodeStats::default();
    let mut cursor = 0;

    while cursor < data.len() {
        let kind = BlockKind::from_flag(data[cursor]);
        trace!(offset = cursor, ?kind, "block");

        let step = decode_block(
            data,
            cursor + 1,
            kind,
            window,
            &mut last_bar,
            &mut bars,
            &mut stats,
        );
        match step {
            Step::Continue(next) => cursor = next,
            Step::Halt => {
                stats.truncated_tail = true;
                break;
            }
        }
    }

    debug!(
        bars = bars.len(),
        absolute = stats.absolute,
        repeater = stats.repeater,
        incremental = stats.incremental,
        padding = stats.padding,
        suppressed = stats.suppressed,
        orphaned = stats.orphaned,
        truncated_tail = stats.truncated_tail,
        "decoded block stream"
    );

    DecodeOutput {
        bars,
        context: DecodeContext { last_bar },
        stats,
    }
}

/// Decodes the block starting at `start` (just past its flag byte).
fn decode_block(
    data: &[u8],
    start: usize,
    kind: BlockKind,
    window: Option<&ArchiveMonth>,
    last_bar: &mut Option<Bar>,
    bars: &mut Vec<Bar>,
    stats: &mut DecodeStats,
) -> Step {
    match kind {
        BlockKind::Padding => {
            stats.padding += 1;
            Step::Continue(start)
        }
        BlockKind::Absolute { streak } => {
            let mut offset = start;
            for _ in 0..streak {
                let Some(record) = data.get(offset..offset + AbsoluteRecord::SIZE) else {
                    return Step::Halt;
                };
                let bar = AbsoluteRecord::parse(record).to_bar(offset);
                stats.absolute += 1;
                *last_bar = Some(bar);
                if window.is_none_or(|w| w.contains(bar.timestamp)) {
                    bars.push(bar);
                } else {
                    stats.suppressed += 1;
                }
                offset += AbsoluteRecord::SIZE;
            }
            Step::Continue(offset)
        }
        BlockKind::Repeater { .. } => {
            // Only the first record materializes a bar; the cursor still
            // skips the whole block.
            let end = start + kind.body_len();
            if end > data.len() {
                return Step::Halt;
            }
            let record = RepeaterRecord::parse(&data[start..start + RepeaterRecord::SIZE]);
            if let Some(previous) = *last_bar {
                let bar = record.to_bar(&previous, start);
                stats.repeater += 1;
                *last_bar = Some(bar);
                bars.push(bar);
            } else {
                stats.orphaned += 1;
            }
            Step::Continue(end)
        }
        BlockKind::Incremental { streak } => {
            let mut offset = start;
            for _ in 0..streak {
                let Some(record) = data.get(offset..offset + IncrementalRecord::SIZE) else {
                    return Step::Halt;
                };
                let record = IncrementalRecord::parse(record);
                if let Some(previous) = *last_bar {
                    let bar = record.to_bar(&previous, offset);
                    stats.incremental += 1;
                    *last_bar = Some(bar);
                    bars.push(bar);
                } else {
                    stats.orphaned += 1;
                }
                offset += IncrementalRecord::SIZE;
            }
            Step::Continue(offset)
        }
    }
}
