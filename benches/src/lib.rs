//! Synthetic inputs for the decoder benchmarks.
//!
//! Real archives cannot be redistributed, so the benchmarks decode streams
//! shaped like a trading month: one Type-1 anchor per hour followed by
//! Type-3 minute bars, with the occasional Type-2 repeater and padding byte.

use chrono::{TimeZone, Utc};
use mqhist_codec::{
    AbsoluteRecord, ArchiveBuilder, BlockWriter, BuiltArchive, IncrementalRecord, RepeaterRecord,
};

/// Minutes between two Type-1 anchors.
const ANCHOR_INTERVAL: usize = 60;

/// Builds a block stream covering `hours` hours starting at `year`-`month`-01.
///
/// # Panics
///
/// Panics if the date is invalid.
#[must_use]
pub fn month_stream(year: i32, month: u32, hours: usize) -> Vec<u8> {
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("valid start date")
        .timestamp();

    let mut writer = BlockWriter::new();
    for hour in 0..hours {
        let anchor = AbsoluteRecord {
            timestamp: (start + (hour * ANCHOR_INTERVAL * 60) as i64) as u32,
            open: 110_000 + (hour % 500) as u32 * 7,
            high_offset: 24,
            low_offset: 18,
            close_offset: (hour % 9) as i16 - 4,
            volume: 40,
        };
        writer = writer.absolute(&[anchor]);

        let steps: Vec<IncrementalRecord> = (0..ANCHOR_INTERVAL - 3)
            .map(|minute| IncrementalRecord {
                open_delta: (minute % 5) as i8 - 2,
                high_offset: 6,
                low_offset: 5,
                close_offset: (minute % 7) as i8 - 3,
                volume: (minute % 30) as u8 + 1,
            })
            .collect();
        writer = writer
            .incremental(&steps)
            .repeater(
                RepeaterRecord {
                    open_delta: 0,
                    high_offset: 2,
                    low_offset: 2,
                    close_offset: 1,
                },
                2,
            )
            .padding(0x00);
    }
    writer.finish()
}

/// Builds an encrypted archive around [`month_stream`].
///
/// # Panics
///
/// Panics if the stream cannot be packed.
#[must_use]
pub fn month_archive(year: i32, month: u32, hours: usize) -> BuiltArchive {
    ArchiveBuilder::new(month_stream(year, month, hours))
        .build()
        .expect("synthetic stream packs")
}

/// Number of bars a decoder emits for [`month_stream`] without a window.
#[must_use]
pub const fn expected_bars(hours: usize) -> usize {
    // anchor + incrementals + one repeater bar
    hours * (ANCHOR_INTERVAL - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqhist_codec::{DecodeContext, DecodeOptions, decode_archive, decode_bars};

    #[test]
    fn test_stream_bar_count() {
        let stream = month_stream(2020, 9, 3);
        let output = decode_bars(&stream, None, DecodeContext::default());
        assert_eq!(output.bars.len(), expected_bars(3));
        assert_eq!(output.stats.padding, 3);
        assert!(!output.stats.truncated_tail);
    }

    #[test]
    fn test_archive_decodes() {
        let archive = month_archive(2020, 9, 2);
        let decoded = decode_archive(&archive.bytes, &archive.digest, &DecodeOptions::new()).unwrap();
        assert_eq!(decoded.bars().len(), expected_bars(2));
    }
}
