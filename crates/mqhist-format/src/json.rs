//! JSON output format.
//!
//! Each bar becomes an object carrying the same timestamp and prices as its
//! CSV row, plus the record kind and stream offset it was decoded from:
//!
//! ```text
//! {"time":"2020-09-13 12:26:00","open":1.17005,"high":1.1702,"low":1.1699,"close":1.17,"volume":42,"block_type":"repeater","byte_offset":9}
//! ```

use mqhist_types::{Bar, BlockType, PRICE_SCALE, TimeOffset};
use serde::Serialize;
use std::io::Write;

use crate::csv::TIMESTAMP_FORMAT;
use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// A single JSON array.
    #[default]
    Array,
    /// One object per line (NDJSON/JSONL).
    Ndjson,
}

/// Serialized form of a bar.
#[derive(Debug, Serialize)]
struct JsonBar {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u32,
    block_type: BlockType,
    byte_offset: usize,
}

impl JsonBar {
    fn new(bar: &Bar, offset: TimeOffset) -> Self {
        Self {
            time: offset.apply(bar.timestamp).format(TIMESTAMP_FORMAT).to_string(),
            open: decimal(bar.open),
            high: decimal(bar.high),
            low: decimal(bar.low),
            close: decimal(bar.close),
            volume: bar.volume,
            block_type: bar.block_type,
            byte_offset: bar.byte_offset,
        }
    }
}

/// Prices are scaled integers, so the quotient is the nearest double to the
/// five-decimal value and serializes without float noise.
fn decimal(raw: i64) -> f64 {
    raw as f64 / PRICE_SCALE as f64
}

/// JSON formatter.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    style: JsonStyle,
    offset: TimeOffset,
}

impl JsonFormatter {
    /// Creates a JSON array formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            offset: TimeOffset::ZERO,
        }
    }

    /// Creates an NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self::new().with_style(JsonStyle::Ndjson)
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the offset added to timestamps.
    #[must_use]
    pub const fn with_offset(mut self, offset: TimeOffset) -> Self {
        self.offset = offset;
        self
    }
}

impl Formatter for JsonFormatter {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], mut writer: W) -> Result<(), FormatError> {
        match self.style {
            JsonStyle::Array => {
                writer.write_all(b"[")?;
                for (i, bar) in bars.iter().enumerate() {
                    if i > 0 {
                        writer.write_all(b",")?;
                    }
                    serde_json::to_writer(&mut writer, &JsonBar::new(bar, self.offset))?;
                }
                writer.write_all(b"]\n")?;
            }
            JsonStyle::Ndjson => {
                for bar in bars {
                    serde_json::to_writer(&mut writer, &JsonBar::new(bar, self.offset))?;
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}
