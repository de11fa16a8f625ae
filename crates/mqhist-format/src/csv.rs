//! CSV output format.

use mqhist_types::{Bar, PRICE_SCALE, TimeOffset};
use std::io::Write;

use crate::{FormatError, Formatter};

/// Timestamp layout of CSV rows.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a fixed-point price with exactly five decimals.
///
/// Integer arithmetic keeps the output exact: `117005` becomes `1.17005`.
#[must_use]
pub fn format_price(raw: i64) -> String {
    let sign = if raw < 0 { "-" } else { "" };
    let abs = raw.unsigned_abs();
    let scale = PRICE_SCALE.unsigned_abs();
    format!("{sign}{}.{:05}", abs / scale, abs % scale)
}

/// CSV formatter.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: char,
    /// Whether to include header row.
    include_header: bool,
    /// Offset added to every timestamp.
    offset: TimeOffset,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a new CSV formatter: comma separated, no header, no offset.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            include_header: false,
            offset: TimeOffset::ZERO,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Sets the offset added to timestamps.
    #[must_use]
    pub const fn with_offset(mut self, offset: TimeOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self::new().with_delimiter('\t')
    }
}

impl Formatter for CsvFormatter {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], mut writer: W) -> Result<(), FormatError> {
        let d = self.delimiter;

        if self.include_header {
            writeln!(writer, "timestamp{d}open{d}high{d}low{d}close{d}volume")?;
        }

        for bar in bars {
            writeln!(
                writer,
                "{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                self.offset.apply(bar.timestamp).format(TIMESTAMP_FORMAT),
                format_price(bar.open),
                format_price(bar.high),
                format_price(bar.low),
                format_price(bar.close),
                bar.volume
            )?;
        }

        Ok(())
    }

    fn extension(&self) -> &str {
        "csv"
    }
}
