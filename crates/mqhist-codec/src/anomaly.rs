//! Post-decode OHLC consistency checks.
//!
//! Inconsistent bars are reported, never corrected or dropped.

use chrono::{DateTime, Utc};
use mqhist_types::{Bar, BlockType};
use serde::Serialize;
use tracing::warn;

/// Price field of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OhlcField {
    /// Open price.
    Open,
    /// High price.
    High,
    /// Low price.
    Low,
    /// Close price.
    Close,
}

impl OhlcField {
    /// Returns the field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for OhlcField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bar whose OHLC values are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    /// Index of the bar in the decoded sequence.
    pub index: usize,
    /// Bar timestamp.
    pub timestamp: DateTime<Utc>,
    /// Record kind the bar came from.
    pub block_type: BlockType,
    /// Offset of the record in the decompressed stream.
    pub byte_offset: usize,
    /// Fields that violate the OHLC ordering.
    pub fields: Vec<OhlcField>,
}

impl Anomaly {
    /// Returns true if the named field is among the violations.
    #[must_use]
    pub fn involves(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.as_str() == field)
    }
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<_> = self.fields.iter().map(OhlcField::as_str).collect();
        write!(
            f,
            "bar {} at {} ({}, offset {:#x}): inconsistent {}",
            self.index,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.block_type,
            self.byte_offset,
            fields.join(", ")
        )
    }
}

/// Checks a single bar.
///
/// `high` must be the maximum and `low` the minimum of the four prices, and
/// both `open` and `close` must lie within `[low, high]`.
#[must_use]
pub fn check_bar(bar: &Bar, index: usize) -> Option<Anomaly> {
    let max = bar.open.max(bar.high).max(bar.low).max(bar.close);
    let min = bar.open.min(bar.high).min(bar.low).min(bar.close);

    let mut fields = Vec::new();
    if bar.high != max {
        fields.push(OhlcField::High);
    }
    if bar.low != min {
        fields.push(OhlcField::Low);
    }
    if bar.open < bar.low || bar.open > bar.high {
        fields.push(OhlcField::Open);
    }
    if bar.close < bar.low || bar.close > bar.high {
        fields.push(OhlcField::Close);
    }

    (!fields.is_empty()).then(|| Anomaly {
        index,
        timestamp: bar.timestamp,
        block_type: bar.block_type,
        byte_offset: bar.byte_offset,
        fields,
    })
}

/// Checks every bar, logging a warning per anomaly.
#[must_use]
pub fn check_bars(bars: &[Bar]) -> Vec<Anomaly> {
    bars.iter()
        .enumerate()
        .filter_map(|(index, bar)| check_bar(bar, index))
        .inspect(|anomaly| {
            warn!(
                index = anomaly.index,
                block_type = anomaly.block_type.number(),
                byte_offset = anomaly.byte_offset,
                fields = ?anomaly.fields,
                "inconsistent bar"
            );
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(open: i64, high: i64, low: i64, close: i64) -> Bar {
        let timestamp = Utc.with_ymd_and_hms(2020, 9, 13, 12, 26, 0).unwrap();
        Bar::new(timestamp, open, high, low, close, 1, BlockType::Incremental, 33)
    }

    #[test]
    fn test_consistent_bar() {
        assert!(check_bar(&bar(100, 110, 90, 105), 0).is_none());
        assert!(check_bar(&bar(100, 100, 100, 100), 0).is_none());
    }

    #[test]
    fn test_high_below_close() {
        let anomaly = check_bar(&bar(100, 104, 90, 105), 4).unwrap();
        assert!(anomaly.involves("high"));
        assert!(anomaly.involves("close"));
        assert!(!anomaly.involves("low"));
        assert_eq!(anomaly.index, 4);
        assert_eq!(anomaly.block_type, BlockType::Incremental);
        assert_eq!(anomaly.byte_offset, 33);
    }

    #[test]
    fn test_low_above_open() {
        let anomaly = check_bar(&bar(95, 110, 96, 105), 0).unwrap();
        assert_eq!(anomaly.fields, vec![OhlcField::Low, OhlcField::Open]);
    }

    #[test]
    fn test_inverted_range() {
        let anomaly = check_bar(&bar(100, 90, 110, 100), 0).unwrap();
        assert!(anomaly.involves("high"));
        assert!(anomaly.involves("low"));
    }

    #[test]
    fn test_check_bars_keeps_indices() {
        let bars = vec![
            bar(100, 110, 90, 105),
            bar(100, 99, 90, 95),
            bar(100, 110, 90, 105),
        ];
        let anomalies = check_bars(&bars);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].index, 1);
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn test_display() {
        let anomaly = check_bar(&bar(100, 104, 90, 105), 2).unwrap();
        let text = anomaly.to_string();
        assert!(text.contains("type-3"));
        assert!(text.contains("offset 0x21"));
        assert!(text.contains("high, close"));
    }
}
