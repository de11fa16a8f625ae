//! Archive month and validity window.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::Path;
use std::str::FromStr;

use crate::MonthError;

/// The calendar month a history archive nominally covers.
///
/// Archives routinely carry a few records from the neighbouring months. The
/// half-open window `[start, end)` is used to suppress them while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveMonth {
    year: i32,
    month: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ArchiveMonth {
    /// Creates an archive month, validating the year and month.
    ///
    /// # Errors
    ///
    /// Returns an error if `month` is not in `1..=12` or the date is not
    /// representable.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        let out_of_range = || MonthError::OutOfRange { year, month };
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(out_of_range)?;

        let start = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0).ok_or_else(out_of_range)?);
        let end = Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).ok_or_else(out_of_range)?);

        Ok(Self {
            year,
            month,
            start,
            end,
        })
    }

    /// Returns the year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month number (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Returns the first instant of the month.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the first instant of the following month (exclusive bound).
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true if the instant lies within `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

impl std::fmt::Display for ArchiveMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ArchiveMonth {
    type Err = MonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MonthError::Malformed(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

/// Infers the archive month from a history path laid out as
/// `.../{PAIR}/{YEAR}/{MM}/{digest}.dat`.
///
/// Returns `None` if the two parent directories are not a year and a month.
#[must_use]
pub fn month_from_path(path: &Path) -> Option<ArchiveMonth> {
    let month_dir = path.parent()?;
    let year_dir = month_dir.parent()?;

    let month: u32 = month_dir.file_name()?.to_str()?.parse().ok()?;
    let year: i32 = year_dir.file_name()?.to_str()?.parse().ok()?;

    ArchiveMonth::new(year, month).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_month_window() {
        let month = ArchiveMonth::new(2020, 9).unwrap();
        assert_eq!(month.start(), Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap());
        assert_eq!(month.end(), Utc.with_ymd_and_hms(2020, 10, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_december_rolls_over() {
        let month = ArchiveMonth::new(2019, 12).unwrap();
        assert_eq!(month.end(), Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_contains_is_half_open() {
        let month = ArchiveMonth::new(2021, 2).unwrap();
        assert!(month.contains(month.start()));
        assert!(month.contains(month.end() - TimeDelta::seconds(1)));
        assert!(!month.contains(month.end()));
        assert!(!month.contains(month.start() - TimeDelta::minutes(1)));
    }

    #[test]
    fn test_invalid_month() {
        assert_eq!(
            ArchiveMonth::new(2020, 13),
            Err(MonthError::OutOfRange {
                year: 2020,
                month: 13
            })
        );
        assert!(ArchiveMonth::new(2020, 0).is_err());
    }

    #[test]
    fn test_parse_and_display() {
        let month: ArchiveMonth = "2016-03".parse().unwrap();
        assert_eq!(month.year(), 2016);
        assert_eq!(month.month(), 3);
        assert_eq!(month.to_string(), "2016-03");
        assert!("2016/03".parse::<ArchiveMonth>().is_err());
        assert!("2016-xx".parse::<ArchiveMonth>().is_err());
    }

    #[test]
    fn test_month_from_path() {
        let path = Path::new("download/metaquotes/EURUSD/2017/04/0123456789abcdef0123456789abcdef.dat");
        let month = month_from_path(path).unwrap();
        assert_eq!(month, ArchiveMonth::new(2017, 4).unwrap());

        assert!(month_from_path(Path::new("archive.dat")).is_none());
        assert!(month_from_path(Path::new("EURUSD/latest/13/a.dat")).is_none());
    }
}
