//! Signed `±HHMM` time offset applied to rendered timestamps.

use chrono::{DateTime, TimeDelta, Utc};
use std::str::FromStr;

use crate::TimeOffsetError;

/// Signed offset added to bar timestamps at output time.
///
/// The sign applies to both the hour and the minute component, so `-0130`
/// shifts timestamps back by ninety minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeOffset {
    minutes: i32,
}

impl TimeOffset {
    /// No offset.
    pub const ZERO: Self = Self { minutes: 0 };

    /// Creates an offset from a signed number of minutes.
    #[must_use]
    pub const fn from_minutes(minutes: i32) -> Self {
        Self { minutes }
    }

    /// Returns the offset in minutes.
    #[must_use]
    pub const fn minutes(&self) -> i32 {
        self.minutes
    }

    /// Returns the offset as a [`TimeDelta`].
    #[must_use]
    pub fn as_delta(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.minutes))
    }

    /// Applies the offset to an instant.
    #[must_use]
    pub fn apply(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        instant + self.as_delta()
    }

    /// Returns true if this is the zero offset.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.minutes == 0
    }
}

impl FromStr for TimeOffset {
    type Err = TimeOffsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeOffsetError(s.to_string());
        let (sign, digits) = match s.as_bytes().first() {
            Some(b'-') => (-1, &s[1..]),
            Some(b'+') => (1, &s[1..]),
            _ => (1, s),
        };

        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        Ok(Self::from_minutes(sign * (hours * 60 + minutes)))
    }
}

impl std::fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.unsigned_abs();
        write!(f, "{sign}{:02}{:02}", abs / 60, abs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_positive() {
        let offset: TimeOffset = "+0200".parse().unwrap();
        assert_eq!(offset.minutes(), 120);
        let unsigned: TimeOffset = "0330".parse().unwrap();
        assert_eq!(unsigned.minutes(), 210);
    }

    #[test]
    fn test_sign_applies_to_minutes() {
        let offset: TimeOffset = "-0130".parse().unwrap();
        assert_eq!(offset.minutes(), -90);
        assert_eq!(offset.to_string(), "-0130");
    }

    #[test]
    fn test_apply() {
        let offset: TimeOffset = "+0300".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2020, 9, 13, 22, 30, 0).unwrap();
        assert_eq!(
            offset.apply(instant),
            Utc.with_ymd_and_hms(2020, 9, 14, 1, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid() {
        for input in ["", "+2", "+02:00", "+0260", "abcd", "--0100"] {
            assert!(input.parse::<TimeOffset>().is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn test_zero_default() {
        assert!(TimeOffset::default().is_zero());
        assert_eq!(TimeOffset::ZERO.to_string(), "+0000");
    }
}
