//! Timestamp attribute parsing.
//!
//! Accepts `YYYY-MM-DDThh:mm:ss[.ffffff]([+-]hh:mm|Z)?` and normalises the
//! instant to UTC using the submitted offset.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SubmissionError;

lazy_static! {
    static ref TIMESTAMP_PATTERN: Regex = Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,6}))?(?:([+-])(\d{2}):(\d{2})|Z)?$"
    )
    .unwrap();
}

/// Parse a submission timestamp.
///
/// A seconds field of 60 (leap second) is clamped to 59.999999 since chrono
/// cannot represent it as a plain time of day.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SubmissionError> {
    let invalid = || SubmissionError::InvalidValue(format!("invalid datetime string: {:?}", value));

    let caps = TIMESTAMP_PATTERN.captures(value.trim()).ok_or_else(invalid)?;
    let field = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
    let (month, day, hour, minute) = (field(2), field(3), field(4), field(5));
    let mut second = field(6);
    let mut micros = caps
        .get(7)
        .map(|m| format!("{:0<6}", m.as_str()))
        .and_then(|padded| padded.parse::<u32>().ok())
        .unwrap_or(0);
    if second == 60 {
        second = 59;
        micros = 999_999;
    }

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_micro_opt(hour, minute, second, micros))
        .ok_or_else(invalid)?;

    let mut instant = naive.and_utc();
    if let Some(sign) = caps.get(8) {
        let (offset_hours, offset_minutes) = (field(9), field(10));
        if offset_hours > 23 || offset_minutes > 59 {
            return Err(invalid());
        }
        let offset = Duration::hours(offset_hours as i64) + Duration::minutes(offset_minutes as i64);
        instant = if sign.as_str() == "+" {
            instant - offset
        } else {
            instant + offset
        };
    }
    Ok(instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_plain_timestamp() {
        let ts = parse_timestamp("2007-09-28T16:09:20").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2007, 9, 28));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (16, 9, 20));
        assert_eq!(ts.nanosecond(), 0);
    }

    #[test]
    fn test_fraction_is_right_padded() {
        let ts = parse_timestamp("2007-09-28T16:09:20.126842Z").unwrap();
        assert_eq!(ts.timestamp_subsec_micros(), 126842);

        let ts = parse_timestamp("2007-09-28T16:09:20.12").unwrap();
        assert_eq!(ts.timestamp_subsec_micros(), 120000);
    }

    #[test]
    fn test_offsets_normalise_to_utc() {
        let plus = parse_timestamp("2007-09-28T16:09:20+02:30").unwrap();
        assert_eq!((plus.hour(), plus.minute()), (13, 39));

        let minus = parse_timestamp("2007-09-28T16:09:20-05:00").unwrap();
        assert_eq!((minus.hour(), minus.minute()), (21, 9));

        let rollover = parse_timestamp("2007-12-31T23:30:00-01:00").unwrap();
        assert_eq!((rollover.year(), rollover.month(), rollover.day()), (2008, 1, 1));
    }

    #[test]
    fn test_leap_second_is_clamped() {
        let ts = parse_timestamp("2005-12-31T23:59:60").unwrap();
        assert_eq!(ts.second(), 59);
        assert_eq!(ts.timestamp_subsec_micros(), 999_999);
    }

    #[test]
    fn test_malformed_timestamps() {
        for bad in [
            "2007-09-28 16:09:20",
            "2007-09-28T16:09",
            "2007-13-01T00:00:00",
            "2007-02-30T00:00:00",
            "2007-09-28T25:00:00",
            "2007-09-28T16:09:20.1234567",
            "2007-09-28T16:09:20+0200",
            "yesterday",
        ] {
            assert!(parse_timestamp(bad).is_err(), "{} should be rejected", bad);
        }
    }
}
