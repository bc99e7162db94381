// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.
//!
//! All instants are UTC. Calendar arithmetic (week boundaries, distinct-day
//! counts) therefore uses UTC dates as well.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Start of the week containing `now`: the most recent Sunday at 00:00:00 UTC.
pub fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_sunday = now.weekday().num_days_from_sunday() as i64;
    let sunday = now.date_naive() - Duration::days(days_from_sunday);
    sunday.and_time(NaiveTime::MIN).and_utc()
}

/// Start of a calendar day (00:00:00 UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// End of a calendar day (23:59:59.999 UTC).
///
/// Date-only range filters are inclusive of the named end day, so the HTTP
/// layer expands them to this instant.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let next = date + Duration::days(1);
    next.and_time(NaiveTime::MIN).and_utc() - Duration::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_of_week_mid_week() {
        // 2026-08-19 is a Wednesday; week starts Sunday 2026-08-16.
        let now = Utc.with_ymd_and_hms(2026, 8, 19, 14, 30, 0).unwrap();
        let start = start_of_week(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_start_of_week_on_sunday() {
        // A Sunday is its own week start.
        let now = Utc.with_ymd_and_hms(2026, 8, 16, 23, 59, 59).unwrap();
        let start = start_of_week(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_end_of_day_millis() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 19).unwrap();
        let end = end_of_day(date);
        assert_eq!(end.to_rfc3339(), "2026-08-19T23:59:59.999+00:00");
    }

    #[test]
    fn test_format_utc_rfc3339_z_suffix() {
        let date = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2026-01-15T10:30:00Z");
    }
}
