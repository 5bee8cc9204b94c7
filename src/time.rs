//! Date and time parsing for query terms.
//!
//! All wall-clock interpretation goes through a [`TimeContext`], which pairs an
//! explicit time zone with the instant treated as "now". Nothing here consults
//! the host's local zone, so a query means the same thing wherever it is
//! evaluated.
//!
//! Months are 1-based throughout: `2024-01-05` is the fifth of January.

use jiff::civil::{Date, DateTime, Time};
use jiff::fmt::strtime::BrokenDownTime;
use jiff::tz::TimeZone;
use jiff::{Span, Timestamp, Zoned};
use regex::Regex;
use std::sync::LazyLock;

/// Default display format for instants.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `YYYY-MM-DD`
static ISO_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("Invalid ISO date regex")
});

/// `YYYYMMDD`
static COMPACT_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})$").expect("Invalid compact date regex")
});

/// `H:MM` or `H:MM:SS`, hour with one or two digits
static DAYTIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?$").expect("Invalid daytime regex")
});

/// `HMM`, `HHMM`, `HMMSS` or `HHMMSS`
static COMPACT_DAYTIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,2})([0-9]{2})([0-9]{2})?$").expect("Invalid compact daytime regex")
});

/// Relative offsets such as `-1d`, `+2h` or `30 min`.
static OFFSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([+-]?)([0-9]+)\s*(s|secs?|seconds?|m|mins?|minutes?|h|hrs?|hours?|d|days?|w|wks?|weeks?)$",
    )
    .expect("Invalid offset regex")
});

/// A time zone plus the instant considered to be "now".
///
/// Capturing "now" once per compile keeps every term of a query evaluated
/// against the same instant, and lets tests pin the clock.
#[derive(Debug, Clone)]
pub struct TimeContext {
    tz: TimeZone,
    now: Timestamp,
}

impl TimeContext {
    /// Uses the current system time as "now".
    pub fn capture(tz: TimeZone) -> Self {
        Self::at(tz, Timestamp::now())
    }

    pub fn at(tz: TimeZone, now: Timestamp) -> Self {
        Self { tz, now }
    }

    /// Looks up an IANA time zone name, e.g. `America/New_York`.
    pub fn from_name(name: &str) -> Result<Self, jiff::Error> {
        Ok(Self::capture(TimeZone::get(name)?))
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.tz
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// "Now" as wall-clock time in the context's zone.
    pub fn now_zoned(&self) -> Zoned {
        self.now.to_zoned(self.tz.clone())
    }

    /// The civil date of "now" in the context's zone.
    pub fn today(&self) -> Date {
        self.now_zoned().date()
    }

    /// Resolves a wall-clock date and time in the context's zone to an instant.
    pub fn to_instant(&self, datetime: DateTime) -> Option<Timestamp> {
        self.tz.to_zoned(datetime).ok().map(|zoned| zoned.timestamp())
    }
}

/// Parses a date: `today`, `yesterday`, `tomorrow`, `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(input: &str, time: &TimeContext) -> Option<Date> {
    let input = input.trim();

    let shift = match input {
        "today" => Some(0),
        "yesterday" => Some(-1),
        "tomorrow" => Some(1),
        _ => None,
    };
    if let Some(days) = shift {
        return time.today().checked_add(Span::new().days(days)).ok();
    }

    let caps = ISO_DATE_REGEX
        .captures(input)
        .or_else(|| COMPACT_DATE_REGEX.captures(input))?;
    let year: i16 = caps[1].parse().ok()?;
    let month: i8 = caps[2].parse().ok()?;
    let day: i8 = caps[3].parse().ok()?;
    Date::new(year, month, day).ok()
}

/// Parses a time of day: `H:MM[:SS]` or `HHMM[SS]`. Seconds default to zero.
pub fn parse_daytime(input: &str) -> Option<Time> {
    let input = input.trim();

    let caps = DAYTIME_REGEX
        .captures(input)
        .or_else(|| COMPACT_DAYTIME_REGEX.captures(input))?;
    let hour: i8 = caps[1].parse().ok()?;
    let minute: i8 = caps[2].parse().ok()?;
    let second: i8 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Time::new(hour, minute, second, 0).ok()
}

/// Parses `DATE` or `DATE DAYTIME` into an instant in the context's zone.
///
/// A bare date means midnight at the start of that day, or, when
/// `is_range_end` is set, midnight at the start of the following day.
pub fn parse_time(input: &str, is_range_end: bool, time: &TimeContext) -> Option<Timestamp> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.is_empty() || parts.len() > 2 {
        return None;
    }

    let date = parse_date(parts[0], time)?;

    if let Some(daytime) = parts.get(1) {
        let daytime = parse_daytime(daytime)?;
        return time.to_instant(date.to_datetime(daytime));
    }

    let date = if is_range_end {
        date.tomorrow().ok()?
    } else {
        date
    };
    time.to_instant(date.to_datetime(Time::midnight()))
}

/// Parses a relative offset from "now", e.g. `-1d`, `+2h`, `90m`, or `now`.
///
/// A leading `-`, or no sign at all, reaches back in time. Days and weeks are
/// calendar days in the context's zone, not fixed multiples of 24 hours.
pub fn parse_offset(input: &str, time: &TimeContext) -> Option<Timestamp> {
    let input = input.trim();
    if input == "now" {
        return Some(time.now());
    }

    let caps = OFFSET_REGEX.captures(input)?;
    let amount: i64 = caps[2].parse().ok()?;
    let amount = if &caps[1] == "+" { amount } else { -amount };

    let span = match caps[3].chars().next()? {
        's' => Span::new().try_seconds(amount),
        'm' => Span::new().try_minutes(amount),
        'h' => Span::new().try_hours(amount),
        'd' => Span::new().try_days(amount),
        'w' => Span::new().try_weeks(amount),
        _ => return None,
    }
    .ok()?;

    time.now_zoned()
        .checked_add(span)
        .ok()
        .map(|zoned| zoned.timestamp())
}

/// Parses either a relative offset or an absolute date/time.
pub fn parse_time_or_offset(
    input: &str,
    is_range_end: bool,
    time: &TimeContext,
) -> Option<Timestamp> {
    parse_offset(input, time).or_else(|| parse_time(input, is_range_end, time))
}

/// Formats an instant as wall-clock time in `tz` using a strftime-style format.
pub fn format_time(instant: Timestamp, tz: &TimeZone, format: &str) -> Result<String, jiff::Error> {
    let zoned = instant.to_zoned(tz.clone());
    BrokenDownTime::from(&zoned).to_string(format)
}

/// Formats an elapsed duration in seconds for display.
///
/// Sub-minute durations keep two or three significant digits with a unit;
/// longer ones render as `M:SS` or `H:MM:SS`.
pub fn format_elapsed(elapsed: f64) -> String {
    if elapsed < 1e-5 {
        format!("{} µs", to_precision(elapsed * 1e6, 2))
    } else if elapsed < 1e-3 {
        format!("{} µs", to_precision(elapsed * 1e6, 3))
    } else if elapsed < 1e-2 {
        format!("{} ms", to_precision(elapsed * 1e3, 2))
    } else if elapsed < 1.0 {
        format!("{} ms", to_precision(elapsed * 1e3, 3))
    } else if elapsed < 10.0 {
        format!("{} s", to_precision(elapsed, 2))
    } else if elapsed < 60.0 {
        format!("{} s", to_precision(elapsed, 3))
    } else if elapsed < 3600.0 {
        format!(
            "{}:{:02}",
            (elapsed / 60.0).trunc() as u64,
            (elapsed % 60.0).trunc() as u64
        )
    } else {
        format!(
            "{}:{:02}:{:02}",
            (elapsed / 3600.0).trunc() as u64,
            (elapsed / 60.0 % 60.0).trunc() as u64,
            (elapsed % 60.0).trunc() as u64
        )
    }
}

/// Renders `value` with `precision` significant digits in fixed notation.
fn to_precision(value: f64, precision: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{:.*}", (precision - 1).max(0) as usize, value);
    }
    let mut magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(precision - 1 - magnitude);
    let rounded = (value * scale).round() / scale;
    // Rounding may carry into the next power of ten, e.g. 9.96 -> 10.
    if rounded.abs() >= 10f64.powi(magnitude + 1) {
        magnitude += 1;
    }
    let decimals = (precision - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::tz::offset;

    /// 2024-03-09 22:00 in a UTC-5 zone.
    fn context() -> TimeContext {
        let now: Timestamp = "2024-03-10T03:00:00Z".parse().unwrap();
        TimeContext::at(TimeZone::fixed(offset(-5)), now)
    }

    fn date(y: i16, m: i8, d: i8) -> Date {
        Date::new(y, m, d).unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_date_keywords_use_context_zone() {
        let time = context();
        assert_eq!(time.today(), date(2024, 3, 9));
        assert_eq!(parse_date("today", &time), Some(date(2024, 3, 9)));
        assert_eq!(parse_date("yesterday", &time), Some(date(2024, 3, 8)));
        assert_eq!(parse_date(" tomorrow ", &time), Some(date(2024, 3, 10)));
    }

    #[test]
    fn test_parse_date_formats() {
        let time = context();
        assert_eq!(parse_date("2024-01-05", &time), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("20240105", &time), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("2024-1-5", &time), None);
        assert_eq!(parse_date("2024-02-30", &time), None);
        assert_eq!(parse_date("Today", &time), None);
        assert_eq!(parse_date("", &time), None);
    }

    #[test]
    fn test_parse_daytime() {
        assert_eq!(parse_daytime("9:05"), Some(Time::new(9, 5, 0, 0).unwrap()));
        assert_eq!(parse_daytime("09:05:30"), Some(Time::new(9, 5, 30, 0).unwrap()));
        assert_eq!(parse_daytime("1234"), Some(Time::new(12, 34, 0, 0).unwrap()));
        assert_eq!(parse_daytime("905"), Some(Time::new(9, 5, 0, 0).unwrap()));
        assert_eq!(parse_daytime("123456"), Some(Time::new(12, 34, 56, 0).unwrap()));
        assert_eq!(parse_daytime("12345"), Some(Time::new(1, 23, 45, 0).unwrap()));
        assert_eq!(parse_daytime("25:00"), None);
        assert_eq!(parse_daytime("12:5"), None);
        assert_eq!(parse_daytime("noon"), None);
    }

    #[test]
    fn test_parse_time_date_only() {
        let time = context();
        assert_eq!(
            parse_time("2024-01-05", false, &time),
            Some(ts("2024-01-05T05:00:00Z"))
        );
        // A bare date used as a range end runs through the end of that day.
        assert_eq!(
            parse_time("2024-01-05", true, &time),
            Some(ts("2024-01-06T05:00:00Z"))
        );
    }

    #[test]
    fn test_parse_time_with_daytime() {
        let time = context();
        assert_eq!(
            parse_time("2024-01-05 13:30", true, &time),
            Some(ts("2024-01-05T18:30:00Z"))
        );
        assert_eq!(
            parse_time("yesterday 0600", false, &time),
            Some(ts("2024-03-08T11:00:00Z"))
        );
    }

    #[test]
    fn test_parse_time_rejects_bad_input() {
        let time = context();
        assert_eq!(parse_time("", false, &time), None);
        assert_eq!(parse_time("2024-01-05 13:30 extra", false, &time), None);
        assert_eq!(parse_time("2024-01-05 lunch", false, &time), None);
        assert_eq!(parse_time("soon", false, &time), None);
    }

    #[test]
    fn test_parse_offset() {
        let time = context();
        assert_eq!(parse_offset("now", &time), Some(time.now()));
        assert_eq!(parse_offset("-1d", &time), Some(ts("2024-03-09T03:00:00Z")));
        assert_eq!(parse_offset("1d", &time), Some(ts("2024-03-09T03:00:00Z")));
        assert_eq!(parse_offset("+2h", &time), Some(ts("2024-03-10T05:00:00Z")));
        assert_eq!(parse_offset("-30 min", &time), Some(ts("2024-03-10T02:30:00Z")));
        assert_eq!(parse_offset("-1w", &time), Some(ts("2024-03-03T03:00:00Z")));
        assert_eq!(parse_offset("-1y", &time), None);
        assert_eq!(parse_offset("2024-01-05", &time), None);
    }

    #[test]
    fn test_parse_offset_days_follow_calendar() {
        // Noon on the day US clocks spring forward.
        let tz = TimeZone::get("America/New_York").unwrap();
        let time = TimeContext::at(tz, ts("2024-03-10T16:00:00Z"));
        assert_eq!(parse_offset("-1d", &time), Some(ts("2024-03-09T17:00:00Z")));
        assert_eq!(parse_offset("-24h", &time), Some(ts("2024-03-09T16:00:00Z")));
    }

    #[test]
    fn test_parse_time_or_offset() {
        let time = context();
        assert_eq!(
            parse_time_or_offset("-2h", false, &time),
            Some(ts("2024-03-10T01:00:00Z"))
        );
        assert_eq!(
            parse_time_or_offset("today", false, &time),
            Some(ts("2024-03-09T05:00:00Z"))
        );
        assert_eq!(parse_time_or_offset("whenever", false, &time), None);
    }

    #[test]
    fn test_format_time() {
        let time = context();
        let formatted = format_time(time.now(), time.time_zone(), DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(formatted, "2024-03-09 22:00:00");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0.0000025), "2.5 µs");
        assert_eq!(format_elapsed(0.25), "250 ms");
        assert_eq!(format_elapsed(5.0), "5.0 s");
        assert_eq!(format_elapsed(42.0), "42.0 s");
        assert_eq!(format_elapsed(125.0), "2:05");
        assert_eq!(format_elapsed(3725.0), "1:02:05");
        assert_eq!(format_elapsed(7250.0), "2:00:50");
    }
}
