//! Time parsing, differencing and formatting helpers
//!
//! Elapsed times are whole seconds held in `i64`. Differences between timestamps are
//! floored, so a competitor read out at 25:26.685 after the start has 1526 seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Layout of formatted durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HmsFormat {
    /// `M:SS`, or `H:MM:SS` from one hour up
    #[default]
    Short,
    /// Always `HH:MM:SS`
    Full,
}

/// Parse `SS`, `M:SS` or `H:MM:SS` into seconds. Fractional seconds are ignored.
///
/// Returns `None` for empty or non-numeric input.
pub fn parse_duration(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let whole = trimmed.split('.').next().unwrap_or_default();
    let mut seconds = 0i64;
    let mut unit = 1i64;
    for part in whole.rsplit(':') {
        let value: i64 = part.trim().parse().ok()?;
        seconds = seconds.checked_add(value.checked_mul(unit)?)?;
        unit = unit.checked_mul(60)?;
    }
    Some(seconds)
}

/// Format seconds as a clock-style duration. Negative input has no representation.
pub fn format_hms(seconds: i64, format: HmsFormat) -> Option<String> {
    if seconds < 0 {
        return None;
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    Some(match format {
        HmsFormat::Short if hours > 0 => format!("{hours}:{minutes:02}:{secs:02}"),
        HmsFormat::Short => format!("{minutes}:{secs:02}"),
        HmsFormat::Full => format!("{hours:02}:{minutes:02}:{secs:02}"),
    })
}

/// Whole seconds from `start` to `end`, floored.
pub fn time_difference(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    time_difference_millis(start, end).div_euclid(1000)
}

/// Milliseconds from `start` to `end`.
pub fn time_difference_millis(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds()
}

/// Join the date part of one value with the time part of another.
///
/// Both inputs may be full `YYYY-MM-DDTHH:MM:SS` values or bare dates/times, with a
/// space accepted in place of the `T`.
pub fn combine_date_and_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let normalized_date = date.trim().replacen(' ', "T", 1);
    let date_part = normalized_date.split('T').next()?;

    let normalized_time = time.trim().replacen(' ', "T", 1);
    let time_part = normalized_time.rsplit('T').next()?;
    let time_part = time_part.trim_end_matches('Z');

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time_part, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .ok()?;
    Some(date.and_time(time))
}

/// Clamp negative business time to zero.
pub fn to_positive_or_zero(value: i64) -> i64 {
    value.max(0)
}
