// Parsing and formatting helpers.
//
// This module centralizes the "dirty" text handling: forgiving field parsers
// for the decoder and the single comma-decimal / dd.mm.yyyy convention used
// by every report.
use chrono::{DateTime, Datelike, Month, NaiveDate, NaiveDateTime, NaiveTime};
use num_format::{Locale, ToFormattedString};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Parse a decimal field.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (`inf`, `NaN`, units).
/// - When `decimal_comma` is set, rewrites `,` to `.` first; otherwise a comma
///   makes the value invalid.
pub fn parse_f64(s: &str, decimal_comma: bool) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if decimal_comma {
        s.replace(',', ".").parse::<f64>().ok()
    } else {
        s.parse::<f64>().ok()
    }
}

pub fn parse_u64(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

pub fn parse_u32(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok()
}

/// `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Date plus time in the space- or `T`-separated ISO forms, with optional
/// fractional seconds. A UTC offset is stripped: the wall-clock time is kept
/// as written. A bare date means midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const NAIVE: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    const OFFSET: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
    ];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NAIVE
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            OFFSET
                .iter()
                .find_map(|f| DateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.naive_local())
        })
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub fn average(sum: f64, count: usize) -> f64 {
    // Empty groups average to zero instead of NaN.
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Fixed fraction digits with a comma separator and no grouping:
/// `1234.5` becomes `1234,50`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, n);
    // Rounding can leave a negative zero behind.
    let s = match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => s,
    };
    s.replace('.', ",")
}

pub fn format_decimal(n: f64) -> String {
    format_number(n, 2)
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%d.%m.%Y").to_string()
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H.%M").to_string()
}

/// English weekday name, Monday first.
pub fn weekday_name(d: NaiveDate) -> &'static str {
    WEEKDAYS[d.weekday().num_days_from_monday() as usize]
}

/// English month name for 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in log lines, e.g. `8,760 rows read`.
    n.to_formatted_string(&Locale::en)
}
