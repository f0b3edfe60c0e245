//! Input format patterns.
//!
//! Every user-supplied value (DATE, TIME, PLATE and the times inside schedule
//! windows) is checked against one of the anchored patterns below. The
//! `parse_*` helpers validate and extract in one step so callers never
//! re-parse a string they already checked.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Calendar date as YYYY/MM/DD (month 01-12, day 01-31)
    pub static ref DATE_PATTERN: Regex = Regex::new(
        r"^([0-9]{4})/(0[1-9]|1[0-2])/(0[1-9]|[12][0-9]|3[01])$"
    ).unwrap();

    /// 24 hour clock time as HH:MM
    pub static ref TIME_PATTERN: Regex = Regex::new(
        r"^([01][0-9]|2[0-3]):([0-5][0-9])$"
    ).unwrap();

    /// Plate as three uppercase letters followed by four digits (AAA9999)
    pub static ref PLATE_PATTERN: Regex = Regex::new(
        r"^[A-Z]{3}[0-9]{4}$"
    ).unwrap();
}

/// Offset of the digit that decides the restriction.
pub const LAST_DIGIT_OFFSET: usize = 6;

/// Parse a `YYYY/MM/DD` date.
///
/// Returns `None` when the text does not match the pattern or names a day
/// that does not exist in that month (e.g. `2021/02/29`).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let caps = DATE_PATTERN.captures(input)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an `HH:MM` time into minutes since midnight.
pub fn parse_time(input: &str) -> Option<u32> {
    let caps = TIME_PATTERN.captures(input)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    Some(hour * 60 + minute)
}

/// Parse an `AAA9999` plate and return its last digit.
pub fn parse_plate(input: &str) -> Option<u8> {
    if !PLATE_PATTERN.is_match(input) {
        return None;
    }
    input
        .as_bytes()
        .get(LAST_DIGIT_OFFSET)
        .map(|b| b - b'0')
}

/// Check if the text is a valid date.
pub fn is_valid_date(input: &str) -> bool {
    parse_date(input).is_some()
}

/// Check if the text is a valid time.
pub fn is_valid_time(input: &str) -> bool {
    TIME_PATTERN.is_match(input)
}

/// Check if the text is a valid plate.
pub fn is_valid_plate(input: &str) -> bool {
    PLATE_PATTERN.is_match(input)
}

/// Render minutes since midnight as `HH:MM`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
