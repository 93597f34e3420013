//! `/api/<segment>` date endpoint
//!
//! A numeric segment is read as epoch milliseconds and echoed back as a
//! human readable date; anything else is parsed as a date and answered with
//! its epoch milliseconds. All times are UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use hyper::Response;
use serde::Serialize;

use crate::error::Result;
use crate::http::{build_json_response, RouterBody};
use crate::router::RouteRequest;

/// Largest distance from the epoch a date may have, in milliseconds
const MAX_TIME_MS: f64 = 8.64e15;

const INVALID_DATE: &str = "Invalid Date";

/// Month-name layouts tried after whitespace and commas are normalized
const NAMED_LAYOUTS: &[&str] = &[
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%Y %B %d %H:%M:%S",
    "%Y %B %d %H:%M",
];

const NAMED_DATE_LAYOUTS: &[&str] = &["%B %d %Y", "%d %B %Y", "%Y %B %d"];

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DateReply {
    Date(String),
    Time(i64),
    Error(&'static str),
}

pub async fn date_api(req: RouteRequest) -> Result<Response<RouterBody>> {
    let reply = lookup(req.capture(1).unwrap_or_default());
    Ok(build_json_response(serde_json::to_string(&reply)?))
}

/// Answer one segment; the bad-format case still goes out as a 200
pub fn lookup(segment: &str) -> DateReply {
    if let Some(ms) = parse_number(segment) {
        return DateReply::Date(format_date(ms));
    }
    match parse_date(segment) {
        Some(time) => DateReply::Time(time.timestamp_millis()),
        None => DateReply::Error("Bad date format"),
    }
}

/// Read `text` the way a JavaScript `Number(text)` conversion would
///
/// Returns `None` where that conversion yields `NaN`.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        let head = text.get(..2).map(str::to_ascii_lowercase);
        if head.as_deref() == Some(prefix) {
            return parse_radix(&text[2..], radix);
        }
    }

    let (sign, unsigned) = match text.as_bytes()[0] {
        b'-' => (-1.0, &text[1..]),
        b'+' => (1.0, &text[1..]),
        _ => (1.0, text),
    };
    if unsigned == "Infinity" {
        return Some(sign * f64::INFINITY);
    }

    // Keep out the `inf` and `nan` spellings Rust accepts but JS does not
    let decimal_chars = |c: char| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-');
    if !text.chars().all(decimal_chars) {
        return None;
    }
    text.parse::<f64>().ok()
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|d| acc.mul_add(f64::from(radix), f64::from(d)))
    })
}

/// Render epoch milliseconds like `Date.prototype.toString` does in UTC
///
/// `Tue Nov 14 2023 22:13:20 GMT+0000 (Coordinated Universal Time)`
pub fn format_date(ms: f64) -> String {
    if !ms.is_finite() || ms.abs() > MAX_TIME_MS {
        return INVALID_DATE.to_string();
    }

    #[allow(clippy::cast_possible_truncation)]
    let Some(time) = DateTime::<Utc>::from_timestamp_millis(ms.trunc() as i64) else {
        return INVALID_DATE.to_string();
    };

    let year = time.year();
    let year = if year < 0 {
        format!("-{:04}", -year)
    } else {
        format!("{year:04}")
    };
    format!(
        "{} {} {} GMT+0000 (Coordinated Universal Time)",
        time.format("%a %b %d"),
        year,
        time.format("%H:%M:%S")
    )
}

/// Parse a date string, treating values without an offset as UTC
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Some(date) = parse_iso_date(text) {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(naive.and_utc());
        }
    }
    if let Some(time) = text
        .strip_suffix('Z')
        .and_then(|rest| NaiveDateTime::parse_from_str(rest, "%Y-%m-%dT%H:%M").ok())
    {
        return Some(time.and_utc());
    }
    if let Ok(time) = DateTime::parse_from_rfc2822(text) {
        return Some(time.with_timezone(&Utc));
    }
    parse_named(text)
}

fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d"))
        .ok()
}

/// `Jan 1 2024`, `January 1, 2024 10:30`, `Mon 1 January 2024`
fn parse_named(text: &str) -> Option<DateTime<Utc>> {
    let mut tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.first().is_some_and(|t| t.parse::<Weekday>().is_ok()) {
        tokens.remove(0);
    }
    if tokens
        .last()
        .is_some_and(|t| matches!(t.to_ascii_uppercase().as_str(), "GMT" | "UTC" | "Z"))
    {
        tokens.pop();
    }
    if tokens.is_empty() {
        return None;
    }
    let normalized = tokens.join(" ");

    for layout in NAMED_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, layout) {
            return Some(naive.and_utc());
        }
    }
    for layout in NAMED_DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, layout) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}
