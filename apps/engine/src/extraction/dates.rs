//! Date-range patterns for experience durations.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::DateRange;

const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let date = format!(r"(?:{MONTH}\.?\s+\d{{4}}|\d{{1,2}}/\d{{4}}|\d{{4}}-\d{{2}}|\d{{4}})");
    let pattern = format!(
        r"\b(?P<start>{date})\s*(?:-|to|until)\s*(?P<end>{date}|present|current|now|today)\b"
    );
    Regex::new(&pattern).unwrap()
});

static MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(?P<m>{MONTH})\.?\s+(?P<y>\d{{4}})$")).unwrap());
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<m>\d{1,2})/(?P<y>\d{4})$").unwrap());
static ISO_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<y>\d{4})-(?P<m>\d{2})$").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?P<y>\d{4})$").unwrap());

const EARLIEST_YEAR: i32 = 1950;
const LATEST_YEAR: i32 = 2100;

/// Written style of a single date, used for the consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    MonthYear,
    NumericMonthYear,
    IsoMonth,
    YearOnly,
    Present,
}

/// A date range found in a line, with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundRange {
    pub range: DateRange,
    pub start_format: DateFormat,
    pub end_format: DateFormat,
    pub span: (usize, usize),
}

/// First plausible date range in `line` (lower-cased text).
pub fn find_date_range(line: &str) -> Option<FoundRange> {
    DATE_RANGE_RE.captures_iter(line).find_map(|caps| {
        let whole = caps.get(0)?;
        let (start, start_format) = parse_date(caps.name("start")?.as_str())?;
        let end_text = caps.name("end")?.as_str();
        let (end, end_format) = match end_text {
            "present" | "current" | "now" | "today" => (None, DateFormat::Present),
            other => {
                let (date, format) = parse_date(other)?;
                (Some(date), format)
            }
        };
        if end.is_some_and(|e| e < start) {
            return None;
        }
        Some(FoundRange {
            range: DateRange { start, end },
            start_format,
            end_format,
            span: (whole.start(), whole.end()),
        })
    })
}

/// Parses one date. Year-only dates resolve to January.
pub fn parse_date(text: &str) -> Option<(NaiveDate, DateFormat)> {
    let text = text.trim();
    let (year, month, format) = if let Some(c) = MONTH_YEAR_RE.captures(text) {
        (
            c["y"].parse().ok()?,
            month_number(&c["m"])?,
            DateFormat::MonthYear,
        )
    } else if let Some(c) = NUMERIC_RE.captures(text) {
        (
            c["y"].parse().ok()?,
            c["m"].parse().ok()?,
            DateFormat::NumericMonthYear,
        )
    } else if let Some(c) = ISO_MONTH_RE.captures(text) {
        (c["y"].parse().ok()?, c["m"].parse().ok()?, DateFormat::IsoMonth)
    } else if let Some(c) = YEAR_RE.captures(text) {
        (c["y"].parse().ok()?, 1, DateFormat::YearOnly)
    } else {
        return None;
    };

    if !(EARLIEST_YEAR..=LATEST_YEAR).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| (d, format))
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect();
    let n = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}
