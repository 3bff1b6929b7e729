//! Strict ISO 8601 / RFC 9557 grammar for temporal strings.
//!
//! Accepts the extended format (`2021-04-22T10:25:05`) and the basic format
//! (`20210422T102505`), a `,` fraction separator, lower-case designators,
//! U+2212 as a minus sign and a leap second of 60 (read as 59).

use std::sync::LazyLock;

use regex::Regex;

use crate::calendar::days_in_month;
use crate::error::{TemporalError, TemporalResult};
use crate::iso::{IsoDate, IsoTime};
use crate::options::{NS_PER_HOUR, NS_PER_MIN, NS_PER_SEC};

static ANNOTATION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_-]*$").expect("annotation key pattern"));
static ANNOTATION_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("annotation value pattern")
});
static TIME_ZONE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z._][A-Za-z0-9._+-]*(/[A-Za-z._][A-Za-z0-9._+-]*)*$")
        .expect("time zone name pattern")
});

/// A numeric UTC offset as written in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedOffset {
    pub nanoseconds: i64,
    /// Seconds (or a fraction) were written, so matching must be exact.
    pub has_sub_minute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDateTime {
    pub date: IsoDate,
    pub time: Option<IsoTime>,
    pub utc_designator: bool,
    pub offset: Option<ParsedOffset>,
    pub time_zone: Option<String>,
    pub calendar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedYearMonth {
    pub year: i32,
    pub month: u8,
    /// Present when the source was a full date.
    pub reference_day: Option<u8>,
    pub calendar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMonthDay {
    pub month: u8,
    pub day: u8,
    /// Present when the source was a full date.
    pub reference_year: Option<i32>,
    pub calendar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTime {
    pub time: IsoTime,
    pub calendar: Option<String>,
}

/// Magnitudes of a duration string, already split into canonical
/// sub-second components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedDuration {
    pub negative: bool,
    pub years: u128,
    pub months: u128,
    pub weeks: u128,
    pub days: u128,
    pub hours: u128,
    pub minutes: u128,
    pub seconds: u128,
    pub milliseconds: u128,
    pub microseconds: u128,
    pub nanoseconds: u128,
}

fn invalid(s: &str) -> TemporalError {
    TemporalError::range(format!("invalid ISO 8601 string: {s}"))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_any(&mut self, set: &[u8]) -> Option<u8> {
        let b = self.peek()?;
        if set.contains(&b) {
            self.pos += 1;
            Some(b)
        } else {
            None
        }
    }

    fn digits(&mut self, count: usize) -> Option<u32> {
        let slice = self.bytes.get(self.pos..self.pos + count)?;
        let mut value = 0u32;
        for &b in slice {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value * 10 + (b - b'0') as u32;
        }
        self.pos += count;
        Some(value)
    }

    fn two_digits(&mut self) -> Option<u8> {
        self.digits(2).map(|v| v as u8)
    }

    fn digit_run(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        // ASCII digits only
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    /// Up to nine fraction digits after a `.` or `,`, scaled to nanoseconds.
    fn fraction(&mut self) -> Option<Option<u32>> {
        if self.eat_any(b".,").is_none() {
            return Some(None);
        }
        let digits = self.digit_run();
        if digits.is_empty() || digits.len() > 9 {
            return None;
        }
        let mut padded = digits.to_string();
        padded.extend(std::iter::repeat_n('0', 9 - digits.len()));
        padded.parse().ok().map(Some)
    }
}

fn normalize(s: &str) -> String {
    s.replace('\u{2212}', "-")
}

fn parse_year(cur: &mut Cursor<'_>) -> Option<i32> {
    match cur.eat_any(b"+-") {
        Some(sign) => {
            let year = cur.digits(6)? as i32;
            if sign == b'-' && year == 0 {
                return None;
            }
            Some(if sign == b'-' { -year } else { year })
        }
        None => cur.digits(4).map(|y| y as i32),
    }
}

/// `YYYY-MM-DD` or `YYYYMMDD`.
fn parse_date(cur: &mut Cursor<'_>) -> Option<IsoDate> {
    let year = parse_year(cur)?;
    let extended = cur.eat(b'-');
    let month = cur.two_digits()?;
    if extended && !cur.eat(b'-') {
        return None;
    }
    let day = cur.two_digits()?;
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return None;
    }
    Some(IsoDate::new_unchecked(year, month, day))
}

/// `HH[:MM[:SS[.fff]]]` or `HH[MM[SS[.fff]]]`.
fn parse_time(cur: &mut Cursor<'_>) -> Option<IsoTime> {
    let hour = cur.two_digits()?;
    if hour > 23 {
        return None;
    }
    let mut time = IsoTime {
        hour,
        ..IsoTime::MIDNIGHT
    };
    let extended = cur.peek() == Some(b':');
    let minute_follows = if extended {
        cur.peek_at(1).is_some_and(|b| b.is_ascii_digit())
    } else {
        cur.peek().is_some_and(|b| b.is_ascii_digit())
    };
    if !minute_follows {
        return Some(time);
    }
    if extended {
        cur.pos += 1;
    }
    time.minute = cur.two_digits()?;
    if time.minute > 59 {
        return None;
    }
    let second_follows = if extended {
        cur.peek() == Some(b':')
    } else {
        cur.peek().is_some_and(|b| b.is_ascii_digit())
    };
    if !second_follows {
        return Some(time);
    }
    if extended {
        cur.pos += 1;
    }
    let second = cur.two_digits()?;
    if second > 60 {
        return None;
    }
    time.second = second.min(59);
    if let Some(ns) = cur.fraction()? {
        time.millisecond = (ns / 1_000_000) as u16;
        time.microsecond = (ns / 1_000 % 1_000) as u16;
        time.nanosecond = (ns % 1_000) as u16;
    }
    Some(time)
}

/// `±HH[:MM[:SS[.fff]]]` or `±HH[MM[SS[.fff]]]`. A fraction is only valid
/// after seconds.
fn parse_numeric_offset(cur: &mut Cursor<'_>) -> Option<ParsedOffset> {
    let sign: i64 = if cur.eat_any(b"+-")? == b'-' { -1 } else { 1 };
    let hours = cur.two_digits()? as i64;
    if hours > 23 {
        return None;
    }
    let mut total = hours * NS_PER_HOUR as i64;
    let mut has_sub_minute = false;
    let extended = cur.peek() == Some(b':');
    let minute_follows = if extended {
        cur.peek_at(1).is_some_and(|b| b.is_ascii_digit())
    } else {
        cur.peek().is_some_and(|b| b.is_ascii_digit())
    };
    if minute_follows {
        if extended {
            cur.pos += 1;
        }
        let minutes = cur.two_digits()? as i64;
        if minutes > 59 {
            return None;
        }
        total += minutes * NS_PER_MIN as i64;
        let second_follows = if extended {
            cur.peek() == Some(b':')
        } else {
            cur.peek().is_some_and(|b| b.is_ascii_digit())
        };
        if second_follows {
            if extended {
                cur.pos += 1;
            }
            let seconds = cur.two_digits()? as i64;
            if seconds > 59 {
                return None;
            }
            total += seconds * NS_PER_SEC as i64;
            total += cur.fraction()?.unwrap_or(0) as i64;
            has_sub_minute = true;
        }
    }
    Some(ParsedOffset {
        nanoseconds: sign * total,
        has_sub_minute,
    })
}

#[derive(Default)]
struct Annotations {
    time_zone: Option<String>,
    calendar: Option<String>,
}

fn parse_annotations(cur: &mut Cursor<'_>, source: &str) -> Option<Annotations> {
    let mut out = Annotations::default();
    let mut calendar_count = 0u32;
    let mut calendar_critical = false;
    let mut first = true;
    while cur.eat(b'[') {
        let critical = cur.eat(b'!');
        let start = cur.pos;
        while cur.peek().is_some_and(|b| b != b']') {
            cur.pos += 1;
        }
        if cur.at_end() {
            return None;
        }
        let body = source.get(start..cur.pos)?;
        cur.pos += 1;
        match body.split_once('=') {
            Some((key, value)) => {
                if !ANNOTATION_KEY.is_match(key) || !ANNOTATION_VALUE.is_match(value) {
                    return None;
                }
                if key == "u-ca" {
                    calendar_count += 1;
                    calendar_critical |= critical;
                    if out.calendar.is_none() {
                        out.calendar = Some(value.to_string());
                    }
                } else if critical {
                    return None;
                }
            }
            None => {
                // A time zone annotation must come first, and only once.
                if !first || out.time_zone.is_some() {
                    return None;
                }
                if body.starts_with(['+', '-']) {
                    let mut inner = Cursor::new(body);
                    parse_numeric_offset(&mut inner)?;
                    if !inner.at_end() {
                        return None;
                    }
                } else if !TIME_ZONE_NAME.is_match(body) {
                    return None;
                }
                out.time_zone = Some(body.to_string());
            }
        }
        first = false;
    }
    if calendar_count > 1 && calendar_critical {
        return None;
    }
    Some(out)
}

fn parse_date_time_inner(s: &str) -> Option<ParsedDateTime> {
    let mut cur = Cursor::new(s);
    let date = parse_date(&mut cur)?;
    let mut time = None;
    let mut utc_designator = false;
    let mut offset = None;
    if cur.eat_any(b"Tt ").is_some() {
        time = Some(parse_time(&mut cur)?);
        match cur.peek() {
            Some(b'Z' | b'z') => {
                cur.pos += 1;
                utc_designator = true;
            }
            Some(b'+' | b'-') => offset = Some(parse_numeric_offset(&mut cur)?),
            _ => {}
        }
    }
    let annotations = parse_annotations(&mut cur, s)?;
    if !cur.at_end() {
        return None;
    }
    Some(ParsedDateTime {
        date,
        time,
        utc_designator,
        offset,
        time_zone: annotations.time_zone,
        calendar: annotations.calendar,
    })
}

/// Any date or date-time string, with optional offset and annotations.
pub fn parse_date_time_string(s: &str) -> TemporalResult<ParsedDateTime> {
    let normalized = normalize(s);
    parse_date_time_inner(&normalized).ok_or_else(|| invalid(s))
}

/// Strings for plain dates and date-times: a `Z` designator is rejected
/// because it names an exact instant, not a wall-clock value.
pub fn parse_plain_date_time_string(s: &str) -> TemporalResult<ParsedDateTime> {
    let parsed = parse_date_time_string(s)?;
    if parsed.utc_designator {
        return Err(TemporalError::range(format!(
            "{s}: a Z designator is not allowed for a plain value"
        )));
    }
    Ok(parsed)
}

/// An instant string needs a time and either `Z` or a numeric offset.
pub fn parse_instant_string(s: &str) -> TemporalResult<ParsedDateTime> {
    let parsed = parse_date_time_string(s)?;
    if parsed.time.is_none() || (!parsed.utc_designator && parsed.offset.is_none()) {
        return Err(TemporalError::range(format!(
            "{s}: an instant needs a time and a UTC offset"
        )));
    }
    Ok(parsed)
}

/// A zoned string needs a bracketed time zone annotation.
pub fn parse_zoned_date_time_string(s: &str) -> TemporalResult<ParsedDateTime> {
    let parsed = parse_date_time_string(s)?;
    if parsed.time_zone.is_none() {
        return Err(TemporalError::range(format!(
            "{s}: a zoned date-time needs a time zone annotation"
        )));
    }
    Ok(parsed)
}

fn parse_year_month_inner(s: &str) -> Option<ParsedYearMonth> {
    let mut cur = Cursor::new(s);
    let year = parse_year(&mut cur)?;
    cur.eat(b'-');
    let month = cur.two_digits()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let annotations = parse_annotations(&mut cur, s)?;
    if !cur.at_end() {
        return None;
    }
    Some(ParsedYearMonth {
        year,
        month,
        reference_day: None,
        calendar: annotations.calendar,
    })
}

pub fn parse_year_month_string(s: &str) -> TemporalResult<ParsedYearMonth> {
    let normalized = normalize(s);
    if let Some(parsed) = parse_year_month_inner(&normalized) {
        return Ok(parsed);
    }
    let parsed = parse_plain_date_time_string(s)?;
    Ok(ParsedYearMonth {
        year: parsed.date.year,
        month: parsed.date.month,
        reference_day: Some(parsed.date.day),
        calendar: parsed.calendar,
    })
}

fn parse_month_day_inner(s: &str) -> Option<ParsedMonthDay> {
    let mut cur = Cursor::new(s);
    if cur.eat(b'-') && !cur.eat(b'-') {
        return None;
    }
    let month = cur.two_digits()?;
    cur.eat(b'-');
    let day = cur.two_digits()?;
    // 1972 is a leap year, so February 29 is accepted
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(1972, month) {
        return None;
    }
    let annotations = parse_annotations(&mut cur, s)?;
    if !cur.at_end() {
        return None;
    }
    Some(ParsedMonthDay {
        month,
        day,
        reference_year: None,
        calendar: annotations.calendar,
    })
}

pub fn parse_month_day_string(s: &str) -> TemporalResult<ParsedMonthDay> {
    let normalized = normalize(s);
    if let Some(parsed) = parse_month_day_inner(&normalized) {
        return Ok(parsed);
    }
    let parsed = parse_plain_date_time_string(s)?;
    Ok(ParsedMonthDay {
        month: parsed.date.month,
        day: parsed.date.day,
        reference_year: Some(parsed.date.year),
        calendar: parsed.calendar,
    })
}

fn parse_bare_time(s: &str, designator: bool) -> Option<ParsedTime> {
    let mut cur = Cursor::new(s);
    if designator && cur.eat_any(b"Tt").is_none() {
        return None;
    }
    let time = parse_time(&mut cur)?;
    if cur.peek().is_some_and(|b| b == b'+' || b == b'-') {
        parse_numeric_offset(&mut cur)?;
    }
    let annotations = parse_annotations(&mut cur, s)?;
    if !cur.at_end() {
        return None;
    }
    Some(ParsedTime {
        time,
        calendar: annotations.calendar,
    })
}

/// A time string: `T`-prefixed, bare when it cannot be read as a date, or a
/// full date-time whose time part is taken.
pub fn parse_time_string(s: &str) -> TemporalResult<ParsedTime> {
    let normalized = normalize(s);
    if let Some(parsed) = parse_bare_time(&normalized, true) {
        return Ok(parsed);
    }
    if let Some(parsed) = parse_bare_time(&normalized, false) {
        let ambiguous = parse_year_month_inner(&normalized).is_some()
            || parse_month_day_inner(&normalized).is_some();
        if ambiguous {
            return Err(TemporalError::range(format!(
                "{s} is ambiguous with a date; prefix the time with T"
            )));
        }
        return Ok(parsed);
    }
    let parsed = parse_plain_date_time_string(s)?;
    match parsed.time {
        Some(time) => Ok(ParsedTime {
            time,
            calendar: parsed.calendar,
        }),
        None => Err(TemporalError::range(format!("{s} has no time part"))),
    }
}

/// Strict offset string: the whole input must be a numeric offset.
pub fn parse_offset_string(s: &str) -> TemporalResult<ParsedOffset> {
    let normalized = normalize(s);
    let mut cur = Cursor::new(&normalized);
    match parse_numeric_offset(&mut cur) {
        Some(offset) if cur.at_end() => Ok(offset),
        _ => Err(TemporalError::range(format!("invalid UTC offset {s}"))),
    }
}

/// The calendar annotation of any temporal string, if it carries one.
pub fn parse_calendar_source(s: &str) -> TemporalResult<Option<String>> {
    if let Ok(parsed) = parse_date_time_string(s) {
        return Ok(parsed.calendar);
    }
    if let Ok(parsed) = parse_year_month_string(s) {
        return Ok(parsed.calendar);
    }
    if let Ok(parsed) = parse_month_day_string(s) {
        return Ok(parsed.calendar);
    }
    parse_time_string(s).map(|parsed| parsed.calendar)
}

fn checked_u128(digits: &str) -> Option<u128> {
    digits.parse::<u128>().ok()
}

/// Split a fraction of a unit into minutes, seconds and nanoseconds.
///
/// Fractions of hours and minutes pass through binary64, so the result
/// matches what a host that stores durations as doubles would produce.
fn split_fraction(fraction_digits: &str, unit_seconds: f64) -> (u128, u128, u128) {
    let fraction: f64 = format!("0.{fraction_digits}").parse().unwrap_or(0.0);
    let seconds = fraction * unit_seconds;
    let minutes = (seconds / 60.0).floor();
    let remainder = seconds - minutes * 60.0;
    let whole = remainder.floor();
    let nanos = ((remainder - whole) * 1e9).floor();
    (minutes as u128, whole as u128, nanos as u128)
}

fn parse_duration_inner(s: &str) -> Option<ParsedDuration> {
    let mut cur = Cursor::new(s);
    let mut out = ParsedDuration::default();
    if let Some(sign) = cur.eat_any(b"+-") {
        out.negative = sign == b'-';
    }
    cur.eat_any(b"Pp")?;

    let mut any = false;
    let mut rank = 0u8;
    while cur.peek().is_some_and(|b| b.is_ascii_digit()) {
        let value = checked_u128(cur.digit_run())?;
        let designator = cur.peek()?.to_ascii_uppercase();
        let next_rank = match designator {
            b'Y' => 1,
            b'M' => 2,
            b'W' => 3,
            b'D' => 4,
            _ => return None,
        };
        if next_rank <= rank {
            return None;
        }
        rank = next_rank;
        cur.pos += 1;
        match designator {
            b'Y' => out.years = value,
            b'M' => out.months = value,
            b'W' => out.weeks = value,
            _ => out.days = value,
        }
        any = true;
    }

    if cur.eat_any(b"Tt").is_some() {
        let mut time_any = false;
        let mut rank = 0u8;
        while cur.peek().is_some_and(|b| b.is_ascii_digit()) {
            let value = checked_u128(cur.digit_run())?;
            let fraction = if cur.eat_any(b".,").is_some() {
                let digits = cur.digit_run();
                if digits.is_empty() || digits.len() > 9 {
                    return None;
                }
                Some(digits)
            } else {
                None
            };
            let designator = cur.peek()?.to_ascii_uppercase();
            let next_rank = match designator {
                b'H' => 1,
                b'M' => 2,
                b'S' => 3,
                _ => return None,
            };
            if next_rank <= rank {
                return None;
            }
            rank = next_rank;
            cur.pos += 1;
            let mut sub_second_ns = 0u128;
            match designator {
                b'H' => {
                    out.hours = value;
                    if let Some(digits) = fraction {
                        let (m, sec, ns) = split_fraction(digits, 3600.0);
                        out.minutes = m;
                        out.seconds = sec;
                        sub_second_ns = ns;
                    }
                }
                b'M' => {
                    out.minutes = value;
                    if let Some(digits) = fraction {
                        let (m, sec, ns) = split_fraction(digits, 60.0);
                        out.seconds = m * 60 + sec;
                        sub_second_ns = ns;
                    }
                }
                _ => {
                    out.seconds = value;
                    if let Some(digits) = fraction {
                        let mut padded = digits.to_string();
                        padded.extend(std::iter::repeat_n('0', 9 - digits.len()));
                        sub_second_ns = padded.parse().ok()?;
                    }
                }
            }
            time_any = true;
            if fraction.is_some() {
                out.milliseconds = sub_second_ns / 1_000_000;
                out.microseconds = sub_second_ns / 1_000 % 1_000;
                out.nanoseconds = sub_second_ns % 1_000;
                break;
            }
        }
        if !time_any {
            return None;
        }
        any = true;
    }

    if !any || !cur.at_end() {
        return None;
    }
    Some(out)
}

pub fn parse_duration_string(s: &str) -> TemporalResult<ParsedDuration> {
    let normalized = normalize(s);
    parse_duration_inner(&normalized)
        .ok_or_else(|| TemporalError::range(format!("invalid ISO 8601 duration: {s}")))
}
