//! Calendar identifiers and the proleptic Gregorian primitives every other
//! module leans on.

use std::fmt;
use std::str::FromStr;

use crate::error::{TemporalError, TemporalResult};
use crate::iso::IsoDate;

const CUMULATIVE_MONTH_DAYS: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Supported calendar identifiers. All of them compute with ISO rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Calendar {
    #[default]
    Iso8601,
    Gregory,
    Japanese,
}

const BUILTIN_CALENDARS: [(Calendar, &str); 3] = [
    (Calendar::Iso8601, "iso8601"),
    (Calendar::Gregory, "gregory"),
    (Calendar::Japanese, "japanese"),
];

impl Calendar {
    pub fn identifier(self) -> &'static str {
        match self {
            Calendar::Iso8601 => "iso8601",
            Calendar::Gregory => "gregory",
            Calendar::Japanese => "japanese",
        }
    }

    pub fn is_iso(self) -> bool {
        self == Calendar::Iso8601
    }

    /// Resolve a calendar from either a bare identifier or an ISO string
    /// carrying a `[u-ca=...]` annotation.
    pub fn from_string(s: &str) -> TemporalResult<Self> {
        if let Ok(cal) = s.parse::<Calendar>() {
            return Ok(cal);
        }
        let parsed = crate::parser::parse_calendar_source(s)?;
        match parsed {
            Some(id) => id.parse(),
            None => Ok(Calendar::Iso8601),
        }
    }
}

impl FromStr for Calendar {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        BUILTIN_CALENDARS
            .iter()
            .find(|(_, id)| *id == lower)
            .map(|(cal, _)| *cal)
            .ok_or_else(|| TemporalError::range(format!("unsupported calendar {s}")))
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Calendar-derived fields shared by every value that carries a date.
pub trait CalendarFields {
    fn iso_date(&self) -> IsoDate;

    fn calendar(&self) -> Calendar;

    fn year(&self) -> i32 {
        self.iso_date().year
    }

    fn month(&self) -> u8 {
        self.iso_date().month
    }

    fn month_code(&self) -> String {
        month_code(self.iso_date().month)
    }

    fn day(&self) -> u8 {
        self.iso_date().day
    }

    /// 1 = Monday through 7 = Sunday.
    fn day_of_week(&self) -> u8 {
        self.iso_date().day_of_week()
    }

    fn day_of_year(&self) -> u16 {
        self.iso_date().day_of_year()
    }

    fn week_of_year(&self) -> u8 {
        self.iso_date().week_of_year().0
    }

    /// The ISO week-numbering year, which differs from `year` near January 1.
    fn year_of_week(&self) -> i32 {
        self.iso_date().week_of_year().1
    }

    fn days_in_week(&self) -> u8 {
        7
    }

    fn days_in_month(&self) -> u8 {
        self.iso_date().days_in_month()
    }

    fn days_in_year(&self) -> u16 {
        days_in_year(self.iso_date().year)
    }

    fn months_in_year(&self) -> u8 {
        12
    }

    fn in_leap_year(&self) -> bool {
        is_leap_year(self.iso_date().year)
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

pub fn days_in_year(year: i32) -> u16 {
    if is_leap_year(year) { 366 } else { 365 }
}

pub fn is_valid_date(year: i32, month: u8, day: u8) -> bool {
    (1..=12).contains(&month) && day >= 1 && day <= days_in_month(year, month)
}

pub fn day_of_year(year: i32, month: u8, day: u8) -> u16 {
    let mut doy = CUMULATIVE_MONTH_DAYS[(month - 1) as usize] + day as u16;
    if month > 2 && is_leap_year(year) {
        doy += 1;
    }
    doy
}

/// 1 = Monday through 7 = Sunday.
pub fn day_of_week(year: i32, month: u8, day: u8) -> u8 {
    // Julian day number; valid for negative years too
    let y = year as i64;
    let m = month as i64;
    let a = (14 - m) / 12;
    let y2 = y + 4800 - a;
    let m2 = m + 12 * a - 3;
    let jdn = day as i64 + (153 * m2 + 2) / 5 + 365 * y2 + y2.div_euclid(4) - y2.div_euclid(100)
        + y2.div_euclid(400)
        - 32045;
    (jdn.rem_euclid(7) + 1) as u8
}

fn weeks_in_year(year: i32) -> u8 {
    let dec31 = day_of_week(year, 12, 31);
    if dec31 == 4 || (is_leap_year(year) && dec31 == 5) {
        53
    } else {
        52
    }
}

/// ISO 8601 week date: returns `(week, year_of_week)`.
pub fn week_of_year(year: i32, month: u8, day: u8) -> (u8, i32) {
    let doy = day_of_year(year, month, day) as i32;
    let dow = day_of_week(year, month, day) as i32;
    let week = (doy - dow + 10) / 7;
    if week < 1 {
        (weeks_in_year(year - 1), year - 1)
    } else if week > weeks_in_year(year) as i32 {
        (1, year + 1)
    } else {
        (week as u8, year)
    }
}

pub fn month_code(month: u8) -> String {
    format!("M{month:02}")
}

/// Parse `M01`..`M12`. Leap-month codes (`M05L`) are not ISO months.
pub fn parse_month_code(code: &str) -> TemporalResult<u8> {
    let bytes = code.as_bytes();
    if bytes.len() != 3 || bytes[0] != b'M' || !bytes[1].is_ascii_digit() || !bytes[2].is_ascii_digit()
    {
        return Err(TemporalError::range(format!("invalid month code {code}")));
    }
    let month = (bytes[1] - b'0') * 10 + (bytes[2] - b'0');
    if !(1..=12).contains(&month) {
        return Err(TemporalError::range(format!("invalid month code {code}")));
    }
    Ok(month)
}

/// Days since 1970-01-01 (Howard Hinnant's civil algorithm).
pub fn iso_date_to_epoch_days(year: i32, month: u8, day: u8) -> i64 {
    let y = year as i64 - if month <= 2 { 1 } else { 0 };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (m + if m > 2 { -3 } else { 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

pub fn epoch_days_to_iso_date(epoch_days: i64) -> (i32, u8, u8) {
    let z = epoch_days + 719468;
    let era = z.div_euclid(146097);
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if m <= 2 { 1 } else { 0 };
    (year as i32, m as u8, d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2021));
        assert!(is_leap_year(-4));
        assert!(is_leap_year(0));
    }

    #[test]
    fn calendar_queries_for_2021_04_22() {
        assert_eq!(day_of_week(2021, 4, 22), 4);
        assert_eq!(day_of_year(2021, 4, 22), 112);
        assert_eq!(week_of_year(2021, 4, 22), (16, 2021));
        assert_eq!(days_in_month(2021, 4), 30);
        assert_eq!(days_in_year(2021), 365);
        assert_eq!(month_code(4), "M04");
    }

    #[test]
    fn week_of_year_at_year_edges() {
        // 2021-01-01 is a Friday and belongs to 2020-W53
        assert_eq!(week_of_year(2021, 1, 1), (53, 2020));
        // 2019-12-30 is a Monday and starts 2020-W01
        assert_eq!(week_of_year(2019, 12, 30), (1, 2020));
        assert_eq!(week_of_year(2020, 12, 31), (53, 2020));
    }

    #[test]
    fn epoch_days_known_values() {
        assert_eq!(iso_date_to_epoch_days(1970, 1, 1), 0);
        assert_eq!(iso_date_to_epoch_days(2000, 3, 1), 11017);
        assert_eq!(epoch_days_to_iso_date(-1), (1969, 12, 31));
        assert_eq!(epoch_days_to_iso_date(-100_000_000), (-271821, 4, 20));
        assert_eq!(epoch_days_to_iso_date(100_000_000), (275760, 9, 13));
    }

    #[test]
    fn calendar_identifiers() {
        assert_eq!("ISO8601".parse::<Calendar>().unwrap(), Calendar::Iso8601);
        assert_eq!("gregory".parse::<Calendar>().unwrap(), Calendar::Gregory);
        assert!("hebrew".parse::<Calendar>().unwrap_err().is_range());
        assert_eq!(
            Calendar::from_string("2021-04-22T10:00[u-ca=japanese]").unwrap(),
            Calendar::Japanese
        );
        assert_eq!(Calendar::from_string("2021-04-22").unwrap(), Calendar::Iso8601);
    }

    #[test]
    fn month_codes() {
        assert_eq!(parse_month_code("M12").unwrap(), 12);
        assert!(parse_month_code("M13").is_err());
        assert!(parse_month_code("M05L").is_err());
    }
}
