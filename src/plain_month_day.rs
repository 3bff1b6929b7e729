//! A recurring day of the year, such as a birthday.

use std::fmt;
use std::str::FromStr;

use crate::calendar::{self, Calendar};
use crate::error::{TemporalError, TemporalResult};
use crate::format::{format_calendar_annotation, format_iso_date};
use crate::iso::IsoDate;
use crate::options::{Overflow, ShowCalendar};
use crate::parser::parse_month_day_string;
use crate::plain_date::PlainDate;
use crate::regulate::{MONTH_DAY_REFERENCE_YEAR, PartialDate, regulate_date, regulate_month_day};

/// Stored in the leap reference year so that February 29 is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlainMonthDay {
    iso: IsoDate,
    calendar: Calendar,
}

impl PlainMonthDay {
    pub fn new(month: u8, day: u8) -> TemporalResult<Self> {
        Self::new_with_calendar(month, day, Calendar::Iso8601)
    }

    pub fn new_with_calendar(month: u8, day: u8, calendar: Calendar) -> TemporalResult<Self> {
        let (month, day) = regulate_month_day(month as i64, day as i64, None, Overflow::Reject)?;
        Ok(Self {
            iso: IsoDate::new_unchecked(MONTH_DAY_REFERENCE_YEAR, month, day),
            calendar,
        })
    }

    /// `day` and a month are required. A numeric `month` without a
    /// `monthCode` is ambiguous on its own and needs a `year` as well; when
    /// a year is given the day is regulated against that year.
    pub fn from_partial(partial: &PartialDate, overflow: Overflow, calendar: Calendar) -> TemporalResult<Self> {
        if partial.month.is_some() && partial.month_code.is_none() && partial.year.is_none() {
            return Err(TemporalError::type_error("month without monthCode needs a year"));
        }
        let day = partial.require_day()?;
        let month = partial.resolve_month()?;
        let (month, day) = regulate_month_day(month, day, partial.year, overflow)?;
        Self::new_with_calendar(month, day, calendar)
    }

    pub fn from_string(s: &str) -> TemporalResult<Self> {
        let parsed = parse_month_day_string(s)?;
        let calendar = match parsed.calendar.as_deref() {
            Some(id) => id.parse()?,
            None => Calendar::Iso8601,
        };
        Self::new_with_calendar(parsed.month, parsed.day, calendar)
    }

    pub fn month_code(&self) -> String {
        calendar::month_code(self.iso.month)
    }

    pub fn day(&self) -> u8 {
        self.iso.day
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn with(&self, partial: &PartialDate, overflow: Overflow) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("with() needs at least one date field"));
        }
        let (month, month_code) = if partial.month.is_none() && partial.month_code.is_none() {
            (None, Some(self.month_code()))
        } else {
            (partial.month, partial.month_code.clone())
        };
        let merged = PartialDate {
            year: partial.year,
            month,
            month_code,
            day: partial.day.or(Some(self.iso.day as i64)),
        };
        Self::from_partial(&merged, overflow, self.calendar)
    }

    /// February 29 falls back to the 28th outside leap years.
    pub fn to_plain_date(&self, year: i64) -> TemporalResult<PlainDate> {
        let iso = regulate_date(year, self.iso.month as i64, self.iso.day as i64, Overflow::Constrain)?;
        PlainDate::from_iso(iso, self.calendar)
    }

    pub fn equals(&self, other: &PlainMonthDay) -> bool {
        self == other
    }

    pub fn to_string_with_options(&self, show_calendar: ShowCalendar) -> String {
        let annotation = format_calendar_annotation(self.calendar, show_calendar);
        if annotation.is_empty() {
            format!("{:02}-{:02}", self.iso.month, self.iso.day)
        } else {
            format!("{}{annotation}", format_iso_date(self.iso))
        }
    }
}

impl FromStr for PlainMonthDay {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlainMonthDay::from_string(s)
    }
}

impl fmt::Display for PlainMonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_options(ShowCalendar::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(s: &str) -> PlainMonthDay {
        s.parse().unwrap()
    }

    #[test]
    fn construction() {
        assert_eq!(PlainMonthDay::new(2, 29).unwrap().to_string(), "02-29");
        assert!(PlainMonthDay::new(2, 30).unwrap_err().is_range());
        assert_eq!(md("--12-25").to_string(), "12-25");
        assert_eq!(md("1225").to_string(), "12-25");
        assert_eq!(md("2021-12-25T10:00").to_string(), "12-25");
        assert_eq!(md("12-25[u-ca=gregory]").to_string(), "1972-12-25[u-ca=gregory]");
        assert_eq!(md("12-25").to_string_with_options(ShowCalendar::Always), "1972-12-25[u-ca=iso8601]");
        assert_eq!(md("12-25").month_code(), "M12");
        assert_eq!(md("12-25").day(), 25);
    }

    #[test]
    fn field_bags() {
        let leap_day = PartialDate {
            month_code: Some("M02".to_string()),
            day: Some(30),
            ..Default::default()
        };
        assert_eq!(
            PlainMonthDay::from_partial(&leap_day, Overflow::Constrain, Calendar::Iso8601).unwrap().to_string(),
            "02-29"
        );
        assert!(PlainMonthDay::from_partial(&leap_day, Overflow::Reject, Calendar::Iso8601).is_err());

        let in_2021 = PartialDate {
            year: Some(2021),
            ..leap_day.clone()
        };
        assert_eq!(
            PlainMonthDay::from_partial(&in_2021, Overflow::Constrain, Calendar::Iso8601).unwrap().to_string(),
            "02-28"
        );

        let bare_month = PartialDate {
            month: Some(2),
            day: Some(1),
            ..Default::default()
        };
        assert!(PlainMonthDay::from_partial(&bare_month, Overflow::Constrain, Calendar::Iso8601)
            .unwrap_err()
            .is_type());
        let with_year = PartialDate {
            year: Some(2020),
            ..bare_month
        };
        assert_eq!(
            PlainMonthDay::from_partial(&with_year, Overflow::Constrain, Calendar::Iso8601).unwrap().to_string(),
            "02-01"
        );
    }

    #[test]
    fn with_and_conversion() {
        let leap = md("02-29");
        let first = PartialDate {
            day: Some(1),
            ..Default::default()
        };
        assert_eq!(leap.with(&first, Overflow::Reject).unwrap().to_string(), "02-01");
        let march = PartialDate {
            month_code: Some("M03".to_string()),
            ..Default::default()
        };
        assert_eq!(leap.with(&march, Overflow::Reject).unwrap().to_string(), "03-29");
        assert!(leap.with(&PartialDate::default(), Overflow::Reject).unwrap_err().is_type());

        assert_eq!(leap.to_plain_date(2021).unwrap().to_string(), "2021-02-28");
        assert_eq!(leap.to_plain_date(2020).unwrap().to_string(), "2020-02-29");
        assert!(leap.equals(&md("--02-29")));
        assert!(!leap.equals(&md("02-28")));
    }
}
