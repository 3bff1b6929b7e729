//! A month of a particular year.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::balance::balance_iso_year_month;
use crate::calendar::{self, Calendar};
use crate::date_math::{add_iso_date, difference_iso_date};
use crate::duration::Duration;
use crate::error::{TemporalError, TemporalResult};
use crate::format::{format_calendar_annotation, format_iso_date, format_year};
use crate::iso::{IsoDate, IsoDateTime, IsoTime, year_month_within_limits};
use crate::options::{DifferenceOperation, DifferenceOptions, NS_PER_DAY, Overflow, ShowCalendar, Unit};
use crate::parser::parse_year_month_string;
use crate::plain_date::PlainDate;
use crate::regulate::{PartialDate, regulate_date, regulate_year_month};
use crate::relative::{Anchor, InternalDuration, round_relative_duration};

/// Stored as the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlainYearMonth {
    iso: IsoDate,
    calendar: Calendar,
}

impl PlainYearMonth {
    pub fn new(year: i32, month: u8) -> TemporalResult<Self> {
        Self::new_with_calendar(year, month, Calendar::Iso8601)
    }

    pub fn new_with_calendar(year: i32, month: u8, calendar: Calendar) -> TemporalResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(TemporalError::range(format!("month {month} is out of range")));
        }
        if !year_month_within_limits(year, month) {
            return Err(TemporalError::range(format!(
                "{}-{month:02} is outside the representable range",
                format_year(year)
            )));
        }
        Ok(Self {
            iso: IsoDate::new_unchecked(year, month, 1),
            calendar,
        })
    }

    /// `year` and one of `month`/`monthCode` are required; `day` is ignored.
    pub fn from_partial(partial: &PartialDate, overflow: Overflow, calendar: Calendar) -> TemporalResult<Self> {
        let year = partial.require_year()?;
        let month = partial.resolve_month()?;
        let (year, month) = regulate_year_month(year, month, overflow)?;
        Self::new_with_calendar(year, month, calendar)
    }

    pub fn from_string(s: &str) -> TemporalResult<Self> {
        let parsed = parse_year_month_string(s)?;
        let calendar = match parsed.calendar.as_deref() {
            Some(id) => id.parse()?,
            None => Calendar::Iso8601,
        };
        Self::new_with_calendar(parsed.year, parsed.month, calendar)
    }

    pub fn year(&self) -> i32 {
        self.iso.year
    }

    pub fn month(&self) -> u8 {
        self.iso.month
    }

    pub fn month_code(&self) -> String {
        calendar::month_code(self.iso.month)
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn days_in_month(&self) -> u8 {
        self.iso.days_in_month()
    }

    pub fn days_in_year(&self) -> u16 {
        calendar::days_in_year(self.iso.year)
    }

    pub fn months_in_year(&self) -> u8 {
        12
    }

    pub fn in_leap_year(&self) -> bool {
        calendar::is_leap_year(self.iso.year)
    }

    pub fn with(&self, partial: &PartialDate, overflow: Overflow) -> TemporalResult<Self> {
        if partial.year.is_none() && partial.month.is_none() && partial.month_code.is_none() {
            return Err(TemporalError::type_error("with() needs a year or month field"));
        }
        Self::from_partial(&partial.merged_onto(self.iso), overflow, self.calendar)
    }

    /// Counting starts on the first of the month, or on its last day when
    /// the duration is negative, so that whole days only cross a month
    /// boundary once they exceed what is left of the month.
    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        let date = duration.date();
        let days = i64::try_from(duration.time_nanoseconds() / NS_PER_DAY)
            .ok()
            .and_then(|extra| date.days.checked_add(extra))
            .ok_or_else(|| TemporalError::range("day count is out of range"))?;

        let (year, month) = if date.weeks == 0 && days == 0 {
            let (year, month) = balance_iso_year_month(
                self.iso.year as i64 + date.years,
                self.iso.month as i64 + date.months,
            );
            let year = i32::try_from(year).map_err(|_| TemporalError::range("year is out of range"))?;
            (year, month)
        } else {
            let start = if duration.sign() < 0 {
                IsoDate::new_unchecked(self.iso.year, self.iso.month, self.iso.days_in_month())
            } else {
                self.iso
            };
            let moved = add_iso_date(start, date.years, date.months, date.weeks, days, overflow)?;
            (moved.year, moved.month)
        };
        trace!(from = %self, year, month, "year-month addition");
        Self::new_with_calendar(year, month, self.calendar)
    }

    pub fn subtract(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        self.add(&duration.negated(), overflow)
    }

    fn difference(
        &self,
        operation: DifferenceOperation,
        other: &PlainYearMonth,
        options: &DifferenceOptions,
    ) -> TemporalResult<Duration> {
        if self.calendar != other.calendar {
            return Err(TemporalError::range(format!(
                "cannot compare year-months in {} and {}",
                self.calendar, other.calendar
            )));
        }
        let settings = options.resolve(operation, (Unit::Year, Unit::Month), Unit::Year, Unit::Month)?;
        let mut date = difference_iso_date(self.iso, other.iso, settings.largest_unit)?;
        if settings.smallest_unit != Unit::Month || settings.increment != 1 {
            let start = IsoDateTime::new(self.iso, IsoTime::MIDNIGHT)?;
            let end = IsoDateTime::new(other.iso, IsoTime::MIDNIGHT)?;
            date = round_relative_duration(
                InternalDuration { date, time_ns: 0 },
                end.to_local_nanoseconds(),
                &Anchor::Plain(start),
                settings.largest_unit,
                settings.smallest_unit,
                settings.increment,
                settings.mode,
            )?
            .date;
        }
        let result = Duration::from_date_duration(date)?;
        Ok(match operation {
            DifferenceOperation::Until => result,
            DifferenceOperation::Since => result.negated(),
        })
    }

    pub fn until(&self, other: &PlainYearMonth, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Until, other, options)
    }

    pub fn since(&self, other: &PlainYearMonth, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Since, other, options)
    }

    pub fn equals(&self, other: &PlainYearMonth) -> bool {
        self == other
    }

    pub fn compare(one: &PlainYearMonth, two: &PlainYearMonth) -> Ordering {
        one.iso.cmp(&two.iso)
    }

    /// An overlong day is constrained to the end of the month.
    pub fn to_plain_date(&self, day: i64) -> TemporalResult<PlainDate> {
        let iso = regulate_date(self.iso.year as i64, self.iso.month as i64, day, Overflow::Constrain)?;
        PlainDate::from_iso(iso, self.calendar)
    }

    /// The reference day is written out whenever the calendar is.
    pub fn to_string_with_options(&self, show_calendar: ShowCalendar) -> String {
        let annotation = format_calendar_annotation(self.calendar, show_calendar);
        if annotation.is_empty() {
            format!("{}-{:02}", format_year(self.iso.year), self.iso.month)
        } else {
            format!("{}{annotation}", format_iso_date(self.iso))
        }
    }
}

impl FromStr for PlainYearMonth {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlainYearMonth::from_string(s)
    }
}

impl fmt::Display for PlainYearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_options(ShowCalendar::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RoundingMode;

    fn ym(s: &str) -> PlainYearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn construction_and_limits() {
        assert_eq!(PlainYearMonth::new(2021, 4).unwrap().to_string(), "2021-04");
        assert!(PlainYearMonth::new(2021, 13).unwrap_err().is_range());
        assert!(PlainYearMonth::new(-271821, 3).is_err());
        assert!(PlainYearMonth::new(-271821, 4).is_ok());
        assert!(PlainYearMonth::new(275760, 9).is_ok());
        assert!(PlainYearMonth::new(275760, 10).is_err());
        assert_eq!(ym("2021-04-22").to_string(), "2021-04");
        assert_eq!(ym("-000001-12").to_string(), "-000001-12");
        assert_eq!(ym("2021-04[u-ca=gregory]").to_string(), "2021-04-01[u-ca=gregory]");
        assert_eq!(ym("2021-04").to_string_with_options(ShowCalendar::Always), "2021-04-01[u-ca=iso8601]");
    }

    #[test]
    fn calendar_queries() {
        let leap = ym("2020-02");
        assert_eq!(leap.days_in_month(), 29);
        assert_eq!(leap.days_in_year(), 366);
        assert!(leap.in_leap_year());
        assert_eq!(leap.month_code(), "M02");
        assert_eq!(leap.months_in_year(), 12);
        assert_eq!((leap.year(), leap.month()), (2020, 2));
    }

    #[test]
    fn field_bags() {
        let partial = PartialDate {
            year: Some(2021),
            month: Some(13),
            ..Default::default()
        };
        let constrained = PlainYearMonth::from_partial(&partial, Overflow::Constrain, Calendar::Iso8601).unwrap();
        assert_eq!(constrained.to_string(), "2021-12");
        assert!(PlainYearMonth::from_partial(&partial, Overflow::Reject, Calendar::Iso8601).is_err());
        let no_year = PartialDate {
            month_code: Some("M04".to_string()),
            ..Default::default()
        };
        assert!(PlainYearMonth::from_partial(&no_year, Overflow::Constrain, Calendar::Iso8601)
            .unwrap_err()
            .is_type());

        let april = ym("2021-04");
        let feb = PartialDate {
            month: Some(2),
            ..Default::default()
        };
        assert_eq!(april.with(&feb, Overflow::Reject).unwrap().to_string(), "2021-02");
        let day_only = PartialDate {
            day: Some(3),
            ..Default::default()
        };
        assert!(april.with(&day_only, Overflow::Reject).unwrap_err().is_type());
    }

    #[test]
    fn arithmetic() {
        let jan = ym("2021-01");
        assert_eq!(jan.add(&"P1M".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2021-02");
        assert_eq!(jan.add(&"P1Y2M".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2022-03");
        assert_eq!(jan.add(&"P30D".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2021-01");
        assert_eq!(jan.add(&"P31D".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2021-02");

        let march = ym("2021-03");
        assert_eq!(march.subtract(&"P1M".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2021-02");
        assert_eq!(march.subtract(&"P1D".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2021-03");
        assert_eq!(march.subtract(&"P31D".parse().unwrap(), Overflow::Constrain).unwrap().to_string(), "2021-02");
        assert!(ym("+275760-09").add(&"P1M".parse().unwrap(), Overflow::Constrain).is_err());
    }

    #[test]
    fn differences() {
        let a = ym("2019-06");
        let b = ym("2021-04");
        assert_eq!(a.until(&b, &DifferenceOptions::default()).unwrap().to_string(), "P1Y10M");
        assert_eq!(a.since(&b, &DifferenceOptions::default()).unwrap().to_string(), "-P1Y10M");
        let months = DifferenceOptions {
            largest_unit: Some(Unit::Month),
            ..Default::default()
        };
        assert_eq!(a.until(&b, &months).unwrap().to_string(), "P22M");
        let years = DifferenceOptions {
            smallest_unit: Some(Unit::Year),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(a.until(&b, &years).unwrap().to_string(), "P2Y");
        assert!(a.until(&a, &DifferenceOptions::default()).unwrap().is_blank());
        let days = DifferenceOptions {
            smallest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert!(a.until(&b, &days).unwrap_err().is_range());
    }

    #[test]
    fn conversions_and_ordering() {
        let feb = ym("2021-02");
        assert_eq!(feb.to_plain_date(31).unwrap().to_string(), "2021-02-28");
        assert_eq!(feb.to_plain_date(14).unwrap().to_string(), "2021-02-14");
        assert_eq!(PlainYearMonth::compare(&feb, &ym("2021-03")), Ordering::Less);
        assert!(feb.equals(&ym("2021-02-27")));
    }
}
