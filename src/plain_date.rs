//! Calendar date with no time and no zone.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::calendar::{Calendar, CalendarFields};
use crate::date_math::{add_date_duration, difference_iso_date};
use crate::duration::Duration;
use crate::error::{TemporalError, TemporalResult};
use crate::format::{format_calendar_annotation, format_iso_date};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{
    DifferenceOperation, DifferenceOptions, Disambiguation, NS_PER_DAY, Overflow, ShowCalendar, Unit,
};
use crate::parser::{ParsedDateTime, parse_plain_date_time_string};
use crate::plain_date_time::PlainDateTime;
use crate::plain_month_day::PlainMonthDay;
use crate::plain_time::PlainTime;
use crate::plain_year_month::PlainYearMonth;
use crate::regulate::PartialDate;
use crate::relative::{Anchor, InternalDuration, round_relative_duration};
use crate::time_zone::{ChronoTzProvider, TimeZone, TimeZoneProvider};
use crate::zoned_date_time::ZonedDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlainDate {
    iso: IsoDate,
    calendar: Calendar,
}

impl PlainDate {
    pub fn new(year: i32, month: u8, day: u8) -> TemporalResult<Self> {
        Self::new_with_calendar(year, month, day, Calendar::Iso8601)
    }

    pub fn new_with_calendar(year: i32, month: u8, day: u8, calendar: Calendar) -> TemporalResult<Self> {
        Ok(Self {
            iso: IsoDate::new(year, month, day)?,
            calendar,
        })
    }

    pub(crate) const fn new_unchecked(iso: IsoDate, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    pub(crate) fn from_iso(iso: IsoDate, calendar: Calendar) -> TemporalResult<Self> {
        iso.check_within_limits()?;
        Ok(Self { iso, calendar })
    }

    /// Build from a field bag. `year`, `day` and one of `month`/`monthCode`
    /// are required.
    pub fn from_partial(partial: &PartialDate, overflow: Overflow, calendar: Calendar) -> TemporalResult<Self> {
        Self::from_iso(partial.to_date(overflow)?, calendar)
    }

    pub(crate) fn from_parsed(parsed: &ParsedDateTime) -> TemporalResult<Self> {
        let calendar = match parsed.calendar.as_deref() {
            Some(id) => id.parse()?,
            None => Calendar::Iso8601,
        };
        Self::from_iso(parsed.date, calendar)
    }

    pub fn from_string(s: &str) -> TemporalResult<Self> {
        Self::from_parsed(&parse_plain_date_time_string(s)?)
    }

    pub fn iso(&self) -> IsoDate {
        self.iso
    }

    pub fn with(&self, partial: &PartialDate, overflow: Overflow) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("with() needs at least one date field"));
        }
        Self::from_iso(partial.merged_onto(self.iso).to_date(overflow)?, self.calendar)
    }

    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self { calendar, ..*self }
    }

    /// Time fields of the duration count only as far as they make whole days.
    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        let extra_days = i64::try_from(duration.time_nanoseconds() / NS_PER_DAY)
            .map_err(|_| TemporalError::range("day count is out of range"))?;
        let date = duration.date();
        let days = date
            .days
            .checked_add(extra_days)
            .ok_or_else(|| TemporalError::range("day count is out of range"))?;
        let moved = add_date_duration(self.iso, &date.with_days(days), overflow)?;
        Self::from_iso(moved, self.calendar)
    }

    pub fn subtract(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        self.add(&duration.negated(), overflow)
    }

    fn difference(
        &self,
        operation: DifferenceOperation,
        other: &PlainDate,
        options: &DifferenceOptions,
    ) -> TemporalResult<Duration> {
        if self.calendar != other.calendar {
            return Err(TemporalError::range(format!(
                "cannot compare dates in {} and {}",
                self.calendar, other.calendar
            )));
        }
        let settings = options.resolve(operation, (Unit::Year, Unit::Day), Unit::Day, Unit::Day)?;
        let mut date = difference_iso_date(self.iso, other.iso, settings.largest_unit)?;
        if settings.smallest_unit != Unit::Day || settings.increment != 1 {
            let start = IsoDateTime::new(self.iso, IsoTime::MIDNIGHT)?;
            let end = IsoDateTime::new(other.iso, IsoTime::MIDNIGHT)?;
            let rounded = round_relative_duration(
                InternalDuration { date, time_ns: 0 },
                end.to_local_nanoseconds(),
                &Anchor::Plain(start),
                settings.largest_unit,
                settings.smallest_unit,
                settings.increment,
                settings.mode,
            )?;
            trace!(?date, rounded = ?rounded.date, "rounded date difference");
            date = rounded.date;
        }
        let result = Duration::from_date_duration(date)?;
        Ok(match operation {
            DifferenceOperation::Until => result,
            DifferenceOperation::Since => result.negated(),
        })
    }

    pub fn until(&self, other: &PlainDate, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Until, other, options)
    }

    pub fn since(&self, other: &PlainDate, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Since, other, options)
    }

    pub fn equals(&self, other: &PlainDate) -> bool {
        self == other
    }

    /// Orders by ISO fields alone; the calendar is not consulted.
    pub fn compare(one: &PlainDate, two: &PlainDate) -> Ordering {
        one.iso.cmp(&two.iso)
    }

    /// Midnight when no time is given.
    pub fn to_plain_date_time(&self, time: Option<PlainTime>) -> TemporalResult<PlainDateTime> {
        let time = time.map(|t| t.iso()).unwrap_or(IsoTime::MIDNIGHT);
        PlainDateTime::from_iso(IsoDateTime::new(self.iso, time)?, self.calendar)
    }

    pub fn to_plain_year_month(&self) -> TemporalResult<PlainYearMonth> {
        PlainYearMonth::new_with_calendar(self.iso.year, self.iso.month, self.calendar)
    }

    pub fn to_plain_month_day(&self) -> TemporalResult<PlainMonthDay> {
        PlainMonthDay::new_with_calendar(self.iso.month, self.iso.day, self.calendar)
    }

    pub fn to_zoned_date_time(&self, time_zone: TimeZone, time: Option<PlainTime>) -> TemporalResult<ZonedDateTime> {
        self.to_zoned_date_time_with_provider(time_zone, time, &ChronoTzProvider)
    }

    /// Without a time the result is the zone's start of that day, which is
    /// not always midnight.
    pub fn to_zoned_date_time_with_provider(
        &self,
        time_zone: TimeZone,
        time: Option<PlainTime>,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<ZonedDateTime> {
        let epoch_ns = match time {
            None => time_zone.start_of_day(self.iso, provider)?,
            Some(time) => {
                let date_time = IsoDateTime::new(self.iso, time.iso())?;
                time_zone.epoch_nanoseconds_for(&date_time, Disambiguation::Compatible, provider)?
            }
        };
        ZonedDateTime::new_with_provider(epoch_ns, time_zone, self.calendar, provider)
    }

    pub fn to_string_with_options(&self, show_calendar: ShowCalendar) -> String {
        format!(
            "{}{}",
            format_iso_date(self.iso),
            format_calendar_annotation(self.calendar, show_calendar)
        )
    }
}

impl CalendarFields for PlainDate {
    fn iso_date(&self) -> IsoDate {
        self.iso
    }

    fn calendar(&self) -> Calendar {
        self.calendar
    }
}

impl FromStr for PlainDate {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlainDate::from_string(s)
    }
}

impl fmt::Display for PlainDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_options(ShowCalendar::Auto))
    }
}
