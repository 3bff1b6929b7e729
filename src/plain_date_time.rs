//! Calendar date and wall-clock time, with no zone.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::balance::balance_iso_date;
use crate::calendar::{Calendar, CalendarFields};
use crate::duration::Duration;
use crate::error::{TemporalError, TemporalResult};
use crate::format::{format_calendar_annotation, format_iso_date_time};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{
    DifferenceOperation, DifferenceOptions, Disambiguation, Overflow, Precision, RoundingMode,
    RoundingOptions, ShowCalendar, ToStringOptions, Unit,
};
use crate::parser::parse_plain_date_time_string;
use crate::plain_date::PlainDate;
use crate::plain_time::PlainTime;
use crate::regulate::{PartialDate, PartialTime};
use crate::relative::{
    Anchor, InternalDuration, add_date_time, difference_iso_date_time, round_relative_duration,
};
use crate::rounding::round_time;
use crate::time_zone::{ChronoTzProvider, TimeZone, TimeZoneProvider};
use crate::zoned_date_time::ZonedDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlainDateTime {
    iso: IsoDateTime,
    calendar: Calendar,
}

/// Round a wall-clock reading, carrying a rounded-up day into the date.
pub(crate) fn round_date_time(
    iso: &IsoDateTime,
    unit: Unit,
    increment: u64,
    mode: RoundingMode,
) -> TemporalResult<IsoDateTime> {
    let (days, time) = round_time(iso.time, unit, increment, mode, None);
    let date = balance_iso_date(iso.date.year as i64, iso.date.month as i64, iso.date.day as i64 + days)?;
    IsoDateTime::new(date, time)
}

impl PlainDateTime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
    ) -> TemporalResult<Self> {
        let date = IsoDate::new(year, month, day)?;
        let time = IsoTime::new(hour, minute, second, millisecond, microsecond, nanosecond)?;
        Self::from_iso(IsoDateTime::new(date, time)?, Calendar::Iso8601)
    }

    pub(crate) fn from_iso(iso: IsoDateTime, calendar: Calendar) -> TemporalResult<Self> {
        if !iso.within_limits() {
            return Err(TemporalError::range("date-time is outside the representable range"));
        }
        Ok(Self { iso, calendar })
    }

    pub fn from_partial(
        date: &PartialDate,
        time: &PartialTime,
        overflow: Overflow,
        calendar: Calendar,
    ) -> TemporalResult<Self> {
        let date = date.to_date(overflow)?;
        let time = time.to_time(IsoTime::MIDNIGHT, overflow)?;
        Self::from_iso(IsoDateTime::new_unchecked(date, time), calendar)
    }

    pub fn from_string(s: &str) -> TemporalResult<Self> {
        let parsed = parse_plain_date_time_string(s)?;
        let calendar = match parsed.calendar.as_deref() {
            Some(id) => id.parse()?,
            None => Calendar::Iso8601,
        };
        let time = parsed.time.unwrap_or(IsoTime::MIDNIGHT);
        Self::from_iso(IsoDateTime::new_unchecked(parsed.date, time), calendar)
    }

    pub fn iso(&self) -> IsoDateTime {
        self.iso
    }

    pub fn hour(&self) -> u8 {
        self.iso.time.hour
    }

    pub fn minute(&self) -> u8 {
        self.iso.time.minute
    }

    pub fn second(&self) -> u8 {
        self.iso.time.second
    }

    pub fn millisecond(&self) -> u16 {
        self.iso.time.millisecond
    }

    pub fn microsecond(&self) -> u16 {
        self.iso.time.microsecond
    }

    pub fn nanosecond(&self) -> u16 {
        self.iso.time.nanosecond
    }

    pub fn with(&self, date: &PartialDate, time: &PartialTime, overflow: Overflow) -> TemporalResult<Self> {
        if date.is_empty() && time.is_empty() {
            return Err(TemporalError::type_error("with() needs at least one field"));
        }
        let new_date = date.merged_onto(self.iso.date).to_date(overflow)?;
        let new_time = time.to_time(self.iso.time, overflow)?;
        Self::from_iso(IsoDateTime::new_unchecked(new_date, new_time), self.calendar)
    }

    /// Replace the time, or reset it to midnight.
    pub fn with_plain_time(&self, time: Option<PlainTime>) -> TemporalResult<Self> {
        let time = time.map(|t| t.iso()).unwrap_or(IsoTime::MIDNIGHT);
        Self::from_iso(IsoDateTime::new_unchecked(self.iso.date, time), self.calendar)
    }

    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self { calendar, ..*self }
    }

    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        let moved = add_date_time(&self.iso, &InternalDuration::from_duration(duration), overflow)?;
        Self::from_iso(moved, self.calendar)
    }

    pub fn subtract(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        self.add(&duration.negated(), overflow)
    }

    fn difference(
        &self,
        operation: DifferenceOperation,
        other: &PlainDateTime,
        options: &DifferenceOptions,
    ) -> TemporalResult<Duration> {
        if self.calendar != other.calendar {
            return Err(TemporalError::range(format!(
                "cannot compare date-times in {} and {}",
                self.calendar, other.calendar
            )));
        }
        let settings = options.resolve(operation, (Unit::Year, Unit::Nanosecond), Unit::Day, Unit::Nanosecond)?;
        if self.iso == other.iso {
            return Ok(Duration::default());
        }
        let mut difference = difference_iso_date_time(&self.iso, &other.iso, settings.largest_unit)?;
        if !settings.is_noop() {
            difference = round_relative_duration(
                difference,
                other.iso.to_local_nanoseconds(),
                &Anchor::Plain(self.iso),
                settings.largest_unit,
                settings.smallest_unit,
                settings.increment,
                settings.mode,
            )?;
        }
        let result = difference.to_duration(settings.largest_unit)?;
        Ok(match operation {
            DifferenceOperation::Until => result,
            DifferenceOperation::Since => result.negated(),
        })
    }

    pub fn until(&self, other: &PlainDateTime, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Until, other, options)
    }

    pub fn since(&self, other: &PlainDateTime, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Since, other, options)
    }

    /// Round the time of day. A smallest unit of `day` rounds to the nearest
    /// midnight.
    pub fn round(&self, options: &RoundingOptions) -> TemporalResult<Self> {
        let settings = options.resolve_for_point(true)?;
        let rounded = round_date_time(&self.iso, settings.smallest_unit, settings.increment, settings.mode)?;
        Self::from_iso(rounded, self.calendar)
    }

    pub fn equals(&self, other: &PlainDateTime) -> bool {
        self == other
    }

    pub fn compare(one: &PlainDateTime, two: &PlainDateTime) -> Ordering {
        one.iso.cmp(&two.iso)
    }

    pub fn to_plain_date(&self) -> PlainDate {
        // Every date of a representable date-time is itself representable.
        PlainDate::new_unchecked(self.iso.date, self.calendar)
    }

    pub fn to_plain_time(&self) -> PlainTime {
        PlainTime::from_iso(self.iso.time)
    }

    pub fn to_zoned_date_time(
        &self,
        time_zone: TimeZone,
        disambiguation: Disambiguation,
    ) -> TemporalResult<ZonedDateTime> {
        self.to_zoned_date_time_with_provider(time_zone, disambiguation, &ChronoTzProvider)
    }

    pub fn to_zoned_date_time_with_provider(
        &self,
        time_zone: TimeZone,
        disambiguation: Disambiguation,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<ZonedDateTime> {
        let epoch_ns = time_zone.epoch_nanoseconds_for(&self.iso, disambiguation, provider)?;
        ZonedDateTime::new_with_provider(epoch_ns, time_zone, self.calendar, provider)
    }

    pub fn to_string_with_options(&self, options: &ToStringOptions) -> TemporalResult<String> {
        let precision = options.seconds_precision()?;
        let rounded = round_date_time(&self.iso, precision.unit, precision.increment, options.rounding_mode())?;
        Ok(format!(
            "{}{}",
            format_iso_date_time(&rounded, precision.precision),
            format_calendar_annotation(self.calendar, options.calendar_name)
        ))
    }
}

impl CalendarFields for PlainDateTime {
    fn iso_date(&self) -> IsoDate {
        self.iso.date
    }

    fn calendar(&self) -> Calendar {
        self.calendar
    }
}

impl FromStr for PlainDateTime {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlainDateTime::from_string(s)
    }
}

impl fmt::Display for PlainDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_iso_date_time(&self.iso, Precision::Auto))?;
        f.write_str(&format_calendar_annotation(self.calendar, ShowCalendar::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iso::{NS_MAX_INSTANT, NS_MIN_INSTANT};
    use crate::options::NS_PER_DAY;
    use proptest::prelude::*;

    fn dt(s: &str) -> PlainDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn construction_and_limits() {
        let v = PlainDateTime::new(1976, 11, 18, 15, 23, 30, 123, 456, 789).unwrap();
        assert_eq!(v.to_string(), "1976-11-18T15:23:30.123456789");
        assert_eq!(v.to_plain_date().to_string(), "1976-11-18");
        assert_eq!(v.to_plain_time().to_string(), "15:23:30.123456789");
        assert!(PlainDateTime::new(-271821, 4, 19, 0, 0, 0, 0, 0, 0).is_err());
        assert!(PlainDateTime::new(-271821, 4, 19, 0, 0, 0, 0, 0, 1).is_ok());
        assert!(PlainDateTime::new(275760, 9, 13, 0, 0, 0, 0, 0, 0).is_ok());
        assert!(PlainDateTime::new(275760, 9, 14, 0, 0, 0, 0, 0, 0).is_err());
        assert_eq!(dt("2021-04-22").to_string(), "2021-04-22T00:00:00");
        assert_eq!(dt("2021-04-22 10:25").to_string(), "2021-04-22T10:25:00");
        assert!(PlainDateTime::from_string("2021-04-22T10:25Z").is_err());
    }

    #[test]
    fn with_fields() {
        let v = dt("2021-01-31T10:00");
        let changed = v
            .with(
                &PartialDate {
                    month: Some(2),
                    ..Default::default()
                },
                &PartialTime {
                    minute: Some(45),
                    ..Default::default()
                },
                Overflow::Constrain,
            )
            .unwrap();
        assert_eq!(changed.to_string(), "2021-02-28T10:45:00");
        assert!(v.with(&PartialDate::default(), &PartialTime::default(), Overflow::Constrain).is_err());
        assert_eq!(v.with_plain_time(None).unwrap().to_string(), "2021-01-31T00:00:00");
    }

    #[test]
    fn arithmetic_carries_time_into_days() {
        let v = dt("2021-01-31T23:30");
        assert_eq!(
            v.add(&"P1MT1H".parse().unwrap(), Overflow::Constrain).unwrap().to_string(),
            "2021-03-01T00:30:00"
        );
        assert_eq!(
            v.subtract(&"PT24H".parse().unwrap(), Overflow::Constrain).unwrap().to_string(),
            "2021-01-30T23:30:00"
        );
        assert!(v.add(&"P1M".parse().unwrap(), Overflow::Reject).is_err());
    }

    #[test]
    fn differences() {
        let a = dt("2021-04-22T10:00");
        let b = dt("2021-04-22T10:00:00.000654321");
        let micro = DifferenceOptions {
            smallest_unit: Some(Unit::Microsecond),
            ..Default::default()
        };
        let since = b.since(&a, &micro).unwrap();
        assert_eq!(since.microseconds(), 654);
        assert_eq!(since.nanoseconds(), 0);

        let start = dt("2020-01-01T12:00");
        let end = dt("2021-03-02T06:30");
        assert_eq!(start.until(&end, &DifferenceOptions::default()).unwrap().to_string(), "P425DT18H30M");
        let years = DifferenceOptions {
            largest_unit: Some(Unit::Year),
            ..Default::default()
        };
        assert_eq!(start.until(&end, &years).unwrap().to_string(), "P1Y2MT18H30M");
        assert_eq!(end.since(&start, &years).unwrap().to_string(), "P1Y2MT18H30M");
        let hours = DifferenceOptions {
            largest_unit: Some(Unit::Hour),
            smallest_unit: Some(Unit::Hour),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(start.until(&end, &hours).unwrap().to_string(), "PT10219H");
        let to_day = DifferenceOptions {
            smallest_unit: Some(Unit::Day),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(start.until(&end, &to_day).unwrap().to_string(), "P426D");
        assert!(a.until(&a, &DifferenceOptions::default()).unwrap().is_blank());
    }

    #[test]
    fn rounding() {
        let v = dt("2021-04-22T23:59:59.5");
        assert_eq!(
            v.round(&RoundingOptions::with_smallest_unit(Unit::Second)).unwrap().to_string(),
            "2021-04-23T00:00:00"
        );
        assert_eq!(
            dt("2021-04-22T11:59").round(&RoundingOptions::with_smallest_unit(Unit::Day)).unwrap().to_string(),
            "2021-04-22T00:00:00"
        );
        let two_days = RoundingOptions {
            rounding_increment: Some(2),
            ..RoundingOptions::with_smallest_unit(Unit::Day)
        };
        assert!(v.round(&two_days).is_err());
        assert!(dt("+275760-09-12T23:59:59.9")
            .round(&RoundingOptions::with_smallest_unit(Unit::Day))
            .is_ok());
    }

    #[test]
    fn to_string_options() {
        let v = dt("2021-04-22T10:25:05.5[u-ca=gregory]");
        assert_eq!(v.to_string(), "2021-04-22T10:25:05.5[u-ca=gregory]");
        let options = ToStringOptions {
            smallest_unit: Some(Unit::Minute),
            calendar_name: ShowCalendar::Never,
            ..Default::default()
        };
        assert_eq!(v.to_string_with_options(&options).unwrap(), "2021-04-22T10:25");
        let critical = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(2)),
            calendar_name: ShowCalendar::Critical,
            ..Default::default()
        };
        assert_eq!(
            v.to_string_with_options(&critical).unwrap(),
            "2021-04-22T10:25:05.50[!u-ca=gregory]"
        );
    }

    #[test]
    fn to_zoned() {
        let tz = TimeZone::from_identifier("America/Los_Angeles", &ChronoTzProvider).unwrap();
        let gap = dt("2020-03-08T02:30");
        let later = gap.to_zoned_date_time(tz.clone(), Disambiguation::Compatible).unwrap();
        assert_eq!(later.to_string(), "2020-03-08T03:30:00-07:00[America/Los_Angeles]");
        let earlier = gap.to_zoned_date_time(tz.clone(), Disambiguation::Earlier).unwrap();
        assert_eq!(earlier.to_string(), "2020-03-08T01:30:00-08:00[America/Los_Angeles]");
        assert!(gap.to_zoned_date_time(tz, Disambiguation::Reject).unwrap_err().is_range());
    }

    proptest! {
        #[test]
        fn string_round_trip(local in (NS_MIN_INSTANT - NS_PER_DAY + 1)..(NS_MAX_INSTANT + NS_PER_DAY)) {
            let value = PlainDateTime::from_iso(IsoDateTime::from_local_nanoseconds(local), Calendar::Iso8601).unwrap();
            prop_assert_eq!(value.to_string().parse::<PlainDateTime>().unwrap(), value);
        }
    }
}
