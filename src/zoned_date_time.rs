//! An exact instant viewed through a time zone and a calendar.
//!
//! The wall-clock reading and the zone offset are resolved once, when the
//! value is built, so field access never consults the zone data again.
//! Operations that do need the zone (arithmetic, rounding, transitions)
//! come in two forms: one that takes a [`TimeZoneProvider`] and a
//! convenience form backed by [`ChronoTzProvider`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use tracing::{debug, trace};

use crate::balance::balance_iso_date;
use crate::calendar::{Calendar, CalendarFields};
use crate::duration::{Duration, balance_time_duration};
use crate::error::{TemporalError, TemporalResult};
use crate::format::{format_calendar_annotation, format_iso_date_time};
use crate::instant::Instant;
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{
    DifferenceOperation, DifferenceOptions, Disambiguation, NS_PER_HOUR, NS_PER_MS, OffsetOption, Overflow,
    Precision, RoundingOptions, ShowOffset, ShowTimeZone, ToStringOptions, Unit,
};
use crate::parser::{ParsedDateTime, parse_offset_string, parse_zoned_date_time_string};
use crate::plain_date::PlainDate;
use crate::plain_date_time::{PlainDateTime, round_date_time};
use crate::plain_time::PlainTime;
use crate::regulate::{PartialDate, PartialTime};
use crate::relative::{Anchor, InternalDuration, add_zoned, difference_zoned, round_relative_duration};
use crate::rounding::{round_epoch_nanoseconds, round_i128_to_increment};
use crate::time_zone::{
    ChronoTzProvider, OffsetBehaviour, TimeZone, TimeZoneProvider, check_epoch_nanoseconds, format_offset,
    format_offset_rounded, interpret_iso_date_time_offset,
};

/// Date, time and offset fields for building or changing a zoned value.
/// The offset is written as a string such as `-07:00`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialZonedDateTime {
    pub date: PartialDate,
    pub time: PartialTime,
    pub offset: Option<String>,
}

impl PartialZonedDateTime {
    pub fn is_empty(&self) -> bool {
        self.date.is_empty() && self.time.is_empty() && self.offset.is_none()
    }

    fn offset_nanoseconds(&self) -> TemporalResult<Option<i64>> {
        self.offset
            .as_deref()
            .map(|s| parse_offset_string(s).map(|o| o.nanoseconds))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedDateTime {
    epoch_ns: i128,
    time_zone: TimeZone,
    calendar: Calendar,
    date_time: IsoDateTime,
    offset_ns: i64,
}

impl ZonedDateTime {
    pub fn new(epoch_ns: i128, time_zone: TimeZone, calendar: Calendar) -> TemporalResult<Self> {
        Self::new_with_provider(epoch_ns, time_zone, calendar, &ChronoTzProvider)
    }

    pub fn new_with_provider(
        epoch_ns: i128,
        time_zone: TimeZone,
        calendar: Calendar,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        check_epoch_nanoseconds(epoch_ns)?;
        let offset_ns = time_zone.offset_nanoseconds_for(epoch_ns, provider)?;
        let date_time = IsoDateTime::from_local_nanoseconds(epoch_ns + offset_ns as i128);
        Ok(Self {
            epoch_ns,
            time_zone,
            calendar,
            date_time,
            offset_ns,
        })
    }

    pub fn from_epoch_nanoseconds(epoch_ns: &BigInt, time_zone: TimeZone, calendar: Calendar) -> TemporalResult<Self> {
        let instant = Instant::from_epoch_nanoseconds(epoch_ns)?;
        Self::new(instant.epoch_ns(), time_zone, calendar)
    }

    /// Resolve a parsed string. A written offset of whole minutes may match
    /// a zone offset that only rounds to it; one with seconds must match
    /// exactly.
    pub(crate) fn from_parsed(
        parsed: ParsedDateTime,
        disambiguation: Disambiguation,
        offset_option: OffsetOption,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        let annotation = parsed
            .time_zone
            .as_deref()
            .ok_or_else(|| TemporalError::range("a zoned date-time needs a time zone annotation"))?;
        let time_zone = TimeZone::from_identifier(annotation, provider)?;
        let calendar = match parsed.calendar.as_deref() {
            Some(id) => id.parse()?,
            None => Calendar::Iso8601,
        };
        let (behaviour, offset_ns, match_minutes) = match (parsed.utc_designator, parsed.offset) {
            (true, _) => (OffsetBehaviour::Exact, 0, false),
            (false, Some(offset)) => (OffsetBehaviour::Option, offset.nanoseconds, !offset.has_sub_minute),
            (false, None) => (OffsetBehaviour::Wall, 0, false),
        };
        let epoch_ns = interpret_iso_date_time_offset(
            parsed.date,
            parsed.time,
            behaviour,
            offset_ns,
            &time_zone,
            disambiguation,
            offset_option,
            match_minutes,
            provider,
        )?;
        Self::new_with_provider(epoch_ns, time_zone, calendar, provider)
    }

    /// Parse with `compatible` disambiguation and a conflicting offset
    /// rejected.
    pub fn from_string(s: &str) -> TemporalResult<Self> {
        Self::from_string_with_provider(s, Disambiguation::Compatible, OffsetOption::Reject, &ChronoTzProvider)
    }

    pub fn from_string_with_provider(
        s: &str,
        disambiguation: Disambiguation,
        offset_option: OffsetOption,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        Self::from_parsed(parse_zoned_date_time_string(s)?, disambiguation, offset_option, provider)
    }

    /// Build from fields. `year`, `day` and a month are required; time
    /// fields default to midnight. Without an offset the reading is
    /// disambiguated as a wall-clock time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_partial_with_provider(
        partial: &PartialZonedDateTime,
        time_zone: TimeZone,
        calendar: Calendar,
        disambiguation: Disambiguation,
        offset_option: OffsetOption,
        overflow: Overflow,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        let date = partial.date.to_date(overflow)?;
        let time = partial.time.to_time(IsoTime::MIDNIGHT, overflow)?;
        let (behaviour, offset_ns) = match partial.offset_nanoseconds()? {
            Some(ns) => (OffsetBehaviour::Option, ns),
            None => (OffsetBehaviour::Wall, 0),
        };
        let epoch_ns = interpret_iso_date_time_offset(
            date,
            Some(time),
            behaviour,
            offset_ns,
            &time_zone,
            disambiguation,
            offset_option,
            false,
            provider,
        )?;
        Self::new_with_provider(epoch_ns, time_zone, calendar, provider)
    }

    pub fn from_partial(
        partial: &PartialZonedDateTime,
        time_zone: TimeZone,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TemporalResult<Self> {
        Self::from_partial_with_provider(
            partial,
            time_zone,
            calendar,
            Disambiguation::Compatible,
            OffsetOption::Reject,
            overflow,
            &ChronoTzProvider,
        )
    }

    pub(crate) fn epoch_ns(&self) -> i128 {
        self.epoch_ns
    }

    pub fn epoch_nanoseconds(&self) -> BigInt {
        BigInt::from(self.epoch_ns)
    }

    pub fn epoch_milliseconds(&self) -> i64 {
        self.epoch_ns.div_euclid(NS_PER_MS) as i64
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    pub fn offset_nanoseconds(&self) -> i64 {
        self.offset_ns
    }

    /// The offset in canonical form, with seconds only when non-zero.
    pub fn offset(&self) -> String {
        format_offset(self.offset_ns)
    }

    pub fn hour(&self) -> u8 {
        self.date_time.time.hour
    }

    pub fn minute(&self) -> u8 {
        self.date_time.time.minute
    }

    pub fn second(&self) -> u8 {
        self.date_time.time.second
    }

    pub fn millisecond(&self) -> u16 {
        self.date_time.time.millisecond
    }

    pub fn microsecond(&self) -> u16 {
        self.date_time.time.microsecond
    }

    pub fn nanosecond(&self) -> u16 {
        self.date_time.time.nanosecond
    }

    fn rebuild(&self, epoch_ns: i128, provider: &dyn TimeZoneProvider) -> TemporalResult<Self> {
        Self::new_with_provider(epoch_ns, self.time_zone.clone(), self.calendar, provider)
    }

    fn tomorrow(&self) -> TemporalResult<IsoDate> {
        let today = self.date_time.date;
        balance_iso_date(today.year as i64, today.month as i64, today.day as i64 + 1)
    }

    /// Bounds of the local day this value falls in.
    fn day_bounds(&self, provider: &dyn TimeZoneProvider) -> TemporalResult<(i128, i128)> {
        let start = self.time_zone.start_of_day(self.date_time.date, provider)?;
        let end = self.time_zone.start_of_day(self.tomorrow()?, provider)?;
        Ok((start, end))
    }

    pub fn start_of_day_with_provider(&self, provider: &dyn TimeZoneProvider) -> TemporalResult<Self> {
        let start = self.time_zone.start_of_day(self.date_time.date, provider)?;
        self.rebuild(start, provider)
    }

    pub fn start_of_day(&self) -> TemporalResult<Self> {
        self.start_of_day_with_provider(&ChronoTzProvider)
    }

    /// Length of the local day in hours: 23 or 25 on most transition days.
    pub fn hours_in_day_with_provider(&self, provider: &dyn TimeZoneProvider) -> TemporalResult<f64> {
        let (start, end) = self.day_bounds(provider)?;
        Ok((end - start) as f64 / NS_PER_HOUR as f64)
    }

    pub fn hours_in_day(&self) -> TemporalResult<f64> {
        self.hours_in_day_with_provider(&ChronoTzProvider)
    }

    /// The first offset change strictly after this instant, if any.
    pub fn next_transition_with_provider(&self, provider: &dyn TimeZoneProvider) -> TemporalResult<Option<Self>> {
        self.time_zone
            .next_transition(self.epoch_ns, provider)?
            .map(|ns| self.rebuild(ns, provider))
            .transpose()
    }

    pub fn next_transition(&self) -> TemporalResult<Option<Self>> {
        self.next_transition_with_provider(&ChronoTzProvider)
    }

    /// The last offset change strictly before this instant, if any.
    pub fn previous_transition_with_provider(
        &self,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Option<Self>> {
        self.time_zone
            .previous_transition(self.epoch_ns, provider)?
            .map(|ns| self.rebuild(ns, provider))
            .transpose()
    }

    pub fn previous_transition(&self) -> TemporalResult<Option<Self>> {
        self.previous_transition_with_provider(&ChronoTzProvider)
    }

    /// Replace fields of the wall-clock reading. Without an explicit offset
    /// the current one is used, so a reading that keeps its offset keeps
    /// its place in a repeated hour.
    pub fn with_with_provider(
        &self,
        partial: &PartialZonedDateTime,
        disambiguation: Disambiguation,
        offset_option: OffsetOption,
        overflow: Overflow,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("with() needs at least one field"));
        }
        let date = partial.date.merged_onto(self.date_time.date).to_date(overflow)?;
        let time = partial.time.to_time(self.date_time.time, overflow)?;
        let offset_ns = partial.offset_nanoseconds()?.unwrap_or(self.offset_ns);
        let epoch_ns = interpret_iso_date_time_offset(
            date,
            Some(time),
            OffsetBehaviour::Option,
            offset_ns,
            &self.time_zone,
            disambiguation,
            offset_option,
            false,
            provider,
        )?;
        self.rebuild(epoch_ns, provider)
    }

    pub fn with(&self, partial: &PartialZonedDateTime, overflow: Overflow) -> TemporalResult<Self> {
        self.with_with_provider(
            partial,
            Disambiguation::Compatible,
            OffsetOption::Prefer,
            overflow,
            &ChronoTzProvider,
        )
    }

    /// Start of the day when no time is given.
    pub fn with_plain_time_with_provider(
        &self,
        time: Option<PlainTime>,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        let epoch_ns = match time {
            None => self.time_zone.start_of_day(self.date_time.date, provider)?,
            Some(time) => {
                let date_time = IsoDateTime::new(self.date_time.date, time.iso())?;
                self.time_zone
                    .epoch_nanoseconds_for(&date_time, Disambiguation::Compatible, provider)?
            }
        };
        self.rebuild(epoch_ns, provider)
    }

    pub fn with_plain_time(&self, time: Option<PlainTime>) -> TemporalResult<Self> {
        self.with_plain_time_with_provider(time, &ChronoTzProvider)
    }

    pub fn with_time_zone_with_provider(
        &self,
        time_zone: TimeZone,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        Self::new_with_provider(self.epoch_ns, time_zone, self.calendar, provider)
    }

    pub fn with_time_zone(&self, time_zone: TimeZone) -> TemporalResult<Self> {
        self.with_time_zone_with_provider(time_zone, &ChronoTzProvider)
    }

    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self {
            calendar,
            ..self.clone()
        }
    }

    /// Calendar units and days move the wall clock; hours and smaller are
    /// exact elapsed time.
    pub fn add_with_provider(
        &self,
        duration: &Duration,
        overflow: Overflow,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        let internal = InternalDuration::from_duration(duration);
        let epoch_ns = add_zoned(self.epoch_ns, &self.time_zone, &internal, overflow, provider)?;
        self.rebuild(epoch_ns, provider)
    }

    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        self.add_with_provider(duration, overflow, &ChronoTzProvider)
    }

    pub fn subtract_with_provider(
        &self,
        duration: &Duration,
        overflow: Overflow,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        self.add_with_provider(&duration.negated(), overflow, provider)
    }

    pub fn subtract(&self, duration: &Duration, overflow: Overflow) -> TemporalResult<Self> {
        self.subtract_with_provider(duration, overflow, &ChronoTzProvider)
    }

    fn difference(
        &self,
        operation: DifferenceOperation,
        other: &ZonedDateTime,
        options: &DifferenceOptions,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Duration> {
        if self.calendar != other.calendar {
            return Err(TemporalError::range(format!(
                "cannot compare values in {} and {}",
                self.calendar, other.calendar
            )));
        }
        let settings = options.resolve(operation, (Unit::Year, Unit::Nanosecond), Unit::Hour, Unit::Nanosecond)?;
        let result = if settings.largest_unit.is_time_unit() {
            let mut ns = other.epoch_ns - self.epoch_ns;
            if !settings.is_noop() {
                let unit_ns = settings.smallest_unit.nanoseconds().unwrap_or(1);
                ns = round_i128_to_increment(ns, unit_ns * settings.increment as i128, settings.mode);
            }
            balance_time_duration(ns, settings.largest_unit)?
        } else {
            if self.time_zone != other.time_zone {
                return Err(TemporalError::range(format!(
                    "day and calendar units need a single time zone, not {} and {}",
                    self.time_zone, other.time_zone
                )));
            }
            if self.epoch_ns == other.epoch_ns {
                return Ok(Duration::default());
            }
            let mut difference = difference_zoned(
                self.epoch_ns,
                other.epoch_ns,
                &self.time_zone,
                settings.largest_unit,
                provider,
            )?;
            if !settings.is_noop() {
                let anchor = Anchor::Zoned {
                    date_time: self.date_time,
                    time_zone: &self.time_zone,
                    provider,
                };
                difference = round_relative_duration(
                    difference,
                    other.epoch_ns,
                    &anchor,
                    settings.largest_unit,
                    settings.smallest_unit,
                    settings.increment,
                    settings.mode,
                )?;
            }
            trace!(?difference, "zoned difference");
            difference.to_duration(settings.largest_unit)?
        };
        Ok(match operation {
            DifferenceOperation::Until => result,
            DifferenceOperation::Since => result.negated(),
        })
    }

    pub fn until_with_provider(
        &self,
        other: &ZonedDateTime,
        options: &DifferenceOptions,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Until, other, options, provider)
    }

    pub fn until(&self, other: &ZonedDateTime, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.until_with_provider(other, options, &ChronoTzProvider)
    }

    pub fn since_with_provider(
        &self,
        other: &ZonedDateTime,
        options: &DifferenceOptions,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Since, other, options, provider)
    }

    pub fn since(&self, other: &ZonedDateTime, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.since_with_provider(other, options, &ChronoTzProvider)
    }

    /// Rounding to `day` measures against the actual length of the local
    /// day; smaller units round the wall clock and keep the current offset
    /// where it is still valid.
    pub fn round_with_provider(
        &self,
        options: &RoundingOptions,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        let settings = options.resolve_for_point(true)?;
        let epoch_ns = if settings.smallest_unit == Unit::Day {
            let (start, end) = self.day_bounds(provider)?;
            let day_length = end - start;
            debug!(day_length, "rounding within a zoned day");
            start + round_i128_to_increment(self.epoch_ns - start, day_length, settings.mode)
        } else {
            let rounded = round_date_time(
                &self.date_time,
                settings.smallest_unit,
                settings.increment,
                settings.mode,
            )?;
            interpret_iso_date_time_offset(
                rounded.date,
                Some(rounded.time),
                OffsetBehaviour::Option,
                self.offset_ns,
                &self.time_zone,
                Disambiguation::Compatible,
                OffsetOption::Prefer,
                false,
                provider,
            )?
        };
        self.rebuild(epoch_ns, provider)
    }

    pub fn round(&self, options: &RoundingOptions) -> TemporalResult<Self> {
        self.round_with_provider(options, &ChronoTzProvider)
    }

    /// Same instant, zone and calendar.
    pub fn equals(&self, other: &ZonedDateTime) -> bool {
        self.epoch_ns == other.epoch_ns && self.time_zone == other.time_zone && self.calendar == other.calendar
    }

    /// Orders by instant alone.
    pub fn compare(one: &ZonedDateTime, two: &ZonedDateTime) -> Ordering {
        one.epoch_ns.cmp(&two.epoch_ns)
    }

    pub fn to_instant(&self) -> Instant {
        Instant::new_unchecked(self.epoch_ns)
    }

    pub fn to_plain_date(&self) -> PlainDate {
        PlainDate::new_unchecked(self.date_time.date, self.calendar)
    }

    pub fn to_plain_time(&self) -> PlainTime {
        PlainTime::from_iso(self.date_time.time)
    }

    pub fn to_plain_date_time(&self) -> TemporalResult<PlainDateTime> {
        PlainDateTime::from_iso(self.date_time, self.calendar)
    }

    fn format(&self, date_time: &IsoDateTime, offset_ns: i64, precision: Precision, options: &ToStringOptions) -> String {
        let mut out = format_iso_date_time(date_time, precision);
        if options.offset != ShowOffset::Never {
            out.push_str(&format_offset_rounded(offset_ns));
        }
        match options.time_zone_name {
            ShowTimeZone::Never => {}
            ShowTimeZone::Auto => out.push_str(&format!("[{}]", self.time_zone)),
            ShowTimeZone::Critical => out.push_str(&format!("[!{}]", self.time_zone)),
        }
        out.push_str(&format_calendar_annotation(self.calendar, options.calendar_name));
        out
    }

    /// The instant is rounded first and the offset taken at the rounded
    /// instant.
    pub fn to_string_with_provider(
        &self,
        options: &ToStringOptions,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<String> {
        let precision = options.seconds_precision()?;
        let rounded = round_epoch_nanoseconds(self.epoch_ns, precision.unit, precision.increment, options.rounding_mode());
        if rounded == self.epoch_ns {
            return Ok(self.format(&self.date_time, self.offset_ns, precision.precision, options));
        }
        check_epoch_nanoseconds(rounded)?;
        let offset_ns = self.time_zone.offset_nanoseconds_for(rounded, provider)?;
        let date_time = IsoDateTime::from_local_nanoseconds(rounded + offset_ns as i128);
        Ok(self.format(&date_time, offset_ns, precision.precision, options))
    }

    pub fn to_string_with_options(&self, options: &ToStringOptions) -> TemporalResult<String> {
        self.to_string_with_provider(options, &ChronoTzProvider)
    }
}

impl CalendarFields for ZonedDateTime {
    fn iso_date(&self) -> IsoDate {
        self.date_time.date
    }

    fn calendar(&self) -> Calendar {
        self.calendar
    }
}

impl FromStr for ZonedDateTime {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZonedDateTime::from_string(s)
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(
            &self.date_time,
            self.offset_ns,
            Precision::Auto,
            &ToStringOptions::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{RoundingMode, ShowCalendar};

    fn zdt(s: &str) -> ZonedDateTime {
        s.parse().unwrap()
    }

    fn la(s: &str) -> ZonedDateTime {
        zdt(&format!("{s}[America/Los_Angeles]"))
    }

    #[test]
    fn parsing_and_fields() {
        let z = la("2020-03-08T01:00-08:00");
        assert_eq!(z.to_string(), "2020-03-08T01:00:00-08:00[America/Los_Angeles]");
        assert_eq!(z.offset(), "-08:00");
        assert_eq!(z.offset_nanoseconds(), -8 * 3_600_000_000_000);
        assert_eq!((z.year(), z.month(), z.day(), z.hour()), (2020, 3, 8, 1));
        assert_eq!(z.day_of_week(), 7);
        assert_eq!(z.epoch_milliseconds(), 1_583_658_000_000);

        assert_eq!(zdt("2021-04-22T10:00Z[Europe/Paris]").to_string(), "2021-04-22T12:00:00+02:00[Europe/Paris]");
        assert_eq!(zdt("2021-04-22[UTC]").to_string(), "2021-04-22T00:00:00+00:00[UTC]");
        assert!(ZonedDateTime::from_string("2020-03-08T01:00-07:00[America/Los_Angeles]")
            .unwrap_err()
            .is_range());
        assert!(ZonedDateTime::from_string("2021-04-22T10:00+02:00").is_err());
        assert_eq!(zdt("2021-04-22T10:00+05:30[+05:30]").to_string(), "2021-04-22T10:00:00+05:30[+05:30]");
    }

    #[test]
    fn offset_option_on_parse() {
        let s = "2020-03-08T01:00-07:00[America/Los_Angeles]";
        let used = ZonedDateTime::from_string_with_provider(
            s,
            Disambiguation::Compatible,
            OffsetOption::Use,
            &ChronoTzProvider,
        )
        .unwrap();
        assert_eq!(used.to_string(), "2020-03-08T00:00:00-08:00[America/Los_Angeles]");
        let ignored = ZonedDateTime::from_string_with_provider(
            s,
            Disambiguation::Compatible,
            OffsetOption::Ignore,
            &ChronoTzProvider,
        )
        .unwrap();
        assert_eq!(ignored.to_string(), "2020-03-08T01:00:00-08:00[America/Los_Angeles]");
    }

    #[test]
    fn day_lengths_and_boundaries() {
        assert_eq!(la("2020-03-08T12:00-07:00").hours_in_day().unwrap(), 23.0);
        assert_eq!(la("2020-11-01T12:00-08:00").hours_in_day().unwrap(), 25.0);
        assert_eq!(la("2020-06-01T12:00-07:00").hours_in_day().unwrap(), 24.0);

        let sao_paulo = zdt("2018-11-04T12:00-02:00[America/Sao_Paulo]");
        assert_eq!(
            sao_paulo.start_of_day().unwrap().to_string(),
            "2018-11-04T01:00:00-02:00[America/Sao_Paulo]"
        );
    }

    #[test]
    fn transitions() {
        let z = la("2020-01-01T00:00-08:00");
        let next = z.next_transition().unwrap().unwrap();
        assert_eq!(next.to_string(), "2020-03-08T03:00:00-07:00[America/Los_Angeles]");
        let previous = next.previous_transition().unwrap().unwrap();
        assert_eq!(previous.to_string(), "2019-11-03T01:00:00-08:00[America/Los_Angeles]");
        assert!(zdt("2020-01-01T00:00[UTC]").next_transition().unwrap().is_none());
    }

    #[test]
    fn arithmetic_across_daylight_saving() {
        let z = la("2020-03-08T01:00-08:00");
        assert_eq!(
            z.add(&"PT1H".parse().unwrap(), Overflow::Constrain).unwrap().to_string(),
            "2020-03-08T03:00:00-07:00[America/Los_Angeles]"
        );
        let eve = la("2020-03-07T02:30-08:00");
        assert_eq!(
            eve.add(&"P1D".parse().unwrap(), Overflow::Constrain).unwrap().to_string(),
            "2020-03-08T03:30:00-07:00[America/Los_Angeles]"
        );
        assert_eq!(
            eve.add(&"PT24H".parse().unwrap(), Overflow::Constrain).unwrap().to_string(),
            "2020-03-08T03:30:00-07:00[America/Los_Angeles]"
        );
        assert_eq!(
            la("2020-03-09T00:00-07:00")
                .subtract(&"P1D".parse().unwrap(), Overflow::Constrain)
                .unwrap()
                .to_string(),
            "2020-03-08T00:00:00-08:00[America/Los_Angeles]"
        );
    }

    #[test]
    fn differences() {
        let start = la("2020-03-08T00:00-08:00");
        let end = la("2020-03-09T00:00-07:00");
        assert_eq!(start.until(&end, &DifferenceOptions::default()).unwrap().to_string(), "PT23H");
        let days = DifferenceOptions {
            largest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert_eq!(start.until(&end, &days).unwrap().to_string(), "P1D");
        assert_eq!(start.since(&end, &days).unwrap().to_string(), "-P1D");

        let later = la("2020-04-09T12:00-07:00");
        let months = DifferenceOptions {
            largest_unit: Some(Unit::Month),
            ..Default::default()
        };
        assert_eq!(start.until(&later, &months).unwrap().to_string(), "P1M1DT12H");
        let rounded = DifferenceOptions {
            largest_unit: Some(Unit::Month),
            smallest_unit: Some(Unit::Day),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(start.until(&later, &rounded).unwrap().to_string(), "P1M2D");

        let utc = start.with_time_zone(TimeZone::utc()).unwrap();
        assert!(start.until(&utc, &days).unwrap_err().is_range());
        assert_eq!(start.until(&utc, &DifferenceOptions::default()).unwrap().to_string(), "PT0S");
    }

    #[test]
    fn rounding() {
        let noon = la("2020-03-08T12:00-07:00");
        let day = RoundingOptions::with_smallest_unit(Unit::Day);
        assert_eq!(noon.round(&day).unwrap().to_string(), "2020-03-08T00:00:00-08:00[America/Los_Angeles]");
        let one_pm = la("2020-03-08T13:00-07:00");
        assert_eq!(one_pm.round(&day).unwrap().to_string(), "2020-03-09T00:00:00-07:00[America/Los_Angeles]");

        let utc = zdt("2021-04-22T10:29:59.5[UTC]");
        assert_eq!(
            utc.round(&RoundingOptions::with_smallest_unit(Unit::Hour)).unwrap().to_string(),
            "2021-04-22T10:00:00+00:00[UTC]"
        );
        assert_eq!(
            utc.round(&RoundingOptions::with_smallest_unit(Unit::Second)).unwrap().to_string(),
            "2021-04-22T10:30:00+00:00[UTC]"
        );
        let two_days = RoundingOptions {
            smallest_unit: Some(Unit::Day),
            rounding_increment: Some(2),
            ..Default::default()
        };
        assert!(utc.round(&two_days).unwrap_err().is_range());

        let repeated = la("2020-11-01T01:45-07:00");
        let half_hour = RoundingOptions {
            smallest_unit: Some(Unit::Minute),
            rounding_increment: Some(30),
            rounding_mode: Some(RoundingMode::Floor),
            ..Default::default()
        };
        assert_eq!(
            repeated.round(&half_hour).unwrap().to_string(),
            "2020-11-01T01:30:00-07:00[America/Los_Angeles]"
        );
    }

    #[test]
    fn with_fields() {
        let z = la("2020-03-08T01:00-08:00");
        let two_am = PartialZonedDateTime {
            time: PartialTime {
                hour: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            z.with(&two_am, Overflow::Constrain).unwrap().to_string(),
            "2020-03-08T03:00:00-07:00[America/Los_Angeles]"
        );

        let overlap = la("2020-11-01T01:30-07:00");
        let minute = PartialZonedDateTime {
            time: PartialTime {
                minute: Some(45),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            overlap.with(&minute, Overflow::Constrain).unwrap().to_string(),
            "2020-11-01T01:45:00-07:00[America/Los_Angeles]"
        );
        let standard = PartialZonedDateTime {
            offset: Some("-08:00".to_string()),
            ..Default::default()
        };
        assert_eq!(
            overlap.with(&standard, Overflow::Constrain).unwrap().to_string(),
            "2020-11-01T01:30:00-08:00[America/Los_Angeles]"
        );
        assert!(z.with(&PartialZonedDateTime::default(), Overflow::Constrain).unwrap_err().is_type());

        assert_eq!(
            z.with_plain_time(None).unwrap().to_string(),
            "2020-03-08T00:00:00-08:00[America/Los_Angeles]"
        );
        let time = PlainTime::new(2, 30, 0, 0, 0, 0).unwrap();
        assert_eq!(
            z.with_plain_time(Some(time)).unwrap().to_string(),
            "2020-03-08T03:30:00-07:00[America/Los_Angeles]"
        );
    }

    #[test]
    fn from_fields() {
        let partial = PartialZonedDateTime {
            date: PartialDate {
                year: Some(2020),
                month: Some(11),
                day: Some(1),
                ..Default::default()
            },
            time: PartialTime {
                hour: Some(1),
                minute: Some(30),
                ..Default::default()
            },
            offset: Some("-08:00".to_string()),
        };
        let tz = TimeZone::from_identifier("America/Los_Angeles", &ChronoTzProvider).unwrap();
        let z = ZonedDateTime::from_partial(&partial, tz.clone(), Calendar::Iso8601, Overflow::Constrain).unwrap();
        assert_eq!(z.to_string(), "2020-11-01T01:30:00-08:00[America/Los_Angeles]");

        let wall = PartialZonedDateTime {
            offset: None,
            ..partial.clone()
        };
        let z = ZonedDateTime::from_partial(&wall, tz.clone(), Calendar::Iso8601, Overflow::Constrain).unwrap();
        assert_eq!(z.offset(), "-07:00");

        let wrong = PartialZonedDateTime {
            offset: Some("+01:00".to_string()),
            ..partial
        };
        assert!(ZonedDateTime::from_partial(&wrong, tz, Calendar::Iso8601, Overflow::Constrain)
            .unwrap_err()
            .is_range());
    }

    #[test]
    fn conversions_and_ordering() {
        let z = la("2020-03-08T01:00-08:00");
        assert_eq!(z.to_instant().to_string(), "2020-03-08T09:00:00Z");
        assert_eq!(z.to_plain_date().to_string(), "2020-03-08");
        assert_eq!(z.to_plain_time().to_string(), "01:00:00");
        assert_eq!(z.to_plain_date_time().unwrap().to_string(), "2020-03-08T01:00:00");

        let utc = z.with_time_zone(TimeZone::utc()).unwrap();
        assert_eq!(utc.to_string(), "2020-03-08T09:00:00+00:00[UTC]");
        assert_eq!(ZonedDateTime::compare(&z, &utc), Ordering::Equal);
        assert!(!z.equals(&utc));
        assert!(z.equals(&la("2020-03-08T01:00-08:00")));
        assert_eq!(
            ZonedDateTime::compare(&z, &la("2020-03-08T03:00-07:00")),
            Ordering::Less
        );
    }

    #[test]
    fn to_string_options() {
        let z = zdt("2021-04-22T10:29:59.987[UTC]");
        let minute = ToStringOptions {
            smallest_unit: Some(Unit::Minute),
            ..Default::default()
        };
        assert_eq!(z.to_string_with_options(&minute).unwrap(), "2021-04-22T10:29+00:00[UTC]");
        let rounded = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(0)),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(z.to_string_with_options(&rounded).unwrap(), "2021-04-22T10:30:00+00:00[UTC]");
        let bare = ToStringOptions {
            offset: ShowOffset::Never,
            time_zone_name: ShowTimeZone::Never,
            ..Default::default()
        };
        assert_eq!(z.to_string_with_options(&bare).unwrap(), "2021-04-22T10:29:59.987");
        let critical = ToStringOptions {
            time_zone_name: ShowTimeZone::Critical,
            calendar_name: ShowCalendar::Always,
            ..Default::default()
        };
        assert_eq!(
            z.to_string_with_options(&critical).unwrap(),
            "2021-04-22T10:29:59.987+00:00[!UTC][u-ca=iso8601]"
        );
        assert_eq!(
            z.with_calendar(Calendar::Gregory).to_string(),
            "2021-04-22T10:29:59.987+00:00[UTC][u-ca=gregory]"
        );
    }
}
