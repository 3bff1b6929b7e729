//! The ten-component signed duration.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;

use crate::error::{TemporalError, TemporalResult};
use crate::options::{
    NS_PER_DAY, NS_PER_HOUR, NS_PER_MIN, NS_PER_MS, NS_PER_SEC, NS_PER_US, Precision,
    RoundingOptions, ToStringOptions, Unit, validate_rounding_increment,
};
use crate::parser::{ParsedDuration, parse_duration_string};
use crate::relative::{self, InternalDuration, RelativeTo};
use crate::rounding::{format_fractional_seconds, round_i128_to_increment};
use crate::time_zone::{ChronoTzProvider, TimeZoneProvider};

/// Years, months and weeks must each stay below this magnitude.
const MAX_CALENDAR_COMPONENT: i64 = 1 << 32;
/// Exclusive bound on days plus time, in nanoseconds (2^53 seconds).
pub(crate) const MAX_TIME_DURATION_NS: i128 = (1i128 << 53) * NS_PER_SEC;

fn sign_of(values: &[i128]) -> i8 {
    for &v in values {
        match v.cmp(&0) {
            Ordering::Greater => return 1,
            Ordering::Less => return -1,
            Ordering::Equal => {}
        }
    }
    0
}

/// The calendar half of a duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateDuration {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
}

impl DateDuration {
    pub fn new(years: i64, months: i64, weeks: i64, days: i64) -> TemporalResult<Self> {
        Duration::new(years, months, weeks, days, 0, 0, 0, 0, 0, 0).map(|d| d.date())
    }

    pub(crate) const fn new_unchecked(years: i64, months: i64, weeks: i64, days: i64) -> Self {
        Self {
            years,
            months,
            weeks,
            days,
        }
    }

    pub fn sign(&self) -> i8 {
        sign_of(&[
            self.years as i128,
            self.months as i128,
            self.weeks as i128,
            self.days as i128,
        ])
    }

    pub(crate) fn with_days(self, days: i64) -> Self {
        Self { days, ..self }
    }
}

/// A partial bag of duration fields, as supplied to `from` or `with`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialDuration {
    pub years: Option<i64>,
    pub months: Option<i64>,
    pub weeks: Option<i64>,
    pub days: Option<i64>,
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub milliseconds: Option<i64>,
    pub microseconds: Option<i128>,
    pub nanoseconds: Option<i128>,
}

impl PartialDuration {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A signed duration. All nonzero components share one sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Duration {
    years: i64,
    months: i64,
    weeks: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    milliseconds: i64,
    microseconds: i128,
    nanoseconds: i128,
}

impl Duration {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        years: i64,
        months: i64,
        weeks: i64,
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
        milliseconds: i64,
        microseconds: i128,
        nanoseconds: i128,
    ) -> TemporalResult<Self> {
        let d = Self {
            years,
            months,
            weeks,
            days,
            hours,
            minutes,
            seconds,
            milliseconds,
            microseconds,
            nanoseconds,
        };
        d.validate()?;
        Ok(d)
    }

    fn validate(&self) -> TemporalResult<()> {
        let sign = self.sign();
        let components = self.components();
        if components.iter().any(|&v| v != 0 && v.signum() as i8 != sign) {
            return Err(TemporalError::range("duration components must share one sign"));
        }
        if [self.years, self.months, self.weeks]
            .iter()
            .any(|v| v.unsigned_abs() >= MAX_CALENDAR_COMPONENT as u64)
        {
            return Err(TemporalError::range("years, months and weeks must be below 2^32"));
        }
        let total = self
            .day_time_nanoseconds_checked()
            .ok_or_else(|| TemporalError::range("duration time is out of range"))?;
        if total.abs() >= MAX_TIME_DURATION_NS {
            return Err(TemporalError::range("duration time is out of range"));
        }
        Ok(())
    }

    fn components(&self) -> [i128; 10] {
        [
            self.years as i128,
            self.months as i128,
            self.weeks as i128,
            self.days as i128,
            self.hours as i128,
            self.minutes as i128,
            self.seconds as i128,
            self.milliseconds as i128,
            self.microseconds,
            self.nanoseconds,
        ]
    }

    pub(crate) fn from_date_and_time(date: DateDuration, time: &Duration) -> TemporalResult<Self> {
        Self::new(
            date.years,
            date.months,
            date.weeks,
            date.days + time.days,
            time.hours,
            time.minutes,
            time.seconds,
            time.milliseconds,
            time.microseconds,
            time.nanoseconds,
        )
    }

    pub fn from_date_duration(date: DateDuration) -> TemporalResult<Self> {
        Self::new(date.years, date.months, date.weeks, date.days, 0, 0, 0, 0, 0, 0)
    }

    pub(crate) fn from_parsed(parsed: &ParsedDuration) -> TemporalResult<Self> {
        let narrow = |v: u128| {
            i64::try_from(v).map_err(|_| TemporalError::range("duration component is out of range"))
        };
        let wide = |v: u128| {
            i128::try_from(v).map_err(|_| TemporalError::range("duration component is out of range"))
        };
        let s: i64 = if parsed.negative { -1 } else { 1 };
        Self::new(
            s * narrow(parsed.years)?,
            s * narrow(parsed.months)?,
            s * narrow(parsed.weeks)?,
            s * narrow(parsed.days)?,
            s * narrow(parsed.hours)?,
            s * narrow(parsed.minutes)?,
            s * narrow(parsed.seconds)?,
            s * narrow(parsed.milliseconds)?,
            s as i128 * wide(parsed.microseconds)?,
            s as i128 * wide(parsed.nanoseconds)?,
        )
    }

    /// Build from a field bag; at least one field must be present.
    pub fn from_partial(partial: &PartialDuration) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("a duration needs at least one field"));
        }
        Self::default().with(partial)
    }

    /// Replace the supplied fields.
    pub fn with(&self, partial: &PartialDuration) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("a duration needs at least one field"));
        }
        Self::new(
            partial.years.unwrap_or(self.years),
            partial.months.unwrap_or(self.months),
            partial.weeks.unwrap_or(self.weeks),
            partial.days.unwrap_or(self.days),
            partial.hours.unwrap_or(self.hours),
            partial.minutes.unwrap_or(self.minutes),
            partial.seconds.unwrap_or(self.seconds),
            partial.milliseconds.unwrap_or(self.milliseconds),
            partial.microseconds.unwrap_or(self.microseconds),
            partial.nanoseconds.unwrap_or(self.nanoseconds),
        )
    }

    pub fn years(&self) -> i64 {
        self.years
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    pub fn weeks(&self) -> i64 {
        self.weeks
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn hours(&self) -> i64 {
        self.hours
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn milliseconds(&self) -> i64 {
        self.milliseconds
    }

    pub fn microseconds(&self) -> i128 {
        self.microseconds
    }

    pub fn nanoseconds(&self) -> i128 {
        self.nanoseconds
    }

    pub fn date(&self) -> DateDuration {
        DateDuration::new_unchecked(self.years, self.months, self.weeks, self.days)
    }

    /// The first nonzero component decides the sign.
    pub fn sign(&self) -> i8 {
        sign_of(&self.components())
    }

    pub fn is_blank(&self) -> bool {
        self.sign() == 0
    }

    pub fn negated(&self) -> Self {
        Self {
            years: -self.years,
            months: -self.months,
            weeks: -self.weeks,
            days: -self.days,
            hours: -self.hours,
            minutes: -self.minutes,
            seconds: -self.seconds,
            milliseconds: -self.milliseconds,
            microseconds: -self.microseconds,
            nanoseconds: -self.nanoseconds,
        }
    }

    pub fn abs(&self) -> Self {
        if self.sign() < 0 { self.negated() } else { *self }
    }

    pub(crate) fn has_calendar_units(&self) -> bool {
        self.years != 0 || self.months != 0 || self.weeks != 0
    }

    /// Hours through nanoseconds as one exact count; days and calendar
    /// units are not included.
    pub fn total_nanoseconds(&self) -> BigInt {
        BigInt::from(self.time_nanoseconds())
    }

    pub(crate) fn time_nanoseconds(&self) -> i128 {
        self.hours as i128 * NS_PER_HOUR
            + self.minutes as i128 * NS_PER_MIN
            + self.seconds as i128 * NS_PER_SEC
            + self.milliseconds as i128 * NS_PER_MS
            + self.microseconds * NS_PER_US
            + self.nanoseconds
    }

    fn day_time_nanoseconds_checked(&self) -> Option<i128> {
        let micro = self.microseconds.checked_mul(NS_PER_US)?;
        (self.days as i128 * NS_PER_DAY)
            .checked_add(self.hours as i128 * NS_PER_HOUR)?
            .checked_add(self.minutes as i128 * NS_PER_MIN)?
            .checked_add(self.seconds as i128 * NS_PER_SEC)?
            .checked_add(self.milliseconds as i128 * NS_PER_MS)?
            .checked_add(micro)?
            .checked_add(self.nanoseconds)
    }

    /// Days (as 24 hours) plus time, in nanoseconds. Valid durations never
    /// overflow here.
    pub(crate) fn day_time_nanoseconds(&self) -> i128 {
        self.days as i128 * NS_PER_DAY + self.time_nanoseconds()
    }

    pub fn default_largest_unit(&self) -> Unit {
        const UNITS: [Unit; 10] = [
            Unit::Year,
            Unit::Month,
            Unit::Week,
            Unit::Day,
            Unit::Hour,
            Unit::Minute,
            Unit::Second,
            Unit::Millisecond,
            Unit::Microsecond,
            Unit::Nanosecond,
        ];
        self.components()
            .iter()
            .zip(UNITS)
            .find(|(v, _)| **v != 0)
            .map(|(_, unit)| unit)
            .unwrap_or(Unit::Nanosecond)
    }

    pub fn add(&self, other: &Duration, relative_to: Option<&RelativeTo>) -> TemporalResult<Self> {
        self.add_with_provider(other, relative_to, &ChronoTzProvider)
    }

    pub fn subtract(&self, other: &Duration, relative_to: Option<&RelativeTo>) -> TemporalResult<Self> {
        self.add(&other.negated(), relative_to)
    }

    pub fn add_with_provider(
        &self,
        other: &Duration,
        relative_to: Option<&RelativeTo>,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        let largest = self.default_largest_unit().max(other.default_largest_unit());
        match relative_to {
            None => {
                if self.has_calendar_units() || other.has_calendar_units() {
                    return Err(TemporalError::type_error(
                        "relativeTo is required to add years, months or weeks",
                    ));
                }
                balance_time_duration(
                    self.day_time_nanoseconds() + other.day_time_nanoseconds(),
                    largest,
                )
            }
            Some(relative_to) => relative::add_durations(relative_to, self, other, largest, provider),
        }
    }

    pub fn round(&self, options: &RoundingOptions, relative_to: Option<&RelativeTo>) -> TemporalResult<Self> {
        self.round_with_provider(options, relative_to, &ChronoTzProvider)
    }

    pub fn round_with_provider(
        &self,
        options: &RoundingOptions,
        relative_to: Option<&RelativeTo>,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Self> {
        if options.smallest_unit.is_none() && options.largest_unit.is_none() {
            return Err(TemporalError::range("smallestUnit or largestUnit is required"));
        }
        let smallest = options.smallest_unit.unwrap_or(Unit::Nanosecond);
        let largest = options
            .largest_unit
            .unwrap_or_else(|| self.default_largest_unit().max(smallest));
        if largest < smallest {
            return Err(TemporalError::range(format!(
                "largestUnit {largest} cannot be smaller than smallestUnit {smallest}"
            )));
        }
        let increment = options.increment();
        match smallest.max_rounding_increment() {
            Some(max) => validate_rounding_increment(increment, max, false)?,
            None if !(1..=1_000_000_000).contains(&increment) => {
                return Err(TemporalError::range(format!(
                    "roundingIncrement {increment} is out of range"
                )));
            }
            None => {}
        }
        if increment > 1 && smallest.is_calendar_unit() && largest != smallest {
            return Err(TemporalError::range(
                "a roundingIncrement above 1 needs largestUnit equal to a calendar smallestUnit",
            ));
        }
        let mode = options.mode();
        match relative_to {
            None => {
                if self.has_calendar_units() || largest.is_calendar_unit() || smallest.is_calendar_unit() {
                    return Err(TemporalError::type_error(
                        "relativeTo is required to round with years, months or weeks",
                    ));
                }
                let unit_ns = smallest.nanoseconds().unwrap_or(1);
                let rounded = round_i128_to_increment(
                    self.day_time_nanoseconds(),
                    unit_ns * increment as i128,
                    mode,
                );
                balance_time_duration(rounded, largest)
            }
            Some(relative_to) => relative::round_duration(
                relative_to,
                self,
                largest,
                smallest,
                increment,
                mode,
                provider,
            ),
        }
    }

    /// The duration expressed as a count of `unit`.
    pub fn total(&self, unit: Unit, relative_to: Option<&RelativeTo>) -> TemporalResult<f64> {
        self.total_with_provider(unit, relative_to, &ChronoTzProvider)
    }

    pub fn total_with_provider(
        &self,
        unit: Unit,
        relative_to: Option<&RelativeTo>,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<f64> {
        match relative_to {
            None => {
                if self.has_calendar_units() || unit.is_calendar_unit() {
                    return Err(TemporalError::type_error(
                        "relativeTo is required to total years, months or weeks",
                    ));
                }
                let unit_ns = unit.nanoseconds().unwrap_or(1);
                Ok(relative::ratio_to_f64(
                    &BigInt::from(self.day_time_nanoseconds()),
                    &BigInt::from(unit_ns),
                ))
            }
            Some(relative_to) => relative::total_duration(relative_to, self, unit, provider),
        }
    }

    pub fn compare(one: &Duration, two: &Duration, relative_to: Option<&RelativeTo>) -> TemporalResult<Ordering> {
        Self::compare_with_provider(one, two, relative_to, &ChronoTzProvider)
    }

    pub fn compare_with_provider(
        one: &Duration,
        two: &Duration,
        relative_to: Option<&RelativeTo>,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Ordering> {
        if one == two {
            return Ok(Ordering::Equal);
        }
        match relative_to {
            Some(relative_to) => relative::compare_durations(relative_to, one, two, provider),
            None if one.has_calendar_units() || two.has_calendar_units() => Err(
                TemporalError::type_error("relativeTo is required to compare years, months or weeks"),
            ),
            None => Ok(one.day_time_nanoseconds().cmp(&two.day_time_nanoseconds())),
        }
    }

    pub fn to_string_with_options(&self, options: &ToStringOptions) -> TemporalResult<String> {
        if matches!(options.smallest_unit, Some(Unit::Hour | Unit::Minute)) {
            return Err(TemporalError::range("smallestUnit must be seconds or finer"));
        }
        let precision = options.seconds_precision()?;
        if precision.unit == Unit::Nanosecond && precision.increment == 1 {
            return Ok(format_duration(self, precision.precision));
        }
        let unit_ns = precision.unit.nanoseconds().unwrap_or(1);
        let rounded = round_i128_to_increment(
            self.time_nanoseconds(),
            unit_ns * precision.increment as i128,
            options.rounding_mode(),
        );
        let largest = self.default_largest_unit().max(Unit::Second).min(Unit::Hour);
        let time = balance_time_duration(rounded, largest)?;
        let rounded = Duration::from_date_and_time(self.date(), &time)?;
        Ok(format_duration(&rounded, precision.precision))
    }
}

impl FromStr for Duration {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Duration::from_parsed(&parse_duration_string(s)?)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self, Precision::Auto))
    }
}

/// Split a signed nanosecond count into duration fields, with
/// `largest_unit` as the coarsest field used (days count 24 hours).
pub fn balance_time_duration(nanoseconds: i128, largest_unit: Unit) -> TemporalResult<Duration> {
    let sign: i128 = if nanoseconds < 0 { -1 } else { 1 };
    let mut rest = nanoseconds.abs();
    let ladder = [
        (Unit::Day, NS_PER_DAY),
        (Unit::Hour, NS_PER_HOUR),
        (Unit::Minute, NS_PER_MIN),
        (Unit::Second, NS_PER_SEC),
        (Unit::Millisecond, NS_PER_MS),
        (Unit::Microsecond, NS_PER_US),
        (Unit::Nanosecond, 1),
    ];
    let top = largest_unit.min(Unit::Day);
    let mut fields = [0i128; 7];
    for (slot, (unit, length)) in ladder.iter().enumerate() {
        if *unit > top {
            continue;
        }
        fields[slot] = rest / length;
        rest %= length;
    }
    let narrow = |v: i128| {
        i64::try_from(sign * v).map_err(|_| TemporalError::range("duration component is out of range"))
    };
    Duration::new(
        0,
        0,
        0,
        narrow(fields[0])?,
        narrow(fields[1])?,
        narrow(fields[2])?,
        narrow(fields[3])?,
        narrow(fields[4])?,
        sign * fields[5],
        sign * fields[6],
    )
}

impl InternalDuration {
    pub(crate) fn from_duration(d: &Duration) -> Self {
        Self {
            date: d.date(),
            time_ns: d.time_nanoseconds(),
        }
    }

    /// Back to a duration. Date units keep their own fields; the time part
    /// is balanced up to hours, or up to `largest_unit` when that is a
    /// time unit (in which case the date part is empty).
    pub(crate) fn to_duration(&self, largest_unit: Unit) -> TemporalResult<Duration> {
        let time_largest = if largest_unit.is_date_unit() {
            Unit::Hour
        } else {
            largest_unit
        };
        let time = balance_time_duration(self.time_ns, time_largest)?;
        Duration::from_date_and_time(self.date, &time)
    }
}

/// Render `P…Y…M…W…DT…H…M…S`. Sub-second fields are folded into the seconds
/// with their fraction.
pub(crate) fn format_duration(d: &Duration, precision: Precision) -> String {
    let sign = d.sign();
    let mut out = String::new();
    if sign < 0 {
        out.push('-');
    }
    out.push('P');
    let abs = d.abs();
    for (value, designator) in [
        (abs.years, 'Y'),
        (abs.months, 'M'),
        (abs.weeks, 'W'),
        (abs.days, 'D'),
    ] {
        if value != 0 {
            out.push_str(&format!("{value}{designator}"));
        }
    }

    let sub_ns = abs.milliseconds as i128 * NS_PER_MS + abs.microseconds * NS_PER_US + abs.nanoseconds;
    let total_second_ns = abs.seconds as i128 * NS_PER_SEC + sub_ns;
    let whole_seconds = total_second_ns / NS_PER_SEC;
    let fraction = (total_second_ns % NS_PER_SEC) as u32;

    let mut time = String::new();
    if abs.hours != 0 {
        time.push_str(&format!("{}H", abs.hours));
    }
    if abs.minutes != 0 {
        time.push_str(&format!("{}M", abs.minutes));
    }
    let zero_above_seconds = abs.years == 0
        && abs.months == 0
        && abs.weeks == 0
        && abs.days == 0
        && abs.hours == 0
        && abs.minutes == 0;
    if total_second_ns != 0 || zero_above_seconds || precision != Precision::Auto {
        time.push_str(&format!(
            "{whole_seconds}{}S",
            format_fractional_seconds(fraction, precision)
        ));
    }
    if !time.is_empty() {
        out.push('T');
        out.push_str(&time);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RoundingMode;
    use proptest::prelude::*;

    fn dur(s: &str) -> Duration {
        s.parse().unwrap()
    }

    #[test]
    fn sign_invariant_is_enforced() {
        assert!(Duration::new(1, -1, 0, 0, 0, 0, 0, 0, 0, 0).unwrap_err().is_range());
        assert!(Duration::new(0, 0, 0, 0, 0, 0, 0, 0, -1, 1).is_err());
        assert_eq!(Duration::new(0, 0, 0, -1, -2, 0, 0, 0, 0, -3).unwrap().sign(), -1);
    }

    #[test]
    fn range_limits() {
        assert!(Duration::new((1 << 32) - 1, 0, 0, 0, 0, 0, 0, 0, 0, 0).is_ok());
        assert!(Duration::new(1 << 32, 0, 0, 0, 0, 0, 0, 0, 0, 0).is_err());
        let max_seconds = (1i64 << 53) - 1;
        assert!(Duration::new(0, 0, 0, 0, 0, 0, max_seconds, 999, 999, 999).is_ok());
        assert!(Duration::new(0, 0, 0, 0, 0, 0, max_seconds, 999, 999, 1000).is_err());
    }

    #[test]
    fn partial_bags() {
        let empty = PartialDuration::default();
        assert!(Duration::from_partial(&empty).unwrap_err().is_type());
        let d = Duration::from_partial(&PartialDuration {
            minutes: Some(80),
            seconds: Some(90),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(d.to_string(), "PT80M90S");
        let w = d
            .with(&PartialDuration {
                seconds: Some(30),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(w.to_string(), "PT80M30S");
    }

    #[test]
    fn formatting() {
        assert_eq!(Duration::default().to_string(), "PT0S");
        assert_eq!(dur("P1Y2M3W4DT5H6M7.008009010S").to_string(), "P1Y2M3W4DT5H6M7.00800901S");
        assert_eq!(Duration::new(0, 0, 0, 0, 0, 0, 0, 1500, 0, 0).unwrap().to_string(), "PT1.5S");
        assert_eq!(dur("-P1D").to_string(), "-P1D");
        assert_eq!(dur("-PT24.567890123H").to_string(), "-PT24H34M4.404442799S");
        assert_eq!(dur("-PT1.03125H").to_string(), "-PT1H1M52.5S");
    }

    #[test]
    fn formatting_with_precision() {
        let d = dur("PT1M2.987654321S");
        let opts = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(2)),
            ..Default::default()
        };
        assert_eq!(d.to_string_with_options(&opts).unwrap(), "PT1M2.98S");
        let opts = ToStringOptions {
            smallest_unit: Some(Unit::Second),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(d.to_string_with_options(&opts).unwrap(), "PT1M3S");
        let opts = ToStringOptions {
            smallest_unit: Some(Unit::Minute),
            ..Default::default()
        };
        assert!(d.to_string_with_options(&opts).is_err());
        let opts = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(3)),
            ..Default::default()
        };
        assert_eq!(dur("P1D").to_string_with_options(&opts).unwrap(), "P1DT0.000S");
    }

    #[test]
    fn balancing_to_largest_unit() {
        let d = balance_time_duration(469_200 * NS_PER_SEC, Unit::Hour).unwrap();
        assert_eq!((d.hours(), d.minutes()), (130, 20));
        let d = balance_time_duration(-(90 * NS_PER_SEC), Unit::Minute).unwrap();
        assert_eq!(d.to_string(), "-PT1M30S");
        let d = balance_time_duration(2 * NS_PER_DAY + 1, Unit::Year).unwrap();
        assert_eq!(d.to_string(), "P2DT0.000000001S");
    }

    #[test]
    fn round_without_relative_to() {
        let d = Duration::new(0, 0, 0, 0, 12, 45, 35, 520, 450, 860).unwrap();
        let r = d.round(&RoundingOptions::with_smallest_unit(Unit::Hour), None).unwrap();
        assert_eq!(r.to_string(), "PT13H");

        let d = dur("PT80M90S");
        let opts = RoundingOptions {
            largest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        assert_eq!(d.round(&opts, None).unwrap().to_string(), "PT1H21M30S");

        let opts = RoundingOptions {
            largest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert_eq!(dur("PT48H").round(&opts, None).unwrap().to_string(), "P2D");

        let opts = RoundingOptions {
            largest_unit: Some(Unit::Year),
            ..Default::default()
        };
        assert!(dur("P370D").round(&opts, None).unwrap_err().is_type());
        assert!(d.round(&RoundingOptions::default(), None).unwrap_err().is_range());
    }

    #[test]
    fn day_and_calendar_increments_need_not_divide_a_billion() {
        let every_three_days = RoundingOptions {
            smallest_unit: Some(Unit::Day),
            rounding_increment: Some(3),
            ..Default::default()
        };
        assert_eq!(dur("P10D").round(&every_three_days, None).unwrap().to_string(), "P9D");

        let every_three_years = RoundingOptions {
            largest_unit: Some(Unit::Year),
            smallest_unit: Some(Unit::Year),
            rounding_increment: Some(3),
            ..Default::default()
        };
        let anchor: RelativeTo = "2020-01-01".parse().unwrap();
        assert_eq!(
            dur("P4Y").round(&every_three_years, Some(&anchor)).unwrap().to_string(),
            "P3Y"
        );

        let too_large = RoundingOptions {
            smallest_unit: Some(Unit::Day),
            rounding_increment: Some(1_000_000_001),
            ..Default::default()
        };
        assert!(dur("P10D").round(&too_large, None).unwrap_err().is_range());
    }

    #[test]
    fn total_without_relative_to() {
        let d = dur("PT130H20M");
        assert_eq!(d.total(Unit::Second, None).unwrap(), 469_200.0);
        assert_eq!(dur("PT36H").total(Unit::Day, None).unwrap(), 1.5);
        assert!(dur("P1M").total(Unit::Day, None).unwrap_err().is_type());
        assert!(dur("P1D").total(Unit::Month, None).unwrap_err().is_type());
    }

    #[test]
    fn add_without_relative_to() {
        let sum = dur("PT26H45M").add(&dur("PT30M"), None).unwrap();
        assert_eq!(sum.to_string(), "PT27H15M");
        let sum = dur("PT80M90S").add(&dur("PT100M15S"), None).unwrap();
        let opts = RoundingOptions {
            largest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        assert_eq!(sum.round(&opts, None).unwrap().to_string(), "PT3H1M45S");
        assert!(dur("P1Y").add(&dur("P1D"), None).unwrap_err().is_type());
        let diff = dur("P1D").subtract(&dur("PT1H"), None).unwrap();
        assert_eq!(diff.to_string(), "PT23H");
    }

    #[test]
    fn compare_without_relative_to() {
        assert_eq!(Duration::compare(&dur("PT25H"), &dur("P1D"), None).unwrap(), Ordering::Greater);
        assert_eq!(Duration::compare(&dur("PT24H"), &dur("P1D"), None).unwrap(), Ordering::Equal);
        assert!(Duration::compare(&dur("P1M"), &dur("P30D"), None).unwrap_err().is_type());
    }

    proptest! {
        #[test]
        fn mixed_signs_always_fail(a in 1i64..1_000_000, b in 1i64..1_000_000, slot in 0usize..9) {
            let mut fields = [0i64; 10];
            fields[slot] = a;
            fields[slot + 1] = -b;
            let r = Duration::new(
                fields[0], fields[1], fields[2], fields[3], fields[4],
                fields[5], fields[6], fields[7], fields[8] as i128, fields[9] as i128,
            );
            prop_assert!(r.is_err());
        }

        #[test]
        fn display_then_parse_is_identity(
            negative in any::<bool>(),
            years in 0i64..10_000, days in 0i64..100_000,
            hours in 0i64..1000, seconds in 0i64..100_000, nanos in 0i128..1_000_000_000,
        ) {
            let s: i64 = if negative { -1 } else { 1 };
            let d = Duration::new(s * years, 0, 0, s * days, s * hours, 0, s * seconds, 0, 0, s as i128 * nanos).unwrap();
            let back: Duration = d.to_string().parse().unwrap();
            prop_assert_eq!(back.to_string(), d.to_string());
            prop_assert_eq!(back.day_time_nanoseconds(), d.day_time_nanoseconds());
        }
    }
}
