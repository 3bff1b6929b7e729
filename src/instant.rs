//! Exact points on the time line, and the conversions between epoch
//! nanoseconds and calendar fields.
//!
//! Epoch values cross the public API as [`BigInt`]; every representable
//! instant also fits in an `i128`, which is what the arithmetic uses.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;
use tracing::trace;

use crate::calendar::Calendar;
use crate::duration::{DateDuration, Duration, balance_time_duration};
use crate::error::{TemporalError, TemporalResult};
use crate::format::format_iso_date_time;
use crate::iso::{IsoDate, IsoDateTime, IsoTime, NS_MAX_INSTANT, NS_MIN_INSTANT};
use crate::options::{
    DifferenceOperation, DifferenceOptions, NS_PER_DAY, NS_PER_MS, RoundingOptions, ToStringOptions, Unit,
    validate_rounding_increment,
};
use crate::parser::parse_instant_string;
use crate::rounding::{round_epoch_nanoseconds, round_i128_to_increment};
use crate::time_zone::{ChronoTzProvider, TimeZone, TimeZoneProvider, check_epoch_nanoseconds, format_offset_rounded};
use crate::zoned_date_time::ZonedDateTime;

const MS_PER_DAY: i64 = 86_400_000;

fn is_valid_epoch_ns(ns: &BigInt) -> bool {
    *ns >= BigInt::from(NS_MIN_INSTANT) && *ns <= BigInt::from(NS_MAX_INSTANT)
}

/// Epoch nanoseconds of a UTC reading. The whole-millisecond part is
/// computed in machine integers, the sub-millisecond part is layered on
/// exactly.
pub fn epoch_nanoseconds_from_fields(date_time: &IsoDateTime) -> BigInt {
    let IsoTime {
        hour,
        minute,
        second,
        millisecond,
        microsecond,
        nanosecond,
    } = date_time.time;
    let ms = date_time.date.to_epoch_days() * MS_PER_DAY
        + hour as i64 * 3_600_000
        + minute as i64 * 60_000
        + second as i64 * 1_000
        + millisecond as i64;
    BigInt::from(ms) * 1_000_000 + BigInt::from(microsecond as i64 * 1_000 + nanosecond as i64)
}

/// UTC fields of an epoch value. Negative values floor, so the
/// sub-millisecond fields are never negative.
pub fn fields_from_epoch_nanoseconds(epoch_ns: &BigInt) -> TemporalResult<IsoDateTime> {
    if !is_valid_epoch_ns(epoch_ns) {
        return Err(TemporalError::range("instant is outside the representable range"));
    }
    let (ms, remainder) = epoch_ns.div_mod_floor(&BigInt::from(1_000_000));
    let ms = ms
        .to_i64()
        .ok_or_else(|| TemporalError::range("instant is outside the representable range"))?;
    let remainder = remainder.to_i64().unwrap_or(0);
    let ms_of_day = ms.rem_euclid(MS_PER_DAY);
    let date = IsoDate::from_epoch_days(ms.div_euclid(MS_PER_DAY));
    let time = IsoTime {
        hour: (ms_of_day / 3_600_000) as u8,
        minute: (ms_of_day / 60_000 % 60) as u8,
        second: (ms_of_day / 1_000 % 60) as u8,
        millisecond: (ms_of_day % 1_000) as u16,
        microsecond: (remainder / 1_000) as u16,
        nanosecond: (remainder % 1_000) as u16,
    };
    Ok(IsoDateTime::new_unchecked(date, time))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    epoch_ns: i128,
}

impl Instant {
    pub fn new(epoch_ns: i128) -> TemporalResult<Self> {
        check_epoch_nanoseconds(epoch_ns)?;
        Ok(Self { epoch_ns })
    }

    pub(crate) const fn new_unchecked(epoch_ns: i128) -> Self {
        Self { epoch_ns }
    }

    pub fn from_epoch_nanoseconds(epoch_ns: &BigInt) -> TemporalResult<Self> {
        if !is_valid_epoch_ns(epoch_ns) {
            return Err(TemporalError::range("instant is outside the representable range"));
        }
        let epoch_ns = epoch_ns
            .to_i128()
            .ok_or_else(|| TemporalError::range("instant is outside the representable range"))?;
        Ok(Self { epoch_ns })
    }

    pub fn from_epoch_milliseconds(epoch_ms: i64) -> TemporalResult<Self> {
        Self::new(epoch_ms as i128 * NS_PER_MS)
    }

    /// Parse an instant string: a date-time with `Z` or a numeric offset.
    /// Any bracketed zone is ignored; the offset alone fixes the instant.
    pub fn from_string(s: &str) -> TemporalResult<Self> {
        let parsed = parse_instant_string(s)?;
        let time = parsed.time.unwrap_or(IsoTime::MIDNIGHT);
        let local = IsoDateTime::new(parsed.date, time)?;
        let offset_ns = match parsed.offset {
            Some(offset) if !parsed.utc_designator => offset.nanoseconds as i128,
            _ => 0,
        };
        Self::new(local.to_local_nanoseconds() - offset_ns)
    }

    pub fn epoch_nanoseconds(&self) -> BigInt {
        BigInt::from(self.epoch_ns)
    }

    pub fn epoch_milliseconds(&self) -> i64 {
        self.epoch_ns.div_euclid(NS_PER_MS) as i64
    }

    pub(crate) fn epoch_ns(&self) -> i128 {
        self.epoch_ns
    }

    fn add_duration(&self, duration: &Duration) -> TemporalResult<Self> {
        if duration.date() != DateDuration::default() {
            return Err(TemporalError::range(
                "an instant cannot add years, months, weeks or days",
            ));
        }
        Self::new(self.epoch_ns + duration.time_nanoseconds())
    }

    pub fn add(&self, duration: &Duration) -> TemporalResult<Self> {
        self.add_duration(duration)
    }

    pub fn subtract(&self, duration: &Duration) -> TemporalResult<Self> {
        self.add_duration(&duration.negated())
    }

    fn difference(
        &self,
        operation: DifferenceOperation,
        other: &Instant,
        options: &DifferenceOptions,
    ) -> TemporalResult<Duration> {
        let settings = options.resolve(operation, (Unit::Hour, Unit::Nanosecond), Unit::Second, Unit::Nanosecond)?;
        let mut ns = other.epoch_ns - self.epoch_ns;
        if !settings.is_noop() {
            let unit_ns = settings.smallest_unit.nanoseconds().unwrap_or(1);
            ns = round_i128_to_increment(ns, unit_ns * settings.increment as i128, settings.mode);
        }
        let result = balance_time_duration(ns, settings.largest_unit)?;
        Ok(match operation {
            DifferenceOperation::Until => result,
            DifferenceOperation::Since => result.negated(),
        })
    }

    pub fn until(&self, other: &Instant, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Until, other, options)
    }

    pub fn since(&self, other: &Instant, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Since, other, options)
    }

    /// Round to a time unit counted from the epoch. The increment must divide
    /// a solar day evenly.
    pub fn round(&self, options: &RoundingOptions) -> TemporalResult<Self> {
        let unit = options.require_smallest_unit()?;
        let Some(unit_ns) = unit.nanoseconds().filter(|_| unit.is_time_unit()) else {
            return Err(TemporalError::range(format!("{unit} is not a valid smallestUnit here")));
        };
        let increment = options.increment();
        validate_rounding_increment(increment, (NS_PER_DAY / unit_ns) as u64, true)?;
        let rounded = round_epoch_nanoseconds(self.epoch_ns, unit, increment, options.mode());
        trace!(from = self.epoch_ns, to = rounded, %unit, increment, "rounded instant");
        Self::new(rounded)
    }

    pub fn equals(&self, other: &Instant) -> bool {
        self == other
    }

    pub fn compare(one: &Instant, two: &Instant) -> std::cmp::Ordering {
        one.cmp(two)
    }

    pub fn to_zoned_date_time(&self, time_zone: TimeZone, calendar: Calendar) -> TemporalResult<ZonedDateTime> {
        ZonedDateTime::new(self.epoch_ns, time_zone, calendar)
    }

    pub fn to_string_with_options(
        &self,
        time_zone: Option<&TimeZone>,
        options: &ToStringOptions,
    ) -> TemporalResult<String> {
        self.to_string_with_provider(time_zone, options, &ChronoTzProvider)
    }

    /// Without a zone the reading is UTC and ends in `Z`; with one it ends in
    /// that zone's offset, rounded to the minute.
    pub fn to_string_with_provider(
        &self,
        time_zone: Option<&TimeZone>,
        options: &ToStringOptions,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<String> {
        let precision = options.seconds_precision()?;
        let rounded = round_epoch_nanoseconds(self.epoch_ns, precision.unit, precision.increment, options.rounding_mode());
        check_epoch_nanoseconds(rounded)?;
        let (local, suffix) = match time_zone {
            None => (
                IsoDateTime::from_local_nanoseconds(rounded),
                "Z".to_string(),
            ),
            Some(tz) => {
                let offset = tz.offset_nanoseconds_for(rounded, provider)?;
                (
                    IsoDateTime::from_local_nanoseconds(rounded + offset as i128),
                    format_offset_rounded(offset),
                )
            }
        };
        Ok(format!("{}{suffix}", format_iso_date_time(&local, precision.precision)))
    }
}

impl FromStr for Instant {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instant::from_string(s)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .to_string_with_options(None, &ToStringOptions::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
