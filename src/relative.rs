//! Duration arithmetic anchored to a date or a zoned date-time.
//!
//! Calendar units only have a length once they are laid down from a
//! starting point, and zoned days only once the zone's offset changes are
//! known. Everything here takes that starting point (an [`Anchor`]) and
//! works on [`InternalDuration`]s: a date part plus exact time nanoseconds.

use std::cmp::Ordering;
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;
use tracing::trace;

use crate::balance::{balance_iso_date, balance_nanoseconds};
use crate::date_math::{add_date_duration, add_iso_date, difference_iso_date};
use crate::duration::{DateDuration, Duration, balance_time_duration};
use crate::error::{TemporalError, TemporalResult};
use crate::iso::{IsoDateTime, IsoTime};
use crate::options::{Disambiguation, NS_PER_DAY, OffsetOption, Overflow, RoundingMode, Unit};
use crate::parser::parse_date_time_string;
use crate::plain_date::PlainDate;
use crate::rounding::{round_i128_to_increment, round_ratio_to_increment};
use crate::time_zone::{ChronoTzProvider, TimeZone, TimeZoneProvider, check_epoch_nanoseconds};
use crate::zoned_date_time::ZonedDateTime;

/// Guard on the day-length search; real zones settle within two steps.
const MAX_DAY_CORRECTIONS: usize = 4;

/// The starting point that gives calendar units (and zoned days) a length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelativeTo {
    PlainDate(PlainDate),
    ZonedDateTime(ZonedDateTime),
}

impl RelativeTo {
    /// A string with a bracketed time zone becomes a zoned anchor, anything
    /// else a plain date.
    pub fn from_string(s: &str, provider: &dyn TimeZoneProvider) -> TemporalResult<Self> {
        let parsed = parse_date_time_string(s)?;
        if parsed.time_zone.is_some() {
            let zoned = ZonedDateTime::from_parsed(
                parsed,
                Disambiguation::Compatible,
                OffsetOption::Reject,
                provider,
            )?;
            return Ok(RelativeTo::ZonedDateTime(zoned));
        }
        if parsed.utc_designator {
            return Err(TemporalError::range(
                "a Z designator needs a time zone annotation in relativeTo",
            ));
        }
        Ok(RelativeTo::PlainDate(PlainDate::from_parsed(&parsed)?))
    }
}

impl FromStr for RelativeTo {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelativeTo::from_string(s, &ChronoTzProvider)
    }
}

impl From<PlainDate> for RelativeTo {
    fn from(date: PlainDate) -> Self {
        RelativeTo::PlainDate(date)
    }
}

impl From<ZonedDateTime> for RelativeTo {
    fn from(zoned: ZonedDateTime) -> Self {
        RelativeTo::ZonedDateTime(zoned)
    }
}

/// Date part plus a normalized time part in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InternalDuration {
    pub date: DateDuration,
    pub time_ns: i128,
}

impl InternalDuration {
    pub(crate) fn from_time(time_ns: i128) -> Self {
        Self {
            date: DateDuration::default(),
            time_ns,
        }
    }

    pub(crate) fn sign(&self) -> i64 {
        match self.date.sign() {
            0 => self.time_ns.signum() as i64,
            s => s as i64,
        }
    }
}

/// A wall-clock starting point, optionally tied to a zone.
pub(crate) enum Anchor<'a> {
    Plain(IsoDateTime),
    Zoned {
        date_time: IsoDateTime,
        time_zone: &'a TimeZone,
        provider: &'a dyn TimeZoneProvider,
    },
}

impl Anchor<'_> {
    fn date_time(&self) -> IsoDateTime {
        match self {
            Anchor::Plain(dt) => *dt,
            Anchor::Zoned { date_time, .. } => *date_time,
        }
    }

    fn is_zoned(&self) -> bool {
        matches!(self, Anchor::Zoned { .. })
    }

    /// Nanoseconds (epoch for zoned anchors, local otherwise) after moving
    /// the anchor's date by `date` and keeping its time.
    fn nanoseconds_after(&self, date: &DateDuration) -> TemporalResult<i128> {
        let start = self.date_time();
        let moved = add_date_duration(start.date, date, Overflow::Constrain)?;
        let moved = IsoDateTime::new(moved, start.time)?;
        match self {
            Anchor::Plain(_) => Ok(moved.to_local_nanoseconds()),
            Anchor::Zoned {
                time_zone, provider, ..
            } => time_zone.epoch_nanoseconds_for(&moved, Disambiguation::Compatible, *provider),
        }
    }
}

/// Add a duration to a wall-clock reading: time first (carrying whole
/// days), then the date part.
pub(crate) fn add_date_time(
    date_time: &IsoDateTime,
    duration: &InternalDuration,
    overflow: Overflow,
) -> TemporalResult<IsoDateTime> {
    let (carry, time) = balance_nanoseconds(date_time.time.to_nanoseconds() + duration.time_ns);
    let days = i64::try_from(carry)
        .ok()
        .and_then(|carry| carry.checked_add(duration.date.days))
        .ok_or_else(|| TemporalError::range("day count is out of range"))?;
    let date = add_iso_date(
        date_time.date,
        duration.date.years,
        duration.date.months,
        duration.date.weeks,
        days,
        overflow,
    )?;
    IsoDateTime::new(date, time)
}

/// Add a duration to an instant in a zone. The date part moves the
/// wall-clock reading; the time part is exact elapsed time.
pub(crate) fn add_zoned(
    epoch_ns: i128,
    time_zone: &TimeZone,
    duration: &InternalDuration,
    overflow: Overflow,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<i128> {
    if duration.date == DateDuration::default() {
        let result = epoch_ns + duration.time_ns;
        check_epoch_nanoseconds(result)?;
        return Ok(result);
    }
    let start = time_zone.date_time_for(epoch_ns, provider)?;
    let date = add_date_duration(start.date, &duration.date, overflow)?;
    let intermediate = time_zone.epoch_nanoseconds_for(
        &IsoDateTime::new(date, start.time)?,
        Disambiguation::Compatible,
        provider,
    )?;
    let result = intermediate + duration.time_ns;
    check_epoch_nanoseconds(result)?;
    Ok(result)
}

/// Difference between two wall-clock readings. When the time and date
/// differences point in opposite directions a day is borrowed from the
/// date. With a time `largest_unit` the days fold into the time part.
pub(crate) fn difference_iso_date_time(
    one: &IsoDateTime,
    two: &IsoDateTime,
    largest_unit: Unit,
) -> TemporalResult<InternalDuration> {
    let mut time_ns = two.time.to_nanoseconds() - one.time.to_nanoseconds();
    let time_sign = time_ns.signum() as i64;
    let date_sign = match one.date.cmp(&two.date) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    };
    let mut adjusted = two.date;
    if time_sign != 0 && time_sign == date_sign {
        adjusted = balance_iso_date(
            adjusted.year as i64,
            adjusted.month as i64,
            adjusted.day as i64 + time_sign,
        )?;
        time_ns -= time_sign as i128 * NS_PER_DAY;
    }
    let mut date = difference_iso_date(one.date, adjusted, largest_unit.max(Unit::Day))?;
    if largest_unit.is_time_unit() {
        time_ns += date.days as i128 * NS_PER_DAY;
        date = DateDuration::default();
    }
    Ok(InternalDuration { date, time_ns })
}

/// Split a nanosecond span starting at `start_ns` into whole zoned days and
/// a remainder, measuring each day by the zone's actual offsets. Also
/// returns the length of the day the remainder falls in.
pub(crate) fn nanoseconds_to_days(
    nanoseconds: i128,
    start_ns: i128,
    time_zone: &TimeZone,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<(i64, i128, i128)> {
    let sign = nanoseconds.signum() as i64;
    if sign == 0 {
        return Ok((0, 0, NS_PER_DAY));
    }
    let start = time_zone.date_time_for(start_ns, provider)?;
    let end_ns = start_ns + nanoseconds;
    check_epoch_nanoseconds(end_ns)?;
    let end = time_zone.date_time_for(end_ns, provider)?;

    let anchor = Anchor::Zoned {
        date_time: start,
        time_zone,
        provider,
    };
    let after_days = |days: i64| anchor.nanoseconds_after(&DateDuration::new_unchecked(0, 0, 0, days));

    let mut days = difference_iso_date_time(&start, &end, Unit::Day)?.date.days;
    let mut intermediate = after_days(days)?;
    let mut corrections = 0;
    while days != 0 && (intermediate - end_ns).signum() as i64 == sign {
        days -= sign;
        intermediate = after_days(days)?;
        corrections += 1;
        if corrections > MAX_DAY_CORRECTIONS {
            return Err(TemporalError::range("day length search did not converge"));
        }
    }

    let mut remainder = end_ns - intermediate;
    let mut day_length;
    corrections = 0;
    loop {
        let one_day_farther = after_days(days + sign)?;
        day_length = one_day_farther - intermediate;
        if (remainder - day_length) * sign as i128 >= 0 {
            remainder -= day_length;
            intermediate = one_day_farther;
            days += sign;
            corrections += 1;
            if corrections > MAX_DAY_CORRECTIONS {
                return Err(TemporalError::range("day length search did not converge"));
            }
        } else {
            break;
        }
    }
    trace!(days, remainder, day_length, "split nanoseconds into zoned days");
    Ok((days, remainder, day_length.abs()))
}

/// Difference between two instants as seen in a zone. Calendar units and
/// days follow the wall clock; the remainder is exact elapsed time.
pub(crate) fn difference_zoned(
    one_ns: i128,
    two_ns: i128,
    time_zone: &TimeZone,
    largest_unit: Unit,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<InternalDuration> {
    if largest_unit.is_time_unit() {
        return Ok(InternalDuration::from_time(two_ns - one_ns));
    }
    if one_ns == two_ns {
        return Ok(InternalDuration::default());
    }
    let start = time_zone.date_time_for(one_ns, provider)?;
    let end = time_zone.date_time_for(two_ns, provider)?;
    let wall = difference_iso_date_time(&start, &end, largest_unit)?;
    let calendar_part = wall.date.with_days(0);
    let intermediate = add_zoned(
        one_ns,
        time_zone,
        &InternalDuration {
            date: calendar_part,
            time_ns: 0,
        },
        Overflow::Constrain,
        provider,
    )?;
    let (days, time_ns, _) = nanoseconds_to_days(two_ns - intermediate, intermediate, time_zone, provider)?;
    Ok(InternalDuration {
        date: calendar_part.with_days(days),
        time_ns,
    })
}

struct Nudged {
    duration: InternalDuration,
    epoch_ns: i128,
    did_expand: bool,
}

fn truncate_to_increment(value: i64, increment: i64) -> i64 {
    value / increment * increment
}

/// Round at a calendar unit (or a zoned day) by laying down the two
/// candidate endpoints and measuring where the target falls between them.
/// Also returns the exact fractional count of `unit` as a ratio.
fn nudge_to_calendar_unit(
    sign: i64,
    duration: &InternalDuration,
    dest_ns: i128,
    anchor: &Anchor<'_>,
    increment: u64,
    unit: Unit,
    mode: RoundingMode,
) -> TemporalResult<(Nudged, BigInt, BigInt)> {
    let inc = increment as i64;
    let d = duration.date;
    let (r1, start, end) = match unit {
        Unit::Year => {
            let r1 = truncate_to_increment(d.years, inc);
            (
                r1,
                DateDuration::new_unchecked(r1, 0, 0, 0),
                DateDuration::new_unchecked(r1 + inc * sign, 0, 0, 0),
            )
        }
        Unit::Month => {
            let r1 = truncate_to_increment(d.months, inc);
            (
                r1,
                DateDuration::new_unchecked(d.years, r1, 0, 0),
                DateDuration::new_unchecked(d.years, r1 + inc * sign, 0, 0),
            )
        }
        Unit::Week => {
            let year_month = DateDuration::new_unchecked(d.years, d.months, 0, 0);
            let weeks_start = add_date_duration(anchor.date_time().date, &year_month, Overflow::Constrain)?;
            let weeks_end = add_iso_date(weeks_start, 0, 0, 0, d.days, Overflow::Constrain)?;
            let extra = difference_iso_date(weeks_start, weeks_end, Unit::Week)?;
            let r1 = truncate_to_increment(d.weeks + extra.weeks, inc);
            (
                r1,
                DateDuration::new_unchecked(d.years, d.months, r1, 0),
                DateDuration::new_unchecked(d.years, d.months, r1 + inc * sign, 0),
            )
        }
        _ => {
            let r1 = truncate_to_increment(d.days, inc);
            (r1, d.with_days(r1), d.with_days(r1 + inc * sign))
        }
    };
    let start_ns = anchor.nanoseconds_after(&start)?;
    let end_ns = anchor.nanoseconds_after(&end)?;
    if start_ns == end_ns {
        return Err(TemporalError::range("rounding interval collapsed to nothing"));
    }

    let signed = BigInt::from(sign);
    let progress = BigInt::from(dest_ns - start_ns) * &signed;
    let span = BigInt::from(end_ns - start_ns) * &signed;
    let total_numerator = BigInt::from(r1) * &span + &signed * BigInt::from(inc) * &progress;
    let rounded = round_ratio_to_increment(&total_numerator, &span, &BigInt::from(inc), mode);
    let did_expand = rounded != BigInt::from(r1);
    trace!(%unit, r1, %rounded, did_expand, "nudged to calendar unit");

    let (date, epoch_ns) = if did_expand { (end, end_ns) } else { (start, start_ns) };
    Ok((
        Nudged {
            duration: InternalDuration { date, time_ns: 0 },
            epoch_ns,
            did_expand,
        },
        total_numerator,
        span,
    ))
}

/// Round the time part of a duration whose days are zoned days. When the
/// rounded time reaches the length of the day it lands in, the day count
/// moves by one and the excess is rounded again from the next day's start.
pub(crate) fn adjust_rounded_duration_days(
    sign: i64,
    duration: &InternalDuration,
    anchor: &Anchor<'_>,
    increment: u64,
    unit: Unit,
    mode: RoundingMode,
) -> TemporalResult<(InternalDuration, i128, bool)> {
    let start_ns = anchor.nanoseconds_after(&duration.date)?;
    let end_ns = anchor.nanoseconds_after(&duration.date.with_days(duration.date.days + sign))?;
    let day_span = end_ns - start_ns;
    let increment_ns = unit.nanoseconds().unwrap_or(1) * increment as i128;

    let mut rounded = round_i128_to_increment(duration.time_ns, increment_ns, mode);
    let beyond = rounded - day_span;
    let rounded_beyond_day = beyond.signum() as i64 != -sign;
    let (day_delta, epoch_ns) = if rounded_beyond_day {
        rounded = round_i128_to_increment(beyond, increment_ns, mode);
        (sign, end_ns + rounded)
    } else {
        (0, start_ns + rounded)
    };
    Ok((
        InternalDuration {
            date: duration.date.with_days(duration.date.days + day_delta),
            time_ns: rounded,
        },
        epoch_ns,
        rounded_beyond_day,
    ))
}

/// Round days and time together, treating days as 24 hours.
fn nudge_to_day_or_time(
    duration: &InternalDuration,
    dest_ns: i128,
    largest_unit: Unit,
    increment: u64,
    unit: Unit,
    mode: RoundingMode,
) -> TemporalResult<Nudged> {
    let total = duration.date.days as i128 * NS_PER_DAY + duration.time_ns;
    let unit_ns = unit.nanoseconds().unwrap_or(NS_PER_DAY);
    let rounded = round_i128_to_increment(total, unit_ns * increment as i128, mode);
    let whole_days = total / NS_PER_DAY;
    let rounded_whole_days = rounded / NS_PER_DAY;
    let day_delta = rounded_whole_days - whole_days;
    let did_expand = day_delta != 0 && day_delta.signum() == total.signum();

    let (days, time_ns) = if largest_unit.is_date_unit() {
        (rounded_whole_days, rounded - rounded_whole_days * NS_PER_DAY)
    } else {
        (0, rounded)
    };
    let days = i64::try_from(days).map_err(|_| TemporalError::range("day count is out of range"))?;
    Ok(Nudged {
        duration: InternalDuration {
            date: duration.date.with_days(days),
            time_ns,
        },
        epoch_ns: dest_ns + (rounded - total),
        did_expand,
    })
}

/// Carry a rounded duration up through weeks, months and years while the
/// rounded endpoint has reached the next boundary of each.
fn bubble_relative_duration(
    sign: i64,
    duration: InternalDuration,
    nudged_ns: i128,
    anchor: &Anchor<'_>,
    largest_unit: Unit,
    smallest_unit: Unit,
) -> TemporalResult<InternalDuration> {
    let mut result = duration;
    for unit in [Unit::Week, Unit::Month, Unit::Year] {
        if unit <= smallest_unit || unit > largest_unit {
            continue;
        }
        if unit == Unit::Week && largest_unit != Unit::Week {
            continue;
        }
        let d = result.date;
        let end = match unit {
            Unit::Year => DateDuration::new_unchecked(d.years + sign, 0, 0, 0),
            Unit::Month => DateDuration::new_unchecked(d.years, d.months + sign, 0, 0),
            _ => DateDuration::new_unchecked(d.years, d.months, d.weeks + sign, 0),
        };
        let end_ns = anchor.nanoseconds_after(&end)?;
        let beyond = nudged_ns - end_ns;
        if beyond.signum() as i64 == -sign {
            break;
        }
        result = InternalDuration { date: end, time_ns: 0 };
    }
    Ok(result)
}

/// Round a difference already measured from `anchor` to `dest_ns`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn round_relative_duration(
    duration: InternalDuration,
    dest_ns: i128,
    anchor: &Anchor<'_>,
    largest_unit: Unit,
    smallest_unit: Unit,
    increment: u64,
    mode: RoundingMode,
) -> TemporalResult<InternalDuration> {
    let sign = if duration.sign() < 0 { -1 } else { 1 };
    let irregular = smallest_unit.is_calendar_unit() || (anchor.is_zoned() && smallest_unit == Unit::Day);
    let nudged = if irregular {
        nudge_to_calendar_unit(sign, &duration, dest_ns, anchor, increment, smallest_unit, mode)?.0
    } else if anchor.is_zoned() {
        let (duration, epoch_ns, did_expand) =
            adjust_rounded_duration_days(sign, &duration, anchor, increment, smallest_unit, mode)?;
        Nudged {
            duration,
            epoch_ns,
            did_expand,
        }
    } else {
        nudge_to_day_or_time(&duration, dest_ns, largest_unit, increment, smallest_unit, mode)?
    };
    if nudged.did_expand && smallest_unit != Unit::Week {
        return bubble_relative_duration(
            sign,
            nudged.duration,
            nudged.epoch_ns,
            anchor,
            largest_unit,
            smallest_unit.max(Unit::Day),
        );
    }
    Ok(nudged.duration)
}

/// Exact `numerator / denominator` as the nearest double we can manage.
pub(crate) fn ratio_to_f64(numerator: &BigInt, denominator: &BigInt) -> f64 {
    let (whole, rest) = numerator.div_rem(denominator);
    let whole = whole.to_f64().unwrap_or(f64::NAN);
    let rest = rest.to_f64().unwrap_or(0.0) / denominator.to_f64().unwrap_or(f64::NAN);
    whole + rest
}

/// The duration measured from `anchor` to `dest_ns`, as a count of `unit`.
pub(crate) fn total_relative_duration(
    duration: &InternalDuration,
    dest_ns: i128,
    anchor: &Anchor<'_>,
    unit: Unit,
) -> TemporalResult<f64> {
    if unit.is_calendar_unit() || (anchor.is_zoned() && unit == Unit::Day) {
        let sign = if duration.sign() < 0 { -1 } else { 1 };
        let (_, numerator, denominator) =
            nudge_to_calendar_unit(sign, duration, dest_ns, anchor, 1, unit, RoundingMode::Trunc)?;
        return Ok(ratio_to_f64(&numerator, &denominator));
    }
    let total = duration.date.days as i128 * NS_PER_DAY + duration.time_ns;
    Ok(ratio_to_f64(
        &BigInt::from(total),
        &BigInt::from(unit.nanoseconds().unwrap_or(1)),
    ))
}

fn plain_start(date: &PlainDate) -> TemporalResult<IsoDateTime> {
    IsoDateTime::new(date.iso(), IsoTime::MIDNIGHT)
}

pub(crate) fn add_durations(
    relative_to: &RelativeTo,
    one: &Duration,
    two: &Duration,
    largest_unit: Unit,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<Duration> {
    let one = InternalDuration::from_duration(one);
    let two = InternalDuration::from_duration(two);
    match relative_to {
        RelativeTo::PlainDate(date) => {
            let start = plain_start(date)?;
            let middle = add_date_time(&start, &one, Overflow::Constrain)?;
            let end = add_date_time(&middle, &two, Overflow::Constrain)?;
            difference_iso_date_time(&start, &end, largest_unit)?.to_duration(largest_unit)
        }
        RelativeTo::ZonedDateTime(zoned) => {
            let tz = zoned.time_zone();
            let start = zoned.epoch_ns();
            let middle = add_zoned(start, tz, &one, Overflow::Constrain, provider)?;
            let end = add_zoned(middle, tz, &two, Overflow::Constrain, provider)?;
            difference_zoned(start, end, tz, largest_unit, provider)?.to_duration(largest_unit)
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn round_duration(
    relative_to: &RelativeTo,
    duration: &Duration,
    largest_unit: Unit,
    smallest_unit: Unit,
    increment: u64,
    mode: RoundingMode,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<Duration> {
    let internal = InternalDuration::from_duration(duration);
    let noop = smallest_unit == Unit::Nanosecond && increment == 1;
    match relative_to {
        RelativeTo::PlainDate(date) => {
            let start = plain_start(date)?;
            let target = add_date_time(&start, &internal, Overflow::Constrain)?;
            let mut difference = difference_iso_date_time(&start, &target, largest_unit)?;
            if !noop {
                difference = round_relative_duration(
                    difference,
                    target.to_local_nanoseconds(),
                    &Anchor::Plain(start),
                    largest_unit,
                    smallest_unit,
                    increment,
                    mode,
                )?;
            }
            difference.to_duration(largest_unit)
        }
        RelativeTo::ZonedDateTime(zoned) => {
            let tz = zoned.time_zone();
            let start = zoned.epoch_ns();
            let target = add_zoned(start, tz, &internal, Overflow::Constrain, provider)?;
            if largest_unit.is_time_unit() {
                let unit_ns = smallest_unit.nanoseconds().unwrap_or(1);
                let rounded = round_i128_to_increment(target - start, unit_ns * increment as i128, mode);
                return balance_time_duration(rounded, largest_unit);
            }
            let mut difference = difference_zoned(start, target, tz, largest_unit, provider)?;
            if !noop {
                let anchor = Anchor::Zoned {
                    date_time: tz.date_time_for(start, provider)?,
                    time_zone: tz,
                    provider,
                };
                difference = round_relative_duration(
                    difference,
                    target,
                    &anchor,
                    largest_unit,
                    smallest_unit,
                    increment,
                    mode,
                )?;
            }
            difference.to_duration(largest_unit)
        }
    }
}

pub(crate) fn total_duration(
    relative_to: &RelativeTo,
    duration: &Duration,
    unit: Unit,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<f64> {
    let internal = InternalDuration::from_duration(duration);
    match relative_to {
        RelativeTo::PlainDate(date) => {
            let start = plain_start(date)?;
            let target = add_date_time(&start, &internal, Overflow::Constrain)?;
            let difference = difference_iso_date_time(&start, &target, unit)?;
            total_relative_duration(&difference, target.to_local_nanoseconds(), &Anchor::Plain(start), unit)
        }
        RelativeTo::ZonedDateTime(zoned) => {
            let tz = zoned.time_zone();
            let start = zoned.epoch_ns();
            let target = add_zoned(start, tz, &internal, Overflow::Constrain, provider)?;
            if unit.is_time_unit() {
                return Ok(ratio_to_f64(
                    &BigInt::from(target - start),
                    &BigInt::from(unit.nanoseconds().unwrap_or(1)),
                ));
            }
            let difference = difference_zoned(start, target, tz, unit, provider)?;
            let anchor = Anchor::Zoned {
                date_time: tz.date_time_for(start, provider)?,
                time_zone: tz,
                provider,
            };
            total_relative_duration(&difference, target, &anchor, unit)
        }
    }
}

pub(crate) fn compare_durations(
    relative_to: &RelativeTo,
    one: &Duration,
    two: &Duration,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<Ordering> {
    match relative_to {
        RelativeTo::ZonedDateTime(zoned) => {
            let tz = zoned.time_zone();
            let start = zoned.epoch_ns();
            let a = add_zoned(start, tz, &InternalDuration::from_duration(one), Overflow::Constrain, provider)?;
            let b = add_zoned(start, tz, &InternalDuration::from_duration(two), Overflow::Constrain, provider)?;
            Ok(a.cmp(&b))
        }
        RelativeTo::PlainDate(date) => {
            let as_days = |d: &Duration| -> TemporalResult<i128> {
                let calendar = DateDuration::new_unchecked(d.years(), d.months(), d.weeks(), 0);
                let moved = add_date_duration(date.iso(), &calendar, Overflow::Constrain)?;
                let days = moved.to_epoch_days() - date.iso().to_epoch_days() + d.days();
                Ok(days as i128 * NS_PER_DAY + d.time_nanoseconds())
            };
            Ok(as_days(one)?.cmp(&as_days(two)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RoundingOptions;

    const P: ChronoTzProvider = ChronoTzProvider;

    fn dur(s: &str) -> Duration {
        s.parse().unwrap()
    }

    fn rel(s: &str) -> RelativeTo {
        s.parse().unwrap()
    }

    fn largest(unit: Unit) -> RoundingOptions {
        RoundingOptions {
            largest_unit: Some(unit),
            ..Default::default()
        }
    }

    #[test]
    fn relative_to_parsing() {
        assert!(matches!(rel("2019-01-01"), RelativeTo::PlainDate(_)));
        assert!(matches!(
            rel("2020-03-08T00:00-08:00[America/Los_Angeles]"),
            RelativeTo::ZonedDateTime(_)
        ));
        assert!(RelativeTo::from_string("2019-01-01T00:00Z", &P).is_err());
    }

    #[test]
    fn years_depend_on_the_starting_year() {
        let d = dur("P370D");
        let r = d.round(&largest(Unit::Year), Some(&rel("2019-01-01"))).unwrap();
        assert_eq!(r.to_string(), "P1Y5D");
        let r = d.round(&largest(Unit::Year), Some(&rel("2020-01-01"))).unwrap();
        assert_eq!(r.to_string(), "P1Y4D");
    }

    #[test]
    fn zoned_days_follow_the_wall_clock() {
        let d = dur("PT48H");
        let zoned = rel("2020-03-08T00:00-08:00[America/Los_Angeles]");
        let r = d.round(&largest(Unit::Day), Some(&zoned)).unwrap();
        assert_eq!(r.to_string(), "P2DT1H");
        assert_eq!(d.round(&largest(Unit::Day), None).unwrap().to_string(), "P2D");
    }

    #[test]
    fn rounding_to_months_bubbles_into_years() {
        let d = dur("P11M20D");
        let opts = RoundingOptions {
            largest_unit: Some(Unit::Year),
            smallest_unit: Some(Unit::Month),
            ..Default::default()
        };
        let r = d.round(&opts, Some(&rel("2021-01-01"))).unwrap();
        assert_eq!(r.to_string(), "P1Y");
        let opts = RoundingOptions {
            smallest_unit: Some(Unit::Month),
            rounding_mode: Some(RoundingMode::Trunc),
            ..Default::default()
        };
        let r = d.round(&opts, Some(&rel("2021-01-01"))).unwrap();
        assert_eq!(r.to_string(), "P11M");
    }

    #[test]
    fn rounding_days_into_weeks() {
        let opts = RoundingOptions {
            largest_unit: Some(Unit::Week),
            smallest_unit: Some(Unit::Day),
            ..Default::default()
        };
        let r = dur("P20DT13H").round(&opts, Some(&rel("2021-01-01"))).unwrap();
        assert_eq!(r.to_string(), "P3W");
        let opts = RoundingOptions {
            smallest_unit: Some(Unit::Week),
            ..Default::default()
        };
        let r = dur("P10D").round(&opts, Some(&rel("2021-01-01"))).unwrap();
        assert_eq!(r.to_string(), "P1W");
    }

    #[test]
    fn totals_with_relative_to() {
        let jan = rel("2021-01-01");
        assert_eq!(dur("P1M").total(Unit::Day, Some(&jan)).unwrap(), 31.0);
        let months = dur("P45D").total(Unit::Month, Some(&rel("2021-02-01"))).unwrap();
        assert!((months - 48.0 / 31.0).abs() < 1e-12);
        let zoned = rel("2020-03-08T00:00-08:00[America/Los_Angeles]");
        assert_eq!(dur("P1D").total(Unit::Hour, Some(&zoned)).unwrap(), 23.0);
        assert_eq!(dur("PT23H").total(Unit::Day, Some(&zoned)).unwrap(), 1.0);
    }

    #[test]
    fn add_and_compare_with_relative_to() {
        let jan31 = rel("2021-01-31");
        let sum = dur("P1M").add(&dur("P1D"), Some(&jan31)).unwrap();
        assert_eq!(sum.to_string(), "P1M1D");
        let feb = rel("2021-02-01");
        assert_eq!(
            Duration::compare(&dur("P1M"), &dur("P29D"), Some(&feb)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Duration::compare(&dur("P1M"), &dur("P28D"), Some(&feb)).unwrap(),
            Ordering::Equal
        );
        let zoned = rel("2020-03-08T00:00-08:00[America/Los_Angeles]");
        assert_eq!(
            Duration::compare(&dur("P1D"), &dur("PT24H"), Some(&zoned)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn zoned_day_splitting() {
        let tz = TimeZone::from_identifier("America/Los_Angeles", &P).unwrap();
        let start = match rel("2020-03-08T00:00-08:00[America/Los_Angeles]") {
            RelativeTo::ZonedDateTime(z) => z.epoch_ns(),
            RelativeTo::PlainDate(_) => unreachable!(),
        };
        let hour = 3_600_000_000_000;
        let (days, rest, length) = nanoseconds_to_days(23 * hour, start, &tz, &P).unwrap();
        assert_eq!((days, rest, length), (1, 0, 24 * hour));
        let (days, rest, length) = nanoseconds_to_days(22 * hour, start, &tz, &P).unwrap();
        assert_eq!((days, rest, length), (0, 22 * hour, 23 * hour));
    }

    #[test]
    fn date_time_difference_borrows_a_day() {
        let a = IsoDateTime::new(
            crate::iso::IsoDate::new(2021, 1, 1).unwrap(),
            IsoTime::new(10, 0, 0, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let b = IsoDateTime::new(
            crate::iso::IsoDate::new(2021, 1, 3).unwrap(),
            IsoTime::new(8, 0, 0, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let d = difference_iso_date_time(&a, &b, Unit::Day).unwrap();
        assert_eq!(d.date.days, 1);
        assert_eq!(d.time_ns, 22 * 3_600_000_000_000);
        let d = difference_iso_date_time(&a, &b, Unit::Hour).unwrap();
        assert_eq!(d.time_ns, 46 * 3_600_000_000_000);
    }
}
