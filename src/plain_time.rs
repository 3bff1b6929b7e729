//! Wall-clock time of day with no date and no zone.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::balance::balance_nanoseconds;
use crate::calendar::Calendar;
use crate::duration::{Duration, balance_time_duration};
use crate::error::{TemporalError, TemporalResult};
use crate::format::format_iso_time;
use crate::iso::IsoTime;
use crate::options::{
    DifferenceOperation, DifferenceOptions, Overflow, RoundingOptions, ToStringOptions, Unit,
};
use crate::parser::parse_time_string;
use crate::regulate::PartialTime;
use crate::rounding::{round_i128_to_increment, round_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PlainTime {
    iso: IsoTime,
}

impl PlainTime {
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
    ) -> TemporalResult<Self> {
        IsoTime::new(hour, minute, second, millisecond, microsecond, nanosecond).map(Self::from_iso)
    }

    pub(crate) const fn from_iso(iso: IsoTime) -> Self {
        Self { iso }
    }

    /// Build from a field bag; absent fields are zero.
    pub fn from_partial(partial: &PartialTime, overflow: Overflow) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("a time needs at least one time field"));
        }
        partial.to_time(IsoTime::MIDNIGHT, overflow).map(Self::from_iso)
    }

    pub fn from_string(s: &str) -> TemporalResult<Self> {
        let parsed = parse_time_string(s)?;
        if let Some(calendar) = parsed.calendar.as_deref() {
            Calendar::from_string(calendar)?;
        }
        Ok(Self::from_iso(parsed.time))
    }

    pub fn iso(&self) -> IsoTime {
        self.iso
    }

    pub fn hour(&self) -> u8 {
        self.iso.hour
    }

    pub fn minute(&self) -> u8 {
        self.iso.minute
    }

    pub fn second(&self) -> u8 {
        self.iso.second
    }

    pub fn millisecond(&self) -> u16 {
        self.iso.millisecond
    }

    pub fn microsecond(&self) -> u16 {
        self.iso.microsecond
    }

    pub fn nanosecond(&self) -> u16 {
        self.iso.nanosecond
    }

    pub fn with(&self, partial: &PartialTime, overflow: Overflow) -> TemporalResult<Self> {
        if partial.is_empty() {
            return Err(TemporalError::type_error("with() needs at least one time field"));
        }
        partial.to_time(self.iso, overflow).map(Self::from_iso)
    }

    /// Wraps around midnight; whole days in the duration have no effect.
    pub fn add(&self, duration: &Duration) -> Self {
        let (_, iso) = balance_nanoseconds(self.iso.to_nanoseconds() + duration.time_nanoseconds());
        Self::from_iso(iso)
    }

    pub fn subtract(&self, duration: &Duration) -> Self {
        self.add(&duration.negated())
    }

    fn difference(
        &self,
        operation: DifferenceOperation,
        other: &PlainTime,
        options: &DifferenceOptions,
    ) -> TemporalResult<Duration> {
        let settings = options.resolve(operation, (Unit::Hour, Unit::Nanosecond), Unit::Hour, Unit::Nanosecond)?;
        let mut ns = other.iso.to_nanoseconds() - self.iso.to_nanoseconds();
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

    pub fn until(&self, other: &PlainTime, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Until, other, options)
    }

    pub fn since(&self, other: &PlainTime, options: &DifferenceOptions) -> TemporalResult<Duration> {
        self.difference(DifferenceOperation::Since, other, options)
    }

    /// Round within the day; rounding up past the last increment wraps to
    /// midnight.
    pub fn round(&self, options: &RoundingOptions) -> TemporalResult<Self> {
        let settings = options.resolve_for_point(false)?;
        let (_, iso) = round_time(self.iso, settings.smallest_unit, settings.increment, settings.mode, None);
        Ok(Self::from_iso(iso))
    }

    pub fn equals(&self, other: &PlainTime) -> bool {
        self == other
    }

    pub fn compare(one: &PlainTime, two: &PlainTime) -> Ordering {
        one.cmp(two)
    }

    pub fn to_string_with_options(&self, options: &ToStringOptions) -> TemporalResult<String> {
        let precision = options.seconds_precision()?;
        let (_, iso) = round_time(
            self.iso,
            precision.unit,
            precision.increment,
            options.rounding_mode(),
            None,
        );
        Ok(format_iso_time(iso, precision.precision))
    }
}

impl FromStr for PlainTime {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlainTime::from_string(s)
    }
}

impl fmt::Display for PlainTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_iso_time(self.iso, crate::options::Precision::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Precision, RoundingMode};
    use proptest::prelude::*;

    fn time(s: &str) -> PlainTime {
        s.parse().unwrap()
    }

    #[test]
    fn construction_and_fields() {
        let t = PlainTime::new(10, 25, 5, 500, 400, 760).unwrap();
        assert_eq!(t.to_string(), "10:25:05.50040076");
        assert!(PlainTime::new(24, 0, 0, 0, 0, 0).unwrap_err().is_range());

        let parsed = time("11:12:13.123456789");
        assert_eq!(
            (
                parsed.hour(),
                parsed.minute(),
                parsed.second(),
                parsed.millisecond(),
                parsed.microsecond(),
                parsed.nanosecond()
            ),
            (11, 12, 13, 123, 456, 789)
        );
        assert_eq!(time("T1530").to_string(), "15:30:00");
        assert_eq!(time("2021-04-22T23:59:60").to_string(), "23:59:59");
        assert!(PlainTime::from_string("12:00[u-ca=hebrew]").is_err());
        assert!(PlainTime::from_string("2021-04-22T12:00Z").is_err());
    }

    #[test]
    fn field_bags() {
        let partial = PartialTime {
            hour: Some(25),
            minute: Some(30),
            ..Default::default()
        };
        assert_eq!(PlainTime::from_partial(&partial, Overflow::Constrain).unwrap().to_string(), "23:30:00");
        assert!(PlainTime::from_partial(&partial, Overflow::Reject).unwrap_err().is_range());
        assert!(PlainTime::from_partial(&PartialTime::default(), Overflow::Constrain).unwrap_err().is_type());

        let t = time("10:25:05");
        let later = t
            .with(
                &PartialTime {
                    second: Some(0),
                    ..Default::default()
                },
                Overflow::Reject,
            )
            .unwrap();
        assert_eq!(later.to_string(), "10:25:00");
        assert!(t.with(&PartialTime::default(), Overflow::Constrain).unwrap_err().is_type());
    }

    #[test]
    fn arithmetic_wraps_and_ignores_days() {
        let t = time("23:00");
        assert_eq!(t.add(&"PT2H".parse().unwrap()).to_string(), "01:00:00");
        assert_eq!(t.add(&"P3DT1M".parse().unwrap()).to_string(), "23:01:00");
        assert_eq!(time("00:30").subtract(&"PT1H".parse().unwrap()).to_string(), "23:30:00");
    }

    #[test]
    fn differences() {
        let one = time("01:02:03.45");
        let two = time("02:00");
        let ms_floor = DifferenceOptions {
            smallest_unit: Some(Unit::Millisecond),
            rounding_mode: Some(RoundingMode::Floor),
            ..Default::default()
        };
        assert_eq!(one.until(&two, &ms_floor).unwrap().to_string(), "PT57M56.55S");
        assert_eq!(two.until(&one, &ms_floor).unwrap().to_string(), "-PT57M56.55S");
        assert_eq!(two.since(&one, &ms_floor).unwrap().to_string(), "PT57M56.55S");

        let minutes = DifferenceOptions {
            largest_unit: Some(Unit::Minute),
            smallest_unit: Some(Unit::Minute),
            rounding_increment: Some(15),
            rounding_mode: Some(RoundingMode::HalfExpand),
        };
        assert_eq!(one.until(&two, &minutes).unwrap().to_string(), "PT60M");
        let days = DifferenceOptions {
            largest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert!(one.until(&two, &days).unwrap_err().is_range());
    }

    #[test]
    fn rounding() {
        let t = time("13:46:23.123456789");
        assert_eq!(t.round(&RoundingOptions::with_smallest_unit(Unit::Hour)).unwrap().to_string(), "14:00:00");
        let quarter = RoundingOptions {
            smallest_unit: Some(Unit::Minute),
            rounding_increment: Some(15),
            rounding_mode: Some(RoundingMode::Floor),
            ..Default::default()
        };
        assert_eq!(t.round(&quarter).unwrap().to_string(), "13:45:00");
        let uneven = RoundingOptions {
            rounding_increment: Some(7),
            ..quarter
        };
        assert!(t.round(&uneven).unwrap_err().is_range());
        assert!(t.round(&RoundingOptions::with_smallest_unit(Unit::Day)).is_err());
        assert!(t.round(&RoundingOptions::default()).is_err());
        assert_eq!(
            time("23:59:59.9").round(&RoundingOptions::with_smallest_unit(Unit::Second)).unwrap(),
            PlainTime::default()
        );
    }

    #[test]
    fn to_string_options() {
        let t = PlainTime::new(10, 25, 5, 500, 400, 760).unwrap();
        let minute = ToStringOptions {
            smallest_unit: Some(Unit::Minute),
            ..Default::default()
        };
        assert_eq!(t.to_string_with_options(&minute).unwrap(), "10:25");
        let four = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(4)),
            ..Default::default()
        };
        assert_eq!(t.to_string_with_options(&four).unwrap(), "10:25:05.5004");
        let rounded_seconds = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(0)),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(t.to_string_with_options(&rounded_seconds).unwrap(), "10:25:06");
        let hour = ToStringOptions {
            smallest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        assert!(t.to_string_with_options(&hour).is_err());
    }

    #[test]
    fn ordering() {
        assert_eq!(PlainTime::compare(&time("09:00"), &time("10:00")), Ordering::Less);
        assert!(time("10:00:00.000000001") > time("10:00"));
        assert!(time("12:00").equals(&time("T12:00:00")));
    }

    proptest! {
        #[test]
        fn string_round_trip(ns in 0i128..86_400_000_000_000) {
            let (_, iso) = balance_nanoseconds(ns);
            let t = PlainTime::from_iso(iso);
            prop_assert_eq!(t.to_string().parse::<PlainTime>().unwrap(), t);
        }
    }
}
