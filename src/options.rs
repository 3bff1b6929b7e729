//! Per-call option records: units, rounding modes, overflow and
//! disambiguation policies, and the string-output switches.
//!
//! Every enumeration parses from its ECMAScript option spelling through
//! `FromStr`, failing with a RangeError-kind error on unknown values.

use std::fmt;
use std::str::FromStr;

use crate::error::{TemporalError, TemporalResult};

macro_rules! option_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = TemporalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(TemporalError::range(format!("{s} is not a valid value for {}", $what))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) const NS_PER_US: i128 = 1_000;
pub(crate) const NS_PER_MS: i128 = 1_000_000;
pub(crate) const NS_PER_SEC: i128 = 1_000_000_000;
pub(crate) const NS_PER_MIN: i128 = 60 * NS_PER_SEC;
pub(crate) const NS_PER_HOUR: i128 = 60 * NS_PER_MIN;
pub(crate) const NS_PER_DAY: i128 = 24 * NS_PER_HOUR;

/// Temporal units, ordered so that `Unit::Year > Unit::Nanosecond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    Nanosecond = 1,
    Microsecond = 2,
    Millisecond = 3,
    Second = 4,
    Minute = 5,
    Hour = 6,
    Day = 7,
    Week = 8,
    Month = 9,
    Year = 10,
}

const UNIT_NAMES: [(Unit, &str, &str); 10] = [
    (Unit::Year, "year", "years"),
    (Unit::Month, "month", "months"),
    (Unit::Week, "week", "weeks"),
    (Unit::Day, "day", "days"),
    (Unit::Hour, "hour", "hours"),
    (Unit::Minute, "minute", "minutes"),
    (Unit::Second, "second", "seconds"),
    (Unit::Millisecond, "millisecond", "milliseconds"),
    (Unit::Microsecond, "microsecond", "microseconds"),
    (Unit::Nanosecond, "nanosecond", "nanoseconds"),
];

impl Unit {
    pub fn as_str(self) -> &'static str {
        UNIT_NAMES[self.table_index()].1
    }

    pub fn plural(self) -> &'static str {
        UNIT_NAMES[self.table_index()].2
    }

    fn table_index(self) -> usize {
        10 - self as usize
    }

    /// Year, month and week: units whose length depends on a calendar anchor.
    pub fn is_calendar_unit(self) -> bool {
        self > Unit::Day
    }

    pub fn is_date_unit(self) -> bool {
        self >= Unit::Day
    }

    pub fn is_time_unit(self) -> bool {
        self < Unit::Day
    }

    /// Fixed length in nanoseconds, with a nominal 24-hour day.
    pub fn nanoseconds(self) -> Option<i128> {
        match self {
            Unit::Day => Some(NS_PER_DAY),
            Unit::Hour => Some(NS_PER_HOUR),
            Unit::Minute => Some(NS_PER_MIN),
            Unit::Second => Some(NS_PER_SEC),
            Unit::Millisecond => Some(NS_PER_MS),
            Unit::Microsecond => Some(NS_PER_US),
            Unit::Nanosecond => Some(1),
            _ => None,
        }
    }

    /// Exclusive upper bound for rounding increments of a time unit.
    pub fn max_rounding_increment(self) -> Option<u64> {
        match self {
            Unit::Hour => Some(24),
            Unit::Minute | Unit::Second => Some(60),
            Unit::Millisecond | Unit::Microsecond | Unit::Nanosecond => Some(1000),
            _ => None,
        }
    }
}

impl FromStr for Unit {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UNIT_NAMES
            .iter()
            .find(|(_, singular, plural)| *singular == s || *plural == s)
            .map(|(unit, _, _)| *unit)
            .ok_or_else(|| TemporalError::range(format!("{s} is not a valid unit")))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

option_enum!(
    #[doc = "How a quantity is rounded to an increment."]
    RoundingMode, "roundingMode" {
        Ceil => "ceil",
        Floor => "floor",
        Expand => "expand",
        Trunc => "trunc",
        HalfCeil => "halfCeil",
        HalfFloor => "halfFloor",
        HalfExpand => "halfExpand",
        HalfTrunc => "halfTrunc",
        HalfEven => "halfEven",
    }
);

impl RoundingMode {
    /// Mirror the mode for a negated quantity (used by `since`).
    pub fn negate(self) -> Self {
        match self {
            RoundingMode::Ceil => RoundingMode::Floor,
            RoundingMode::Floor => RoundingMode::Ceil,
            RoundingMode::HalfCeil => RoundingMode::HalfFloor,
            RoundingMode::HalfFloor => RoundingMode::HalfCeil,
            other => other,
        }
    }

    /// The equivalent mode when rounding ignores the sign of the value, as
    /// it does for points on the time line.
    pub fn unsigned(self) -> Self {
        match self {
            RoundingMode::Trunc => RoundingMode::Floor,
            RoundingMode::Expand => RoundingMode::Ceil,
            RoundingMode::HalfTrunc => RoundingMode::HalfFloor,
            RoundingMode::HalfExpand => RoundingMode::HalfCeil,
            other => other,
        }
    }
}

option_enum!(
    #[doc = "Field overflow policy."]
    Overflow, "overflow" {
        Constrain => "constrain",
        Reject => "reject",
    }
);

option_enum!(
    #[doc = "Choice among zero or two candidate instants for a local time."]
    Disambiguation, "disambiguation" {
        Compatible => "compatible",
        Earlier => "earlier",
        Later => "later",
        Reject => "reject",
    }
);

option_enum!(
    #[doc = "Treatment of an explicit UTC offset supplied alongside a named zone."]
    OffsetOption, "offset" {
        Use => "use",
        Ignore => "ignore",
        Prefer => "prefer",
        Reject => "reject",
    }
);

option_enum!(
    ShowCalendar, "calendarName" {
        Auto => "auto",
        Always => "always",
        Never => "never",
        Critical => "critical",
    }
);

option_enum!(
    ShowTimeZone, "timeZoneName" {
        Auto => "auto",
        Never => "never",
        Critical => "critical",
    }
);

option_enum!(
    ShowOffset, "offset" {
        Auto => "auto",
        Never => "never",
    }
);

impl Default for RoundingMode {
    fn default() -> Self {
        RoundingMode::HalfExpand
    }
}

impl Default for Overflow {
    fn default() -> Self {
        Overflow::Constrain
    }
}

impl Default for Disambiguation {
    fn default() -> Self {
        Disambiguation::Compatible
    }
}

impl Default for ShowCalendar {
    fn default() -> Self {
        ShowCalendar::Auto
    }
}

impl Default for ShowTimeZone {
    fn default() -> Self {
        ShowTimeZone::Auto
    }
}

impl Default for ShowOffset {
    fn default() -> Self {
        ShowOffset::Auto
    }
}

/// Number of fractional-second digits to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Print as many digits as needed, dropping trailing zeros.
    #[default]
    Auto,
    /// Stop at minutes; seconds are not printed.
    Minute,
    Digits(u8),
}

impl FromStr for Precision {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            return Ok(Precision::Auto);
        }
        match s.parse::<u8>() {
            Ok(d) if d <= 9 => Ok(Precision::Digits(d)),
            _ => Err(TemporalError::range(format!(
                "{s} is not a valid value for fractionalSecondDigits"
            ))),
        }
    }
}

/// Resolved output of `toSecondsStringPrecision`: the printed precision plus
/// the unit and increment that rounding must use to honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondsPrecision {
    pub precision: Precision,
    pub unit: Unit,
    pub increment: u64,
}

/// Options accepted by the `to_string` family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToStringOptions {
    pub fractional_second_digits: Option<Precision>,
    pub smallest_unit: Option<Unit>,
    pub rounding_mode: Option<RoundingMode>,
    pub calendar_name: ShowCalendar,
    pub time_zone_name: ShowTimeZone,
    pub offset: ShowOffset,
}

impl ToStringOptions {
    pub fn rounding_mode(&self) -> RoundingMode {
        self.rounding_mode.unwrap_or(RoundingMode::Trunc)
    }

    /// `smallestUnit` wins over `fractionalSecondDigits`.
    pub fn seconds_precision(&self) -> TemporalResult<SecondsPrecision> {
        if let Some(unit) = self.smallest_unit {
            return match unit {
                Unit::Minute => Ok(SecondsPrecision {
                    precision: Precision::Minute,
                    unit: Unit::Minute,
                    increment: 1,
                }),
                Unit::Second => Ok(digits_precision(0)),
                Unit::Millisecond => Ok(digits_precision(3)),
                Unit::Microsecond => Ok(digits_precision(6)),
                Unit::Nanosecond => Ok(digits_precision(9)),
                other => Err(TemporalError::range(format!(
                    "smallestUnit {other} is not allowed when formatting"
                ))),
            };
        }
        match self.fractional_second_digits.unwrap_or(Precision::Auto) {
            Precision::Auto => Ok(SecondsPrecision {
                precision: Precision::Auto,
                unit: Unit::Nanosecond,
                increment: 1,
            }),
            Precision::Minute => Err(TemporalError::range(
                "fractionalSecondDigits cannot select minute precision",
            )),
            Precision::Digits(d) if d <= 9 => Ok(digits_precision(d)),
            Precision::Digits(d) => Err(TemporalError::range(format!(
                "fractionalSecondDigits {d} is out of range"
            ))),
        }
    }
}

fn digits_precision(digits: u8) -> SecondsPrecision {
    let (unit, unit_digits) = match digits {
        0 => (Unit::Second, 0),
        1..=3 => (Unit::Millisecond, 3),
        4..=6 => (Unit::Microsecond, 6),
        _ => (Unit::Nanosecond, 9),
    };
    SecondsPrecision {
        precision: Precision::Digits(digits),
        unit,
        increment: 10u64.pow(unit_digits - digits as u32),
    }
}

/// Check an increment against its dividend: the increment must divide the
/// dividend evenly and stay below it (or equal it when `inclusive`).
pub(crate) fn validate_rounding_increment(
    increment: u64,
    dividend: u64,
    inclusive: bool,
) -> TemporalResult<()> {
    if !(1..=1_000_000_000).contains(&increment) {
        return Err(TemporalError::range(format!(
            "roundingIncrement {increment} is out of range"
        )));
    }
    let maximum = if inclusive { dividend } else { dividend - 1 };
    if increment > maximum {
        return Err(TemporalError::range(format!(
            "roundingIncrement {increment} is out of range for a dividend of {dividend}"
        )));
    }
    if dividend % increment != 0 {
        return Err(TemporalError::range(format!(
            "roundingIncrement {increment} does not divide evenly into {dividend}"
        )));
    }
    Ok(())
}

/// Fully resolved rounding settings shared by `round`, `until` and `since`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRounding {
    pub largest_unit: Unit,
    pub smallest_unit: Unit,
    pub increment: u64,
    pub mode: RoundingMode,
}

impl ResolvedRounding {
    pub(crate) fn is_noop(&self) -> bool {
        self.smallest_unit == Unit::Nanosecond && self.increment == 1
    }
}

/// Whether a difference is computed as `until` or `since`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceOperation {
    Until,
    Since,
}

/// Options accepted by `until` / `since`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifferenceOptions {
    pub largest_unit: Option<Unit>,
    pub smallest_unit: Option<Unit>,
    pub rounding_increment: Option<u64>,
    pub rounding_mode: Option<RoundingMode>,
}

impl DifferenceOptions {
    /// Resolve against the units a value type can express.
    ///
    /// `allowed` is the inclusive (coarsest, finest) window of permitted units,
    /// `default_largest` the type's natural largest unit and
    /// `fallback_smallest` its natural smallest unit.
    pub(crate) fn resolve(
        &self,
        operation: DifferenceOperation,
        allowed: (Unit, Unit),
        default_largest: Unit,
        fallback_smallest: Unit,
    ) -> TemporalResult<ResolvedRounding> {
        let check = |unit: Unit| -> TemporalResult<Unit> {
            if unit > allowed.0 || unit < allowed.1 {
                Err(TemporalError::range(format!("{unit} is not allowed here")))
            } else {
                Ok(unit)
            }
        };
        let smallest_unit = check(self.smallest_unit.unwrap_or(fallback_smallest))?;
        let largest_unit = match self.largest_unit {
            Some(unit) => check(unit)?,
            None => default_largest.max(smallest_unit),
        };
        if largest_unit < smallest_unit {
            return Err(TemporalError::range(format!(
                "largestUnit {largest_unit} cannot be smaller than smallestUnit {smallest_unit}"
            )));
        }
        let increment = self.rounding_increment.unwrap_or(1);
        match smallest_unit.max_rounding_increment() {
            Some(max) => validate_rounding_increment(increment, max, false)?,
            None if !(1..=1_000_000_000).contains(&increment) => {
                return Err(TemporalError::range(format!(
                    "roundingIncrement {increment} is out of range"
                )));
            }
            None => {}
        }
        if increment > 1 && smallest_unit.is_calendar_unit() && largest_unit > smallest_unit {
            return Err(TemporalError::range(
                "a roundingIncrement above 1 needs largestUnit equal to a calendar smallestUnit",
            ));
        }
        let mut mode = self.rounding_mode.unwrap_or(RoundingMode::Trunc);
        if operation == DifferenceOperation::Since {
            mode = mode.negate();
        }
        Ok(ResolvedRounding {
            largest_unit,
            smallest_unit,
            increment,
            mode,
        })
    }
}

/// Options accepted by `round` on the value types and on durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundingOptions {
    pub largest_unit: Option<Unit>,
    pub smallest_unit: Option<Unit>,
    pub rounding_increment: Option<u64>,
    pub rounding_mode: Option<RoundingMode>,
}

impl RoundingOptions {
    pub fn with_smallest_unit(unit: Unit) -> Self {
        Self {
            smallest_unit: Some(unit),
            ..Self::default()
        }
    }

    pub fn increment(&self) -> u64 {
        self.rounding_increment.unwrap_or(1)
    }

    pub fn mode(&self) -> RoundingMode {
        self.rounding_mode.unwrap_or(RoundingMode::HalfExpand)
    }

    pub(crate) fn require_smallest_unit(&self) -> TemporalResult<Unit> {
        self.smallest_unit
            .ok_or_else(|| TemporalError::range("smallestUnit is required"))
    }

    /// Resolve for rounding a point in time (time, date-time, instant,
    /// zoned value). A smallest unit of `day` allows only an increment of 1.
    pub(crate) fn resolve_for_point(&self, allow_day: bool) -> TemporalResult<ResolvedRounding> {
        let smallest_unit = self.require_smallest_unit()?;
        if smallest_unit.is_calendar_unit() || (!allow_day && smallest_unit == Unit::Day) {
            return Err(TemporalError::range(format!(
                "{smallest_unit} is not a valid smallestUnit here"
            )));
        }
        let increment = self.increment();
        match smallest_unit.max_rounding_increment() {
            Some(max) => validate_rounding_increment(increment, max, false)?,
            None => validate_rounding_increment(increment, 1, true)?,
        }
        Ok(ResolvedRounding {
            largest_unit: smallest_unit,
            smallest_unit,
            increment,
            mode: self.mode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_parse_singular_and_plural() {
        assert_eq!("years".parse::<Unit>().unwrap(), Unit::Year);
        assert_eq!("microsecond".parse::<Unit>().unwrap(), Unit::Microsecond);
        assert!("fortnight".parse::<Unit>().is_err());
        assert!(Unit::Year > Unit::Month);
        assert!(Unit::Day > Unit::Hour);
        assert_eq!(Unit::Week.plural(), "weeks");
    }

    #[test]
    fn rounding_mode_negation() {
        assert_eq!(RoundingMode::Ceil.negate(), RoundingMode::Floor);
        assert_eq!(RoundingMode::HalfFloor.negate(), RoundingMode::HalfCeil);
        assert_eq!(RoundingMode::HalfEven.negate(), RoundingMode::HalfEven);
        assert!("nearest".parse::<RoundingMode>().is_err());
    }

    #[test]
    fn increment_validation() {
        assert!(validate_rounding_increment(15, 60, false).is_ok());
        assert!(validate_rounding_increment(7, 60, false).is_err());
        assert!(validate_rounding_increment(60, 60, false).is_err());
        assert!(validate_rounding_increment(1, 1, true).is_ok());
        assert!(validate_rounding_increment(0, 60, false).is_err());
    }

    #[test]
    fn seconds_precision_from_digits() {
        let opts = ToStringOptions {
            fractional_second_digits: Some(Precision::Digits(2)),
            ..Default::default()
        };
        let p = opts.seconds_precision().unwrap();
        assert_eq!(p.unit, Unit::Millisecond);
        assert_eq!(p.increment, 10);

        let opts = ToStringOptions {
            smallest_unit: Some(Unit::Minute),
            fractional_second_digits: Some(Precision::Digits(5)),
            ..Default::default()
        };
        assert_eq!(opts.seconds_precision().unwrap().precision, Precision::Minute);

        let opts = ToStringOptions {
            smallest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        assert!(opts.seconds_precision().is_err());
    }

    #[test]
    fn difference_options_defaults_and_errors() {
        let opts = DifferenceOptions::default();
        let r = opts
            .resolve(
                DifferenceOperation::Since,
                (Unit::Year, Unit::Nanosecond),
                Unit::Day,
                Unit::Nanosecond,
            )
            .unwrap();
        assert_eq!(r.largest_unit, Unit::Day);
        assert_eq!(r.mode, RoundingMode::Trunc);

        let opts = DifferenceOptions {
            largest_unit: Some(Unit::Minute),
            smallest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        let err = opts
            .resolve(
                DifferenceOperation::Until,
                (Unit::Year, Unit::Nanosecond),
                Unit::Day,
                Unit::Nanosecond,
            )
            .unwrap_err();
        assert!(err.is_range());

        let opts = DifferenceOptions {
            largest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        assert!(
            opts.resolve(
                DifferenceOperation::Until,
                (Unit::Year, Unit::Day),
                Unit::Day,
                Unit::Day
            )
            .is_err()
        );
    }
}
