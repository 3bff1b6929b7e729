//! Plain ISO field records shared by the value types.

use crate::calendar::{self, epoch_days_to_iso_date, iso_date_to_epoch_days};
use crate::error::{TemporalError, TemporalResult};
use crate::options::{NS_PER_DAY, NS_PER_HOUR, NS_PER_MIN, NS_PER_MS, NS_PER_SEC, NS_PER_US};

/// Largest representable instant, in nanoseconds from the epoch (10^8 days).
pub const NS_MAX_INSTANT: i128 = 8_640_000_000_000_000_000_000;
pub const NS_MIN_INSTANT: i128 = -NS_MAX_INSTANT;

pub const MIN_YEAR: i32 = -271821;
pub const MAX_YEAR: i32 = 275760;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl IsoDate {
    /// Build a date, rejecting invalid fields and dates outside the
    /// representable range.
    pub fn new(year: i32, month: u8, day: u8) -> TemporalResult<Self> {
        if !calendar::is_valid_date(year, month, day) {
            return Err(TemporalError::range(format!(
                "{year}-{month:02}-{day:02} is not a valid ISO date"
            )));
        }
        let date = Self { year, month, day };
        date.check_within_limits()?;
        Ok(date)
    }

    pub(crate) const fn new_unchecked(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn to_epoch_days(self) -> i64 {
        iso_date_to_epoch_days(self.year, self.month, self.day)
    }

    pub fn from_epoch_days(epoch_days: i64) -> Self {
        let (year, month, day) = epoch_days_to_iso_date(epoch_days);
        Self { year, month, day }
    }

    /// A date is representable when its noon is.
    pub fn within_limits(self) -> bool {
        IsoDateTime::new_unchecked(self, IsoTime::NOON).within_limits()
    }

    pub(crate) fn check_within_limits(self) -> TemporalResult<()> {
        if self.within_limits() {
            Ok(())
        } else {
            Err(TemporalError::range("date is outside the representable range"))
        }
    }

    pub fn days_in_month(self) -> u8 {
        calendar::days_in_month(self.year, self.month)
    }

    pub fn day_of_week(self) -> u8 {
        calendar::day_of_week(self.year, self.month, self.day)
    }

    pub fn day_of_year(self) -> u16 {
        calendar::day_of_year(self.year, self.month, self.day)
    }

    pub fn week_of_year(self) -> (u8, i32) {
        calendar::week_of_year(self.year, self.month, self.day)
    }
}

pub fn year_month_within_limits(year: i32, month: u8) -> bool {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return false;
    }
    !(year == MIN_YEAR && month < 4 || year == MAX_YEAR && month > 9)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IsoTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
    pub nanosecond: u16,
}

impl IsoTime {
    pub const MIDNIGHT: IsoTime = IsoTime {
        hour: 0,
        minute: 0,
        second: 0,
        millisecond: 0,
        microsecond: 0,
        nanosecond: 0,
    };

    pub const NOON: IsoTime = IsoTime {
        hour: 12,
        ..IsoTime::MIDNIGHT
    };

    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
    ) -> TemporalResult<Self> {
        let time = Self {
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
        };
        if !time.is_valid() {
            return Err(TemporalError::range("time fields out of range"));
        }
        Ok(time)
    }

    pub fn is_valid(&self) -> bool {
        self.hour < 24
            && self.minute < 60
            && self.second < 60
            && self.millisecond < 1000
            && self.microsecond < 1000
            && self.nanosecond < 1000
    }

    /// Nanoseconds since midnight.
    pub fn to_nanoseconds(&self) -> i128 {
        self.hour as i128 * NS_PER_HOUR
            + self.minute as i128 * NS_PER_MIN
            + self.second as i128 * NS_PER_SEC
            + self.millisecond as i128 * NS_PER_MS
            + self.microsecond as i128 * NS_PER_US
            + self.nanosecond as i128
    }

    /// Inverse of [`IsoTime::to_nanoseconds`]; `ns` must lie within one day.
    pub(crate) fn from_nanoseconds(ns: i128) -> Self {
        debug_assert!((0..NS_PER_DAY).contains(&ns));
        Self {
            hour: (ns / NS_PER_HOUR) as u8,
            minute: (ns / NS_PER_MIN % 60) as u8,
            second: (ns / NS_PER_SEC % 60) as u8,
            millisecond: (ns / NS_PER_MS % 1000) as u16,
            microsecond: (ns / NS_PER_US % 1000) as u16,
            nanosecond: (ns % 1000) as u16,
        }
    }

    pub fn subsecond_nanoseconds(&self) -> u32 {
        self.millisecond as u32 * 1_000_000 + self.microsecond as u32 * 1_000 + self.nanosecond as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDateTime {
    pub date: IsoDate,
    pub time: IsoTime,
}

impl IsoDateTime {
    pub fn new(date: IsoDate, time: IsoTime) -> TemporalResult<Self> {
        let dt = Self { date, time };
        if !dt.within_limits() {
            return Err(TemporalError::range("date-time is outside the representable range"));
        }
        Ok(dt)
    }

    pub(crate) const fn new_unchecked(date: IsoDate, time: IsoTime) -> Self {
        Self { date, time }
    }

    /// The wall-clock value read as if it were UTC, in epoch nanoseconds.
    pub fn to_local_nanoseconds(&self) -> i128 {
        self.date.to_epoch_days() as i128 * NS_PER_DAY + self.time.to_nanoseconds()
    }

    pub(crate) fn from_local_nanoseconds(ns: i128) -> Self {
        let days = ns.div_euclid(NS_PER_DAY);
        Self {
            date: IsoDate::from_epoch_days(days as i64),
            time: IsoTime::from_nanoseconds(ns.rem_euclid(NS_PER_DAY)),
        }
    }

    /// Representable date-times lie strictly within one day of the instant
    /// range, so every one of them has an instant in some UTC offset.
    pub fn within_limits(&self) -> bool {
        let epoch_days = self.date.to_epoch_days();
        if epoch_days.abs() > 100_000_001 {
            return false;
        }
        let ns = self.to_local_nanoseconds();
        ns > NS_MIN_INSTANT - NS_PER_DAY && ns < NS_MAX_INSTANT + NS_PER_DAY
    }
}
