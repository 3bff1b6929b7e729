//! Field regulation: turn raw, possibly out-of-range field tuples into valid
//! records under an overflow policy.

use crate::calendar::{days_in_month, is_valid_date, parse_month_code};
use crate::error::{TemporalError, TemporalResult};
use crate::iso::{IsoDate, IsoTime};
use crate::options::Overflow;

/// Reference year used to validate month-day pairs; a leap year.
pub(crate) const MONTH_DAY_REFERENCE_YEAR: i32 = 1972;

fn to_year(year: i64) -> TemporalResult<i32> {
    i32::try_from(year).map_err(|_| TemporalError::range(format!("year {year} is out of range")))
}

pub fn regulate_date(year: i64, month: i64, day: i64, overflow: Overflow) -> TemporalResult<IsoDate> {
    let year = to_year(year)?;
    match overflow {
        Overflow::Reject => {
            let valid = (1..=12).contains(&month)
                && (1..=31).contains(&day)
                && is_valid_date(year, month as u8, day as u8);
            if !valid {
                return Err(TemporalError::range(format!(
                    "{year}-{month:02}-{day:02} is not a valid ISO date"
                )));
            }
            Ok(IsoDate::new_unchecked(year, month as u8, day as u8))
        }
        Overflow::Constrain => {
            let month = month.clamp(1, 12) as u8;
            let day = day.clamp(1, days_in_month(year, month) as i64) as u8;
            Ok(IsoDate::new_unchecked(year, month, day))
        }
    }
}

pub fn regulate_time(
    hour: i64,
    minute: i64,
    second: i64,
    millisecond: i64,
    microsecond: i64,
    nanosecond: i64,
    overflow: Overflow,
) -> TemporalResult<IsoTime> {
    match overflow {
        Overflow::Reject => {
            let in_range = (0..=23).contains(&hour)
                && (0..=59).contains(&minute)
                && (0..=59).contains(&second)
                && (0..=999).contains(&millisecond)
                && (0..=999).contains(&microsecond)
                && (0..=999).contains(&nanosecond);
            if !in_range {
                return Err(TemporalError::range("time fields out of range"));
            }
            Ok(IsoTime {
                hour: hour as u8,
                minute: minute as u8,
                second: second as u8,
                millisecond: millisecond as u16,
                microsecond: microsecond as u16,
                nanosecond: nanosecond as u16,
            })
        }
        Overflow::Constrain => Ok(IsoTime {
            hour: hour.clamp(0, 23) as u8,
            minute: minute.clamp(0, 59) as u8,
            second: second.clamp(0, 59) as u8,
            millisecond: millisecond.clamp(0, 999) as u16,
            microsecond: microsecond.clamp(0, 999) as u16,
            nanosecond: nanosecond.clamp(0, 999) as u16,
        }),
    }
}

pub fn regulate_year_month(year: i64, month: i64, overflow: Overflow) -> TemporalResult<(i32, u8)> {
    let year = to_year(year)?;
    match overflow {
        Overflow::Reject if !(1..=12).contains(&month) => {
            Err(TemporalError::range(format!("month {month} is out of range")))
        }
        _ => Ok((year, month.clamp(1, 12) as u8)),
    }
}

/// Regulate a month-day pair against `year`, or against the leap reference
/// year when no year was given.
pub fn regulate_month_day(
    month: i64,
    day: i64,
    year: Option<i64>,
    overflow: Overflow,
) -> TemporalResult<(u8, u8)> {
    let year = year.unwrap_or(MONTH_DAY_REFERENCE_YEAR as i64);
    let date = regulate_date(year, month, day, overflow)?;
    Ok((date.month, date.day))
}

/// Reconcile `month` with `monthCode`. Either may be absent, but not both,
/// and when both are present they must agree.
pub fn resolve_month(month: Option<i64>, month_code: Option<&str>) -> TemporalResult<i64> {
    match (month, month_code) {
        (None, None) => Err(TemporalError::type_error("month or monthCode is required")),
        (Some(month), None) => Ok(month),
        (explicit, Some(code)) => {
            let from_code = parse_month_code(code)? as i64;
            match explicit {
                Some(month) if month != from_code => Err(TemporalError::range(format!(
                    "month {month} and monthCode {code} disagree"
                ))),
                _ => Ok(from_code),
            }
        }
    }
}

/// A partial bag of date fields, as supplied to `from` or `with`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDate {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub month_code: Option<String>,
    pub day: Option<i64>,
}

impl PartialDate {
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.month_code.is_none() && self.day.is_none()
    }

    /// Fill absent fields from `base`. A supplied month or month code
    /// replaces the base month entirely.
    pub(crate) fn merged_onto(&self, base: IsoDate) -> PartialDate {
        let (month, month_code) = if self.month.is_none() && self.month_code.is_none() {
            (Some(base.month as i64), None)
        } else {
            (self.month, self.month_code.clone())
        };
        PartialDate {
            year: self.year.or(Some(base.year as i64)),
            month,
            month_code,
            day: self.day.or(Some(base.day as i64)),
        }
    }

    pub(crate) fn resolve_month(&self) -> TemporalResult<i64> {
        resolve_month(self.month, self.month_code.as_deref())
    }

    pub(crate) fn require_year(&self) -> TemporalResult<i64> {
        self.year
            .ok_or_else(|| TemporalError::type_error("year is required"))
    }

    pub(crate) fn require_day(&self) -> TemporalResult<i64> {
        self.day
            .ok_or_else(|| TemporalError::type_error("day is required"))
    }

    /// Resolve a complete date under `overflow`.
    pub fn to_date(&self, overflow: Overflow) -> TemporalResult<IsoDate> {
        let year = self.require_year()?;
        let month = self.resolve_month()?;
        let day = self.require_day()?;
        regulate_date(year, month, day, overflow)
    }
}

/// A partial bag of time fields; absent fields default to zero or to the
/// value being updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialTime {
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub millisecond: Option<i64>,
    pub microsecond: Option<i64>,
    pub nanosecond: Option<i64>,
}

impl PartialTime {
    pub fn is_empty(&self) -> bool {
        self.hour.is_none()
            && self.minute.is_none()
            && self.second.is_none()
            && self.millisecond.is_none()
            && self.microsecond.is_none()
            && self.nanosecond.is_none()
    }

    pub fn to_time(&self, base: IsoTime, overflow: Overflow) -> TemporalResult<IsoTime> {
        regulate_time(
            self.hour.unwrap_or(base.hour as i64),
            self.minute.unwrap_or(base.minute as i64),
            self.second.unwrap_or(base.second as i64),
            self.millisecond.unwrap_or(base.millisecond as i64),
            self.microsecond.unwrap_or(base.microsecond as i64),
            self.nanosecond.unwrap_or(base.nanosecond as i64),
            overflow,
        )
    }
}
