//! Whole-date arithmetic: adding a date duration to a date and measuring the
//! calendar distance between two dates.

use std::cmp::Ordering;

use tracing::trace;

use crate::balance::{balance_iso_date, balance_iso_year_month};
use crate::duration::DateDuration;
use crate::error::{TemporalError, TemporalResult};
use crate::iso::IsoDate;
use crate::options::{Overflow, Unit};
use crate::regulate::regulate_date;

fn add_iso_date_unchecked(
    date: IsoDate,
    years: i64,
    months: i64,
    weeks: i64,
    days: i64,
    overflow: Overflow,
) -> TemporalResult<IsoDate> {
    // Years and months first, regulated against the new month length;
    // weeks and days only afterwards.
    let (year, month) = balance_iso_year_month(date.year as i64 + years, date.month as i64 + months);
    let regulated = regulate_date(year, month as i64, date.day as i64, overflow)?;
    let days = weeks
        .checked_mul(7)
        .and_then(|w| w.checked_add(days))
        .ok_or_else(|| TemporalError::range("day count is out of range"))?;
    balance_iso_date(regulated.year as i64, regulated.month as i64, regulated.day as i64 + days)
}

/// Add a date duration to a date. Fails under `reject` when the intermediate
/// year-month cannot hold the day, and when the result is not representable.
pub fn add_iso_date(
    date: IsoDate,
    years: i64,
    months: i64,
    weeks: i64,
    days: i64,
    overflow: Overflow,
) -> TemporalResult<IsoDate> {
    let result = add_iso_date_unchecked(date, years, months, weeks, days, overflow)?;
    result.check_within_limits()?;
    Ok(result)
}

pub(crate) fn add_date_duration(
    date: IsoDate,
    duration: &DateDuration,
    overflow: Overflow,
) -> TemporalResult<IsoDate> {
    add_iso_date(date, duration.years, duration.months, duration.weeks, duration.days, overflow)
}

fn compare_iso_date(one: IsoDate, two: IsoDate) -> i64 {
    match one.cmp(&two) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Signed day count from `one` to `two`, as the difference of their epoch
/// days.
fn days_between(one: IsoDate, two: IsoDate) -> i64 {
    two.to_epoch_days() - one.to_epoch_days()
}

/// Calendar difference from `one` to `two`, expressed down to days, with
/// `largest_unit` as the coarsest unit used.
///
/// For year and month units the count is guessed from the field deltas and
/// corrected at most once per component when the constrained probe
/// overshoots `two` in the direction of travel.
pub fn difference_iso_date(one: IsoDate, two: IsoDate, largest_unit: Unit) -> TemporalResult<DateDuration> {
    let sign = -compare_iso_date(one, two);
    if sign == 0 {
        return Ok(DateDuration::default());
    }
    match largest_unit {
        Unit::Year | Unit::Month => {
            let overshoots = |probe: IsoDate| compare_iso_date(probe, two) * sign > 0;

            let mut years = 0;
            if largest_unit == Unit::Year {
                years = (two.year - one.year) as i64;
                let probe = add_iso_date_unchecked(one, years, 0, 0, 0, Overflow::Constrain)?;
                if overshoots(probe) {
                    years -= sign;
                }
            }

            let after_years = (one.year as i64 + years, one.month as i64);
            let mut months =
                (two.year as i64 - after_years.0) * 12 + (two.month as i64 - after_years.1);
            let mut probe = add_iso_date_unchecked(one, years, months, 0, 0, Overflow::Constrain)?;
            if overshoots(probe) {
                months -= sign;
                probe = add_iso_date_unchecked(one, years, months, 0, 0, Overflow::Constrain)?;
            }
            if overshoots(probe) {
                return Err(TemporalError::range("date difference did not converge"));
            }
            let days = days_between(probe, two);
            trace!(years, months, days, "calendar date difference");
            Ok(DateDuration::new_unchecked(years, months, 0, days))
        }
        Unit::Week => {
            let total = days_between(one, two);
            Ok(DateDuration::new_unchecked(0, 0, total / 7, total % 7))
        }
        _ => Ok(DateDuration::new_unchecked(0, 0, 0, days_between(one, two))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u8, d: u8) -> IsoDate {
        IsoDate::new(y, m, d).unwrap()
    }

    fn diff(a: IsoDate, b: IsoDate, unit: Unit) -> (i64, i64, i64, i64) {
        let d = difference_iso_date(a, b, unit).unwrap();
        (d.years, d.months, d.weeks, d.days)
    }

    #[test]
    fn add_regulates_before_adding_days() {
        let jan31 = date(2021, 1, 31);
        assert_eq!(add_iso_date(jan31, 0, 1, 0, 0, Overflow::Constrain).unwrap(), date(2021, 2, 28));
        assert!(add_iso_date(jan31, 0, 1, 0, 0, Overflow::Reject).unwrap_err().is_range());
        assert_eq!(add_iso_date(jan31, 0, 1, 0, 1, Overflow::Constrain).unwrap(), date(2021, 3, 1));
        assert_eq!(add_iso_date(date(2020, 2, 29), 1, 0, 0, 0, Overflow::Constrain).unwrap(), date(2021, 2, 28));
        assert_eq!(add_iso_date(date(2021, 4, 22), 0, 0, 2, -3, Overflow::Constrain).unwrap(), date(2021, 5, 3));
    }

    #[test]
    fn add_rejects_unrepresentable_results() {
        assert!(add_iso_date(date(275760, 9, 13), 0, 0, 0, 1, Overflow::Constrain).is_err());
        assert!(add_iso_date(date(2021, 1, 1), 300_000, 0, 0, 0, Overflow::Constrain).is_err());
    }

    #[test]
    fn difference_in_years_and_months() {
        assert_eq!(diff(date(2019, 1, 1), date(2020, 1, 6), Unit::Year), (1, 0, 0, 5));
        assert_eq!(diff(date(2020, 1, 1), date(2021, 1, 5), Unit::Year), (1, 0, 0, 4));
        assert_eq!(diff(date(2021, 1, 31), date(2021, 2, 28), Unit::Month), (0, 1, 0, 0));
        assert_eq!(diff(date(2021, 3, 31), date(2021, 2, 28), Unit::Month), (0, -1, 0, 0));
        assert_eq!(diff(date(2020, 2, 29), date(2021, 2, 28), Unit::Year), (1, 0, 0, 0));
        assert_eq!(diff(date(2021, 5, 15), date(2020, 3, 20), Unit::Year), (-1, -1, 0, -26));
        assert_eq!(diff(date(2019, 12, 25), date(2021, 1, 24), Unit::Month), (0, 12, 0, 30));
    }

    #[test]
    fn difference_in_weeks_and_days() {
        assert_eq!(diff(date(2021, 4, 1), date(2021, 4, 20), Unit::Week), (0, 0, 2, 5));
        assert_eq!(diff(date(2021, 4, 20), date(2021, 4, 1), Unit::Week), (0, 0, -2, -5));
        assert_eq!(diff(date(2020, 1, 1), date(2021, 1, 1), Unit::Day), (0, 0, 0, 366));
    }

    #[test]
    fn difference_then_add_returns_to_target() {
        let start = date(2019, 8, 31);
        for end in [date(2020, 2, 29), date(2023, 1, 30), date(2017, 3, 31), date(2019, 9, 30)] {
            for unit in [Unit::Year, Unit::Month, Unit::Week, Unit::Day] {
                let d = difference_iso_date(start, end, unit).unwrap();
                assert_eq!(add_date_duration(start, &d, Overflow::Constrain).unwrap(), end);
            }
        }
    }
}
