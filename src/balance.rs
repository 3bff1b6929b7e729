//! Carry and borrow between neighboring units.
//!
//! Every balance returns canonical fields plus an explicit carry into the
//! next larger unit. Floor division and non-negative remainders keep the
//! fields canonical for negative inputs; the sign ends up in the carry.

use tracing::trace;

use crate::calendar::{days_in_month, days_in_year};
use crate::error::{TemporalError, TemporalResult};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::NS_PER_DAY;

/// Upper bound on the day magnitude a date balance will walk through.
/// Twice the representable span plus slack; anything larger cannot land on
/// a representable date.
const MAX_BALANCE_DAYS: i64 = 2 * 100_000_001 + 800;

/// Balance integer time fields. Returns `(days, time)`.
pub fn balance_time(
    hour: i64,
    minute: i64,
    second: i64,
    millisecond: i64,
    microsecond: i64,
    nanosecond: i64,
) -> (i64, IsoTime) {
    let (days, time) = balance_time_wide(
        hour.into(),
        minute.into(),
        second.into(),
        millisecond.into(),
        microsecond.into(),
        nanosecond.into(),
    );
    // Even with every field at i64::MAX the carry stays below i64::MAX / 12.
    (days as i64, time)
}

/// Balance time fields that originate from a duration and may be far
/// beyond 64-bit range once expressed in nanoseconds.
pub fn balance_time_wide(
    hour: i128,
    minute: i128,
    second: i128,
    millisecond: i128,
    microsecond: i128,
    nanosecond: i128,
) -> (i128, IsoTime) {
    let us = microsecond + nanosecond.div_euclid(1000);
    let ns = nanosecond.rem_euclid(1000) as u16;
    let ms = millisecond + us.div_euclid(1000);
    let us_out = us.rem_euclid(1000) as u16;
    let s = second + ms.div_euclid(1000);
    let ms_out = ms.rem_euclid(1000) as u16;
    let m = minute + s.div_euclid(60);
    let s_out = s.rem_euclid(60) as u8;
    let h = hour + m.div_euclid(60);
    let m_out = m.rem_euclid(60) as u8;
    (
        h.div_euclid(24),
        IsoTime {
            hour: h.rem_euclid(24) as u8,
            minute: m_out,
            second: s_out,
            millisecond: ms_out,
            microsecond: us_out,
            nanosecond: ns,
        },
    )
}

/// Bring `month` into 1..=12, carrying whole years.
pub fn balance_iso_year_month(year: i64, month: i64) -> (i64, u8) {
    (
        year + (month - 1).div_euclid(12),
        ((month - 1).rem_euclid(12) + 1) as u8,
    )
}

/// Normalize an out-of-range day by walking whole years, then whole months.
///
/// The result is a valid calendar date but may still be outside the
/// representable range; callers check limits.
pub fn balance_iso_date(year: i64, month: i64, day: i64) -> TemporalResult<IsoDate> {
    if day.abs() > MAX_BALANCE_DAYS {
        return Err(TemporalError::range("date is outside the representable range"));
    }
    let (year, month) = balance_iso_year_month(year, month);
    let mut year = i32::try_from(year)
        .ok()
        .filter(|y| y.unsigned_abs() < 1_000_000)
        .ok_or_else(|| TemporalError::range("year is outside the representable range"))?;
    let mut month = month;
    let mut day = day;

    let mut steps = 0u32;
    let mut test_year = if month > 2 { year } else { year - 1 };
    while day < -(days_in_year(test_year) as i64) {
        day += days_in_year(test_year) as i64;
        year -= 1;
        test_year -= 1;
        steps += 1;
    }
    let mut test_year = if month > 2 { year + 1 } else { year };
    while day > days_in_year(test_year) as i64 {
        day -= days_in_year(test_year) as i64;
        year += 1;
        test_year += 1;
        steps += 1;
    }
    while day < 1 {
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
        day += days_in_month(year, month) as i64;
    }
    while day > days_in_month(year, month) as i64 {
        day -= days_in_month(year, month) as i64;
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    if steps > 0 {
        trace!(steps, year, month, day, "balanced date across whole years");
    }
    Ok(IsoDate::new_unchecked(year, month, day as u8))
}

/// Add signed time fields to a date-time, carrying whole days into the date.
pub(crate) fn balance_iso_date_time(
    date: IsoDate,
    hour: i128,
    minute: i128,
    second: i128,
    millisecond: i128,
    microsecond: i128,
    nanosecond: i128,
) -> TemporalResult<IsoDateTime> {
    let (days, time) = balance_time_wide(hour, minute, second, millisecond, microsecond, nanosecond);
    let days = i64::try_from(days)
        .map_err(|_| TemporalError::range("date-time is outside the representable range"))?;
    let date = balance_iso_date(date.year as i64, date.month as i64, date.day as i64 + days)?;
    Ok(IsoDateTime::new_unchecked(date, time))
}

/// Split a signed nanosecond count into whole 24-hour days and a time of day.
pub(crate) fn balance_nanoseconds(ns: i128) -> (i128, IsoTime) {
    (ns.div_euclid(NS_PER_DAY), IsoTime::from_nanoseconds(ns.rem_euclid(NS_PER_DAY)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn balance_time_carries_and_borrows() {
        let (days, t) = balance_time(23, 59, 65, 0, 0, 0);
        assert_eq!(days, 1);
        assert_eq!((t.hour, t.minute, t.second), (0, 0, 5));

        let (days, t) = balance_time(0, 0, 0, 0, 0, -1);
        assert_eq!(days, -1);
        assert_eq!(
            t,
            IsoTime::new(23, 59, 59, 999, 999, 999).unwrap()
        );
    }

    #[test]
    fn balance_time_survives_extreme_fields() {
        let (days, t) = balance_time(i64::MAX, i64::MAX, i64::MAX, i64::MAX, i64::MAX, i64::MAX);
        let total = |days: i128, t: IsoTime| {
            days * NS_PER_DAY
                + t.hour as i128 * 3_600_000_000_000
                + t.minute as i128 * 60_000_000_000
                + t.second as i128 * 1_000_000_000
                + t.millisecond as i128 * 1_000_000
                + t.microsecond as i128 * 1_000
                + t.nanosecond as i128
        };
        let max = i64::MAX as i128;
        let expected = max * (3_600_000_000_000 + 60_000_000_000 + 1_000_000_000 + 1_000_000 + 1_000 + 1);
        assert_eq!(total(days as i128, t), expected);

        let (days, t) = balance_time(i64::MIN, i64::MIN, i64::MIN, i64::MIN, i64::MIN, i64::MIN);
        assert!(days < 0);
        let min = i64::MIN as i128;
        let expected = min * (3_600_000_000_000 + 60_000_000_000 + 1_000_000_000 + 1_000_000 + 1_000 + 1);
        assert_eq!(total(days as i128, t), expected);
    }

    #[test]
    fn balance_date_walks_years_and_months() {
        assert_eq!(balance_iso_date(2021, 1, 32).unwrap(), IsoDate::new_unchecked(2021, 2, 1));
        assert_eq!(balance_iso_date(2021, 3, 0).unwrap(), IsoDate::new_unchecked(2021, 2, 28));
        assert_eq!(balance_iso_date(2020, 3, 0).unwrap(), IsoDate::new_unchecked(2020, 2, 29));
        assert_eq!(balance_iso_date(2019, 13, 1).unwrap(), IsoDate::new_unchecked(2020, 1, 1));
        assert_eq!(balance_iso_date(2019, 1, 1 + 370).unwrap(), IsoDate::new_unchecked(2020, 1, 6));
        assert_eq!(
            balance_iso_date(2020, 1, 1 - 365).unwrap(),
            IsoDate::new_unchecked(2019, 1, 1)
        );
    }

    #[test]
    fn balance_date_matches_epoch_arithmetic() {
        let base = IsoDate::new_unchecked(1970, 1, 1);
        for offset in [-1_000_000i64, -36525, -1, 0, 59, 365 * 400 + 97, 10_000_000] {
            let d = balance_iso_date(base.year as i64, base.month as i64, 1 + offset).unwrap();
            assert_eq!(d, IsoDate::from_epoch_days(offset));
        }
    }

    #[test]
    fn balance_date_rejects_huge_magnitudes() {
        assert!(balance_iso_date(1970, 1, i64::MAX / 2).unwrap_err().is_range());
    }

    proptest! {
        #[test]
        fn balance_time_reconstitutes_total(
            h in -100_000i64..100_000,
            m in -100_000i64..100_000,
            s in -100_000i64..100_000,
            ms in -100_000i64..100_000,
            us in -100_000i64..100_000,
            ns in -100_000i64..100_000,
        ) {
            let (days, t) = balance_time(h, m, s, ms, us, ns);
            prop_assert!(t.is_valid());
            let total = |d: i128, h: i128, m: i128, s: i128, ms: i128, us: i128, ns: i128| {
                ((((d * 24 + h) * 60 + m) * 60 + s) * 1000 + ms) * 1_000_000 + us * 1000 + ns
            };
            prop_assert_eq!(
                total(days as i128, t.hour as i128, t.minute as i128, t.second as i128,
                      t.millisecond as i128, t.microsecond as i128, t.nanosecond as i128),
                total(0, h as i128, m as i128, s as i128, ms as i128, us as i128, ns as i128)
            );
        }

        #[test]
        fn wide_and_narrow_balances_agree(
            h in -1_000i64..1_000,
            s in -100_000i64..100_000,
            ns in -10_000_000_000i64..10_000_000_000,
        ) {
            let (d1, t1) = balance_time(h, 0, s, 0, 0, ns);
            let (d2, t2) = balance_time_wide(h as i128, 0, s as i128, 0, 0, ns as i128);
            prop_assert_eq!(d1 as i128, d2);
            prop_assert_eq!(t1, t2);
        }
    }
}
