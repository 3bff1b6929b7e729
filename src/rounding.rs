//! Rounding a quantity to a multiple of an increment.
//!
//! All paths share one decision: write the value as `q * increment + r`
//! with `q` floored and `0 <= r < increment`, then pick `q` or `q + 1`.
//! The float path serves quantities already held as binary64; the integer
//! and exact-ratio paths serve instants and duration totals that exceed 2^53.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::balance::balance_nanoseconds;
use crate::iso::IsoTime;
use crate::options::{NS_PER_DAY, Precision, RoundingMode, Unit};

/// Whether a value strictly between two multiples moves up to the larger one.
///
/// `negative` is the sign of the value being rounded, `half` compares the
/// remainder against half an increment, `floor_even` tells whether the lower
/// multiple is an even multiple of the increment.
fn rounds_up(mode: RoundingMode, negative: bool, half: Ordering, floor_even: bool) -> bool {
    let tie = |on_tie: bool| match half {
        Ordering::Less => false,
        Ordering::Greater => true,
        Ordering::Equal => on_tie,
    };
    match mode {
        RoundingMode::Ceil => true,
        RoundingMode::Floor => false,
        RoundingMode::Expand => !negative,
        RoundingMode::Trunc => negative,
        RoundingMode::HalfCeil => tie(true),
        RoundingMode::HalfFloor => tie(false),
        RoundingMode::HalfExpand => tie(!negative),
        RoundingMode::HalfTrunc => tie(negative),
        RoundingMode::HalfEven => tie(!floor_even),
    }
}

pub fn round_number_to_increment(x: f64, increment: f64, mode: RoundingMode) -> f64 {
    let quotient = x / increment;
    let floor = quotient.floor();
    let fraction = quotient - floor;
    if fraction == 0.0 {
        return floor * increment;
    }
    let half = fraction.partial_cmp(&0.5).unwrap_or(Ordering::Equal);
    let floor_even = floor.rem_euclid(2.0) == 0.0;
    if rounds_up(mode, x < 0.0, half, floor_even) {
        (floor + 1.0) * increment
    } else {
        floor * increment
    }
}

pub fn round_i128_to_increment(x: i128, increment: i128, mode: RoundingMode) -> i128 {
    debug_assert!(increment > 0);
    let q = x.div_euclid(increment);
    let r = x.rem_euclid(increment);
    if r == 0 {
        return x;
    }
    let half = (2 * r).cmp(&increment);
    if rounds_up(mode, x < 0, half, q.rem_euclid(2) == 0) {
        (q + 1) * increment
    } else {
        q * increment
    }
}

pub fn round_bigint_to_increment(x: &BigInt, increment: &BigInt, mode: RoundingMode) -> BigInt {
    round_ratio_to_increment(x, &BigInt::from(1), increment, mode)
}

/// Round the exact rational `numerator / denominator` to a multiple of
/// `increment`. The denominator must be positive.
pub fn round_ratio_to_increment(
    numerator: &BigInt,
    denominator: &BigInt,
    increment: &BigInt,
    mode: RoundingMode,
) -> BigInt {
    debug_assert!(denominator.is_positive() && increment.is_positive());
    let divisor = denominator * increment;
    let (q, r) = numerator.div_mod_floor(&divisor);
    if r.is_zero() {
        return q * increment;
    }
    let half = (&r * BigInt::from(2)).cmp(&divisor);
    let floor_even = q.is_even();
    if rounds_up(mode, numerator.is_negative(), half, floor_even) {
        (q + 1) * increment
    } else {
        q * increment
    }
}

/// Round a time of day. Returns the whole days carried out (0 or 1) and the
/// rounded time. A `day_length_ns` other than 24 hours applies when the day
/// is a zoned local day.
pub fn round_time(
    time: IsoTime,
    unit: Unit,
    increment: u64,
    mode: RoundingMode,
    day_length_ns: Option<i128>,
) -> (i64, IsoTime) {
    let ns = time.to_nanoseconds();
    if unit == Unit::Day {
        let day_length = day_length_ns.unwrap_or(NS_PER_DAY);
        let rounded = round_i128_to_increment(ns, day_length * increment as i128, mode);
        return ((rounded / day_length) as i64, IsoTime::MIDNIGHT);
    }
    let unit_ns = unit.nanoseconds().unwrap_or(1);
    let rounded = round_i128_to_increment(ns, unit_ns * increment as i128, mode);
    let (days, time) = balance_nanoseconds(rounded);
    (days as i64, time)
}

/// Round epoch nanoseconds to a time unit, measuring from the epoch.
/// Instants before the epoch round the same way as those after it.
pub fn round_epoch_nanoseconds(ns: i128, unit: Unit, increment: u64, mode: RoundingMode) -> i128 {
    let unit_ns = unit.nanoseconds().unwrap_or(NS_PER_DAY);
    round_i128_to_increment(ns, unit_ns * increment as i128, mode.unsigned())
}

/// Render the fractional part of a second, including the leading `.`.
/// Empty when the precision prints no digits.
pub fn format_fractional_seconds(subsecond_ns: u32, precision: Precision) -> String {
    let digits = format!("{subsecond_ns:09}");
    match precision {
        Precision::Minute | Precision::Digits(0) => String::new(),
        Precision::Digits(p) => format!(".{}", &digits[..p.min(9) as usize]),
        Precision::Auto => {
            let trimmed = digits.trim_end_matches('0');
            if trimmed.is_empty() {
                String::new()
            } else {
                format!(".{trimmed}")
            }
        }
    }
}
