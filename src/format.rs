//! ISO 8601 rendering shared by the value types.

use crate::calendar::Calendar;
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{Precision, ShowCalendar};
use crate::rounding::format_fractional_seconds;

/// Four digits for years 0..=9999, otherwise a signed six-digit year.
pub fn format_year(year: i32) -> String {
    if (0..=9999).contains(&year) {
        format!("{year:04}")
    } else if year >= 0 {
        format!("+{year:06}")
    } else {
        format!("-{:06}", year.unsigned_abs())
    }
}

pub fn format_iso_date(date: IsoDate) -> String {
    format!("{}-{:02}-{:02}", format_year(date.year), date.month, date.day)
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff…` depending on the precision.
pub fn format_iso_time(time: IsoTime, precision: Precision) -> String {
    let IsoTime { hour, minute, second, .. } = time;
    if precision == Precision::Minute {
        return format!("{hour:02}:{minute:02}");
    }
    format!(
        "{hour:02}:{minute:02}:{second:02}{}",
        format_fractional_seconds(time.subsecond_nanoseconds(), precision)
    )
}

pub fn format_iso_date_time(date_time: &IsoDateTime, precision: Precision) -> String {
    format!(
        "{}T{}",
        format_iso_date(date_time.date),
        format_iso_time(date_time.time, precision)
    )
}

/// The `[u-ca=…]` suffix. `auto` omits it for the ISO calendar.
pub fn format_calendar_annotation(calendar: Calendar, show: ShowCalendar) -> String {
    match show {
        ShowCalendar::Never => String::new(),
        ShowCalendar::Auto if calendar.is_iso() => String::new(),
        ShowCalendar::Critical => format!("[!u-ca={calendar}]"),
        ShowCalendar::Auto | ShowCalendar::Always => format!("[u-ca={calendar}]"),
    }
}
