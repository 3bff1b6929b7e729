//! Calendar and time arithmetic on ISO 8601 values: exact instants, zoned
//! and plain date-times, dates, times, year-months, month-days and
//! durations, with the rounding, balancing and time zone disambiguation
//! rules that make them agree with each other.
//!
//! ```
//! use temporal_engine::{DifferenceOptions, PlainDate, Unit};
//!
//! let start: PlainDate = "2019-01-01".parse().unwrap();
//! let end: PlainDate = "2020-01-06".parse().unwrap();
//! let options = DifferenceOptions {
//!     largest_unit: Some(Unit::Year),
//!     ..Default::default()
//! };
//! assert_eq!(start.until(&end, &options).unwrap().to_string(), "P1Y5D");
//! ```

pub mod balance;
pub mod calendar;
pub mod date_math;
pub mod duration;
pub mod error;
pub mod format;
pub mod instant;
pub mod iso;
pub mod logging;
pub mod options;
pub mod parser;
pub mod plain_date;
pub mod plain_date_time;
pub mod plain_month_day;
pub mod plain_time;
pub mod plain_year_month;
pub mod regulate;
pub mod relative;
pub mod rounding;
pub mod time_zone;
pub mod zoned_date_time;

pub use calendar::{Calendar, CalendarFields};
pub use duration::{DateDuration, Duration, PartialDuration};
pub use error::{ErrorKind, TemporalError, TemporalResult};
pub use instant::Instant;
pub use iso::{IsoDate, IsoDateTime, IsoTime};
pub use options::{
    DifferenceOptions, Disambiguation, OffsetOption, Overflow, Precision, RoundingMode, RoundingOptions,
    ShowCalendar, ShowOffset, ShowTimeZone, ToStringOptions, Unit,
};
pub use plain_date::PlainDate;
pub use plain_date_time::PlainDateTime;
pub use plain_month_day::PlainMonthDay;
pub use plain_time::PlainTime;
pub use plain_year_month::PlainYearMonth;
pub use regulate::{PartialDate, PartialTime};
pub use relative::RelativeTo;
pub use time_zone::{ChronoTzProvider, TimeZone, TimeZoneProvider};
pub use zoned_date_time::{PartialZonedDateTime, ZonedDateTime};
