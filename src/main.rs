use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};

use temporal_engine::time_zone::TimeZoneProvider;
use temporal_engine::{
    Calendar, CalendarFields, ChronoTzProvider, DifferenceOptions, Disambiguation, Duration, Instant, Overflow,
    PlainDate, PlainDateTime, PlainMonthDay, PlainTime, PlainYearMonth, RelativeTo, RoundingMode,
    RoundingOptions, TemporalError, TemporalResult, TimeZone, Unit, ZonedDateTime, logging,
};

#[derive(Parser)]
#[command(name = "temporal", version, about = "ISO 8601 date, time and duration arithmetic")]
struct Cli {
    /// Time zone for readings that need one; defaults to the host zone
    #[arg(long = "time-zone", short = 'z', global = true)]
    time_zone: Option<String>,

    /// Log more (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a value and print it in canonical form
    Parse {
        value: String,
        #[arg(long, value_enum, default_value_t = Kind::Auto)]
        kind: Kind,
    },
    /// Round a value or a duration
    Round {
        value: String,
        #[arg(long)]
        smallest_unit: Option<Unit>,
        #[arg(long)]
        largest_unit: Option<Unit>,
        #[arg(long)]
        increment: Option<u64>,
        #[arg(long)]
        mode: Option<RoundingMode>,
        /// Anchor for durations with calendar units
        #[arg(long)]
        relative_to: Option<String>,
        #[arg(long, value_enum, default_value_t = Kind::Auto)]
        kind: Kind,
    },
    /// Difference between two values of the same kind
    Diff {
        from: String,
        to: String,
        #[arg(long)]
        largest_unit: Option<Unit>,
        #[arg(long)]
        smallest_unit: Option<Unit>,
        #[arg(long)]
        increment: Option<u64>,
        #[arg(long)]
        mode: Option<RoundingMode>,
        /// Measure `from` since `to` instead of until it
        #[arg(long)]
        since: bool,
        #[arg(long, value_enum, default_value_t = Kind::Auto)]
        kind: Kind,
    },
    /// Add a duration to a value
    Add {
        value: String,
        duration: String,
        #[arg(long)]
        subtract: bool,
        #[arg(long, default_value = "constrain")]
        overflow: Overflow,
        /// Anchor when adding two durations with calendar units
        #[arg(long)]
        relative_to: Option<String>,
        #[arg(long, value_enum, default_value_t = Kind::Auto)]
        kind: Kind,
    },
    /// Place a wall-clock reading in the time zone
    Resolve {
        date_time: String,
        #[arg(long, default_value = "compatible")]
        disambiguation: Disambiguation,
    },
    /// Print calendar facts about a value
    Info {
        value: String,
        #[arg(long, value_enum, default_value_t = Kind::Auto)]
        kind: Kind,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Auto,
    Instant,
    Zoned,
    DateTime,
    Date,
    Time,
    YearMonth,
    MonthDay,
    Duration,
}

enum Value {
    Instant(Instant),
    Zoned(ZonedDateTime),
    DateTime(PlainDateTime),
    Date(PlainDate),
    Time(PlainTime),
    YearMonth(PlainYearMonth),
    MonthDay(PlainMonthDay),
    Duration(Duration),
}

impl Value {
    fn kind(&self) -> Kind {
        match self {
            Value::Instant(_) => Kind::Instant,
            Value::Zoned(_) => Kind::Zoned,
            Value::DateTime(_) => Kind::DateTime,
            Value::Date(_) => Kind::Date,
            Value::Time(_) => Kind::Time,
            Value::YearMonth(_) => Kind::YearMonth,
            Value::MonthDay(_) => Kind::MonthDay,
            Value::Duration(_) => Kind::Duration,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Value::Instant(_) => "instant",
            Value::Zoned(_) => "zoned date-time",
            Value::DateTime(_) => "plain date-time",
            Value::Date(_) => "plain date",
            Value::Time(_) => "plain time",
            Value::YearMonth(_) => "plain year-month",
            Value::MonthDay(_) => "plain month-day",
            Value::Duration(_) => "duration",
        }
    }

    fn parse(s: &str, kind: Kind) -> TemporalResult<Value> {
        Ok(match kind {
            Kind::Auto => return Self::detect(s),
            Kind::Instant => Value::Instant(s.parse()?),
            Kind::Zoned => Value::Zoned(s.parse()?),
            Kind::DateTime => Value::DateTime(s.parse()?),
            Kind::Date => Value::Date(s.parse()?),
            Kind::Time => Value::Time(s.parse()?),
            Kind::YearMonth => Value::YearMonth(s.parse()?),
            Kind::MonthDay => Value::MonthDay(s.parse()?),
            Kind::Duration => Value::Duration(s.parse()?),
        })
    }

    /// Most specific reading first: a zone annotation makes a zoned value,
    /// an offset an instant, a time designator a date-time.
    fn detect(s: &str) -> TemporalResult<Value> {
        let unsigned = s.trim_start_matches(['+', '-', '\u{2212}']);
        let candidates: &[Kind] = if unsigned.starts_with(['P', 'p']) {
            &[Kind::Duration]
        } else if s.contains('[') {
            &[Kind::Zoned, Kind::Instant, Kind::DateTime, Kind::YearMonth, Kind::MonthDay]
        } else if s.contains(['T', 't', ' ']) {
            &[Kind::Instant, Kind::DateTime, Kind::Time]
        } else {
            &[Kind::Date, Kind::YearMonth, Kind::MonthDay, Kind::Time]
        };
        let mut last_error = None;
        for &kind in candidates {
            match Self::parse(s, kind) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(input = s, error = %e, "reading rejected");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| TemporalError::range(format!("cannot parse {s}"))))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Instant(v) => v.fmt(f),
            Value::Zoned(v) => v.fmt(f),
            Value::DateTime(v) => v.fmt(f),
            Value::Date(v) => v.fmt(f),
            Value::Time(v) => v.fmt(f),
            Value::YearMonth(v) => v.fmt(f),
            Value::MonthDay(v) => v.fmt(f),
            Value::Duration(v) => v.fmt(f),
        }
    }
}

fn host_time_zone(requested: Option<&str>, provider: &dyn TimeZoneProvider) -> TemporalResult<TimeZone> {
    if let Some(id) = requested {
        return TimeZone::from_string(id, provider);
    }
    match iana_time_zone::get_timezone() {
        Ok(id) => TimeZone::from_identifier(&id, provider).or_else(|e| {
            warn!(zone = %id, error = %e, "host time zone is not usable, falling back to UTC");
            Ok(TimeZone::utc())
        }),
        Err(e) => {
            warn!(error = %e, "cannot determine the host time zone, falling back to UTC");
            Ok(TimeZone::utc())
        }
    }
}

fn unsupported(value: &Value, what: &str) -> TemporalError {
    TemporalError::type_error(format!("a {} cannot be {what}", value.name()))
}

fn round(value: &Value, options: &RoundingOptions, relative_to: Option<&RelativeTo>) -> TemporalResult<Value> {
    Ok(match value {
        Value::Instant(v) => Value::Instant(v.round(options)?),
        Value::Zoned(v) => Value::Zoned(v.round(options)?),
        Value::DateTime(v) => Value::DateTime(v.round(options)?),
        Value::Time(v) => Value::Time(v.round(options)?),
        Value::Duration(v) => Value::Duration(v.round(options, relative_to)?),
        other => return Err(unsupported(other, "rounded")),
    })
}

fn diff(from: &Value, to: &Value, options: &DifferenceOptions, since: bool) -> TemporalResult<Duration> {
    macro_rules! measure {
        ($a:expr, $b:expr) => {
            if since { $a.since($b, options) } else { $a.until($b, options) }
        };
    }
    match (from, to) {
        (Value::Instant(a), Value::Instant(b)) => measure!(a, b),
        (Value::Zoned(a), Value::Zoned(b)) => measure!(a, b),
        (Value::DateTime(a), Value::DateTime(b)) => measure!(a, b),
        (Value::Date(a), Value::Date(b)) => measure!(a, b),
        (Value::Time(a), Value::Time(b)) => measure!(a, b),
        (Value::YearMonth(a), Value::YearMonth(b)) => measure!(a, b),
        (other, _) => Err(unsupported(other, "measured against another value")),
    }
}

fn add(value: &Value, duration: &Duration, overflow: Overflow, relative_to: Option<&RelativeTo>) -> TemporalResult<Value> {
    Ok(match value {
        Value::Instant(v) => Value::Instant(v.add(duration)?),
        Value::Zoned(v) => Value::Zoned(v.add(duration, overflow)?),
        Value::DateTime(v) => Value::DateTime(v.add(duration, overflow)?),
        Value::Date(v) => Value::Date(v.add(duration, overflow)?),
        Value::Time(v) => Value::Time(v.add(duration)),
        Value::YearMonth(v) => Value::YearMonth(v.add(duration, overflow)?),
        Value::Duration(v) => Value::Duration(v.add(duration, relative_to)?),
        other => return Err(unsupported(other, "added to")),
    })
}

fn date_facts(out: &mut Vec<(String, String)>, fields: &dyn CalendarFields) {
    out.push(("calendar".into(), fields.calendar().to_string()));
    out.push(("month code".into(), fields.month_code()));
    out.push(("day of week".into(), fields.day_of_week().to_string()));
    out.push(("day of year".into(), fields.day_of_year().to_string()));
    out.push(("week of year".into(), fields.week_of_year().to_string()));
    out.push(("year of week".into(), fields.year_of_week().to_string()));
    out.push(("days in month".into(), fields.days_in_month().to_string()));
    out.push(("days in year".into(), fields.days_in_year().to_string()));
    out.push(("in leap year".into(), fields.in_leap_year().to_string()));
}

fn info(value: &Value, time_zone: &TimeZone) -> TemporalResult<Vec<(String, String)>> {
    let mut out = vec![("kind".to_string(), value.name().to_string())];
    match value {
        Value::Instant(v) => {
            out.push(("epoch nanoseconds".into(), v.epoch_nanoseconds().to_string()));
            out.push(("epoch milliseconds".into(), v.epoch_milliseconds().to_string()));
            let zoned = v.to_zoned_date_time(time_zone.clone(), Calendar::Iso8601)?;
            out.push((format!("in {time_zone}"), zoned.to_string()));
        }
        Value::Zoned(v) => {
            out.push(("epoch nanoseconds".into(), v.epoch_nanoseconds().to_string()));
            out.push(("offset".into(), v.offset()));
            out.push(("hours in day".into(), v.hours_in_day()?.to_string()));
            date_facts(&mut out, v);
            if let Some(next) = v.next_transition()? {
                out.push(("next transition".into(), next.to_string()));
            }
            if let Some(previous) = v.previous_transition()? {
                out.push(("previous transition".into(), previous.to_string()));
            }
        }
        Value::DateTime(v) => date_facts(&mut out, v),
        Value::Date(v) => date_facts(&mut out, v),
        Value::YearMonth(v) => {
            out.push(("month code".into(), v.month_code()));
            out.push(("days in month".into(), v.days_in_month().to_string()));
            out.push(("days in year".into(), v.days_in_year().to_string()));
            out.push(("in leap year".into(), v.in_leap_year().to_string()));
        }
        Value::MonthDay(v) => {
            out.push(("month code".into(), v.month_code()));
            out.push(("day".into(), v.day().to_string()));
        }
        Value::Time(v) => {
            out.push(("nanosecond of day".into(), v.iso().to_nanoseconds().to_string()));
        }
        Value::Duration(v) => {
            out.push(("sign".into(), v.sign().to_string()));
            out.push(("blank".into(), v.is_blank().to_string()));
            // Calendar units have no length without an anchor.
            if let Ok(total) = v.total(Unit::Second, None) {
                out.push(("total seconds".into(), total.to_string()));
            }
        }
    }
    Ok(out)
}

fn resolve(date_time: &str, time_zone: &TimeZone, disambiguation: Disambiguation) -> TemporalResult<Vec<String>> {
    let provider = ChronoTzProvider;
    let wall: PlainDateTime = date_time.parse()?;
    let candidates = time_zone.possible_epoch_nanoseconds(&wall.iso(), &provider)?;
    let mut lines = vec![format!("{} candidate(s) in {time_zone}", candidates.len())];
    for candidate in &candidates {
        let zoned = ZonedDateTime::new(*candidate, time_zone.clone(), wall.calendar())?;
        lines.push(format!("  {zoned}"));
    }
    let chosen = wall.to_zoned_date_time(time_zone.clone(), disambiguation)?;
    lines.push(format!("{disambiguation}: {chosen}"));
    Ok(lines)
}

fn relative_to(s: Option<&str>) -> TemporalResult<Option<RelativeTo>> {
    s.map(|s| s.parse()).transpose()
}

fn run(cli: &Cli) -> TemporalResult<Vec<String>> {
    match &cli.command {
        Command::Parse { value, kind } => {
            let value = Value::parse(value, *kind)?;
            Ok(vec![format!("{}: {value}", value.name())])
        }
        Command::Round {
            value,
            smallest_unit,
            largest_unit,
            increment,
            mode,
            relative_to: anchor,
            kind,
        } => {
            let value = Value::parse(value, *kind)?;
            let options = RoundingOptions {
                largest_unit: *largest_unit,
                smallest_unit: *smallest_unit,
                rounding_increment: *increment,
                rounding_mode: *mode,
            };
            let anchor = relative_to(anchor.as_deref())?;
            Ok(vec![round(&value, &options, anchor.as_ref())?.to_string()])
        }
        Command::Diff {
            from,
            to,
            largest_unit,
            smallest_unit,
            increment,
            mode,
            since,
            kind,
        } => {
            let from = Value::parse(from, *kind)?;
            let to = Value::parse(to, from.kind())?;
            let options = DifferenceOptions {
                largest_unit: *largest_unit,
                smallest_unit: *smallest_unit,
                rounding_increment: *increment,
                rounding_mode: *mode,
            };
            Ok(vec![diff(&from, &to, &options, *since)?.to_string()])
        }
        Command::Add {
            value,
            duration,
            subtract,
            overflow,
            relative_to: anchor,
            kind,
        } => {
            let value = Value::parse(value, *kind)?;
            let mut duration: Duration = duration.parse()?;
            if *subtract {
                duration = duration.negated();
            }
            let anchor = relative_to(anchor.as_deref())?;
            Ok(vec![add(&value, &duration, *overflow, anchor.as_ref())?.to_string()])
        }
        Command::Resolve {
            date_time,
            disambiguation,
        } => {
            let time_zone = host_time_zone(cli.time_zone.as_deref(), &ChronoTzProvider)?;
            resolve(date_time, &time_zone, *disambiguation)
        }
        Command::Info { value, kind } => {
            let value = Value::parse(value, *kind)?;
            let time_zone = host_time_zone(cli.time_zone.as_deref(), &ChronoTzProvider)?;
            let facts = info(&value, &time_zone)?;
            let width = facts.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            Ok(facts
                .into_iter()
                .map(|(k, v)| format!("{k:<width$}  {v}"))
                .collect())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(&cli) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}
