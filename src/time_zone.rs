//! Time zone resolution: offsets, candidate instants for a wall-clock
//! time, disambiguation and offset reconciliation.
//!
//! Zone data comes from a [`TimeZoneProvider`]; [`ChronoTzProvider`] answers
//! from the IANA database compiled into `chrono-tz`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, MappedLocalTime, Offset, TimeZone as _, Utc};
use chrono_tz::{TZ_VARIANTS, Tz};
use tracing::{debug, trace};

use crate::error::{TemporalError, TemporalResult};
use crate::iso::{IsoDate, IsoDateTime, IsoTime, NS_MAX_INSTANT, NS_MIN_INSTANT};
use crate::format::format_iso_date_time;
use crate::options::{
    Disambiguation, NS_PER_DAY, NS_PER_HOUR, NS_PER_MIN, NS_PER_SEC, OffsetOption, Precision, RoundingMode,
};
use crate::parser::{parse_date_time_string, parse_offset_string};
use crate::rounding::round_i128_to_increment;

/// Source of time zone rules.
///
/// Ids handed to a provider are already canonical names; fixed offsets
/// never reach it.
pub trait TimeZoneProvider {
    /// Canonical spelling of a zone name, or a RangeError if unknown.
    fn canonicalize(&self, id: &str) -> TemporalResult<String>;

    /// UTC offset in effect at an instant.
    fn offset_nanoseconds(&self, id: &str, epoch_ns: i128) -> TemporalResult<i64>;

    /// Every instant whose local wall-clock reading is `local_ns`, sorted.
    /// Empty in a gap, two entries in an overlap.
    fn possible_epoch_nanoseconds(&self, id: &str, local_ns: i128) -> TemporalResult<Vec<i128>>;

    /// First offset change strictly after `epoch_ns`.
    fn next_transition(&self, id: &str, epoch_ns: i128) -> TemporalResult<Option<i128>>;

    /// Last offset change strictly before `epoch_ns`.
    fn previous_transition(&self, id: &str, epoch_ns: i128) -> TemporalResult<Option<i128>>;
}

/// Offset changes are only searched for between these years; outside them
/// the compiled tables hold a single offset per zone.
const TRANSITION_SCAN_START_NS: i128 = -5_364_662_400 * NS_PER_SEC; // 1800-01-01
const TRANSITION_SCAN_END_NS: i128 = 7_258_118_400 * NS_PER_SEC; // 2200-01-01
/// The walk checks every day this close to its starting point.
const TRANSITION_FINE_WINDOW_NS: i128 = 90 * NS_PER_DAY;
/// Further out it checks every 16 days. Round trips such as a Ramadan
/// suspension of summer time last several weeks.
const TRANSITION_COARSE_STEP_NS: i128 = 16 * NS_PER_DAY;

/// Narrow `[lo, hi]` (whole seconds, offsets differ at the ends) down to the
/// first second whose offset differs from the one at `lo`.
fn find_transition(offset_at: &impl Fn(i64) -> i64, lo_ns: i128, hi_ns: i128) -> i128 {
    let mut lo = lo_ns.div_euclid(NS_PER_SEC) as i64;
    let mut hi = hi_ns.div_euclid(NS_PER_SEC) as i64;
    let lo_offset = offset_at(lo);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if offset_at(mid) == lo_offset {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi as i128 * NS_PER_SEC
}

/// Walk from `from` towards `limit` (both whole seconds) and return the
/// offset change nearest to `from`. Days are checked one at a time inside
/// the fine window; a coarse step whose ends disagree is rescanned day by
/// day before the exact second is searched for.
fn scan_for_transition(offset_at: &impl Fn(i64) -> i64, from: i128, limit: i128) -> Option<i128> {
    let forward = limit >= from;
    let toward = |at: i128, step: i128| {
        if forward { (at + step).min(limit) } else { (at - step).max(limit) }
    };
    let offset_of = |at: i128| offset_at(at.div_euclid(NS_PER_SEC) as i64);
    let bracket = |a: i128, b: i128| {
        if forward { find_transition(offset_at, a, b) } else { find_transition(offset_at, b, a) }
    };

    let mut here = from;
    let mut here_offset = offset_of(here);
    while here != limit {
        let fine = (here - from).abs() < TRANSITION_FINE_WINDOW_NS;
        let step = if fine { NS_PER_DAY } else { TRANSITION_COARSE_STEP_NS };
        let there = toward(here, step);
        let there_offset = offset_of(there);
        if there_offset != here_offset {
            let mut day = here;
            let mut day_offset = here_offset;
            while day != there {
                let next_day = if forward {
                    (day + NS_PER_DAY).min(there)
                } else {
                    (day - NS_PER_DAY).max(there)
                };
                let next_offset = offset_of(next_day);
                if next_offset != day_offset {
                    return Some(bracket(day, next_day));
                }
                day = next_day;
                day_offset = next_offset;
            }
        }
        here = there;
        here_offset = there_offset;
    }
    None
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTzProvider;

impl ChronoTzProvider {
    fn zone(id: &str) -> TemporalResult<Tz> {
        id.parse::<Tz>()
            .map_err(|_| TemporalError::range(format!("unknown time zone {id}")))
    }

    fn offset_seconds_at(tz: &Tz, epoch_seconds: i64) -> i64 {
        let clamped = epoch_seconds.clamp(
            DateTime::<Utc>::MIN_UTC.timestamp(),
            DateTime::<Utc>::MAX_UTC.timestamp(),
        );
        let utc = DateTime::from_timestamp(clamped, 0).unwrap_or_default();
        tz.offset_from_utc_datetime(&utc.naive_utc()).fix().local_minus_utc() as i64
    }
}

impl TimeZoneProvider for ChronoTzProvider {
    fn canonicalize(&self, id: &str) -> TemporalResult<String> {
        if let Ok(tz) = id.parse::<Tz>() {
            return Ok(tz.name().to_string());
        }
        TZ_VARIANTS
            .iter()
            .find(|tz| tz.name().eq_ignore_ascii_case(id))
            .map(|tz| tz.name().to_string())
            .ok_or_else(|| TemporalError::range(format!("unknown time zone {id}")))
    }

    fn offset_nanoseconds(&self, id: &str, epoch_ns: i128) -> TemporalResult<i64> {
        let tz = Self::zone(id)?;
        let seconds = epoch_ns.div_euclid(NS_PER_SEC) as i64;
        Ok(Self::offset_seconds_at(&tz, seconds) * NS_PER_SEC as i64)
    }

    fn possible_epoch_nanoseconds(&self, id: &str, local_ns: i128) -> TemporalResult<Vec<i128>> {
        let tz = Self::zone(id)?;
        let seconds = local_ns.div_euclid(NS_PER_SEC) as i64;
        let nanos = local_ns.rem_euclid(NS_PER_SEC) as u32;
        let Some(naive) = DateTime::from_timestamp(seconds, nanos).map(|dt| dt.naive_utc()) else {
            // Beyond chrono's range a zone keeps its outermost offset.
            let offset = Self::offset_seconds_at(&tz, seconds) as i128 * NS_PER_SEC;
            return Ok(vec![local_ns - offset]);
        };
        let to_epoch = |offset_seconds: i32| local_ns - offset_seconds as i128 * NS_PER_SEC;
        Ok(match tz.from_local_datetime(&naive) {
            MappedLocalTime::Single(dt) => vec![to_epoch(dt.offset().fix().local_minus_utc())],
            MappedLocalTime::Ambiguous(a, b) => {
                let mut found = vec![
                    to_epoch(a.offset().fix().local_minus_utc()),
                    to_epoch(b.offset().fix().local_minus_utc()),
                ];
                found.sort_unstable();
                found.dedup();
                found
            }
            MappedLocalTime::None => Vec::new(),
        })
    }

    fn next_transition(&self, id: &str, epoch_ns: i128) -> TemporalResult<Option<i128>> {
        let tz = Self::zone(id)?;
        let from = (epoch_ns.div_euclid(NS_PER_SEC) * NS_PER_SEC).max(TRANSITION_SCAN_START_NS);
        if from >= TRANSITION_SCAN_END_NS {
            return Ok(None);
        }
        let offset_at = |seconds: i64| Self::offset_seconds_at(&tz, seconds);
        Ok(scan_for_transition(&offset_at, from, TRANSITION_SCAN_END_NS))
    }

    fn previous_transition(&self, id: &str, epoch_ns: i128) -> TemporalResult<Option<i128>> {
        let tz = Self::zone(id)?;
        let from = ((epoch_ns - 1).div_euclid(NS_PER_SEC) * NS_PER_SEC).min(TRANSITION_SCAN_END_NS);
        if from <= TRANSITION_SCAN_START_NS {
            return Ok(None);
        }
        let offset_at = |seconds: i64| Self::offset_seconds_at(&tz, seconds);
        Ok(scan_for_transition(&offset_at, from, TRANSITION_SCAN_START_NS))
    }
}

/// A time zone: a named IANA zone (including `UTC`) or a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeZone {
    Named(String),
    /// Offset in nanoseconds east of UTC.
    Fixed(i64),
}

impl TimeZone {
    pub fn utc() -> Self {
        TimeZone::Named("UTC".to_string())
    }

    /// Resolve a bare identifier: an offset, `UTC` or an IANA name.
    pub fn from_identifier(id: &str, provider: &dyn TimeZoneProvider) -> TemporalResult<Self> {
        if id.starts_with(['+', '-', '\u{2212}']) {
            return Ok(TimeZone::Fixed(parse_offset_string(id)?.nanoseconds));
        }
        if id.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }
        Ok(TimeZone::Named(provider.canonicalize(id)?))
    }

    /// Resolve an identifier or an ISO string. For ISO strings the bracketed
    /// annotation wins, then `Z`, then the numeric offset.
    pub fn from_string(s: &str, provider: &dyn TimeZoneProvider) -> TemporalResult<Self> {
        if let Ok(tz) = Self::from_identifier(s, provider) {
            return Ok(tz);
        }
        let parsed = parse_date_time_string(s)
            .map_err(|_| TemporalError::range(format!("invalid time zone: {s}")))?;
        match (parsed.time_zone, parsed.utc_designator, parsed.offset) {
            (Some(annotation), _, _) => Self::from_identifier(&annotation, provider),
            (None, true, _) => Ok(Self::utc()),
            (None, false, Some(offset)) => Ok(TimeZone::Fixed(offset.nanoseconds)),
            _ => Err(TemporalError::range(format!("{s} does not name a time zone"))),
        }
    }

    pub fn identifier(&self) -> String {
        match self {
            TimeZone::Named(name) => name.clone(),
            TimeZone::Fixed(ns) => format_offset(*ns),
        }
    }

    pub fn is_utc(&self) -> bool {
        matches!(self, TimeZone::Named(name) if name == "UTC")
    }

    pub fn offset_nanoseconds_for(&self, epoch_ns: i128, provider: &dyn TimeZoneProvider) -> TemporalResult<i64> {
        match self {
            TimeZone::Fixed(ns) => Ok(*ns),
            _ if self.is_utc() => Ok(0),
            TimeZone::Named(name) => provider.offset_nanoseconds(name, epoch_ns),
        }
    }

    /// The wall-clock reading at an instant.
    pub fn date_time_for(&self, epoch_ns: i128, provider: &dyn TimeZoneProvider) -> TemporalResult<IsoDateTime> {
        let offset = self.offset_nanoseconds_for(epoch_ns, provider)?;
        Ok(IsoDateTime::from_local_nanoseconds(epoch_ns + offset as i128))
    }

    /// Candidate instants for a wall-clock reading, each checked against the
    /// instant range.
    pub fn possible_epoch_nanoseconds(
        &self,
        date_time: &IsoDateTime,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Vec<i128>> {
        let local = date_time.to_local_nanoseconds();
        let candidates = match self {
            TimeZone::Fixed(ns) => vec![local - *ns as i128],
            _ if self.is_utc() => vec![local],
            TimeZone::Named(name) => provider.possible_epoch_nanoseconds(name, local)?,
        };
        for candidate in &candidates {
            check_epoch_nanoseconds(*candidate)?;
        }
        Ok(candidates)
    }

    /// Pick one instant for a wall-clock reading.
    pub fn epoch_nanoseconds_for(
        &self,
        date_time: &IsoDateTime,
        disambiguation: Disambiguation,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<i128> {
        let candidates = self.possible_epoch_nanoseconds(date_time, provider)?;
        self.disambiguate(&candidates, date_time, disambiguation, provider)
    }

    /// Choose among the candidates. In a gap the reading is shifted by the
    /// size of the gap (backward for `earlier`, forward otherwise) and
    /// resolved again.
    pub fn disambiguate(
        &self,
        candidates: &[i128],
        date_time: &IsoDateTime,
        disambiguation: Disambiguation,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<i128> {
        match (candidates, disambiguation) {
            ([only], _) => return Ok(*only),
            ([first, ..], Disambiguation::Compatible | Disambiguation::Earlier) => return Ok(*first),
            ([.., last], Disambiguation::Later) => return Ok(*last),
            ([_, _, ..], Disambiguation::Reject) => {
                return Err(TemporalError::range(format!(
                    "{} is ambiguous in {}",
                    format_iso_date_time(date_time, Precision::Digits(0)),
                    self.identifier()
                )));
            }
            _ => {}
        }
        if disambiguation == Disambiguation::Reject {
            return Err(TemporalError::range(format!(
                "{} does not exist in {}",
                format_iso_date_time(date_time, Precision::Digits(0)),
                self.identifier()
            )));
        }

        let local = date_time.to_local_nanoseconds();
        let day_before = local - NS_PER_DAY;
        let day_after = local + NS_PER_DAY;
        check_epoch_nanoseconds(day_before)?;
        check_epoch_nanoseconds(day_after)?;
        let offset_before = self.offset_nanoseconds_for(day_before, provider)? as i128;
        let offset_after = self.offset_nanoseconds_for(day_after, provider)? as i128;
        let gap = offset_after - offset_before;
        debug!(zone = %self.identifier(), gap, "resolving a skipped wall-clock time");

        let shifted = IsoDateTime::from_local_nanoseconds(if disambiguation == Disambiguation::Earlier {
            local - gap
        } else {
            local + gap
        });
        let retry = self.possible_epoch_nanoseconds(&shifted, provider)?;
        let chosen = if disambiguation == Disambiguation::Earlier {
            retry.first()
        } else {
            retry.last()
        };
        chosen
            .copied()
            .ok_or_else(|| TemporalError::range("could not resolve a skipped wall-clock time"))
    }

    /// First instant of a calendar day. When midnight is skipped this is the
    /// transition that skipped it.
    pub fn start_of_day(&self, date: IsoDate, provider: &dyn TimeZoneProvider) -> TemporalResult<i128> {
        let midnight = IsoDateTime::new_unchecked(date, IsoTime::MIDNIGHT);
        let candidates = self.possible_epoch_nanoseconds(&midnight, provider)?;
        if let Some(first) = candidates.first() {
            return Ok(*first);
        }
        let before = midnight.to_local_nanoseconds() - NS_PER_DAY;
        let offset = self.offset_nanoseconds_for(before, provider)? as i128;
        let local = midnight.to_local_nanoseconds();
        match self.next_transition(local - offset - NS_PER_DAY, provider)? {
            Some(transition) => Ok(transition),
            None => Err(TemporalError::range("no start of day found")),
        }
    }

    pub fn next_transition(&self, epoch_ns: i128, provider: &dyn TimeZoneProvider) -> TemporalResult<Option<i128>> {
        match self {
            TimeZone::Named(name) if !self.is_utc() => provider.next_transition(name, epoch_ns),
            _ => Ok(None),
        }
    }

    pub fn previous_transition(
        &self,
        epoch_ns: i128,
        provider: &dyn TimeZoneProvider,
    ) -> TemporalResult<Option<i128>> {
        match self {
            TimeZone::Named(name) if !self.is_utc() => provider.previous_transition(name, epoch_ns),
            _ => Ok(None),
        }
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

impl FromStr for TimeZone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeZone::from_string(s, &ChronoTzProvider)
    }
}

pub(crate) fn check_epoch_nanoseconds(ns: i128) -> TemporalResult<()> {
    if !(NS_MIN_INSTANT..=NS_MAX_INSTANT).contains(&ns) {
        return Err(TemporalError::range("instant is outside the representable range"));
    }
    Ok(())
}

/// `±HH:MM`, extended with `:SS` and a trimmed fraction when present.
pub fn format_offset(offset_ns: i64) -> String {
    let sign = if offset_ns < 0 { '-' } else { '+' };
    let abs = (offset_ns as i128).abs();
    let hours = abs / NS_PER_HOUR;
    let minutes = abs % NS_PER_HOUR / NS_PER_MIN;
    let seconds = abs % NS_PER_MIN / NS_PER_SEC;
    let fraction = abs % NS_PER_SEC;
    let mut out = format!("{sign}{hours:02}:{minutes:02}");
    if seconds != 0 || fraction != 0 {
        out.push_str(&format!(":{seconds:02}"));
        if fraction != 0 {
            out.push('.');
            out.push_str(format!("{fraction:09}").trim_end_matches('0'));
        }
    }
    out
}

/// `±HH:MM` after rounding the offset to the nearest minute.
pub fn format_offset_rounded(offset_ns: i64) -> String {
    let rounded = round_i128_to_increment(
        offset_ns as i128,
        NS_PER_MIN,
        RoundingMode::HalfExpand,
    );
    format_offset(rounded as i64)
}

/// How a wall-clock reading relates to the offset written next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBehaviour {
    /// An explicit numeric offset.
    Option,
    /// `Z`: the reading is exact UTC time.
    Exact,
    /// No offset at all.
    Wall,
}

/// Turn a wall-clock reading (a missing time means start of day) plus its
/// written offset into an instant, honoring the offset option.
///
/// With `match_minutes` a candidate also matches when its offset rounded to
/// the minute equals the written offset.
#[allow(clippy::too_many_arguments)]
pub fn interpret_iso_date_time_offset(
    date: IsoDate,
    time: Option<IsoTime>,
    behaviour: OffsetBehaviour,
    offset_ns: i64,
    time_zone: &TimeZone,
    disambiguation: Disambiguation,
    offset_option: OffsetOption,
    match_minutes: bool,
    provider: &dyn TimeZoneProvider,
) -> TemporalResult<i128> {
    let Some(time) = time else {
        return time_zone.start_of_day(date, provider);
    };
    let date_time = IsoDateTime::new(date, time)?;
    if behaviour == OffsetBehaviour::Wall || offset_option == OffsetOption::Ignore {
        return time_zone.epoch_nanoseconds_for(&date_time, disambiguation, provider);
    }
    if behaviour == OffsetBehaviour::Exact || offset_option == OffsetOption::Use {
        let epoch = date_time.to_local_nanoseconds() - offset_ns as i128;
        check_epoch_nanoseconds(epoch)?;
        return Ok(epoch);
    }

    let candidates = time_zone.possible_epoch_nanoseconds(&date_time, provider)?;
    for candidate in &candidates {
        let candidate_offset = time_zone.offset_nanoseconds_for(*candidate, provider)?;
        if candidate_offset == offset_ns {
            return Ok(*candidate);
        }
        if match_minutes {
            let rounded =
                round_i128_to_increment(candidate_offset as i128, NS_PER_MIN, RoundingMode::HalfExpand);
            if rounded == offset_ns as i128 {
                return Ok(*candidate);
            }
        }
    }
    trace!(offset_ns, ?offset_option, "written offset matches no candidate");
    if offset_option == OffsetOption::Reject {
        return Err(TemporalError::range(format!(
            "offset {} is invalid for {} in {}",
            format_offset(offset_ns),
            format_iso_date_time(&date_time, Precision::Digits(0)),
            time_zone.identifier()
        )));
    }
    time_zone.disambiguate(&candidates, &date_time, disambiguation, provider)
}
