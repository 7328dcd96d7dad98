//! Day bucketing and summaries over a [`ForecastSeries`].
//!
//! Everything here is a pure function of the series and an explicit `now`;
//! nothing reads the clock.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::AggregateError,
    model::{DaySummary, ForecastSeries, LocalInstant, Location, Sample},
};

/// Offset used when the provider does not report a valid one (UTC+11).
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 39_600;

/// Local hour on the following day up to which the same-day strip extends.
pub const SLOT_CUTOFF_HOUR: u32 = 6;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// How the "current weather" sample is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrentPolicy {
    /// First sample of the series; the provider starts its list near the present.
    #[default]
    First,
    /// Sample whose epoch is closest to `now`; earlier sample wins ties.
    Nearest,
}

/// Resolve a provider offset, substituting [`DEFAULT_UTC_OFFSET_SECS`] when it
/// is absent or outside ±24h.
pub fn resolve_offset(offset_secs: Option<i32>) -> FixedOffset {
    if let Some(offset) = offset_secs.and_then(FixedOffset::east_opt) {
        return offset;
    }
    if let Some(secs) = offset_secs {
        tracing::warn!(secs, "ignoring out-of-range UTC offset");
    }
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parse a provider timestamp as UTC and express it at the given offset.
pub fn local_date(timestamp: &str, offset_secs: Option<i32>) -> Result<LocalInstant, AggregateError> {
    let utc = parse_utc(timestamp)?;
    Ok(utc.with_timezone(&resolve_offset(offset_secs)))
}

fn parse_utc(text: &str) -> Result<DateTime<Utc>, AggregateError> {
    let trimmed = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AggregateError::InvalidTimestamp(text.to_string()))
}

/// Group samples by location-local calendar date.
///
/// Keys appear in the order their first sample appears; samples keep their
/// series order within a bucket. Every sample lands in exactly one bucket.
pub fn bucket_by_date(series: &ForecastSeries) -> IndexMap<NaiveDate, Vec<&Sample>> {
    let location = series.location();
    let mut buckets: IndexMap<NaiveDate, Vec<&Sample>> = IndexMap::new();

    for sample in series.samples() {
        let date = sample.local_instant(location).date_naive();
        buckets.entry(date).or_default().push(sample);
    }

    buckets
}

/// Summarise one day's samples: first sample's condition, min/max of `temp`.
pub fn summarize_day(
    date: NaiveDate,
    samples: &[&Sample],
    location: &Location,
) -> Result<DaySummary, AggregateError> {
    let first = samples.first().ok_or(AggregateError::EmptyBucket(date))?;

    let (min_c, max_c) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.temp_c), hi.max(s.temp_c))
        });

    Ok(DaySummary {
        date,
        condition: first.condition.clone(),
        min_c,
        max_c,
        sunrise: location.sunrise,
        sunset: location.sunset,
    })
}

/// Summaries for every day after the query date, in series order.
pub fn day_summaries(series: &ForecastSeries) -> Result<Vec<DaySummary>, AggregateError> {
    bucket_by_date(series)
        .iter()
        // The first bucket is the query date; it is shown as current weather.
        .skip(1)
        .map(|(date, samples)| summarize_day(*date, samples, series.location()))
        .collect()
}

pub fn select_current(
    series: &ForecastSeries,
    now: DateTime<Utc>,
    policy: CurrentPolicy,
) -> Option<&Sample> {
    match policy {
        CurrentPolicy::First => series.samples().first(),
        CurrentPolicy::Nearest => {
            let target = now.timestamp();
            series
                .samples()
                .iter()
                .min_by_key(|s| (s.epoch - target).abs())
        }
    }
}

/// Samples for the same-day hourly strip.
///
/// Keeps every sample on today's local date, including ones already in the
/// past, plus samples after `now` up to and including 06:00 local tomorrow.
/// "Today" is taken at the location's offset, not the viewer's.
pub fn select_today_remaining_slots(series: &ForecastSeries, now: DateTime<Utc>) -> Vec<&Sample> {
    let location = series.location();
    let offset = location.offset();
    let now_local = now.with_timezone(&offset);
    let today = now_local.date_naive();

    let cutoff = today
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(SLOT_CUTOFF_HOUR, 0, 0))
        .and_then(|naive| naive.and_local_timezone(offset).single());

    series
        .samples()
        .iter()
        .filter(|sample| {
            let local = sample.local_instant(location);
            local.date_naive() == today
                || cutoff.is_some_and(|cutoff| local > now_local && local <= cutoff)
        })
        .collect()
}

/// Everything the renderer needs for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub location: Location,
    pub current: Sample,
    pub today: Vec<Sample>,
    pub outlook: Vec<DaySummary>,
}

impl Dashboard {
    pub fn build(
        series: &ForecastSeries,
        now: DateTime<Utc>,
        policy: CurrentPolicy,
    ) -> Result<Self, AggregateError> {
        let current = select_current(series, now, policy).ok_or(AggregateError::EmptySeries)?;

        Ok(Self {
            location: series.location().clone(),
            current: current.clone(),
            today: select_today_remaining_slots(series, now)
                .into_iter()
                .cloned()
                .collect(),
            outlook: day_summaries(series)?,
        })
    }
}
