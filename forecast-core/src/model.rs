use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{local_date, resolve_offset};

/// An instant expressed at the queried location's UTC offset.
pub type LocalInstant = DateTime<FixedOffset>;

/// Day/night flag reported with each sample (`sys.pod` upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PartOfDay {
    #[default]
    Day,
    Night,
}

impl PartOfDay {
    pub fn from_pod(pod: &str) -> Self {
        if pod.trim().eq_ignore_ascii_case("n") {
            Self::Night
        } else {
            Self::Day
        }
    }
}

/// Short weather condition as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Condition {
    pub id: u32,
    /// Short condition code, e.g. "Rain".
    pub main: String,
    pub description: String,
    /// Provider icon code, e.g. "10d".
    pub icon: String,
}

/// One 3-hour observation/forecast entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Sample {
    /// Provider textual timestamp, `YYYY-MM-DD HH:MM:SS` in UTC.
    pub timestamp: String,
    /// UNIX epoch seconds of the same instant.
    pub epoch: i64,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    pub wind_deg: f64,
    pub wind_gust_mps: f64,
    pub visibility_m: u32,
    pub clouds_pct: u8,
    /// Probability of precipitation, 0.0..=1.0.
    pub pop: f64,
    pub condition: Condition,
    pub part_of_day: PartOfDay,
}

impl Sample {
    /// The sample's instant at the location's offset.
    ///
    /// Uses the textual timestamp; if that cannot be parsed the epoch is used
    /// instead, so a malformed field never fails aggregation.
    pub fn local_instant(&self, location: &Location) -> LocalInstant {
        match local_date(&self.timestamp, location.utc_offset_secs) {
            Ok(instant) => instant,
            Err(err) => {
                tracing::warn!(%err, epoch = self.epoch, "falling back to epoch timestamp");
                self.observed_at().with_timezone(&location.offset())
            }
        }
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.epoch, 0).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Location metadata shared by every sample of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub coord: Coordinates,
    /// Seconds east of UTC; `None` when the provider did not report one.
    pub utc_offset_secs: Option<i32>,
    pub sunrise: i64,
    pub sunset: i64,
    pub population: u64,
}

impl Location {
    pub fn offset(&self) -> FixedOffset {
        resolve_offset(self.utc_offset_secs)
    }

    pub fn sunrise_local(&self) -> Option<LocalInstant> {
        self.at_offset(self.sunrise)
    }

    pub fn sunset_local(&self) -> Option<LocalInstant> {
        self.at_offset(self.sunset)
    }

    /// "Name, CC", or just the name when no country was reported.
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }

    fn at_offset(&self, ts: i64) -> Option<LocalInstant> {
        DateTime::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&self.offset()))
    }
}

/// The full response of one forecast query, replaced wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    location: Location,
    samples: Vec<Sample>,
}

impl ForecastSeries {
    /// `samples` must already be in ascending timestamp order.
    pub fn new(location: Location, samples: Vec<Sample>) -> Self {
        Self { location, samples }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Per-day aggregate for the multi-day outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Condition of the first sample of the day.
    pub condition: Condition,
    pub min_c: f64,
    pub max_c: f64,
    // Location-level values, carried for rendering.
    pub sunrise: i64,
    pub sunset: i64,
}

impl DaySummary {
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
