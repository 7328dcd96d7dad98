use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::model::{Condition, Coordinates, ForecastSeries, Location, PartOfDay, Sample};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const FORECAST_PATH: &str = "/data/2.5/forecast";

/// Client for the OpenWeather 3-hour / 5-day forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn forecast_url(&self) -> String {
        format!("{}{}", self.base_url, FORECAST_PATH)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_forecast(&self, place: &str) -> Result<ForecastSeries> {
        tracing::debug!(place, "requesting OpenWeather forecast");

        let res = self
            .http
            .get(self.forecast_url())
            .query(&[
                ("q", place),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (5-day forecast)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")?;

        let series = parsed.into_series();
        tracing::debug!(
            place,
            samples = series.len(),
            location = %series.location().display_name(),
            "received OpenWeather forecast"
        );

        Ok(series)
    }
}

// Wire types. Every field is optional and lenient: missing, null or wrongly
// typed values become zero or empty rather than failing the whole response.

/// Deserialize any JSON value, keeping it only if it has the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    #[serde(deserialize_with = "lenient")]
    temp: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    feels_like: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    temp_min: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    temp_max: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pressure: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    #[serde(deserialize_with = "lenient")]
    id: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    main: Option<String>,
    #[serde(deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    #[serde(deserialize_with = "lenient")]
    speed: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    deg: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    gust: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwClouds {
    #[serde(deserialize_with = "lenient")]
    all: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    #[serde(deserialize_with = "lenient")]
    pod: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastEntry {
    #[serde(deserialize_with = "lenient")]
    dt: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    dt_txt: Option<String>,
    #[serde(deserialize_with = "lenient")]
    main: Option<OwMain>,
    #[serde(deserialize_with = "lenient")]
    weather: Option<Vec<OwWeather>>,
    #[serde(deserialize_with = "lenient")]
    clouds: Option<OwClouds>,
    #[serde(deserialize_with = "lenient")]
    wind: Option<OwWind>,
    #[serde(deserialize_with = "lenient")]
    visibility: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pop: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    sys: Option<OwSys>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCoord {
    #[serde(deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCity {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    country: Option<String>,
    #[serde(deserialize_with = "lenient")]
    coord: Option<OwCoord>,
    #[serde(deserialize_with = "lenient")]
    population: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    timezone: Option<i32>,
    #[serde(deserialize_with = "lenient")]
    sunrise: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    sunset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastResponse {
    #[serde(deserialize_with = "lenient")]
    list: Option<Vec<OwForecastEntry>>,
    #[serde(deserialize_with = "lenient")]
    city: Option<OwCity>,
}

impl OwForecastResponse {
    fn into_series(self) -> ForecastSeries {
        let location = self.city.unwrap_or_default().into();
        let samples = self
            .list
            .unwrap_or_default()
            .into_iter()
            .map(Sample::from)
            .collect();
        ForecastSeries::new(location, samples)
    }
}

impl From<OwCity> for Location {
    fn from(city: OwCity) -> Self {
        let coord = city.coord.unwrap_or_default();
        Location {
            name: city.name.unwrap_or_default(),
            country: city.country.unwrap_or_default(),
            coord: Coordinates {
                lat: coord.lat.unwrap_or_default(),
                lon: coord.lon.unwrap_or_default(),
            },
            utc_offset_secs: city.timezone,
            sunrise: city.sunrise.unwrap_or_default(),
            sunset: city.sunset.unwrap_or_default(),
            population: city.population.unwrap_or_default(),
        }
    }
}

impl From<OwForecastEntry> for Sample {
    fn from(entry: OwForecastEntry) -> Self {
        let main = entry.main.unwrap_or_default();
        let wind = entry.wind.unwrap_or_default();
        let condition = entry
            .weather
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(Condition::from)
            .unwrap_or_default();
        let pod = entry.sys.unwrap_or_default().pod.unwrap_or_default();

        Sample {
            timestamp: entry.dt_txt.unwrap_or_default(),
            epoch: entry.dt.unwrap_or_default(),
            temp_c: main.temp.unwrap_or_default(),
            feels_like_c: main.feels_like.unwrap_or_default(),
            temp_min_c: main.temp_min.unwrap_or_default(),
            temp_max_c: main.temp_max.unwrap_or_default(),
            humidity_pct: percent(main.humidity),
            pressure_hpa: main.pressure.unwrap_or_default(),
            wind_speed_mps: wind.speed.unwrap_or_default(),
            wind_deg: wind.deg.unwrap_or_default(),
            wind_gust_mps: wind.gust.unwrap_or_default(),
            visibility_m: entry.visibility.unwrap_or_default().max(0.0) as u32,
            clouds_pct: percent(entry.clouds.unwrap_or_default().all),
            pop: entry.pop.unwrap_or_default(),
            condition,
            part_of_day: PartOfDay::from_pod(&pod),
        }
    }
}

impl From<OwWeather> for Condition {
    fn from(w: OwWeather) -> Self {
        Condition {
            id: w.id.unwrap_or_default(),
            main: w.main.unwrap_or_default(),
            description: w.description.unwrap_or_default(),
            icon: w.icon.unwrap_or_default(),
        }
    }
}

fn percent(value: Option<f64>) -> u8 {
    value.unwrap_or_default().round().clamp(0.0, 100.0) as u8
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
