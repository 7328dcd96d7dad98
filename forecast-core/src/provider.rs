use crate::{Config, ForecastSeries, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of a complete forecast series for a free-text location query.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// `place` is forwarded to the upstream API verbatim.
    async fn fetch_forecast(&self, place: &str) -> anyhow::Result<ForecastSeries>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `forecast configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let mut provider = OpenWeatherProvider::new(api_key);
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.as_str());
    }

    Ok(Box::new(provider))
}
