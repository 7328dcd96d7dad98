//! Query-scoped forecast fetching with last-query-wins semantics.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::{
    cache::{TtlCache, normalize_query_key},
    error::QueryError,
    model::ForecastSeries,
    provider::ForecastProvider,
};

/// Fetches forecasts through a TTL cache keyed by the normalised query.
///
/// Every call to [`ForecastQuery::fetch`] becomes the latest query. A fetch
/// that completes after a newer one has started is discarded and never cached,
/// so stale results cannot be observed.
#[derive(Debug)]
pub struct ForecastQuery {
    provider: Box<dyn ForecastProvider>,
    cache: TtlCache<String, Arc<ForecastSeries>>,
    latest: AtomicU64,
    place: Mutex<Option<String>>,
}

impl ForecastQuery {
    pub fn new(provider: Box<dyn ForecastProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            cache: TtlCache::new(ttl),
            latest: AtomicU64::new(0),
            place: Mutex::new(None),
        }
    }

    pub async fn fetch(&self, place: &str) -> Result<Arc<ForecastSeries>, QueryError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_current_place(place);

        let key = normalize_query_key(place);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(place, "forecast cache hit");
            return Ok(hit);
        }
        tracing::debug!(place, "forecast cache miss");

        let result = self.provider.fetch_forecast(place).await;

        if self.latest.load(Ordering::SeqCst) != ticket {
            tracing::debug!(place, "discarding superseded forecast result");
            return Err(QueryError::Superseded {
                place: place.to_string(),
            });
        }

        let series = Arc::new(result.map_err(QueryError::Fetch)?);
        let removed = self.cache.cleanup();
        if removed > 0 {
            tracing::debug!(removed, "dropped expired forecasts");
        }
        self.cache.insert(key, Arc::clone(&series));
        Ok(series)
    }

    /// The place of the most recently started query.
    pub fn current_place(&self) -> Option<String> {
        self.place
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn invalidate(&self, place: &str) {
        self.cache.remove(&normalize_query_key(place));
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    fn set_current_place(&self, place: &str) {
        *self
            .place
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(place.to_string());
    }
}
