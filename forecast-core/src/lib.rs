//! Core library for the `forecast` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather forecast client and a query-scoped cache in front of it
//! - Shared domain models (samples, locations, day summaries)
//! - Aggregation of a 3-hour series into current conditions, a same-day
//!   strip and a multi-day outlook
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod query;

pub use aggregate::{CurrentPolicy, Dashboard};
pub use config::Config;
pub use error::{AggregateError, QueryError};
pub use model::{Condition, DaySummary, ForecastSeries, LocalInstant, Location, PartOfDay, Sample};
pub use provider::{ForecastProvider, provider_from_config};
pub use query::ForecastQuery;
