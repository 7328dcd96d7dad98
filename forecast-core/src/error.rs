use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the pure aggregation step.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Forecast response contained no samples")]
    EmptySeries,

    #[error("No samples to summarise for {0}")]
    EmptyBucket(NaiveDate),

    #[error("Unrecognised timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Failures of a cached forecast query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A newer query started before this one finished; its result was dropped.
    #[error("Query for '{place}' was superseded by a newer search")]
    Superseded { place: String },

    #[error(transparent)]
    Fetch(anyhow::Error),
}
