use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a single report request.
///
/// Row-level problems never end up here; they are `DecodeError`s and are
/// absorbed by the loader.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV read error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("unrecognised energy header: {0}")]
    Layout(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Bad request parameters, caught before any aggregation runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("end date {} is before start date {}", end.format("%d.%m.%Y"), start.format("%d.%m.%Y"))]
    ReversedRange { start: NaiveDate, end: NaiveDate },

    #[error("month must be between 1 and 12, got {0}")]
    MonthOutOfRange(u32),

    #[error("invalid date '{0}', expected dd.mm.yyyy")]
    BadDate(String),

    #[error("invalid month '{0}', expected a number")]
    BadMonth(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("delimiter {0:?} is not a single-byte character")]
    Delimiter(char),
}

pub type Result<T> = std::result::Result<T, ReportError>;
