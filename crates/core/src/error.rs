use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::request::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Campaigns,
    Keywords,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Campaigns => f.write_str("campaign"),
            Table::Keywords => f.write_str("keyword"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("invalid customer ID: {0}")]
    InvalidCustomerId(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("insufficient data: the {table} table is empty")]
    InsufficientData { table: Table },

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

impl AdvisorError {
    /// Errors raised before any data is requested.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdvisorError::InvalidCustomerId(_) | AdvisorError::InvalidDateRange { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("missing credential {0}")]
    MissingCredential(&'static str),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid {table} row '{name}': {reason}")]
    InvalidRow {
        table: Table,
        name: String,
        reason: String,
    },

    #[error("snapshot covers {snapshot}, but {requested} was requested")]
    WindowMismatch {
        snapshot: DateRange,
        requested: DateRange,
    },

    #[error("read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
