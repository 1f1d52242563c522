use std::fmt;

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

static RE_CUSTOMER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid regex"));

/// A Google Ads customer ID: ten ASCII digits, no dashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    pub fn parse(raw: &str) -> Result<Self, AdvisorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AdvisorError::InvalidCustomerId(
                "customer ID is required".to_string(),
            ));
        }
        if !RE_CUSTOMER_ID.is_match(trimmed) {
            return Err(AdvisorError::InvalidCustomerId(format!(
                "'{trimmed}' must be a 10-digit number with no dashes"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CustomerId {
    type Error = AdvisorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CustomerId::parse(&value)
    }
}

impl From<CustomerId> for String {
    fn from(value: CustomerId) -> Self {
        value.0
    }
}

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = AdvisorError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AdvisorError> {
        if start > end {
            return Err(AdvisorError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// `[end - days, end]`.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Fills whichever bound is missing: `end` defaults to `today`, `start`
    /// to `days` before `end`. Returns `None` when neither bound is given.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
        days: u32,
    ) -> Result<Option<Self>, AdvisorError> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(s), Some(e)) => DateRange::new(s, e).map(Some),
            (Some(s), None) => DateRange::new(s, today).map(Some),
            (None, Some(e)) => Ok(Some(DateRange::trailing(e, days))),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub customer_id: CustomerId,
    pub date_range: Option<DateRange>,
}

impl ReportRequest {
    pub fn new(customer_id: CustomerId, date_range: Option<DateRange>) -> Self {
        Self {
            customer_id,
            date_range,
        }
    }
}
