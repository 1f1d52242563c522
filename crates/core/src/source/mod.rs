mod google_ads;
mod snapshot;

use crate::{
    error::FetchError,
    request::{DateRange, ReportRequest},
    types::{CampaignRow, KeywordRow},
};

pub use google_ads::{campaign_query, keyword_query, parse_search_stream, GoogleAdsClient};
pub use snapshot::{AccountSnapshot, RawCampaignRow, RawKeywordRow, SnapshotSource};

pub const MICROS_PER_UNIT: f64 = 1_000_000.0;

pub fn micros_to_currency(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT
}

/// Read-only access to one account's reporting data. Implementations return
/// only non-removed campaigns and keywords with at least one impression.
pub trait AdsDataSource {
    fn fetch_campaigns(&self, request: &ReportRequest) -> Result<Vec<CampaignRow>, FetchError>;

    fn fetch_keywords(&self, request: &ReportRequest) -> Result<Vec<KeywordRow>, FetchError>;

    /// Window the fetched rows cover. Live sources honour the request.
    fn date_range(&self, request: &ReportRequest) -> Option<DateRange> {
        request.date_range
    }

    /// Short label recorded in reports.
    fn describe(&self) -> String;
}
