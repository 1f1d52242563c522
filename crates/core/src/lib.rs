pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod request;
pub mod rules;
pub mod source;
pub mod types;

use tracing::info;

use crate::{
    error::AdvisorError,
    metrics::{derive_campaign_metrics, derive_keyword_metrics},
    report::{Inputs, Report},
    request::ReportRequest,
    rules::generate_recommendations,
    source::AdsDataSource,
};

pub use crate::error::{FetchError, Table};
pub use crate::request::{CustomerId, DateRange};

/// Fetch, derive, recommend. The request is expected to be validated already;
/// the source is whatever the caller constructed (live client or snapshot).
pub fn advise(source: &dyn AdsDataSource, request: &ReportRequest) -> Result<Report, AdvisorError> {
    let campaigns = source.fetch_campaigns(request)?;
    let keywords = source.fetch_keywords(request)?;
    info!(
        customer_id = %request.customer_id,
        campaigns = campaigns.len(),
        keywords = keywords.len(),
        "tables ready"
    );

    let campaigns = derive_campaign_metrics(campaigns);
    let keywords = derive_keyword_metrics(keywords);

    let recommendations = generate_recommendations(&campaigns, &keywords)?;

    let inputs = Inputs::new(request, source.date_range(request), source.describe());
    Ok(Report::new(
        inputs,
        campaigns,
        keywords,
        recommendations,
    ))
}
