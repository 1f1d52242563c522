use crate::{
    error::{AdvisorError, Table},
    metrics::mean,
    types::{CampaignMetrics, KeywordMetrics, Recommendation, Rule},
};

pub const LOW_CTR_LIMIT: usize = 5;
pub const TOP_KEYWORD_LIMIT: usize = 5;
pub const TOP_CAMPAIGN_LIMIT: usize = 3;

/// Runs the four rule blocks in fixed order. Both tables must be non-empty.
pub fn generate_recommendations(
    campaigns: &[CampaignMetrics],
    keywords: &[KeywordMetrics],
) -> Result<Vec<Recommendation>, AdvisorError> {
    let mut recs = Vec::new();

    for c in high_cpa_campaigns(campaigns)? {
        recs.push(Recommendation::new(
            Rule::HighCpaCampaign,
            format!(
                "Campaign '{}' has high CPA (${:.2}). Consider lowering bids or refining targeting.",
                c.row.campaign_name, c.cpa
            ),
        ));
    }

    for k in low_ctr_keywords(keywords)? {
        recs.push(Recommendation::new(
            Rule::LowCtrKeyword,
            format!(
                "Keyword '{}' in '{}' has low CTR ({:.1}%). Consider pausing, refining match type, or optimizing ad copy.",
                k.row.keyword_text,
                k.row.campaign_name,
                k.ctr * 100.0
            ),
        ));
    }

    for k in top_converting_keywords(keywords, TOP_KEYWORD_LIMIT) {
        recs.push(Recommendation::new(
            Rule::TopConvertingKeyword,
            format!(
                "Keyword '{}' in '{}' drives {} conversions. Consider increasing bids to capture more volume.",
                k.row.keyword_text,
                k.row.campaign_name,
                format_count(k.row.conversions)
            ),
        ));
    }

    recs.push(Recommendation::new(
        Rule::BudgetAllocation,
        format!("Top {TOP_CAMPAIGN_LIMIT} campaigns by conversions:"),
    ));
    for c in top_campaigns_by_conversions(campaigns, TOP_CAMPAIGN_LIMIT) {
        recs.push(Recommendation::new(
            Rule::BudgetAllocation,
            format!(
                "  \u{2022} {}: {} conv, ${:.2} spent",
                c.row.campaign_name,
                format_count(c.row.conversions),
                c.row.cost
            ),
        ));
    }

    Ok(recs)
}

/// Campaigns whose CPA is strictly above the table mean, in table order.
/// A single zero-conversion campaign makes the mean infinite, which selects
/// nothing.
pub fn high_cpa_campaigns(
    campaigns: &[CampaignMetrics],
) -> Result<Vec<&CampaignMetrics>, AdvisorError> {
    let mean_cpa = mean(campaigns.iter().map(|c| c.cpa)).ok_or(AdvisorError::InsufficientData {
        table: Table::Campaigns,
    })?;
    Ok(campaigns.iter().filter(|c| c.cpa > mean_cpa).collect())
}

/// Up to five keywords with CTR strictly below the table mean, lowest first.
pub fn low_ctr_keywords(keywords: &[KeywordMetrics]) -> Result<Vec<&KeywordMetrics>, AdvisorError> {
    let mean_ctr = mean(keywords.iter().map(|k| k.ctr)).ok_or(AdvisorError::InsufficientData {
        table: Table::Keywords,
    })?;
    let mut low: Vec<&KeywordMetrics> = keywords.iter().filter(|k| k.ctr < mean_ctr).collect();
    low.sort_by(|a, b| a.ctr.total_cmp(&b.ctr));
    low.truncate(LOW_CTR_LIMIT);
    Ok(low)
}

pub fn top_converting_keywords(keywords: &[KeywordMetrics], limit: usize) -> Vec<&KeywordMetrics> {
    let mut ranked: Vec<&KeywordMetrics> = keywords.iter().collect();
    ranked.sort_by(|a, b| b.row.conversions.total_cmp(&a.row.conversions));
    ranked.truncate(limit);
    ranked
}

pub fn top_campaigns_by_conversions(
    campaigns: &[CampaignMetrics],
    limit: usize,
) -> Vec<&CampaignMetrics> {
    let mut ranked: Vec<&CampaignMetrics> = campaigns.iter().collect();
    ranked.sort_by(|a, b| b.row.conversions.total_cmp(&a.row.conversions));
    ranked.truncate(limit);
    ranked
}

/// Raw conversion count as the API reports it: `30` for whole values,
/// `12.345678` or `0.004` for modelled ones.
pub fn format_count(v: f64) -> String {
    v.to_string()
}
