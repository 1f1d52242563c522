use serde::{Deserialize, Serialize};

use crate::types::{CampaignMetrics, CampaignRow, KeywordMetrics, KeywordRow};

pub fn cpa(cost: f64, conversions: f64) -> f64 {
    if conversions == 0.0 {
        f64::INFINITY
    } else {
        cost / conversions
    }
}

pub fn ctr(clicks: u64, impressions: u64) -> f64 {
    clicks as f64 / impressions as f64
}

pub fn derive_campaign_metrics(rows: Vec<CampaignRow>) -> Vec<CampaignMetrics> {
    rows.into_iter()
        .map(|row| CampaignMetrics {
            cpa: cpa(row.cost, row.conversions),
            row,
        })
        .collect()
}

pub fn derive_keyword_metrics(rows: Vec<KeywordRow>) -> Vec<KeywordMetrics> {
    rows.into_iter()
        .map(|row| KeywordMetrics {
            ctr: ctr(row.clicks, row.impressions),
            row,
        })
        .collect()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Account-wide sums across the campaign table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost: f64,
    pub ctr: Option<f64>,
    pub cpa: Option<f64>,
}

impl AccountTotals {
    pub fn from_campaigns(campaigns: &[CampaignMetrics]) -> Self {
        let impressions = campaigns.iter().map(|c| c.row.impressions).sum::<u64>();
        let clicks = campaigns.iter().map(|c| c.row.clicks).sum::<u64>();
        let conversions = campaigns.iter().map(|c| c.row.conversions).sum::<f64>();
        let cost = campaigns.iter().map(|c| c.row.cost).sum::<f64>();

        Self {
            impressions,
            clicks,
            conversions,
            cost,
            ctr: (impressions > 0).then(|| ctr(clicks, impressions)),
            cpa: (conversions > 0.0).then(|| cost / conversions),
        }
    }
}
