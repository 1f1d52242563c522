use serde::{Deserialize, Serialize};

use crate::{
    metrics::AccountTotals,
    request::{DateRange, ReportRequest},
    rules::format_count,
    types::{CampaignMetrics, KeywordMetrics, Recommendation},
};

pub const REPORT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_version: String,
    pub inputs: Inputs,
    pub totals: AccountTotals,
    pub campaigns: Vec<CampaignMetrics>,
    pub keywords: Vec<KeywordMetrics>,
    pub recommendations: Vec<Recommendation>,
}

/// `date_range` is the window the rows actually cover, which for a snapshot
/// may be known even when the request left it open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inputs {
    pub customer_id: String,
    pub date_range: Option<DateRange>,
    pub source: String,
}

impl Inputs {
    pub fn new(request: &ReportRequest, date_range: Option<DateRange>, source: String) -> Self {
        Self {
            customer_id: request.customer_id.to_string(),
            date_range,
            source,
        }
    }
}

impl Report {
    pub fn new(
        inputs: Inputs,
        campaigns: Vec<CampaignMetrics>,
        keywords: Vec<KeywordMetrics>,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            report_version: REPORT_VERSION.to_string(),
            inputs,
            totals: AccountTotals::from_campaigns(&campaigns),
            campaigns,
            keywords,
            recommendations,
        }
    }

    pub fn recommendation_lines(&self) -> Vec<&str> {
        self.recommendations
            .iter()
            .map(|r| r.message.as_str())
            .collect()
    }

    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# semadvisor report\n\n");
        s.push_str(&format!("- report_version: `{}`\n", self.report_version));
        s.push_str(&format!("- customer_id: `{}`\n", self.inputs.customer_id));
        match &self.inputs.date_range {
            Some(r) => s.push_str(&format!("- date_range: `{} .. {}`\n", r.start(), r.end())),
            None => s.push_str("- date_range: `all time`\n"),
        }
        s.push_str(&format!("- source: `{}`\n", self.inputs.source));
        s.push('\n');

        s.push_str("## Totals\n\n");
        s.push_str(&format!("- impressions: `{}`\n", self.totals.impressions));
        s.push_str(&format!("- clicks: `{}`\n", self.totals.clicks));
        s.push_str(&format!(
            "- conversions: `{}`\n",
            format_count(self.totals.conversions)
        ));
        s.push_str(&format!("- cost: `${:.2}`\n", self.totals.cost));
        s.push_str(&format!(
            "- ctr: `{}`\n",
            self.totals
                .ctr
                .map(|v| format!("{:.1}%", v * 100.0))
                .unwrap_or_else(|| "n/a".to_string())
        ));
        s.push_str(&format!(
            "- cpa: `{}`\n",
            self.totals
                .cpa
                .map(|v| format!("${v:.2}"))
                .unwrap_or_else(|| "n/a".to_string())
        ));
        s.push('\n');

        s.push_str("## Campaigns\n\n");
        s.push_str("| ID | Campaign | Impressions | Clicks | Conversions | Cost | CPA |\n");
        s.push_str("|---:|---|---:|---:|---:|---:|---:|\n");
        for c in &self.campaigns {
            s.push_str(&format!(
                "| {} | {} | {} | {} | {} | ${:.2} | {} |\n",
                c.row.campaign_id,
                escape_cell(&c.row.campaign_name),
                c.row.impressions,
                c.row.clicks,
                format_count(c.row.conversions),
                c.row.cost,
                format_cpa(c.cpa)
            ));
        }
        s.push('\n');

        s.push_str("## Keywords\n\n");
        s.push_str("| Campaign | Ad group | Keyword | Impressions | Clicks | CTR | Conversions | Cost |\n");
        s.push_str("|---|---:|---|---:|---:|---:|---:|---:|\n");
        for k in &self.keywords {
            s.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.1}% | {} | ${:.2} |\n",
                escape_cell(&k.row.campaign_name),
                k.row.ad_group_id,
                escape_cell(&k.row.keyword_text),
                k.row.impressions,
                k.row.clicks,
                k.ctr * 100.0,
                format_count(k.row.conversions),
                k.row.cost
            ));
        }
        s.push('\n');

        s.push_str("## Recommendations\n\n");
        if self.recommendations.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for r in &self.recommendations {
                s.push_str(&format!("- {}\n", r.message));
            }
        }

        s
    }
}

pub fn format_cpa(cpa: f64) -> String {
    if cpa.is_finite() {
        format!("${cpa:.2}")
    } else {
        "\u{221e}".to_string()
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
