use serde::{Deserialize, Serialize};

/// One campaign's counters for the requested window. `cost` is in currency
/// units, already converted from micros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRow {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost: f64,
}

/// One keyword within an ad group. Rows with zero impressions never reach
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRow {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub ad_group_id: i64,
    pub keyword_text: String,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    #[serde(flatten)]
    pub row: CampaignRow,
    /// `+inf` when the campaign has no conversions; written as `null`.
    #[serde(with = "unbounded_as_null")]
    pub cpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    #[serde(flatten)]
    pub row: KeywordRow,
    pub ctr: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
    HighCpaCampaign,
    LowCtrKeyword,
    TopConvertingKeyword,
    BudgetAllocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rule: Rule,
    pub message: String,
}

impl Recommendation {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

mod unbounded_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_some(v)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
    }
}
