use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{FetchError, Table},
    request::{DateRange, ReportRequest},
    types::{CampaignRow, KeywordRow},
};

use super::{micros_to_currency, AdsDataSource};

/// Campaign row as the reporting API returns it, cost still in micros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCampaignRow {
    pub campaign_id: i64,
    pub campaign_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: f64,
    #[serde(default)]
    pub cost_micros: i64,
}

/// Counters are non-negative and conversions are finite.
fn check_counters(
    table: Table,
    name: &str,
    conversions: f64,
    cost_micros: i64,
) -> Result<(), FetchError> {
    let reason = if !conversions.is_finite() || conversions < 0.0 {
        format!("conversions must be a non-negative number, got {conversions}")
    } else if cost_micros < 0 {
        format!("cost_micros must be non-negative, got {cost_micros}")
    } else {
        return Ok(());
    };
    Err(FetchError::InvalidRow {
        table,
        name: name.to_string(),
        reason,
    })
}

impl RawCampaignRow {
    pub fn validate(&self) -> Result<(), FetchError> {
        check_counters(
            Table::Campaigns,
            &self.campaign_name,
            self.conversions,
            self.cost_micros,
        )
    }

    pub fn is_removed(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("REMOVED"))
    }

    pub fn into_row(self) -> CampaignRow {
        CampaignRow {
            campaign_id: self.campaign_id,
            campaign_name: self.campaign_name,
            impressions: self.impressions,
            clicks: self.clicks,
            conversions: self.conversions,
            cost: micros_to_currency(self.cost_micros),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawKeywordRow {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub ad_group_id: i64,
    pub keyword_text: String,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: f64,
    #[serde(default)]
    pub cost_micros: i64,
}

impl RawKeywordRow {
    pub fn validate(&self) -> Result<(), FetchError> {
        check_counters(
            Table::Keywords,
            &self.keyword_text,
            self.conversions,
            self.cost_micros,
        )
    }

    pub fn into_row(self) -> KeywordRow {
        KeywordRow {
            campaign_id: self.campaign_id,
            campaign_name: self.campaign_name,
            ad_group_id: self.ad_group_id,
            keyword_text: self.keyword_text,
            impressions: self.impressions,
            clicks: self.clicks,
            conversions: self.conversions,
            cost: micros_to_currency(self.cost_micros),
        }
    }
}

/// Both raw tables for one account, as written by `semadvisor fetch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub campaigns: Vec<RawCampaignRow>,
    #[serde(default)]
    pub keywords: Vec<RawKeywordRow>,
}

impl AccountSnapshot {
    pub fn from_json(bytes: &[u8]) -> Result<Self, FetchError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load_json(path: &Path) -> Result<Self, FetchError> {
        let bytes = std::fs::read(path).map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&bytes)
    }
}

/// Offline source replaying a saved [`AccountSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: AccountSnapshot,
    origin: Option<PathBuf>,
}

impl SnapshotSource {
    pub fn new(snapshot: AccountSnapshot) -> Self {
        Self {
            snapshot,
            origin: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let snapshot = AccountSnapshot::load_json(path)?;
        info!(
            path = %path.display(),
            campaigns = snapshot.campaigns.len(),
            keywords = snapshot.keywords.len(),
            "loaded account snapshot"
        );
        Ok(Self {
            snapshot,
            origin: Some(path.to_path_buf()),
        })
    }

    pub fn snapshot(&self) -> &AccountSnapshot {
        &self.snapshot
    }

    fn warn_on_mismatch(&self, request: &ReportRequest) {
        if let Some(id) = &self.snapshot.customer_id {
            if id != request.customer_id.as_str() {
                warn!(
                    snapshot = %id,
                    requested = %request.customer_id,
                    "snapshot was captured for a different customer"
                );
            }
        }
    }

    /// Snapshot rows are pre-aggregated, so a requested window can only be
    /// honoured when it is the one the snapshot was captured for.
    fn check_window(&self, request: &ReportRequest) -> Result<(), FetchError> {
        match (self.snapshot.date_range, request.date_range) {
            (Some(snapshot), Some(requested)) if snapshot != requested => {
                Err(FetchError::WindowMismatch {
                    snapshot,
                    requested,
                })
            }
            (None, Some(requested)) => {
                warn!(
                    requested = %requested,
                    "snapshot has no recorded window; rows are not filtered by date"
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl AdsDataSource for SnapshotSource {
    fn fetch_campaigns(&self, request: &ReportRequest) -> Result<Vec<CampaignRow>, FetchError> {
        self.warn_on_mismatch(request);
        self.check_window(request)?;
        let mut rows = Vec::with_capacity(self.snapshot.campaigns.len());
        for raw in self.snapshot.campaigns.iter().filter(|c| !c.is_removed()) {
            raw.validate()?;
            rows.push(raw.clone().into_row());
        }
        Ok(rows)
    }

    fn fetch_keywords(&self, request: &ReportRequest) -> Result<Vec<KeywordRow>, FetchError> {
        self.check_window(request)?;
        let (kept, dropped): (Vec<&RawKeywordRow>, Vec<&RawKeywordRow>) = self
            .snapshot
            .keywords
            .iter()
            .partition(|k| k.impressions > 0);
        if !dropped.is_empty() {
            warn!(
                dropped = dropped.len(),
                "skipping keyword rows without impressions"
            );
        }
        kept.into_iter()
            .map(|raw| {
                raw.validate()?;
                Ok(raw.clone().into_row())
            })
            .collect()
    }

    fn date_range(&self, _request: &ReportRequest) -> Option<DateRange> {
        self.snapshot.date_range
    }

    fn describe(&self) -> String {
        match &self.origin {
            Some(p) => format!("snapshot {}", p.display()),
            None => "snapshot".to_string(),
        }
    }
}
