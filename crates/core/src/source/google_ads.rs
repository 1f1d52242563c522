use std::time::Duration;

use once_cell::unsync::OnceCell;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use tracing::{debug, info};

use crate::{
    config::GoogleAdsConfig,
    error::FetchError,
    request::{DateRange, ReportRequest},
    types::{CampaignRow, KeywordRow},
};

use super::{
    snapshot::{AccountSnapshot, RawCampaignRow, RawKeywordRow},
    AdsDataSource,
};

pub fn campaign_query(date_range: Option<&DateRange>) -> String {
    let mut q = String::from(
        "SELECT campaign.id, campaign.name, metrics.impressions, metrics.clicks, \
         metrics.conversions, metrics.cost_micros \
         FROM campaign \
         WHERE campaign.status != 'REMOVED'",
    );
    push_date_filter(&mut q, date_range);
    q
}

pub fn keyword_query(date_range: Option<&DateRange>) -> String {
    let mut q = String::from(
        "SELECT campaign.id, campaign.name, ad_group.id, ad_group_criterion.keyword.text, \
         metrics.impressions, metrics.clicks, metrics.conversions, metrics.cost_micros \
         FROM keyword_view \
         WHERE metrics.impressions > 0",
    );
    push_date_filter(&mut q, date_range);
    q
}

fn push_date_filter(q: &mut String, date_range: Option<&DateRange>) {
    if let Some(r) = date_range {
        q.push_str(&format!(
            " AND segments.date BETWEEN '{}' AND '{}'",
            r.start().format("%Y-%m-%d"),
            r.end().format("%Y-%m-%d")
        ));
    }
}

/// Live source backed by the Google Ads REST `searchStream` endpoint.
pub struct GoogleAdsClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_version: String,
    token_url: String,
    developer_token: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    login_customer_id: Option<String>,
    access_token: OnceCell<String>,
}

impl std::fmt::Debug for GoogleAdsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAdsClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("login_customer_id", &self.login_customer_id)
            .finish_non_exhaustive()
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, FetchError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FetchError::MissingCredential(name)),
    }
}

fn is_loopback(endpoint: &str) -> bool {
    reqwest::Url::parse(endpoint)
        .ok()
        .and_then(|u| u.host_str().map(|h| matches!(h, "localhost" | "127.0.0.1" | "[::1]")))
        .unwrap_or(false)
}

impl GoogleAdsClient {
    pub fn from_config(cfg: &GoogleAdsConfig) -> Result<Self, FetchError> {
        let developer_token = required(&cfg.developer_token, "developer_token")?;
        let client_id = required(&cfg.client_id, "client_id")?;
        let client_secret = required(&cfg.client_secret, "client_secret")?;
        let refresh_token = required(&cfg.refresh_token, "refresh_token")?;

        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs()))
            .user_agent(concat!("semadvisor/", env!("CARGO_PKG_VERSION")));
        if is_loopback(cfg.endpoint()) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint().trim_end_matches('/').to_string(),
            api_version: cfg.api_version().to_string(),
            token_url: cfg.token_url().to_string(),
            developer_token,
            client_id,
            client_secret,
            refresh_token,
            login_customer_id: cfg.login_customer_id(),
            access_token: OnceCell::new(),
        })
    }

    fn access_token(&self) -> Result<&str, FetchError> {
        self.access_token
            .get_or_try_init(|| {
                #[derive(Deserialize)]
                struct TokenResponse {
                    access_token: String,
                }

                debug!(token_url = %self.token_url, "refreshing access token");
                let resp = self
                    .http
                    .post(&self.token_url)
                    .form(&[
                        ("client_id", self.client_id.as_str()),
                        ("client_secret", self.client_secret.as_str()),
                        ("refresh_token", self.refresh_token.as_str()),
                        ("grant_type", "refresh_token"),
                    ])
                    .send()?;
                let body = read_success_body(resp)?;
                let token: TokenResponse = serde_json::from_slice(&body)?;
                Ok(token.access_token)
            })
            .map(String::as_str)
    }

    fn search_stream<T: DeserializeOwned>(
        &self,
        request: &ReportRequest,
        query: &str,
    ) -> Result<Vec<T>, FetchError> {
        let url = format!(
            "{}/{}/customers/{}/googleAds:searchStream",
            self.endpoint, self.api_version, request.customer_id
        );
        debug!(%url, query, "issuing GAQL query");

        let mut req = self
            .http
            .post(&url)
            .bearer_auth(self.access_token()?)
            .header("developer-token", &self.developer_token)
            .json(&serde_json::json!({ "query": query }));
        if let Some(login) = &self.login_customer_id {
            req = req.header("login-customer-id", login);
        }

        let body = read_success_body(req.send()?)?;
        parse_search_stream(&body)
    }

    fn raw_campaigns(&self, request: &ReportRequest) -> Result<Vec<RawCampaignRow>, FetchError> {
        let results: Vec<CampaignResult> =
            self.search_stream(request, &campaign_query(request.date_range.as_ref()))?;
        info!(customer_id = %request.customer_id, rows = results.len(), "fetched campaigns");
        Ok(results.into_iter().map(CampaignResult::into_raw).collect())
    }

    fn raw_keywords(&self, request: &ReportRequest) -> Result<Vec<RawKeywordRow>, FetchError> {
        let results: Vec<KeywordResult> =
            self.search_stream(request, &keyword_query(request.date_range.as_ref()))?;
        info!(customer_id = %request.customer_id, rows = results.len(), "fetched keywords");
        Ok(results.into_iter().map(KeywordResult::into_raw).collect())
    }

    /// Pulls both tables in their raw (micros) form for offline replay.
    pub fn fetch_snapshot(&self, request: &ReportRequest) -> Result<AccountSnapshot, FetchError> {
        Ok(AccountSnapshot {
            customer_id: Some(request.customer_id.to_string()),
            date_range: request.date_range,
            campaigns: self.raw_campaigns(request)?,
            keywords: self.raw_keywords(request)?,
        })
    }
}

impl AdsDataSource for GoogleAdsClient {
    fn fetch_campaigns(&self, request: &ReportRequest) -> Result<Vec<CampaignRow>, FetchError> {
        Ok(self
            .raw_campaigns(request)?
            .into_iter()
            .map(RawCampaignRow::into_row)
            .collect())
    }

    fn fetch_keywords(&self, request: &ReportRequest) -> Result<Vec<KeywordRow>, FetchError> {
        Ok(self
            .raw_keywords(request)?
            .into_iter()
            .filter(|r| r.impressions > 0)
            .map(RawKeywordRow::into_row)
            .collect())
    }

    fn describe(&self) -> String {
        format!("google-ads {}", self.api_version)
    }
}

fn read_success_body(resp: reqwest::blocking::Response) -> Result<Vec<u8>, FetchError> {
    let status = resp.status();
    let body = resp.bytes()?.to_vec();
    if !status.is_success() {
        return Err(FetchError::Api {
            status: status.as_u16(),
            message: api_error_message(&body),
        });
    }
    Ok(body)
}

/// Pulls `error.message` out of a Google error body, which `searchStream`
/// may wrap in a one-element array.
fn api_error_message(body: &[u8]) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let obj = v.as_array().and_then(|a| a.first()).unwrap_or(v);
        obj.get("error")
            .and_then(|e| e.get("message").or_else(|| e.get("error_description")))
            .or_else(|| obj.get("error_description"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
    });
    message.unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body);
        text.chars().take(300).collect()
    })
}

#[derive(Deserialize)]
struct StreamBatch<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// Flattens a `searchStream` response (an array of result batches).
pub fn parse_search_stream<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, FetchError> {
    let batches: Vec<StreamBatch<T>> = serde_json::from_slice(body)?;
    Ok(batches.into_iter().flat_map(|b| b.results).collect())
}

/// int64 fields arrive as JSON strings; tolerate plain numbers too.
fn int64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(i64),
        Str(String),
    }

    match Repr::deserialize(d)? {
        Repr::Num(n) => Ok(n),
        Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn non_negative(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiCampaign {
    #[serde(deserialize_with = "int64")]
    id: i64,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiAdGroup {
    #[serde(deserialize_with = "int64")]
    id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiKeyword {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiAdGroupCriterion {
    keyword: ApiKeyword,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiMetrics {
    #[serde(deserialize_with = "int64")]
    impressions: i64,
    #[serde(deserialize_with = "int64")]
    clicks: i64,
    conversions: f64,
    #[serde(deserialize_with = "int64")]
    cost_micros: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampaignResult {
    #[serde(default)]
    campaign: ApiCampaign,
    #[serde(default)]
    metrics: ApiMetrics,
}

impl CampaignResult {
    fn into_raw(self) -> RawCampaignRow {
        RawCampaignRow {
            campaign_id: self.campaign.id,
            campaign_name: self.campaign.name,
            status: None,
            impressions: non_negative(self.metrics.impressions),
            clicks: non_negative(self.metrics.clicks),
            conversions: self.metrics.conversions.max(0.0),
            cost_micros: self.metrics.cost_micros.max(0),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordResult {
    #[serde(default)]
    campaign: ApiCampaign,
    #[serde(default)]
    ad_group: ApiAdGroup,
    #[serde(default)]
    ad_group_criterion: ApiAdGroupCriterion,
    #[serde(default)]
    metrics: ApiMetrics,
}

impl KeywordResult {
    fn into_raw(self) -> RawKeywordRow {
        RawKeywordRow {
            campaign_id: self.campaign.id,
            campaign_name: self.campaign.name,
            ad_group_id: self.ad_group.id,
            keyword_text: self.ad_group_criterion.keyword.text,
            impressions: non_negative(self.metrics.impressions),
            clicks: non_negative(self.metrics.clicks),
            conversions: self.metrics.conversions.max(0.0),
            cost_micros: self.metrics.cost_micros.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn queries_append_date_window() {
        let r = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();

        let q = campaign_query(Some(&r));
        assert!(q.contains("campaign.status != 'REMOVED'"));
        assert!(q.ends_with("AND segments.date BETWEEN '2024-01-01' AND '2024-01-31'"));

        let q = keyword_query(None);
        assert!(q.contains("FROM keyword_view"));
        assert!(q.ends_with("WHERE metrics.impressions > 0"));
    }

    #[test]
    fn parses_stream_batches_with_string_int64_and_omitted_metrics() {
        let body = br#"[
          {"results": [
            {"campaign": {"resourceName": "customers/1/campaigns/11", "id": "11", "name": "Brand"},
             "metrics": {"impressions": "1200", "clicks": "60", "conversions": 4.0, "costMicros": "25500000"}}
          ]},
          {"results": [
            {"campaign": {"id": "12", "name": "Generic"}, "metrics": {}}
          ], "fieldMask": "campaign.id", "requestId": "abc"},
          {"fieldMask": "campaign.id"}
        ]"#;

        let rows: Vec<CampaignResult> = parse_search_stream(body).unwrap();
        let raw: Vec<RawCampaignRow> = rows.into_iter().map(CampaignResult::into_raw).collect();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].campaign_id, 11);
        assert_eq!(raw[0].impressions, 1200);
        assert_eq!(raw[0].cost_micros, 25_500_000);
        assert_eq!(raw[1].campaign_name, "Generic");
        assert_eq!(raw[1].clicks, 0);
    }

    #[test]
    fn parses_keyword_rows() {
        let body = br#"[{"results": [
            {"campaign": {"id": "11", "name": "Brand"},
             "adGroup": {"id": "501"},
             "adGroupCriterion": {"keyword": {"text": "running shoes", "matchType": "PHRASE"}},
             "metrics": {"impressions": "300", "clicks": "9", "conversions": 1.5, "costMicros": "4200000"}}
        ]}]"#;

        let rows: Vec<KeywordResult> = parse_search_stream(body).unwrap();
        let row = rows.into_iter().next().unwrap().into_raw().into_row();
        assert_eq!(row.ad_group_id, 501);
        assert_eq!(row.keyword_text, "running shoes");
        assert_eq!(row.cost, 4.2);
        assert_eq!(row.conversions, 1.5);
    }

    #[test]
    fn error_message_is_extracted_from_wrapped_body() {
        let body = br#"[{"error": {"code": 401, "message": "Request had invalid authentication credentials.", "status": "UNAUTHENTICATED"}}]"#;
        assert_eq!(
            api_error_message(body),
            "Request had invalid authentication credentials."
        );

        let body = br#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#;
        assert_eq!(api_error_message(body), "Token has been expired or revoked.");

        assert_eq!(api_error_message(b"bad gateway"), "bad gateway");
    }

    #[test]
    fn from_config_requires_credentials() {
        let cfg = GoogleAdsConfig {
            developer_token: Some("dev".to_string()),
            ..GoogleAdsConfig::default()
        };
        let err = GoogleAdsClient::from_config(&cfg).unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential("client_id")));
    }
}
