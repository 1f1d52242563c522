use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_API_VERSION: &str = "v21";
pub const DEFAULT_ENDPOINT: &str = "https://googleads.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const CONFIG_FILE_NAME: &str = "semadvisor.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub google_ads: GoogleAdsConfig,
    pub default_window_days: Option<u32>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// `semadvisor.toml` in the working directory, if there is one. A file
    /// that exists but does not parse is an error, not a silent default.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        Self::discover_in(Path::new("."))
    }

    pub fn discover_in(dir: &Path) -> anyhow::Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Config::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn window_days(&self) -> u32 {
        self.default_window_days.unwrap_or(DEFAULT_WINDOW_DAYS)
    }
}

/// Credentials and endpoint settings for the live reporting API.
#[derive(Clone, Deserialize, Default)]
#[serde(default)]
pub struct GoogleAdsConfig {
    pub developer_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub login_customer_id: Option<String>,
    pub api_version: Option<String>,
    pub endpoint: Option<String>,
    pub token_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for GoogleAdsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("GoogleAdsConfig")
            .field("developer_token", &redact(&self.developer_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("login_customer_id", &self.login_customer_id)
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("token_url", &self.token_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GoogleAdsConfig {
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|k| std::env::var(k).ok())
    }

    /// Non-empty values from `lookup` replace file values.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("GOOGLE_ADS_DEVELOPER_TOKEN") {
            self.developer_token = Some(v);
        }
        if let Some(v) = get("GOOGLE_ADS_CLIENT_ID") {
            self.client_id = Some(v);
        }
        if let Some(v) = get("GOOGLE_ADS_CLIENT_SECRET") {
            self.client_secret = Some(v);
        }
        if let Some(v) = get("GOOGLE_ADS_REFRESH_TOKEN") {
            self.refresh_token = Some(v);
        }
        if let Some(v) = get("GOOGLE_ADS_LOGIN_CUSTOMER_ID") {
            self.login_customer_id = Some(v);
        }
        self
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn token_url(&self) -> &str {
        self.token_url.as_deref().unwrap_or(DEFAULT_TOKEN_URL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Manager account ID with dashes stripped; `None` when unset or blank.
    pub fn login_customer_id(&self) -> Option<String> {
        self.login_customer_id
            .as_deref()
            .map(|v| v.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
            .filter(|v| !v.is_empty())
    }
}
