use std::io::Write;

use semadvisor_core::config::{Config, CONFIG_FILE_NAME, DEFAULT_API_VERSION, DEFAULT_WINDOW_DAYS};

#[test]
fn parse_valid_toml() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"
default_window_days = 14

[google_ads]
developer_token = "dev-token"
client_id = "client.apps.googleusercontent.com"
client_secret = "secret"
refresh_token = "1//refresh"
login_customer_id = "111-222-3333"
api_version = "v20"
timeout_secs = 10
"#
    )
    .unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.window_days(), 14);
    assert_eq!(cfg.google_ads.developer_token.as_deref(), Some("dev-token"));
    assert_eq!(cfg.google_ads.api_version(), "v20");
    assert_eq!(cfg.google_ads.timeout_secs(), 10);
    assert_eq!(
        cfg.google_ads.login_customer_id().as_deref(),
        Some("1112223333")
    );
}

#[test]
fn parse_empty_toml_gives_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "").unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.window_days(), DEFAULT_WINDOW_DAYS);
    assert_eq!(cfg.google_ads.api_version(), DEFAULT_API_VERSION);
    assert!(cfg.google_ads.developer_token.is_none());
    assert!(cfg.google_ads.refresh_token.is_none());
}

#[test]
fn parse_invalid_toml_returns_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "this is not valid [ toml {{{{").unwrap();

    let result = Config::load(f.path());
    assert!(result.is_err());
}

#[test]
fn discover_reports_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::discover_in(dir.path()).unwrap().is_none());

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "default_window_days = \"soon\"").unwrap();
    let err = Config::discover_in(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("semadvisor.toml"));

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "default_window_days = 7").unwrap();
    let cfg = Config::discover_in(dir.path()).unwrap().unwrap();
    assert_eq!(cfg.window_days(), 7);
}
