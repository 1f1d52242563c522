use anyhow::Result;
use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use semadvisor_core::request::{CustomerId, DateRange, ReportRequest};

/// The prompt ended without an answer: Ctrl-C, closed stdin, or no terminal.
#[derive(Debug, thiserror::Error)]
#[error("prompt aborted: {0}")]
pub struct PromptAborted(#[from] dialoguer::Error);

pub fn parse_date_input(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", raw.trim()))
}

/// Prompts for one report request. Every field is validated inline, so the
/// returned request is always well formed.
pub fn prompt_request(today: NaiveDate, window_days: u32) -> Result<ReportRequest> {
    let theme = ColorfulTheme::default();

    let raw_id: String = Input::with_theme(&theme)
        .with_prompt("Google Ads customer ID (10 digits, no dashes)")
        .validate_with(|s: &String| -> Result<(), String> {
            CustomerId::parse(s).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(PromptAborted::from)?;
    let customer_id = CustomerId::parse(&raw_id)?;

    let default_window = DateRange::trailing(today, window_days);

    let raw_start: String = Input::with_theme(&theme)
        .with_prompt("Start date")
        .default(default_window.start().format("%Y-%m-%d").to_string())
        .validate_with(|s: &String| parse_date_input(s).map(|_| ()))
        .interact_text()
        .map_err(PromptAborted::from)?;
    let start = parse_date_input(&raw_start).map_err(anyhow::Error::msg)?;

    let raw_end: String = Input::with_theme(&theme)
        .with_prompt("End date")
        .default(default_window.end().format("%Y-%m-%d").to_string())
        .validate_with(|s: &String| -> Result<(), String> {
            let end = parse_date_input(s)?;
            DateRange::new(start, end)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(PromptAborted::from)?;
    let end = parse_date_input(&raw_end).map_err(anyhow::Error::msg)?;

    Ok(ReportRequest::new(customer_id, Some(DateRange::new(start, end)?)))
}

pub fn confirm_fetch() -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Fetch data and generate recommendations?")
        .default(true)
        .interact()
        .map_err(PromptAborted::from)?)
}

pub fn confirm_another() -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Run another report?")
        .default(false)
        .interact()
        .map_err(PromptAborted::from)?)
}
